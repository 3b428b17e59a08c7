//! Universal properties: chunk-split equivalence, EOF uniqueness, reference
//! balance, void elements and character-reference arithmetic.

use murmur::token::Token;
use murmur::{Parser, ParserOptions};
use testdom::chunks::build_plans;
use testdom::{TestDom, parse_document};

fn snapshot_chunked(input: &[u8], chunks: &[&[u8]]) -> String {
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom.clone());
    for chunk in chunks {
        parser.parse_chunk(chunk).expect("parse_chunk");
    }
    parser.completed().expect("completed");
    drop(parser);
    assert!(
        dom.references_balanced(),
        "unbalanced references for {:?}",
        String::from_utf8_lossy(input)
    );
    dom.snapshot()
}

#[test]
fn chunked_parses_match_whole_parses() {
    let documents: &[&str] = &[
        "<!DOCTYPE html><p>hello world</p>",
        "<!DOCTYPE html><a href=\"x&amp;y\" title='q'>link</a>",
        "<!DOCTYPE html><!-- a comment with -- dashes --><div>after</div>",
        "<!DOCTYPE html><table><tr><td>cell</td></tr></table>",
        "<!DOCTYPE html><script>if (a < b) { x = '</div>'; }</script>ok",
        "<!DOCTYPE html><ul><li>caf\u{E9}<li>na\u{EF}ve</ul>",
        "<!DOCTYPE html><b>1<i>2</b>3</i>",
        "<!DOCTYPE html><select><option>a<option>b</select>",
    ];
    for document in documents {
        let bytes = document.as_bytes();
        let whole = snapshot_chunked(bytes, &[bytes]);
        for plan in build_plans(bytes, 6, 0xC0FFEE) {
            let chunks = plan.apply(bytes);
            let chunked = snapshot_chunked(bytes, &chunks);
            assert_eq!(
                whole, chunked,
                "plan `{}` changed the tree for {document:?}",
                plan.label
            );
        }
    }
}

#[test]
fn byte_splits_inside_multibyte_sequences_are_safe() {
    let document = "<!DOCTYPE html><p>\u{1F600} caf\u{E9}</p>".as_bytes();
    let whole = snapshot_chunked(document, &[document]);
    for split in 1..document.len() {
        let chunked = snapshot_chunked(document, &[&document[..split], &document[split..]]);
        assert_eq!(whole, chunked, "byte split at {split} changed the tree");
    }
}

#[test]
fn exactly_one_eof_token_per_parse() {
    let counter = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let seen = std::rc::Rc::clone(&counter);
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom);
    parser.set_token_handler(Box::new(move |token, _atoms, _source| {
        if matches!(token, Token::Eof) {
            seen.set(seen.get() + 1);
        }
    }));
    parser.parse_chunk(b"<p>x").unwrap();
    parser.completed().unwrap();
    parser.completed().unwrap();
    assert_eq!(counter.get(), 1);
}

#[test]
fn void_start_tags_get_no_synthesized_end_tags() {
    let names = std::rc::Rc::new(std::cell::RefCell::new(Vec::<(bool, String)>::new()));
    let sink = std::rc::Rc::clone(&names);
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom);
    parser.set_token_handler(Box::new(move |token, atoms, _source| match token {
        Token::StartTag(tag) => sink
            .borrow_mut()
            .push((true, atoms.resolve(tag.name).to_string())),
        Token::EndTag(tag) => sink
            .borrow_mut()
            .push((false, atoms.resolve(tag.name).to_string())),
        _ => {}
    }));
    parser
        .parse_chunk(b"<br><img src=x><input><hr><meta charset=utf-8>")
        .unwrap();
    parser.completed().unwrap();
    let tags = names.borrow();
    assert!(tags.iter().all(|(is_start, _)| *is_start), "tokenizer must not close void elements: {tags:?}");
}

#[test]
fn character_reference_lengths_match_resolution() {
    let cases: &[(&str, &str)] = &[
        ("&amp;", "&"),
        ("&lt;&gt;", "<>"),
        ("&notin;", "\u{2209}"),
        ("&#x1F600;", "\u{1F600}"),
        ("&#65;", "A"),
        ("&bogus;", "&bogus;"),
        ("&", "&"),
    ];
    for (input, expected) in cases {
        let text = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let sink = std::rc::Rc::clone(&text);
        let dom = TestDom::new();
        let mut parser = Parser::new(ParserOptions::default(), dom);
        parser.set_token_handler(Box::new(move |token, _atoms, source| {
            if let Token::Character(data) = token {
                sink.borrow_mut().push_str(data.resolve(source));
            }
        }));
        parser.parse_chunk(input.as_bytes()).unwrap();
        parser.completed().unwrap();
        assert_eq!(text.borrow().as_str(), *expected, "input {input:?}");
    }
}

#[test]
fn references_balance_across_every_scenario() {
    let documents: &[&str] = &[
        "<p>basic</p>",
        "<b>1<i>2</b>3</i>",
        "<table>foster<td>cell",
        "<select><option>a<optgroup><option>b",
        "<svg><circle/><foreignObject><b>x</b></foreignObject></svg>",
        "<applet><b>marker</b></applet>",
        "<form><input></form><form again>",
        "<frameset><frame>",
        "<div><p><em>never closed",
    ];
    for document in documents {
        let (dom, parser) = parse_document(document.as_bytes());
        drop(parser);
        assert!(
            dom.references_balanced(),
            "references leaked for {document:?}: {} outstanding",
            dom.outstanding_references()
        );
    }
}

#[test]
fn pending_state_survives_chunk_starvation() {
    // One byte at a time through a document touching most state families.
    let document = "<!DOCTYPE html><head><title>t &amp; t</title></head>\
                    <body><!--c--><p class=\"a&#65;\">caf\u{E9}</p></body>";
    let bytes = document.as_bytes();
    let whole = snapshot_chunked(bytes, &[bytes]);
    let single: Vec<&[u8]> = bytes.chunks(1).collect();
    assert_eq!(whole, snapshot_chunked(bytes, &single));
}
