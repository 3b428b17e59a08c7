use super::{ContentModel, Pumped, Tokenizer};
use crate::context::ParseContext;
use crate::stream::InputStream;
use crate::token::{Token, TextValue};

/// Render a token into a compact, order-preserving text form so tests can
/// compare whole sequences.
fn fmt_token(token: &Token, source: &str, ctx: &ParseContext) -> String {
    match token {
        Token::Doctype(d) => {
            let part = |v: &Option<TextValue>| match v {
                Some(t) => format!("'{}'", t.resolve(source)),
                None => "<missing>".to_string(),
            };
            format!(
                "DOCTYPE {} {} {}{}",
                part(&d.name),
                part(&d.public_id),
                part(&d.system_id),
                if d.force_quirks { " quirks" } else { "" }
            )
        }
        Token::StartTag(tag) => {
            let mut s = format!("StartTag {}", ctx.atoms.resolve(tag.name));
            for attr in &tag.attributes {
                s.push_str(&format!(
                    " {}='{}'",
                    ctx.atoms.resolve(attr.name),
                    attr.value.resolve(source)
                ));
            }
            if tag.self_closing {
                s.push_str(" /");
            }
            s
        }
        Token::EndTag(tag) => format!("EndTag {}", ctx.atoms.resolve(tag.name)),
        Token::Comment(text) => format!("Comment '{}'", text.resolve(source)),
        Token::Character(text) => format!("Text '{}'", text.resolve(source)),
        Token::Eof => "EOF".to_string(),
    }
}

fn run_chunks_config(chunks: &[&[u8]], model: Option<(ContentModel, &str)>) -> Vec<String> {
    let mut ctx = ParseContext::new();
    let mut stream = InputStream::new(Some(b"utf-8"));
    let mut tokenizer = Tokenizer::new();
    if let Some((model, last_start)) = model {
        tokenizer.set_last_start_tag(last_start);
        tokenizer.set_content_model(model);
    }
    let mut out = Vec::new();
    for chunk in chunks {
        stream.append(chunk, &mut ctx).expect("append");
        loop {
            match tokenizer.pump(&mut stream, &mut ctx) {
                Pumped::Token(token) => {
                    out.push(fmt_token(&token, stream.decoded(), &ctx));
                }
                Pumped::NeedData => break,
                Pumped::Done => break,
            }
        }
    }
    stream.append(&[], &mut ctx).expect("eof");
    loop {
        match tokenizer.pump(&mut stream, &mut ctx) {
            Pumped::Token(token) => out.push(fmt_token(&token, stream.decoded(), &ctx)),
            Pumped::NeedData => panic!("tokenizer suspended after EOF"),
            Pumped::Done => break,
        }
    }
    out
}

fn run(input: &str) -> Vec<String> {
    run_chunks_config(&[input.as_bytes()], None)
}

fn run_chunks(chunks: &[&str]) -> Vec<String> {
    let bytes: Vec<&[u8]> = chunks.iter().map(|c| c.as_bytes()).collect();
    run_chunks_config(&bytes, None)
}

/// Character tokens may split differently between runs; join adjacent text
/// entries before comparing.
fn coalesced(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        if let (Some(last), true) = (out.last_mut(), token.starts_with("Text '")) {
            if last.starts_with("Text '") {
                let tail = &token["Text '".len()..token.len() - 1];
                last.truncate(last.len() - 1);
                last.push_str(tail);
                last.push('\'');
                continue;
            }
        }
        out.push(token);
    }
    out
}

#[test]
fn plain_text_and_simple_tags() {
    assert_eq!(
        run("<p>hi</p>"),
        vec!["StartTag p", "Text 'hi'", "EndTag p", "EOF"]
    );
}

#[test]
fn tag_names_fold_ascii_case() {
    assert_eq!(run("<DiV></dIv>"), vec!["StartTag div", "EndTag div", "EOF"]);
}

#[test]
fn attributes_with_all_quoting_styles() {
    assert_eq!(
        run(r#"<a href="x" title='y' data=z checked>"#),
        vec!["StartTag a href='x' title='y' data='z' checked=''", "EOF"]
    );
}

#[test]
fn duplicate_attributes_are_dropped_with_an_error() {
    let mut ctx = ParseContext::new();
    let mut stream = InputStream::new(Some(b"utf-8"));
    let mut tokenizer = Tokenizer::new();
    stream.append(b"<a id=1 ID=2>", &mut ctx).unwrap();
    stream.append(&[], &mut ctx).unwrap();
    let mut tokens = Vec::new();
    loop {
        match tokenizer.pump(&mut stream, &mut ctx) {
            Pumped::Token(t) => tokens.push(fmt_token(&t, stream.decoded(), &ctx)),
            _ => break,
        }
    }
    assert_eq!(tokens, vec!["StartTag a id='1'", "EOF"]);
    assert_eq!(ctx.counters.parse_errors, 1);
}

#[test]
fn self_closing_flag_is_reported() {
    assert_eq!(run("<br/>"), vec!["StartTag br /", "EOF"]);
}

#[test]
fn comments_round_trip() {
    assert_eq!(run("<!--hello-->"), vec!["Comment 'hello'", "EOF"]);
    assert_eq!(run("<!---->"), vec!["Comment ''", "EOF"]);
    assert_eq!(run("<!--a-b-->"), vec!["Comment 'a-b'", "EOF"]);
    assert_eq!(run("<!--a--b-->"), vec!["Comment 'a--b'", "EOF"]);
}

#[test]
fn comment_trailing_dash_cases() {
    assert_eq!(run("<!--a--->"), vec!["Comment 'a-'", "EOF"]);
    assert_eq!(run("<!--a---->"), vec!["Comment 'a--'", "EOF"]);
}

#[test]
fn bogus_comment_from_question_mark() {
    assert_eq!(run("<?xml?>"), vec!["Comment '?xml?'", "EOF"]);
}

#[test]
fn doctype_html() {
    assert_eq!(
        run("<!DOCTYPE html>"),
        vec!["DOCTYPE 'html' <missing> <missing>", "EOF"]
    );
}

#[test]
fn doctype_with_public_and_system_ids() {
    assert_eq!(
        run(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#),
        vec![
            "DOCTYPE 'html' '-//W3C//DTD HTML 4.01//EN' 'http://www.w3.org/TR/html4/strict.dtd'",
            "EOF"
        ]
    );
}

#[test]
fn doctype_missing_name_forces_quirks() {
    assert_eq!(
        run("<!DOCTYPE>"),
        vec!["DOCTYPE <missing> <missing> <missing> quirks", "EOF"]
    );
}

#[test]
fn character_references_in_data() {
    assert_eq!(run("a&amp;b"), vec!["Text 'a&b'", "EOF"]);
    assert_eq!(run("&lt;tag&gt;"), vec!["Text '<tag>'", "EOF"]);
    assert_eq!(run("&#x61;&#98;"), vec!["Text 'ab'", "EOF"]);
}

#[test]
fn undefined_reference_passes_through_literally() {
    assert_eq!(run("a&nosuch;b"), vec!["Text 'a&nosuch;b'", "EOF"]);
    assert_eq!(run("a&b"), vec!["Text 'a&b'", "EOF"]);
}

#[test]
fn character_reference_in_attribute_value() {
    assert_eq!(
        run(r#"<a href="?a=1&amp;b=2">"#),
        vec!["StartTag a href='?a=1&b=2'", "EOF"]
    );
    // Legacy carve-out: '&copy' followed by '=' stays literal in attributes.
    assert_eq!(
        run(r#"<a href="?a&copy=2">"#),
        vec!["StartTag a href='?a&copy=2'", "EOF"]
    );
}

#[test]
fn rcdata_keeps_tags_and_resolves_references() {
    assert_eq!(
        run_chunks_config(
            &[b"one &amp; <b>two</b></title>after"],
            Some((ContentModel::Rcdata, "title"))
        ),
        vec![
            "Text 'one & <b>two</b>'",
            "EndTag title",
            "Text 'after'",
            "EOF"
        ]
    );
}

#[test]
fn rawtext_keeps_references_literal() {
    assert_eq!(
        run_chunks_config(
            &[b"a &amp; b</style>"],
            Some((ContentModel::Cdata, "style"))
        ),
        vec!["Text 'a &amp; b'", "EndTag style", "EOF"]
    );
}

#[test]
fn script_data_ignores_inner_markup() {
    assert_eq!(
        run_chunks_config(
            &[b"var x='</'+'script>';</script>"],
            Some((ContentModel::ScriptData, "script"))
        ),
        vec!["Text 'var x='</'+'script>';'", "EndTag script", "EOF"]
    );
}

#[test]
fn script_data_escaped_comment_hides_end_tag() {
    assert_eq!(
        coalesced(run_chunks_config(
            &[b"<!--<script>x</script>--></script>done"],
            Some((ContentModel::ScriptData, "script"))
        )),
        vec![
            "Text '<!--<script>x</script>-->'",
            "EndTag script",
            "Text 'done'",
            "EOF"
        ]
    );
}

#[test]
fn rawtext_near_match_end_tag_stays_text() {
    assert_eq!(
        coalesced(run_chunks_config(
            &[b"x</styl>y</style>"],
            Some((ContentModel::Cdata, "style"))
        )),
        vec!["Text 'x</styl>y'", "EndTag style", "EOF"]
    );
}

#[test]
fn plaintext_consumes_everything() {
    assert_eq!(
        run_chunks_config(&[b"a</plaintext><b>"], Some((ContentModel::Plaintext, "plaintext"))),
        vec!["Text 'a</plaintext><b>'", "EOF"]
    );
}

#[test]
fn cdata_outside_foreign_content_is_a_bogus_comment() {
    assert_eq!(
        run("<![CDATA[x]]>"),
        vec!["Comment '[CDATA[x]]'", "EOF"]
    );
}

#[test]
fn cdata_in_foreign_content_yields_text() {
    let mut ctx = ParseContext::new();
    let mut stream = InputStream::new(Some(b"utf-8"));
    let mut tokenizer = Tokenizer::new();
    tokenizer.set_cdata_allowed(true);
    stream.append(b"<![CDATA[x]]y]]>", &mut ctx).unwrap();
    stream.append(&[], &mut ctx).unwrap();
    let mut tokens = Vec::new();
    loop {
        match tokenizer.pump(&mut stream, &mut ctx) {
            Pumped::Token(t) => tokens.push(fmt_token(&t, stream.decoded(), &ctx)),
            _ => break,
        }
    }
    assert_eq!(tokens, vec!["Text 'x]]y'", "EOF"]);
}

#[test]
fn chunk_boundaries_inside_constructs_do_not_change_tokens() {
    let cases: &[&str] = &[
        "<p>hello</p>",
        "<a href=\"x&amp;y\">t</a>",
        "<!--comment with -- dashes-->",
        "<!DOCTYPE html><p>a<p>b",
        "a&notin;b",
    ];
    for input in cases {
        let whole = coalesced(run(input));
        for split in 1..input.len() {
            if !input.is_char_boundary(split) {
                continue;
            }
            let chunked = coalesced(run_chunks(&[&input[..split], &input[split..]]));
            assert_eq!(
                whole, chunked,
                "split at {split} changed tokens for {input:?}"
            );
        }
    }
}

#[test]
fn byte_level_chunk_split_inside_multibyte_sequence() {
    let input = "café<p>naïve</p>".as_bytes();
    let whole = coalesced(run_chunks_config(&[input], None));
    for split in 1..input.len() {
        let chunked = coalesced(run_chunks_config(&[&input[..split], &input[split..]], None));
        assert_eq!(whole, chunked, "byte split at {split} changed tokens");
    }
}

#[test]
fn exactly_one_eof_token() {
    let tokens = run("<p>x");
    assert_eq!(tokens.iter().filter(|t| *t == "EOF").count(), 1);
}

#[test]
fn eof_inside_tag_drops_the_tag() {
    assert_eq!(run("<div foo"), vec!["EOF"]);
    assert_eq!(run("text<div"), vec!["Text 'text'", "EOF"]);
}

#[test]
fn eof_inside_comment_emits_partial_comment() {
    assert_eq!(run("<!--abc"), vec!["Comment 'abc'", "EOF"]);
}

#[test]
fn lone_ampersand_and_angle_bracket() {
    assert_eq!(run("a & b"), vec!["Text 'a & b'", "EOF"]);
    assert_eq!(coalesced(run("a < b")), vec!["Text 'a < b'", "EOF"]);
}

#[test]
fn missing_end_tag_name_is_skipped() {
    assert_eq!(coalesced(run("a</>b")), vec!["Text 'ab'", "EOF"]);
}

#[test]
fn end_tag_attributes_error_but_are_kept_off_the_token_display() {
    let mut ctx = ParseContext::new();
    let mut stream = InputStream::new(Some(b"utf-8"));
    let mut tokenizer = Tokenizer::new();
    stream.append(b"</p class=x>", &mut ctx).unwrap();
    stream.append(&[], &mut ctx).unwrap();
    let mut end_tags = 0;
    loop {
        match tokenizer.pump(&mut stream, &mut ctx) {
            Pumped::Token(Token::EndTag(tag)) => {
                end_tags += 1;
                assert_eq!(tag.attributes.len(), 1, "attributes retained on end tag");
            }
            Pumped::Token(_) => {}
            _ => break,
        }
    }
    assert_eq!(end_tags, 1);
    assert_eq!(ctx.counters.parse_errors, 1);
}

#[test]
fn windows_1252_numeric_override() {
    assert_eq!(run("&#147;quoted&#148;"), vec!["Text '\u{201C}quoted\u{201D}'", "EOF"]);
}
