//! End-to-end scenarios: byte input through the full pipeline, asserting the
//! tree-handler call outcomes.

use murmur::charset::CharsetSource;
use murmur::{Parser, ParserOptions, QuirksMode};
use testdom::{TestDom, parse_document, snapshot_of};

#[test]
fn simple_paragraph_builds_the_implied_document() {
    let (dom, parser) = parse_document(b"<p>hi</p>");
    assert_eq!(
        dom.snapshot(),
        "#document\n  <html>\n    <head>\n    <body>\n      <p>\n        \"hi\"\n"
    );
    assert_eq!(parser.quirks_mode(), QuirksMode::Full, "no doctype");
    drop(parser);
    assert!(dom.references_balanced());
}

#[test]
fn doctype_then_sibling_paragraphs() {
    let (dom, parser) = parse_document(b"<!DOCTYPE html><p>a<p>b");
    assert_eq!(
        dom.snapshot(),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <p>\n        \"a\"\n      <p>\n        \"b\"\n"
    );
    assert_eq!(parser.quirks_mode(), QuirksMode::None);
    assert_eq!(dom.quirks(), Some(QuirksMode::None));
}

#[test]
fn adoption_agency_reparents_misnested_formatting() {
    assert_eq!(
        snapshot_of("<b>1<i>2</b>3</i>"),
        "#document\n  <html>\n    <head>\n    <body>\n      <b>\n        \"1\"\n        <i>\n          \"2\"\n      <i>\n        \"3\"\n"
    );
}

#[test]
fn bom_reports_utf8_detected() {
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom);
    parser.parse_chunk(&[0xEF, 0xBB, 0xBF]).unwrap();
    parser.parse_chunk(b"<html></html>").unwrap();
    assert_eq!(parser.read_charset(), ("UTF-8", CharsetSource::Detected));
    parser.completed().unwrap();
}

#[test]
fn second_option_implicitly_closes_the_first() {
    let (dom, parser) = parse_document(b"<select><option>a<option>b</select>");
    assert_eq!(
        dom.snapshot(),
        "#document\n  <html>\n    <head>\n    <body>\n      <select>\n        <option>\n          \"a\"\n        <option>\n          \"b\"\n"
    );
    assert_eq!(dom.count_elements("option"), 2);
    drop(parser);
    assert!(dom.references_balanced());
}

#[test]
fn script_body_is_verbatim_character_data() {
    assert_eq!(
        snapshot_of("<script>var x='</'+'script>';</script>"),
        "#document\n  <html>\n    <head>\n      <script>\n        \"var x='</'+'script>';\"\n    <body>\n"
    );
}

#[test]
fn attributes_survive_into_the_tree() {
    assert_eq!(
        snapshot_of(r#"<!DOCTYPE html><body><a href="x" title='t'>go</a>"#),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <a href=\"x\" title=\"t\">\n        \"go\"\n"
    );
}

#[test]
fn textarea_swallows_first_newline() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><textarea>\nkeep</textarea>"),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <textarea>\n        \"keep\"\n"
    );
}

#[test]
fn headings_close_each_other() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><h1>a<h2>b"),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <h1>\n        \"a\"\n      <h2>\n        \"b\"\n"
    );
}

#[test]
fn list_items_close_implicitly() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><ul><li>one<li>two</ul>"),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <ul>\n        <li>\n          \"one\"\n        <li>\n          \"two\"\n"
    );
}

#[test]
fn svg_foreign_object_switches_back_to_html_rules() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><svg><foreignObject><p>x</p></foreignObject></svg>"),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <body>\n      <svg svg>\n        <svg foreignObject>\n          <p>\n            \"x\"\n"
    );
}

#[test]
fn frameset_document_shape() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><frameset><frame></frameset>"),
        "#document\n  <!DOCTYPE html>\n  <html>\n    <head>\n    <frameset>\n      <frame>\n"
    );
}

#[test]
fn legacy_doctype_yields_full_quirks() {
    let (dom, _parser) =
        parse_document(b"<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 3.2//EN\"><p>x");
    assert_eq!(dom.quirks(), Some(QuirksMode::Full));
}

#[test]
fn comments_outside_html_go_on_the_document() {
    assert_eq!(
        snapshot_of("<!DOCTYPE html><!--early--><html><body>x"),
        "#document\n  <!DOCTYPE html>\n  <!-- early -->\n  <html>\n    <head>\n    <body>\n      \"x\"\n"
    );
}

#[test]
fn extraneous_chunk_is_tokenized_at_the_insertion_point() {
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom.clone());
    parser
        .parse_chunk(b"<!DOCTYPE html><body><p>one</p>")
        .unwrap();
    // Script-inserted data splices at the read cursor and is consumed
    // greedily by this call.
    parser.parse_extraneous_chunk(b"<p>two</p>").unwrap();
    parser.parse_chunk(b"<p>three</p>").unwrap();
    parser.completed().unwrap();
    assert_eq!(dom.count_elements("p"), 3);
    drop(parser);
    assert!(dom.references_balanced());
}

#[test]
fn late_meta_charset_is_reported_but_ignored() {
    // The non-ASCII character before the meta pins the encoding.
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom.clone());
    parser
        .parse_chunk("<body>\u{00E9}<meta charset=\"koi8-u\">".as_bytes())
        .expect("late change must not abort parsing");
    parser.completed().unwrap();
    assert_eq!(parser.read_charset().0, "windows-1252");
    assert!(dom.encoding_changes().is_empty());
}
