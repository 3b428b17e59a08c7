use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use murmur::{Parser, ParserOptions};
use testdom::TestDom;

fn synthetic_document(items: usize) -> String {
    let mut out = String::from("<!DOCTYPE html><html><head><title>bench</title></head><body>");
    for i in 0..items {
        out.push_str(&format!(
            "<div class=\"row r{i}\"><a href=\"/item/{i}\">item {i}</a>\
             <p>some text &amp; a reference &#{};</p></div>",
            65 + (i % 26)
        ));
    }
    out.push_str("<table>");
    for i in 0..items / 4 {
        out.push_str(&format!("<tr><td>c{i}</td><td>d{i}</td></tr>"));
    }
    out.push_str("</table></body></html>");
    out
}

fn parse_whole(input: &[u8]) {
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom);
    parser.parse_chunk(input).expect("parse");
    parser.completed().expect("completed");
}

fn parse_chunked(input: &[u8], chunk: usize) {
    let dom = TestDom::new();
    let mut parser = Parser::new(ParserOptions::default(), dom);
    for piece in input.chunks(chunk) {
        parser.parse_chunk(piece).expect("parse");
    }
    parser.completed().expect("completed");
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for items in [100usize, 1_000] {
        let document = synthetic_document(items);
        let bytes = document.as_bytes();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("whole", items), bytes, |b, bytes| {
            b.iter(|| parse_whole(bytes));
        });
        group.bench_with_input(BenchmarkId::new("chunked-1k", items), bytes, |b, bytes| {
            b.iter(|| parse_chunked(bytes, 1024));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
