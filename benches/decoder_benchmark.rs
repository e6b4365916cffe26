//! Performance benchmarks for stream decoding
//!
//! Measures decode throughput for replies of different lengths and chunk
//! sizes. Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use michi::sse::{decode_chunks, ChatStreamDecoder};

/// Generate a wrapped reply with the given number of text lines
fn generate_reply(lines: usize) -> String {
    let mut body = String::from(": connected\ndata:event: init\ndata:data: {\"conversationId\":\"bench\"}\n");
    for i in 0..lines {
        body.push_str(&format!(
            "data:data: Línea {} con acentos, emojis 🩺 y un salto\\nliteral.\n",
            i
        ));
    }
    body.push_str("data:event: complete\ndata:data: {\"status\":\"done\"}\ndata:data: [DONE]\n");
    body
}

/// Benchmark decoding the whole reply as one chunk
fn bench_decode_single_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_single_chunk");

    for size in [10, 100, 1000].iter() {
        let body = generate_reply(*size);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| decode_chunks([black_box(body.as_bytes())]))
        });
    }

    group.finish();
}

/// Benchmark decoding with small transport chunks that split characters and lines
fn bench_decode_small_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_small_chunks");
    let body = generate_reply(200);
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunk_size in [7, 64, 512].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = ChatStreamDecoder::new();
                    let mut count = 0;
                    for chunk in body.as_bytes().chunks(chunk_size) {
                        count += decoder.feed(black_box(chunk)).len();
                    }
                    count + decoder.finish().len()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode_single_chunk, bench_decode_small_chunks);
criterion_main!(benches);
