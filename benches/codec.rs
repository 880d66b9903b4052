//! Benchmarks for frame decoding on the hot receive path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use telewire::protocol::{
    Batch, HttpMethod, HttpVersion, RequestLogEntry, ServerMessage, StatEntry,
};

fn stats_frame(count: u64) -> Vec<u8> {
    let records = (0..count)
        .map(|i| StatEntry {
            requests: i,
            timestamp: 60_000 * (i + 1),
            prev_timestamp: 60_000 * i,
            ..Default::default()
        })
        .collect();
    ServerMessage::Stats(Batch::new(1_000, records)).encode().to_vec()
}

fn requests_frame(count: u64) -> Vec<u8> {
    let records = (0..count)
        .map(|i| RequestLogEntry {
            method: HttpMethod::Get,
            version: HttpVersion::Http11,
            content_length: 1024,
            start_micros: i * 1_000,
            end_micros: i * 1_000 + 250,
            status: 200,
            uri: format!("/item/{}", i),
            query: "page=1".to_string(),
            user_agent: "bench".to_string(),
            referer: String::new(),
            uri_requested: String::new(),
        })
        .collect();
    ServerMessage::RecentRequests(Batch::new(1_000, records))
        .encode()
        .to_vec()
}

fn bench_decode_stats(c: &mut Criterion) {
    let frame = stats_frame(60);
    c.bench_function("decode_stats_60", |b| {
        b.iter(|| ServerMessage::decode(black_box(&frame)))
    });
}

fn bench_decode_requests(c: &mut Criterion) {
    let frame = requests_frame(100);
    c.bench_function("decode_requests_100", |b| {
        b.iter(|| ServerMessage::decode(black_box(&frame)))
    });
}

fn bench_encode_stats(c: &mut Criterion) {
    let message = ServerMessage::decode(&stats_frame(60)).unwrap();
    c.bench_function("encode_stats_60", |b| b.iter(|| black_box(&message).encode()));
}

criterion_group!(
    benches,
    bench_decode_stats,
    bench_decode_requests,
    bench_encode_stats
);
criterion_main!(benches);
