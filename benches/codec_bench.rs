use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use segment_codec::core::read::{hash_to_end, read_prefixed_text, read_varint};
use segment_codec::core::sink::MemorySink;
use segment_codec::core::text::{DecodeContext, EncodeContext, TextEncoding};
use segment_codec::core::write::{write_text, write_varint, TextWriteOptions};
use segment_codec::utils::length::LengthPrefix;
use std::io;
use tokio::runtime::Runtime;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Split `data` into `segment`-sized chunks behind a `StreamReader`
fn segmented(
    data: &[u8],
    segment: usize,
) -> StreamReader<futures::stream::Iter<std::vec::IntoIter<io::Result<Bytes>>>, Bytes> {
    let chunks: Vec<io::Result<Bytes>> = data
        .chunks(segment)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    StreamReader::new(futures::stream::iter(chunks))
}

#[allow(clippy::unwrap_used)]
fn bench_text_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("text_roundtrip");
    let lengths = [16usize, 256, 4096, 65536];

    for &len in &lengths {
        let text: String = "abcdéfgh".chars().cycle().take(len).collect();
        group.throughput(Throughput::Bytes(text.len() as u64));

        let text_ref = &text;
        group.bench_function(format!("write_{len}c"), |b| {
            b.to_async(&rt).iter(|| async move {
                let cancel = CancellationToken::new();
                let mut sink = MemorySink::new();
                let mut ctx = EncodeContext::new(TextEncoding::Utf8);
                write_text(
                    &mut sink,
                    text_ref,
                    LengthPrefix::Compressed,
                    &mut ctx,
                    &TextWriteOptions::default(),
                    &cancel,
                )
                .await
                .unwrap();
            })
        });

        let encoded = rt.block_on(async {
            let mut sink = MemorySink::new();
            let mut ctx = EncodeContext::new(TextEncoding::Utf8);
            write_text(
                &mut sink,
                &text,
                LengthPrefix::Compressed,
                &mut ctx,
                &TextWriteOptions::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
            sink.into_bytes()
        });

        group.bench_function(format!("read_{len}c_seg512"), |b| {
            b.to_async(&rt).iter_batched(
                || segmented(&encoded, 512),
                |mut source| async move {
                    let mut ctx = DecodeContext::new(TextEncoding::Utf8);
                    read_prefixed_text(
                        &mut source,
                        LengthPrefix::Compressed,
                        usize::MAX,
                        &mut ctx,
                        &CancellationToken::new(),
                    )
                    .await
                    .unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_varint(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("varint");
    let values = [0u32, 300, 1 << 21, u32::MAX];

    for &value in &values {
        group.bench_function(format!("roundtrip_{value}"), |b| {
            b.to_async(&rt).iter(|| async move {
                let cancel = CancellationToken::new();
                let mut sink = MemorySink::new();
                write_varint(&mut sink, value, &cancel).await.unwrap();
                let bytes = sink.into_bytes();
                let mut source = &bytes[..];
                read_varint(&mut source, &cancel).await.unwrap()
            })
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_hash(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hash_to_end");
    let data = vec![0xA5u8; 1024 * 1024];
    group.throughput(Throughput::Bytes(data.len() as u64));

    for &segment in &[512usize, 16 * 1024] {
        group.bench_function(format!("sha256_seg{segment}"), |b| {
            b.to_async(&rt).iter_batched(
                || segmented(&data, segment),
                |mut source| async move {
                    let mut digest = <sha2::Sha256 as sha2::Digest>::new();
                    hash_to_end(&mut source, &mut digest, &CancellationToken::new())
                        .await
                        .unwrap()
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_text_roundtrip, bench_varint, bench_hash);
criterion_main!(benches);
