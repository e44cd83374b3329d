// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//!
//! Benchmark: append throughput through the lock-step writer
//!
//! Measures the producer-side cost of `append`, which includes one full
//! rendezvous with the writer thread per message, against a sink transport.

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hdds_outbound::{
    BufferStore, ConnectionWriter, Lane, LockstepWriter, StreamDataPort, TransportFuture,
    WriterConfig, WriterContext, WriterError, WriterMetrics,
};
use std::sync::Arc;
use std::thread;

fn started_writer() -> LockstepWriter {
    let ctx = WriterContext::new(
        Arc::new(WriterMetrics::new()),
        Arc::new(|err: &WriterError| panic!("unexpected writer fault: {}", err)),
    );
    let writer = LockstepWriter::new(&WriterConfig::default(), ctx);
    writer
        .start(TransportFuture::ready(StreamDataPort::new(std::io::sink())))
        .expect("start writer");
    writer
}

fn bench_single_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_single_producer");

    for size in [16usize, 256, 4096] {
        let payload = vec![0xA5u8; size];
        let writer = started_writer();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| writer.append(black_box(payload)));
        });

        writer.stop().wait();
    }

    group.finish();
}

fn bench_contended_producers(c: &mut Criterion) {
    const MESSAGES_PER_THREAD: usize = 1000;
    let mut group = c.benchmark_group("append_contended");

    for producers in [2usize, 4] {
        let writer = Arc::new(started_writer());

        group.throughput(Throughput::Elements((producers * MESSAGES_PER_THREAD) as u64));
        group.bench_function(BenchmarkId::from_parameter(producers), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..producers)
                    .map(|_| {
                        let writer = Arc::clone(&writer);
                        thread::spawn(move || {
                            for _ in 0..MESSAGES_PER_THREAD {
                                writer.append(&b"PUB bench 4\r\ndata\r\n");
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().expect("producer panicked");
                }
            });
        });

        writer.stop().wait();
    }

    group.finish();
}

fn bench_buffer_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_store");
    let payload = [0x5Au8; 128];

    group.bench_function("append_drain_64", |b| {
        let mut store = BufferStore::new(64 * 1024);
        b.iter(|| {
            for _ in 0..64 {
                store.append(Lane::Normal, &payload);
            }
            store
                .drain_with::<(), _>(Lane::Normal, |bytes| {
                    black_box(bytes);
                    Ok(())
                })
                .expect("drain");
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_producer,
    bench_contended_producers,
    bench_buffer_store
);
criterion_main!(benches);
