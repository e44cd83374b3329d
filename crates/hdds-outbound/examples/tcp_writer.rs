// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP Writer Example
//!
//! Starts a local line server, connects a writer to it in the background,
//! and publishes a burst of messages from several threads.
//!
//! Run with:
//! ```bash
//! cargo run -p hdds-outbound --example tcp_writer
//! cargo run -p hdds-outbound --example tcp_writer -- writer.toml
//! ```

use hdds_outbound::{
    transport_channel, ConnectionWriter, LockstepWriter, StreamDataPort, WriterConfig,
    WriterContext, WriterError, WriterMetrics,
};
use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => WriterConfig::from_file(path)?,
        None => WriterConfig::default(),
    };

    println!("============================================");
    println!("  HDDS Outbound Writer - TCP Example");
    println!("============================================\n");
    println!("Writer thread: {}", config.thread_name);
    match config.discard_threshold() {
        Some(limit) => println!("Backpressure: drop above {} pending messages\n", limit),
        None => println!("Backpressure: disabled\n"),
    }

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let server = thread::spawn(move || -> std::io::Result<usize> {
        let (stream, peer) = listener.accept()?;
        println!("[server] accepted {}", peer);
        let mut lines = 0;
        for line in BufReader::new(stream).lines() {
            let line = line?;
            if line.starts_with("PUB") {
                lines += 1;
            }
        }
        Ok(lines)
    });

    let metrics = Arc::new(WriterMetrics::new());
    let ctx = WriterContext::new(
        metrics.clone(),
        Arc::new(|err: &WriterError| eprintln!("[client] connection fault: {}", err)),
    );
    let writer = Arc::new(LockstepWriter::new(&config, ctx));

    // The writer starts before the socket exists; messages queue meanwhile.
    let (promise, future) = transport_channel();
    let completion = writer.start(future)?;
    writer.append_internal(&"CONNECT {\"name\":\"tcp_writer\"}\r\n");

    thread::spawn(move || match TcpStream::connect(addr) {
        Ok(stream) => promise.complete(StreamDataPort::new(stream)),
        Err(e) => promise.fail(e),
    });

    let producers: Vec<_> = (0..4)
        .map(|id| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                let mut sent = 0;
                for seq in 0..250 {
                    let body = format!("producer-{} seq-{}", id, seq);
                    let msg = format!("PUB demo {}\r\n{}\r\n", body.len(), body);
                    if writer.append(&msg) {
                        sent += 1;
                    }
                }
                sent
            })
        })
        .collect();

    let mut sent = 0;
    for p in producers {
        sent += p.join().map_err(|_| "producer panicked")?;
    }

    let exit = writer.stop().wait();
    assert!(completion.is_complete());
    drop(writer);

    let snapshot = metrics.snapshot();
    println!("[client] appended {} messages, writer exit: {:?}", sent, exit);
    println!(
        "[client] {} writes, {} bytes, avg {:.1} bytes/write, {} bytes unwritten",
        snapshot.writes,
        snapshot.bytes_written,
        snapshot.avg_write_size(),
        snapshot.unwritten_bytes()
    );

    let received = server.join().map_err(|_| "server panicked")??;
    println!("[server] received {} PUB lines", received);

    Ok(())
}
