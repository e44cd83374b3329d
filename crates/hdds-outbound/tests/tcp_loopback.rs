// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP loopback integration tests
//!
//! Drives a writer over a real socket and reads the bytes back on the
//! accepting side.

use hdds_outbound::{
    transport_channel, ConnectionWriter, LockstepWriter, StreamDataPort, TransportFuture,
    WriterConfig, WriterContext, WriterError, WriterExit, WriterMetrics,
};
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn loopback() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let client = TcpStream::connect(addr).expect("connect loopback");
    let (server, _) = listener.accept().expect("accept loopback");
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    (client, server)
}

fn read_exact_len(server: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut received = vec![0u8; len];
    server.read_exact(&mut received).expect("read from writer");
    received
}

fn writer(metrics: Arc<WriterMetrics>, faults: Arc<AtomicUsize>) -> LockstepWriter {
    let ctx = WriterContext::new(
        metrics,
        Arc::new(move |_: &WriterError| {
            faults.fetch_add(1, Ordering::SeqCst);
        }),
    );
    LockstepWriter::new(&WriterConfig::default(), ctx)
}

#[test]
fn test_protocol_lines_over_tcp() {
    let (client, mut server) = loopback();
    let metrics = Arc::new(WriterMetrics::new());
    let faults = Arc::new(AtomicUsize::new(0));
    let writer = writer(metrics.clone(), faults.clone());

    let (promise, future) = transport_channel();
    let completion = writer.start(future).expect("start writer");

    // Connect logic hands the socket over once the handshake is queued.
    writer.append_internal(&"CONNECT {\"verbose\":false}\r\n");
    promise.complete(StreamDataPort::new(client));

    let mut expected = b"CONNECT {\"verbose\":false}\r\n".to_vec();
    for i in 0..50 {
        let line = format!("PUB updates {}\r\nmsg-{:02}\r\n", 6, i);
        assert!(writer.append(&line));
        expected.extend_from_slice(line.as_bytes());
    }

    assert_eq!(read_exact_len(&mut server, expected.len()), expected);
    assert_eq!(writer.stop().wait(), WriterExit::Stopped);
    assert!(completion.is_complete());

    assert_eq!(faults.load(Ordering::SeqCst), 0);
    assert_eq!(metrics.out_msgs(), 51);
    assert_eq!(metrics.bytes_written(), expected.len() as u64);
}

#[test]
fn test_reconnect_swaps_socket() {
    let metrics = Arc::new(WriterMetrics::new());
    let faults = Arc::new(AtomicUsize::new(0));
    let reconnecting = Arc::new(AtomicBool::new(false));
    let ctx = WriterContext::new(metrics.clone(), {
        let faults = faults.clone();
        Arc::new(move |_: &WriterError| {
            faults.fetch_add(1, Ordering::SeqCst);
        })
    })
    .with_reconnect_mode(Arc::clone(&reconnecting));
    let writer = LockstepWriter::new(&WriterConfig::default(), ctx);

    let (first_client, mut first_server) = loopback();
    writer
        .start(TransportFuture::ready(StreamDataPort::new(
            first_client,
        )))
        .expect("start writer");
    assert!(writer.append(&"PUB a 1\r\n1\r\n"));
    assert_eq!(read_exact_len(&mut first_server, 12), b"PUB a 1\r\n1\r\n");

    // Connection drops: stop, reconnect, replay subscriptions on staging.
    reconnecting.store(true, Ordering::SeqCst);
    assert_eq!(writer.stop().wait(), WriterExit::Stopped);
    drop(first_server);

    let (second_client, mut second_server) = loopback();
    writer
        .start(TransportFuture::ready(StreamDataPort::new(
            second_client,
        )))
        .expect("restart writer");
    writer.append_internal(&"SUB a 1\r\n");
    assert_eq!(read_exact_len(&mut second_server, 9), b"SUB a 1\r\n");

    // Back to normal traffic.
    reconnecting.store(false, Ordering::SeqCst);
    assert!(writer.append(&"PUB a 1\r\n2\r\n"));
    assert_eq!(read_exact_len(&mut second_server, 12), b"PUB a 1\r\n2\r\n");

    assert_eq!(writer.stop().wait(), WriterExit::Stopped);
    assert_eq!(faults.load(Ordering::SeqCst), 0);
}
