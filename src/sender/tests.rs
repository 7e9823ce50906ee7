//! Tests for the window sender: admission, acknowledgments and retransmission.

use super::WindowSender;
use crate::{
    config::Config,
    error::Error,
    packet::{Packet, PacketType},
    testing::{RecordingTransport, TEST_PEER_ADDR, init_tracing},
};
use bytes::Bytes;
use std::{sync::Arc, time::Duration};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config(window_width: usize, max_chunk_size: usize, max_retries: u32) -> Config {
    let mut config = Config::default();
    config.window.window_width = window_width;
    config.window.max_chunk_size = max_chunk_size;
    config.retransmission.timeout_delay = TIMEOUT;
    config.retransmission.max_retries = max_retries;
    config
}

fn setup(config: Config) -> (WindowSender, Arc<RecordingTransport>) {
    init_tracing();
    let transport = RecordingTransport::new();
    let sender = WindowSender::spawn(transport.clone(), config).unwrap();
    (sender, transport)
}

fn decode(datagram: &Bytes) -> Packet {
    Packet::decode(datagram, TEST_PEER_ADDR).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_two_fragments_acknowledged() {
    let (sender, transport) = setup(config(5, 10, 10));

    let mut pending = sender
        .submit(Bytes::from_static(b"HELLOWORLD123"), TEST_PEER_ADDR)
        .await
        .unwrap();
    assert!(pending.admitted().await, "2 fragments fit into a window of 5");
    transport.wait_for_sends(2).await;

    let sent = transport.sent();
    let first = decode(&sent[0].0);
    let second = decode(&sent[1].0);
    assert_eq!(first.kind(), PacketType::Data);
    assert_eq!(first.sequence_number(), 0);
    assert_eq!(first.payload().as_ref(), b"HELLOWORLD");
    assert_eq!(second.sequence_number(), 1);
    assert_eq!(second.payload().as_ref(), b"123");
    assert!(sent.iter().all(|(_, addr)| *addr == TEST_PEER_ADDR));

    let snapshot = sender.snapshot().await.unwrap();
    assert_eq!(snapshot.active_count, 2);
    assert_eq!(snapshot.outstanding, vec![0, 1]);

    sender.on_ack(0).await.unwrap();
    sender.on_ack(1).await.unwrap();

    let report = pending.outcome().await.unwrap();
    assert_eq!(report.fragments, 2);
    assert_eq!(report.bytes, 13);
    assert_eq!(report.retransmissions, 0);
    assert_eq!(sender.snapshot().await.unwrap().active_count, 0);
    assert_eq!(transport.sent_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_fragment_exhausts_retries() {
    let (sender, transport) = setup(config(5, 10, 10));

    let pending = sender
        .submit(Bytes::from_static(b"HELLOWORLD123"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(2).await;
    sender.on_ack(1).await.unwrap();

    let result = pending.outcome().await;
    assert!(matches!(
        result,
        Err(Error::RetriesExhausted {
            sequence_number: 0,
            retries: 10
        })
    ));
    // One original transmission plus ten timeout-driven resends.
    assert_eq!(transport.sends_of(0), 11);
    assert_eq!(transport.sends_of(1), 1);

    // No further sends once the failure is reported.
    tokio::time::sleep(TIMEOUT * 4).await;
    assert_eq!(transport.sends_of(0), 11);
    assert_eq!(sender.snapshot().await.unwrap().active_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_window_never_exceeds_width() {
    let (sender, transport) = setup(config(3, 1, 10));

    let mut pending = sender
        .submit(Bytes::from_static(b"0123456789"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(3).await;

    let snapshot = sender.snapshot().await.unwrap();
    assert_eq!(snapshot.active_count, 3);
    assert_eq!(snapshot.slot_capacity, 6);
    assert_eq!(snapshot.outstanding, vec![0, 1, 2]);
    assert_eq!(snapshot.pending_fragments, 7);
    assert_eq!(transport.sent_count(), 3);
    assert!(
        tokio::time::timeout(Duration::from_millis(10), pending.admitted())
            .await
            .is_err(),
        "fragments are still waiting for room in the window"
    );

    // Acknowledge fragments in the order they were sent.
    let mut acked = 0;
    loop {
        let snapshot = sender.snapshot().await.unwrap();
        assert!(snapshot.active_count <= snapshot.window_width);
        if acked == transport.sent_count() {
            break;
        }
        let seq = transport.sent_sequences()[acked];
        sender.on_ack(seq).await.unwrap();
        acked += 1;
    }

    assert!(pending.admitted().await);
    let report = pending.outcome().await.unwrap();
    assert_eq!(report.fragments, 10);
    assert_eq!(
        transport.sent_sequences(),
        vec![0, 1, 2, 3, 4, 5, 0, 1, 2, 3]
    );
    let payload: Vec<u8> = transport
        .sent()
        .iter()
        .flat_map(|(datagram, _)| decode(datagram).payload().to_vec())
        .collect();
    assert_eq!(payload, b"0123456789");
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_ack_is_ignored() {
    let (sender, transport) = setup(config(5, 1, 10));

    let _pending = sender
        .submit(Bytes::from_static(b"abc"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(3).await;

    sender.on_ack(0).await.unwrap();
    let once = sender.snapshot().await.unwrap();
    sender.on_ack(0).await.unwrap();
    let twice = sender.snapshot().await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.active_count, 2);
    assert_eq!(twice.outstanding, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_nak_resends_without_freeing_slot() {
    let (sender, transport) = setup(config(5, 1, 10));

    let pending = sender
        .submit(Bytes::from_static(b"ab"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(2).await;

    sender.on_nak(0).await.unwrap();
    let snapshot = sender.snapshot().await.unwrap();
    assert_eq!(snapshot.active_count, 2);
    assert_eq!(snapshot.outstanding, vec![0, 1]);
    assert_eq!(transport.sends_of(0), 2);
    assert_eq!(transport.sends_of(1), 1);

    sender.on_ack(0).await.unwrap();
    sender.on_ack(1).await.unwrap();
    let report = pending.outcome().await.unwrap();
    assert_eq!(report.retransmissions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_naks_exhaust_retries() {
    let (sender, transport) = setup(config(5, 10, 1));

    let pending = sender
        .submit(Bytes::from_static(b"x"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(1).await;

    sender.on_nak(0).await.unwrap();
    sender.on_nak(0).await.unwrap();
    assert!(matches!(
        pending.outcome().await,
        Err(Error::RetriesExhausted {
            sequence_number: 0,
            retries: 1
        })
    ));
    assert_eq!(transport.sends_of(0), 2);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_feedback_is_ignored() {
    let (sender, transport) = setup(config(5, 10, 10));

    let _pending = sender
        .submit(Bytes::from_static(b"payload"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(1).await;
    let before = sender.snapshot().await.unwrap();

    for seq in [7u8, 10, 200, 255] {
        sender.on_ack(seq).await.unwrap();
        sender.on_nak(seq).await.unwrap();
    }

    assert_eq!(sender.snapshot().await.unwrap(), before);
    assert_eq!(transport.sent_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_payload_sends_one_packet() {
    let (sender, transport) = setup(config(5, 10, 10));

    let pending = sender.submit(Bytes::new(), TEST_PEER_ADDR).await.unwrap();
    transport.wait_for_sends(1).await;
    assert_eq!(transport.sent()[0].0.as_ref(), &[PacketType::Data as u8, 0]);

    sender.on_ack(0).await.unwrap();
    let report = pending.outcome().await.unwrap();
    assert_eq!(report.fragments, 1);
    assert_eq!(report.bytes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_window_does_not_slide_past_oldest_outstanding() {
    // Width 2, capacity 4.
    let (sender, transport) = setup(config(2, 1, 10));

    let pending = sender
        .submit(Bytes::from_static(b"abcdef"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(2).await;

    // A slot is free, but 2 is a full window ahead of the stuck 0.
    sender.on_ack(1).await.unwrap();
    let snapshot = sender.snapshot().await.unwrap();
    assert_eq!(snapshot.outstanding, vec![0]);
    assert_eq!(snapshot.pending_fragments, 4);
    assert_eq!(transport.sent_sequences(), vec![0, 1]);

    sender.on_ack(0).await.unwrap();
    assert_eq!(sender.snapshot().await.unwrap().outstanding, vec![2, 3]);

    // Sequence numbers wrap; 0 waits until 2 is acknowledged.
    sender.on_ack(3).await.unwrap();
    assert_eq!(sender.snapshot().await.unwrap().outstanding, vec![2]);
    sender.on_ack(2).await.unwrap();
    assert_eq!(sender.snapshot().await.unwrap().outstanding, vec![0, 1]);
    assert_eq!(transport.sent_sequences(), vec![0, 1, 2, 3, 0, 1]);

    sender.on_ack(0).await.unwrap();
    sender.on_ack(1).await.unwrap();
    let report = pending.outcome().await.unwrap();
    assert_eq!(report.fragments, 6);
    let payload: Vec<u8> = transport
        .sent()
        .iter()
        .flat_map(|(datagram, _)| decode(datagram).payload().to_vec())
        .collect();
    assert_eq!(payload, b"abcdef");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_retransmission_is_reported() {
    let (sender, transport) = setup(config(5, 10, 10));

    let pending = sender
        .submit(Bytes::from_static(b"slow"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(1).await;

    tokio::time::sleep(TIMEOUT + TIMEOUT / 2).await;
    assert_eq!(transport.sends_of(0), 2);

    sender.on_ack(0).await.unwrap();
    let report = pending.outcome().await.unwrap();
    assert_eq!(report.retransmissions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_transmissions_run_one_after_another() {
    let (sender, transport) = setup(config(5, 10, 10));

    let first = sender
        .submit(Bytes::from_static(b"first"), TEST_PEER_ADDR)
        .await
        .unwrap();
    let second = sender
        .submit(Bytes::from_static(b"second"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(1).await;

    let snapshot = sender.snapshot().await.unwrap();
    assert_eq!(snapshot.outstanding, vec![0]);
    assert_eq!(snapshot.queued_transmissions, 1);
    assert_eq!(transport.sent_count(), 1);

    sender.on_ack(0).await.unwrap();
    assert_eq!(first.outcome().await.unwrap().bytes, 5);

    transport.wait_for_sends(2).await;
    let packet = decode(&transport.sent()[1].0);
    assert_eq!(packet.sequence_number(), 1);
    assert_eq!(packet.payload().as_ref(), b"second");

    sender.on_ack(1).await.unwrap();
    assert_eq!(second.outcome().await.unwrap().bytes, 6);
}

#[tokio::test(start_paused = true)]
async fn test_text_is_sent_as_utf8() {
    let (sender, transport) = setup(config(5, 64, 10));

    let send = {
        let sender = sender.clone();
        tokio::spawn(async move { sender.send_text("grüß dich", TEST_PEER_ADDR).await })
    };
    transport.wait_for_sends(1).await;
    let packet = decode(&transport.sent()[0].0);
    assert_eq!(packet.payload_as_text().unwrap(), "grüß dich");

    sender.on_ack(0).await.unwrap();
    assert!(send.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_and_stops_sending() {
    let (sender, transport) = setup(config(5, 1, 10));

    let first = sender
        .submit(Bytes::from_static(b"abc"), TEST_PEER_ADDR)
        .await
        .unwrap();
    let queued = sender
        .submit(Bytes::from_static(b"def"), TEST_PEER_ADDR)
        .await
        .unwrap();
    transport.wait_for_sends(3).await;

    sender.shutdown().await.unwrap();
    assert!(matches!(first.outcome().await, Err(Error::TransmissionAborted)));
    assert!(matches!(queued.outcome().await, Err(Error::TransmissionAborted)));

    sender.closed().await;
    tokio::time::sleep(TIMEOUT * 3).await;
    assert_eq!(transport.sent_count(), 3, "cancelled frames must not resend");
    assert!(matches!(sender.on_ack(0).await, Err(Error::ChannelClosed)));
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let transport = RecordingTransport::new();
    let result = WindowSender::spawn(transport, config(0, 10, 10));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
