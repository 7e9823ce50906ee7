//! tests/common/harness.rs
use sliding_arq::{Config, Packet, PacketType, WindowSender, spawn_feedback_listener};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "sliding_arq=debug,loopback=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A config with short timers, suitable for loopback tests.
pub fn fast_config(window_width: usize, max_retries: u32) -> Config {
    let mut config = Config::default();
    config.window.window_width = window_width;
    config.retransmission.timeout_delay = Duration::from_millis(50);
    config.retransmission.max_retries = max_retries;
    config
}

/// How the test peer treats incoming DATA packets.
#[derive(Debug, Clone, Default)]
pub struct PeerBehavior {
    /// Sequence numbers that are never acknowledged.
    pub withhold_acks: Vec<u8>,
    /// Answer the first arrival of every fragment with a NAK.
    pub nak_first_arrival: bool,
    /// Silently drop every n-th datagram, simulating a lossy link.
    pub drop_every: Option<usize>,
}

/// A receiving peer that acknowledges DATA packets and reassembles the byte
/// stream in sequence order, selective-repeat style.
pub struct TestPeer {
    pub addr: SocketAddr,
    pub socket: Arc<UdpSocket>,
    received: Arc<Mutex<Vec<u8>>>,
    _task: JoinHandle<()>,
}

impl TestPeer {
    pub async fn spawn(config: &Config, behavior: PeerBehavior) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(peer_loop(
            socket.clone(),
            received.clone(),
            config.window.window_width,
            config.window.slot_capacity(),
            behavior,
        ));
        Self {
            addr,
            socket,
            received,
            _task: task,
        }
    }

    /// The in-order byte stream delivered so far.
    pub fn received(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }
}

async fn peer_loop(
    socket: Arc<UdpSocket>,
    received: Arc<Mutex<Vec<u8>>>,
    window_width: usize,
    capacity: usize,
    behavior: PeerBehavior,
) {
    let mut buf = vec![0u8; 2048];
    let mut expected = 0usize;
    let mut out_of_order: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    let mut seen_once = vec![false; capacity];
    let mut datagrams = 0usize;

    loop {
        let Ok((len, src)) = socket.recv_from(&mut buf).await else {
            continue;
        };
        datagrams += 1;
        if behavior.drop_every.is_some_and(|n| datagrams % n == 0) {
            continue;
        }
        let Ok(packet) = Packet::decode(&buf[..len], src) else {
            continue;
        };
        if packet.kind() != PacketType::Data {
            continue;
        }
        let seq = packet.sequence_number();
        let slot = usize::from(seq);

        if behavior.nak_first_arrival && !seen_once[slot] {
            seen_once[slot] = true;
            reply(&socket, PacketType::Nak, seq, src).await;
            continue;
        }
        seen_once[slot] = false;

        // Accept fragments inside the receive window; anything else is a
        // duplicate of something already delivered.
        let distance = (slot + capacity - expected) % capacity;
        if distance < window_width {
            out_of_order.insert(distance, packet.payload().to_vec());
            while let Some(chunk) = out_of_order.remove(&0) {
                received.lock().unwrap().extend_from_slice(&chunk);
                expected = (expected + 1) % capacity;
                out_of_order = out_of_order
                    .into_iter()
                    .map(|(distance, chunk)| (distance - 1, chunk))
                    .collect();
            }
        }

        if !behavior.withhold_acks.contains(&seq) {
            reply(&socket, PacketType::Ack, seq, src).await;
        }
    }
}

async fn reply(socket: &UdpSocket, kind: PacketType, seq: u8, to: SocketAddr) {
    let datagram = Packet::empty(kind, seq, to).to_bytes().unwrap();
    let _ = socket.send_to(&datagram, to).await;
}

/// A window sender on its own loopback socket, with a feedback listener
/// routing the peer's ACK/NAK datagrams back into it.
pub struct TestSender {
    pub sender: WindowSender,
    pub socket: Arc<UdpSocket>,
    pub listener: JoinHandle<()>,
}

impl TestSender {
    pub async fn spawn(config: Config) -> Self {
        init_tracing();
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let sender = WindowSender::spawn(socket.clone(), config).unwrap();
        let listener = spawn_feedback_listener(socket.clone(), sender.downgrade());
        Self {
            sender,
            socket,
            listener,
        }
    }
}

/// A deterministic, non-repeating-looking payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
