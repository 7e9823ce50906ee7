//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::{
    error::{Error, Result},
    packet::{PacketType, codec},
    transport::DatagramTransport,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{
        Arc, Mutex, Once,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::Notify;

pub const TEST_LOCAL_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 12345);
pub const TEST_PEER_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 54321);

/// Initializes tracing for unit tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "sliding_arq=debug".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A transport that records every datagram handed to it and never receives.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(Bytes, SocketAddr)>>,
    notify: Notify,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes subsequent sends fail with an I/O error (nothing is recorded).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Bytes, SocketAddr)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// How many DATA datagrams with sequence number `seq` were sent.
    pub fn sends_of(&self, seq: u8) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(datagram, _)| {
                codec::decode_type(datagram).ok() == Some(PacketType::Data)
                    && codec::decode_sequence(datagram).ok() == Some(seq)
            })
            .count()
    }

    /// Sequence numbers of the recorded datagrams, in send order.
    pub fn sent_sequences(&self) -> Vec<u8> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(datagram, _)| codec::decode_sequence(datagram).ok())
            .collect()
    }

    /// Waits until at least `count` datagrams have been recorded.
    pub async fn wait_for_sends(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.sent_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl DatagramTransport for RecordingTransport {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::ErrorKind::NetworkUnreachable.into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((Bytes::copy_from_slice(buf), target));
        self.notify.notify_waiters();
        Ok(buf.len())
    }

    async fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        std::future::pending().await
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(TEST_LOCAL_ADDR)
    }
}
