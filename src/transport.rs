//! Transport layer abstraction for datagram communication.
//!
//! The window sender only needs to hand a datagram to an address and, through
//! the feedback listener, to receive datagrams. Neither operation guarantees
//! delivery or ordering.
//!
//! 数据报通信的传输层抽象。
//!
//! 窗口发送方只需要把数据报交给某个地址，并通过反馈监听器接收数据报。
//! 两个操作都不保证送达或顺序。

pub mod listener;

use crate::error::Result;
use async_trait::async_trait;
use std::{fmt::Debug, net::SocketAddr};
use tokio::net::UdpSocket;

pub use listener::spawn_feedback_listener;

/// An asynchronous, unreliable datagram interface.
///
/// This trait allows for abstracting over the underlying socket implementation,
/// enabling custom transports for testing or other purposes. Implementations
/// must tolerate concurrent `send_to` calls from many frames.
///
/// 异步的不可靠数据报接口。
///
/// 此trait允许对底层套接字实现进行抽象，从而可以为测试或其他目的自定义传输。
/// 实现必须能承受来自多个帧的并发 `send_to` 调用。
#[async_trait]
pub trait DatagramTransport: Send + Sync + Debug + 'static {
    /// Sends a datagram to the given address.
    /// 向给定地址发送一个数据报。
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize>;

    /// Receives a single datagram.
    /// 接收单个数据报。
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    /// Returns the local address that this transport is bound to.
    /// 返回此传输绑定的本地地址。
    fn local_addr(&self) -> Result<SocketAddr>;
}

#[async_trait]
impl DatagramTransport for UdpSocket {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        UdpSocket::send_to(self, buf, target).await.map_err(Into::into)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await.map_err(Into::into)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        UdpSocket::local_addr(self).map_err(Into::into)
    }
}
