#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the sliding-window ARQ library.
//! 滑动窗口ARQ库的根。
//!
//! Payloads are fragmented into bounded packets, framed with a type and a
//! one-byte sequence number, and delivered over an unreliable datagram
//! transport with per-frame retransmission timers.
//!
//! 载荷被拆分为有界的包，附上类型和单字节序列号，并通过不可靠的数据报传输
//! 配合每帧重传定时器进行投递。

pub mod config;
pub mod error;
pub mod packet;
pub mod sender;
pub mod transport;

mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use packet::{Packet, PacketType};
pub use sender::{
    PendingTransmission, TransmissionReport, WeakWindowSender, WindowSender, WindowSnapshot,
};
pub use transport::{DatagramTransport, spawn_feedback_listener};
