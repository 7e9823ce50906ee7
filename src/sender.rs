//! The sliding-window sender.
//!
//! A payload is split into chunks, each chunk becomes a DATA packet owned by a
//! frame, and at most `window_width` frames are outstanding at any time.
//! All window state lives in a single actor task; handles talk to it through
//! a command mailbox and frames report timer expiry through a second one.
//!
//! 滑动窗口发送方。
//!
//! 载荷被拆分为分片，每个分片成为一个由帧持有的DATA包，任意时刻最多有
//! `window_width` 个帧在途。所有窗口状态都位于单个actor任务中；句柄通过命令邮箱
//! 与其通信，帧通过另一个邮箱报告定时器到期。

mod actor;
mod command;
mod fragment;
mod frame;
mod handle;
mod window;

#[cfg(test)]
mod tests;

pub use handle::{PendingTransmission, WeakWindowSender, WindowSender};

use std::time::Duration;

/// The outcome of a transmission whose every fragment was acknowledged.
///
/// 所有分片都已被确认的传输结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionReport {
    /// Number of fragments (packets) the payload was split into.
    /// 载荷被拆分成的分片（包）数量。
    pub fragments: usize,
    /// Payload size in bytes.
    /// 载荷字节数。
    pub bytes: usize,
    /// Retransmissions spent across all fragments, timeout- or NAK-driven.
    /// 所有分片累计的重传次数（包括超时和NAK触发的）。
    pub retransmissions: u32,
    /// Time from the first admission to the last acknowledgment.
    /// 从首次接纳到最后一次确认的时间。
    pub elapsed: Duration,
}

/// A point-in-time view of the sender's window.
///
/// 发送方窗口的即时视图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub window_width: usize,
    pub slot_capacity: usize,
    /// Number of occupied slots. Never exceeds `window_width`.
    /// 已占用槽的数量。永远不超过 `window_width`。
    pub active_count: usize,
    /// Sequence numbers awaiting acknowledgment, ascending.
    /// 等待确认的序列号，升序。
    pub outstanding: Vec<u8>,
    /// Fragments of the current transmission not yet admitted to the window.
    /// 当前传输中尚未进入窗口的分片。
    pub pending_fragments: usize,
    /// Transmissions waiting behind the current one.
    /// 排在当前传输之后等待的传输。
    pub queued_transmissions: usize,
}
