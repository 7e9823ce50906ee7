//! 定义了发送窗口和重传的可配置参数。
//! Defines configurable parameters for the send window and retransmission.

use crate::{
    error::{Error, Result},
    packet::MAX_CHUNK_SIZE,
};
use std::time::Duration;

/// A structure containing all configurable parameters for a window sender.
///
/// 包含窗口发送方所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Window and fragmentation parameters.
    /// 窗口和分片相关参数。
    pub window: WindowConfig,

    /// Retransmission timer parameters.
    /// 重传定时器相关参数。
    pub retransmission: RetransmissionConfig,
}

/// Window and fragmentation parameters.
///
/// 窗口和分片相关参数。
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// The maximum number of unacknowledged frames outstanding at once.
    /// 同时在途的未确认帧的最大数量。
    pub window_width: usize,
    /// The largest payload carried by one fragment. Must not exceed
    /// [`MAX_CHUNK_SIZE`], which is what the receiving side expects.
    ///
    /// 单个分片携带的最大载荷。不得超过接收方所预期的 [`MAX_CHUNK_SIZE`]。
    pub max_chunk_size: usize,
    /// The capacity of the sender's command mailbox.
    /// 发送方命令邮箱的容量。
    pub command_channel_capacity: usize,
}

/// Retransmission timer parameters.
///
/// 重传定时器相关参数。
#[derive(Debug, Clone)]
pub struct RetransmissionConfig {
    /// How long a frame waits for its acknowledgment before resending.
    /// 帧在重发前等待确认的时长。
    pub timeout_delay: Duration,
    /// How many times a frame may be retransmitted before the transmission is
    /// reported as failed. A frame is sent at most `1 + max_retries` times.
    ///
    /// 帧在传输被报告失败前可重传的次数。一个帧最多发送 `1 + max_retries` 次。
    pub max_retries: u32,
}

impl WindowConfig {
    /// The number of slots in the sequence-indexed table, twice the window width.
    /// 按序列号索引的槽表大小，为窗口宽度的两倍。
    pub fn slot_capacity(&self) -> usize {
        self.window_width * 2
    }
}

impl Config {
    /// Checks that the configuration can be used to build a sender.
    ///
    /// 检查该配置是否可用于构建发送方。
    pub fn validate(&self) -> Result<()> {
        if self.window.window_width == 0 {
            return Err(Error::InvalidConfig("window_width must be at least 1"));
        }
        // Sequence numbers are a single byte on the wire.
        if self.window.slot_capacity() > usize::from(u8::MAX) + 1 {
            return Err(Error::InvalidConfig("window_width must be at most 128"));
        }
        if self.window.max_chunk_size == 0 || self.window.max_chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig(
                "max_chunk_size must be between 1 and MAX_CHUNK_SIZE",
            ));
        }
        if self.window.command_channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "command_channel_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_width: 5,
            max_chunk_size: MAX_CHUNK_SIZE,
            command_channel_capacity: 128,
        }
    }
}

impl Default for RetransmissionConfig {
    fn default() -> Self {
        Self {
            timeout_delay: Duration::from_millis(5000),
            max_retries: 10,
        }
    }
}
