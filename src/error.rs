//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the sliding-window ARQ library.
/// 滑动窗口ARQ库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred.
    /// 发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A datagram was shorter than the two-byte packet header.
    /// 数据报短于两字节的包头。
    #[error("datagram of {len} bytes is shorter than the packet header")]
    Truncated { len: usize },

    /// The type byte of a datagram does not name a known packet type.
    /// 数据报的类型字节不是已知的包类型。
    #[error("unknown packet type {0}")]
    UnknownPacketType(u8),

    /// The payload does not fit into a single datagram.
    /// 载荷无法放入单个数据报。
    #[error("payload of {len} bytes exceeds the maximum chunk size of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// A management payload was not exactly a 4-byte integer.
    /// 管理包的载荷不是恰好4字节的整数。
    #[error("integer payload must be 4 bytes, got {len}")]
    InvalidInteger { len: usize },

    /// A text payload was not valid UTF-8.
    /// 文本载荷不是有效的UTF-8。
    #[error("text payload is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    /// A fragment was retransmitted the maximum number of times without being
    /// acknowledged. The transmission it belonged to has failed.
    ///
    /// 某个分片已达到最大重传次数仍未被确认，其所属的传输失败。
    #[error("fragment {sequence_number} was not acknowledged after {retries} retransmissions")]
    RetriesExhausted { sequence_number: u8, retries: u32 },

    /// The sender was shut down before the transmission completed.
    /// 发送方在传输完成前被关闭。
    #[error("transmission aborted by sender shutdown")]
    TransmissionAborted,

    /// An internal channel for communication between tasks was closed unexpectedly.
    /// 用于任务间通信的内部通道意外关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,

    /// The configuration violates one of its constraints.
    /// 配置违反了其约束之一。
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::Truncated { .. }
            | Error::UnknownPacketType(_)
            | Error::InvalidInteger { .. } => ErrorKind::InvalidData.into(),
            Error::InvalidText(e) => std::io::Error::new(ErrorKind::InvalidData, e),
            Error::PayloadTooLarge { .. } => ErrorKind::InvalidInput.into(),
            Error::RetriesExhausted { .. } => ErrorKind::TimedOut.into(),
            Error::TransmissionAborted => ErrorKind::ConnectionAborted.into(),
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
            Error::InvalidConfig(msg) => std::io::Error::new(ErrorKind::InvalidInput, msg),
        }
    }
}
