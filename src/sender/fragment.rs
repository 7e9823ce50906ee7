//! Splits a payload into chunks that each fit into one packet.
//!
//! 将载荷拆分为每块都能放入一个包的分片。

use bytes::Bytes;
use std::collections::VecDeque;

/// Splits `payload` into chunks of at most `max_chunk_size` bytes, in order.
///
/// The chunks share the payload's buffer. An empty payload still yields one
/// (empty) chunk so that the receiver observes the transmission.
///
/// 将 `payload` 按顺序拆分为不超过 `max_chunk_size` 字节的分片。
///
/// 分片共享载荷的缓冲区。空载荷仍会产生一个（空的）分片，使接收方能观察到这次传输。
pub(crate) fn fragment(payload: &Bytes, max_chunk_size: usize) -> VecDeque<Bytes> {
    debug_assert!(max_chunk_size > 0);
    if payload.is_empty() {
        return VecDeque::from([Bytes::new()]);
    }
    (0..payload.len())
        .step_by(max_chunk_size)
        .map(|start| payload.slice(start..(start + max_chunk_size).min(payload.len())))
        .collect()
}
