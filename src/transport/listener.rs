//! Routes inbound ACK/NAK datagrams into a window sender.
//!
//! 将入站的ACK/NAK数据报路由到窗口发送方。

use super::DatagramTransport;
use crate::{
    packet::{MAX_DATAGRAM_SIZE, PacketType, codec},
    sender::WeakWindowSender,
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// First pause after a failed receive; doubled on every further failure.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);
const MAX_RECV_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Spawns a task that reads datagrams from `transport` and feeds the feedback
/// they carry into `sender`.
///
/// ACKs become [`WindowSender::on_ack`], NAKs become [`WindowSender::on_nak`].
/// Other packet types are ignored and malformed datagrams are discarded. The
/// listener only holds a weak handle, so it never keeps the sender alive; the
/// task ends once the sender has stopped, whether through
/// [`WindowSender::shutdown`] or because every handle was dropped.
///
/// Receive errors are retried after a pause that grows with each consecutive
/// failure.
///
/// 启动一个任务，从 `transport` 读取数据报并将其中的反馈送入 `sender`。
///
/// ACK 转为 [`WindowSender::on_ack`]，NAK 转为 [`WindowSender::on_nak`]。
/// 其他包类型被忽略，格式错误的数据报被丢弃。监听器只持有弱句柄，因此不会使发送方
/// 保持存活；无论是通过 [`WindowSender::shutdown`] 还是所有句柄都被丢弃，
/// 发送方停止后任务即结束。
///
/// 接收错误会在一段随连续失败次数增长的停顿之后重试。
///
/// [`WindowSender::on_ack`]: crate::sender::WindowSender::on_ack
/// [`WindowSender::on_nak`]: crate::sender::WindowSender::on_nak
/// [`WindowSender::shutdown`]: crate::sender::WindowSender::shutdown
pub fn spawn_feedback_listener<T: DatagramTransport>(
    transport: Arc<T>,
    sender: WeakWindowSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let mut backoff = RECV_ERROR_BACKOFF;
        loop {
            let received = tokio::select! {
                received = transport.recv_from(&mut buf) => received,
                _ = sender.closed() => break,
            };

            let (len, src_addr) = match received {
                Ok(received) => {
                    backoff = RECV_ERROR_BACKOFF;
                    received
                }
                Err(e) => {
                    // ICMP errors from earlier sends surface here on some platforms.
                    warn!(error = %e, retry_in = ?backoff, "Failed to receive datagram");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = sender.closed() => break,
                    }
                    backoff = (backoff * 2).min(MAX_RECV_ERROR_BACKOFF);
                    continue;
                }
            };
            let datagram = &buf[..len];

            let decoded = codec::decode_type(datagram)
                .and_then(|kind| Ok((kind, codec::decode_sequence(datagram)?)));
            let (kind, seq) = match decoded {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(addr = %src_addr, len, error = %e, "Discarding malformed datagram");
                    continue;
                }
            };

            if !kind.is_feedback() {
                trace!(addr = %src_addr, %kind, seq, "Ignoring non-feedback packet");
                continue;
            }
            let Some(handle) = sender.upgrade() else {
                break;
            };
            let routed = if kind == PacketType::Ack {
                handle.on_ack(seq).await
            } else {
                handle.on_nak(seq).await
            };
            if routed.is_err() {
                break;
            }
        }
        debug!("Feedback listener has shut down");
    })
}
