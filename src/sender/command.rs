//! Commands sent from `WindowSender` handles to the sender actor.
//!
//! 从 `WindowSender` 句柄发送到发送方actor的命令。

use super::{TransmissionReport, WindowSnapshot};
use crate::error::Result;
use bytes::Bytes;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Commands sent to the sender actor.
///
/// This enum encapsulates every operation a handle can perform. Acknowledgment
/// events travel through the same mailbox as new transmissions, so all of them
/// are applied to the window in arrival order.
///
/// 发送到发送方actor的命令。
///
/// 此枚举封装了句柄可执行的所有操作。确认事件与新传输走同一个邮箱，
/// 因此它们都按到达顺序作用于窗口。
#[derive(Debug)]
pub(crate) enum SenderCommand {
    /// Queue a payload for reliable delivery.
    /// 将载荷排队以进行可靠传输。
    SendData {
        payload: Bytes,
        destination: SocketAddr,
        admitted_tx: oneshot::Sender<()>,
        response_tx: oneshot::Sender<Result<TransmissionReport>>,
    },
    /// The receiver acknowledged a sequence number.
    /// 接收方确认了某个序列号。
    Ack { sequence_number: u8 },
    /// The receiver rejected a sequence number.
    /// 接收方拒绝了某个序列号。
    Nak { sequence_number: u8 },
    /// Report the current window state.
    /// 报告当前窗口状态。
    Snapshot {
        response_tx: oneshot::Sender<WindowSnapshot>,
    },
    /// Cancel every frame and stop the actor.
    /// 取消所有帧并停止actor。
    Shutdown { response_tx: oneshot::Sender<()> },
}
