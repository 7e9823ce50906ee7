//! The user-facing handle to a window sender actor.
//!
//! 窗口发送方actor的用户端句柄。

use super::{
    TransmissionReport, WindowSnapshot, actor::SenderActor, command::SenderCommand,
};
use crate::{
    config::Config,
    error::{Error, Result},
    transport::DatagramTransport,
};
use bytes::Bytes;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

/// A handle to a sliding-window sender.
///
/// Cloning the handle is cheap; all clones drive the same window. The actor
/// stops when [`shutdown`](Self::shutdown) is called or when every handle has
/// been dropped, cancelling all outstanding frames before the transport is
/// released. [`WeakWindowSender`]s do not keep the actor alive.
///
/// 滑动窗口发送方的句柄。
///
/// 克隆句柄的开销很小；所有克隆驱动同一个窗口。当调用 [`shutdown`](Self::shutdown)
/// 或所有句柄都被丢弃时，actor停止，并在释放传输之前取消所有在途帧。
/// [`WeakWindowSender`] 不会使actor保持存活。
#[derive(Debug, Clone)]
pub struct WindowSender {
    command_tx: mpsc::Sender<SenderCommand>,
    stopped_rx: watch::Receiver<()>,
}

/// A handle that does not keep the sender actor alive.
///
/// Obtained from [`WindowSender::downgrade`]. Tasks that only react to
/// traffic, such as the feedback listener, hold one of these so that dropping
/// the last [`WindowSender`] still stops the actor.
///
/// 不会使发送方actor保持存活的句柄。
///
/// 通过 [`WindowSender::downgrade`] 获得。只对流量做出反应的任务（例如反馈监听器）
/// 持有这种句柄，这样丢弃最后一个 [`WindowSender`] 仍会停止actor。
#[derive(Debug, Clone)]
pub struct WeakWindowSender {
    command_tx: mpsc::WeakSender<SenderCommand>,
    stopped_rx: watch::Receiver<()>,
}

impl WeakWindowSender {
    /// Returns a full handle, or `None` once every [`WindowSender`] is gone.
    ///
    /// 返回完整句柄；所有 [`WindowSender`] 都已丢弃时返回 `None`。
    pub fn upgrade(&self) -> Option<WindowSender> {
        Some(WindowSender {
            command_tx: self.command_tx.upgrade()?,
            stopped_rx: self.stopped_rx.clone(),
        })
    }

    /// Completes once the actor has stopped.
    ///
    /// actor停止后完成。
    pub async fn closed(&self) {
        let mut stopped_rx = self.stopped_rx.clone();
        // Nothing is ever sent; the call only returns once the actor drops its end.
        while stopped_rx.changed().await.is_ok() {}
    }
}

/// A transmission that has been handed to the sender.
///
/// Two milestones can be observed separately: every fragment having been
/// admitted into the window, and the final outcome of the transmission.
///
/// 已交给发送方的一次传输。
///
/// 可以分别观察两个阶段：所有分片都已进入窗口，以及传输的最终结果。
#[derive(Debug)]
pub struct PendingTransmission {
    admitted_rx: Option<oneshot::Receiver<()>>,
    all_admitted: bool,
    response_rx: oneshot::Receiver<Result<TransmissionReport>>,
}

impl PendingTransmission {
    /// Waits until every fragment has been admitted into the window (sent at
    /// least once). Returns `false` if the transmission ended before that.
    ///
    /// 等待所有分片都进入窗口（至少发送过一次）。如果传输在此之前结束，返回 `false`。
    pub async fn admitted(&mut self) -> bool {
        if let Some(rx) = self.admitted_rx.as_mut() {
            self.all_admitted = rx.await.is_ok();
            self.admitted_rx = None;
        }
        self.all_admitted
    }

    /// Waits for the final outcome: `Ok` once every fragment has been
    /// acknowledged, [`Error::RetriesExhausted`] if any fragment ran out of
    /// retries.
    ///
    /// 等待最终结果：所有分片被确认后返回 `Ok`；任何分片重试耗尽则返回
    /// [`Error::RetriesExhausted`]。
    pub async fn outcome(self) -> Result<TransmissionReport> {
        self.response_rx.await.map_err(|_| Error::ChannelClosed)?
    }
}

impl WindowSender {
    /// Validates `config` and spawns the sender actor on the current tokio
    /// runtime.
    ///
    /// 校验 `config` 并在当前tokio运行时上启动发送方actor。
    pub fn spawn<T: DatagramTransport>(transport: Arc<T>, config: Config) -> Result<Self> {
        config.validate()?;
        let (command_tx, command_rx) = mpsc::channel(config.window.command_channel_capacity);
        info!(
            window_width = config.window.window_width,
            max_chunk_size = config.window.max_chunk_size,
            timeout = ?config.retransmission.timeout_delay,
            max_retries = config.retransmission.max_retries,
            "Spawning window sender"
        );
        let (stopped_tx, stopped_rx) = watch::channel(());
        let actor = SenderActor::new(config, transport, command_rx);
        tokio::spawn(async move {
            actor.run().await;
            drop(stopped_tx);
        });
        Ok(Self {
            command_tx,
            stopped_rx,
        })
    }

    /// Queues `payload` for delivery to `destination` and returns without
    /// waiting for any acknowledgment.
    ///
    /// 将 `payload` 排队发往 `destination`，不等待任何确认即返回。
    pub async fn submit(
        &self,
        payload: impl Into<Bytes>,
        destination: SocketAddr,
    ) -> Result<PendingTransmission> {
        let (admitted_tx, admitted_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(SenderCommand::SendData {
                payload: payload.into(),
                destination,
                admitted_tx,
                response_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        Ok(PendingTransmission {
            admitted_rx: Some(admitted_rx),
            all_admitted: false,
            response_rx,
        })
    }

    /// Reliably sends `payload` to `destination`.
    ///
    /// Resolves once every fragment has been acknowledged, or with
    /// [`Error::RetriesExhausted`] as soon as one fragment runs out of retries.
    /// Transmissions issued through the same sender are carried out one after
    /// another.
    ///
    /// 可靠地将 `payload` 发送到 `destination`。
    ///
    /// 在所有分片被确认后完成；一旦某个分片重试耗尽，立即以
    /// [`Error::RetriesExhausted`] 结束。通过同一发送方发出的传输依次执行。
    pub async fn send_data(
        &self,
        payload: impl Into<Bytes>,
        destination: SocketAddr,
    ) -> Result<TransmissionReport> {
        self.submit(payload, destination).await?.outcome().await
    }

    /// Sends `text` encoded as UTF-8.
    ///
    /// 以UTF-8编码发送 `text`。
    pub async fn send_text(&self, text: &str, destination: SocketAddr) -> Result<TransmissionReport> {
        self.send_data(Bytes::copy_from_slice(text.as_bytes()), destination)
            .await
    }

    /// Reports that the receiver acknowledged `sequence_number`. Unknown or
    /// repeated acknowledgments are ignored.
    ///
    /// 报告接收方确认了 `sequence_number`。未知或重复的确认会被忽略。
    pub async fn on_ack(&self, sequence_number: u8) -> Result<()> {
        self.command(SenderCommand::Ack { sequence_number }).await
    }

    /// Reports that the receiver rejected `sequence_number`; the frame is
    /// resent at once and stays outstanding.
    ///
    /// 报告接收方拒绝了 `sequence_number`；该帧立即重发并保持在途。
    pub async fn on_nak(&self, sequence_number: u8) -> Result<()> {
        self.command(SenderCommand::Nak { sequence_number }).await
    }

    /// Returns a view of the window as seen by the actor right now.
    ///
    /// 返回actor当前所见的窗口视图。
    pub async fn snapshot(&self) -> Result<WindowSnapshot> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command(SenderCommand::Snapshot { response_tx }).await?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Cancels every outstanding frame, fails unfinished transmissions with
    /// [`Error::TransmissionAborted`] and stops the actor.
    ///
    /// 取消所有在途帧，以 [`Error::TransmissionAborted`] 结束未完成的传输，并停止actor。
    pub async fn shutdown(&self) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command(SenderCommand::Shutdown { response_tx }).await?;
        response_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Completes once the actor has stopped.
    ///
    /// actor停止后完成。
    pub async fn closed(&self) {
        self.command_tx.closed().await
    }

    /// Creates a [`WeakWindowSender`] for the same actor.
    ///
    /// 为同一个actor创建一个 [`WeakWindowSender`]。
    pub fn downgrade(&self) -> WeakWindowSender {
        WeakWindowSender {
            command_tx: self.command_tx.downgrade(),
            stopped_rx: self.stopped_rx.clone(),
        }
    }

    async fn command(&self, command: SenderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| Error::ChannelClosed)
    }
}
