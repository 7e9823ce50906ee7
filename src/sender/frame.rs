//! 帧：单个在途包及其重传定时器。
//! The frame: one in-flight packet together with its retransmission timer.
//!
//! A frame is created when the window sender admits a packet. From then on it
//! retransmits on a fixed interval until it is acknowledged (cancelled) or its
//! retry budget runs out, in which case it reports `Exhausted` to its owner.
//!
//! Timers are spawned tasks that sleep and then post a [`TimerEvent`] to the
//! owner's mailbox. Every armed timer gets a process-unique [`TimerId`]; a frame
//! only reacts to the event of the timer it currently holds, so an event that
//! raced with a cancellation or a resend is recognized as stale and dropped.
//!
//! 帧在窗口发送方接纳一个包时创建。此后它按固定间隔重传，直到被确认（取消）
//! 或重试次数耗尽，此时向所有者报告 `Exhausted`。
//!
//! 定时器是一个休眠后向所有者邮箱投递 [`TimerEvent`] 的任务。每个定时器都有进程内
//! 唯一的 [`TimerId`]；帧只响应其当前持有的定时器事件，因此与取消或重发竞争的事件
//! 会被识别为过期并丢弃。

use crate::{
    config::RetransmissionConfig,
    error::Result,
    packet::Packet,
    transport::DatagramTransport,
};
use bytes::Bytes;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace, warn};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one arming of a retransmission timer.
/// 标识重传定时器的一次启动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Posted to the owner's mailbox when a frame's timer expires.
/// 帧的定时器到期时投递到所有者邮箱的事件。
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimerEvent {
    pub sequence_number: u8,
    pub timer_id: TimerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameState {
    Active,
    Cancelled,
}

/// The result of asking a frame to (re)send.
/// 请求帧（重新）发送的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendOutcome {
    /// The datagram was handed to the transport and a fresh timer is armed.
    Sent,
    /// The retry budget is spent; the frame will not send again.
    Exhausted,
    /// The frame is cancelled; nothing was sent.
    Cancelled,
    /// The timer event does not belong to the currently armed timer.
    Stale,
}

#[derive(Debug)]
struct ArmedTimer {
    id: TimerId,
    task: JoinHandle<()>,
}

/// The sender-side owner of exactly one outstanding packet.
///
/// 发送方对单个在途包的所有者。
#[derive(Debug)]
pub(crate) struct Frame<T: DatagramTransport> {
    packet: Packet,
    datagram: Bytes,
    transport: Arc<T>,
    timer_tx: mpsc::Sender<TimerEvent>,
    timeout_delay: Duration,
    max_retries: u32,
    retries: u32,
    state: FrameState,
    timer: Option<ArmedTimer>,
}

impl<T: DatagramTransport> Frame<T> {
    /// Creates an active frame. The packet is encoded once here and the same
    /// bytes are used for every retransmission.
    ///
    /// 创建一个活动帧。包在此处编码一次，每次重传都使用相同的字节。
    pub(crate) fn new(
        packet: Packet,
        transport: Arc<T>,
        config: &RetransmissionConfig,
        timer_tx: mpsc::Sender<TimerEvent>,
    ) -> Result<Self> {
        let datagram = packet.to_bytes()?;
        Ok(Self {
            packet,
            datagram,
            transport,
            timer_tx,
            timeout_delay: config.timeout_delay,
            max_retries: config.max_retries,
            retries: 0,
            state: FrameState::Active,
            timer: None,
        })
    }

    pub(crate) fn packet(&self) -> &Packet {
        &self.packet
    }

    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> FrameState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Transmits the packet and arms the timeout.
    ///
    /// 发送包并启动超时定时器。
    pub(crate) async fn send(&mut self) -> SendOutcome {
        if self.state == FrameState::Cancelled {
            return SendOutcome::Cancelled;
        }
        self.transmit().await;
        self.arm_timer();
        SendOutcome::Sent
    }

    /// Handles expiry of the timer identified by `timer_id`. This is the
    /// retransmission path.
    ///
    /// 处理由 `timer_id` 标识的定时器到期。这是重传路径。
    pub(crate) async fn on_timeout(&mut self, timer_id: TimerId) -> SendOutcome {
        match &self.timer {
            Some(timer) if timer.id == timer_id => {}
            _ => return SendOutcome::Stale,
        }
        // The task has already fired; nothing left to abort.
        self.timer = None;
        trace!(seq = self.packet.sequence_number(), "Retransmission timer expired");
        self.retransmit().await
    }

    /// Drops the current timer and retransmits immediately.
    ///
    /// 丢弃当前定时器并立即重传。
    pub(crate) async fn resend(&mut self) -> SendOutcome {
        self.disarm_timer();
        self.retransmit().await
    }

    /// Stops the timer for good. No further sends happen, and any timer event
    /// already in flight is ignored as stale.
    ///
    /// 永久停止定时器。之后不会再发送，已在途的定时器事件会被视为过期而忽略。
    pub(crate) fn cancel(&mut self) {
        self.disarm_timer();
        self.state = FrameState::Cancelled;
    }

    async fn retransmit(&mut self) -> SendOutcome {
        if self.state == FrameState::Cancelled {
            return SendOutcome::Cancelled;
        }
        if self.retries >= self.max_retries {
            warn!(
                seq = self.packet.sequence_number(),
                retries = self.retries,
                "Retry budget exhausted"
            );
            return SendOutcome::Exhausted;
        }
        self.retries += 1;
        debug!(
            seq = self.packet.sequence_number(),
            retries = self.retries,
            "Retransmitting frame"
        );
        self.send().await
    }

    async fn transmit(&self) {
        let addr = self.packet.remote_addr();
        // A failed send is handled like a lost datagram: the timer retries it.
        if let Err(e) = self.transport.send_to(&self.datagram, addr).await {
            warn!(
                seq = self.packet.sequence_number(),
                addr = %addr,
                error = %e,
                "Failed to send datagram"
            );
        }
    }

    fn arm_timer(&mut self) {
        self.disarm_timer();
        let id = TimerId::next();
        let event = TimerEvent {
            sequence_number: self.packet.sequence_number(),
            timer_id: id,
        };
        let delay = self.timeout_delay;
        let timer_tx = self.timer_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timer_tx.send(event).await;
        });
        self.timer = Some(ArmedTimer { id, task });
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.task.abort();
        }
    }
}

impl<T: DatagramTransport> Drop for Frame<T> {
    fn drop(&mut self) {
        self.disarm_timer();
    }
}
