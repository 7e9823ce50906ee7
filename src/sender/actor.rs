//! The actor that owns the slot table and serializes every window event.
//!
//! 持有槽表并串行处理所有窗口事件的actor。

use super::{
    TransmissionReport, WindowSnapshot,
    command::SenderCommand,
    fragment::fragment,
    frame::{Frame, SendOutcome, TimerEvent},
    window::{SequenceCounter, SlotTable},
};
use crate::{
    config::Config,
    error::{Error, Result},
    packet::{Packet, PacketType},
    transport::DatagramTransport,
};
use bytes::Bytes;
use std::{collections::VecDeque, net::SocketAddr, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, info, trace, warn};

/// One `send_data` call, from queueing until its outcome is reported.
struct Transmission {
    id: u32,
    destination: SocketAddr,
    /// Chunks not yet admitted into the window, in sequence order.
    pending: VecDeque<Bytes>,
    fragments: usize,
    bytes: usize,
    acknowledged: usize,
    retransmissions: u32,
    started_at: Instant,
    admitted_tx: Option<oneshot::Sender<()>>,
    response_tx: oneshot::Sender<Result<TransmissionReport>>,
}

pub(crate) struct SenderActor<T: DatagramTransport> {
    config: Config,
    transport: Arc<T>,
    window: SlotTable<Frame<T>>,
    sequence: SequenceCounter,
    current: Option<Transmission>,
    queued: VecDeque<Transmission>,
    command_rx: mpsc::Receiver<SenderCommand>,
    timer_rx: mpsc::Receiver<TimerEvent>,
    timer_tx: mpsc::Sender<TimerEvent>,
}

impl<T: DatagramTransport> SenderActor<T> {
    pub(crate) fn new(
        config: Config,
        transport: Arc<T>,
        command_rx: mpsc::Receiver<SenderCommand>,
    ) -> Self {
        // `config` has passed `Config::validate`, which bounds the width.
        let window = SlotTable::new(config.window.window_width);
        let sequence = SequenceCounter::new(window.capacity());
        let (timer_tx, timer_rx) = mpsc::channel(window.capacity());
        Self {
            config,
            transport,
            window,
            sequence,
            current: None,
            queued: VecDeque::new(),
            command_rx,
            timer_rx,
            timer_tx,
        }
    }

    /// Runs the actor's main event loop.
    ///
    /// 运行actor的主事件循环。
    pub(crate) async fn run(mut self) {
        info!(
            window_width = self.window.window_width(),
            local_addr = ?self.transport.local_addr().ok(),
            "Window sender actor started"
        );
        let mut shutdown_tx = None;

        loop {
            tokio::select! {
                biased;

                // 1. Handle commands and feedback from the handles
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if let Some(response_tx) = self.handle_command(command).await {
                            shutdown_tx = Some(response_tx);
                            break;
                        }
                    }
                    // Every handle has been dropped.
                    None => break,
                },

                // 2. Handle retransmission timers
                Some(event) = self.timer_rx.recv() => {
                    self.handle_timer_event(event).await;
                }
            }

            // After each event, move on to the next queued transmission if the
            // current one has finished.
            self.start_next().await;
        }

        self.teardown();
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(());
        }
        info!("Window sender actor has shut down");
    }

    /// Applies one command. Returns the responder when the command asks the
    /// actor to stop.
    async fn handle_command(&mut self, command: SenderCommand) -> Option<oneshot::Sender<()>> {
        match command {
            SenderCommand::SendData {
                payload,
                destination,
                admitted_tx,
                response_tx,
            } => {
                let chunks = fragment(&payload, self.config.window.max_chunk_size);
                let transmission = Transmission {
                    id: rand::random(),
                    destination,
                    fragments: chunks.len(),
                    pending: chunks,
                    bytes: payload.len(),
                    acknowledged: 0,
                    retransmissions: 0,
                    started_at: Instant::now(),
                    admitted_tx: Some(admitted_tx),
                    response_tx,
                };
                debug!(
                    transmission = transmission.id,
                    addr = %destination,
                    bytes = transmission.bytes,
                    fragments = transmission.fragments,
                    "Transmission queued"
                );
                self.queued.push_back(transmission);
            }
            SenderCommand::Ack { sequence_number } => self.on_ack(sequence_number).await,
            SenderCommand::Nak { sequence_number } => self.on_nak(sequence_number).await,
            SenderCommand::Snapshot { response_tx } => {
                let _ = response_tx.send(self.snapshot());
            }
            SenderCommand::Shutdown { response_tx } => return Some(response_tx),
        }
        None
    }

    /// Promotes queued transmissions until one is in progress or none are left.
    async fn start_next(&mut self) {
        while self.current.is_none() {
            let Some(mut next) = self.queued.pop_front() else {
                return;
            };
            next.started_at = Instant::now();
            debug!(transmission = next.id, "Transmission started");
            self.current = Some(next);
            self.admit_pending().await;
        }
    }

    /// Admits pending chunks while the window has room and the next sequence
    /// number's slot is free.
    ///
    /// 在窗口有空间且下一个序列号的槽空闲时接纳待发分片。
    async fn admit_pending(&mut self) {
        loop {
            let seq = self.sequence.peek();
            let Some(transmission) = self.current.as_mut() else {
                return;
            };
            if transmission.pending.is_empty() || !self.window.can_admit(seq) {
                return;
            }
            let Some(chunk) = transmission.pending.pop_front() else {
                return;
            };
            let destination = transmission.destination;
            let all_admitted = transmission.pending.is_empty();
            let transmission_id = transmission.id;

            let frame = match Packet::new(PacketType::Data, seq, chunk, destination).and_then(
                |packet| {
                    Frame::new(
                        packet,
                        self.transport.clone(),
                        &self.config.retransmission,
                        self.timer_tx.clone(),
                    )
                },
            ) {
                Ok(frame) => frame,
                Err(e) => {
                    self.fail_current(e);
                    return;
                }
            };

            match self.window.insert(seq, frame) {
                Ok(frame) => {
                    self.sequence.advance();
                    frame.send().await;
                }
                Err(frame) => {
                    if let Some(transmission) = self.current.as_mut() {
                        transmission.pending.push_front(frame.packet().payload().clone());
                    }
                    return;
                }
            }
            debug!(
                transmission = transmission_id,
                seq,
                active = self.window.active_count(),
                "Fragment admitted"
            );

            if all_admitted {
                if let Some(tx) = self
                    .current
                    .as_mut()
                    .and_then(|transmission| transmission.admitted_tx.take())
                {
                    let _ = tx.send(());
                }
            }
        }
    }

    async fn on_ack(&mut self, seq: u8) {
        let Some(mut frame) = self.window.remove(seq) else {
            trace!(seq, "Ignoring ACK for an empty or out-of-range slot");
            return;
        };
        frame.cancel();
        if let Some(transmission) = self.current.as_mut() {
            transmission.acknowledged += 1;
            transmission.retransmissions += frame.retries();
        }
        debug!(
            seq,
            retries = frame.retries(),
            active = self.window.active_count(),
            "Fragment acknowledged"
        );

        self.admit_pending().await;
        self.complete_if_done();
    }

    async fn on_nak(&mut self, seq: u8) {
        let Some(frame) = self.window.get_mut(seq) else {
            trace!(seq, "Ignoring NAK for an empty or out-of-range slot");
            return;
        };
        debug!(seq, "NAK received, resending immediately");
        if frame.resend().await == SendOutcome::Exhausted {
            let retries = frame.retries();
            self.fail_current(Error::RetriesExhausted {
                sequence_number: seq,
                retries,
            });
        }
    }

    async fn handle_timer_event(&mut self, event: TimerEvent) {
        let seq = event.sequence_number;
        let Some(frame) = self.window.get_mut(seq) else {
            trace!(seq, "Dropping timer event for an empty slot");
            return;
        };
        match frame.on_timeout(event.timer_id).await {
            SendOutcome::Exhausted => {
                let retries = frame.retries();
                self.fail_current(Error::RetriesExhausted {
                    sequence_number: seq,
                    retries,
                });
            }
            SendOutcome::Stale => trace!(seq, "Dropping stale timer event"),
            SendOutcome::Sent | SendOutcome::Cancelled => {}
        }
    }

    fn complete_if_done(&mut self) {
        let done = self
            .current
            .as_ref()
            .is_some_and(|transmission| transmission.pending.is_empty() && self.window.is_empty());
        if !done {
            return;
        }
        let Some(transmission) = self.current.take() else {
            return;
        };
        let report = TransmissionReport {
            fragments: transmission.fragments,
            bytes: transmission.bytes,
            retransmissions: transmission.retransmissions,
            elapsed: transmission.started_at.elapsed(),
        };
        debug_assert_eq!(transmission.acknowledged, transmission.fragments);
        debug!(
            transmission = transmission.id,
            fragments = report.fragments,
            retransmissions = report.retransmissions,
            elapsed = ?report.elapsed,
            "Transmission complete"
        );
        let _ = transmission.response_tx.send(Ok(report));
    }

    /// Cancels every frame and reports `error` for the current transmission.
    ///
    /// 取消所有帧，并为当前传输报告 `error`。
    fn fail_current(&mut self, error: Error) {
        for (_, mut frame) in self.window.drain() {
            frame.cancel();
        }
        if let Some(transmission) = self.current.take() {
            warn!(
                transmission = transmission.id,
                acknowledged = transmission.acknowledged,
                fragments = transmission.fragments,
                error = %error,
                "Transmission failed"
            );
            let _ = transmission.response_tx.send(Err(error));
        }
    }

    fn teardown(&mut self) {
        self.fail_current(Error::TransmissionAborted);
        for transmission in self.queued.drain(..) {
            let _ = transmission.response_tx.send(Err(Error::TransmissionAborted));
        }
    }

    fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            window_width: self.window.window_width(),
            slot_capacity: self.window.capacity(),
            active_count: self.window.active_count(),
            outstanding: self.window.outstanding(),
            pending_fragments: self
                .current
                .as_ref()
                .map_or(0, |transmission| transmission.pending.len()),
            queued_transmissions: self.queued.len(),
        }
    }
}
