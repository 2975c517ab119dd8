//! The connection driver: one task per `connect()` call.
//!
//! Owns the socket halves, the heartbeat monitor and the retry policy, and
//! is the only writer of its session. Every exit from a live transport other
//! than cancellation goes through the same retry path.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use retrocast_proto::{decode, ClientFrame, Envelope, EventName, HelloData, OpCode, ReadySession};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::heartbeat::{HeartbeatMonitor, HeartbeatSignal};
use super::notify::Notifier;
use super::reconnect::ReconnectPolicy;
use super::session::SharedSession;
use super::state::ConnectionState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Why a transport stopped.
#[derive(Debug)]
enum Outcome {
    /// The client cancelled this driver.
    Cancelled,
    /// Transport failure, stale heartbeat or server-requested reconnect.
    Failed(String),
}

pub(crate) struct Connection {
    pub(crate) url: String,
    pub(crate) token: String,
    pub(crate) session: SharedSession,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) retry_attempts: Arc<AtomicU32>,
    pub(crate) notifier: Arc<Notifier>,
    pub(crate) cancel: CancellationToken,
    pub(crate) outbound: mpsc::Receiver<ClientFrame>,
    pub(crate) heartbeat: HeartbeatMonitor,
    /// READY seen since `connect()`. Survives retries so that events
    /// replayed after a RESUME are forwarded.
    pub(crate) ready_seen: bool,
}

impl Connection {
    pub(crate) async fn run(mut self) {
        debug!(url = %self.url, "connection task started");

        loop {
            let outcome = self.connect_once().await;
            self.heartbeat.stop();

            let reason = match outcome {
                Outcome::Cancelled => break,
                Outcome::Failed(reason) => reason,
            };
            if self.cancel.is_cancelled() {
                break;
            }

            warn!(%reason, "gateway transport lost");
            if !self.backoff().await {
                break;
            }
        }

        debug!(url = %self.url, "connection task finished");
    }

    async fn connect_once(&mut self) -> Outcome {
        debug!(url = %self.url, "opening websocket");

        let ws = tokio::select! {
            () = self.cancel.cancelled() => return Outcome::Cancelled,
            result = tokio_tungstenite::connect_async(self.url.as_str()) => match result {
                Ok((ws, _)) => ws,
                Err(e) => return Outcome::Failed(format!("connect failed: {e}")),
            },
        };

        self.drive(ws).await
    }

    /// Wait out the next backoff delay. Returns `false` when the driver should stop.
    async fn backoff(&mut self) -> bool {
        if !self.policy.can_retry() {
            error!(
                attempts = self.policy.attempt(),
                "reconnect attempts exhausted, giving up"
            );
            self.session.write().clear();
            self.ready_seen = false;
            self.notifier.closed(&self.cancel);
            return false;
        }

        let delay = self.policy.next_delay();
        let attempt = self.policy.attempt();
        self.retry_attempts.store(attempt, Ordering::SeqCst);

        let next = if self.session.read().can_resume() {
            ConnectionState::Resuming
        } else {
            ConnectionState::Connecting
        };
        self.notifier.transition(&self.cancel, next);

        info!(
            attempt,
            max_attempts = self.policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );

        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    async fn drive(&mut self, ws: WsStream) -> Outcome {
        let (mut write, mut read) = ws.split();
        let (beat_tx, mut beat_rx) = mpsc::channel(4);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Outcome::Cancelled;
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(outcome) = self.on_frame(text.as_bytes(), &mut write, &beat_tx).await {
                            return outcome;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        if let Some(outcome) = self.on_frame(&bytes, &mut write, &beat_tx).await {
                            return outcome;
                        }
                    }
                    Some(Ok(Message::Close(close))) => {
                        let reason = close.map_or_else(
                            || "server closed the connection".to_string(),
                            |frame| {
                                format!(
                                    "server closed the connection: {} {}",
                                    u16::from(frame.code),
                                    frame.reason.as_str()
                                )
                            },
                        );
                        return Outcome::Failed(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Outcome::Failed(format!("websocket error: {e}")),
                    None => return Outcome::Failed("websocket stream ended".to_string()),
                },
                Some(signal) = beat_rx.recv() => match signal {
                    HeartbeatSignal::Beat => {
                        let seq = self.session.read().last_sequence();
                        trace!(?seq, "heartbeat");
                        if let Err(reason) = send_frame(&mut write, &ClientFrame::heartbeat(seq)).await {
                            return Outcome::Failed(reason);
                        }
                    }
                    HeartbeatSignal::Stale => {
                        return Outcome::Failed("heartbeat not acknowledged".to_string());
                    }
                },
                frame = self.outbound.recv() => match frame {
                    Some(frame) if self.notifier.state() == ConnectionState::Connected => {
                        if let Err(reason) = send_frame(&mut write, &frame).await {
                            return Outcome::Failed(reason);
                        }
                    }
                    Some(frame) => {
                        warn!(op = %frame.opcode(), "dropping outbound frame, session not ready");
                    }
                    None => return Outcome::Cancelled,
                },
            }
        }
    }

    /// Handle one inbound frame. `Some` ends the transport.
    async fn on_frame(
        &mut self,
        raw: &[u8],
        write: &mut WsSink,
        beat_tx: &mpsc::Sender<HeartbeatSignal>,
    ) -> Option<Outcome> {
        let envelope = match decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return None;
            }
        };

        match envelope.opcode() {
            Some(OpCode::Dispatch) => {
                self.on_dispatch(envelope);
                None
            }
            Some(OpCode::Hello) => self.on_hello(&envelope, write, beat_tx).await,
            Some(OpCode::HeartbeatAck) => {
                trace!("heartbeat acknowledged");
                self.heartbeat.acknowledge();
                None
            }
            Some(OpCode::Reconnect) => {
                info!("server requested reconnect");
                Some(Outcome::Failed("server requested reconnect".to_string()))
            }
            Some(op) => {
                debug!(%op, "ignoring server frame");
                None
            }
            None => {
                debug!(op = envelope.op, "ignoring unknown op");
                None
            }
        }
    }

    async fn on_hello(
        &mut self,
        envelope: &Envelope,
        write: &mut WsSink,
        beat_tx: &mpsc::Sender<HeartbeatSignal>,
    ) -> Option<Outcome> {
        let interval = match envelope
            .payload::<HelloData>()
            .and_then(|hello| hello.interval())
        {
            Ok(interval) => interval,
            Err(e) => {
                warn!(error = %e, "dropping malformed HELLO");
                return None;
            }
        };

        self.session.write().set_heartbeat_interval(interval);
        self.heartbeat.start(interval, beat_tx.clone());
        debug!(interval_ms = interval.as_millis() as u64, "heartbeat started");

        let (frame, state) = {
            let session = self.session.read();
            match session.session_id() {
                Some(session_id) => {
                    info!(session_id, seq = session.resume_sequence(), "resuming session");
                    (
                        ClientFrame::resume(self.token.as_str(), session_id, session.resume_sequence()),
                        ConnectionState::Resuming,
                    )
                }
                None => {
                    info!("identifying");
                    (
                        ClientFrame::identify(self.token.as_str()),
                        ConnectionState::Connecting,
                    )
                }
            }
        };

        self.notifier.transition(&self.cancel, state);
        send_frame(write, &frame).await.err().map(Outcome::Failed)
    }

    fn on_dispatch(&mut self, envelope: Envelope) {
        if let Some(seq) = envelope.sequence {
            self.session.write().observe_sequence(seq);
        }

        let Some(event) = envelope.event.as_deref() else {
            warn!(seq = ?envelope.sequence, "dropping dispatch without event name");
            return;
        };

        if event == EventName::Ready.as_str() {
            let ready: ReadySession = match envelope.payload() {
                Ok(ready) => ready,
                Err(e) => {
                    warn!(error = %e, "dropping READY without session id");
                    return;
                }
            };

            info!(session_id = %ready.session_id, "session ready");
            self.session.write().establish(ready.session_id);
            self.policy.reset();
            self.retry_attempts.store(0, Ordering::SeqCst);
            self.ready_seen = true;
            self.notifier.transition(&self.cancel, ConnectionState::Connected);
        } else if !self.ready_seen {
            debug!(event, "ignoring dispatch before READY");
            return;
        }

        trace!(event, seq = ?envelope.sequence, "dispatch");
        self.notifier.publish(&self.cancel, event, &envelope.data);
    }
}

async fn send_frame(write: &mut WsSink, frame: &ClientFrame) -> Result<(), String> {
    let json = match frame.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(op = %frame.opcode(), error = %e, "failed to encode frame");
            return Ok(());
        }
    };

    debug!(op = %frame.opcode(), "sending frame");
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| format!("send failed: {e}"))
}
