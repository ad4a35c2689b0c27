use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::aggregate::Aggregator;
use crate::consumer::{ConsumerEvent, StreamConsumer};
use crate::content::FilePayload;
use crate::errors::{SessionFailure, UploadError, network_failure, stream_failure};
use crate::session::SessionInner;
use crate::stream::SessionEvent;

/// Handle used to request cancellation of a running session.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Takes effect at the driver's next suspension point and becomes visible
    /// as a terminal `SessionEvent::Failed` with `SessionFailure::Cancelled`.
    /// The response body is released and no further output is published.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Streaming handle returned by `UploadSession::submit`.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to
/// obtain the final output after the terminal event. Dropping the handle does
/// not stop the session; use `abort_handle()` for that.
pub struct SessionRun {
    run_id: uuid::Uuid,
    session_id: uuid::Uuid,
    rx: mpsc::Receiver<SessionEvent>,
    final_rx: oneshot::Receiver<Result<String, UploadError>>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl std::fmt::Debug for SessionRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRun")
            .field("run_id", &self.run_id)
            .field("session_id", &self.session_id)
            .field("saw_terminal", &self.saw_terminal)
            .finish_non_exhaustive()
    }
}

impl SessionRun {
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    /// Returns a handle that can cancel the run.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` after the event channel is closed.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().is_some_and(SessionEvent::is_terminal) {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains the events (if needed) and returns the finished output.
    ///
    /// Safe to call after consuming events manually with `next_event()`.
    pub async fn finish(mut self) -> Result<String, UploadError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(event) if event.is_terminal() => self.saw_terminal = true,
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(UploadError::protocol_msg(format!(
                "session task ended without final result (run_id={})",
                self.run_id
            ))),
        }
    }

    /// Feeds every snapshot to `sink`, then returns the finished output.
    pub async fn for_each_snapshot(
        mut self,
        mut sink: impl FnMut(&str),
    ) -> Result<String, UploadError> {
        while let Some(event) = self.next_event().await {
            match event {
                SessionEvent::Snapshot { output, .. } | SessionEvent::Completed { output, .. } => {
                    sink(&output)
                }
                _ => {}
            }
            if self.saw_terminal {
                break;
            }
        }
        self.finish().await
    }
}

pub(crate) fn start(session: Arc<SessionInner>, payload: FilePayload) -> SessionRun {
    let (tx, rx) = mpsc::channel(session.event_buffer_capacity);
    let (final_tx, final_rx) = oneshot::channel();
    let (abort_tx, abort_rx) = watch::channel(false);

    let run_id = uuid::Uuid::new_v4();
    let session_id = session.id;
    tokio::spawn(drive_session(
        session, run_id, payload, tx, final_tx, abort_rx,
    ));

    SessionRun {
        run_id,
        session_id,
        rx,
        final_rx,
        abort_handle: AbortHandle { tx: abort_tx },
        saw_terminal: false,
    }
}

async fn drive_session(
    session: Arc<SessionInner>,
    run_id: uuid::Uuid,
    payload: FilePayload,
    tx: mpsc::Sender<SessionEvent>,
    final_tx: oneshot::Sender<Result<String, UploadError>>,
    mut abort_rx: watch::Receiver<bool>,
) {
    let submitting = SessionEvent::Submitting {
        run_id,
        session_id: session.id,
        file_name: payload.file_name.clone(),
    };
    if !send_unless_aborted(&tx, &mut abort_rx, submitting).await {
        fail(&session, run_id, &tx, final_tx, SessionFailure::Cancelled, String::new()).await;
        return;
    }

    let submitted = tokio::select! {
        _ = abort_requested(&mut abort_rx) => None,
        result = session.uploader.submit(payload) => Some(result),
    };
    let body = match submitted {
        Some(Ok(body)) => body,
        Some(Err(err)) => {
            fail(&session, run_id, &tx, final_tx, network_failure(&err), String::new()).await;
            return;
        }
        None => {
            fail(&session, run_id, &tx, final_tx, SessionFailure::Cancelled, String::new()).await;
            return;
        }
    };

    session.mark_streaming();
    let streaming = SessionEvent::Streaming {
        run_id,
        metadata: body.metadata.clone(),
    };
    let mut consumer = StreamConsumer::new(body);
    let mut aggregator = Aggregator::new();
    if !send_unless_aborted(&tx, &mut abort_rx, streaming).await {
        consumer.cancel();
        fail(&session, run_id, &tx, final_tx, SessionFailure::Cancelled, String::new()).await;
        return;
    }

    loop {
        let step = tokio::select! {
            _ = abort_requested(&mut abort_rx) => None,
            event = consumer.next_event(&mut aggregator) => Some(event),
        };
        match step {
            Some(Some(ConsumerEvent::Snapshot { seq, output })) => {
                session.publish_output(&output);
                debug!(session_id = %session.id, run_id = %run_id, seq, "published snapshot");
                let snapshot = SessionEvent::Snapshot { run_id, seq, output };
                if !send_unless_aborted(&tx, &mut abort_rx, snapshot).await {
                    consumer.cancel();
                    let partial = aggregator.into_output();
                    fail(&session, run_id, &tx, final_tx, SessionFailure::Cancelled, partial).await;
                    return;
                }
            }
            Some(Some(ConsumerEvent::Done { output })) => {
                session.mark_completed(&output);
                send_event(
                    &tx,
                    SessionEvent::Completed {
                        run_id,
                        output: output.clone(),
                    },
                )
                .await;
                let _ = final_tx.send(Ok(output));
                return;
            }
            Some(Some(ConsumerEvent::Errored { error, partial })) => {
                fail(&session, run_id, &tx, final_tx, stream_failure(&error), partial).await;
                return;
            }
            Some(None) => {
                let failure = SessionFailure::Stream {
                    message: "response stream ended without a terminal event".into(),
                };
                let partial = aggregator.into_output();
                fail(&session, run_id, &tx, final_tx, failure, partial).await;
                return;
            }
            None => {
                consumer.cancel();
                let partial = aggregator.into_output();
                fail(&session, run_id, &tx, final_tx, SessionFailure::Cancelled, partial).await;
                return;
            }
        }
    }
}

async fn fail(
    session: &SessionInner,
    run_id: uuid::Uuid,
    tx: &mpsc::Sender<SessionEvent>,
    final_tx: oneshot::Sender<Result<String, UploadError>>,
    failure: SessionFailure,
    partial: String,
) {
    session.mark_failed(&failure);
    send_event(
        tx,
        SessionEvent::Failed {
            run_id,
            error: failure.clone(),
            partial: partial.clone(),
        },
    )
    .await;
    let _ = final_tx.send(Err(UploadError::SessionFailed { failure, partial }));
}

/// Resolves once cancellation is requested. Never resolves if every abort
/// handle is gone.
async fn abort_requested(abort_rx: &mut watch::Receiver<bool>) {
    loop {
        if *abort_rx.borrow_and_update() {
            return;
        }
        if abort_rx.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

/// Sends `event`, giving up if cancellation is requested while the event
/// buffer is full. Returns `false` when aborted.
async fn send_unless_aborted(
    tx: &mpsc::Sender<SessionEvent>,
    abort_rx: &mut watch::Receiver<bool>,
    event: SessionEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = abort_requested(abort_rx) => false,
        _ = send_event(tx, event) => true,
    }
}

async fn send_event(tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    // The session view stays authoritative when nobody listens to events.
    if tx.send(event).await.is_err() {
        debug!("session event receiver dropped");
    }
}
