//! Read loop over an open response body.
//!
//! `StreamConsumer` pulls one chunk per step, decodes it, classifies the
//! decoded unit and appends it to the caller's `Aggregator`, emitting the
//! updated output after every chunk. The body is released as soon as the
//! consumer reaches a terminal state, and on drop.

use futures::StreamExt as _;
use tracing::debug;

use crate::aggregate::Aggregator;
use crate::classify::ChunkClassifier;
use crate::decoder::ByteDecoder;
use crate::errors::TransportError;
use crate::upload::{ByteStream, ResponseBody};

/// Lifecycle of a `StreamConsumer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerState {
    /// Created, nothing read yet.
    Ready,
    /// At least one read has been attempted.
    Reading,
    /// End of stream reached and residual text flushed.
    Done,
    /// The transport failed.
    Errored,
    /// The caller stopped the consumer early.
    Cancelled,
}

impl ConsumerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored | Self::Cancelled)
    }
}

/// Step result of the read loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsumerEvent {
    /// A chunk was consumed; `output` is the full aggregate so far.
    Snapshot { seq: u64, output: String },
    /// End of stream; `output` is the final aggregate.
    Done { output: String },
    /// The transport failed; `partial` is the aggregate before the failure.
    Errored {
        error: TransportError,
        partial: String,
    },
}

/// Drives decoding and aggregation over one response body.
///
/// Not restartable: after a terminal event `next_event` returns `None`.
pub struct StreamConsumer {
    body: Option<ByteStream>,
    decoder: ByteDecoder,
    classifier: ChunkClassifier,
    state: ConsumerState,
    seq: u64,
}

impl StreamConsumer {
    pub fn new(body: ResponseBody) -> Self {
        Self {
            body: Some(body.stream),
            decoder: ByteDecoder::new(),
            classifier: ChunkClassifier::new(),
            state: ConsumerState::Ready,
            seq: 0,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Whether the response body is still held.
    pub fn holds_body(&self) -> bool {
        self.body.is_some()
    }

    /// Reads one chunk (or end of stream) and applies it to `aggregator`.
    ///
    /// Dropping the returned future before it resolves leaves the aggregator
    /// untouched, so it is safe to race against a cancellation signal.
    pub async fn next_event(&mut self, aggregator: &mut Aggregator) -> Option<ConsumerEvent> {
        if self.state.is_terminal() {
            return None;
        }
        let body = self.body.as_mut()?;
        self.state = ConsumerState::Reading;

        match body.next().await {
            Some(Ok(chunk)) => {
                let unit = self.decoder.decode(&chunk, false);
                if !unit.is_empty() {
                    aggregator.append(self.classifier.classify(&unit));
                }
                let seq = self.seq;
                self.seq = self.seq.saturating_add(1);
                debug!(
                    seq,
                    chunk_bytes = chunk.len(),
                    unit_chars = unit.chars().count(),
                    pending_bytes = self.decoder.pending_len(),
                    "consumed response chunk"
                );
                Some(ConsumerEvent::Snapshot {
                    seq,
                    output: aggregator.output().to_owned(),
                })
            }
            Some(Err(error)) => {
                self.release(ConsumerState::Errored);
                debug!(seq = self.seq, %error, "response stream failed");
                Some(ConsumerEvent::Errored {
                    error,
                    partial: aggregator.output().to_owned(),
                })
            }
            None => {
                let residual = self.decoder.decode(&[], true);
                if !residual.is_empty() {
                    aggregator.append(self.classifier.classify(&residual));
                }
                self.release(ConsumerState::Done);
                debug!(chunks = self.seq, "response stream finished");
                Some(ConsumerEvent::Done {
                    output: aggregator.output().to_owned(),
                })
            }
        }
    }

    /// Stops the consumer and releases the body. No-op once terminal.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.release(ConsumerState::Cancelled);
        }
    }

    fn release(&mut self, state: ConsumerState) {
        self.body = None;
        self.state = state;
    }
}

/// Consumes `body` lazily into a fresh aggregate.
///
/// The stream yields one `Snapshot` per chunk and ends after `Done` or
/// `Errored`. Dropping it early cancels the read and releases the body.
pub fn consume(body: ResponseBody) -> impl futures::Stream<Item = ConsumerEvent> + Send {
    futures::stream::unfold(
        (StreamConsumer::new(body), Aggregator::new()),
        |(mut consumer, mut aggregator)| async move {
            let event = consumer.next_event(&mut aggregator).await?;
            Some((event, (consumer, aggregator)))
        },
    )
}
