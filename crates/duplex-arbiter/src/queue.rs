//! FIFO of pending announcements with at most one utterance in flight

use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};
use voice_local::{SynthesisEngine, Utterance, UtteranceId};

/// How a synthesis attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Failed(String),
}

/// What the owner of the queue has to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSignal {
    /// Nothing changed (queue empty, or an utterance is already playing)
    Unchanged,
    /// The utterance was handed to the engine
    Speaking(UtteranceId),
    /// More items remain; drain again after the delay
    DrainAfter(Duration),
    /// The last item has played
    Drained,
    /// The completion did not belong to the in-flight utterance
    Stale,
}

pub struct OutputQueue<S> {
    engine: S,
    items: VecDeque<Utterance>,
    speaking: bool,
    next_id: u64,
    gap: Duration,
}

impl<S: SynthesisEngine> OutputQueue<S> {
    pub fn new(engine: S, gap: Duration) -> Self {
        Self {
            engine,
            items: VecDeque::new(),
            speaking: false,
            next_id: 1,
            gap,
        }
    }

    /// Append `text`; starts playback right away unless something is playing.
    pub fn enqueue(&mut self, text: impl Into<String>) -> (UtteranceId, QueueSignal) {
        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        let text = text.into();
        debug!(%id, text = %text, pending = self.items.len(), "utterance queued");
        self.items.push_back(Utterance { id, text });
        (id, self.drain())
    }

    /// Hand the head item to the engine if nothing is in flight.
    pub fn drain(&mut self) -> QueueSignal {
        if self.speaking {
            return QueueSignal::Unchanged;
        }
        let Some(head) = self.items.front() else {
            return QueueSignal::Unchanged;
        };

        self.speaking = true;
        self.engine.cancel_all();
        match self.engine.speak(head) {
            Ok(()) => QueueSignal::Speaking(head.id),
            Err(e) => {
                let id = head.id;
                self.advance(id, Outcome::Failed(e.to_string()))
            }
        }
    }

    /// The engine reported the end of utterance `id`, successful or not.
    /// Either way the item is dropped; failed items are not retried.
    pub fn complete(&mut self, id: UtteranceId, outcome: Outcome) -> QueueSignal {
        if !self.speaking || self.items.front().map(|u| u.id) != Some(id) {
            debug!(%id, "ignoring completion for an utterance that is not in flight");
            return QueueSignal::Stale;
        }
        self.advance(id, outcome)
    }

    fn advance(&mut self, id: UtteranceId, outcome: Outcome) -> QueueSignal {
        self.speaking = false;
        if let Some(done) = self.items.pop_front() {
            match outcome {
                Outcome::Finished => info!(%id, text = %done.text, "utterance finished"),
                Outcome::Failed(reason) => {
                    warn!(%id, text = %done.text, %reason, "utterance failed, dropping")
                }
            }
        }

        if self.items.is_empty() {
            QueueSignal::Drained
        } else {
            QueueSignal::DrainAfter(self.gap)
        }
    }

    /// An utterance is playing.
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// An utterance is playing or waiting to play.
    pub fn is_busy(&self) -> bool {
        self.speaking || !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|u| u.text.as_str())
    }

    pub fn engine(&self) -> &S {
        &self.engine
    }
}
