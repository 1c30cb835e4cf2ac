use std::time::Duration;
use voice_local::EngineEvent;

/// Everything the arbiter reacts to, delivered one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ArbiterEvent {
    /// The user asked for voice control
    StartListening,
    /// The user turned voice control off
    StopListening,
    /// A notification from an engine or the focus signal
    Engine(EngineEvent),
    /// A delay requested earlier by the arbiter has elapsed
    Timer(TimerKind),
    /// Stop the event loop
    Shutdown,
}

impl From<EngineEvent> for ArbiterEvent {
    fn from(event: EngineEvent) -> Self {
        ArbiterEvent::Engine(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Hand the next queued utterance to the synthesis engine
    DrainQueue,
    /// Restart recognition after an engine error
    RetryRecognition,
    /// Restart recognition after the output queue drained
    ResumeListening,
    /// Read the calculator's results
    ReadResults,
}

/// A timer the arbiter wants fired after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub delay: Duration,
    pub timer: TimerKind,
}

impl Deferred {
    pub fn new(delay: Duration, timer: TimerKind) -> Self {
        Self { delay, timer }
    }
}
