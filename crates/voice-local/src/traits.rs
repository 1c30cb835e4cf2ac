use crate::{EngineEvent, Result, Utterance};

/// A non-continuous speech recognizer.
///
/// After `start` the engine captures one utterance and reports it through
/// `EngineEvent::RecognitionResult`, then `RecognitionEnd`. Failures are
/// reported as `RecognitionError` followed by `RecognitionEnd`.
pub trait RecognitionEngine {
    /// Begin capturing from the microphone.
    fn start(&mut self) -> Result<()>;

    /// Ask the engine to stop capturing. Idempotent.
    fn stop(&mut self);
}

/// A sequential text-to-speech engine.
pub trait SynthesisEngine {
    /// Begin playing `utterance`. Completion arrives later as
    /// `EngineEvent::SynthesisEnd` or `EngineEvent::SynthesisError` carrying the
    /// same id.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Drop anything the engine still holds.
    fn cancel_all(&mut self) {}
}

/// Destination for asynchronous engine notifications.
pub trait EngineEventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

impl<R: RecognitionEngine + ?Sized> RecognitionEngine for Box<R> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<S: SynthesisEngine + ?Sized> SynthesisEngine for Box<S> {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        (**self).speak(utterance)
    }

    fn cancel_all(&mut self) {
        (**self).cancel_all()
    }
}
