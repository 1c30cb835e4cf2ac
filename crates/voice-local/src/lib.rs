//! voice-local: engine-agnostic speech recognition/synthesis capabilities with
//! a mock backend

mod types;
pub use types::{AsrConfig, EngineEvent, Transcript, TtsConfig, Utterance, UtteranceId};

mod error;
pub use error::{Result, VoiceError};

mod traits;
pub use traits::{EngineEventSink, RecognitionEngine, SynthesisEngine};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{DeviceCall, MockDevice, MockRecognizer, MockSynthesizer};
