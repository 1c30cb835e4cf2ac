//! duplex-arbiter: shares one audio device between continuous speech
//! recognition and sequential speech synthesis
//!
//! Transcripts are turned into calculator commands, confirmations are queued
//! for playback, and recognition is paused for as long as anything is being
//! (or waiting to be) spoken. Engine failures are retried, never fatal.

mod error;
pub use error::{ArbiterError, Result};

pub mod announce;

mod arbiter;
pub use arbiter::{ArbiterState, DeviceArbiter};

mod calculator;
pub use calculator::{CalculatorPort, ResultSummary};

mod config;
pub use config::ArbiterConfig;

mod context;
pub use context::SessionContext;

mod events;
pub use events::{ArbiterEvent, Deferred, TimerKind};

mod queue;
pub use queue::{Outcome, OutputQueue, QueueSignal};

pub mod runtime;
pub use runtime::{channel, ArbiterHandle, ArbiterInbox, ArbiterRuntime};
