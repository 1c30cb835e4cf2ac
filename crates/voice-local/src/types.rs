use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Recognition settings handed to a concrete engine at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    pub language: String,
    /// A single recognition pass ends after one transcript; continuity is
    /// emulated by restarting on `end`.
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub interim_results: bool,
    #[serde(default = "default_alternatives")]
    pub max_alternatives: u32,
}

fn default_alternatives() -> u32 {
    1
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            language: "zh-CN".to_string(),
            continuous: false,
            interim_results: false,
            max_alternatives: default_alternatives(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "zh-CN".to_string(),
            rate: 2.0,
            pitch: 1.0,
        }
    }
}

/// The text hypothesis of one recognition pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub ts: Option<OffsetDateTime>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            ts: Some(OffsetDateTime::now_utc()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utt#{}", self.0)
    }
}

/// One unit of synthesized speech queued for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
}

/// Notifications delivered by the recognition engine, the synthesis engine
/// and the focus signal.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RecognitionResult(String),
    RecognitionEnd,
    RecognitionError(String),
    SynthesisEnd(UtteranceId),
    SynthesisError { id: UtteranceId, reason: String },
    FocusGained,
    FocusLost,
}

impl EngineEvent {
    pub fn result(transcript: &Transcript) -> Self {
        Self::RecognitionResult(transcript.text.clone())
    }
}
