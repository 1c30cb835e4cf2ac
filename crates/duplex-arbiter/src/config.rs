use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use voice_local::{AsrConfig, TtsConfig};

/// Timing and engine settings, fixed for the life of an arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Pause between consecutive utterances so the engine does not clip them
    pub inter_utterance_gap_ms: u64,
    /// Delay before restarting recognition after an engine error
    pub recognition_retry_ms: u64,
    /// Delay before listening again once every announcement has played
    pub resume_after_drain_ms: u64,
    /// Delay before reading the calculator's results after triggering it
    pub result_poll_ms: u64,
    pub asr: AsrConfig,
    pub tts: TtsConfig,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            inter_utterance_gap_ms: 300,
            recognition_retry_ms: 1000,
            resume_after_drain_ms: 500,
            result_poll_ms: 1000,
            asr: AsrConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl ArbiterConfig {
    /// Load from a JSON file, writing the defaults there if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading config: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing config: {}", path.display()))
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config: {}", path.display()))?;
        Ok(())
    }

    pub fn inter_utterance_gap(&self) -> Duration {
        Duration::from_millis(self.inter_utterance_gap_ms)
    }

    pub fn recognition_retry(&self) -> Duration {
        Duration::from_millis(self.recognition_retry_ms)
    }

    pub fn resume_after_drain(&self) -> Duration {
        Duration::from_millis(self.resume_after_drain_ms)
    }

    pub fn result_poll(&self) -> Duration {
        Duration::from_millis(self.result_poll_ms)
    }
}
