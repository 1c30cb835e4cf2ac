//! Console stand-ins for the speech engines and the calculator

use duplex_arbiter::{ArbiterHandle, CalculatorPort, ResultSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voice_local::{
    EngineEvent, EngineEventSink, RecognitionEngine, SynthesisEngine, Transcript, TtsConfig,
    Utterance, VoiceError,
};

/// Typed lines stand in for recognition passes. A line is only accepted while
/// the arbiter has the microphone open.
#[derive(Clone, Default)]
pub struct ConsoleMic {
    capturing: Arc<AtomicBool>,
}

impl ConsoleMic {
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Deliver one typed line as a full recognition pass.
    pub fn hear(&self, sink: &ArbiterHandle, line: &str) -> bool {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return false;
        }
        let transcript = Transcript::new(line);
        info!(ts = ?transcript.ts, text = %transcript.text, "recognition pass");
        sink.emit(EngineEvent::result(&transcript));
        sink.emit(EngineEvent::RecognitionEnd);
        true
    }
}

impl RecognitionEngine for ConsoleMic {
    fn start(&mut self) -> voice_local::Result<()> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyStarted);
        }
        println!("🎤 listening");
        Ok(())
    }

    fn stop(&mut self) {
        if self.capturing.swap(false, Ordering::SeqCst) {
            println!("🎤 paused");
        }
    }
}

/// Prints utterances and reports them finished after a simulated playback
/// time proportional to their length.
pub struct ConsoleSpeaker {
    sink: ArbiterHandle,
    ms_per_char: u64,
    config: TtsConfig,
}

impl ConsoleSpeaker {
    pub fn new(sink: ArbiterHandle, ms_per_char: u64, config: TtsConfig) -> Self {
        Self {
            sink,
            ms_per_char,
            config,
        }
    }
}

impl SynthesisEngine for ConsoleSpeaker {
    fn speak(&mut self, utterance: &Utterance) -> voice_local::Result<()> {
        println!("🔊 {}", utterance.text);
        let chars = utterance.text.chars().count() as f32;
        let millis = (chars * self.ms_per_char as f32 / self.config.rate.max(0.1)) as u64;
        let sink = self.sink.clone();
        let id = utterance.id;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            sink.emit(EngineEvent::SynthesisEnd(id));
        });
        Ok(())
    }
}

/// Prints the values it receives. It has no solver, so results are always empty.
#[derive(Default)]
pub struct ConsoleCalculator {
    distance: Option<f64>,
    angle: Option<f64>,
}

impl CalculatorPort for ConsoleCalculator {
    fn set_distance(&mut self, meters: f64) {
        self.distance = Some(meters);
        println!("📐 distance = {meters} m");
    }

    fn set_angle(&mut self, degrees: f64) {
        self.angle = Some(degrees);
        println!("📐 aim angle = {degrees}°");
    }

    fn trigger_calculation(&mut self) {
        info!(distance = ?self.distance, angle = ?self.angle, "calculate pressed");
        println!("🧮 calculate");
    }

    fn read_result_summary(&mut self) -> Option<ResultSummary> {
        Some(ResultSummary::default())
    }
}
