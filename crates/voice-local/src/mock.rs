use crate::{RecognitionEngine, Result, SynthesisEngine, Utterance, UtteranceId, VoiceError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call observed by the mock device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    RecognitionStart,
    RecognitionStop,
    CancelAll,
    Speak(String),
}

#[derive(Debug, Default)]
struct DeviceState {
    calls: Vec<DeviceCall>,
    capturing: bool,
    in_flight: Option<Utterance>,
    fail_start: bool,
    fail_speak: bool,
    violations: Vec<String>,
}

/// Shared microphone/speaker probe behind [`MockRecognizer`] and
/// [`MockSynthesizer`].
///
/// The probe records every call and flags any moment where capture and
/// playback overlap. Tests play the role of the engines by calling
/// [`MockDevice::finish_utterance`] and [`MockDevice::end_capture`] before
/// delivering the matching events.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn recognizer(&self) -> MockRecognizer {
        MockRecognizer {
            device: self.clone(),
        }
    }

    pub fn synthesizer(&self) -> MockSynthesizer {
        MockSynthesizer {
            device: self.clone(),
        }
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().calls.clone()
    }

    /// Texts handed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Speak(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &DeviceCall) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().capturing
    }

    pub fn in_flight(&self) -> Option<Utterance> {
        self.lock().in_flight.clone()
    }

    /// Playback of the in-flight utterance has finished.
    pub fn finish_utterance(&self) -> Option<UtteranceId> {
        self.lock().in_flight.take().map(|u| u.id)
    }

    /// The recognizer stopped capturing on its own (end of pass or error).
    pub fn end_capture(&self) {
        self.lock().capturing = false;
    }

    pub fn fail_start(&self, fail: bool) {
        self.lock().fail_start = fail;
    }

    pub fn fail_speak(&self, fail: bool) {
        self.lock().fail_speak = fail;
    }

    /// Moments where the microphone and the speaker were active together.
    pub fn violations(&self) -> Vec<String> {
        self.lock().violations.clone()
    }
}

pub struct MockRecognizer {
    device: MockDevice,
}

impl RecognitionEngine for MockRecognizer {
    fn start(&mut self) -> Result<()> {
        let mut state = self.device.lock();
        state.calls.push(DeviceCall::RecognitionStart);
        if state.fail_start {
            return Err(VoiceError::RecognitionStart("mock start failure".into()));
        }
        if state.capturing {
            return Err(VoiceError::AlreadyStarted);
        }
        if let Some(utterance) = &state.in_flight {
            let msg = format!("recognition started while {} in flight", utterance.id);
            state.violations.push(msg);
        }
        state.capturing = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.device.lock();
        state.calls.push(DeviceCall::RecognitionStop);
        state.capturing = false;
    }
}

pub struct MockSynthesizer {
    device: MockDevice,
}

impl SynthesisEngine for MockSynthesizer {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut state = self.device.lock();
        state.calls.push(DeviceCall::Speak(utterance.text.clone()));
        if state.fail_speak {
            return Err(VoiceError::Synthesis("mock speak failure".into()));
        }
        if state.capturing {
            let msg = format!("{} spoken while capturing", utterance.id);
            state.violations.push(msg);
        }
        if let Some(previous) = &state.in_flight {
            let msg = format!("{} spoken over {}", utterance.id, previous.id);
            state.violations.push(msg);
        }
        state.in_flight = Some(utterance.clone());
        Ok(())
    }

    fn cancel_all(&mut self) {
        self.device.lock().calls.push(DeviceCall::CancelAll);
    }
}
