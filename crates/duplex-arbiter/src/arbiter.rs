//! Half-duplex arbitration between recognition (microphone) and synthesis
//! (speaker).
//!
//! The arbiter is a synchronous state machine: [`DeviceArbiter::handle`] takes
//! one event, drives the engines and returns the timers it wants fired later.
//! Recognition is only started when the output queue is empty and idle, and an
//! active capture is stopped before any utterance is handed to the speaker.

use crate::announce;
use crate::calculator::CalculatorPort;
use crate::config::ArbiterConfig;
use crate::context::SessionContext;
use crate::events::{ArbiterEvent, Deferred, TimerKind};
use crate::queue::{OutputQueue, Outcome, QueueSignal};
use intent_parser::{Command, CommandExtractor};
use serde::Serialize;
use tracing::{debug, info, warn};
use voice_local::{EngineEvent, RecognitionEngine, SynthesisEngine, UtteranceId, VoiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArbiterState {
    Idle,
    Listening,
    Speaking,
}

pub struct DeviceArbiter<R, S, C> {
    recognition: R,
    queue: OutputQueue<S>,
    calculator: C,
    extractor: CommandExtractor,
    context: SessionContext,
    config: ArbiterConfig,
}

impl<R, S, C> DeviceArbiter<R, S, C>
where
    R: RecognitionEngine,
    S: SynthesisEngine,
    C: CalculatorPort,
{
    pub fn new(recognition: R, synthesis: S, calculator: C, config: ArbiterConfig) -> Self {
        Self {
            recognition,
            queue: OutputQueue::new(synthesis, config.inter_utterance_gap()),
            calculator,
            extractor: CommandExtractor::default(),
            context: SessionContext::default(),
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: CommandExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn state(&self) -> ArbiterState {
        if self.queue.is_speaking() {
            ArbiterState::Speaking
        } else if self.context.capturing {
            ArbiterState::Listening
        } else {
            ArbiterState::Idle
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn queue(&self) -> &OutputQueue<S> {
        &self.queue
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Process one event. The returned timers must be fed back as
    /// [`ArbiterEvent::Timer`] once their delay has elapsed.
    pub fn handle(&mut self, event: ArbiterEvent) -> Vec<Deferred> {
        match event {
            ArbiterEvent::StartListening => self.start_listening(),
            ArbiterEvent::StopListening => self.stop_listening(),
            ArbiterEvent::Engine(event) => self.on_engine_event(event),
            ArbiterEvent::Timer(timer) => self.on_timer(timer),
            ArbiterEvent::Shutdown => Vec::new(),
        }
    }

    pub fn start_listening(&mut self) -> Vec<Deferred> {
        if self.context.intends_listening {
            debug!("voice control already on");
            return Vec::new();
        }
        self.context.intends_listening = true;
        info!("voice control on");

        let mut deferred = self.announce(announce::LISTENING_ON);
        deferred.extend(self.try_start_recognition("start"));
        deferred
    }

    /// Prevents future recognition restarts. Queued and in-flight utterances
    /// still play.
    pub fn stop_listening(&mut self) -> Vec<Deferred> {
        if !self.context.intends_listening {
            debug!("voice control already off");
            return Vec::new();
        }
        self.context.intends_listening = false;
        self.recognition.stop();
        self.context.capturing = false;
        info!("voice control off");

        self.announce(announce::LISTENING_OFF)
    }

    /// Queue `text` for playback, silencing the microphone first.
    pub fn announce(&mut self, text: impl Into<String>) -> Vec<Deferred> {
        self.silence_microphone();
        let (_, signal) = self.queue.enqueue(text);
        self.follow(signal)
    }

    fn on_engine_event(&mut self, event: EngineEvent) -> Vec<Deferred> {
        match event {
            EngineEvent::RecognitionResult(transcript) => self.on_transcript(&transcript),
            EngineEvent::RecognitionEnd => {
                self.context.capturing = false;
                if self.context.intends_listening && !self.queue.is_busy() {
                    self.try_start_recognition("recognition ended")
                } else {
                    Vec::new()
                }
            }
            EngineEvent::RecognitionError(code) => {
                warn!(%code, "recognition error");
                self.context.capturing = false;
                if self.context.intends_listening && !self.queue.is_busy() {
                    vec![Deferred::new(
                        self.config.recognition_retry(),
                        TimerKind::RetryRecognition,
                    )]
                } else {
                    Vec::new()
                }
            }
            EngineEvent::SynthesisEnd(id) => self.on_synthesis_done(id, Outcome::Finished),
            EngineEvent::SynthesisError { id, reason } => {
                self.on_synthesis_done(id, Outcome::Failed(reason))
            }
            EngineEvent::FocusGained => {
                self.context.focused = true;
                if self.context.intends_listening && !self.queue.is_busy() {
                    self.try_start_recognition("focus gained")
                } else {
                    Vec::new()
                }
            }
            EngineEvent::FocusLost => {
                self.context.focused = false;
                if self.context.intends_listening {
                    self.recognition.stop();
                    self.context.capturing = false;
                    debug!("recognition stopped on focus loss");
                }
                Vec::new()
            }
        }
    }

    fn on_timer(&mut self, timer: TimerKind) -> Vec<Deferred> {
        match timer {
            TimerKind::DrainQueue => {
                if self.queue.is_empty() {
                    return Vec::new();
                }
                self.silence_microphone();
                let signal = self.queue.drain();
                self.follow(signal)
            }
            TimerKind::RetryRecognition => self.try_start_recognition("retry after error"),
            TimerKind::ResumeListening => self.try_start_recognition("announcements drained"),
            TimerKind::ReadResults => match self.calculator.read_result_summary() {
                Some(summary) => {
                    info!(?summary, "calculation results read");
                    self.announce(announce::calculation_finished(&summary))
                }
                None => {
                    debug!("calculator has no results to read");
                    Vec::new()
                }
            },
        }
    }

    fn on_transcript(&mut self, transcript: &str) -> Vec<Deferred> {
        info!(transcript, "recognition result");
        match self.extractor.parse(transcript) {
            Some(result) => {
                info!(
                    command = ?result.command,
                    source = ?result.quantity.as_ref().map(|q| q.text.as_str()),
                    "command recognised"
                );
                self.apply(result.command)
            }
            None => {
                info!(transcript, "no command recognised");
                Vec::new()
            }
        }
    }

    fn apply(&mut self, command: Command) -> Vec<Deferred> {
        let mut deferred = match command {
            Command::SetDistance { meters } => {
                self.calculator.set_distance(meters);
                self.context.last_distance = Some(meters);
                self.announce(announce::distance_set(meters))
            }
            Command::SetAngle { degrees } => {
                self.calculator.set_angle(degrees);
                self.context.last_angle = Some(degrees);
                self.announce(announce::angle_set(degrees))
            }
            Command::TriggerCalculation => {
                self.calculator.trigger_calculation();
                return Vec::new();
            }
        };

        if let Some((distance, angle)) = self.context.parameters() {
            info!(distance, angle, "both parameters set, calculating");
            self.calculator.trigger_calculation();
            deferred.push(Deferred::new(
                self.config.result_poll(),
                TimerKind::ReadResults,
            ));
        }
        deferred
    }

    fn on_synthesis_done(&mut self, id: UtteranceId, outcome: Outcome) -> Vec<Deferred> {
        let signal = self.queue.complete(id, outcome);
        self.follow(signal)
    }

    fn follow(&mut self, signal: QueueSignal) -> Vec<Deferred> {
        match signal {
            QueueSignal::DrainAfter(delay) => vec![Deferred::new(delay, TimerKind::DrainQueue)],
            QueueSignal::Drained if self.context.intends_listening => {
                debug!("announcements drained, resuming recognition shortly");
                vec![Deferred::new(
                    self.config.resume_after_drain(),
                    TimerKind::ResumeListening,
                )]
            }
            QueueSignal::Drained
            | QueueSignal::Unchanged
            | QueueSignal::Speaking(_)
            | QueueSignal::Stale => Vec::new(),
        }
    }

    /// Every restart path goes through here; the guards are re-checked when a
    /// delayed restart fires.
    fn try_start_recognition(&mut self, reason: &'static str) -> Vec<Deferred> {
        if !self.context.intends_listening {
            debug!(reason, "not restarting recognition: voice control off");
            return Vec::new();
        }
        if self.queue.is_busy() {
            debug!(reason, "not restarting recognition: announcements pending");
            return Vec::new();
        }
        if !self.context.focused {
            debug!(reason, "not restarting recognition: window not focused");
            return Vec::new();
        }
        if self.context.capturing {
            return Vec::new();
        }

        match self.recognition.start() {
            Ok(()) => {
                self.context.capturing = true;
                debug!(reason, "recognition started");
                Vec::new()
            }
            Err(VoiceError::AlreadyStarted) => {
                self.context.capturing = true;
                Vec::new()
            }
            Err(e) => {
                warn!(reason, error = %e, "recognition failed to start");
                vec![Deferred::new(
                    self.config.recognition_retry(),
                    TimerKind::RetryRecognition,
                )]
            }
        }
    }

    fn silence_microphone(&mut self) {
        if self.queue.is_speaking() {
            return;
        }
        if self.context.capturing || self.context.intends_listening {
            self.recognition.stop();
            self.context.capturing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ResultSummary;
    use proptest::prelude::*;
    use std::time::Duration;
    use voice_local::{DeviceCall, MockDevice, MockRecognizer, MockSynthesizer};

    #[derive(Debug, Default)]
    struct RecordingCalculator {
        distance: Option<f64>,
        angle: Option<f64>,
        calculations: usize,
        summary: Option<ResultSummary>,
    }

    impl CalculatorPort for RecordingCalculator {
        fn set_distance(&mut self, meters: f64) {
            self.distance = Some(meters);
        }

        fn set_angle(&mut self, degrees: f64) {
            self.angle = Some(degrees);
        }

        fn trigger_calculation(&mut self) {
            self.calculations += 1;
        }

        fn read_result_summary(&mut self) -> Option<ResultSummary> {
            self.summary
        }
    }

    type TestArbiter = DeviceArbiter<MockRecognizer, MockSynthesizer, RecordingCalculator>;

    fn arbiter() -> (MockDevice, TestArbiter) {
        let device = MockDevice::new();
        let arbiter = DeviceArbiter::new(
            device.recognizer(),
            device.synthesizer(),
            RecordingCalculator::default(),
            ArbiterConfig::default(),
        );
        (device, arbiter)
    }

    fn engine(arbiter: &mut TestArbiter, event: EngineEvent) -> Vec<Deferred> {
        arbiter.handle(ArbiterEvent::Engine(event))
    }

    /// Let the device finish the in-flight utterance and report it.
    fn finish(device: &MockDevice, arbiter: &mut TestArbiter) -> Vec<Deferred> {
        let id = device.finish_utterance().unwrap();
        engine(arbiter, EngineEvent::SynthesisEnd(id))
    }

    /// Fire every timer (and the ones they produce) and play every utterance
    /// until nothing is pending.
    fn settle(device: &MockDevice, arbiter: &mut TestArbiter, mut timers: Vec<Deferred>) {
        loop {
            if device.in_flight().is_some() {
                let more = finish(device, arbiter);
                timers.extend(more);
            } else if !timers.is_empty() {
                let timer = timers.remove(0);
                let more = arbiter.handle(ArbiterEvent::Timer(timer.timer));
                timers.extend(more);
            } else {
                break;
            }
        }
    }

    fn listening() -> (MockDevice, TestArbiter) {
        let (device, mut arbiter) = arbiter();
        let timers = arbiter.handle(ArbiterEvent::StartListening);
        settle(&device, &mut arbiter, timers);
        assert_eq!(arbiter.state(), ArbiterState::Listening);
        device.clear_calls();
        (device, arbiter)
    }

    #[test]
    fn test_start_announces_before_listening() {
        let (device, mut arbiter) = arbiter();
        assert_eq!(arbiter.state(), ArbiterState::Idle);

        let timers = arbiter.handle(ArbiterEvent::StartListening);
        assert!(timers.is_empty());
        assert_eq!(arbiter.state(), ArbiterState::Speaking);
        assert_eq!(device.spoken(), vec![announce::LISTENING_ON]);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        let timers = finish(&device, &mut arbiter);
        assert_eq!(
            timers,
            vec![Deferred::new(
                Duration::from_millis(500),
                TimerKind::ResumeListening
            )]
        );
        assert_eq!(arbiter.state(), ArbiterState::Idle);

        arbiter.handle(ArbiterEvent::Timer(TimerKind::ResumeListening));
        assert_eq!(arbiter.state(), ArbiterState::Listening);
        assert!(device.is_capturing());
        assert!(device.violations().is_empty());
    }

    #[test]
    fn test_start_twice_is_noop() {
        let (device, mut arbiter) = listening();
        assert!(arbiter.handle(ArbiterEvent::StartListening).is_empty());
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_distance_transcript_is_applied_and_confirmed() {
        let (device, mut arbiter) = listening();

        engine(
            &mut arbiter,
            EngineEvent::RecognitionResult("距离150米".into()),
        );

        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::RecognitionStop,
                DeviceCall::CancelAll,
                DeviceCall::Speak("设置距离150米".into()),
            ]
        );
        assert_eq!(arbiter.calculator().distance, Some(150.0));
        assert_eq!(arbiter.context().last_distance, Some(150.0));
        assert_eq!(arbiter.state(), ArbiterState::Speaking);
        assert!(device.violations().is_empty());
    }

    #[test]
    fn test_negative_angle_confirmation() {
        let (device, mut arbiter) = listening();
        engine(&mut arbiter, EngineEvent::RecognitionResult("付35度".into()));
        assert_eq!(arbiter.calculator().angle, Some(-35.0));
        assert_eq!(device.spoken(), vec!["设置瞄准角度负35度"]);
    }

    #[test]
    fn test_unrecognised_transcript_changes_nothing() {
        let (device, mut arbiter) = listening();
        let timers = engine(
            &mut arbiter,
            EngineEvent::RecognitionResult("随便说点什么".into()),
        );
        assert!(timers.is_empty());
        assert!(device.calls().is_empty());
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[test]
    fn test_both_parameters_trigger_calculation() {
        let (device, mut arbiter) = listening();
        let timers = engine(
            &mut arbiter,
            EngineEvent::RecognitionResult("距离150米".into()),
        );
        assert!(timers.is_empty());
        assert_eq!(arbiter.calculator().calculations, 0);

        settle(&device, &mut arbiter, timers);
        let timers = engine(&mut arbiter, EngineEvent::RecognitionResult("角度30度".into()));
        assert_eq!(arbiter.calculator().calculations, 1);
        assert_eq!(
            timers,
            vec![Deferred::new(
                Duration::from_millis(1000),
                TimerKind::ReadResults
            )]
        );

        arbiter.calculator.summary = Some(ResultSummary {
            low_angle: Some(12.3456),
            high_angle: None,
        });
        arbiter.handle(ArbiterEvent::Timer(TimerKind::ReadResults));
        settle(&device, &mut arbiter, Vec::new());

        assert_eq!(
            device.spoken(),
            vec!["设置距离150米", "设置瞄准角度30度", "计算完成，低射角度12.35度"]
        );
        assert!(device.violations().is_empty());
    }

    #[test]
    fn test_new_parameter_recalculates_with_previous_other() {
        let (device, mut arbiter) = listening();
        for text in ["距离150米", "角度30度", "距离200米"] {
            let timers = engine(&mut arbiter, EngineEvent::RecognitionResult(text.into()));
            let timers: Vec<_> = timers
                .into_iter()
                .filter(|d| d.timer != TimerKind::ReadResults)
                .collect();
            settle(&device, &mut arbiter, timers);
        }
        assert_eq!(arbiter.calculator().calculations, 2);
        assert_eq!(arbiter.context().parameters(), Some((200.0, 30.0)));
    }

    #[test]
    fn test_missing_result_surface_is_silent() {
        let (device, mut arbiter) = listening();
        let timers = arbiter.handle(ArbiterEvent::Timer(TimerKind::ReadResults));
        assert!(timers.is_empty());
        assert!(device.spoken().is_empty());
    }

    #[test]
    fn test_calculate_command_only_triggers() {
        let (device, mut arbiter) = listening();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionResult("计算".into()));
        assert!(timers.is_empty());
        assert_eq!(arbiter.calculator().calculations, 1);
        assert!(device.spoken().is_empty());
    }

    #[test]
    fn test_error_schedules_exactly_one_retry() {
        let (device, mut arbiter) = listening();
        device.end_capture();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionError("network".into()));
        assert_eq!(
            timers,
            vec![Deferred::new(
                Duration::from_millis(1000),
                TimerKind::RetryRecognition
            )]
        );
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        let timers = arbiter.handle(ArbiterEvent::Timer(TimerKind::RetryRecognition));
        assert!(timers.is_empty());
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[test]
    fn test_error_then_end_starts_once() {
        let (device, mut arbiter) = listening();
        device.end_capture();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionError("no-speech".into()));
        engine(&mut arbiter, EngineEvent::RecognitionEnd);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);

        for timer in timers {
            arbiter.handle(ArbiterEvent::Timer(timer.timer));
        }
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);
    }

    #[test]
    fn test_retry_while_speaking_is_noop() {
        let (device, mut arbiter) = listening();
        device.end_capture();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionError("aborted".into()));
        assert_eq!(timers.len(), 1);

        arbiter.announce("插播");
        arbiter.handle(ArbiterEvent::Timer(TimerKind::RetryRecognition));

        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);
        assert!(device.violations().is_empty());
    }

    #[test]
    fn test_error_while_speaking_schedules_nothing() {
        let (device, mut arbiter) = listening();
        arbiter.announce("插播");
        let timers = engine(&mut arbiter, EngineEvent::RecognitionError("aborted".into()));
        assert!(timers.is_empty());
        assert!(device.violations().is_empty());
    }

    #[test]
    fn test_end_restarts_immediately() {
        let (device, mut arbiter) = listening();
        device.end_capture();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionEnd);
        assert!(timers.is_empty());
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[test]
    fn test_start_failure_is_retried() {
        let (device, mut arbiter) = listening();
        device.end_capture();
        device.fail_start(true);
        let timers = engine(&mut arbiter, EngineEvent::RecognitionEnd);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].timer, TimerKind::RetryRecognition);

        device.fail_start(false);
        arbiter.handle(ArbiterEvent::Timer(TimerKind::RetryRecognition));
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[test]
    fn test_focus_loss_stops_and_gain_resumes() {
        let (device, mut arbiter) = listening();

        engine(&mut arbiter, EngineEvent::FocusLost);
        assert!(!device.is_capturing());
        assert_eq!(arbiter.state(), ArbiterState::Idle);

        // No background capture even after an end event.
        engine(&mut arbiter, EngineEvent::RecognitionEnd);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        engine(&mut arbiter, EngineEvent::FocusGained);
        assert!(device.is_capturing());
    }

    #[test]
    fn test_drain_does_not_resume_while_unfocused() {
        let (device, mut arbiter) = listening();
        let timers = engine(&mut arbiter, EngineEvent::RecognitionResult("距离5米".into()));
        engine(&mut arbiter, EngineEvent::FocusLost);
        settle(&device, &mut arbiter, timers);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        engine(&mut arbiter, EngineEvent::FocusGained);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);
    }

    #[test]
    fn test_focus_gain_while_speaking_waits_for_drain() {
        let (device, mut arbiter) = listening();
        arbiter.announce("插播");
        engine(&mut arbiter, EngineEvent::FocusLost);
        engine(&mut arbiter, EngineEvent::FocusGained);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        let timers = finish(&device, &mut arbiter);
        settle(&device, &mut arbiter, timers);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 1);
    }

    #[test]
    fn test_stop_does_not_abort_playback() {
        let (device, mut arbiter) = listening();
        engine(&mut arbiter, EngineEvent::RecognitionResult("距离150米".into()));
        let timers = arbiter.handle(ArbiterEvent::StopListening);
        assert!(timers.is_empty());
        assert!(!arbiter.context().intends_listening);

        settle(&device, &mut arbiter, Vec::new());
        assert_eq!(device.spoken(), vec!["设置距离150米", announce::LISTENING_OFF]);
        assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);

        engine(&mut arbiter, EngineEvent::RecognitionEnd);
        engine(&mut arbiter, EngineEvent::FocusGained);
        assert_eq!(arbiter.state(), ArbiterState::Idle);
    }

    #[test]
    fn test_stop_when_off_is_noop() {
        let (device, mut arbiter) = arbiter();
        assert!(arbiter.handle(ArbiterEvent::StopListening).is_empty());
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_synthesis_error_advances_and_resumes() {
        let (device, mut arbiter) = listening();
        arbiter.announce("A");
        arbiter.announce("B");
        let id = device.finish_utterance().unwrap();
        let timers = engine(
            &mut arbiter,
            EngineEvent::SynthesisError {
                id,
                reason: "interrupted".into(),
            },
        );
        assert_eq!(
            timers,
            vec![Deferred::new(
                Duration::from_millis(300),
                TimerKind::DrainQueue
            )]
        );
        settle(&device, &mut arbiter, timers);
        assert_eq!(device.spoken(), vec!["A", "B"]);
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[test]
    fn test_rejected_speak_does_not_stall() {
        let (device, mut arbiter) = listening();
        device.fail_speak(true);
        let timers = arbiter.announce("A");
        assert_eq!(timers[0].timer, TimerKind::ResumeListening);
        device.fail_speak(false);
        settle(&device, &mut arbiter, timers);
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    const TRANSCRIPTS: &[&str] = &["距离150米", "付35度", "角度30度", "计算", "随便说点什么"];

    #[derive(Debug, Clone)]
    enum Op {
        Start,
        Stop,
        Transcript(usize),
        End,
        Error,
        FinishUtterance,
        FailUtterance,
        FocusGained,
        FocusLost,
        FireTimer(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Start),
            Just(Op::Stop),
            (0..TRANSCRIPTS.len()).prop_map(Op::Transcript),
            Just(Op::End),
            Just(Op::Error),
            Just(Op::FinishUtterance),
            Just(Op::FailUtterance),
            Just(Op::FocusGained),
            Just(Op::FocusLost),
            any::<usize>().prop_map(Op::FireTimer),
        ]
    }

    proptest! {
        #[test]
        fn prop_microphone_and_speaker_never_overlap(ops in prop::collection::vec(op(), 1..120)) {
            let (device, mut arbiter) = arbiter();
            let mut timers: Vec<Deferred> = Vec::new();

            for op in ops {
                let more = match op {
                    Op::Start => arbiter.handle(ArbiterEvent::StartListening),
                    Op::Stop => arbiter.handle(ArbiterEvent::StopListening),
                    Op::Transcript(i) if device.is_capturing() => engine(
                        &mut arbiter,
                        EngineEvent::RecognitionResult(TRANSCRIPTS[i].into()),
                    ),
                    Op::Transcript(_) => Vec::new(),
                    Op::End => {
                        device.end_capture();
                        engine(&mut arbiter, EngineEvent::RecognitionEnd)
                    }
                    Op::Error => {
                        device.end_capture();
                        engine(&mut arbiter, EngineEvent::RecognitionError("network".into()))
                    }
                    Op::FinishUtterance => match device.finish_utterance() {
                        Some(id) => engine(&mut arbiter, EngineEvent::SynthesisEnd(id)),
                        None => Vec::new(),
                    },
                    Op::FailUtterance => match device.finish_utterance() {
                        Some(id) => engine(
                            &mut arbiter,
                            EngineEvent::SynthesisError { id, reason: "interrupted".into() },
                        ),
                        None => Vec::new(),
                    },
                    Op::FocusGained => engine(&mut arbiter, EngineEvent::FocusGained),
                    Op::FocusLost => engine(&mut arbiter, EngineEvent::FocusLost),
                    Op::FireTimer(_) if timers.is_empty() => Vec::new(),
                    Op::FireTimer(i) => {
                        let timer = timers.remove(i % timers.len());
                        arbiter.handle(ArbiterEvent::Timer(timer.timer))
                    }
                };
                timers.extend(more);

                prop_assert!(device.violations().is_empty(), "{:?}", device.violations());
                prop_assert_eq!(device.in_flight().is_some(), arbiter.queue().is_speaking());
                prop_assert_eq!(device.is_capturing(), arbiter.context().capturing);
                prop_assert!(!(arbiter.queue().is_speaking() && arbiter.context().capturing));
            }
        }

        #[test]
        fn prop_each_error_schedules_one_retry(errors in 1usize..10) {
            let (device, mut arbiter) = listening();
            let mut retries = 0;
            for _ in 0..errors {
                device.end_capture();
                let timers = engine(&mut arbiter, EngineEvent::RecognitionError("network".into()));
                retries += timers.iter().filter(|d| d.timer == TimerKind::RetryRecognition).count();
            }
            prop_assert_eq!(retries, errors);
            prop_assert_eq!(device.count(&DeviceCall::RecognitionStart), 0);
        }
    }
}
