//! Tokio event loop around [`DeviceArbiter`]
//!
//! Events are processed one at a time in arrival order. Timers requested by
//! the arbiter are slept on in detached tasks and re-enter through the same
//! channel.

use crate::arbiter::DeviceArbiter;
use crate::calculator::CalculatorPort;
use crate::events::{ArbiterEvent, Deferred};
use crate::{ArbiterError, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};
use voice_local::{EngineEvent, EngineEventSink, RecognitionEngine, SynthesisEngine};

/// Cloneable sender into a running arbiter.
#[derive(Debug, Clone)]
pub struct ArbiterHandle {
    tx: mpsc::UnboundedSender<ArbiterEvent>,
}

/// Receiving end, consumed by [`ArbiterRuntime::new`].
#[derive(Debug)]
pub struct ArbiterInbox {
    rx: mpsc::UnboundedReceiver<ArbiterEvent>,
}

pub fn channel() -> (ArbiterHandle, ArbiterInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ArbiterHandle { tx }, ArbiterInbox { rx })
}

impl ArbiterHandle {
    pub fn send(&self, event: impl Into<ArbiterEvent>) -> Result<()> {
        self.tx
            .send(event.into())
            .map_err(|_| ArbiterError::ChannelClosed)
    }

    pub fn start_listening(&self) -> Result<()> {
        self.send(ArbiterEvent::StartListening)
    }

    pub fn stop_listening(&self) -> Result<()> {
        self.send(ArbiterEvent::StopListening)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ArbiterEvent::Shutdown)
    }
}

impl EngineEventSink for ArbiterHandle {
    fn emit(&self, event: EngineEvent) {
        if self.send(event).is_err() {
            debug!("arbiter gone, dropping engine event");
        }
    }
}

pub struct ArbiterRuntime<R, S, C> {
    arbiter: DeviceArbiter<R, S, C>,
    handle: ArbiterHandle,
    inbox: ArbiterInbox,
}

impl<R, S, C> ArbiterRuntime<R, S, C>
where
    R: RecognitionEngine,
    S: SynthesisEngine,
    C: CalculatorPort,
{
    pub fn new(arbiter: DeviceArbiter<R, S, C>, handle: ArbiterHandle, inbox: ArbiterInbox) -> Self {
        Self {
            arbiter,
            handle,
            inbox,
        }
    }

    pub fn handle(&self) -> ArbiterHandle {
        self.handle.clone()
    }

    /// Run until [`ArbiterEvent::Shutdown`], then hand the arbiter back.
    pub async fn run(mut self) -> DeviceArbiter<R, S, C> {
        info!("arbiter running");
        while let Some(event) = self.inbox.rx.recv().await {
            if event == ArbiterEvent::Shutdown {
                break;
            }
            for deferred in self.arbiter.handle(event) {
                self.schedule(deferred);
            }
        }
        info!(state = ?self.arbiter.state(), "arbiter stopped");
        self.arbiter
    }

    fn schedule(&self, deferred: Deferred) {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deferred.delay).await;
            if handle.send(ArbiterEvent::Timer(deferred.timer)).is_err() {
                debug!(timer = ?deferred.timer, "arbiter gone, timer dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::ResultSummary;
    use crate::config::ArbiterConfig;
    use crate::ArbiterState;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use voice_local::Utterance;

    #[derive(Default)]
    struct Shared {
        spoken: Vec<String>,
        starts: usize,
        capturing: bool,
    }

    /// Finishes every utterance as soon as it is handed over.
    struct LoopbackSpeaker {
        shared: Arc<Mutex<Shared>>,
        sink: ArbiterHandle,
    }

    impl SynthesisEngine for LoopbackSpeaker {
        fn speak(&mut self, utterance: &Utterance) -> voice_local::Result<()> {
            self.shared.lock().unwrap().spoken.push(utterance.text.clone());
            self.sink.emit(EngineEvent::SynthesisEnd(utterance.id));
            Ok(())
        }
    }

    struct LoopbackMic {
        shared: Arc<Mutex<Shared>>,
    }

    impl RecognitionEngine for LoopbackMic {
        fn start(&mut self) -> voice_local::Result<()> {
            let mut shared = self.shared.lock().unwrap();
            shared.starts += 1;
            shared.capturing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.shared.lock().unwrap().capturing = false;
        }
    }

    #[derive(Default)]
    struct FixedCalculator {
        distance: Option<f64>,
    }

    impl CalculatorPort for FixedCalculator {
        fn set_distance(&mut self, meters: f64) {
            self.distance = Some(meters);
        }

        fn set_angle(&mut self, _degrees: f64) {}

        fn trigger_calculation(&mut self) {}

        fn read_result_summary(&mut self) -> Option<ResultSummary> {
            Some(ResultSummary {
                low_angle: Some(10.0),
                high_angle: Some(80.0),
            })
        }
    }

    fn fast_config() -> ArbiterConfig {
        ArbiterConfig {
            inter_utterance_gap_ms: 1,
            recognition_retry_ms: 1,
            resume_after_drain_ms: 1,
            result_poll_ms: 1,
            ..ArbiterConfig::default()
        }
    }

    async fn wait_for(shared: &Arc<Mutex<Shared>>, pred: impl Fn(&Shared) -> bool) {
        for _ in 0..200 {
            if pred(&shared.lock().unwrap()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_runtime_round_trip() {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (handle, inbox) = channel();
        let arbiter = DeviceArbiter::new(
            LoopbackMic {
                shared: shared.clone(),
            },
            LoopbackSpeaker {
                shared: shared.clone(),
                sink: handle.clone(),
            },
            FixedCalculator::default(),
            fast_config(),
        );
        let runtime = ArbiterRuntime::new(arbiter, handle.clone(), inbox);
        let task = tokio::spawn(runtime.run());

        handle.start_listening().unwrap();
        wait_for(&shared, |s| s.capturing).await;

        handle.emit(EngineEvent::RecognitionResult("距离150米".into()));
        handle.emit(EngineEvent::RecognitionEnd);
        wait_for(&shared, |s| s.spoken.len() == 2 && s.capturing).await;

        handle.emit(EngineEvent::RecognitionResult("角度30度".into()));
        wait_for(&shared, |s| s.spoken.len() == 4 && s.capturing).await;

        handle.shutdown().unwrap();
        let arbiter = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            shared.lock().unwrap().spoken,
            vec![
                "语音控制已开启",
                "设置距离150米",
                "设置瞄准角度30度",
                "计算完成，低射角度10度，高射角度80度",
            ]
        );
        assert_eq!(arbiter.calculator().distance, Some(150.0));
        assert_eq!(arbiter.state(), ArbiterState::Listening);
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let (handle, inbox) = channel();
        drop(inbox);
        assert!(matches!(
            handle.start_listening(),
            Err(ArbiterError::ChannelClosed)
        ));
    }
}
