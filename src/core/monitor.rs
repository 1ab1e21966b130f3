use crate::core::alarm::AlarmAggregator;
use crate::core::device::DriveAmplifier;
use crate::core::{AlarmInputs, AlarmOutcome, SignalSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shortest poll interval; `tokio::time::interval` panics on a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The alarm inputs changed and the new outcome was applied.
    Changed(AlarmOutcome),
    Unchanged,
    /// Reading the inputs failed and the device was put into FAULT.
    Failed(String),
}

/// Re-evaluates the aggregate alarm whenever any of its inputs change.
pub struct AlarmMonitor<S: SignalSource> {
    device: Arc<DriveAmplifier<S>>,
    interval: Duration,
    last_inputs: Option<AlarmInputs>,
}

impl<S: SignalSource> AlarmMonitor<S> {
    pub fn new(device: Arc<DriveAmplifier<S>>, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                "Poll interval {:?} is too short, using {:?}",
                interval,
                MIN_POLL_INTERVAL
            );
        }
        Self {
            device,
            interval: interval.max(MIN_POLL_INTERVAL),
            last_inputs: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let inputs = match self.device.read_alarm_inputs().await {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::warn!("⚠️ Failed to read alarm inputs: {}", e);
                self.device.fault(&e);
                // 失敗後下一次成功讀取必須重新套用
                self.last_inputs = None;
                return PollOutcome::Failed(e.to_string());
            }
        };

        if self.last_inputs == Some(inputs) {
            return PollOutcome::Unchanged;
        }

        tracing::debug!("Alarm inputs changed: {:?}", inputs);
        let outcome = AlarmAggregator::evaluate(inputs);
        self.device.apply_alarm(&outcome);
        self.last_inputs = Some(inputs);

        if outcome.is_alarm {
            tracing::warn!("🚨 {}", outcome.message.as_deref().unwrap_or_default());
        }
        PollOutcome::Changed(outcome)
    }

    /// Polls until `shutdown` becomes true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("🔍 Alarm monitor started, polling every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Alarm monitor stopped");
    }
}
