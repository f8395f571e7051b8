//! Monitoring session
//!
//! Owns the decision engine, the actuator link and the notifier handle for
//! one monitored driver.

use actuator::ActuatorLink;
use alerting::{AlertRequest, DrowsinessReport, NotificationHandle};
use chrono::Local;
use dms::{closure_signal, AlarmEvent, AlarmStateMachine, Countdown, DmsConfig, EyeSample, Phase, Tick};
use metrics::counter;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NoFacePolicy;
use crate::source::Frame;

/// Counters kept over the session lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_without_face: u64,
    pub onsets: u64,
    pub releases: u64,
    pub notifications_dropped: u64,
    pub actuator_failures: u64,
}

pub struct Session {
    detection: DmsConfig,
    no_face: NoFacePolicy,
    machine: AlarmStateMachine,
    actuator: Box<dyn ActuatorLink>,
    notifier: NotificationHandle,
    stats: SessionStats,
}

impl Session {
    pub fn new(
        detection: DmsConfig,
        no_face: NoFacePolicy,
        actuator: Box<dyn ActuatorLink>,
        notifier: NotificationHandle,
    ) -> Self {
        Self {
            machine: AlarmStateMachine::from_config(&detection),
            detection,
            no_face,
            actuator,
            notifier,
            stats: SessionStats::default(),
        }
    }

    /// Run one decision tick for `frame`.
    ///
    /// Returns `None` when the frame was skipped (no face under
    /// [`NoFacePolicy::Hold`]).
    pub async fn process(&mut self, frame: Frame) -> Option<Tick> {
        self.stats.frames += 1;
        let now = frame.timestamp;
        let sample = frame.ratios.map(|ratios| EyeSample::new(ratios, now));

        if sample.is_none() {
            self.stats.frames_without_face += 1;
            if self.no_face == NoFacePolicy::Hold {
                debug!("No face detected, holding alarm timers");
                return None;
            }
        }

        let both_closed = closure_signal(sample.as_ref(), self.detection.closed_threshold);
        let tick = self.machine.tick(both_closed, now);

        if let Err(e) = self.actuator.write_command(tick.command).await {
            self.stats.actuator_failures += 1;
            counter!("actuator_write_failures_total").increment(1);
            warn!("Actuator write failed: {}", e);
        }

        match tick.event {
            Some(AlarmEvent::Onset { closed_for }) => {
                self.stats.onsets += 1;
                counter!("dms_onsets_total").increment(1);
                info!("Drowsiness alarm raised after {:.1}s of closure", closed_for.as_secs_f64());
                if let Some(sample) = sample {
                    self.raise_notification(&sample, closed_for);
                }
            }
            Some(AlarmEvent::Release { open_for }) => {
                self.stats.releases += 1;
                counter!("dms_releases_total").increment(1);
                info!("Drowsiness alarm released after {:.1}s with eyes open", open_for.as_secs_f64());
            }
            None => {}
        }

        match self.machine.countdown(now) {
            Some(Countdown::UntilAlert(left)) => debug!("Eyes closed, alarm in {:.1}s", left.as_secs_f64()),
            Some(Countdown::UntilRelease(left)) => debug!("Eyes open, releasing in {:.1}s", left.as_secs_f64()),
            None => {}
        }

        Some(tick)
    }

    fn raise_notification(&mut self, sample: &EyeSample, closed_for: Duration) {
        let report = DrowsinessReport {
            occurred_at: Local::now(),
            ratio_left: sample.ratio_left,
            ratio_right: sample.ratio_right,
            closed_for,
            closed_min: self.detection.closed_min_duration(),
        };

        let request = AlertRequest {
            message: report.to_message(),
            raised_at: sample.timestamp,
        };

        if !self.notifier.notify(request) {
            self.stats.notifications_dropped += 1;
        }
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Forget the current episode (e.g. on driver change)
    pub fn reset(&mut self) {
        info!("Session reset");
        self.machine.reset();
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Consume the session, releasing the notifier handle
    pub fn finish(self) -> SessionStats {
        self.stats
    }
}
