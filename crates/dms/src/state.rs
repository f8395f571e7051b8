//! Drowsiness alarm state machine
//!
//! ```text
//!            closed                 closed for >= closed_min
//!  Normal ──────────► Pending ─────────────────────────────► Alerting
//!    ▲                  │                                      │   ▲
//!    │      open        │                     open for         │   │ closed
//!    └──────────────────┘                    >= open_min       │   │ (cancels release)
//!    ▲                                                         │   │
//!    └─────────────────────────────────────────────────────────┘───┘
//! ```
//!
//! Closing and releasing are debounced separately: a blink during an active
//! alarm restarts the release timer, it never restarts the closure cycle.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::DmsConfig;

/// Alarm phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No sustained closure
    #[default]
    Normal,
    /// Eyes closed, waiting for the closure to last long enough
    Pending,
    /// Alarm active until the eyes stay open long enough
    Alerting,
}

/// Actuator command produced on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Idle, actuator off (`'A'`)
    Normal,
    /// Alarm active, actuator energized (`'F'`)
    Alert,
}

impl Command {
    /// Wire byte understood by the actuator firmware
    pub fn as_byte(self) -> u8 {
        match self {
            Command::Normal => b'A',
            Command::Alert => b'F',
        }
    }
}

/// Phase transition worth reacting to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEvent {
    /// Pending -> Alerting. Fires once per closure episode.
    Onset { closed_for: Duration },
    /// Alerting -> Normal
    Release { open_for: Duration },
}

/// Result of a single [`AlarmStateMachine::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub phase: Phase,
    pub command: Command,
    pub event: Option<AlarmEvent>,
}

impl Tick {
    fn steady(phase: Phase, command: Command) -> Self {
        Self {
            phase,
            command,
            event: None,
        }
    }

    /// Whether this tick is the onset edge
    pub fn is_onset(&self) -> bool {
        matches!(self.event, Some(AlarmEvent::Onset { .. }))
    }
}

/// Time left before the next transition, for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    UntilAlert(Duration),
    UntilRelease(Duration),
}

/// Each phase carries only the timer valid in it, so a closure timer and a
/// reopen timer can never be set at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlarmState {
    Normal,
    Pending { closed_since: Instant },
    Alerting { opened_since: Option<Instant> },
}

/// Debounced drowsiness alarm for one monitored subject.
///
/// Pure and deterministic: time is always injected by the caller, so the
/// same `(both_closed, now)` sequence always yields the same ticks.
#[derive(Debug, Clone)]
pub struct AlarmStateMachine {
    closed_min: Duration,
    open_min: Duration,
    state: AlarmState,
}

impl AlarmStateMachine {
    pub fn new(closed_min: Duration, open_min: Duration) -> Self {
        Self {
            closed_min,
            open_min,
            state: AlarmState::Normal,
        }
    }

    pub fn from_config(config: &DmsConfig) -> Self {
        Self::new(config.closed_min_duration(), config.open_min_duration())
    }

    /// Feed one closure sample.
    ///
    /// Callers without a face in frame must pass `both_closed = false`.
    pub fn tick(&mut self, both_closed: bool, now: Instant) -> Tick {
        match (self.state, both_closed) {
            (AlarmState::Normal, false) => Tick::steady(Phase::Normal, Command::Normal),

            (AlarmState::Normal, true) => {
                self.state = AlarmState::Pending { closed_since: now };
                // Evaluated right away so a zero debounce fires on the first sample
                self.still_closed(now, now)
            }

            (AlarmState::Pending { .. }, false) => {
                self.state = AlarmState::Normal;
                Tick::steady(Phase::Normal, Command::Normal)
            }

            (AlarmState::Pending { closed_since }, true) => self.still_closed(closed_since, now),

            (AlarmState::Alerting { .. }, true) => {
                self.state = AlarmState::Alerting { opened_since: None };
                Tick::steady(Phase::Alerting, Command::Alert)
            }

            (AlarmState::Alerting { opened_since }, false) => {
                let opened_since = opened_since.unwrap_or(now);
                let open_for = now.saturating_duration_since(opened_since);
                if open_for >= self.open_min {
                    self.state = AlarmState::Normal;
                    Tick {
                        phase: Phase::Normal,
                        command: Command::Normal,
                        event: Some(AlarmEvent::Release { open_for }),
                    }
                } else {
                    self.state = AlarmState::Alerting {
                        opened_since: Some(opened_since),
                    };
                    Tick::steady(Phase::Alerting, Command::Alert)
                }
            }
        }
    }

    fn still_closed(&mut self, closed_since: Instant, now: Instant) -> Tick {
        let closed_for = now.saturating_duration_since(closed_since);
        if closed_for >= self.closed_min {
            self.state = AlarmState::Alerting { opened_since: None };
            Tick {
                phase: Phase::Alerting,
                command: Command::Alert,
                event: Some(AlarmEvent::Onset { closed_for }),
            }
        } else {
            Tick::steady(Phase::Pending, Command::Normal)
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            AlarmState::Normal => Phase::Normal,
            AlarmState::Pending { .. } => Phase::Pending,
            AlarmState::Alerting { .. } => Phase::Alerting,
        }
    }

    /// Start of the current closure, while pending
    pub fn closed_since(&self) -> Option<Instant> {
        match self.state {
            AlarmState::Pending { closed_since } => Some(closed_since),
            _ => None,
        }
    }

    /// Start of the current reopening, while alerting
    pub fn opened_since(&self) -> Option<Instant> {
        match self.state {
            AlarmState::Alerting { opened_since } => opened_since,
            _ => None,
        }
    }

    /// Time remaining until onset (pending) or release (alerting, eyes open)
    pub fn countdown(&self, now: Instant) -> Option<Countdown> {
        match self.state {
            AlarmState::Pending { closed_since } => Some(Countdown::UntilAlert(
                self.closed_min
                    .saturating_sub(now.saturating_duration_since(closed_since)),
            )),
            AlarmState::Alerting {
                opened_since: Some(opened_since),
            } => Some(Countdown::UntilRelease(
                self.open_min
                    .saturating_sub(now.saturating_duration_since(opened_since)),
            )),
            _ => None,
        }
    }

    /// Back to Normal, e.g. on subject change
    pub fn reset(&mut self) {
        self.state = AlarmState::Normal;
    }
}

impl Default for AlarmStateMachine {
    fn default() -> Self {
        Self::from_config(&DmsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    /// Feed `closed` every `step_ms` over `[from_ms, to_ms)`, collecting ticks
    fn run(
        machine: &mut AlarmStateMachine,
        base: Instant,
        closed: bool,
        from_ms: u64,
        to_ms: u64,
        step_ms: u64,
    ) -> Vec<Tick> {
        (from_ms..to_ms)
            .step_by(step_ms as usize)
            .map(|ms| machine.tick(closed, at(base, ms)))
            .collect()
    }

    #[test]
    fn test_normal_to_pending() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        let tick = machine.tick(true, base);
        assert_eq!(tick.phase, Phase::Pending);
        assert_eq!(tick.command, Command::Normal);
        assert_eq!(tick.event, None);
        assert_eq!(machine.closed_since(), Some(base));
    }

    #[test]
    fn test_pending_reopen_resets() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        machine.tick(true, base);
        let tick = machine.tick(false, at(base, 2000));
        assert_eq!(tick.phase, Phase::Normal);
        assert_eq!(machine.closed_since(), None);

        // A new closure starts a fresh pending cycle
        machine.tick(true, at(base, 2100));
        let tick = machine.tick(true, at(base, 5000));
        assert_eq!(tick.phase, Phase::Pending);
        let tick = machine.tick(true, at(base, 5100));
        assert!(tick.is_onset());
    }

    #[test]
    fn test_onset_at_exact_boundary() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        machine.tick(true, base);
        let tick = machine.tick(true, at(base, 2999));
        assert_eq!(tick.phase, Phase::Pending);

        let tick = machine.tick(true, at(base, 3000));
        assert_eq!(tick.phase, Phase::Alerting);
        assert_eq!(tick.command, Command::Alert);
        assert_eq!(
            tick.event,
            Some(AlarmEvent::Onset {
                closed_for: Duration::from_secs(3)
            })
        );
    }

    #[test]
    fn test_onset_fires_once_per_episode() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        let ticks = run(&mut machine, base, true, 0, 10_000, 33);
        assert_eq!(ticks.iter().filter(|t| t.is_onset()).count(), 1);
        assert!(ticks.iter().skip_while(|t| !t.is_onset()).all(|t| t.command == Command::Alert));
    }

    #[test]
    fn test_brief_reopen_keeps_alerting() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        // closed 4s -> open 1s -> closed again
        let mut ticks = run(&mut machine, base, true, 0, 4000, 100);
        ticks.extend(run(&mut machine, base, false, 4000, 5000, 100));
        ticks.extend(run(&mut machine, base, true, 5000, 8000, 100));

        let after_onset: Vec<_> = ticks.iter().skip_while(|t| !t.is_onset()).collect();
        assert!(after_onset.iter().all(|t| t.phase == Phase::Alerting));
        assert_eq!(ticks.iter().filter(|t| t.is_onset()).count(), 1);
        assert_eq!(machine.opened_since(), None);
    }

    #[test]
    fn test_release_requires_unbroken_open_stretch() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        run(&mut machine, base, true, 0, 3100, 100);
        assert_eq!(machine.phase(), Phase::Alerting);

        // open 2.9s
        let ticks = run(&mut machine, base, false, 3100, 6100, 100);
        assert!(ticks.iter().all(|t| t.phase == Phase::Alerting));

        // closed 0.1s cancels the pending release
        machine.tick(true, at(base, 6100));
        assert_eq!(machine.opened_since(), None);

        // open 3.0s, released on the sample that completes it
        let ticks = run(&mut machine, base, false, 6200, 9200, 100);
        assert!(ticks.iter().all(|t| t.phase == Phase::Alerting));
        let tick = machine.tick(false, at(base, 9200));
        assert_eq!(tick.phase, Phase::Normal);
        assert_eq!(tick.command, Command::Normal);
        assert_eq!(
            tick.event,
            Some(AlarmEvent::Release {
                open_for: Duration::from_secs(3)
            })
        );
        assert_eq!(machine.closed_since(), None);
        assert_eq!(machine.opened_since(), None);
    }

    #[test]
    fn test_zero_debounce_fires_immediately() {
        let mut machine = AlarmStateMachine::new(Duration::ZERO, Duration::ZERO);
        let base = Instant::now();

        assert!(machine.tick(true, base).is_onset());
        let tick = machine.tick(false, at(base, 10));
        assert!(matches!(tick.event, Some(AlarmEvent::Release { .. })));
    }

    #[test]
    fn test_countdown() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        assert_eq!(machine.countdown(base), None);
        machine.tick(true, base);
        assert_eq!(
            machine.countdown(at(base, 1000)),
            Some(Countdown::UntilAlert(Duration::from_secs(2)))
        );

        machine.tick(true, at(base, 3000));
        assert_eq!(machine.countdown(at(base, 3000)), None);

        machine.tick(false, at(base, 3500));
        assert_eq!(
            machine.countdown(at(base, 4000)),
            Some(Countdown::UntilRelease(Duration::from_millis(2500)))
        );
    }

    #[test]
    fn test_clock_going_backwards_is_harmless() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now() + Duration::from_secs(10);

        machine.tick(true, base);
        let tick = machine.tick(true, base - Duration::from_secs(5));
        assert_eq!(tick.phase, Phase::Pending);
    }

    #[test]
    fn test_reset() {
        let mut machine = AlarmStateMachine::default();
        let base = Instant::now();

        run(&mut machine, base, true, 0, 3100, 100);
        assert_eq!(machine.phase(), Phase::Alerting);
        machine.reset();
        assert_eq!(machine.phase(), Phase::Normal);
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::Normal.as_byte(), b'A');
        assert_eq!(Command::Alert.as_byte(), b'F');
    }
}
