//! In-memory session clock for Pomodoro-style work/break rounds.
//!
//! The clock holds no timer thread and performs no I/O. Callers drive it by
//! passing the current instant into [`SessionClock::tick`] on whatever
//! cadence they like (the shipped default is 125ms); every value is
//! recomputed from the stored start instant, so a missed or repeated tick
//! never skews the elapsed time.

use chrono::{NaiveDateTime, TimeDelta};

use crate::models::UnitKind;

/// What a session is counting down (or up) for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Work,
    Break,
    Coffee,
}

impl SessionKind {
    /// The work-unit kind a finished session of this kind is recorded as.
    pub fn unit_kind(&self) -> UnitKind {
        match self {
            SessionKind::Work => UnitKind::Work,
            SessionKind::Break => UnitKind::Break,
            SessionKind::Coffee => UnitKind::Coffee,
        }
    }
}

/// The completed stretch of a session, from which a work unit is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSpan {
    pub kind: SessionKind,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl SessionSpan {
    pub fn seconds(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }
}

/// Snapshot produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickUpdate {
    pub elapsed: TimeDelta,
    /// `None` for count-up sessions
    pub remaining: Option<TimeDelta>,
    /// Countdown completion in `0.0..=1.0`, `None` for count-up sessions
    pub progress: Option<f64>,
    /// True exactly once per countdown, on the first tick at or past target
    pub round_finished: bool,
}

#[derive(Debug, Clone)]
enum ClockState {
    Idle,
    Running {
        kind: SessionKind,
        started_at: NaiveDateTime,
        target: TimeDelta,
        bell_rung: bool,
    },
}

/// SessionClock: pure countdown/count-up state for one session at a time.
///
/// A session with a positive target counts down and finishes a round when
/// the target elapses; a zero target counts up open-endedly (the coffee
/// session of the original workflow). Finishing a round does not end the
/// session, overtime simply accumulates until the caller calls
/// [`SessionClock::finish`].
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    state: ClockState,
}

impl Default for ClockState {
    fn default() -> Self {
        ClockState::Idle
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session at `now`. A running session is replaced.
    pub fn start(&mut self, kind: SessionKind, target: TimeDelta, now: NaiveDateTime) {
        self.state = ClockState::Running {
            kind,
            started_at: now,
            target,
            bell_rung: false,
        };
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    pub fn kind(&self) -> Option<SessionKind> {
        match &self.state {
            ClockState::Running { kind, .. } => Some(*kind),
            ClockState::Idle => None,
        }
    }

    /// Relabels and re-targets the running session without restarting it.
    ///
    /// The start instant is kept, so time already spent counts against the
    /// new target; the round-finished latch re-arms. Idle clocks ignore the
    /// call and report `false`.
    pub fn switch_kind(&mut self, kind: SessionKind, target: TimeDelta) -> bool {
        match &mut self.state {
            ClockState::Running {
                kind: current,
                target: current_target,
                bell_rung,
                ..
            } => {
                *current = kind;
                *current_target = target;
                *bell_rung = false;
                true
            }
            ClockState::Idle => false,
        }
    }

    /// Time spent in the running session, `None` when idle.
    pub fn elapsed(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        match &self.state {
            ClockState::Running { started_at, .. } => {
                // a backwards clock reads as zero, not negative
                Some((now - *started_at).max(TimeDelta::zero()))
            }
            ClockState::Idle => None,
        }
    }

    /// Time left until the target elapses, `None` when idle or counting up.
    /// Never negative; overtime reads as zero.
    pub fn remaining(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        match &self.state {
            ClockState::Running { target, .. } if !target.is_zero() => {
                let elapsed = self.elapsed(now)?;
                Some((*target - elapsed).max(TimeDelta::zero()))
            }
            _ => None,
        }
    }

    /// Countdown completion in `0.0..=1.0`, `None` when idle or counting up.
    pub fn progress(&self, now: NaiveDateTime) -> Option<f64> {
        match &self.state {
            ClockState::Running { target, .. } if !target.is_zero() => {
                let elapsed = self.elapsed(now)?;
                let ratio = elapsed.num_milliseconds() as f64 / target.num_milliseconds() as f64;
                Some(ratio.min(1.0))
            }
            _ => None,
        }
    }

    /// Advances the clock to `now` and reports the session's state.
    ///
    /// Everything is recomputed from the start instant, so calling this
    /// again with the same `now` yields the same numbers. The only latch is
    /// `round_finished`: it is reported by the first tick at or past the
    /// target and never again for the same session. Returns `None` when no
    /// session is running.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<TickUpdate> {
        let elapsed = self.elapsed(now)?;
        let remaining = self.remaining(now);
        let progress = self.progress(now);

        let round_finished = match &mut self.state {
            ClockState::Running {
                target, bell_rung, ..
            } if !target.is_zero() && elapsed >= *target && !*bell_rung => {
                *bell_rung = true;
                true
            }
            _ => false,
        };

        Some(TickUpdate {
            elapsed,
            remaining,
            progress,
            round_finished,
        })
    }

    /// Ends the running session and returns the span it covered.
    pub fn finish(&mut self, now: NaiveDateTime) -> Option<SessionSpan> {
        match std::mem::take(&mut self.state) {
            ClockState::Running {
                kind, started_at, ..
            } => Some(SessionSpan {
                kind,
                started_at,
                ended_at: now.max(started_at),
            }),
            ClockState::Idle => None,
        }
    }

    /// Drops back to idle, discarding any running session.
    pub fn reset(&mut self) {
        self.state = ClockState::Idle;
    }
}
