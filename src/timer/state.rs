use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A long break replaces the short one after every this many focus sessions.
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Focus
    }
}

impl SessionKind {
    pub const ALL: [SessionKind; 3] = [
        SessionKind::Focus,
        SessionKind::ShortBreak,
        SessionKind::LongBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::ShortBreak => "shortBreak",
            SessionKind::LongBreak => "longBreak",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Focus => "Focus",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::LongBreak => "Long Break",
        }
    }

    /// Inclusive minute range the settings surface accepts for this kind.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            SessionKind::Focus => (1, 120),
            SessionKind::ShortBreak => (1, 30),
            SessionKind::LongBreak => (1, 60),
        }
    }

    pub fn clamp_minutes(&self, minutes: u32) -> u32 {
        let (min, max) = self.bounds();
        minutes.clamp(min, max)
    }
}

impl FromStr for SessionKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "focus" => Ok(SessionKind::Focus),
            "short" | "shortBreak" => Ok(SessionKind::ShortBreak),
            "long" | "longBreak" => Ok(SessionKind::LongBreak),
            other => Err(anyhow!("unknown session kind '{other}'")),
        }
    }
}

/// Configured length of each session kind, in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDurations {
    pub focus: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Default for SessionDurations {
    fn default() -> Self {
        Self {
            focus: 25,
            short_break: 5,
            long_break: 30,
        }
    }
}

impl SessionDurations {
    pub fn minutes(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }

    pub fn seconds(&self, kind: SessionKind) -> u32 {
        self.minutes(kind).saturating_mul(60)
    }

    pub fn set(&mut self, kind: SessionKind, minutes: u32) {
        match kind {
            SessionKind::Focus => self.focus = minutes,
            SessionKind::ShortBreak => self.short_break = minutes,
            SessionKind::LongBreak => self.long_break = minutes,
        }
    }
}

/// Outcome of a finished countdown once the follow-up kind has been chosen.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub finished: SessionKind,
    pub next: SessionKind,
    pub completed_sessions: u32,
}

/// Picks the session that follows `finished`. `completed_sessions` already
/// includes the session that just ended.
pub fn next_kind_after(finished: SessionKind, completed_sessions: u32) -> SessionKind {
    match finished {
        SessionKind::Focus if completed_sessions % LONG_BREAK_EVERY == 0 => SessionKind::LongBreak,
        SessionKind::Focus => SessionKind::ShortBreak,
        SessionKind::ShortBreak | SessionKind::LongBreak => SessionKind::Focus,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub kind: SessionKind,
    pub remaining_seconds: u32,
    pub running: bool,
    pub durations: SessionDurations,
    /// Focus sessions finished so far; breaks never count.
    pub completed_sessions: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(SessionDurations::default())
    }
}

impl TimerState {
    pub fn new(durations: SessionDurations) -> Self {
        Self {
            kind: SessionKind::Focus,
            remaining_seconds: durations.seconds(SessionKind::Focus),
            running: false,
            durations,
            completed_sessions: 0,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.durations.seconds(self.kind)
    }

    /// Returns whether the countdown actually started. A finished countdown
    /// has to be reset before it can run again.
    pub fn start(&mut self) -> bool {
        if self.running || self.remaining_seconds == 0 {
            return false;
        }
        self.running = true;
        true
    }

    /// Returns whether the countdown was running.
    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_seconds = self.total_seconds();
    }

    pub fn change_kind(&mut self, kind: SessionKind) {
        self.kind = kind;
        self.running = false;
        self.remaining_seconds = self.total_seconds();
    }

    /// Stores the new length for `kind`. When `kind` is the current session the
    /// remaining time restarts from the new length, even mid-countdown.
    pub fn update_duration(&mut self, kind: SessionKind, minutes: u32) {
        self.durations.set(kind, minutes);
        if kind == self.kind {
            self.remaining_seconds = self.total_seconds();
        }
    }

    /// Advances the countdown by one second. Returns the kind that just
    /// finished when the countdown reaches zero; `running` is already false by
    /// then.
    pub fn tick(&mut self) -> Option<SessionKind> {
        if !self.running {
            return None;
        }
        if self.remaining_seconds <= 1 {
            self.remaining_seconds = 0;
            self.running = false;
            return Some(self.kind);
        }
        self.remaining_seconds -= 1;
        None
    }

    /// Books a finished countdown and switches to the next kind without
    /// starting it.
    pub fn finish_session(&mut self, finished: SessionKind) -> Completion {
        if finished == SessionKind::Focus {
            self.completed_sessions = self.completed_sessions.saturating_add(1);
        }
        let next = next_kind_after(finished, self.completed_sessions);
        self.change_kind(next);
        Completion {
            finished,
            next,
            completed_sessions: self.completed_sessions,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        let total = self.total_seconds();
        if total == 0 {
            return 0.0;
        }
        let elapsed = total - self.remaining_seconds.min(total);
        f64::from(elapsed) / f64::from(total) * 100.0
    }
}
