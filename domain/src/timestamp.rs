use chrono::{Local, NaiveDateTime, Timelike};

pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// `H:M`, 24-hour, neither part zero-padded.
pub fn minute_label(at: &NaiveDateTime) -> String {
    format!("{}:{}", at.hour(), at.minute())
}

/// Emits a label only when the wall-clock minute changes between messages.
#[derive(Debug, Default, Clone)]
pub struct TimestampTracker {
    last_minute: Option<NaiveDateTime>,
}

impl TimestampTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&mut self, now: NaiveDateTime) -> Option<String> {
        let minute = now.with_second(0)?.with_nanosecond(0)?;
        if self.last_minute == Some(minute) {
            return None;
        }
        self.last_minute = Some(minute);
        Some(minute_label(&minute))
    }

    pub fn reset(&mut self) {
        self.last_minute = None;
    }
}
