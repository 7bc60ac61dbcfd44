use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use std::sync::Mutex;

/// Source of wall-clock time for stamping tasks and matching reminders.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Real time from `now` until the wall-clock moment `at` in `now`'s zone.
///
/// A wall-clock time that occurs twice (DST fall-back) resolves to its first
/// occurrence. One that never occurs (DST gap) falls back to the naive
/// wall-clock difference.
pub fn until_local<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveDateTime) -> Duration {
    match now.timezone().from_local_datetime(&at).earliest() {
        Some(target) => target.signed_duration_since(now.clone()),
        None => at - now.naive_local(),
    }
}
