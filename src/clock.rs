use chrono::NaiveDateTime;

/// A swappable source of "now".
///
/// The engine never reads the wall clock directly; all rollover checks go
/// through this trait so tests can drive calendar boundaries without real
/// waits.
pub trait Clock: Send {
    /// The current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
