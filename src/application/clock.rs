use time::{Date, OffsetDateTime};

/// Source of "now" for the ledger. Calendar days are evaluated in UTC.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now_utc().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
