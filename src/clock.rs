use chrono::{DateTime, TimeZone, Timelike, Utc};

/// Source of wall-clock time for snapshot timestamps and hour-gated regimes.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC hour, 0..=23.
    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant. Used to drive work-hour regimes in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// A clock fixed at `hour`:00 UTC on an arbitrary reference day.
    pub fn at_hour(hour: u32) -> Self {
        let instant = Utc
            .with_ymd_and_hms(2024, 1, 15, hour % 24, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
