use chrono::{DateTime, Local};

use crate::prelude::*;

/// Boundary to the wall-clock alarm schedule, consulted in `auto` mode only.
pub trait AlarmSource: Send {
    /// The next scheduled wake-up, if any. Having none is not an error.
    fn next_scheduled_wake(&self) -> Result<Option<DateTime<Local>>>;
}

/// Alarm source with a fixed wake-up time, for the debug commands and tests.
pub struct FixedAlarm(pub Option<DateTime<Local>>);

impl AlarmSource for FixedAlarm {
    fn next_scheduled_wake(&self) -> Result<Option<DateTime<Local>>> {
        Ok(self.0)
    }
}
