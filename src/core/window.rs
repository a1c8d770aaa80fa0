use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeDelta};

use crate::{
    core::{mode::ChargingMode, time_of_day::TimeOfDay},
    prelude::*,
};

/// In `auto` mode the charge window opens this many hours before the wake-up alarm.
const AUTO_LEAD_HOURS: i64 = 9;

/// Absolute bounds of one charge-limiting cycle.
///
/// Recomputed on every evaluation in the window modes; `limit` mode never has one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChargeWindow {
    pub start: DateTime<Local>,
    pub target: DateTime<Local>,
}

impl ChargeWindow {
    /// Compute the window for the current charge cycle, or `None` when the mode
    /// yields no window (no alarm in `auto`, or a non-window mode).
    pub fn compute(
        mode: ChargingMode,
        now: DateTime<Local>,
        start_time: TimeOfDay,
        target_time: TimeOfDay,
        next_alarm: Option<DateTime<Local>>,
    ) -> Option<Self> {
        match mode {
            ChargingMode::Auto => {
                let Some(target) = next_alarm else {
                    info!("no wake-up alarm is scheduled, automatic charging control has no effect");
                    return None;
                };
                Some(Self { start: target - TimeDelta::hours(AUTO_LEAD_HOURS), target })
            }

            ChargingMode::Manual => {
                let (start, target) = manual_window(now.naive_local(), start_time, target_time);
                // A time falling into a DST gap yields no window until the next evaluation.
                Some(Self {
                    start: start.and_local_timezone(Local).earliest()?,
                    target: target.and_local_timezone(Local).earliest()?,
                })
            }

            ChargingMode::None | ChargingMode::Limit => {
                warn!(mode = %mode, "charging mode has no charge window");
                None
            }
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.target - self.start
    }
}

/// Anchor the configured times of day to `now`'s calendar day and normalize for
/// day wrap, so that the window always contains `now` or lies in the future and
/// is never more than 24 hours stale.
fn manual_window(
    now: NaiveDateTime,
    start_time: TimeOfDay,
    target_time: TimeOfDay,
) -> (NaiveDateTime, NaiveDateTime) {
    let midnight = now.date().and_time(NaiveTime::MIN);
    let mut start = midnight + TimeDelta::seconds(i64::from(start_time.seconds()));
    let mut target = midnight + TimeDelta::seconds(i64::from(target_time.seconds()));

    if start > target {
        // The window crosses midnight.
        if now > target {
            target += TimeDelta::days(1);
        } else {
            start -= TimeDelta::days(1);
        }
    } else if now >= target {
        start += TimeDelta::days(1);
        target += TimeDelta::days(1);
    }

    (start, target)
}
