use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::prelude::*;

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Wall-clock time of day as seconds since midnight.
///
/// The full-day value `86400` is accepted and means midnight at the end of the day.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const fn new(seconds: u32) -> Option<Self> {
        if seconds <= SECONDS_PER_DAY { Some(Self(seconds)) } else { None }
    }

    pub const fn seconds(self) -> u32 {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    /// Parse `HH:MM`, `HH:MM:SS`, or a plain number of seconds.
    fn from_str(string: &str) -> Result<Self> {
        let seconds = match string.split(':').collect::<Vec<_>>().as_slice() {
            [seconds] => seconds.parse::<u32>()?,
            [hours, minutes] => parse_components(hours, minutes, "0")?,
            [hours, minutes, seconds] => parse_components(hours, minutes, seconds)?,
            _ => bail!("malformed time of day: `{string}`"),
        };
        Self::new(seconds).with_context(|| format!("time of day is out of range: `{string}`"))
    }
}

fn parse_components(hours: &str, minutes: &str, seconds: &str) -> Result<u32> {
    let hours: u32 = hours.parse()?;
    let minutes: u32 = minutes.parse()?;
    let seconds: u32 = seconds.parse()?;
    ensure!(minutes < 60 && seconds < 60, "malformed time of day");
    Ok(hours * 3600 + minutes * 60 + seconds)
}

impl Display for TimeOfDay {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            self.0 / 60 % 60,
            self.0 % 60,
        )
    }
}
