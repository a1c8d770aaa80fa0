use crate::prelude::*;

/// Charging control strategy selected by the user.
///
/// Exactly one mode is active at a time. The limit percentage only applies in
/// [`ChargingMode::Limit`], the configured times of day only in [`ChargingMode::Manual`].
#[derive(Debug, clap::ValueEnum, derive_more::Display, enumset::EnumSetType)]
pub enum ChargingMode {
    /// Charging control is switched off.
    #[display("none")]
    None,

    /// Finish charging right before the next scheduled wake-up alarm.
    #[display("auto")]
    Auto,

    /// Finish charging by the configured target time of day.
    #[display("manual")]
    Manual,

    /// Cap the battery at the configured percentage.
    #[display("limit")]
    Limit,
}

impl ChargingMode {
    /// Stable ordinal used by the settings store.
    pub const fn ordinal(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Auto => 1,
            Self::Manual => 2,
            Self::Limit => 3,
        }
    }
}

impl TryFrom<i64> for ChargingMode {
    type Error = Error;

    fn try_from(ordinal: i64) -> Result<Self> {
        match ordinal {
            0 => Ok(Self::None),
            1 => Ok(Self::Auto),
            2 => Ok(Self::Manual),
            3 => Ok(Self::Limit),
            _ => bail!("charging mode ordinal is out of range: {ordinal}"),
        }
    }
}
