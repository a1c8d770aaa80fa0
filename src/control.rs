use chrono::TimeDelta;
use enumset::{EnumSet, EnumSetType};

use crate::prelude::*;

/// Low-level capabilities advertised by the charging control mechanism.
#[derive(Debug, EnumSetType)]
pub enum ControlCapability {
    /// The charge path can be switched on and off.
    Toggle,

    /// The device keeps drawing from the charger while charging is inhibited,
    /// which makes "plugged in but not charging" externally observable.
    Bypass,

    /// The mechanism accepts a charge-completion deadline and does its own timing.
    Deadline,
}

/// Boundary to the platform charging control mechanism.
///
/// All calls are fast local control-plane operations, but any of them may fail
/// when the underlying mechanism is gone or unresponsive.
pub trait ChargingControl: Send + Sync {
    fn capabilities(&self) -> Result<EnumSet<ControlCapability>>;

    /// Switch the charge path on or off.
    fn set_charging_enabled(&self, enabled: bool) -> Result<()>;

    /// Arm the charge-completion countdown, or clear it with `None`.
    fn set_charging_deadline(&self, deadline: Option<TimeDelta>) -> Result<()>;
}
