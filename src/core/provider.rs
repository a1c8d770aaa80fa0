use std::sync::Arc;

use enumset::EnumSet;

use crate::{
    control::ChargingControl,
    core::{mode::ChargingMode, window::ChargeWindow},
    prelude::*,
};

pub use self::{deadline::Deadline, threshold::Threshold};

mod deadline;
mod threshold;

/// Control strategy owning the actual calls against the charging mechanism.
///
/// Exactly one strategy is selected at startup and kept for the process lifetime.
pub trait ChargingProvider: Send {
    /// Whether the underlying mechanism exists and serves this strategy.
    fn is_supported(&self) -> bool;

    /// Whether the supervisor must keep a battery-level listener active while
    /// power is connected. When `false`, connect and disconnect transitions
    /// alone are sufficient.
    fn requires_battery_level_monitoring(&self) -> bool;

    /// Modes this strategy can serve.
    ///
    /// Callers rely on this query succeeding; a failure aborts the calling operation.
    fn supported_modes(&self) -> Result<EnumSet<ChargingMode>>;

    /// Mark the strategy active. Idempotent.
    fn enable(&mut self) -> Result<()>;

    /// Withdraw all control and restore unrestricted charging. Idempotent.
    fn disable(&mut self) -> Result<()>;

    /// Apply the desired action for `limit` mode.
    /// Returns whether a state transition actually occurred.
    fn update_limit(&mut self, battery_pct: f32, limit: u32) -> Result<bool>;

    /// Apply the desired action for a window mode.
    /// Returns whether a state transition actually occurred.
    fn update_window(
        &mut self,
        battery_pct: f32,
        window: &ChargeWindow,
        mode: ChargingMode,
    ) -> Result<bool>;

    /// Clear any pending internal state, e.g. a previously armed deadline.
    fn reset(&mut self);

    /// Human-readable diagnostics.
    fn dump(&self) -> String;
}

/// Select the control strategy: prefer [`Threshold`], fall back to [`Deadline`].
///
/// `None` means charging control is unsupported on this platform and every
/// dependent operation becomes a no-op. A probe failure is logged and treated
/// as "unsupported", never as fatal.
pub fn probe(control: &Arc<dyn ChargingControl>) -> Option<Box<dyn ChargingProvider>> {
    match Threshold::try_new(Arc::clone(control)) {
        Ok(threshold) if threshold.is_supported() => {
            info!("selected the threshold charging control strategy");
            return Some(Box::new(threshold));
        }
        Ok(_) => debug!("the threshold strategy is not supported"),
        Err(error) => warn!("threshold strategy probe failed: {error:#}"),
    }
    match Deadline::try_new(Arc::clone(control)) {
        Ok(deadline) if deadline.is_supported() => {
            info!("selected the deadline charging control strategy");
            return Some(Box::new(deadline));
        }
        Ok(_) => debug!("the deadline strategy is not supported"),
        Err(error) => warn!("deadline strategy probe failed: {error:#}"),
    }
    error!("no charging control strategy is supported on this platform");
    None
}
