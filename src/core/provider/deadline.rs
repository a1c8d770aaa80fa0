use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta};
use enumset::EnumSet;
use itertools::Itertools;

use crate::{
    control::{ChargingControl, ControlCapability},
    core::{mode::ChargingMode, provider::ChargingProvider, window::ChargeWindow},
    prelude::*,
};

/// Re-arming slack: a target drifting less than this leaves the mechanism alone.
const TOLERANCE_SECONDS: i64 = 60;

/// Strategy that delegates timing to the mechanism by programming an absolute
/// stop time. `update` only re-arms the countdown when the target moves.
pub struct Deadline {
    control: Arc<dyn ChargingControl>,
    /// Capability snapshot taken at probe time.
    capabilities: EnumSet<ControlCapability>,
    /// Target the mechanism is currently armed for.
    armed_target: Option<DateTime<Local>>,
}

impl Deadline {
    pub fn try_new(control: Arc<dyn ChargingControl>) -> Result<Self> {
        let capabilities =
            control.capabilities().context("failed to probe the charging control mechanism")?;
        Ok(Self { control, capabilities, armed_target: None })
    }
}

impl ChargingProvider for Deadline {
    fn is_supported(&self) -> bool {
        self.capabilities.contains(ControlCapability::Deadline)
    }

    fn requires_battery_level_monitoring(&self) -> bool {
        false
    }

    fn supported_modes(&self) -> Result<EnumSet<ChargingMode>> {
        let capabilities =
            self.control.capabilities().context("the control mechanism failed a capability query")?;
        Ok(if capabilities.contains(ControlCapability::Deadline) {
            ChargingMode::Auto | ChargingMode::Manual
        } else {
            EnumSet::empty()
        })
    }

    fn enable(&mut self) -> Result<()> {
        // The countdown is armed by `update` once a window is known.
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        if self.armed_target.is_some() {
            self.control.set_charging_deadline(None)?;
            self.armed_target = None;
        }
        Ok(())
    }

    fn update_limit(&mut self, _battery_pct: f32, _limit: u32) -> Result<bool> {
        // `limit` mode is never offered by this strategy.
        bail!("the deadline strategy cannot cap the battery level");
    }

    fn update_window(
        &mut self,
        _battery_pct: f32,
        window: &ChargeWindow,
        _mode: ChargingMode,
    ) -> Result<bool> {
        if let Some(armed_target) = self.armed_target
            && (window.target - armed_target).abs() < TimeDelta::seconds(TOLERANCE_SECONDS)
        {
            return Ok(false);
        }
        let remaining = (window.target - Local::now()).max(TimeDelta::zero());
        self.control.set_charging_deadline(Some(remaining))?;
        self.armed_target = Some(window.target);
        debug!(target = %window.target.format("%Y-%m-%d %H:%M:%S"), "armed the charging deadline");
        Ok(true)
    }

    fn reset(&mut self) {
        // Forget the armed target so the next update re-arms from scratch.
        self.armed_target = None;
    }

    fn dump(&self) -> String {
        format!(
            "Deadline provider:\n  capabilities: {}\n  armed target: {}\n",
            self.capabilities.iter().map(|capability| format!("{capability:?}")).join(", "),
            self.armed_target
                .map_or_else(|| "none".to_string(), |target| target.format("%Y-%m-%d %H:%M:%S").to_string()),
        )
    }
}
