use std::sync::Arc;

use chrono::Local;
use enumset::EnumSet;
use itertools::Itertools;

use crate::{
    control::{ChargingControl, ControlCapability},
    core::{mode::ChargingMode, provider::ChargingProvider, window::ChargeWindow},
    prelude::*,
};

/// Strategy that toggles the charge path directly from live battery and time
/// comparisons. Every evaluation re-derives the binary decision; nothing is
/// delegated to the mechanism.
pub struct Threshold {
    control: Arc<dyn ChargingControl>,
    /// Capability snapshot taken at probe time.
    capabilities: EnumSet<ControlCapability>,
    /// Last commanded charge-path state, `None` until the first command.
    applied: Option<bool>,
    phase: Phase,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
enum Phase {
    #[display("idle")]
    Idle,

    /// Charging withheld until the window opens.
    #[display("holding")]
    Holding,

    /// Charging allowed toward the target.
    #[display("topping")]
    Topping,

    /// The battery reached the requested level.
    #[display("done")]
    Done,
}

impl Threshold {
    pub fn try_new(control: Arc<dyn ChargingControl>) -> Result<Self> {
        let capabilities =
            control.capabilities().context("failed to probe the charging control mechanism")?;
        Ok(Self { control, capabilities, applied: None, phase: Phase::Idle })
    }

    /// Command the charge path, skipping the call when already in the requested state.
    fn apply(&mut self, charging: bool) -> Result<()> {
        if self.applied != Some(charging) {
            self.control.set_charging_enabled(charging)?;
            self.applied = Some(charging);
        }
        Ok(())
    }

    fn transition(&mut self, phase: Phase) -> bool {
        let changed = self.phase != phase;
        if changed {
            debug!(from = %self.phase, to = %phase, "charging phase transition");
            self.phase = phase;
        }
        changed
    }
}

impl ChargingProvider for Threshold {
    fn is_supported(&self) -> bool {
        self.capabilities.contains(ControlCapability::Toggle)
    }

    fn requires_battery_level_monitoring(&self) -> bool {
        // Without bypass, "plugged in but not charging" is indistinguishable from
        // "unplugged", so the battery level is the only usable signal.
        !self.capabilities.contains(ControlCapability::Bypass)
    }

    fn supported_modes(&self) -> Result<EnumSet<ChargingMode>> {
        let capabilities =
            self.control.capabilities().context("the control mechanism failed a capability query")?;
        Ok(if capabilities.contains(ControlCapability::Toggle) {
            ChargingMode::Auto | ChargingMode::Manual | ChargingMode::Limit
        } else {
            EnumSet::empty()
        })
    }

    fn enable(&mut self) -> Result<()> {
        // The first `update` call commands the charge path.
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        // Withdrawing control must leave the battery charging normally.
        self.apply(true)?;
        self.transition(Phase::Idle);
        Ok(())
    }

    fn update_limit(&mut self, battery_pct: f32, limit: u32) -> Result<bool> {
        #[allow(clippy::cast_precision_loss)]
        let charging = battery_pct < limit as f32;
        self.apply(charging)?;
        let phase = if charging { Phase::Topping } else { Phase::Done };
        Ok(self.transition(phase))
    }

    fn update_window(
        &mut self,
        battery_pct: f32,
        window: &ChargeWindow,
        _mode: ChargingMode,
    ) -> Result<bool> {
        let (charging, phase) = if battery_pct >= 100.0 {
            // Nothing left to limit; leave the path open.
            (true, Phase::Done)
        } else if Local::now() < window.start {
            (false, Phase::Holding)
        } else {
            (true, Phase::Topping)
        };
        self.apply(charging)?;
        Ok(self.transition(phase))
    }

    fn reset(&mut self) {
        self.applied = None;
        self.phase = Phase::Idle;
    }

    fn dump(&self) -> String {
        format!(
            "Threshold provider:\n  capabilities: {}\n  applied: {:?}\n  phase: {}\n",
            self.capabilities.iter().map(|capability| format!("{capability:?}")).join(", "),
            self.applied,
            self.phase,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::control::testing::FakeControl;

    fn threshold(capabilities: EnumSet<ControlCapability>) -> (Threshold, Arc<std::sync::Mutex<crate::control::testing::FakeControlState>>) {
        let control = FakeControl::new(capabilities);
        let state = control.state();
        (Threshold::try_new(Arc::new(control)).unwrap(), state)
    }

    #[test]
    fn test_monitoring_requirement_follows_bypass() {
        let (with_bypass, _) = threshold(ControlCapability::Toggle | ControlCapability::Bypass);
        assert!(!with_bypass.requires_battery_level_monitoring());

        let (without_bypass, _) = threshold(EnumSet::only(ControlCapability::Toggle));
        assert!(without_bypass.requires_battery_level_monitoring());
    }

    #[test]
    fn test_limit_crossing_toggles_once() -> Result {
        let (mut threshold, state) = threshold(EnumSet::only(ControlCapability::Toggle));

        assert!(threshold.update_limit(50.0, 80)?);
        assert_eq!(state.lock().unwrap().charging_enabled, Some(true));

        // No transition while still below the limit.
        assert!(!threshold.update_limit(55.0, 80)?);
        assert_eq!(state.lock().unwrap().n_charging_commands, 1);

        assert!(threshold.update_limit(80.0, 80)?);
        assert_eq!(state.lock().unwrap().charging_enabled, Some(false));
        Ok(())
    }

    #[test]
    fn test_window_holds_before_start() -> Result {
        let (mut threshold, state) = threshold(EnumSet::only(ControlCapability::Toggle));
        let window = ChargeWindow {
            start: Local::now() + TimeDelta::hours(2),
            target: Local::now() + TimeDelta::hours(10),
        };

        assert!(threshold.update_window(60.0, &window, ChargingMode::Manual)?);
        assert_eq!(state.lock().unwrap().charging_enabled, Some(false));
        assert!(!threshold.update_window(60.0, &window, ChargingMode::Manual)?);
        Ok(())
    }

    #[test]
    fn test_window_tops_up_once_open() -> Result {
        let (mut threshold, state) = threshold(EnumSet::only(ControlCapability::Toggle));
        let window = ChargeWindow {
            start: Local::now() - TimeDelta::hours(1),
            target: Local::now() + TimeDelta::hours(7),
        };

        assert!(threshold.update_window(60.0, &window, ChargingMode::Manual)?);
        assert_eq!(state.lock().unwrap().charging_enabled, Some(true));
        Ok(())
    }

    #[test]
    fn test_disable_restores_charging() -> Result {
        let (mut threshold, state) = threshold(EnumSet::only(ControlCapability::Toggle));
        threshold.update_limit(90.0, 80)?;
        assert_eq!(state.lock().unwrap().charging_enabled, Some(false));

        threshold.disable()?;
        assert_eq!(state.lock().unwrap().charging_enabled, Some(true));

        // Disabling again does not touch the mechanism.
        threshold.disable()?;
        assert_eq!(state.lock().unwrap().n_charging_commands, 2);
        Ok(())
    }
}
