use bon::Builder;
use chrono::Local;
use itertools::Itertools;
use tokio::sync::mpsc::Receiver;

use crate::{
    alarm::AlarmSource,
    cli::DefaultSettings,
    config::{ConfigStore, SettingKey},
    core::{
        event::Event,
        mode::ChargingMode,
        provider::ChargingProvider,
        time_of_day::{SECONDS_PER_DAY, TimeOfDay},
        window::ChargeWindow,
    },
    notify::Notifications,
    prelude::*,
};

/// The stateful core: holds the configuration snapshot, battery and power
/// state, and the selected control strategy, and reacts to external events by
/// recomputing the desired charging action.
///
/// All state is mutated by one serialized stream of events, so no two
/// evaluations ever run concurrently for the same instance.
#[derive(Builder)]
pub struct Supervisor {
    store: Box<dyn ConfigStore>,
    alarm: Box<dyn AlarmSource>,
    notifications: Box<dyn Notifications>,

    /// Chosen once at startup; `None` disables the feature for the process lifetime.
    provider: Option<Box<dyn ChargingProvider>>,

    defaults: DefaultSettings,

    #[builder(skip)]
    battery_pct: f32,

    #[builder(skip)]
    power_connected: bool,

    /// One-shot user override; cleared on the next full power-disconnect cycle.
    #[builder(skip)]
    control_cancelled_once: bool,

    /// Whether battery-level updates are currently acted upon.
    #[builder(skip)]
    listening: bool,

    /// Armed by cancel-once on monitoring-required strategies: the next
    /// disconnect event performs the regular disconnect cleanup, then the
    /// arming is dropped.
    #[builder(skip)]
    reset_on_disconnect: bool,
}

impl Supervisor {
    pub fn is_supported(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_mode_supported(&self, mode: ChargingMode) -> Result<bool> {
        match &self.provider {
            Some(provider) => Ok(provider.supported_modes()?.contains(mode)),
            None => Ok(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.get(SettingKey::Enabled).map_or(self.defaults.enabled, |value| value != 0)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<bool> {
        self.store.set(SettingKey::Enabled, i64::from(enabled))?;
        self.on_settings_changed()?;
        Ok(true)
    }

    pub fn mode(&self) -> ChargingMode {
        self.store
            .get(SettingKey::Mode)
            .and_then(|value| ChargingMode::try_from(value).ok())
            .unwrap_or(self.defaults.mode)
    }

    pub fn set_mode(&mut self, mode: ChargingMode) -> Result<bool> {
        self.store.set(SettingKey::Mode, mode.ordinal())?;
        self.on_settings_changed()?;
        Ok(true)
    }

    /// Returns `Ok(false)` and leaves the stored value untouched when the
    /// ordinal is out of range.
    pub fn set_mode_ordinal(&mut self, ordinal: i64) -> Result<bool> {
        match ChargingMode::try_from(ordinal) {
            Ok(mode) => self.set_mode(mode),
            Err(_) => Ok(false),
        }
    }

    pub fn limit(&self) -> u32 {
        self.store
            .get(SettingKey::Limit)
            .and_then(|value| u32::try_from(value).ok())
            .filter(|limit| *limit <= 100)
            .unwrap_or(self.defaults.limit)
    }

    /// Returns `Ok(false)` and leaves the stored value untouched when the
    /// percentage is out of range.
    pub fn set_limit(&mut self, limit: i64) -> Result<bool> {
        if !(0..=100).contains(&limit) {
            return Ok(false);
        }
        self.store.set(SettingKey::Limit, limit)?;
        self.on_settings_changed()?;
        Ok(true)
    }

    pub fn start_time(&self) -> TimeOfDay {
        self.time_setting(SettingKey::StartTime, self.defaults.start_time)
    }

    pub fn set_start_time(&mut self, seconds: i64) -> Result<bool> {
        self.set_time_setting(SettingKey::StartTime, seconds)
    }

    pub fn target_time(&self) -> TimeOfDay {
        self.time_setting(SettingKey::TargetTime, self.defaults.target_time)
    }

    pub fn set_target_time(&mut self, seconds: i64) -> Result<bool> {
        self.set_time_setting(SettingKey::TargetTime, seconds)
    }

    fn time_setting(&self, key: SettingKey, default: TimeOfDay) -> TimeOfDay {
        self.store
            .get(key)
            .and_then(|value| u32::try_from(value).ok())
            .and_then(TimeOfDay::new)
            .unwrap_or(default)
    }

    fn set_time_setting(&mut self, key: SettingKey, seconds: i64) -> Result<bool> {
        if !(0..=i64::from(SECONDS_PER_DAY)).contains(&seconds) {
            return Ok(false);
        }
        self.store.set(key, seconds)?;
        self.on_settings_changed()?;
        Ok(true)
    }

    /// Restore every setting to its configured default and re-evaluate.
    pub fn reset(&mut self) -> Result<bool> {
        self.store.set(SettingKey::Enabled, i64::from(self.defaults.enabled))?;
        self.store.set(SettingKey::Mode, self.defaults.mode.ordinal())?;
        self.store.set(SettingKey::Limit, i64::from(self.defaults.limit))?;
        self.store.set(SettingKey::StartTime, i64::from(self.defaults.start_time.seconds()))?;
        self.store.set(SettingKey::TargetTime, i64::from(self.defaults.target_time.seconds()))?;
        self.on_settings_changed()?;
        Ok(true)
    }

    /// Wire the initial power state and restore the settings.
    #[instrument(skip_all)]
    pub fn start(&mut self) -> Result<()> {
        let Some(provider) = &self.provider else {
            info!("charging control is not supported, the supervisor stays inactive");
            return Ok(());
        };
        if provider.requires_battery_level_monitoring() {
            // Without bypass we cannot tell "unplugged" from "plugged in but not
            // charging", so power is assumed connected from the start.
            self.power_connected = true;
            self.on_power_status(true)?;
        }
        self.on_settings_changed()
    }

    /// Drive the supervisor from the serialized event stream until shutdown.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut events: Receiver<Event>) -> Result<Self> {
        self.start()?;
        while let Some(event) = events.recv().await {
            if event == Event::Shutdown {
                info!("shutting down");
                break;
            }
            debug!(?event, "handling");
            self.handle(event)?;
        }
        Ok(self)
    }

    /// Apply one event from the serialized stream.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        if self.provider.is_none() {
            return Ok(());
        }
        match event {
            Event::SettingsChanged => {
                match self.store.reload() {
                    Ok(changed) if !changed.is_empty() => {
                        info!(keys = %changed.iter().join(", "), "settings changed");
                    }
                    Ok(_) => {}
                    Err(error) => warn!("failed to reload the settings: {error:#}"),
                }
                self.on_settings_changed()
            }
            Event::PowerConnected => self.on_power_event(true),
            Event::PowerDisconnected => self.on_power_event(false),
            Event::BatteryLevel { level, scale } => self.on_battery_level(level, scale),
            Event::CancelOnce => {
                self.cancel_once();
                Ok(())
            }
            Event::Shutdown => Ok(()),
        }
    }

    /// The one-shot user override: stop limiting until the next power cycle.
    pub fn cancel_once(&mut self) {
        let Some(provider) = &mut self.provider else { return };
        info!("charging control cancelled until the next power cycle");
        self.control_cancelled_once = true;
        if provider.requires_battery_level_monitoring() {
            // A disconnect is otherwise invisible to this strategy; arm a one-shot
            // cleanup so the next disconnect event clears the suppression.
            self.reset_on_disconnect = true;
        }
        if let Err(error) = provider.disable() {
            warn!("failed to disable charging control: {error:#}");
        }
        self.notifications.cancel();
    }

    /// Produce the full diagnostic dump: configuration, runtime state, and the
    /// provider's own diagnostics.
    pub fn dump(&self) -> String {
        let mut dump = format!(
            "Configuration:\n  enabled: {}\n  mode: {}\n  limit: {}%\n  start time: {}\n  target time: {}\n",
            self.is_enabled(),
            self.mode(),
            self.limit(),
            self.start_time(),
            self.target_time(),
        );
        dump.push_str(&format!(
            "State:\n  battery: {:.1}%\n  power connected: {}\n  listening: {}\n  cancelled once: {}\n  notification posted: {}\n  notification done: {}\n",
            self.battery_pct,
            self.power_connected,
            self.listening,
            self.control_cancelled_once,
            self.notifications.is_posted(),
            self.notifications.is_done(),
        ));
        match &self.provider {
            Some(provider) => dump.push_str(&provider.dump()),
            None => dump.push_str("No charging control strategy is supported.\n"),
        }
        dump
    }

    /// Re-validate the mode against the selected strategy, reset the internal
    /// state, and re-evaluate.
    fn on_settings_changed(&mut self) -> Result<()> {
        if self.provider.is_none() {
            return Ok(());
        }
        let mode = self.mode();
        if !self.is_mode_supported(mode)? {
            warn!(
                mode = %mode,
                default = %self.defaults.mode,
                "mode is not supported by the selected strategy, falling back",
            );
            self.store.set(SettingKey::Mode, self.defaults.mode.ordinal())?;
        }
        self.reset_internal_state();
        if self.power_connected && self.is_enabled() {
            // Enabling the feature while already plugged in must resume monitoring.
            self.listening = true;
        }
        self.evaluate()
    }

    fn reset_internal_state(&mut self) {
        self.control_cancelled_once = false;
        self.notifications.cancel();
        if let Some(provider) = &mut self.provider {
            provider.reset();
        }
    }

    fn on_power_event(&mut self, connected: bool) -> Result<()> {
        let monitoring = self
            .provider
            .as_ref()
            .is_some_and(|provider| provider.requires_battery_level_monitoring());
        if monitoring {
            // Power state is not independently observable for this strategy; the
            // only use of a disconnect event is completing a pending cancel-once
            // cycle.
            if !connected && self.reset_on_disconnect {
                info!("power disconnected, completing the cancel-once cycle");
                self.reset_on_disconnect = false;
                self.reset_internal_state();
            }
            return Ok(());
        }
        info!(connected, "power state changed");
        self.power_connected = connected;
        self.on_power_status(connected)
    }

    fn on_power_status(&mut self, connected: bool) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if connected {
            self.listening = true;
            self.evaluate()
        } else {
            self.listening = false;
            self.reset_internal_state();
            if let Some(provider) = &mut self.provider
                && let Err(error) = provider.disable()
            {
                warn!("failed to disable charging control: {error:#}");
            }
            Ok(())
        }
    }

    fn on_battery_level(&mut self, level: u32, scale: u32) -> Result<()> {
        if !self.listening {
            return Ok(());
        }
        if scale == 0 {
            warn!("ignoring a battery reading with zero scale");
            return Ok(());
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.battery_pct = level as f32 * 100.0 / scale as f32;
        }
        trace!(battery_pct = self.battery_pct, "battery level updated");
        self.evaluate()
    }

    /// Recompute the desired charging action and drive the strategy.
    ///
    /// Control-plane failures are logged and retried on the next naturally
    /// occurring event; a failed capability query aborts the operation.
    fn evaluate(&mut self) -> Result<()> {
        if self.provider.is_none() {
            return Ok(());
        }
        let mode = self.mode();
        let limit = self.limit();
        let start_time = self.start_time();
        let target_time = self.target_time();
        let active = self.is_enabled() && !self.control_cancelled_once;
        let battery_pct = self.battery_pct;

        let next_alarm = if mode == ChargingMode::Auto {
            match self.alarm.next_scheduled_wake() {
                Ok(next_alarm) => next_alarm,
                Err(error) => {
                    warn!("failed to query the alarm schedule: {error:#}");
                    None
                }
            }
        } else {
            None
        };

        let Some(provider) = &mut self.provider else { return Ok(()) };

        if !active {
            if let Err(error) = provider.disable() {
                warn!("failed to disable charging control: {error:#}");
            }
            return Ok(());
        }

        if let Err(error) = provider.enable() {
            warn!("failed to enable charging control: {error:#}");
            return Ok(());
        }

        if mode == ChargingMode::Limit {
            match provider.update_limit(battery_pct, limit) {
                Ok(true) => {
                    #[allow(clippy::cast_precision_loss)]
                    let done = battery_pct >= limit as f32;
                    self.notifications.post_limit(limit, done);
                }
                Ok(false) => {}
                Err(error) => warn!("charging control update failed: {error:#}"),
            }
            return Ok(());
        }

        let Some(window) =
            ChargeWindow::compute(mode, Local::now(), start_time, target_time, next_alarm)
        else {
            self.notifications.cancel();
            return Ok(());
        };
        match provider.update_window(battery_pct, &window, mode) {
            Ok(true) => self.notifications.post_target(window.target, battery_pct >= 100.0),
            Ok(false) => self.notifications.cancel(),
            Err(error) => warn!("charging control update failed: {error:#}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::TimeDelta;
    use enumset::EnumSet;

    use super::*;
    use crate::{
        alarm::FixedAlarm,
        config::MemoryStore,
        control::{
            ChargingControl, ControlCapability,
            testing::{FakeControl, FakeControlState},
        },
        core::provider::probe,
        notify::testing::{FakeNotificationState, FakeNotifications},
    };

    struct Harness {
        supervisor: Supervisor,
        control: Arc<Mutex<FakeControlState>>,
        notifications: Arc<Mutex<FakeNotificationState>>,
    }

    fn defaults() -> DefaultSettings {
        DefaultSettings {
            enabled: true,
            mode: ChargingMode::Auto,
            limit: 80,
            start_time: "22:00".parse().unwrap(),
            target_time: "06:00".parse().unwrap(),
        }
    }

    fn toggle_bypass() -> EnumSet<ControlCapability> {
        ControlCapability::Toggle | ControlCapability::Bypass
    }

    fn harness(capabilities: EnumSet<ControlCapability>, defaults: DefaultSettings) -> Harness {
        let control = FakeControl::new(capabilities);
        let control_state = control.state();
        let control: Arc<dyn ChargingControl> = Arc::new(control);
        let notifications = FakeNotifications::default();
        let notification_state = notifications.state();
        let supervisor = Supervisor::builder()
            .store(Box::new(MemoryStore::default()))
            .alarm(Box::new(FixedAlarm(None)))
            .notifications(Box::new(notifications))
            .maybe_provider(probe(&control))
            .defaults(defaults)
            .build();
        Harness { supervisor, control: control_state, notifications: notification_state }
    }

    #[test]
    fn test_set_limit_out_of_range_is_rejected() -> Result {
        let mut harness = harness(toggle_bypass(), defaults());
        assert!(!harness.supervisor.set_limit(150)?);
        assert!(!harness.supervisor.set_limit(-1)?);
        assert_eq!(harness.supervisor.limit(), 80);
        Ok(())
    }

    #[test]
    fn test_set_time_bounds() -> Result {
        let mut harness = harness(toggle_bypass(), defaults());
        assert!(!harness.supervisor.set_start_time(86_401)?);
        assert!(harness.supervisor.set_start_time(86_400)?);
        assert_eq!(harness.supervisor.start_time().seconds(), 86_400);
        assert!(!harness.supervisor.set_target_time(-1)?);
        assert!(harness.supervisor.set_target_time(25_200)?);
        assert_eq!(harness.supervisor.target_time().seconds(), 25_200);
        Ok(())
    }

    #[test]
    fn test_set_mode_ordinal_out_of_range_is_rejected() -> Result {
        let mut harness = harness(toggle_bypass(), defaults());
        assert!(!harness.supervisor.set_mode_ordinal(7)?);
        assert_eq!(harness.supervisor.mode(), ChargingMode::Auto);
        Ok(())
    }

    #[test]
    fn test_reset_restores_defaults() -> Result {
        let mut harness = harness(toggle_bypass(), defaults());
        harness.supervisor.set_mode(ChargingMode::Limit)?;
        harness.supervisor.set_limit(50)?;
        harness.supervisor.set_start_time(0)?;
        assert!(harness.supervisor.reset()?);
        assert_eq!(harness.supervisor.mode(), ChargingMode::Auto);
        assert_eq!(harness.supervisor.limit(), 80);
        assert_eq!(harness.supervisor.start_time().seconds(), 79_200);
        Ok(())
    }

    #[test]
    fn test_unsupported_mode_falls_back_to_default() -> Result {
        let mut harness = harness(EnumSet::only(ControlCapability::Deadline), defaults());
        // The deadline strategy cannot cap the battery, so the mode reverts
        // and the fallback is persisted.
        assert!(harness.supervisor.set_mode(ChargingMode::Limit)?);
        assert_eq!(harness.supervisor.mode(), ChargingMode::Auto);
        assert_eq!(
            harness.supervisor.store.get(SettingKey::Mode),
            Some(ChargingMode::Auto.ordinal()),
        );
        Ok(())
    }

    #[test]
    fn test_auto_without_alarm_skips_the_provider() -> Result {
        let mut harness = harness(toggle_bypass(), defaults());
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::PowerConnected)?;
        harness.supervisor.handle(Event::BatteryLevel { level: 50, scale: 100 })?;
        // The charge path is never touched and no notification is posted.
        assert_eq!(harness.control.lock().unwrap().charging_enabled, None);
        assert!(!harness.notifications.lock().unwrap().posted);
        Ok(())
    }

    #[test]
    fn test_limit_mode_caps_the_battery() -> Result {
        let defaults = DefaultSettings { mode: ChargingMode::Limit, ..defaults() };
        let mut harness = harness(toggle_bypass(), defaults);
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::PowerConnected)?;
        harness.supervisor.handle(Event::BatteryLevel { level: 50, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        {
            let notifications = harness.notifications.lock().unwrap();
            assert!(notifications.posted);
            assert!(!notifications.done);
            assert_eq!(notifications.last_limit, Some(80));
        }

        harness.supervisor.handle(Event::BatteryLevel { level: 80, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(false));
        assert!(harness.notifications.lock().unwrap().done);
        Ok(())
    }

    #[test]
    fn test_cancel_once_suppresses_until_power_cycle() -> Result {
        let defaults = DefaultSettings { mode: ChargingMode::Limit, ..defaults() };
        let mut harness = harness(EnumSet::only(ControlCapability::Toggle), defaults);
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::BatteryLevel { level: 90, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(false));

        harness.supervisor.handle(Event::CancelOnce)?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        assert!(!harness.notifications.lock().unwrap().posted);

        // Still suppressed on further battery updates.
        harness.supervisor.handle(Event::BatteryLevel { level: 95, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        assert!(harness.supervisor.control_cancelled_once);

        // A real power cycle clears the suppression and evaluation resumes.
        harness.supervisor.handle(Event::PowerDisconnected)?;
        assert!(!harness.supervisor.control_cancelled_once);
        harness.supervisor.handle(Event::PowerConnected)?;
        harness.supervisor.handle(Event::BatteryLevel { level: 90, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(false));
        Ok(())
    }

    #[test]
    fn test_disconnect_performs_cleanup() -> Result {
        let defaults = DefaultSettings { mode: ChargingMode::Limit, ..defaults() };
        let mut harness = harness(toggle_bypass(), defaults);
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::PowerConnected)?;
        harness.supervisor.handle(Event::BatteryLevel { level: 90, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(false));
        assert!(harness.supervisor.listening);

        harness.supervisor.handle(Event::PowerDisconnected)?;
        assert!(!harness.supervisor.listening);
        assert!(!harness.supervisor.control_cancelled_once);
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        assert!(!harness.notifications.lock().unwrap().posted);

        // Battery updates are ignored while unplugged.
        harness.supervisor.handle(Event::BatteryLevel { level: 50, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        Ok(())
    }

    #[test]
    fn test_disabled_supervisor_withdraws_control() -> Result {
        let defaults = DefaultSettings { enabled: false, ..defaults() };
        let mut harness = harness(toggle_bypass(), defaults);
        harness.supervisor.start()?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(true));
        Ok(())
    }

    #[test]
    fn test_enabling_while_connected_starts_listening() -> Result {
        let defaults = DefaultSettings { enabled: false, mode: ChargingMode::Limit, ..defaults() };
        let mut harness = harness(toggle_bypass(), defaults);
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::PowerConnected)?;
        assert!(!harness.supervisor.listening);

        harness.supervisor.set_enabled(true)?;
        assert!(harness.supervisor.listening);
        harness.supervisor.handle(Event::BatteryLevel { level: 90, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, Some(false));
        Ok(())
    }

    #[test]
    fn test_battery_percent_conversion() -> Result {
        let mut harness = harness(EnumSet::only(ControlCapability::Toggle), defaults());
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::BatteryLevel { level: 1, scale: 3 })?;
        approx::assert_relative_eq!(harness.supervisor.battery_pct, 100.0_f32 / 3.0);
        Ok(())
    }

    #[test]
    fn test_unsupported_platform_is_a_noop() -> Result {
        let mut harness = harness(EnumSet::empty(), defaults());
        assert!(!harness.supervisor.is_supported());
        assert!(!harness.supervisor.is_mode_supported(ChargingMode::Limit)?);
        harness.supervisor.start()?;
        harness.supervisor.handle(Event::PowerConnected)?;
        harness.supervisor.handle(Event::BatteryLevel { level: 50, scale: 100 })?;
        assert_eq!(harness.control.lock().unwrap().charging_enabled, None);
        assert!(harness.supervisor.dump().contains("No charging control strategy"));
        Ok(())
    }

    #[test]
    fn test_manual_mode_arms_the_deadline_once() -> Result {
        let defaults = DefaultSettings { mode: ChargingMode::Manual, ..defaults() };
        let mut harness = harness(EnumSet::only(ControlCapability::Deadline), defaults);
        harness.supervisor.start()?;
        assert!(harness.control.lock().unwrap().deadline.is_some());
        assert!(harness.notifications.lock().unwrap().posted);

        // Unchanged target: the countdown is not re-armed and the notification
        // is withdrawn.
        harness.supervisor.handle(Event::PowerConnected)?;
        assert_eq!(harness.control.lock().unwrap().n_deadline_commands, 1);
        assert!(!harness.notifications.lock().unwrap().posted);
        Ok(())
    }

    #[test]
    fn test_auto_mode_uses_the_wake_alarm() -> Result {
        let mut harness = harness(EnumSet::only(ControlCapability::Deadline), defaults());
        harness.supervisor.alarm = Box::new(FixedAlarm(Some(Local::now() + TimeDelta::hours(12))));
        harness.supervisor.start()?;
        assert!(harness.control.lock().unwrap().deadline.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_run_drains_the_event_stream() -> Result {
        let defaults = DefaultSettings { mode: ChargingMode::Limit, ..defaults() };
        let harness = harness(toggle_bypass(), defaults);
        let control = Arc::clone(&harness.control);

        let (events, receiver) = tokio::sync::mpsc::channel(8);
        events.send(Event::PowerConnected).await?;
        events.send(Event::BatteryLevel { level: 90, scale: 100 }).await?;
        events.send(Event::Shutdown).await?;

        let supervisor = harness.supervisor.run(receiver).await?;
        assert_eq!(control.lock().unwrap().charging_enabled, Some(false));
        assert!(supervisor.dump().contains("battery: 90.0%"));
        Ok(())
    }
}
