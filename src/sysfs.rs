//! Linux sysfs backends for the supervisor's platform boundaries.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Local, TimeDelta};
use enumset::EnumSet;
use tokio::sync::mpsc::Sender;

use crate::{
    alarm::AlarmSource,
    control::{ChargingControl, ControlCapability},
    core::event::Event,
    prelude::*,
};

/// Charging control backed by `/sys/class/power_supply/<battery>`.
///
/// Toggling maps onto `charge_behaviour` (`auto` to charge, `inhibit-charge` to
/// hold; the device keeps drawing from the charger while inhibited, so the node
/// also implies bypass). Deadline-capable firmware additionally exposes
/// `charge_control_deadline` holding the seconds left until forced completion.
pub struct SysfsChargingControl {
    battery_dir: PathBuf,
}

impl SysfsChargingControl {
    pub fn new(battery_dir: impl Into<PathBuf>) -> Self {
        Self { battery_dir: battery_dir.into() }
    }

    fn behaviour_path(&self) -> PathBuf {
        self.battery_dir.join("charge_behaviour")
    }

    fn deadline_path(&self) -> PathBuf {
        self.battery_dir.join("charge_control_deadline")
    }

    fn write(path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write `{contents}` to `{}`", path.display()))
    }
}

impl ChargingControl for SysfsChargingControl {
    fn capabilities(&self) -> Result<EnumSet<ControlCapability>> {
        let mut capabilities = EnumSet::empty();
        let behaviour_path = self.behaviour_path();
        if behaviour_path.exists() {
            let behaviours = std::fs::read_to_string(&behaviour_path)
                .with_context(|| format!("failed to read `{}`", behaviour_path.display()))?;
            if behaviours.contains("inhibit-charge") {
                capabilities |= ControlCapability::Toggle | ControlCapability::Bypass;
            }
        }
        if self.deadline_path().exists() {
            capabilities |= ControlCapability::Deadline;
        }
        Ok(capabilities)
    }

    fn set_charging_enabled(&self, enabled: bool) -> Result<()> {
        Self::write(&self.behaviour_path(), if enabled { "auto" } else { "inhibit-charge" })
    }

    fn set_charging_deadline(&self, deadline: Option<TimeDelta>) -> Result<()> {
        let seconds = deadline.map_or(0, |deadline| deadline.num_seconds().max(0));
        Self::write(&self.deadline_path(), &seconds.to_string())
    }
}

/// Alarm source backed by `/sys/class/rtc/<rtc>/wakealarm`: epoch seconds,
/// empty when no alarm is armed.
pub struct RtcWakeAlarm {
    path: PathBuf,
}

impl RtcWakeAlarm {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlarmSource for RtcWakeAlarm {
    fn next_scheduled_wake(&self) -> Result<Option<DateTime<Local>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path.display()))?;
        let contents = contents.trim();
        if contents.is_empty() {
            return Ok(None);
        }
        let epoch: i64 = contents
            .parse()
            .with_context(|| format!("malformed wake alarm timestamp: `{contents}`"))?;
        Ok(DateTime::from_timestamp(epoch, 0).map(|wake| wake.with_timezone(&Local)))
    }
}

/// Polls the battery and mains supplies and feeds transitions into the event
/// channel. The initial readings are always emitted so that the supervisor
/// starts from the platform's actual power state.
pub struct PowerSupplyPoller {
    battery_dir: PathBuf,
    mains_dir: Option<PathBuf>,
    interval: Duration,
    events: Sender<Event>,
}

impl PowerSupplyPoller {
    pub const fn new(
        battery_dir: PathBuf,
        mains_dir: Option<PathBuf>,
        interval: Duration,
        events: Sender<Event>,
    ) -> Self {
        Self { battery_dir, mains_dir, interval, events }
    }

    #[instrument(skip_all)]
    pub async fn run(self) {
        let mut last_connected = None;
        let mut last_level = None;
        loop {
            match self.read_connected().await {
                Ok(connected) if last_connected != Some(connected) => {
                    last_connected = Some(connected);
                    let event =
                        if connected { Event::PowerConnected } else { Event::PowerDisconnected };
                    if self.events.send(event).await.is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(error) => warn!("failed to read the power state: {error:#}"),
            }

            match self.read_level().await {
                Ok(level) if last_level != Some(level) => {
                    last_level = Some(level);
                    if self.events.send(Event::BatteryLevel { level, scale: 100 }).await.is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(error) => warn!("failed to read the battery level: {error:#}"),
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    async fn read_connected(&self) -> Result<bool> {
        if let Some(mains_dir) = &self.mains_dir {
            let online = tokio::fs::read_to_string(mains_dir.join("online")).await?;
            Ok(online.trim() == "1")
        } else {
            let status = tokio::fs::read_to_string(self.battery_dir.join("status")).await?;
            Ok(matches!(status.trim(), "Charging" | "Full" | "Not charging"))
        }
    }

    async fn read_level(&self) -> Result<u32> {
        let capacity = tokio::fs::read_to_string(self.battery_dir.join("capacity")).await?;
        Ok(capacity.trim().parse()?)
    }
}
