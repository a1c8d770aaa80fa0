use chrono::{DateTime, Local};

use crate::prelude::*;

/// Boundary to the user-facing notification surface.
///
/// Purely presentational; nothing here feeds back into charging decisions.
pub trait Notifications: Send {
    /// Post or refresh the charge-limit notification.
    fn post_limit(&mut self, limit: u32, done: bool);

    /// Post or refresh the target-time notification.
    fn post_target(&mut self, target: DateTime<Local>, done: bool);

    fn cancel(&mut self);

    fn is_posted(&self) -> bool;

    fn is_done(&self) -> bool;
}

/// Notification sink that renders into the log.
#[derive(Default)]
pub struct LogNotifications {
    posted: bool,
    done: bool,
}

impl Notifications for LogNotifications {
    fn post_limit(&mut self, limit: u32, done: bool) {
        if done {
            info!(limit, "battery is capped at the configured limit");
        } else {
            info!(limit, "battery charging is being limited");
        }
        self.posted = true;
        self.done = done;
    }

    fn post_target(&mut self, target: DateTime<Local>, done: bool) {
        let target_time = target.format("%Y-%m-%d %H:%M:%S").to_string();
        if done {
            info!(target_time, "battery is fully charged");
        } else {
            info!(target_time, "charging is scheduled to complete by the target time");
        }
        self.posted = true;
        self.done = done;
    }

    fn cancel(&mut self) {
        if self.posted {
            debug!("charging notification withdrawn");
        }
        self.posted = false;
        self.done = false;
    }

    fn is_posted(&self) -> bool {
        self.posted
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
