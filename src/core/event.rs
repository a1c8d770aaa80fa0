/// External signals feeding the supervisor.
///
/// Delivery is asynchronous, but all events are drained by a single consumer so
/// that no two evaluations ever run concurrently.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The settings store changed and should be re-read.
    SettingsChanged,

    PowerConnected,
    PowerDisconnected,

    /// Raw battery level reading as reported by the platform.
    BatteryLevel { level: u32, scale: u32 },

    /// One-shot user override: suppress charging control until the next power cycle.
    CancelOnce,

    Shutdown,
}
