use chrono::TimeDelta;
use comfy_table::{Cell, CellAlignment, Table, modifiers, presets};
use enumset::EnumSet;

use crate::{control::ControlCapability, core::window::ChargeWindow};

#[must_use]
pub fn build_window_table(window: &ChargeWindow) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Start", "Target", "Duration"]);
    table.add_row(vec![
        Cell::new(window.start.format("%Y-%m-%d %H:%M:%S")),
        Cell::new(window.target.format("%Y-%m-%d %H:%M:%S")),
        Cell::new(format_duration(window.duration())).set_alignment(CellAlignment::Right),
    ]);
    table
}

#[must_use]
pub fn build_capabilities_table(capabilities: EnumSet<ControlCapability>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Capability", "Available"]);
    for capability in EnumSet::<ControlCapability>::all() {
        table.add_row(vec![
            Cell::new(format!("{capability:?}")),
            Cell::new(if capabilities.contains(capability) { "yes" } else { "no" }),
        ]);
    }
    table
}

fn format_duration(duration: TimeDelta) -> String {
    format!("{}h {:02}m", duration.num_hours(), duration.num_minutes() % 60)
}
