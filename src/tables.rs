use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::core::{ChargingWindow, DailySummary};

/// Clean share at which a period is highlighted as green.
const GREEN_PERCENT: f64 = 50.0;

fn clean_color(clean_percent: f64) -> Color {
    if clean_percent >= GREEN_PERCENT { Color::Green } else { Color::DarkYellow }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

#[must_use]
pub fn build_summary_table(summaries: &[DailySummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Clean", "Fuel mix"]);
    for summary in summaries {
        let fuel_mix = summary
            .fuels_by_share()
            .map(|(fuel, percentage)| format!("{fuel} {percentage:.1}%"))
            .join(", ");
        table.add_row(vec![
            Cell::new(summary.date.format("%a %Y-%m-%d")),
            Cell::new(format!("{:.1}%", summary.clean_energy_percent))
                .set_alignment(CellAlignment::Right)
                .fg(clean_color(summary.clean_energy_percent)),
            Cell::new(fuel_mix).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

#[must_use]
pub fn build_window_table(window: &ChargingWindow) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Clean"]);
    table.add_row(vec![
        Cell::new(window.start.format("%Y-%m-%d %H:%M")),
        Cell::new(window.end.format("%Y-%m-%d %H:%M")),
        Cell::new(format!("{:.1}%", window.average_clean_percent))
            .set_alignment(CellAlignment::Right)
            .fg(clean_color(window.average_clean_percent)),
    ]);
    table
}
