use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::jenkins::{JobHealth, JobStatus};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn job_status_label(status: JobStatus) -> String {
    let label = match status.health {
        JobHealth::Success => "success",
        JobHealth::Failed => "failed",
        JobHealth::Unstable => "unstable",
        JobHealth::Aborted => "aborted",
        JobHealth::NotBuilt => "not built",
        JobHealth::Disabled => "disabled",
        JobHealth::Unknown => "unknown",
    };

    if status.building {
        format!("{label} (building)")
    } else {
        label.to_string()
    }
}

pub fn color_coded_status_cell(status: JobStatus) -> Cell {
    let color = match status.health {
        JobHealth::Success => TableColor::Green,
        JobHealth::Failed => TableColor::Red,
        JobHealth::Unstable => TableColor::Yellow,
        JobHealth::Aborted | JobHealth::NotBuilt | JobHealth::Disabled | JobHealth::Unknown => {
            TableColor::DarkGrey
        }
    };
    Cell::new(job_status_label(status)).fg(color)
}
