//! Rendering of the `run` summary

use crate::channel::{ChannelStats, StatsTotals};
use crate::core::styles::StyleRole;
use prettytable::{format, Cell, Row, Table};
use serde::Serialize;

/// Outcome of one `run` invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub channel: String,
    pub partitions: Vec<ChannelStats>,
    pub totals: StatsTotals,
    pub elapsed_ms: f64,
    pub throughput_per_sec: f64,
    pub order_violations: u64,
    pub spans: usize,
    /// True when shutdown was requested before the workload finished
    pub interrupted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.order_violations == 0
    }
}

fn header_cell(text: &str, use_color: bool) -> Cell {
    Cell::new(text).style_spec(&StyleRole::Header.table_spec(use_color, true))
}

fn count_cell(value: u64, role: StyleRole, use_color: bool) -> Cell {
    let role = if value == 0 { StyleRole::Value } else { role };
    Cell::new(&value.to_string()).style_spec(&format!("r{}", role.table_spec(use_color, false)))
}

fn partition_table(summary: &RunSummary, use_color: bool) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(
        ["Partition", "Published", "Processed", "Failed", "Depth", "Capacity"]
            .iter()
            .map(|title| header_cell(title, use_color))
            .collect(),
    ));

    for stats in &summary.partitions {
        let partition = stats
            .partition
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        table.add_row(Row::new(vec![
            Cell::new(&partition).style_spec(&StyleRole::Key.table_spec(use_color, false)),
            count_cell(stats.published, StyleRole::Value, use_color),
            count_cell(stats.processed, StyleRole::Success, use_color),
            count_cell(stats.failed, StyleRole::Failure, use_color),
            count_cell(stats.queue_depth as u64, StyleRole::Value, use_color),
            Cell::new(&stats.capacity.to_string()).style_spec("r"),
        ]));
    }

    let totals = &summary.totals;
    table.add_row(Row::new(vec![
        header_cell("total", use_color),
        count_cell(totals.published, StyleRole::Value, use_color),
        count_cell(totals.processed, StyleRole::Success, use_color),
        count_cell(totals.failed, StyleRole::Failure, use_color),
        count_cell(totals.queue_depth as u64, StyleRole::Value, use_color),
        Cell::new(""),
    ]));
    table
}

/// Human-readable summary: a per-partition table followed by run totals
pub fn render_text(summary: &RunSummary, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n\n",
        StyleRole::Header.paint("Channel", use_color),
        StyleRole::Key.paint(&summary.channel, use_color)
    ));
    out.push_str(&partition_table(summary, use_color).to_string());
    out.push('\n');

    let line = |label: &str, value: String| {
        format!("{:<18}{}\n", StyleRole::Dim.paint(label, use_color), value)
    };
    out.push_str(&line("Elapsed", format!("{:.1} ms", summary.elapsed_ms)));
    out.push_str(&line(
        "Throughput",
        format!("{:.0} msg/s", summary.throughput_per_sec),
    ));
    out.push_str(&line("Spans", summary.spans.to_string()));
    let ordering = if summary.order_violations == 0 {
        StyleRole::Success.paint("preserved", use_color)
    } else {
        StyleRole::Failure.paint(
            &format!("{} violations", summary.order_violations),
            use_color,
        )
    };
    out.push_str(&line("Per-key order", ordering));
    if summary.interrupted {
        out.push_str(&line(
            "Status",
            StyleRole::Failure.paint("interrupted", use_color),
        ));
    }

    if let Some(metrics) = &summary.metrics {
        out.push('\n');
        out.push_str(metrics);
    }
    out
}

pub fn render_json(summary: &RunSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
