//! Summary of one analysis run, and its text and HTML renderings.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;
use shelf_core::{RunId, SlotId, VariantId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedEntry {
    pub slot_id: SlotId,
    pub slot_name: String,
    pub variant_id: VariantId,
    pub title: String,
    pub ctr: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotedEntry {
    pub slot_id: SlotId,
    pub slot_name: String,
    pub variant_id: VariantId,
    pub title: String,
}

/// What a run changed, handed to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub run_id: RunId,
    pub date: NaiveDate,
    pub dropped: Vec<DroppedEntry>,
    pub promoted: Vec<PromotedEntry>,
    /// Impressions inside the stats window, over analyzed variants.
    pub total_impressions: u64,
    /// Clicks inside the stats window, over analyzed variants.
    pub total_clicks: u64,
    pub pool_counts_by_slot: BTreeMap<SlotId, usize>,
}

impl CycleReport {
    pub fn new(run_id: RunId, date: NaiveDate) -> Self {
        Self {
            run_id,
            date,
            dropped: Vec::new(),
            promoted: Vec::new(),
            total_impressions: 0,
            total_clicks: 0,
            pool_counts_by_slot: BTreeMap::new(),
        }
    }

    /// Whether anything was dropped or promoted.
    pub fn has_changes(&self) -> bool {
        !self.dropped.is_empty() || !self.promoted.is_empty()
    }

    /// Overall CTR in percent across the window totals.
    pub fn ctr(&self) -> f64 {
        if self.total_impressions == 0 {
            0.0
        } else {
            self.total_clicks as f64 / self.total_impressions as f64 * 100.0
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "A/B Testing Update - {} dropped, {} promoted",
            self.dropped.len(),
            self.promoted.len()
        )
    }
}

/// Plain-text body.
pub fn render_text(report: &CycleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Daily A/B Testing Report");
    let _ = writeln!(out, "Date: {}", report.date);
    let _ = writeln!(
        out,
        "Window: {} impressions, {} clicks ({:.2}% CTR)",
        report.total_impressions,
        report.total_clicks,
        report.ctr()
    );

    let _ = writeln!(out, "\nDropped Variants ({})", report.dropped.len());
    for d in &report.dropped {
        let _ = writeln!(out, "  - {}: \"{}\" - CTR: {:.2}%", d.slot_name, d.title, d.ctr);
    }

    let _ = writeln!(out, "\nPromoted from Pool ({})", report.promoted.len());
    for p in &report.promoted {
        let _ = writeln!(out, "  - {}: \"{}\"", p.slot_name, p.title);
    }

    let _ = writeln!(out, "\nPool Status");
    for (slot, count) in &report.pool_counts_by_slot {
        let marker = if *count == 0 { " (empty)" } else { "" };
        let _ = writeln!(out, "  {}: {}{}", slot, count, marker);
    }

    out
}

/// HTML body. Text from the catalog is escaped.
pub fn render_html(report: &CycleReport) -> String {
    let mut out = String::new();
    out.push_str("<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\n");
    out.push_str("<h2 style=\"color: #ff9900; border-bottom: 2px solid #ff9900;\">Daily A/B Testing Report</h2>\n");
    let _ = writeln!(out, "<p><strong>Date:</strong> {}</p>", report.date);
    let _ = writeln!(
        out,
        "<p><strong>Window:</strong> {} impressions, {} clicks ({:.2}% CTR)</p>",
        report.total_impressions,
        report.total_clicks,
        report.ctr()
    );

    let _ = writeln!(
        out,
        "<h3 style=\"color: #dc3545;\">Dropped Variants ({})</h3>\n<ul>",
        report.dropped.len()
    );
    for d in &report.dropped {
        let _ = writeln!(
            out,
            "<li><strong>{}:</strong> \"{}\" - CTR: {:.2}%</li>",
            escape(&d.slot_name),
            escape(&d.title),
            d.ctr
        );
    }
    out.push_str("</ul>\n");

    let _ = writeln!(
        out,
        "<h3 style=\"color: #28a745;\">Promoted from Pool ({})</h3>\n<ul>",
        report.promoted.len()
    );
    for p in &report.promoted {
        let _ = writeln!(
            out,
            "<li><strong>{}:</strong> \"{}\"</li>",
            escape(&p.slot_name),
            escape(&p.title)
        );
    }
    out.push_str("</ul>\n");

    out.push_str("<h3 style=\"color: #232f3e;\">Pool Status</h3>\n<table>\n");
    out.push_str("<tr><th>Slot</th><th>Items in Pool</th></tr>\n");
    for (slot, count) in &report.pool_counts_by_slot {
        let color = if *count == 0 { "#dc3545" } else { "#28a745" };
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td style=\"color: {}; font-weight: bold;\">{}</td></tr>",
            escape(slot.as_str()),
            color,
            count
        );
    }
    out.push_str("</table>\n</div>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
