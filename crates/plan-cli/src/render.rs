//! Plain-text rendering of diff reports

use plan_diff::DiffReport;
use std::fmt::Write;

/// One line per changed slot, then the ids involved
pub(crate) fn render_report(report: &DiffReport) -> String {
    let mut out = String::new();
    if report.is_empty() {
        out.push_str("no changes\n");
        return out;
    }

    let summary = report.summary();
    let _ = writeln!(
        out,
        "{} changes in {} slots (+{} ~{} -{})",
        summary.total(),
        summary.slots_changed,
        summary.additions,
        summary.modifications,
        summary.deletions
    );
    for (slot, diff) in report.changed_slots() {
        let _ = writeln!(
            out,
            "  {:<24} +{} ~{} -{}",
            slot.as_str(),
            diff.additions.len(),
            diff.modifications.len(),
            diff.deletions.len()
        );
        for id in &diff.additions {
            let _ = writeln!(out, "    + {id}");
        }
        for modification in &diff.modifications {
            let _ = writeln!(out, "    ~ {}", modification.id);
        }
        for id in &diff.deletions {
            let _ = writeln!(out, "    - {id}");
        }
    }
    out
}
