use std::fmt::Write as _;

use super::{Finding, FindingStatus, GapReport};
use crate::constants::MAX_EVIDENCE_CHARS;
use crate::matching::MatchedStatement;

const STATUS_ORDER: [FindingStatus; 5] = [
    FindingStatus::Satisfied,
    FindingStatus::Partial,
    FindingStatus::Weak,
    FindingStatus::Missing,
    FindingStatus::Cancelled,
];

pub(super) fn evidence_line(statement: &MatchedStatement) -> String {
    let mut text: String = statement.text.chars().take(MAX_EVIDENCE_CHARS).collect();
    if statement.text.chars().count() > MAX_EVIDENCE_CHARS {
        text.push('…');
    }
    if statement.page == 0 {
        format!("\"{}\" (score {:.2})", text, statement.score)
    } else {
        format!("[Page {}] \"{}\" (score {:.2})", statement.page, text, statement.score)
    }
}

pub(super) fn markdown(report: &GapReport) -> String {
    let meta = &report.metadata;
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# Gap Report: {}\n", meta.target);
    let _ = writeln!(out, "- Run: `{}`", meta.run_id);
    let _ = writeln!(out, "- Generated: {}", meta.generated_at.to_rfc3339());
    let _ = writeln!(
        out,
        "- Index: `{}` ({} requirements)",
        meta.index_version, meta.index_size
    );
    if meta.dropped_statements > 0 {
        let _ = writeln!(
            out,
            "- Dropped statements: {} (rejected by the embedder)",
            meta.dropped_statements
        );
    }
    let _ = writeln!(
        out,
        "- Matcher: top {} at threshold {:.2}",
        meta.matcher.top_k, meta.matcher.threshold
    );
    let _ = writeln!(out, "- Outcome: {} ({} degraded)\n", summary.outcome, summary.degraded);

    let _ = writeln!(out, "| Status | Count |\n| --- | ---: |");
    for status in STATUS_ORDER {
        let _ = writeln!(out, "| {} | {} |", status, summary.counts.get(status));
    }
    let _ = writeln!(out, "| **Total** | **{}** |\n", summary.total);

    let _ = writeln!(out, "## Findings\n");
    for finding in &report.findings {
        write_finding(&mut out, finding);
    }
    out
}

fn write_finding(out: &mut String, finding: &Finding) {
    let _ = writeln!(
        out,
        "### {} `{}`{}\n",
        finding.status,
        finding.requirement_id,
        if finding.degraded { " (degraded)" } else { "" }
    );
    let _ = writeln!(
        out,
        "**Reference** ({}, {}): {}\n",
        finding.source_label(),
        finding.severity,
        finding.source_reference_text
    );
    let _ = writeln!(out, "**Justification:** {}\n", finding.justification);
    if finding.matched_statements.is_empty() {
        let _ = writeln!(out, "**Evidence:** none\n");
    } else {
        let _ = writeln!(out, "**Evidence:**\n");
        for statement in &finding.matched_statements {
            let _ = writeln!(out, "- {}", evidence_line(statement));
        }
        out.push('\n');
    }
}

pub(super) fn console_summary(report: &GapReport, limit: usize) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Checked {} requirements against {}: {}",
        summary.total, report.metadata.target, summary.outcome
    );
    let counts: Vec<String> = STATUS_ORDER
        .iter()
        .map(|s| format!("{} {}", s, summary.counts.get(*s)))
        .collect();
    let _ = writeln!(out, "  {}", counts.join(" | "));
    if summary.degraded > 0 {
        let _ = writeln!(
            out,
            "  {} finding(s) could not be adjudicated",
            summary.degraded
        );
    }

    let gaps: Vec<&Finding> = report.gaps().collect();
    if gaps.is_empty() {
        let _ = writeln!(out, "No gaps found.");
        return out;
    }

    let _ = writeln!(out, "Gaps ({}):", gaps.len());
    for finding in gaps.iter().take(limit) {
        let text: String = finding.source_reference_text.chars().take(100).collect();
        let _ = writeln!(
            out,
            "  [{}] {} {}: {}",
            finding.status,
            finding.requirement_id,
            finding.source_label(),
            text
        );
    }
    if gaps.len() > limit {
        let _ = writeln!(out, "  ... and {} more", gaps.len() - limit);
    }
    out
}
