// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render timesheets as plain text or JSON
// role: rendering/output
// inputs: One or more Timesheets
// outputs: UTF-8 text; JSON object for one timesheet, array for several
// invariants:
// - Task lines read "{hours}h - [{issue}] {title}" (tracked) or "{hours}h - {title}" (untracked)
// - Days appear in date order; tracked tasks precede untracked ones
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt::Write as _;

use anyhow::Result;

use crate::model::{TaskWork, Timesheet};

fn task_line(t: &TaskWork) -> String {
  match &t.issue_id {
    Some(issue) => format!("{:.1}h - [{}] {}", t.hours, issue, t.title),
    None => format!("{:.1}h - {}", t.hours, t.title),
  }
}

pub fn render_text(ts: &Timesheet) -> String {
  let mut out = String::new();
  let label = ts.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default();
  let _ = writeln!(out, "Timesheet {} .. {}{}", ts.start, ts.end, label);

  for day in &ts.days {
    let _ = writeln!(out);
    let _ = writeln!(out, "{} {}  {:.1}h", day.date, day.date.format("%a"), day.total_hours());
    if day.is_empty() {
      let _ = writeln!(out, "  (no activity)");
      continue;
    }
    for t in day.tracked.iter().chain(day.untracked.iter()) {
      let _ = writeln!(out, "  {}", task_line(t));
    }
  }

  let s = &ts.summary;
  let _ = writeln!(out);
  let _ = writeln!(
    out,
    "Summary: {} commits ({} tracked across {} tasks); {:.1}h tracked, {:.1}h untracked",
    s.total_commits, s.tracked_commits, s.tracked_tasks, s.tracked_hours, s.untracked_hours
  );
  out
}

pub fn render_text_all(sheets: &[Timesheet]) -> String {
  sheets.iter().map(render_text).collect::<Vec<_>>().join("\n")
}

pub fn render_json(sheets: &[Timesheet]) -> Result<String> {
  let text = match sheets {
    [single] => serde_json::to_string_pretty(single)?,
    many => serde_json::to_string_pretty(many)?,
  };
  Ok(text)
}
