use predicates::prelude::*;
use serial_test::serial;
use test_support::{cmd_bin, fixture_repo, with_env};

fn run_json(repo: &std::path::Path, extra: &[&str]) -> serde_json::Value {
  let repo_path = repo.to_str().unwrap();
  let mut args = vec!["--repo", repo_path, "--since", "2025-08-11", "--until", "2025-08-13", "--format", "json"];
  args.extend_from_slice(extra);
  let out = cmd_bin("git-timesheet").args(&args).output().unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn text_report_for_fixture_week() {
  let repo = fixture_repo();
  let out = cmd_bin("git-timesheet")
    .args(["--repo", repo.path().to_str().unwrap(), "--since", "2025-08-11", "--until", "2025-08-13"])
    .env_remove("RUST_LOG")
    .output()
    .unwrap();
  assert!(out.status.success());

  let stdout = String::from_utf8_lossy(&out.stdout).to_string();
  insta::assert_snapshot!(stdout, @r"
  Timesheet 2025-08-11 .. 2025-08-13

  2025-08-11 Mon  3.5h
    2.5h - [ABC-1] add user model
    1.0h - tidy readme

  2025-08-12 Tue  4.0h
    4.0h - [ABC-2] add payment service

  2025-08-13 Wed  1.0h
    1.0h - [ABC-1] fix user validation

  Summary: 4 commits (3 tracked across 2 tasks); 7.5h tracked, 1.0h untracked
  ");
  assert!(out.stderr.is_empty(), "quiet by default: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn json_report_has_days_and_summary() {
  let repo = fixture_repo();
  let v = run_json(repo.path(), &[]);
  assert_eq!(v["start"], "2025-08-11");
  assert_eq!(v["days"].as_array().map(|d| d.len()), Some(3));
  assert_eq!(v["days"][0]["tracked"][0]["issue_id"], "ABC-1");
  assert_eq!(v["days"][0]["tracked"][0]["hours"], 2.5);
  assert_eq!(v["days"][0]["untracked"][0]["title"], "tidy readme");
  assert_eq!(v["summary"]["total_commits"], 4);
  assert_eq!(v["summary"]["tracked_tasks"], 2);
}

#[test]
fn merges_are_reconciled_away() {
  let repo = fixture_repo();
  let without = run_json(repo.path(), &[]);
  let with = run_json(repo.path(), &["--include-merges"]);
  assert_eq!(without, with);
}

#[test]
fn all_authors_counts_other_people() {
  let repo = fixture_repo();
  let v = run_json(repo.path(), &["--all-authors"]);
  assert_eq!(v["summary"]["total_commits"], 5);
  assert_eq!(v["summary"]["tracked_tasks"], 3);
  let tuesday: Vec<&str> = v["days"][1]["tracked"]
    .as_array()
    .unwrap()
    .iter()
    .filter_map(|t| t["task_id"].as_str())
    .collect();
  assert_eq!(tuesday, vec!["ABC-2", "ZZZ-9"]);
}

#[test]
fn explicit_author_filters_commits() {
  let repo = fixture_repo();
  let v = run_json(repo.path(), &["--author", "other@example.com"]);
  assert_eq!(v["summary"]["total_commits"], 1);
  assert_eq!(v["days"][1]["tracked"][0]["task_id"], "ZZZ-9");
}

#[test]
fn issue_prefix_limits_tracked_tasks() {
  let repo = fixture_repo();
  let v = run_json(repo.path(), &["--issue-prefix", "abc"]);
  assert_eq!(v["summary"]["tracked_tasks"], 2);

  let v = run_json(repo.path(), &["--issue-prefix", "OPS"]);
  assert_eq!(v["summary"]["tracked_commits"], 0);
  assert_eq!(v["summary"]["tracked_hours"], 0.0);
}

#[test]
fn out_file_receives_report() {
  let repo = fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let target = td.path().join("reports/week.txt");
  cmd_bin("git-timesheet")
    .args([
      "--repo",
      repo.path().to_str().unwrap(),
      "--since",
      "2025-08-11",
      "--until",
      "2025-08-13",
      "--out",
      target.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::is_empty());
  let text = std::fs::read_to_string(target).unwrap();
  assert!(text.contains("[ABC-2] add payment service"));
}

#[test]
fn verbose_logs_pipeline_decisions_to_stderr() {
  let repo = fixture_repo();
  cmd_bin("git-timesheet")
    .args(["--repo", repo.path().to_str().unwrap(), "--since", "2025-08-11", "--until", "2025-08-13", "--verbose"])
    .env_remove("RUST_LOG")
    .assert()
    .success()
    .stderr(predicate::str::contains("collected commits").and(predicate::str::contains("scaling week")));
}

#[test]
#[serial]
fn rust_log_overrides_default_filter() {
  let repo = fixture_repo();
  let _env = with_env(&[("RUST_LOG", "git_timesheet=info")]);
  cmd_bin("git-timesheet")
    .args(["--repo", repo.path().to_str().unwrap(), "--since", "2025-08-11", "--until", "2025-08-13"])
    .assert()
    .success()
    .stderr(predicate::str::contains("timesheet built").and(predicate::str::contains("scaling week").not()));
}

#[test]
fn not_a_repository_fails_with_git_error() {
  let td = tempfile::TempDir::new().unwrap();
  cmd_bin("git-timesheet")
    .args(["--repo", td.path().to_str().unwrap(), "--since", "2025-08-11", "--until", "2025-08-13", "--all-authors"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("git"));
}
