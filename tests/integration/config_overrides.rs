use git_timesheet::EstimatorConfig;
use test_support::{cmd_bin, fixture_repo, fixtures_dir, read_fixture_json};

#[test]
fn fixture_overrides_keep_other_defaults() {
  let cfg: EstimatorConfig = read_fixture_json("estimator_override.json");
  let defaults = EstimatorConfig::default();
  assert_eq!(cfg.weekly_target_hours, 6.0);
  assert!(!cfg.backfill.enabled);
  assert_eq!(cfg.backfill.light_day_hours, defaults.backfill.light_day_hours);
  assert_eq!(cfg.tracked_tiers, defaults.tracked_tiers);
  assert!(cfg.validate().is_ok());
}

#[test]
fn config_file_changes_the_weekly_nudge() {
  let repo = fixture_repo();
  let config = fixtures_dir().join("estimator_override.json");
  let out = cmd_bin("git-timesheet")
    .args([
      "--repo",
      repo.path().to_str().unwrap(),
      "--since",
      "2025-08-11",
      "--until",
      "2025-08-13",
      "--format",
      "json",
      "--config",
      config.to_str().unwrap(),
    ])
    .output()
    .unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  // a 3.6h prorated target against 4.5h tracked scales the week by 0.8
  assert_eq!(v["summary"]["tracked_hours"], 3.5);
  assert_eq!(v["summary"]["untracked_hours"], 0.5);
}

#[test]
fn weekly_target_flag_beats_config_file() {
  let repo = fixture_repo();
  let config = fixtures_dir().join("estimator_override.json");
  let out = cmd_bin("git-timesheet")
    .args([
      "--repo",
      repo.path().to_str().unwrap(),
      "--since",
      "2025-08-11",
      "--until",
      "2025-08-13",
      "--format",
      "json",
      "--config",
      config.to_str().unwrap(),
      "--weekly-target",
      "7.5",
    ])
    .output()
    .unwrap();
  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  // target equals the raw tracked total, so nothing is scaled
  assert_eq!(v["summary"]["tracked_hours"], 4.5);
}

#[test]
fn broken_config_file_is_reported() {
  let td = tempfile::TempDir::new().unwrap();
  let path = td.path().join("bad.json");
  std::fs::write(&path, r#"{ "min_task_hours": 9.0 }"#).unwrap();
  cmd_bin("git-timesheet")
    .args(["--month", "2025-08", "--all-authors", "--config", path.to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicates::str::contains("invalid estimator configuration"));
}

#[test]
fn oversized_lookback_flag_is_rejected() {
  cmd_bin("git-timesheet")
    .args(["--month", "2025-08", "--all-authors", "--lookback-days", "1000000000"])
    .assert()
    .failure()
    .stderr(predicates::str::contains("lookback_days"));
}
