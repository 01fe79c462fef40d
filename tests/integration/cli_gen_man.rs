use test_support::cmd_bin;

#[test]
fn cli_generates_man_page() {
  let out = cmd_bin("git-timesheet").args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  // clap_mangen emits a roff manpage starting with .TH and mentions the binary name
  assert!(s.contains(".TH") || s.contains(".Nm"));
  assert!(s.contains("git-timesheet"));
  assert!(s.contains("weekly"));
}
