//! test-support: helpers for robust, nextest-friendly tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support", features = ["serde"] }
//! ```
//!
//! Then in tests:
//! ```rust,no_run
//! use test_support::{init_tracing, fixture_repo};
//!
//! init_tracing();
//! let repo = fixture_repo();
//! assert!(repo.path().join(".git").exists());
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::process::Command;
use std::{env, path::{Path, PathBuf}};

/// Author email used for every fixture commit.
pub const FIXTURE_EMAIL: &str = "fixture@example.com";

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,git_timesheet=debug"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Return the path to the repository's `tests/fixtures` directory.
///
/// Uses the top-level package directory, so it's stable regardless of the
/// runner's working directory (cargo vs nextest).
pub fn fixtures_dir() -> PathBuf {
    let support_manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // <repo>/tests/support → <repo>/tests/fixtures
    support_manifest_dir
        .parent()
        .map(|tests| tests.join("fixtures"))
        .unwrap_or_else(|| support_manifest_dir.join("fixtures"))
}

/// Deserialize a JSON fixture into `T` (enable `serde` feature).
#[cfg(feature = "serde")]
pub fn read_fixture_json<T, P>(rel_path: P) -> T
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = fixtures_dir().join(rel_path);
    let file = std::fs::File::open(&path)
        .unwrap_or_else(|e| panic!("failed to open fixture {}: {e}", path.display()));
    serde_json::from_reader::<_, T>(file)
        .unwrap_or_else(|e| panic!("failed to parse JSON fixture {}: {e}", path.display()))
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Set multiple environment variables for the duration of the returned guard.
pub fn with_env(vars: &[(&str, &str)]) -> EnvGuard {
    EnvGuard::set_many(vars)
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
///
/// Example:
/// ```no_run
/// use test_support::cmd_bin;
///
/// let mut cmd = cmd_bin("git-timesheet");
/// cmd.arg("--help").assert().success();
/// ```
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    assert_cmd::Command::cargo_bin(bin).expect("binary target not found")
}

/// Guard for temporarily setting environment variables.
pub struct EnvGuard {
    prev: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn set_many(kv: &[(&str, &str)]) -> Self {
        let mut prev = Vec::with_capacity(kv.len());
        for (k, v) in kv {
            let k_owned = k.to_string();
            prev.push((k_owned.clone(), env::var(k).ok()));
            env::set_var(k, v);
        }
        Self { prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, old) in self.prev.drain(..) {
            match old {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

pub fn run(repo: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(repo).status().unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

/// Run git with author and committer dates pinned to `date` (RFC3339).
pub fn run_at(repo: &Path, date: &str, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} at {} failed", args, date);
}

/// Write `lines` numbered lines to `rel` under the repo.
pub fn write_lines(repo: &Path, rel: &str, prefix: &str, lines: usize) {
    let path = repo.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let body: String = (0..lines).map(|i| format!("{prefix} line {i}\n")).collect();
    std::fs::write(path, body).unwrap();
}

/// Stage everything and commit with the given message at `date`.
pub fn commit_all(repo: &Path, date: &str, message: &str) {
    run(repo, &["add", "-A"]);
    run_at(repo, date, &["commit", "-q", "-m", message]);
}

/// An empty git repository configured for the fixture author.
pub fn empty_repo() -> tempfile::TempDir {
    let dir = tempdir();
    run(dir.path(), &["init", "-q", "-b", "main"]);
    run(dir.path(), &["config", "user.name", "Fixture Bot"]);
    run(dir.path(), &["config", "user.email", FIXTURE_EMAIL]);
    run(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

/// A small repository with one week of activity (Mon 2025-08-11 .. Wed 2025-08-13):
///
/// - Mon 09:00 `ABC-1 add user model` (40 lines)
/// - Mon 15:00 `tidy readme` (untracked, 5 lines)
/// - Tue 10:00 `ABC-2 add payment service` (120 lines, on `feature/ABC-2-payments`)
/// - Tue 16:00 merge of `feature/ABC-2-payments` into main (`--no-ff`)
/// - Wed 11:00 `ABC-1 fix user validation` (6 added lines)
///
/// Also a commit by another author on Tue 12:00 (`ZZZ-9 someone else`).
pub fn fixture_repo() -> tempfile::TempDir {
    let dir = empty_repo();
    let repo = dir.path();

    write_lines(repo, "app/models/user.rb", "user", 40);
    commit_all(repo, "2025-08-11T09:00:00+00:00", "ABC-1 add user model");

    write_lines(repo, "README.md", "readme", 5);
    commit_all(repo, "2025-08-11T15:00:00+00:00", "tidy readme");

    run(repo, &["checkout", "-q", "-b", "feature/ABC-2-payments"]);
    write_lines(repo, "app/services/payment_service.rb", "payment", 100);
    write_lines(repo, "spec/services/payment_service_spec.rb", "spec", 20);
    commit_all(repo, "2025-08-12T10:00:00+00:00", "ABC-2 add payment service");

    run(repo, &["checkout", "-q", "main"]);
    write_lines(repo, "docs/other.md", "other", 3);
    run(repo, &["add", "-A"]);
    let status = Command::new("git")
        .args(["commit", "-q", "-m", "ZZZ-9 someone else", "--author", "Other Dev <other@example.com>"])
        .current_dir(repo)
        .env("GIT_AUTHOR_DATE", "2025-08-12T12:00:00+00:00")
        .env("GIT_COMMITTER_DATE", "2025-08-12T12:00:00+00:00")
        .status()
        .unwrap();
    assert!(status.success());

    run_at(
        repo,
        "2025-08-12T16:00:00+00:00",
        &["merge", "-q", "--no-ff", "-m", "Merge branch 'feature/ABC-2-payments'", "feature/ABC-2-payments"],
    );

    write_lines(repo, "app/models/user.rb", "user", 46);
    commit_all(repo, "2025-08-13T11:00:00+00:00", "ABC-1 fix user validation");

    dir
}
