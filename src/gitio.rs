use anyhow::Result;
use crate::util::run_git;

/// Commits reachable from HEAD whose commit date falls inside `since..until`, oldest first.
pub fn rev_list(repo: &str, since: &str, until: &str, author: Option<&str>, include_merges: bool) -> Result<Vec<String>> {
    let mut args: Vec<String> = vec![
        "-c".into(), "log.showSignature=false".into(),
        "rev-list".into(),
        format!("--since={}", since),
        format!("--until={}", until),
        "--date-order".into(),
        "--reverse".into(),
    ];
    if let Some(a) = author { args.push(format!("--author={}", a)); }
    if !include_merges { args.push("--no-merges".into()); }
    args.push("HEAD".into());
    let out = run_git(repo, &args)?;
    Ok(out.lines().filter_map(|l| { let s = l.trim(); if s.is_empty() {None} else {Some(s.to_string())} }).collect())
}

pub struct Meta { pub sha: String, pub parents: Vec<String>, pub author_name: String, pub author_email: String, pub author_date: String, pub subject: String, pub body: String }

impl Meta {
    pub fn is_merge(&self) -> bool { self.parents.len() > 1 }

    /// Subject and body joined the way `git log --format=%B` prints them.
    pub fn message(&self) -> String {
        let body = self.body.trim_end();
        if body.is_empty() { self.subject.clone() } else { format!("{}\n\n{}", self.subject, body) }
    }
}

pub fn commit_meta(repo: &str, sha: &str) -> Result<Meta> {
    let fmt = "%H%x00%P%x00%an%x00%ae%x00%ad%x00%s%x00%b";
    let args: Vec<String> = vec![
        "show".into(), "--no-patch".into(), "--date=iso-strict".into(), format!("--pretty=format:{}", fmt), sha.into()
    ];
    let out = run_git(repo, &args)?;
    Ok(parse_meta(&out))
}

pub fn parse_meta(out: &str) -> Meta {
    let parts: Vec<&str> = out.split('\u{0}').collect();
    let get = |i: usize| -> String { parts.get(i).unwrap_or(&"").to_string() };
    Meta{ sha: get(0), parents: if get(1).is_empty(){vec![]} else {get(1).split_whitespace().map(|s| s.to_string()).collect()}, author_name: get(2), author_email: get(3), author_date: get(4), subject: get(5), body: get(6) }
}

/// Line counts per file. Binary files report no counts. Merges are diffed against their first parent.
pub fn commit_numstat(repo: &str, sha: &str, is_merge: bool) -> Result<Vec<(String, Option<i64>, Option<i64>)>> {
    let mut args: Vec<String> = vec!["show".into(), "--numstat".into(), "--format=".into(), "--no-color".into()];
    if is_merge { args.push("--diff-merges=first-parent".into()); }
    args.push(sha.into());
    let out = run_git(repo, &args)?;
    Ok(parse_numstat(&out))
}

pub fn parse_numstat(out: &str) -> Vec<(String, Option<i64>, Option<i64>)> {
    let mut files = Vec::new();
    for line in out.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 3 { continue; }
        let to_int = |s: &str| -> Option<i64> { s.parse::<i64>().ok() };
        files.push((parts[2].to_string(), to_int(parts[0]), to_int(parts[1])));
    }
    files
}

pub fn user_email(repo: &str) -> Result<Option<String>> {
    let out = run_git(repo, &vec!["config".into(), "user.email".into()]).unwrap_or_default();
    let email = out.trim();
    if email.is_empty() { Ok(None) } else { Ok(Some(email.to_string())) }
}
