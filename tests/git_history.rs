use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use texlapse::{GitRepo, HistorySource, TexlapseError, is_tool_on_path};

fn git(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.name=texlapse", "-c", "user.email=texlapse@example.com"])
        .args(args)
        .stdout(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "texlapse_git_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn tools_available() -> bool {
    is_tool_on_path("git", "--version") && is_tool_on_path("tar", "--version")
}

#[test]
fn commits_are_oldest_first_and_snapshots_match() {
    if !tools_available() {
        eprintln!("skipping: git/tar not found on PATH");
        return;
    }

    let repo = temp_dir("history");
    git(&repo, &["init", "-q"]);
    std::fs::write(repo.join("main.tex"), "first").unwrap();
    git(&repo, &["add", "main.tex"]);
    git(&repo, &["commit", "-q", "-m", "first"]);
    std::fs::create_dir_all(repo.join("chapters")).unwrap();
    std::fs::write(repo.join("main.tex"), "second").unwrap();
    std::fs::write(repo.join("chapters").join("intro.tex"), "intro").unwrap();
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-q", "-m", "second"]);

    let history = GitRepo::new(&repo);
    let commits = history.commits().unwrap();
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|c| c.len() == 40));

    let first = temp_dir("snap_first");
    history.materialize(&commits[0], &first).unwrap();
    assert_eq!(std::fs::read_to_string(first.join("main.tex")).unwrap(), "first");
    assert!(!first.join("chapters").exists());

    let second = temp_dir("snap_second");
    history.materialize(&commits[1], &second).unwrap();
    assert_eq!(std::fs::read_to_string(second.join("main.tex")).unwrap(), "second");
    assert_eq!(
        std::fs::read_to_string(second.join("chapters").join("intro.tex")).unwrap(),
        "intro"
    );

    for dir in [repo, first, second] {
        std::fs::remove_dir_all(dir).unwrap();
    }
}

#[test]
fn unknown_commit_fails_materialization() {
    if !tools_available() {
        eprintln!("skipping: git/tar not found on PATH");
        return;
    }

    let repo = temp_dir("unknown");
    git(&repo, &["init", "-q"]);
    std::fs::write(repo.join("main.tex"), "x").unwrap();
    git(&repo, &["add", "main.tex"]);
    git(&repo, &["commit", "-q", "-m", "x"]);

    let dest = temp_dir("unknown_dest");
    let err = GitRepo::new(&repo)
        .materialize("0000000000000000000000000000000000000000", &dest)
        .unwrap_err();
    assert!(matches!(err, TexlapseError::Materialize(_)));

    for dir in [repo, dest] {
        std::fs::remove_dir_all(dir).unwrap();
    }
}

#[test]
fn repository_without_commits_has_empty_history() {
    if !tools_available() {
        eprintln!("skipping: git/tar not found on PATH");
        return;
    }

    let repo = temp_dir("unborn");
    git(&repo, &["init", "-q"]);
    assert!(GitRepo::new(&repo).commits().unwrap().is_empty());
    std::fs::remove_dir_all(repo).unwrap();
}
