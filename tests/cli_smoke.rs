use std::path::PathBuf;
use std::process::{Command, Stdio};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_texlapse")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "texlapse.exe"
            } else {
                "texlapse"
            });
            p
        })
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn cli_reports_missing_path_without_panicking() {
    let out = Command::new(exe())
        .arg("/definitely/not/a/texlapse/repo")
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid path"), "stderr: {stderr}");
    assert!(!stderr.contains("panicked"));
}

#[test]
fn cli_rejects_bad_aspect_ratio() {
    let out = Command::new(exe())
        .args([".", "--aspect-ratio", "wide"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("aspect ratio"));
}

#[test]
fn cli_on_repository_without_commits_reports_empty_corpus() {
    if !git_available() {
        eprintln!("skipping: git not found on PATH");
        return;
    }

    let dir = PathBuf::from("target").join("cli_smoke").join("empty_repo");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let status = Command::new("git")
        .arg("init")
        .arg("-q")
        .arg(&dir)
        .status()
        .unwrap();
    assert!(status.success());

    let out = Command::new(exe())
        .arg(&dir)
        .env("RUST_LOG", "texlapse=info")
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("found 0 commits"), "stderr: {stderr}");
    assert!(stderr.contains("empty corpus"), "stderr: {stderr}");
    assert!(dir.join("latex-viz-pdfs").is_dir());
    assert_eq!(
        std::fs::read_dir(dir.join("latex-viz-pdfs")).unwrap().count(),
        0
    );
}
