//! Integration tests for repository resolution and materialization.
//!
//! These tests use real git repositories created via tempfile to verify
//! token derivation, symlink materialization, and clone deduplication
//! against actual on-disk stores.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use gander::errors::ErrorKind;
use gander::resolver::token;
use gander::{Browser, StoreConfig};

/// Run a git command in `dir`, returning trimmed stdout.
fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test fixture that creates a real git repository with one commit.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn file_url(&self) -> String {
        format!("file://{}", self.path().display())
    }
}

fn browser_in(temp: &TempDir) -> Browser {
    let config = StoreConfig {
        store_dir: temp.path().join("store"),
        ..StoreConfig::default()
    };
    Browser::new(config).expect("create browser")
}

#[test]
fn token_is_deterministic_across_browsers() {
    let repo = TestRepo::new();
    let store_a = TempDir::new().unwrap();
    let store_b = TempDir::new().unwrap();

    let uri = repo.path().to_str().unwrap().to_string();
    let a = browser_in(&store_a).get_token(&uri).unwrap();
    let b = browser_in(&store_b).get_token(&uri).unwrap();
    assert_eq!(a, b);
}

#[test]
fn path_variants_share_a_token() {
    // /repos/demo and /repos/./demo canonicalize identically.
    let repo = TestRepo::new();
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    let plain = repo.path().to_str().unwrap().to_string();
    let dotted = format!(
        "{}/./{}",
        repo.path().parent().unwrap().display(),
        repo.path().file_name().unwrap().to_str().unwrap()
    );

    let a = browser.get_token(&plain).unwrap();
    let b = browser.get_token(&dotted).unwrap();
    assert_eq!(a, b);
}

#[test]
fn local_token_materializes_as_symlink() {
    let repo = TestRepo::new();
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    let token = browser.get_token(repo.path().to_str().unwrap()).unwrap();
    let link = browser.resolver().repo_path(&token);

    let target = fs::read_link(&link).expect("store entry should be a symlink");
    let derived = token::derive(repo.path().to_str().unwrap());
    assert_eq!(target, std::path::PathBuf::from(derived.canonical));
}

#[test]
fn materialization_is_idempotent() {
    let repo = TestRepo::new();
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);
    let uri = repo.path().to_str().unwrap().to_string();

    let first = browser.get_token(&uri).unwrap();
    let second = browser.get_token(&uri).unwrap();
    assert_eq!(first, second);

    let store = temp.path().join("store");
    let entries: Vec<_> = fs::read_dir(&store).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn remote_clone_is_bare_and_published_atomically() {
    let repo = TestRepo::new();
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    let token = browser.get_token(&repo.file_url()).unwrap();
    let clone = browser.resolver().repo_path(&token);

    // Bare clone layout: HEAD at the top, no working tree.
    assert!(clone.join("HEAD").is_file());
    assert!(!clone.join(".git").exists());

    // No staging directory left behind.
    let leftovers: Vec<String> = fs::read_dir(temp.path().join("store"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "stale staging dirs: {:?}", leftovers);
}

#[test]
fn concurrent_clones_of_one_token_produce_one_repository() {
    let repo = TestRepo::new();
    let temp = TempDir::new().unwrap();
    let browser = Arc::new(browser_in(&temp));
    let uri = repo.file_url();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let browser = browser.clone();
            let uri = uri.clone();
            thread::spawn(move || browser.get_token(&uri))
        })
        .collect();

    let tokens: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().expect("get_token should succeed"))
        .collect();

    // All callers observe the same ready token.
    assert!(tokens.windows(2).all(|w| w[0] == w[1]));

    // Exactly one repository directory (plus its lock file) in the store.
    let mut dirs = 0;
    let mut locks = 0;
    for entry in fs::read_dir(temp.path().join("store")).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == format!("{}.lock", tokens[0]) {
            locks += 1;
        } else {
            assert_eq!(name, tokens[0].as_str());
            dirs += 1;
        }
    }
    assert_eq!(dirs, 1);
    assert_eq!(locks, 1);
}

#[test]
fn clone_failure_leaves_no_ready_state() {
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    // file:// URL pointing at nothing: classified remote, clone fails.
    let err = browser
        .get_token("file:///no/such/repository")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolFailure);

    // Nothing but the lock file may remain, and a retry still fails
    // (the failure was not cached as ready).
    let err = browser
        .get_token("file:///no/such/repository")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolFailure);

    for entry in fs::read_dir(temp.path().join("store")).unwrap() {
        let name = entry.unwrap().file_name().to_string_lossy().into_owned();
        assert!(name.ends_with(".lock"), "unexpected store entry: {}", name);
    }
}

#[test]
fn missing_local_path_is_not_found() {
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    let err = browser.get_token("/no/such/local/repo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn scp_style_uri_is_treated_as_local_path() {
    // Preserved classification gap: scp syntax fails URL parsing and is
    // handled as a (nonexistent) local path.
    let temp = TempDir::new().unwrap();
    let browser = browser_in(&temp);

    let err = browser
        .get_token("git@github.com:kaitoy/pcap4j.git")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
