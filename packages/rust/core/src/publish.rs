//! Commit-and-push of the updated profile.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use readmepulse_shared::{PublishConfig, ReadmeError, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "publish", rename_all = "snake_case")]
pub enum PublishOutcome {
    NothingToCommit,
    Committed { pushed: bool },
}

/// Records the working tree state in version control.
pub trait Publisher: Send + Sync {
    fn publish(&self, message: &str) -> Result<PublishOutcome>;
}

/// Shells out to `git` in `workdir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    push: bool,
    author_name: Option<String>,
    author_email: Option<String>,
    scope: Vec<PathBuf>,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            push: true,
            author_name: None,
            author_email: None,
            scope: Vec::new(),
        }
    }

    pub fn from_config(workdir: impl Into<PathBuf>, config: &PublishConfig) -> Self {
        Self::new(workdir)
            .push(config.push)
            .identity(config.author_name.clone(), config.author_email.clone())
    }

    pub fn push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    pub fn identity(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.author_name = name;
        self.author_email = email;
        self
    }

    /// Restrict status, staging and the commit to these paths, relative to
    /// the working tree. Empty means the whole tree.
    pub fn scope(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.scope = paths.into_iter().collect();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.workdir);
        if let Some(name) = &self.author_name {
            cmd.arg("-c").arg(format!("user.name={name}"));
        }
        if let Some(email) = &self.author_email {
            cmd.arg("-c").arg(format!("user.email={email}"));
        }
        cmd.args(args);

        debug!(?args, workdir = %self.workdir.display(), "running git");
        cmd.output().map_err(|e| {
            ReadmeError::Publish(format!("failed to run git: {e}. Is `git` installed?"))
        })
    }

    /// `args` followed by `-- <paths>`.
    fn git_paths(&self, args: &[&str], paths: &[String]) -> Result<Output> {
        let mut full: Vec<&str> = args.to_vec();
        if !paths.is_empty() {
            full.push("--");
            full.extend(paths.iter().map(String::as_str));
        }
        self.git_checked(&full)
    }

    fn git_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(ReadmeError::Publish(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

impl Publisher for GitCli {
    #[instrument(skip_all, fields(workdir = %self.workdir.display(), push = self.push))]
    fn publish(&self, message: &str) -> Result<PublishOutcome> {
        let scope: Vec<String> = self
            .scope
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let status = self.git_paths(&["status", "--porcelain"], &scope)?;
        let changed = changed_paths(&String::from_utf8_lossy(&status.stdout));
        if changed.is_empty() {
            info!("nothing to commit");
            return Ok(PublishOutcome::NothingToCommit);
        }
        debug!(?changed, "paths to commit");

        // Stage what status reported; a scoped path may not exist yet.
        let staged = if scope.is_empty() { &scope } else { &changed };
        self.git_paths(&["add", "-A"], staged)?;
        self.git_checked(&["commit", "-m", message])?;
        info!("changes committed");

        if !self.push {
            return Ok(PublishOutcome::Committed { pushed: false });
        }

        let pushed = match self.git(&["push"]) {
            Ok(out) if out.status.success() => {
                info!("changes pushed");
                true
            }
            Ok(out) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "push failed, commit kept locally"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "push failed, commit kept locally");
                false
            }
        };
        Ok(PublishOutcome::Committed { pushed })
    }
}

/// Paths named by `git status --porcelain`; the new side of a rename.
fn changed_paths(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            path.trim_matches('"').to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn temp_repo() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "readmepulse-publish-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let run = |args: &[&str]| {
            let ok = Command::new("git")
                .args(args)
                .current_dir(&dir)
                .output()
                .unwrap()
                .status
                .success();
            assert!(ok, "git {args:?} failed");
        };
        run(&["init", "-q"]);
        run(&["config", "commit.gpgsign", "false"]);
        dir
    }

    fn publisher(dir: &Path) -> GitCli {
        GitCli::new(dir).push(false).identity(
            Some("readmepulse".into()),
            Some("readmepulse@example.com".into()),
        )
    }

    #[test]
    fn clean_tree_is_nothing_to_commit() {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
        let dir = temp_repo();
        let outcome = publisher(&dir).publish("msg").unwrap();
        assert_eq!(outcome, PublishOutcome::NothingToCommit);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn commits_changes_with_message() {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
        let dir = temp_repo();
        std::fs::write(dir.join("README.md"), "# hi\n").unwrap();

        let git = publisher(&dir);
        let outcome = git.publish("🤖 Daily Update - 2025-11-12\n\n• Updated quote card").unwrap();
        assert_eq!(outcome, PublishOutcome::Committed { pushed: false });

        let log = git.git_checked(&["log", "-1", "--format=%B"]).unwrap();
        let body = String::from_utf8_lossy(&log.stdout);
        assert!(body.starts_with("🤖 Daily Update - 2025-11-12"));
        assert!(body.contains("• Updated quote card"));

        // Second publish over the same tree has nothing left to do.
        assert_eq!(git.publish("again").unwrap(), PublishOutcome::NothingToCommit);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn push_without_remote_is_not_fatal() {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
        let dir = temp_repo();
        std::fs::write(dir.join("README.md"), "# hi\n").unwrap();

        let outcome = publisher(&dir).push(true).publish("update").unwrap();
        assert_eq!(outcome, PublishOutcome::Committed { pushed: false });
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn outside_a_repository_is_an_error() {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
        let dir = std::env::temp_dir().join(format!(
            "readmepulse-publish-norepo-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        // A temp dir nested in some other checkout would still be a repo.
        let inside = Command::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(&dir)
            .output()
            .unwrap()
            .status
            .success();
        if !inside {
            assert!(matches!(
                publisher(&dir).publish("x"),
                Err(ReadmeError::Publish(_))
            ));
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn files_outside_scope_do_not_trigger_commits() {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
        let dir = temp_repo();
        std::fs::write(dir.join("README.md"), "# hi\n").unwrap();
        let git = publisher(&dir).scope([PathBuf::from("README.md"), PathBuf::from("assets")]);
        assert_eq!(git.publish("first").unwrap(), PublishOutcome::Committed { pushed: false });

        // A run log next to the README grows on every run.
        std::fs::write(dir.join("readmepulse.log"), "run 1\n").unwrap();
        assert_eq!(git.publish("second").unwrap(), PublishOutcome::NothingToCommit);
        std::fs::write(dir.join("readmepulse.log"), "run 1\nrun 2\n").unwrap();
        assert_eq!(git.publish("third").unwrap(), PublishOutcome::NothingToCommit);

        std::fs::write(dir.join("README.md"), "# hello\n").unwrap();
        std::fs::create_dir_all(dir.join("assets")).unwrap();
        std::fs::write(dir.join("assets/snake.svg"), "<svg/>").unwrap();
        assert_eq!(git.publish("fourth").unwrap(), PublishOutcome::Committed { pushed: false });

        let status = git.git_checked(&["status", "--porcelain"]).unwrap();
        assert_eq!(String::from_utf8_lossy(&status.stdout).trim(), "?? readmepulse.log");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn porcelain_paths_follow_renames() {
        let out = " M README.md\n?? assets/\nR  old.md -> new.md\n";
        assert_eq!(changed_paths(out), vec!["README.md", "assets/", "new.md"]);
    }
}
