use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{
    Cred, CredentialType, Delta, DiffDelta, Oid, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, Signature, Sort, Status, StatusOptions,
};
use tracing::debug;

use super::{commit_touches, Repository};
use crate::domain::tag::matches_any_prefix;
use crate::domain::{ChangeAction, Commit, CommitParser, FileChange};
use crate::error::{GotaggerError, Result};

/// How many times libgit2 may ask for credentials before a push gives up
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    parser: CommitParser,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Self::from_git2(repo)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        Ok(Git2Repository {
            repo,
            parser: CommitParser::new()?,
        })
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GotaggerError::repository("bare repositories have no working tree"))
    }

    fn resolve(&self, rev: &str) -> Result<Oid> {
        let commit = self
            .repo
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                GotaggerError::repository(format!("cannot resolve revision '{}': {}", rev, e.message()))
            })?;
        Ok(commit.id())
    }

    fn commit_record(&self, commit: &git2::Commit<'_>) -> Result<Commit> {
        let message = String::from_utf8_lossy(commit.message_bytes());
        let changes = self.changes(commit)?;

        Ok(self
            .parser
            .parse(&message)
            .with_hash(commit.id().to_string())
            .with_changes(changes))
    }

    /// Files changed by a commit relative to its first parent
    fn changes(&self, commit: &git2::Commit<'_>) -> Result<Vec<FileChange>> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        diff.find_similar(None)?;

        Ok(diff.deltas().filter_map(|delta| file_change(&delta)).collect())
    }

    fn create_signed_tag(&self, hash: &str, name: &str, message: &str) -> Result<()> {
        let workdir = self.workdir()?;
        let output = Command::new("git")
            .arg("-C")
            .arg(&workdir)
            .args(["tag", "-s", "-m", message, name, hash])
            .output()?;

        if !output.status.success() {
            return Err(GotaggerError::tag(format!(
                "could not create signed tag {}: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

fn path_string(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn file_change(delta: &DiffDelta<'_>) -> Option<FileChange> {
    let old = path_string(delta.old_file().path());
    let new = path_string(delta.new_file().path());

    let change = match delta.status() {
        Delta::Added | Delta::Untracked => FileChange::new(String::new(), new, ChangeAction::Added),
        Delta::Deleted => FileChange::new(old, String::new(), ChangeAction::Deleted),
        Delta::Modified => FileChange::new(old, new, ChangeAction::Modified),
        Delta::Renamed => FileChange::new(old, new, ChangeAction::Renamed),
        Delta::Copied => FileChange::new(old, new, ChangeAction::Copied),
        Delta::Typechange => FileChange::new(old, new, ChangeAction::TypeChanged),
        Delta::Unmodified | Delta::Ignored | Delta::Unreadable | Delta::Conflicted => return None,
    };
    Some(change)
}

impl Repository for Git2Repository {
    fn head(&self) -> Result<Commit> {
        let head = self
            .repo
            .head()
            .and_then(|reference| reference.peel_to_commit())
            .map_err(|e| {
                GotaggerError::repository(format!("cannot read HEAD commit: {}", e.message()))
            })?;
        self.commit_record(&head)
    }

    fn rev_list(&self, start: &str, end: &str, paths: &[&str]) -> Result<Vec<Commit>> {
        if start.is_empty() {
            return Err(GotaggerError::repository("must specify a start revision"));
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(self.resolve(start)?)?;
        if !end.is_empty() {
            revwalk.hide(self.resolve(end)?)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let record = self.commit_record(&commit)?;
            if commit_touches(&record, paths) {
                commits.push(record);
            }
        }

        debug!(start, end, ?paths, count = commits.len(), "listed commits");
        Ok(commits)
    }

    fn tags(&self, rev: &str, prefixes: &[&str]) -> Result<Vec<String>> {
        let target = self.resolve(rev)?;
        let names = self.repo.tag_names(None)?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            if !matches_any_prefix(name, prefixes) {
                continue;
            }

            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            let tagged = match reference.peel_to_commit() {
                Ok(commit) => commit.id(),
                Err(e) => {
                    debug!(tag = name, error = %e, "skipping tag that does not point to a commit");
                    continue;
                }
            };

            if tagged == target || self.repo.graph_descendant_of(target, tagged)? {
                tags.push(name.to_string());
            }
        }

        Ok(tags)
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.resolve(rev).map(|oid| oid.to_string())
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != Status::CURRENT && !entry.status().is_ignored()))
    }

    fn create_tag(&self, hash: &str, name: &str, message: &str, signed: bool) -> Result<()> {
        let message = if message.is_empty() {
            format!("Release {}", name)
        } else {
            message.to_string()
        };

        if signed {
            return self.create_signed_tag(hash, name, &message);
        }

        let oid = Oid::from_str(hash)
            .map_err(|e| GotaggerError::tag(format!("invalid commit hash '{}': {}", hash, e.message())))?;
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| GotaggerError::tag(format!("cannot find object {}: {}", hash, e.message())))?;
        let tagger = self
            .repo
            .signature()
            .or_else(|_| Signature::now("gotagger", "gotagger@localhost"))?;

        self.repo
            .tag(name, &object, &tagger, &message, false)
            .map_err(|e| GotaggerError::tag(format!("could not create tag {}: {}", name, e.message())))?;

        debug!(tag = name, hash, "created tag");
        Ok(())
    }

    fn delete_tags(&self, names: &[String]) -> Result<()> {
        let failures: Vec<String> = names
            .iter()
            .filter_map(|name| {
                self.repo
                    .tag_delete(name)
                    .err()
                    .map(|e| format!("{}: {}", name, e.message()))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GotaggerError::TagCleanup(failures))
        }
    }

    fn push_tags(&self, names: &[String], remote_name: &str) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let mut remote = self.repo.find_remote(remote_name).map_err(|e| {
            GotaggerError::remote(format!("remote '{}' not found: {}", remote_name, e.message()))
        })?;

        let attempts = Cell::new(0usize);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|url, username_from_url, allowed_types| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }

            let username = username_from_url.unwrap_or("git");
            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = Path::new(&home).join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Ok(config) = self.repo.config() {
                    if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }

            Cred::default()
        });

        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "{} rejected: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspecs: Vec<String> = names
            .iter()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();

        remote
            .push(&refspecs, Some(&mut push_options))
            .map_err(|e| GotaggerError::remote(format!("push to '{}' failed: {}", remote_name, e.message())))?;

        debug!(remote = remote_name, ?names, "pushed tags");
        Ok(())
    }
}
