#![allow(dead_code)]

use std::fs;
use std::path::Path;

use git2::{Repository, Signature};
use tempfile::TempDir;

/// A throwaway git repository on disk
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        TestRepo { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, file: &str, contents: &str) {
        let path = self.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// Write a go.mod declaring `name` in `dir` (not committed)
    pub fn go_mod(&self, dir: &str, name: &str) -> String {
        let file = if dir == "." {
            "go.mod".to_string()
        } else {
            format!("{}/go.mod", dir)
        };
        self.write(&file, &format!("module {}\n\ngo 1.21\n", name));
        file
    }

    /// Touch `files` and commit them; returns the commit hash
    pub fn commit(&self, message: &str, files: &[&str]) -> String {
        for file in files {
            let path = self.path().join(file);
            let mut contents = fs::read_to_string(&path).unwrap_or_default();
            contents.push_str(message);
            contents.push('\n');
            self.write(file, &contents);
        }
        self.commit_staged(message, files)
    }

    /// Commit `files` as they are on disk
    pub fn commit_staged(&self, message: &str, files: &[&str]) -> String {
        let mut index = self.repo.index().unwrap();
        for file in files {
            index.add_path(Path::new(file)).unwrap();
        }
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Test", "test@example.com").unwrap();

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    /// Lightweight tag at HEAD
    pub fn tag(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .unwrap();
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .repo
            .tag_names(None)
            .unwrap()
            .iter()
            .flatten()
            .map(String::from)
            .collect();
        tags.sort();
        tags
    }

    /// Bare repository registered as remote `name`
    pub fn add_bare_remote(&self, name: &str) -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let bare = Repository::init_bare(dir.path()).unwrap();
        let url = dir.path().to_string_lossy().into_owned();
        self.repo.remote(name, &url).unwrap();
        (dir, bare)
    }
}
