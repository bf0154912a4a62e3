//! Version resolution
//!
//! Every repository is resolved as a set of units. A repository with Go
//! modules has one unit per module; otherwise each configured path is a unit,
//! and with no paths the whole repository is a single root unit.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::analyzer::VersionAnalyzer;
use crate::attribution::filter_commits_for_unit;
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::discovery::{ModuleFilter, ModuleFinder};
use crate::domain::module::clean_path;
use crate::domain::version::bump;
use crate::domain::{Increment, Module, TagPrefix, Version};
use crate::error::{GotaggerError, Result};
use crate::git::{Git2Repository, Repository, HEAD};
use crate::orchestration::TagOrchestrator;
use crate::validation::{declared_modules, validate_release};

/// How the units of a repository were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One unit per discovered Go module
    Modules,
    /// One unit per configured path
    Paths,
    /// The whole repository as one unit
    Simple,
}

/// Units to resolve, in resolution order
#[derive(Debug, Clone)]
pub struct Units {
    pub strategy: Strategy,
    pub units: Vec<Module>,
}

/// Computes, and optionally tags, the next version of a repository
pub struct Gotagger<R: Repository> {
    pub config: Config,
    repo: R,
    root: PathBuf,
    finder: ModuleFinder,
}

impl Gotagger<Git2Repository> {
    /// Open the repository containing `path` with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repository::open(path)?;
        let root = repo.workdir()?;
        Self::with_repository(repo, root, Config::default())
    }
}

impl<R: Repository> Gotagger<R> {
    /// Wrap any repository whose working tree is at `root`
    pub fn with_repository(repo: R, root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        Ok(Gotagger {
            config,
            repo,
            root: root.into(),
            finder: ModuleFinder::new()?,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Root of the working tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current version of the repository.
    ///
    /// With several units this is the version of the first one: the root
    /// module if there is one, else the shallowest module or the first path.
    pub fn version(&self) -> Result<String> {
        let units = self.units()?;
        let first = units
            .units
            .first()
            .ok_or_else(|| GotaggerError::module("no versionable unit found"))?;

        let versions = self.versions(&units.units, std::slice::from_ref(first))?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| GotaggerError::version("no version resolved"))
    }

    /// Versions of every unit in resolution order, or only of the named modules
    pub fn module_versions(&self, names: &[&str]) -> Result<Vec<String>> {
        let units = self.units()?;
        if names.is_empty() {
            return self.versions(&units.units, &units.units);
        }

        let modules: &[Module] = match units.strategy {
            Strategy::Modules => &units.units,
            Strategy::Paths | Strategy::Simple => &[],
        };
        if let Some(missing) = names
            .iter()
            .find(|name| !modules.iter().any(|m| m.name == **name))
        {
            return Err(GotaggerError::module(format!("no module {} found", missing)));
        }

        let targets: Vec<Module> = modules
            .iter()
            .filter(|m| names.contains(&m.name.as_str()))
            .cloned()
            .collect();
        self.versions(&units.units, &targets)
    }

    /// Resolve the versions released by HEAD and tag them when configured.
    ///
    /// In a repository with modules the released modules are those named in
    /// HEAD's `Modules` footers, defaulting to the root or first module. A
    /// release commit must change exactly the modules it names.
    pub fn tag_repo(&self) -> Result<Vec<String>> {
        let units = self.units()?;
        let head = self.repo.head()?;

        let targets = match units.strategy {
            Strategy::Modules => {
                let declared = declared_modules(&head, &units.units)?;
                if head.is_release() {
                    validate_release(&head, &declared, &units.units)?;
                }
                units
                    .units
                    .iter()
                    .filter(|m| declared.contains(m))
                    .cloned()
                    .collect()
            }
            Strategy::Paths | Strategy::Simple => units.units.clone(),
        };

        let versions = self.versions(&units.units, &targets)?;

        if (head.is_release() || self.config.force) && self.config.create_tag {
            let mut orchestrator = TagOrchestrator::new(&self.repo).signed(self.config.sign_tags);
            if self.config.push_tag {
                orchestrator = orchestrator.push_to(self.config.remote_name.as_str());
            }
            orchestrator.publish(&head.hash, &versions)?;
        } else {
            debug!(
                release = head.is_release(),
                create = self.config.create_tag,
                "not tagging"
            );
        }

        Ok(versions)
    }

    /// Versionable units of the repository.
    ///
    /// Recomputed on every call so that changes to the working tree or the
    /// configuration are always picked up.
    pub fn units(&self) -> Result<Units> {
        let modules = if self.config.ignore_modules {
            Vec::new()
        } else {
            let filter = ModuleFilter::default().exclude(&self.config.exclude_modules);
            self.finder.find_all_modules(&self.root, &filter)?
        };

        if !modules.is_empty() {
            if !self.config.paths.is_empty() {
                BoundaryWarning::PathsIgnored {
                    paths: self.config.paths.clone(),
                }
                .emit();
            }
            return Ok(Units {
                strategy: Strategy::Modules,
                units: modules,
            });
        }

        if self.config.paths.is_empty() {
            return Ok(Units {
                strategy: Strategy::Simple,
                units: vec![Module::repository_root()],
            });
        }

        let units = self
            .config
            .paths
            .iter()
            .map(|path| {
                if !self.root.join(clean_path(path)).is_dir() {
                    return Err(GotaggerError::module(format!(
                        "path {} is not a directory in the repository",
                        path
                    )));
                }
                Ok(Module::directory(path))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Units {
            strategy: Strategy::Paths,
            units,
        })
    }

    fn versions(&self, universe: &[Module], targets: &[Module]) -> Result<Vec<String>> {
        let analyzer = VersionAnalyzer::from_config(&self.config);
        targets
            .iter()
            .map(|unit| self.resolve_unit(unit, universe, &analyzer))
            .collect()
    }

    fn resolve_unit(
        &self,
        unit: &Module,
        universe: &[Module],
        analyzer: &VersionAnalyzer,
    ) -> Result<String> {
        let prefix = TagPrefix::new(unit.prefix.as_str(), self.config.version_prefix.as_str());
        let filter = prefix.as_string();
        let tags = self.repo.tags(HEAD, &[filter.as_str()])?;

        let (base, hash) = match latest(unit, &prefix, &tags) {
            Some((version, tag)) => {
                let hash = self.repo.rev_parse(&format!("{}^{{commit}}", tag))?;
                debug!(unit = %unit.path, tag = %tag, hash = %hash, "latest tag");
                (version, hash)
            }
            None => match unit.window.epoch() {
                Some(epoch) => {
                    debug!(unit = %unit.path, "no tag for this major version yet");
                    return Ok(prefix.format(&epoch));
                }
                None => (Version::new(0, 0, 0), String::new()),
            },
        };

        let paths: Vec<&str> = if unit.is_root() {
            Vec::new()
        } else {
            vec![unit.path.as_str()]
        };
        let commits = self
            .repo
            .rev_list(HEAD, &hash, &paths)
            .map_err(|e| GotaggerError::rev_list(hash.as_str(), e))?;
        let commits = filter_commits_for_unit(unit, commits, universe);

        let dirty = commits.is_empty() && self.repo.is_dirty()?;
        let increment = analyzer.increment(&base, &commits, dirty);

        if commits.is_empty() && !hash.is_empty() {
            debug!(
                "{}",
                BoundaryWarning::NoNewCommits {
                    latest_tag: prefix.format(&base),
                    current_commit_hash: hash.clone(),
                }
            );
        }
        if dirty && increment != Increment::None {
            BoundaryWarning::DirtyWorktree {
                increment: increment.to_string(),
            }
            .emit();
        }

        let next = bump(&base, increment);
        info!(
            unit = %unit.path,
            from = %base,
            to = %next,
            commits = commits.len(),
            "resolved version"
        );
        Ok(prefix.format(&next))
    }
}

/// Highest tag of `unit` inside its major window
fn latest(unit: &Module, prefix: &TagPrefix, tags: &[String]) -> Option<(Version, String)> {
    let mut latest: Option<(Version, String)> = None;
    for tag in tags.iter().filter(|tag| prefix.matches(tag)) {
        let Some(version) = prefix.parse_version(tag) else {
            BoundaryWarning::UnparsableTag {
                tag: tag.clone(),
                reason: "not a semantic version".to_string(),
            }
            .emit();
            continue;
        };

        if !unit.window.admits(version.major) {
            debug!(
                "{}",
                BoundaryWarning::IncompatibleTag {
                    tag: tag.clone(),
                    module: unit.name.clone(),
                }
            );
            continue;
        }

        if latest.as_ref().map_or(true, |(current, _)| version > *current) {
            latest = Some((version, tag.clone()));
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::git::MockRepository;

    fn gotagger(repo: MockRepository, root: &Path) -> Gotagger<MockRepository> {
        Gotagger::with_repository(repo, root, Config::default()).unwrap()
    }

    fn go_mod(root: &Path, dir: &str, name: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("go.mod"), format!("module {}\n", name)).unwrap();
    }

    #[test]
    fn test_simple_no_tags() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);

        assert_eq!(gotagger(repo, tmp.path()).version().unwrap(), "v0.1.0");
    }

    #[test]
    fn test_simple_highest_tag_wins() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.2.0");
        repo.tag_head("v1.10.0");
        repo.tag_head("vnext");
        repo.commit("fix: bug", &["main.go"]);

        assert_eq!(gotagger(repo, tmp.path()).version().unwrap(), "v1.10.1");
    }

    #[test]
    fn test_shortened_tags_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.0.0");
        repo.tag_head("v2");
        repo.tag_head("v1.5");
        repo.commit("fix: bug", &["main.go"]);

        assert_eq!(gotagger(repo, tmp.path()).version().unwrap(), "v1.0.1");
    }

    #[test]
    fn test_idempotent_on_tagged_head() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.0.0");

        let tagger = gotagger(repo, tmp.path());
        assert_eq!(tagger.version().unwrap(), "v1.0.0");
        assert_eq!(tagger.version().unwrap(), "v1.0.0");
    }

    #[test]
    fn test_dirty_worktree_increment() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.0.0");
        repo.set_dirty(true);

        let mut tagger = gotagger(repo, tmp.path());
        assert_eq!(tagger.version().unwrap(), "v1.0.0");

        tagger.config.dirty_worktree_increment = Increment::Patch;
        assert_eq!(tagger.version().unwrap(), "v1.0.1");
    }

    #[test]
    fn test_empty_prefix_ignores_prefixed_tags() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v3.0.0");
        repo.tag_head("0.2.0");
        repo.commit("fix: bug", &["main.go"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.version_prefix = String::new();
        assert_eq!(tagger.version().unwrap(), "0.2.1");
    }

    #[test]
    fn test_modules_with_encoded_major() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");
        go_mod(tmp.path(), "bar/v2", "foo/bar/v2");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod", "bar/go.mod"]);
        repo.tag_head("v1.0.0");
        repo.tag_head("bar/v1.0.0");
        repo.commit("feat: v2 of bar", &["bar/v2/go.mod"]);
        repo.commit("fix: root only", &["main.go"]);

        let versions = gotagger(repo, tmp.path()).module_versions(&[]).unwrap();
        assert_eq!(versions, vec!["v1.0.1", "bar/v1.0.0", "bar/v2.0.0"]);
    }

    #[test]
    fn test_major_window_skips_other_majors() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "v2", "foo/v2");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod"]);
        repo.tag_head("v1.4.0");
        repo.commit("feat!: v2", &["v2/go.mod"]);
        repo.tag_head("v2.0.0");
        repo.commit("fix: v1 bug", &["main.go"]);
        repo.commit("feat: v2 feature", &["v2/x.go"]);

        let versions = gotagger(repo, tmp.path()).module_versions(&[]).unwrap();
        assert_eq!(versions, vec!["v1.4.1", "v2.1.0"]);
    }

    #[test]
    fn test_module_versions_by_name() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");
        go_mod(tmp.path(), "baz", "foo/baz");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod", "bar/go.mod", "baz/go.mod"]);

        let tagger = gotagger(repo, tmp.path());
        assert_eq!(
            tagger.module_versions(&["foo/baz", "foo"]).unwrap(),
            vec!["v0.1.0", "baz/v0.1.0"]
        );

        let err = tagger.module_versions(&["foo/qux"]).unwrap_err();
        assert_eq!(err.to_string(), "Module error: no module foo/qux found");
    }

    #[test]
    fn test_excluded_module_falls_to_parent() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod"]);
        repo.tag_head("v1.0.0");
        repo.commit("feat: bar change", &["bar/x.go"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.exclude_modules = vec!["foo/bar".to_string()];
        assert_eq!(tagger.module_versions(&[]).unwrap(), vec!["v1.1.0"]);
    }

    #[test]
    fn test_ignore_modules() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod"]);
        repo.tag_head("v1.0.0");
        repo.commit("feat: bar change", &["bar/x.go"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.ignore_modules = true;
        assert_eq!(tagger.module_versions(&[]).unwrap(), vec!["v1.1.0"]);
        assert_eq!(tagger.units().unwrap().strategy, Strategy::Simple);
    }

    #[test]
    fn test_path_units() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("api")).unwrap();
        fs::create_dir_all(tmp.path().join("web")).unwrap();

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["api/main.rs", "web/index.ts"]);
        repo.tag_head("api/v1.0.0");
        repo.tag_head("web/v0.3.0");
        repo.commit("fix: api bug", &["api/main.rs"]);
        repo.commit("feat: web feature", &["web/index.ts"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.paths = vec!["web".to_string(), "./api/".to_string()];
        assert_eq!(
            tagger.module_versions(&[]).unwrap(),
            vec!["web/v0.4.0", "api/v1.0.1"]
        );
    }

    #[test]
    fn test_missing_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.paths = vec!["nope".to_string()];
        assert!(matches!(tagger.version(), Err(GotaggerError::Module(_))));
    }

    #[test]
    fn test_tag_repo_release_creates_and_pushes() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.0.0");
        repo.commit("feat: more", &["main.go"]);
        repo.commit("release: v1.1.0", &["CHANGELOG.md"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.create_tag = true;
        tagger.config.push_tag = true;

        assert_eq!(tagger.tag_repo().unwrap(), vec!["v1.1.0"]);
        assert!(tagger.repository().tag_names().contains(&"v1.1.0".to_string()));
        assert_eq!(
            tagger.repository().pushed(),
            vec![("origin".to_string(), "v1.1.0".to_string())]
        );
    }

    #[test]
    fn test_tag_repo_non_release_does_not_tag() {
        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["main.go"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.create_tag = true;
        assert_eq!(tagger.tag_repo().unwrap(), vec!["v0.1.0"]);
        assert!(tagger.repository().tag_names().is_empty());

        tagger.config.force = true;
        assert_eq!(tagger.tag_repo().unwrap(), vec!["v0.1.0"]);
        assert_eq!(tagger.repository().tag_names(), vec!["v0.1.0"]);
    }

    #[test]
    fn test_tag_repo_follows_discovery_order() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod", "bar/go.mod"]);
        repo.tag_head("v1.0.0");
        repo.tag_head("bar/v1.0.0");
        repo.commit(
            "release: both\n\nModules: foo/bar, foo",
            &["CHANGELOG.md", "bar/CHANGELOG.md"],
        );

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.create_tag = true;
        tagger.config.push_tag = true;

        assert_eq!(tagger.tag_repo().unwrap(), vec!["v1.0.1", "bar/v1.0.1"]);
        assert_eq!(
            tagger.repository().tag_names(),
            vec!["v1.0.0", "bar/v1.0.0", "v1.0.1", "bar/v1.0.1"]
        );
        assert_eq!(
            tagger.repository().pushed(),
            vec![
                ("origin".to_string(), "v1.0.1".to_string()),
                ("origin".to_string(), "bar/v1.0.1".to_string()),
            ]
        );
    }

    #[test]
    fn test_tag_repo_validation_failure() {
        let tmp = TempDir::new().unwrap();
        go_mod(tmp.path(), ".", "foo");
        go_mod(tmp.path(), "bar", "foo/bar");

        let mut repo = MockRepository::new().unwrap();
        repo.commit("feat: initial", &["go.mod", "bar/go.mod"]);
        repo.commit("release: bar\n\nModules: foo, foo/bar", &["bar/CHANGELOG.md"]);

        let mut tagger = gotagger(repo, tmp.path());
        tagger.config.create_tag = true;
        let err = tagger.tag_repo().unwrap_err();

        assert!(matches!(err, GotaggerError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "module validation failed:\nmodules not changed by commit: foo"
        );
        assert!(tagger.repository().tag_names().is_empty());
    }

    #[test]
    fn test_rev_list_failure_has_context() {
        struct Broken(MockRepository);

        impl Repository for Broken {
            fn head(&self) -> Result<crate::domain::Commit> {
                self.0.head()
            }
            fn rev_list(&self, _: &str, _: &str, _: &[&str]) -> Result<Vec<crate::domain::Commit>> {
                Err(GotaggerError::repository("object not found"))
            }
            fn tags(&self, rev: &str, prefixes: &[&str]) -> Result<Vec<String>> {
                self.0.tags(rev, prefixes)
            }
            fn rev_parse(&self, rev: &str) -> Result<String> {
                self.0.rev_parse(rev)
            }
            fn is_dirty(&self) -> Result<bool> {
                self.0.is_dirty()
            }
            fn create_tag(&self, hash: &str, name: &str, message: &str, signed: bool) -> Result<()> {
                self.0.create_tag(hash, name, message, signed)
            }
            fn delete_tags(&self, names: &[String]) -> Result<()> {
                self.0.delete_tags(names)
            }
            fn push_tags(&self, names: &[String], remote: &str) -> Result<()> {
                self.0.push_tags(names, remote)
            }
        }

        let tmp = TempDir::new().unwrap();
        let mut repo = MockRepository::new().unwrap();
        let hash = repo.commit("feat: initial", &["main.go"]);
        repo.tag_head("v1.0.0");

        let tagger = Gotagger::with_repository(Broken(repo), tmp.path(), Config::default()).unwrap();
        let err = tagger.version().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("could not fetch commits HEAD..{}: Repository error: object not found", hash)
        );
    }
}
