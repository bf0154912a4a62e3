use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;

use gotagger::config::{load_config, parse_dirty_increment, Config};
use gotagger::git::Git2Repository;
use gotagger::{ui, Gotagger};

#[derive(clap::Parser)]
#[command(
    name = "gotagger",
    version,
    about = "Print the current version of a project based on conventional commits",
    after_help = "The version is determined by finding the commit tagged with the highest \
version on the current branch and the types of the commits made since. Go submodules \
are released by naming them in a Modules footer of the release commit."
)]
struct Args {
    /// Repository to version
    #[arg(default_value = ".")]
    path: PathBuf,

    #[arg(long, env = "GOTAGGER_PREFIX", help = "Prefix placed before versions")]
    prefix: Option<String>,

    #[arg(long, env = "GOTAGGER_REMOTE", help = "Remote to push tags to")]
    remote: Option<String>,

    #[arg(
        long,
        env = "GOTAGGER_RELEASE",
        help = "Tag HEAD with the current version if it is a release commit"
    )]
    release: bool,

    #[arg(long, env = "GOTAGGER_PUSH", help = "Push the created tags, implies --release")]
    push: bool,

    #[arg(
        long,
        env = "GOTAGGER_FORCE",
        help = "Tag HEAD even if it is not a release commit, implies --release"
    )]
    force: bool,

    #[arg(
        long,
        env = "GOTAGGER_IGNORE_MODULES",
        help = "Version the repository as a whole, ignoring go.mod files"
    )]
    ignore_modules: bool,

    #[arg(
        long,
        env = "GOTAGGER_DIRTY",
        value_name = "INCREMENT",
        help = "Increment applied when the worktree is dirty: none, patch or minor"
    )]
    dirty: Option<String>,

    #[arg(long = "path", env = "GOTAGGER_PATH", value_name = "PATH", help = "Only version changes under this path")]
    path_filter: Option<String>,

    #[arg(short, long, env = "GOTAGGER_CONFIG", help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        env = "GOTAGGER_PRE_MAJOR",
        help = "Do not move 0.x versions to 1.0.0 on breaking changes"
    )]
    pre_major: bool,

    #[arg(long, env = "GOTAGGER_SIGN", help = "Create signed tags")]
    sign: bool,
}

impl Args {
    /// Command line flags take precedence over the configuration file
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(dirty) = &self.dirty {
            config.dirty_worktree_increment = parse_dirty_increment(dirty)?;
        }
        if let Some(prefix) = &self.prefix {
            config.version_prefix = prefix.clone();
        }
        if let Some(remote) = &self.remote {
            config.remote_name = remote.clone();
        }
        if let Some(path) = &self.path_filter {
            config.paths = vec![path.clone()];
        }

        config.create_tag |= self.release || self.push || self.force;
        config.push_tag |= self.push;
        config.force |= self.force;
        config.ignore_modules |= self.ignore_modules;
        config.pre_major |= self.pre_major;
        config.sign_tags |= self.sign;
        Ok(())
    }
}

fn main() {
    // Default to "warn"; logs go to stderr so stdout only carries versions
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        ui::display_error(&e.to_string());
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // the config file lives at the work tree root; its errors are reported
    // ahead of any repository error
    let repo = Git2Repository::open(&args.path);
    let config_root = repo
        .as_ref()
        .ok()
        .and_then(|repo| repo.workdir().ok())
        .unwrap_or_else(|| args.path.clone());
    let mut config = load_config(&config_root, args.config.as_deref())?;
    args.apply(&mut config)?;

    let repo = repo?;
    let root = repo.workdir()?;
    let tagger = Gotagger::with_repository(repo, root, config)?;

    let versions = tagger.tag_repo()?;
    ui::display_versions(&mut io::stdout().lock(), &versions)?;
    Ok(())
}
