use regex::Regex;

use crate::error::Result;

/// Commit type that marks a release
pub const TYPE_RELEASE: &str = "release";

/// Commit type for new features
pub const TYPE_FEATURE: &str = "feat";

/// A `Title: text` block at the end of a commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub title: String,
    pub text: String,
}

impl Footer {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Footer {
            title: title.into(),
            text: text.into(),
        }
    }

    fn is_breaking(&self) -> bool {
        self.title.eq_ignore_ascii_case("BREAKING CHANGE")
            || self.title.eq_ignore_ascii_case("BREAKING-CHANGE")
    }
}

/// What a revert commit reverts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub header: String,
    pub hash: String,
}

/// How a commit touched a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChanged,
}

/// A file-level delta of a commit.
///
/// `source` is empty for added files and `dest` is empty for deleted files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub source: String,
    pub dest: String,
    pub action: ChangeAction,
}

impl FileChange {
    pub fn new(source: impl Into<String>, dest: impl Into<String>, action: ChangeAction) -> Self {
        FileChange {
            source: source.into(),
            dest: dest.into(),
            action,
        }
    }

    /// A modification of a single path
    pub fn modified(path: impl Into<String>) -> Self {
        let path = path.into();
        FileChange::new(path.clone(), path, ChangeAction::Modified)
    }

    /// A newly added path
    pub fn added(path: impl Into<String>) -> Self {
        FileChange::new(String::new(), path, ChangeAction::Added)
    }

    /// The non-empty paths touched by this change, source first
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        [self.source.as_str(), self.dest.as_str()]
            .into_iter()
            .filter(|p| !p.is_empty())
    }
}

/// A repository commit with its conventional commit fields parsed.
///
/// A message that does not follow the conventional commit grammar yields
/// empty fields and an empty `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub r#type: String,
    pub scope: String,
    pub subject: String,
    pub body: String,
    pub header: String,
    pub breaking: bool,
    pub footers: Vec<Footer>,
    pub merge: bool,
    pub revert: Option<Revert>,
    pub changes: Vec<FileChange>,
}

impl Commit {
    /// Whether this commit is a release commit
    pub fn is_release(&self) -> bool {
        self.r#type == TYPE_RELEASE
    }

    /// Texts of all footers with the given title, in message order
    pub fn footer_texts<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.footers
            .iter()
            .filter(move |f| f.title == title)
            .map(|f| f.text.as_str())
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_changes(mut self, changes: Vec<FileChange>) -> Self {
        self.changes = changes;
        self
    }
}

/// Parses raw commit messages into [Commit] records.
///
/// Holds the compiled grammar so it is built once per repository handle.
#[derive(Debug, Clone)]
pub struct CommitParser {
    header: Regex,
    merge: Regex,
    revert: Regex,
    footer: Regex,
}

impl CommitParser {
    pub fn new() -> Result<Self> {
        Ok(CommitParser {
            header: Regex::new(r"^(\w+)(?:\(([^()]*)\))?(!)?: (.+)")?,
            merge: Regex::new(r#"^Merge "(.*)"$"#)?,
            revert: Regex::new(r#"^Revert\s"([\s\S]+)"\s*This reverts commit (\w+)\."#)?,
            footer: Regex::new(r"^([[:alnum:]][[:alnum:]_\- ]*): (.*)$")?,
        })
    }

    /// Parse a commit message.
    ///
    /// Never fails: anything that is not a conventional commit becomes an
    /// unclassified [Commit].
    pub fn parse(&self, message: &str) -> Commit {
        if message.is_empty() {
            return Commit::default();
        }

        let mut lines = message.split('\n');
        let mut header = lines.next().unwrap_or_default().trim_end_matches('\r');

        let mut merge = false;
        if let Some(captures) = self.merge.captures(header) {
            merge = true;
            header = captures.get(1).map_or("", |m| m.as_str());
        }

        let mut revert = None;
        if let Some(captures) = self.revert.captures(message) {
            let inner = captures.get(1).map_or("", |m| m.as_str());
            revert = Some(Revert {
                header: inner.to_string(),
                hash: captures
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            });
            header = inner;
        }

        let Some(captures) = self.header.captures(header) else {
            return Commit::default();
        };

        let r#type = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let scope = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let bang = captures.get(3).is_some();
        let subject = captures
            .get(4)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let (body, footers) = self.parse_body(lines);
        let breaking = bang || footers.iter().any(Footer::is_breaking);

        Commit {
            r#type,
            scope,
            subject,
            body,
            header: header.to_string(),
            breaking,
            footers,
            merge,
            revert,
            ..Commit::default()
        }
    }

    fn parse_body<'a>(&self, lines: impl Iterator<Item = &'a str>) -> (String, Vec<Footer>) {
        let mut body = String::new();
        let mut footers: Vec<Footer> = Vec::new();

        for line in lines {
            let line = line.trim_end_matches('\r');
            if let Some(captures) = self.footer.captures(line) {
                let title = captures.get(1).map_or("", |m| m.as_str());
                let text = captures.get(2).map_or("", |m| m.as_str());
                footers.push(Footer::new(title, text));
                continue;
            }

            match footers.last_mut() {
                Some(footer) => {
                    footer.text.push('\n');
                    footer.text.push_str(line);
                }
                None => {
                    body.push('\n');
                    body.push_str(line);
                }
            }
        }

        for footer in &mut footers {
            let trimmed = footer.text.trim_end().len();
            footer.text.truncate(trimmed);
        }

        (body.trim().to_string(), footers)
    }
}
