//! Action references and `uses:` line parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Length of a full git commit SHA in hex characters.
const COMMIT_SHA_LEN: usize = 40;

/// Matches a `uses:` key at the start of a line, followed by its value and an
/// optional trailing comment.
static USES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<prefix>\s*(?:-\s+)?(?:uses|"uses"|'uses')\s*:\s*)(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'#]+))(?:\s+(?P<comment>#.*?))?\s*$"#,
    )
    .expect("valid regex")
});

/// A reference to an action or reusable workflow: `owner/repo[/path]@ref`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ActionReference {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Subdirectory inside the repository, empty for root actions.
    pub path: String,

    /// Tag, branch or commit SHA after the `@`.
    pub ref_or_sha: String,
}

impl ActionReference {
    /// Parses `owner/repo[/path]@ref`.
    ///
    /// Returns `None` for local actions (`./...`), docker references and
    /// anything else that lacks a non-empty owner, repo and ref.
    pub fn parse(value: &str) -> Option<Self> {
        let (location, ref_or_sha) = value.split_once('@')?;
        let mut segments = location.splitn(3, '/');
        let owner = segments.next()?;
        let repo = segments.next()?;
        let path = segments.next().unwrap_or_default();

        if owner.is_empty() || repo.is_empty() || ref_or_sha.is_empty() || owner.contains(':') {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            ref_or_sha: ref_or_sha.to_string(),
        })
    }

    /// True if the ref is already a full 40 character commit SHA.
    pub fn has_commit_sha(&self) -> bool {
        self.ref_or_sha.len() == COMMIT_SHA_LEN
            && self.ref_or_sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// The base repository in `owner/repo` format, ignoring any subpath.
    pub fn base_repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// True if this references a reusable workflow file rather than an action.
    pub fn is_reusable_workflow(&self) -> bool {
        self.path.ends_with(".yml")
            || self.path.ends_with(".yaml")
            || self.path.starts_with(".github/workflows/")
    }

    /// The `owner/repo[/path]` part without the ref.
    pub fn location(&self) -> String {
        if self.path.is_empty() {
            self.base_repository()
        } else {
            format!("{}/{}/{}", self.owner, self.repo, self.path)
        }
    }
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.location(), self.ref_or_sha)
    }
}

/// A `uses:` line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUsesLine {
    /// The parsed reference.
    pub definition: ActionReference,

    /// Everything before the value: indentation, list dash, key and separator.
    pub prefix: String,

    /// Quote character wrapping the value, if any.
    pub quote: Option<char>,

    /// Pre-existing trailing comment including its `#`, empty if none.
    pub comment: String,
}

impl ParsedUsesLine {
    /// Renders the line with the reference pinned to `commit_sha`.
    ///
    /// The new ref comment comes first, any old comment is kept after it.
    pub fn render_pinned(&self, commit_sha: &str, ref_comment: &str) -> String {
        let quote = self.quote.map(String::from).unwrap_or_default();
        let mut line = format!(
            "{}{quote}{}@{commit_sha}{quote} # {ref_comment}",
            self.prefix,
            self.definition.location(),
        );
        if !self.comment.is_empty() {
            line.push(' ');
            line.push_str(&self.comment);
        }
        line
    }
}

/// Parses a single line as a `uses:` declaration.
///
/// Returns `None` for lines that are not `uses:` declarations, including
/// comments, prose containing `uses:` mid-line and local or docker actions.
pub fn parse_line(line: &str) -> Option<ParsedUsesLine> {
    let captures = USES_LINE.captures(line)?;

    let (value, quote) = if let Some(value) = captures.name("dq") {
        (value.as_str(), Some('"'))
    } else if let Some(value) = captures.name("sq") {
        (value.as_str(), Some('\''))
    } else {
        (captures.name("bare")?.as_str(), None)
    };

    let definition = ActionReference::parse(value)?;

    Some(ParsedUsesLine {
        definition,
        prefix: captures["prefix"].to_string(),
        quote,
        comment: captures
            .name("comment")
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
    })
}
