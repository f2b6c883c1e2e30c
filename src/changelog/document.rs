//! In-memory model of the changelog markdown and its pending release block.
//!
//! A changelog ready for release looks like:
//!
//! ```text
//! ### NEXT_VERSION_TYPE=MINOR
//! ### NEXT_VERSION_DESCRIPTION_BEGIN
//! * new feature
//! ### NEXT_VERSION_DESCRIPTION_END
//! ## [1.0.0](https://host/pr/1) (01-02-2024)
//!
//! * first release
//! ```

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::domain::{ReleaseType, SemanticVersion};
use crate::error::{NotReadyReason, ReleaseError, Result};

/// Placeholder written for the release type of the next cycle
pub const NEXT_VERSION_TYPE_MARKER: &str = "### NEXT_VERSION_TYPE=MAJOR|MINOR|PATCH";
/// Opens the description of the next release
pub const DESCRIPTION_BEGIN_MARKER: &str = "### NEXT_VERSION_DESCRIPTION_BEGIN";
/// Closes the description of the next release
pub const DESCRIPTION_END_MARKER: &str = "### NEXT_VERSION_DESCRIPTION_END";
/// Text a major release description must mention
pub const BREAKING_CHANGES_MARKER: &str = "breaking changes";
/// Date format of released entries
pub const RELEASE_DATE_FORMAT: &str = "%d-%m-%Y";

fn released_entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^## \[(\d+\.\d+\.\d+)\]\(.*\)\s+\(\d+-\d+-\d+\)$")
            .expect("valid released entry regex")
    })
}

fn release_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^### NEXT_VERSION_TYPE=(MAJOR|MINOR|PATCH)$")
            .expect("valid release type regex")
    })
}

fn is_release_type_line(line: &str) -> bool {
    release_type_regex().is_match(line.trim())
}

/// Version and description produced by rotating the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub version: SemanticVersion,
    pub description_md: String,
}

/// Whether the pending block can be released
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseReadiness {
    Ready {
        release_type: ReleaseType,
        description: String,
    },
    NotReady(NotReadyReason),
}

impl ReleaseReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReleaseReadiness::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    BeforeBlock,
    InDescription,
    AfterBlock,
}

/// Location of the description markers within a list of lines
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingBlock {
    begin: usize,
    /// `None` when the end marker is missing
    end: Option<usize>,
    description: String,
}

/// Walk the lines once: BeforeBlock -> InDescription -> AfterBlock.
///
/// An unterminated block is reported with `end: None` and an empty description.
fn scan_pending_block(lines: &[String]) -> Option<PendingBlock> {
    let mut state = ScanState::BeforeBlock;
    let mut begin = 0;
    let mut end = 0;
    let mut description: Vec<&str> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        match state {
            ScanState::BeforeBlock => {
                if trimmed == DESCRIPTION_BEGIN_MARKER {
                    begin = index;
                    state = ScanState::InDescription;
                }
            }
            ScanState::InDescription => {
                if trimmed == DESCRIPTION_END_MARKER {
                    end = index;
                    state = ScanState::AfterBlock;
                } else {
                    description.push(trimmed);
                }
            }
            ScanState::AfterBlock => break,
        }
    }

    match state {
        ScanState::BeforeBlock => None,
        ScanState::InDescription => Some(PendingBlock {
            begin,
            end: None,
            description: String::new(),
        }),
        ScanState::AfterBlock => Some(PendingBlock {
            begin,
            end: Some(end),
            description: description.join("\n").trim().to_string(),
        }),
    }
}

/// Parsed changelog, held as lines without terminators
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangelogDocument {
    lines: Vec<String>,
}

impl ChangelogDocument {
    /// Split changelog text into lines (`\n` or `\r\n` terminated)
    pub fn parse(content: &str) -> Self {
        ChangelogDocument {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with `\n`, without a trailing terminator
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Release type from the first `### NEXT_VERSION_TYPE=<TYPE>` line
    pub fn next_version_type(&self) -> Option<ReleaseType> {
        self.lines.iter().find_map(|line| {
            release_type_regex()
                .captures(line.trim())
                .and_then(|captures| captures[1].parse().ok())
        })
    }

    /// Most recent released version: the first released entry from the top
    pub fn last_version(&self) -> Result<Option<SemanticVersion>> {
        self.lines
            .iter()
            .find_map(|line| released_entry_regex().captures(line))
            .map(|captures| SemanticVersion::parse(&captures[1]))
            .transpose()
    }

    /// Trimmed text between the description markers, empty when absent or unterminated
    pub fn next_version_description(&self) -> String {
        scan_pending_block(&self.lines)
            .map(|block| block.description)
            .unwrap_or_default()
    }

    pub fn readiness(&self) -> ReleaseReadiness {
        let description = self.next_version_description();
        if description.is_empty() {
            return ReleaseReadiness::NotReady(NotReadyReason::MissingDescription);
        }
        match self.next_version_type() {
            Some(release_type) => ReleaseReadiness::Ready {
                release_type,
                description,
            },
            None => ReleaseReadiness::NotReady(NotReadyReason::MissingReleaseType),
        }
    }

    /// Both a description and a concrete release type are present
    pub fn has_next_version_info(&self) -> bool {
        self.readiness().is_ready()
    }

    pub fn has_breaking_changes_marker(&self) -> bool {
        self.next_version_description()
            .contains(BREAKING_CHANGES_MARKER)
    }

    pub fn is_major_version(&self) -> bool {
        self.next_version_type() == Some(ReleaseType::Major)
    }

    /// Version the pending block would be released as, `None` without a release type
    pub fn next_version(&self) -> Result<Option<SemanticVersion>> {
        let Some(release_type) = self.next_version_type() else {
            return Ok(None);
        };
        let last_version = self.last_version()?.unwrap_or_default();
        Ok(Some(last_version.increment(release_type)))
    }

    /// Turn the pending block into a dated released entry.
    ///
    /// Release type lines are dropped; the span from the begin marker through
    /// the end marker becomes `## [<version>](<link>) (<date>)`, a blank line
    /// and the description. Lines above and below the block are kept.
    pub fn rotate(
        &self,
        pull_request_link: Option<&str>,
        date: NaiveDate,
    ) -> Result<(ChangelogDocument, ReleaseEntry)> {
        let (release_type, description) = match self.readiness() {
            ReleaseReadiness::Ready {
                release_type,
                description,
            } => (release_type, description),
            ReleaseReadiness::NotReady(reason) => return Err(ReleaseError::NotReady(reason)),
        };

        let last_version = self.last_version()?;
        let version = last_version.unwrap_or_default().increment(release_type);
        tracing::info!(
            last_version = ?last_version.map(|v| v.to_string()),
            next_version = %version,
            release_type = %release_type,
            "changelog release version info:\n{}",
            description
        );

        let kept: Vec<String> = self
            .lines
            .iter()
            .filter(|line| !is_release_type_line(line))
            .cloned()
            .collect();

        let (begin, end) = match scan_pending_block(&kept) {
            Some(PendingBlock {
                begin,
                end: Some(end),
                ..
            }) => (begin, end),
            _ => {
                return Err(ReleaseError::NotReady(NotReadyReason::MissingDescription));
            }
        };

        let mut lines = Vec::with_capacity(kept.len() + 4);
        lines.extend_from_slice(&kept[..begin]);
        if begin > 0 {
            lines.push(String::new());
        }
        lines.push(format!(
            "## [{}]({}) ({})",
            version,
            pull_request_link.unwrap_or_default(),
            date.format(RELEASE_DATE_FORMAT)
        ));
        lines.push(String::new());
        lines.extend(description.lines().map(str::to_string));
        lines.push(String::new());
        lines.extend_from_slice(&kept[end + 1..]);

        Ok((
            ChangelogDocument { lines },
            ReleaseEntry {
                version,
                description_md: description,
            },
        ))
    }
}

/// `content` with fresh marker placeholders in front, each on its own line
pub fn prepend_next_version_markers(content: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        NEXT_VERSION_TYPE_MARKER, DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER, content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    const RELEASED: &str = "## [1.0.0]() (01-02-2024)\n\nfirst release";

    fn pending(release_type: &str, description: &str, rest: &str) -> String {
        format!(
            "### NEXT_VERSION_TYPE={}\n{}\n{}\n{}\n{}",
            release_type, DESCRIPTION_BEGIN_MARKER, description, DESCRIPTION_END_MARKER, rest
        )
    }

    #[test]
    fn test_scan_unterminated_block_has_empty_description() {
        let doc = ChangelogDocument::parse(&format!(
            "### NEXT_VERSION_TYPE=MINOR\n{}\nhalf written",
            DESCRIPTION_BEGIN_MARKER
        ));
        assert_eq!(doc.next_version_description(), "");
        assert_eq!(
            doc.readiness(),
            ReleaseReadiness::NotReady(NotReadyReason::MissingDescription)
        );
    }

    #[test]
    fn test_description_lines_are_trimmed() {
        let doc = ChangelogDocument::parse(&pending("PATCH", "\n  * fix one  \n* fix two\n", ""));
        assert_eq!(doc.next_version_description(), "* fix one\n* fix two");
    }

    #[test]
    fn test_placeholder_marker_is_not_a_release_type() {
        let doc = ChangelogDocument::parse(&format!(
            "{}\n{}\nsomething\n{}",
            NEXT_VERSION_TYPE_MARKER, DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER
        ));
        assert_eq!(doc.next_version_type(), None);
        assert_eq!(
            doc.readiness(),
            ReleaseReadiness::NotReady(NotReadyReason::MissingReleaseType)
        );
        assert_eq!(doc.next_version().unwrap(), None);
    }

    #[test]
    fn test_next_version_from_last_release() {
        let doc = ChangelogDocument::parse(&pending("MINOR", "feature", RELEASED));
        assert_eq!(doc.last_version().unwrap(), Some(SemanticVersion::new(1, 0, 0)));
        assert_eq!(doc.next_version().unwrap(), Some(SemanticVersion::new(1, 1, 0)));
    }

    #[test]
    fn test_next_version_without_release_starts_from_zero() {
        let doc = ChangelogDocument::parse(&pending("MINOR", "feature", ""));
        assert_eq!(doc.next_version().unwrap(), Some(SemanticVersion::new(0, 1, 0)));
    }

    #[test]
    fn test_release_at_component_limit_is_an_error() {
        let doc = ChangelogDocument::parse(&pending(
            "MAJOR",
            "**breaking changes** huge",
            "## [4294967295.0.0]() (01-01-2024)",
        ));
        assert!(matches!(doc.next_version(), Err(ReleaseError::Version(_))));
        assert!(matches!(doc.rotate(None, date()), Err(ReleaseError::Version(_))));
    }

    #[test]
    fn test_last_version_is_topmost_entry() {
        let doc = ChangelogDocument::parse(
            "## [2.1.0](https://host/pr/5) (03-03-2024)\n\nb\n\n## [2.0.0]() (01-01-2024)\n\na",
        );
        assert_eq!(doc.last_version().unwrap(), Some(SemanticVersion::new(2, 1, 0)));
    }

    #[test]
    fn test_breaking_changes_marker() {
        let doc = ChangelogDocument::parse(&pending("MAJOR", "**breaking changes** removed api", ""));
        assert!(doc.is_major_version());
        assert!(doc.has_breaking_changes_marker());

        let doc = ChangelogDocument::parse(&pending("MAJOR", "removed api", ""));
        assert!(!doc.has_breaking_changes_marker());
    }

    #[test]
    fn test_rotate_without_header() {
        let doc = ChangelogDocument::parse(&pending("PATCH", "some patch description", RELEASED));
        let (rotated, entry) = doc.rotate(None, date()).unwrap();

        assert_eq!(entry.version, SemanticVersion::new(1, 0, 1));
        assert_eq!(entry.description_md, "some patch description");
        assert_eq!(
            rotated.render(),
            "## [1.0.1]() (07-03-2024)\n\nsome patch description\n\n## [1.0.0]() (01-02-2024)\n\nfirst release"
        );
    }

    #[test]
    fn test_rotate_keeps_header_and_adds_separator() {
        let content = format!(
            "# Changelog\n{}\n* feature\n{}\n{}",
            DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER, RELEASED
        );
        let doc = ChangelogDocument::parse(&format!("### NEXT_VERSION_TYPE=MINOR\n{}", content));
        let (rotated, entry) = doc.rotate(Some("https://host/pr/2"), date()).unwrap();

        assert_eq!(entry.version.to_string(), "1.1.0");
        assert_eq!(
            rotated.render(),
            "# Changelog\n\n## [1.1.0](https://host/pr/2) (07-03-2024)\n\n* feature\n\n## [1.0.0]() (01-02-2024)\n\nfirst release"
        );
    }

    #[test]
    fn test_rotate_block_at_end_of_file() {
        let doc = ChangelogDocument::parse(&pending("MINOR", "some description", ""));
        let (rotated, entry) = doc.rotate(None, date()).unwrap();

        assert_eq!(entry.version.to_string(), "0.1.0");
        assert_eq!(
            rotated.render(),
            "## [0.1.0]() (07-03-2024)\n\nsome description\n"
        );
    }

    #[test]
    fn test_rotate_not_ready() {
        let doc = ChangelogDocument::parse(&pending("MINOR", "", RELEASED));
        assert!(matches!(
            doc.rotate(None, date()),
            Err(ReleaseError::NotReady(NotReadyReason::MissingDescription))
        ));

        let doc = ChangelogDocument::parse(&format!(
            "{}\nx\n{}",
            DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER
        ));
        assert!(matches!(
            doc.rotate(None, date()),
            Err(ReleaseError::NotReady(NotReadyReason::MissingReleaseType))
        ));
    }

    #[test]
    fn test_markers_on_empty_document() {
        assert_eq!(
            prepend_next_version_markers(""),
            format!(
                "{}\n{}\n{}\n",
                NEXT_VERSION_TYPE_MARKER, DESCRIPTION_BEGIN_MARKER, DESCRIPTION_END_MARKER
            )
        );
        assert!(prepend_next_version_markers("# Changelog\n").ends_with("_END\n# Changelog\n"));
    }
}
