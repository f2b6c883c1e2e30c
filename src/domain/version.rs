use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("valid version regex"))
}

/// Semantic version `MAJOR.MINOR.PATCH` without pre-release or build parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `\d+\.\d+\.\d+` string (e.g., "1.2.3")
    ///
    /// Components must be below `u32::MAX`.
    pub fn parse(text: &str) -> Result<Self> {
        let captures = version_regex().captures(text).ok_or_else(|| {
            ReleaseError::version(format!(
                "Version should be like '\\d+\\.\\d+\\.\\d+', but it is '{}'",
                text
            ))
        })?;

        let component = |index: usize| -> Result<u32> {
            // u32::MAX itself is refused so that `increment` cannot overflow
            captures[index]
                .parse::<u32>()
                .ok()
                .filter(|value| *value < u32::MAX)
                .ok_or_else(|| {
                    ReleaseError::version(format!(
                        "Version component '{}' of '{}' is out of range",
                        &captures[index], text
                    ))
                })
        };

        Ok(SemanticVersion {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Parse an optional version, treating absence as `0.0.0`
    pub fn parse_or_default(text: Option<&str>) -> Result<Self> {
        match text {
            Some(text) => Self::parse(text),
            None => Ok(SemanticVersion::default()),
        }
    }

    /// Bump the version, resetting every less significant component
    pub fn increment(&self, release_type: ReleaseType) -> Self {
        match release_type {
            ReleaseType::Major => SemanticVersion {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            ReleaseType::Minor => SemanticVersion {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            ReleaseType::Patch => SemanticVersion {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Severity of a release, ordered `Patch < Minor < Major`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseType {
    Patch,
    Minor,
    Major,
}

impl ReleaseType {
    /// Name as written in the changelog marker
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Major => "MAJOR",
            ReleaseType::Minor => "MINOR",
            ReleaseType::Patch => "PATCH",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MAJOR" => Ok(ReleaseType::Major),
            "MINOR" => Ok(ReleaseType::Minor),
            "PATCH" => Ok(ReleaseType::Patch),
            other => Err(ReleaseError::version(format!(
                "Unknown release type '{}', expected MAJOR, MINOR or PATCH",
                other
            ))),
        }
    }
}
