//! Release version and the release branch derived from it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ReleaseError, Result};

/// Prefix of every release branch.
pub const RELEASE_BRANCH_PREFIX: &str = "rc/";

/// A validated `v<major>.<minor>.<patch>` version string.
///
/// Segments are ASCII digits only. No pre-release or build suffix is
/// accepted. The inner string is private so a `ReleaseVersion` is always
/// well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn parse(input: &str) -> Result<Self> {
        let digits = input
            .strip_prefix('v')
            .ok_or_else(|| ReleaseError::InvalidVersion(input.to_string()))?;

        let segments: Vec<&str> = digits.split('.').collect();
        let well_formed = segments.len() == 3
            && segments
                .iter()
                .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));

        if !well_formed {
            return Err(ReleaseError::InvalidVersion(input.to_string()));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The release branch for this version, `rc/<version>`.
    pub fn release_branch(&self) -> String {
        format!("{}{}", RELEASE_BRANCH_PREFIX, self.0)
    }
}

impl FromStr for ReleaseVersion {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = ReleaseError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ReleaseVersion> for String {
    fn from(v: ReleaseVersion) -> Self {
        v.0
    }
}

impl std::fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
