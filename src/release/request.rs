use std::{fmt, str::FromStr};

use miette::Diagnostic;
use serde::Serialize;

/// Which part of the semantic version the release increments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    #[default]
    Patch,
    Minor,
    Major,
}

impl VersionBump {
    pub const ALL: [Self; 3] = [Self::Patch, Self::Minor, Self::Major];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionBump {
    type Err = InvalidRequest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bump| bump.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidRequest::VersionBump(s.to_string()))
    }
}

/// Everything needed to dispatch one release. Built fresh for every submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub organization: String,
    pub repository: String,
    pub bump: VersionBump,
    pub description: String,
}

impl ReleaseRequest {
    /// ## Errors
    /// Organization, repository or description is blank.
    pub fn new(
        organization: &str,
        repository: &str,
        bump: VersionBump,
        description: &str,
    ) -> Result<Self, InvalidRequest> {
        let organization = organization.trim();
        let repository = repository.trim();
        if organization.is_empty() {
            return Err(InvalidRequest::Organization);
        }
        if repository.is_empty() {
            return Err(InvalidRequest::Repository);
        }
        if description.trim().is_empty() {
            return Err(InvalidRequest::Description);
        }
        Ok(Self {
            organization: organization.to_string(),
            repository: repository.to_string(),
            bump,
            description: description.to_string(),
        })
    }
}

#[derive(Debug, Diagnostic, thiserror::Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("Organization is required")]
    #[diagnostic(code(release::organization_required))]
    Organization,
    #[error("Repository is required")]
    #[diagnostic(code(release::repository_required))]
    Repository,
    #[error("Change description is required")]
    #[diagnostic(
        code(release::description_required),
        help("The description becomes the changeset for this release.")
    )]
    Description,
    #[error("{0:?} is not a version type")]
    #[diagnostic(
        code(release::version_bump),
        help("Use one of patch, minor or major.")
    )]
    VersionBump(String),
}
