//! Organization and repository lookups, cached for a freshness window.

use std::time::Duration;

use tracing::debug;

use crate::integrations::github::{self, GitHub};

mod cache;
mod eligible;
mod view;

use cache::FreshnessCache;
use eligible::retain_eligible;
pub use view::{LookupTag, RepositoryView, ViewUpdate};

/// Something the user can pick: what to show and what to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            label: name.to_string(),
            value: name.to_string(),
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// The two lookups behind the release form, each keyed by its input.
#[derive(Debug)]
pub struct Discovery {
    github: GitHub,
    organizations: FreshnessCache<(), Vec<Choice>>,
    repositories: FreshnessCache<String, Vec<Choice>>,
}

impl Discovery {
    #[must_use]
    pub fn new(github: GitHub, freshness: Duration) -> Self {
        Self {
            github,
            organizations: FreshnessCache::new(freshness),
            repositories: FreshnessCache::new(freshness),
        }
    }

    #[must_use]
    pub fn github(&self) -> &GitHub {
        &self.github
    }

    /// Every organization of the user, fetched at most once per freshness window.
    ///
    /// ## Errors
    /// The organizations could not be listed. Nothing is cached in that case.
    pub async fn organizations(&mut self) -> Result<Vec<Choice>, github::Error> {
        if let Some(cached) = self.organizations.get(&()) {
            debug!("Using cached organizations");
            return Ok(cached.clone());
        }
        let choices: Vec<Choice> = self
            .github
            .list_organizations()
            .await?
            .iter()
            .map(|organization| Choice::new(&organization.login))
            .collect();
        self.organizations.insert((), choices.clone());
        Ok(choices)
    }

    /// The repositories of `organization` that have the release workflow, most recently updated
    /// first. `None` if `organization` is blank.
    ///
    /// ## Errors
    /// The repositories could not be listed. Failing workflow probes only exclude a repository.
    pub async fn repositories(
        &mut self,
        organization: &str,
    ) -> Result<Option<Vec<Choice>>, github::Error> {
        let organization = organization.trim();
        if organization.is_empty() {
            return Ok(None);
        }
        let key = organization.to_string();
        if let Some(cached) = self.repositories.get(&key) {
            debug!("Using cached repositories of {organization}");
            return Ok(Some(cached.clone()));
        }

        let listed = self.github.list_repositories(organization).await?;
        let total = listed.len();
        let eligible = retain_eligible(listed, |name| {
            let github = self.github.clone();
            let owner = key.clone();
            async move { github.has_release_workflow(&owner, &name).await }
        })
        .await;
        debug!(
            "{} of {total} repositories in {organization} have the release workflow",
            eligible.len()
        );

        let choices: Vec<Choice> = eligible
            .iter()
            .map(|repository| Choice::new(&repository.name))
            .collect();
        self.repositories.insert(key, choices.clone());
        Ok(Some(choices))
    }

    /// Forget every cached lookup.
    pub fn invalidate(&mut self) {
        self.organizations.clear();
        self.repositories.clear();
    }
}
