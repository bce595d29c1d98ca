use miette::Diagnostic;
use tracing::{info, warn};

use super::ReleaseRequest;
use crate::integrations::github::{self, GitHub};

/// Ask GitHub to run the release workflow for `request`.
///
/// The request is only borrowed, so on failure the caller still has every input to resubmit.
///
/// ## Errors
/// GitHub did not accept the dispatch.
pub async fn trigger(github: &GitHub, request: &ReleaseRequest) -> Result<(), Error> {
    let ReleaseRequest {
        organization,
        repository,
        bump,
        description,
    } = request;
    match github
        .dispatch_release(organization, repository, *bump, description)
        .await
    {
        Ok(()) => {
            info!("Release PR requested for {organization}/{repository}");
            Ok(())
        }
        Err(source) => {
            warn!("Dispatch for {organization}/{repository} failed: {source}");
            Err(Error::DispatchFailed {
                organization: organization.clone(),
                repository: repository.clone(),
                source,
            })
        }
    }
}

/// What dispatching `request` will run, e.g.
/// `changeset-release.yml on acme/widget@develop with type=patch`.
#[must_use]
pub fn describe(request: &ReleaseRequest, workflow: &str, reference: &str) -> String {
    format!(
        "{workflow} on {}/{}@{reference} with type={}",
        request.organization, request.repository, request.bump
    )
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Failed to create release PR for {organization}/{repository}")]
    #[diagnostic(
        code(release::dispatch_failed),
        help(
            "Check that the release workflow exists on the dispatch branch and accepts `type` and `description` inputs."
        )
    )]
    DispatchFailed {
        organization: String,
        repository: String,
        #[source]
        source: github::Error,
    },
}
