use serde::Serialize;
use tracing::{debug, info};

use super::{Error, GitHub, send};
use crate::release::VersionBump;

#[derive(Serialize)]
struct WorkflowDispatch<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
    inputs: ReleaseInputs<'a>,
}

#[derive(Serialize)]
struct ReleaseInputs<'a> {
    #[serde(rename = "type")]
    bump: VersionBump,
    description: &'a str,
}

impl GitHub {
    /// Start the release workflow of `owner/repo` on the configured branch.
    ///
    /// GitHub answers a successful dispatch with no content, so there is nothing to return.
    ///
    /// ## Errors
    /// The request fails or GitHub answers with anything other than a 2xx status.
    pub async fn dispatch_release(
        &self,
        owner: &str,
        repo: &str,
        bump: VersionBump,
        description: &str,
    ) -> Result<(), Error> {
        let url = self.endpoint([
            "repos",
            owner,
            repo,
            "actions",
            "workflows",
            self.workflow.as_str(),
            "dispatches",
        ]);
        let body = WorkflowDispatch {
            reference: &self.reference,
            inputs: ReleaseInputs { bump, description },
        };
        debug!(
            "Dispatching {} on {owner}/{repo}@{}",
            self.workflow, self.reference
        );
        send(self.post(url).json(&body), "dispatching the release workflow").await?;
        info!("Dispatched a {bump} release of {owner}/{repo}");
        Ok(())
    }
}
