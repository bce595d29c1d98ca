use serde::Deserialize;
use tracing::debug;

use super::{Eligibility, Error, GitHub, send};

/// GitHub's largest page size. Only the first page is ever fetched.
const PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
}

impl GitHub {
    /// Up to 100 repositories of `org`, of every visibility, most recently updated first.
    ///
    /// The sorting is done by GitHub and kept as-is.
    ///
    /// ## Errors
    /// The request fails or GitHub's response can't be decoded.
    pub async fn list_repositories(&self, org: &str) -> Result<Vec<Repository>, Error> {
        let activity = format!("listing repositories of {org}");
        let page_size = PAGE_SIZE.to_string();
        let request = self
            .get(self.endpoint(["orgs", org, "repos"]))
            .query(&[
                ("type", "all"),
                ("sort", "updated"),
                ("per_page", page_size.as_str()),
            ]);
        let mut repositories: Vec<Repository> = send(request, &activity)
            .await?
            .json()
            .await
            .map_err(|source| Error::ApiResponse { activity, source })?;
        repositories.truncate(PAGE_SIZE);
        debug!("Found {} repositories in {org}", repositories.len());
        Ok(repositories)
    }

    /// Whether `owner/repo` has the release workflow file on its default branch.
    ///
    /// Never fails: missing, forbidden and unreachable all count as not eligible.
    pub async fn has_release_workflow(&self, owner: &str, repo: &str) -> Eligibility {
        let url = self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(self.workflow_path.split('/')),
        );
        match send(self.get(url), "looking for the release workflow").await {
            Ok(_) => Eligibility::Eligible,
            Err(err) => {
                debug!("{owner}/{repo} is not eligible: {err}");
                Eligibility::NotEligible
            }
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_has_release_workflow {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::integrations::github::test_client;

    const WORKFLOW_PATH: &str =
        "/repos/acme/widget/contents/.github/workflows/changeset-release.yml";

    #[tokio::test]
    async fn present_file_is_eligible() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", WORKFLOW_PATH)
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body(r#"{"type": "file", "name": "changeset-release.yml"}"#)
            .create_async()
            .await;

        let eligibility = test_client(&server)
            .has_release_workflow("acme", "widget")
            .await;

        assert_eq!(eligibility, Eligibility::Eligible);
        mock.assert_async().await;
    }

    #[rstest]
    #[case::not_found(404)]
    #[case::forbidden(403)]
    #[case::server_error(502)]
    #[tokio::test]
    async fn failures_are_not_eligible(#[case] status: usize) {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", WORKFLOW_PATH)
            .with_status(status)
            .create_async()
            .await;

        let eligibility = test_client(&server)
            .has_release_workflow("acme", "widget")
            .await;

        assert_eq!(eligibility, Eligibility::NotEligible);
    }
}
