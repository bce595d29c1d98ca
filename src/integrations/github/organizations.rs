use serde::Deserialize;
use tracing::debug;

use super::{Error, GitHub, send};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub login: String,
}

impl GitHub {
    /// Every organization the token's user belongs to, in the order GitHub returns them.
    ///
    /// ## Errors
    /// The request fails or GitHub's response can't be decoded.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, Error> {
        let activity = "listing organizations";
        let request = self
            .get(self.endpoint(["user", "orgs"]))
            .query(&[("per_page", "100")]);
        let organizations: Vec<Organization> = send(request, activity)
            .await?
            .json()
            .await
            .map_err(|source| Error::ApiResponse {
                activity: activity.to_string(),
                source,
            })?;
        debug!("Found {} organizations", organizations.len());
        Ok(organizations)
    }
}
