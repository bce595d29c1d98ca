use serde::Deserialize;
use tracing::debug;

use super::{Error, GitHub, TokenStatus, send};

#[derive(Deserialize)]
struct AuthenticatedUser {
    #[serde(default)]
    login: String,
}

impl GitHub {
    /// Check the token by asking GitHub who it belongs to.
    ///
    /// Never fails: any error, or an identity without a login, means the token is invalid.
    pub async fn validate(&self) -> TokenStatus {
        match self.authenticated_user().await {
            Ok(user) if !user.login.is_empty() => {
                debug!("Token belongs to {}", user.login);
                TokenStatus::Valid { login: user.login }
            }
            Ok(_) => {
                debug!("GitHub returned an empty identity for the token");
                TokenStatus::Invalid
            }
            Err(err) => {
                debug!("Token validation failed: {err}");
                TokenStatus::Invalid
            }
        }
    }

    async fn authenticated_user(&self) -> Result<AuthenticatedUser, Error> {
        let activity = "validating the token";
        send(self.get(self.endpoint(["user"])), activity)
            .await?
            .json()
            .await
            .map_err(|source| Error::ApiResponse {
                activity: activity.to_string(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_validate {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::integrations::github::test_client;

    #[tokio::test]
    async fn valid_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer ghp_test")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"login": "octocat", "id": 1}"#)
            .create_async()
            .await;

        let status = test_client(&server).validate().await;

        assert_eq!(
            status,
            TokenStatus::Valid {
                login: "octocat".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[rstest]
    #[case::unauthorized(401, r#"{"message": "Bad credentials"}"#)]
    #[case::forbidden(403, r#"{"message": "Forbidden"}"#)]
    #[case::server_error(500, "")]
    #[case::empty_identity(200, "{}")]
    #[case::empty_login(200, r#"{"login": ""}"#)]
    #[case::null_body(200, "null")]
    #[case::not_json(200, "<html></html>")]
    #[tokio::test]
    async fn anything_else_is_invalid(#[case] status: usize, #[case] body: &str) {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let result = test_client(&server).validate().await;

        assert_eq!(result, TokenStatus::Invalid);
        assert!(!result.is_valid());
    }

    #[tokio::test]
    async fn unreachable_host_is_invalid() {
        let config = crate::app_config::AppConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            ..crate::app_config::AppConfig::default()
        };
        let token = crate::token::Token::new("ghp_test").unwrap();
        let github = GitHub::new(token, &config).unwrap();

        assert_eq!(github.validate().await, TokenStatus::Invalid);
    }
}
