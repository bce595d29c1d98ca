//! The GitHub REST client: one authenticated connection and the four calls the release flow needs.

use miette::Diagnostic;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::Deserialize;

use crate::{app_config::AppConfig, token::Token};

mod dispatch;
mod organizations;
mod repositories;
mod validate;

pub use organizations::Organization;
pub use repositories::Repository;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// An authenticated connection to GitHub. One of these exists per validated token.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct GitHub {
    client: Client,
    token: Token,
    api_url: Url,
    workflow: String,
    workflow_path: String,
    reference: String,
}

/// Outcome of probing the identity endpoint. Failures are folded into `Invalid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    Valid { login: String },
    Invalid,
}

impl TokenStatus {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Whether a repository carries the release workflow file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotEligible,
}

impl Eligibility {
    #[must_use]
    pub fn is_eligible(self) -> bool {
        self == Self::Eligible
    }
}

impl GitHub {
    /// Build a client for `token`, talking to the API and workflow configured in `config`.
    ///
    /// No request is made here, call [`GitHub::validate`] to check the token.
    ///
    /// ## Errors
    /// 1. `config.api_url` is not a usable base URL
    /// 2. The HTTP client can't be initialized
    pub fn new(token: Token, config: &AppConfig) -> Result<Self, Error> {
        let api_url = Url::parse(&config.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| Error::InvalidApiUrl {
                url: config.api_url.clone(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            client,
            token,
            api_url,
            workflow: config.workflow.clone(),
            workflow_path: config.workflow_path(),
            reference: config.reference.clone(),
        })
    }

    /// The API URL with `segments` appended, each one percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url).bearer_auth(self.token.expose())
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url).bearer_auth(self.token.expose())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Send `request`, turning transport failures and non-2xx statuses into an [`Error`].
async fn send(request: RequestBuilder, activity: &str) -> Result<Response, Error> {
    let response = request.send().await.map_err(|source| Error::ApiRequest {
        activity: activity.to_string(),
        source,
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };
    Err(Error::Status {
        activity: activity.to_string(),
        status,
        message,
    })
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Trouble communicating with GitHub while {activity}: {source}")]
    #[diagnostic(
        code(github::api_request_error),
        help("There was a problem reaching GitHub, this may be a network issue.")
    )]
    ApiRequest {
        activity: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GitHub rejected the request while {activity} ({status}): {message}")]
    #[diagnostic(
        code(github::status_error),
        help(
            "This may be a permissions issue. The token needs repository and workflow permissions."
        )
    )]
    Status {
        activity: String,
        status: StatusCode,
        message: String,
    },
    #[error("Trouble decoding the response from GitHub while {activity}")]
    #[diagnostic(code(github::api_response_error))]
    ApiResponse {
        activity: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} is not a valid GitHub API URL")]
    #[diagnostic(
        code(github::invalid_api_url),
        help("Set api_url in config.toml to something like https://api.github.com")
    )]
    InvalidApiUrl { url: String },
    #[error("Could not set up an HTTP client")]
    #[diagnostic(code(github::client))]
    Client(#[source] reqwest::Error),
}

impl Error {
    /// The HTTP status GitHub answered with, if it answered at all.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::ApiRequest { source, .. } | Self::ApiResponse { source, .. } => source.status(),
            Self::InvalidApiUrl { .. } | Self::Client(_) => None,
        }
    }
}

/// A client pointed at a `mockito` server.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_client(server: &mockito::ServerGuard) -> GitHub {
    let config = AppConfig {
        api_url: server.url(),
        ..AppConfig::default()
    };
    GitHub::new(Token::new("ghp_test").unwrap(), &config).unwrap()
}
