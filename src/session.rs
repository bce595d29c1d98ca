use miette::Diagnostic;
use tracing::{debug, info};

use crate::{
    app_config::AppConfig,
    credentials::{self, CredentialStore},
    discovery::{Choice, Discovery, RepositoryView, ViewUpdate},
    integrations::github::{self, GitHub, TokenStatus},
    release::{self, ReleaseRequest},
    token::Token,
};

/// Everything that lives for one login: the held token's connection, cached lookups and the
/// current selection.
///
/// Mutations only happen through `authenticate`, `logout`, lookups and `submit`. Each of those
/// borrows the session mutably, so a logout can't interleave with a running dispatch and every
/// dispatch outcome reaches the caller that started it.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    config: AppConfig,
    state: State,
}

#[derive(Debug)]
enum State {
    Unauthenticated,
    Authenticated {
        discovery: Discovery,
        view: RepositoryView,
    },
}

impl<S: CredentialStore> Session<S> {
    /// Start a session, picking up a previously stored token if there is one.
    ///
    /// A stored token is trusted as-is: it was validated when it was stored.
    ///
    /// ## Errors
    /// 1. The store can't be read
    /// 2. The GitHub client can't be built from `config`
    pub fn start(store: S, config: AppConfig) -> Result<Self, Error> {
        let state = match store.get()? {
            Some(token) => {
                debug!("Using stored GitHub token");
                authenticated_state(GitHub::new(token, &config)?, &config)
            }
            None => State::Unauthenticated,
        };
        Ok(Self {
            store,
            config,
            state,
        })
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated { .. })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Validate `token` and, if GitHub accepts it, store it and start using it.
    ///
    /// Returns the login the token belongs to.
    ///
    /// ## Errors
    /// 1. [`Error::InvalidToken`]: the token was rejected, the session is now unauthenticated and
    ///    any stored token is gone
    /// 2. The store can't be updated
    pub async fn authenticate(&mut self, token: Token) -> Result<String, Error> {
        let github = GitHub::new(token.clone(), &self.config)?;
        match github.validate().await {
            TokenStatus::Valid { login } => {
                self.store.set(&token)?;
                self.state = authenticated_state(github, &self.config);
                info!("Authenticated as {login}");
                Ok(login)
            }
            TokenStatus::Invalid => {
                self.state = State::Unauthenticated;
                self.store.clear()?;
                Err(Error::InvalidToken)
            }
        }
    }

    /// Forget the token, the connection and every cached lookup.
    ///
    /// ## Errors
    /// The stored token can't be removed.
    pub fn logout(&mut self) -> Result<(), Error> {
        self.state = State::Unauthenticated;
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// ## Errors
    /// 1. Not logged in
    /// 2. Listing the organizations failed
    pub async fn organizations(&mut self) -> Result<Vec<Choice>, Error> {
        let (discovery, _) = self.authenticated()?;
        Ok(discovery.organizations().await?)
    }

    /// Eligible repositories of `organization`, `None` if it is blank. Doesn't touch the view.
    ///
    /// ## Errors
    /// 1. Not logged in
    /// 2. Listing the repositories failed
    pub async fn repositories(&mut self, organization: &str) -> Result<Option<Vec<Choice>>, Error> {
        let (discovery, _) = self.authenticated()?;
        Ok(discovery.repositories(organization).await?)
    }

    /// Select `organization` in the view and load its eligible repositories into it.
    ///
    /// ## Errors
    /// 1. Not logged in
    /// 2. Listing the repositories failed, the view then shows none
    pub async fn select_organization(&mut self, organization: &str) -> Result<ViewUpdate, Error> {
        let (discovery, view) = self.authenticated()?;
        let Some(tag) = view.select_organization(organization) else {
            return Ok(ViewUpdate::Disabled);
        };
        let repositories = discovery
            .repositories(tag.organization())
            .await?
            .unwrap_or_default();
        Ok(view.apply(tag, repositories))
    }

    /// The selection state, if logged in.
    #[must_use]
    pub fn view(&self) -> Option<&RepositoryView> {
        match &self.state {
            State::Authenticated { view, .. } => Some(view),
            State::Unauthenticated => None,
        }
    }

    /// Choose one of the repositories shown for the selected organization.
    ///
    /// ## Errors
    /// Not logged in.
    pub fn select_repository(&mut self, repository: &str) -> Result<bool, Error> {
        let (_, view) = self.authenticated()?;
        Ok(view.select_repository(repository))
    }

    /// Dispatch the release workflow for `request`.
    ///
    /// ## Errors
    /// 1. Not logged in
    /// 2. GitHub did not accept the dispatch. `request` is untouched and can be submitted again.
    pub async fn submit(&mut self, request: &ReleaseRequest) -> Result<(), Error> {
        let (discovery, _) = self.authenticated()?;
        release::trigger(discovery.github(), request).await?;
        Ok(())
    }

    fn authenticated(&mut self) -> Result<(&mut Discovery, &mut RepositoryView), Error> {
        match &mut self.state {
            State::Authenticated { discovery, view } => Ok((discovery, view)),
            State::Unauthenticated => Err(Error::NotLoggedIn),
        }
    }
}

fn authenticated_state(github: GitHub, config: &AppConfig) -> State {
    State::Authenticated {
        discovery: Discovery::new(github, config.cache_ttl()),
        view: RepositoryView::default(),
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Invalid GitHub token")]
    #[diagnostic(
        code(session::invalid_token),
        help("Create a token with repository and workflow permissions and log in again.")
    )]
    InvalidToken,
    #[error("Not logged in to GitHub")]
    #[diagnostic(
        code(session::not_logged_in),
        help("Run `release-trigger login` or set the GITHUB_TOKEN environment variable.")
    )]
    NotLoggedIn,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Credentials(#[from] credentials::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    GitHub(#[from] github::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Release(#[from] release::Error),
}
