use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use miette::Diagnostic;
use tracing::debug;

use crate::token::Token;

const TOKEN_FILE_NAME: &str = "github_token";

/// Durable home of the single GitHub token.
pub trait CredentialStore {
    /// The stored token, if there is one.
    ///
    /// ## Errors
    /// The backing storage exists but can't be read.
    fn get(&self) -> Result<Option<Token>, Error>;

    /// Replace the stored token.
    ///
    /// ## Errors
    /// The backing storage can't be written.
    fn set(&self, token: &Token) -> Result<(), Error>;

    /// Forget the stored token. Clearing an empty store is not an error.
    ///
    /// ## Errors
    /// The backing storage can't be removed.
    fn clear(&self) -> Result<(), Error>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn get(&self) -> Result<Option<Token>, Error> {
        (**self).get()
    }

    fn set(&self, token: &Token) -> Result<(), Error> {
        (**self).set(token)
    }

    fn clear(&self) -> Result<(), Error> {
        (**self).clear()
    }
}

/// Keeps the token in a single file inside the config directory.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(TOKEN_FILE_NAME),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Token>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Token::new(&contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn set(&self, token: &Token) -> Result<(), Error> {
        let write_err = |source| Error::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, token.expose()).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        debug!("Stored GitHub token in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed stored GitHub token");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// A store that lives only as long as the process, for tokens that came from the environment.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<Token>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Token>> {
        self.token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Token>, Error> {
        Ok(self.slot().clone())
    }

    fn set(&self, token: &Token) -> Result<(), Error> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    #[error("Could not read the stored GitHub token from {path}")]
    #[diagnostic(
        code(credentials::read),
        help("Check the file's permissions, or run `release-trigger logout` to remove it.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not update the stored GitHub token at {path}")]
    #[diagnostic(code(credentials::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
