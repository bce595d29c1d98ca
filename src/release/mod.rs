//! Composing a release request and handing it to GitHub.

mod request;
mod trigger;

pub use request::{InvalidRequest, ReleaseRequest, VersionBump};
pub use trigger::{Error, describe, trigger};
