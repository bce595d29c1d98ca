//! Trigger changeset release pull requests on GitHub.
//!
//! Pick an organization, one of its repositories that has the release workflow, a version bump
//! and a description, and the workflow is dispatched to open the release PR.

use std::{env, path::Path};

use clap::{Arg, ArgAction, ArgMatches, Command, builder::PossibleValuesParser, command};
use miette::Diagnostic;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub use crate::{
    app_config::AppConfig,
    credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore},
    discovery::{Choice, Discovery, LookupTag, RepositoryView, ViewUpdate},
    integrations::github::{Eligibility, GitHub, Organization, Repository, TokenStatus},
    release::{ReleaseRequest, VersionBump},
    session::Session,
    token::Token,
};

pub mod app_config;
pub mod credentials;
pub mod discovery;
pub mod integrations;
mod prompt;
pub mod release;
pub mod session;
mod token;

const TOKEN_HELP: &str = "The token needs repository and workflow permissions";

/// Parse the command line and run the chosen command.
///
/// ## Errors
/// Whatever the command failed with, ready to be rendered by `miette`.
pub async fn run() -> miette::Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let dir = app_config::config_dir()?;
    let config = AppConfig::load(&dir)?;
    debug!("Using configuration from {}", dir.display());

    match matches.subcommand() {
        Some(("login", args)) => login(&dir, config, args).await?,
        Some(("logout", _)) => logout(&dir, config)?,
        Some(("orgs", _)) => list_organizations(&dir, config).await?,
        Some(("repos", args)) => list_repositories(&dir, config, args).await?,
        Some(("release", args)) => release(&dir, config, args).await?,
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

fn build_cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log each request made to GitHub"),
        )
        .subcommand(
            Command::new("login")
                .about("Validate a GitHub token and remember it")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("The token to store, prompted for if not given"),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored GitHub token"))
        .subcommand(Command::new("orgs").about("List the organizations you belong to"))
        .subcommand(
            Command::new("repos")
                .about("List the repositories of an organization that have the release workflow")
                .arg(Arg::new("org").required(true).help("The organization to look in")),
        )
        .subcommand(
            Command::new("release")
                .about("Dispatch the release workflow to open a release PR")
                .long_about(
                    "Dispatch the release workflow to open a release PR.\n\n\
                     Anything not given as an option is prompted for.",
                )
                .arg(Arg::new("org").long("org").help("The organization"))
                .arg(Arg::new("repo").long("repo").help("The repository"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(PossibleValuesParser::new(
                            VersionBump::ALL.map(VersionBump::as_str),
                        ))
                        .help("Which part of the version to bump"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .short('m')
                        .help("What changed, in markdown"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show what would be dispatched without contacting GitHub"),
                )
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .action(ArgAction::SetTrue)
                        .help("Don't ask for confirmation, and don't offer to retry on failure"),
                ),
        )
}

/// Logs go to stderr, and only when asked for with `--verbose` or `RUST_LOG`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(format!("{}=debug", env!("CARGO_CRATE_NAME")))
    } else if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A session using the token from the environment if there is one, otherwise the stored one.
fn open_session(dir: &Path, config: AppConfig) -> Result<Session<Box<dyn CredentialStore>>, Error> {
    let from_env = env::var(app_config::TOKEN_VAR)
        .ok()
        .and_then(|raw| Token::new(&raw));
    let store: Box<dyn CredentialStore> = match from_env {
        Some(token) => {
            debug!("Using the token from {}", app_config::TOKEN_VAR);
            Box::new(MemoryCredentialStore::with_token(token))
        }
        None => Box::new(FileCredentialStore::in_dir(dir)),
    };
    Ok(Session::start(store, config)?)
}

async fn login(dir: &Path, config: AppConfig, args: &ArgMatches) -> Result<(), Error> {
    let mut session = Session::start(FileCredentialStore::in_dir(dir), config)?;
    let raw = match args.get_one::<String>("token") {
        Some(token) => token.clone(),
        None => prompt::get_secret("GitHub token:", TOKEN_HELP)?,
    };
    let token = Token::new(&raw).ok_or(Error::TokenRequired)?;
    let login = session.authenticate(token).await?;
    println!("GitHub token validated successfully, logged in as {login}");
    Ok(())
}

fn logout(dir: &Path, config: AppConfig) -> Result<(), Error> {
    let mut session = Session::start(FileCredentialStore::in_dir(dir), config)?;
    session.logout()?;
    println!("Logged out");
    Ok(())
}

async fn list_organizations(dir: &Path, config: AppConfig) -> Result<(), Error> {
    let mut session = open_session(dir, config)?;
    for organization in session.organizations().await? {
        println!("{organization}");
    }
    Ok(())
}

async fn list_repositories(dir: &Path, config: AppConfig, args: &ArgMatches) -> Result<(), Error> {
    let mut session = open_session(dir, config)?;
    let organization = args.get_one::<String>("org").map_or("", String::as_str);
    let repositories = session
        .repositories(organization)
        .await?
        .ok_or(release::InvalidRequest::Organization)?;
    if repositories.is_empty() {
        println!("No repositories with release workflow found");
    }
    for repository in repositories {
        println!("{repository}");
    }
    Ok(())
}

async fn release(dir: &Path, config: AppConfig, args: &ArgMatches) -> Result<(), Error> {
    let mut session = open_session(dir, config)?;
    if !session.is_authenticated() {
        return Err(session::Error::NotLoggedIn.into());
    }
    let assume_yes = args.get_flag("yes");

    let organization = match args.get_one::<String>("org") {
        Some(organization) => organization.clone(),
        None => {
            let organizations = session.organizations().await?;
            if organizations.is_empty() {
                return Err(Error::NoOrganizations);
            }
            prompt::select(organizations, "Organization:")?.value
        }
    };
    let repository = match args.get_one::<String>("repo") {
        Some(repository) => repository.clone(),
        None => choose_repository(&mut session, &organization).await?,
    };
    let bump = match args.get_one::<String>("type") {
        Some(bump) => bump.parse::<VersionBump>()?,
        None => prompt::select_with_default(VersionBump::ALL.to_vec(), 0, "Version type:")?,
    };
    let description = match args.get_one::<String>("description") {
        Some(description) => description.clone(),
        None => prompt::get_long_text("Change description:", "")?,
    };
    let request = ReleaseRequest::new(&organization, &repository, bump, &description)?;

    let config = session.config();
    let summary = release::describe(&request, &config.workflow, &config.reference);
    if args.get_flag("dry-run") {
        println!("Would run {summary}");
        println!("Description:\n{}", request.description);
        return Ok(());
    }
    if !assume_yes && !prompt::confirm(&format!("Run {summary}?"))? {
        return Err(Error::Cancelled);
    }

    loop {
        match session.submit(&request).await {
            Ok(()) => {
                println!(
                    "Release PR requested for {}/{}",
                    request.organization, request.repository
                );
                return Ok(());
            }
            Err(err) => {
                if assume_yes {
                    return Err(err.into());
                }
                eprintln!("{err}");
                if !prompt::confirm("Try again with the same inputs?")? {
                    return Err(err.into());
                }
            }
        }
    }
}

async fn choose_repository<S: CredentialStore>(
    session: &mut Session<S>,
    organization: &str,
) -> Result<String, Error> {
    if session.select_organization(organization).await? == ViewUpdate::Disabled {
        return Err(release::InvalidRequest::Organization.into());
    }
    let repositories = session
        .view()
        .and_then(RepositoryView::repositories)
        .map(<[Choice]>::to_vec)
        .unwrap_or_default();
    if repositories.is_empty() {
        return Err(Error::NoEligibleRepositories {
            organization: organization.to_string(),
        });
    }
    let choice = prompt::select(repositories, "Repository:")?;
    session.select_repository(&choice.value)?;
    Ok(choice.value)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum Error {
    #[error("A GitHub token is required")]
    #[diagnostic(code(login::token_required), help("The token needs repository and workflow permissions."))]
    TokenRequired,
    #[error("You don't belong to any organizations")]
    #[diagnostic(
        code(release::no_organizations),
        help("Pass --org to release a repository of an organization the token can see.")
    )]
    NoOrganizations,
    #[error("No repositories with release workflow found in {organization}")]
    #[diagnostic(
        code(release::no_eligible_repositories),
        help("Only repositories with the changeset release workflow file can be released.")
    )]
    NoEligibleRepositories { organization: String },
    #[error("Release cancelled")]
    #[diagnostic(code(release::cancelled))]
    Cancelled,
    #[error(transparent)]
    #[diagnostic(transparent)]
    AppConfig(#[from] app_config::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] session::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidRequest(#[from] release::InvalidRequest),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] prompt::Error),
}
