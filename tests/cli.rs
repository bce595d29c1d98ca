use std::{fs, path::Path};

use mockito::{Matcher, Server, ServerGuard};
use snapbox::cmd::{Command, cargo_bin};

fn release_trigger(config_dir: &Path) -> Command {
    Command::new(cargo_bin!("release-trigger"))
        .env("RELEASE_TRIGGER_CONFIG_DIR", config_dir)
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
}

fn point_at(server: &ServerGuard, config_dir: &Path) {
    fs::write(
        config_dir.join("config.toml"),
        format!("api_url = \"{}\"\n", server.url()),
    )
    .unwrap();
}

#[test]
fn logout_without_token() {
    let dir = tempfile::tempdir().unwrap();

    release_trigger(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout_eq("Logged out\n");
}

#[test]
fn orgs_requires_login() {
    let dir = tempfile::tempdir().unwrap();

    release_trigger(dir.path()).arg("orgs").assert().failure();
}

#[test]
fn dry_run_shows_dispatch() {
    let dir = tempfile::tempdir().unwrap();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args([
            "release",
            "--org",
            "acme",
            "--repo",
            "widget",
            "--type",
            "minor",
            "--description",
            "Add X",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout_eq(
            "Would run changeset-release.yml on acme/widget@develop with type=minor\nDescription:\nAdd X\n",
        );
}

#[test]
fn unknown_version_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args(["release", "--type", "huge", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn blank_description_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args([
            "release", "--org", "acme", "--repo", "widget", "--type", "patch", "-m", "  ",
            "--dry-run",
        ])
        .assert()
        .failure();
}

#[test]
fn login_stores_validated_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let identity = server
        .mock("GET", "/user")
        .match_header("authorization", "Bearer ghp_valid")
        .with_status(200)
        .with_body(r#"{"login": "octocat"}"#)
        .create();

    release_trigger(dir.path())
        .args(["login", "--token", "ghp_valid"])
        .assert()
        .success()
        .stdout_eq("GitHub token validated successfully, logged in as octocat\n");

    identity.assert();
    assert_eq!(
        fs::read_to_string(dir.path().join("github_token")).unwrap(),
        "ghp_valid"
    );
}

#[test]
fn login_with_rejected_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let _identity = server
        .mock("GET", "/user")
        .with_status(401)
        .with_body(r#"{"message": "Bad credentials"}"#)
        .create();

    release_trigger(dir.path())
        .args(["login", "--token", "ghp_bad"])
        .assert()
        .failure();

    assert!(!dir.path().join("github_token").exists());
}

#[test]
fn repos_lists_only_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let _listing = server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"name": "widget"}, {"name": "docs"}, {"name": "gadget"}]"#)
        .create();
    let _widget = server
        .mock(
            "GET",
            "/repos/acme/widget/contents/.github/workflows/changeset-release.yml",
        )
        .with_status(200)
        .create();
    let _docs = server
        .mock(
            "GET",
            "/repos/acme/docs/contents/.github/workflows/changeset-release.yml",
        )
        .with_status(404)
        .create();
    let _gadget = server
        .mock(
            "GET",
            "/repos/acme/gadget/contents/.github/workflows/changeset-release.yml",
        )
        .with_status(200)
        .create();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args(["repos", "acme"])
        .assert()
        .success()
        .stdout_eq("widget\ngadget\n");
}

#[test]
fn repos_reports_when_none_are_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let _listing = server
        .mock("GET", "/orgs/acme/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"name": "docs"}]"#)
        .create();
    let _docs = server
        .mock(
            "GET",
            "/repos/acme/docs/contents/.github/workflows/changeset-release.yml",
        )
        .with_status(404)
        .create();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args(["repos", "acme"])
        .assert()
        .success()
        .stdout_eq("No repositories with release workflow found\n");
}

#[test]
fn release_dispatches_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let dispatch = server
        .mock(
            "POST",
            "/repos/acme/widget/actions/workflows/changeset-release.yml/dispatches",
        )
        .match_body(Matcher::Json(serde_json::json!({
            "ref": "develop",
            "inputs": {"type": "minor", "description": "Add X"}
        })))
        .with_status(204)
        .expect(1)
        .create();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args([
            "release", "--org", "acme", "--repo", "widget", "--type", "minor", "-m", "Add X",
            "--yes",
        ])
        .assert()
        .success()
        .stdout_eq("Release PR requested for acme/widget\n");

    dispatch.assert();
}

#[test]
fn failed_release_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    point_at(&server, dir.path());
    let _dispatch = server
        .mock(
            "POST",
            "/repos/acme/widget/actions/workflows/changeset-release.yml/dispatches",
        )
        .with_status(422)
        .with_body(r#"{"message": "Workflow does not have 'workflow_dispatch' trigger"}"#)
        .create();

    release_trigger(dir.path())
        .env("GITHUB_TOKEN", "ghp_test")
        .args([
            "release", "--org", "acme", "--repo", "widget", "--type", "patch", "-m", "fix",
            "--yes",
        ])
        .assert()
        .failure();
}
