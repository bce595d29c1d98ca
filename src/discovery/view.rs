use tracing::debug;

use super::Choice;

/// Identifies the organization a repository lookup was started for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupTag {
    organization: String,
}

impl LookupTag {
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }
}

/// What happened to a lookup result handed to [`RepositoryView::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewUpdate {
    Applied,
    /// The selection moved on before the result arrived.
    Discarded,
    /// No organization was selected, so nothing was looked up.
    Disabled,
}

/// The organization/repository selection and the repositories shown for it.
///
/// Lookups are tagged with the organization that was selected when they started, and a result is
/// only shown if that organization is still selected when it arrives.
#[derive(Debug, Default)]
pub struct RepositoryView {
    organization: Option<String>,
    repositories: Option<Vec<Choice>>,
    repository: Option<String>,
}

impl RepositoryView {
    /// Select `organization`, returning the tag for the lookup to run. Blank disables the lookup.
    ///
    /// Switching to a different organization clears the shown repositories and the chosen one.
    pub fn select_organization(&mut self, organization: &str) -> Option<LookupTag> {
        let organization = organization.trim();
        if self.organization.as_deref() != Some(organization) {
            self.repositories = None;
            self.repository = None;
        }
        if organization.is_empty() {
            self.organization = None;
            return None;
        }
        self.organization = Some(organization.to_string());
        Some(LookupTag {
            organization: organization.to_string(),
        })
    }

    /// Show `repositories` if `tag` still matches the selected organization.
    pub fn apply(&mut self, tag: LookupTag, repositories: Vec<Choice>) -> ViewUpdate {
        if self.organization.as_deref() != Some(tag.organization.as_str()) {
            debug!(
                "Dropping repositories of {}, selection has changed",
                tag.organization
            );
            return ViewUpdate::Discarded;
        }
        if let Some(repository) = &self.repository {
            if !repositories.iter().any(|choice| &choice.value == repository) {
                self.repository = None;
            }
        }
        self.repositories = Some(repositories);
        ViewUpdate::Applied
    }

    /// Choose one of the shown repositories. Returns `false` if it isn't one of them.
    pub fn select_repository(&mut self, repository: &str) -> bool {
        let known = self
            .repositories
            .as_ref()
            .is_some_and(|choices| choices.iter().any(|choice| choice.value == repository));
        if known {
            self.repository = Some(repository.to_string());
        }
        known
    }

    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// The repositories for the selected organization, once its lookup has been applied.
    #[must_use]
    pub fn repositories(&self) -> Option<&[Choice]> {
        self.repositories.as_deref()
    }

    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_repository_view {
    use pretty_assertions::assert_eq;

    use super::*;

    fn choices(names: &[&str]) -> Vec<Choice> {
        names.iter().map(|name| Choice::new(name)).collect()
    }

    #[test]
    fn applies_current_lookup() {
        let mut view = RepositoryView::default();
        let tag = view.select_organization("acme").unwrap();

        assert_eq!(view.apply(tag, choices(&["widget"])), ViewUpdate::Applied);
        assert_eq!(view.repositories(), Some(choices(&["widget"]).as_slice()));
    }

    #[test]
    fn superseded_lookup_is_discarded() {
        let mut view = RepositoryView::default();
        let for_acme = view.select_organization("acme").unwrap();
        let for_zeta = view.select_organization("zeta").unwrap();

        assert_eq!(view.apply(for_zeta, choices(&["rocket"])), ViewUpdate::Applied);
        assert_eq!(
            view.apply(for_acme, choices(&["widget"])),
            ViewUpdate::Discarded
        );
        assert_eq!(view.organization(), Some("zeta"));
        assert_eq!(view.repositories(), Some(choices(&["rocket"]).as_slice()));
    }

    #[test]
    fn late_result_for_old_org_never_shows() {
        let mut view = RepositoryView::default();
        let for_acme = view.select_organization("acme").unwrap();
        let _for_zeta = view.select_organization("zeta").unwrap();

        assert_eq!(
            view.apply(for_acme, choices(&["widget"])),
            ViewUpdate::Discarded
        );
        assert_eq!(view.repositories(), None);
    }

    #[test]
    fn blank_organization_disables_lookup() {
        let mut view = RepositoryView::default();
        let tag = view.select_organization("acme").unwrap();
        view.apply(tag, choices(&["widget"]));

        assert_eq!(view.select_organization("  "), None);
        assert_eq!(view.organization(), None);
        assert_eq!(view.repositories(), None);
    }

    #[test]
    fn switching_org_resets_repository() {
        let mut view = RepositoryView::default();
        let tag = view.select_organization("acme").unwrap();
        view.apply(tag, choices(&["widget"]));
        assert!(view.select_repository("widget"));

        view.select_organization("zeta");

        assert_eq!(view.repository(), None);
        assert_eq!(view.repositories(), None);
    }

    #[test]
    fn reselecting_same_org_keeps_selection() {
        let mut view = RepositoryView::default();
        let tag = view.select_organization("acme").unwrap();
        view.apply(tag, choices(&["widget"]));
        view.select_repository("widget");

        let tag = view.select_organization("acme").unwrap();
        view.apply(tag, choices(&["widget", "gadget"]));

        assert_eq!(view.repository(), Some("widget"));
    }

    #[test]
    fn unknown_repository_is_rejected() {
        let mut view = RepositoryView::default();
        let tag = view.select_organization("acme").unwrap();
        view.apply(tag, choices(&["widget"]));

        assert!(!view.select_repository("gadget"));
        assert_eq!(view.repository(), None);
    }
}
