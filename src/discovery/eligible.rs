use std::future::Future;

use tokio::task::JoinSet;
use tracing::warn;

use crate::integrations::github::{Eligibility, Repository};

/// Probe every repository at once and keep the eligible ones, in their original order.
///
/// Results are written back by listing index, so the order probes finish in doesn't matter.
/// A probe task that dies counts as not eligible.
pub(crate) async fn retain_eligible<F, Fut>(repositories: Vec<Repository>, probe: F) -> Vec<Repository>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Eligibility> + Send + 'static,
{
    let mut probes = JoinSet::new();
    for (index, repository) in repositories.iter().enumerate() {
        let outcome = probe(repository.name.clone());
        probes.spawn(async move { (index, outcome.await) });
    }

    let mut eligibility = vec![Eligibility::NotEligible; repositories.len()];
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                if let Some(slot) = eligibility.get_mut(index) {
                    *slot = outcome;
                }
            }
            Err(err) => warn!("A workflow probe did not finish: {err}"),
        }
    }

    repositories
        .into_iter()
        .zip(eligibility)
        .filter_map(|(repository, eligibility)| eligibility.is_eligible().then_some(repository))
        .collect()
}
