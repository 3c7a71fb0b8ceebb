use std::future::Future;

use futures::StreamExt;
use reclaim_core::RemediationResult;

/// Run one remediation attempt per id and return the results in input order.
///
/// Attempts are independent: up to `concurrency` run at once and a failed
/// attempt never stops the others. Duplicated ids are attempted once per
/// occurrence. The output always has exactly one entry per input id.
pub async fn remediate_in_order<F, Fut>(
    resource_ids: &[String],
    concurrency: usize,
    remediate: F,
) -> Vec<RemediationResult>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = RemediationResult>,
{
    let attempts: Vec<Fut> = resource_ids.iter().cloned().map(remediate).collect();
    futures::stream::iter(attempts)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn empty_input_gives_empty_output() {
        let results =
            remediate_in_order(&[], 4, |id| async move { RemediationResult::success(id, "ok") })
                .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn order_follows_input_not_completion() {
        // Earlier ids sleep longer so they complete last.
        let input = ids(&["slow", "medium", "fast"]);
        let results = remediate_in_order(&input, 3, |id| async move {
            let delay = match id.as_str() {
                "slow" => 30,
                "medium" => 15,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            RemediationResult::success(id, "done")
        })
        .await;

        let out: Vec<_> = results.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(out, ["slow", "medium", "fast"]);
    }

    #[tokio::test]
    async fn duplicates_and_failures_are_each_reported() {
        let input = ids(&["a", "missing", "a"]);
        let results = remediate_in_order(&input, 1, |id| async move {
            if id == "missing" {
                RemediationResult::failed(id, "not found")
            } else {
                RemediationResult::success(id, "deleted")
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[2].is_success());
        assert_eq!(results[2].resource_id, "a");
    }
}
