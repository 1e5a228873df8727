//! Concurrent dead-link checker.
//!
//! Sends a `HEAD` request to every bookmark URL with bounded concurrency and
//! streams one [`LinkResult`] per target as soon as it is known. Results
//! arrive in completion order, not target order.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::audit::{AuditTarget, LinkResult, LinkStatus};
use crate::types::errors::AuditError;
use crate::types::settings::AuditSettings;

/// Checks bookmark URLs over HTTP.
#[derive(Debug, Clone)]
pub struct LinkAuditor {
    client: reqwest::Client,
    workers: usize,
}

impl LinkAuditor {
    /// Builds the HTTP client from `settings`.
    ///
    /// After `max_redirects` hops the last redirect response is taken as the
    /// answer instead of failing the request.
    pub fn new(settings: &AuditSettings) -> Result<Self, AuditError> {
        let max_redirects = settings.max_redirects;
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(settings.user_agent.clone())
            .redirect(policy)
            .build()
            .map_err(|e| AuditError::Client(e.to_string()))?;

        Ok(Self {
            client,
            workers: settings.workers.max(1),
        })
    }

    /// Starts checking `targets` on the current tokio runtime.
    ///
    /// At most `workers` requests are in flight. The channel closes once
    /// every target has reported. Dropping the receiver stops new requests.
    pub fn audit(&self, targets: Vec<AuditTarget>) -> mpsc::Receiver<LinkResult> {
        let (tx, rx) = mpsc::channel(self.workers.max(16));
        let client = self.client.clone();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let total = targets.len();

        tokio::spawn(async move {
            let mut handles = Vec::with_capacity(total);
            for target in targets {
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                if tx.is_closed() {
                    debug!("audit receiver dropped, stopping");
                    break;
                }
                let client = client.clone();
                let tx = tx.clone();
                handles.push(tokio::spawn(async move {
                    let result = check_link(&client, target).await;
                    drop(permit);
                    let _ = tx.send(result).await;
                }));
            }
            for handle in handles {
                let _ = handle.await;
            }
            info!(targets = total, "link audit finished");
        });

        rx
    }

    /// Checks every target and collects the results in completion order.
    pub async fn audit_all(&self, targets: Vec<AuditTarget>) -> Vec<LinkResult> {
        let mut rx = self.audit(targets);
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }
}

async fn check_link(client: &reqwest::Client, target: AuditTarget) -> LinkResult {
    let (status, status_code) = if target.url.trim().is_empty() {
        (LinkStatus::Dead, None)
    } else {
        match client.head(&target.url).send().await {
            Ok(resp) => {
                let code = resp.status().as_u16();
                let status = if code >= 400 {
                    LinkStatus::Dead
                } else {
                    LinkStatus::Alive
                };
                (status, Some(code))
            }
            Err(e) if e.is_timeout() => (LinkStatus::TimedOut, None),
            Err(e) => {
                debug!(url = %target.url, error = %e, "link check failed");
                (LinkStatus::Dead, None)
            }
        }
    };

    LinkResult {
        node: target.node,
        url: target.url,
        status,
        status_code,
    }
}

/// Every bookmark with an `http` or `https` URL, in display order.
pub fn targets_from_tree(tree: &BookmarkTree) -> Vec<AuditTarget> {
    tree.walk()
        .into_iter()
        .filter_map(|node| {
            let url = node.url()?;
            let lower = url.to_ascii_lowercase();
            (lower.starts_with("http://") || lower.starts_with("https://")).then(|| AuditTarget {
                node: node.id,
                title: node.title.clone(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Results that are dead or timed out.
pub fn dead_links(results: &[LinkResult]) -> Vec<&LinkResult> {
    results
        .iter()
        .filter(|r| matches!(r.status, LinkStatus::Dead | LinkStatus::TimedOut))
        .collect()
}
