//! # Confirmation Poller
//!
//! Turns "submitted" into "confirmed" by polling transaction status with
//! exponential backoff, bounded by a retry budget.
//!
//! ```text
//!                 ┌──── TrustedCache (fast path, no network) ────┐
//!                 │                                              ▼
//! poll ──► Unconfirmed{n} ──status──► mined?  ──yes──► Confirmed(info)
//!               ▲                        │no / error
//!               └──── backoff(n) ◄── n+1 < budget
//!                                        │else
//!                                        ▼
//!                              Exhausted ─► ConfirmationTimeout
//! ```
//!
//! The fast path trusts a posted cache entry for the same transaction id as
//! proof of confirmation. That is the engine's optimistic-read assumption;
//! [`ConfirmationPoller::wait_until_mined`] skips it.

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PollConfig;
use crate::domain::{ConfirmationInfo, DocumentCache, DocumentSyncError};
use crate::ports::LedgerService;

/// How a poll concluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The cache already trusts this transaction; no status check was made.
    TrustedCache,
    /// The ledger reported the transaction mined.
    Mined(ConfirmationInfo),
}

impl PollOutcome {
    /// Mining details, when the ledger was asked.
    pub fn confirmation(&self) -> Option<&ConfirmationInfo> {
        match self {
            Self::TrustedCache => None,
            Self::Mined(info) => Some(info),
        }
    }
}

/// Poller state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollState {
    /// `attempt` status checks made so far.
    Unconfirmed {
        /// Checks made so far
        attempt: u32,
    },
    /// Mined.
    Confirmed(ConfirmationInfo),
    /// Retry budget spent.
    Exhausted {
        /// Checks made
        attempts: u32,
    },
}

/// Bounded exponential-backoff status poller.
#[derive(Clone, Debug)]
pub struct ConfirmationPoller {
    config: PollConfig,
}

impl ConfirmationPoller {
    /// Create a poller with the given backoff.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Delay after the `attempt`-th (0-based) unconfirmed check.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay = (self.config.initial_backoff_ms as f64) * self.config.multiplier.powi(exponent);
        let delay = delay.min(self.config.max_backoff_ms as f64);
        Duration::from_millis(delay as u64)
    }

    /// Wait for `transaction_id` to be mined, trusting the cache if it can.
    ///
    /// # Errors
    /// - `InvalidRequest` if there is no transaction id (never submitted)
    /// - `ConfirmationTimeout` once `max_retries` checks came back unmined
    pub async fn poll<L>(
        &self,
        ledger: &L,
        cache: &DocumentCache,
        transaction_id: Option<&str>,
        max_retries: u32,
    ) -> Result<PollOutcome, DocumentSyncError>
    where
        L: LedgerService + ?Sized,
    {
        let transaction_id = transaction_id.ok_or_else(|| {
            DocumentSyncError::InvalidRequest(
                "cannot poll a document that was never submitted".to_string(),
            )
        })?;

        if cache.is_valid_transaction(transaction_id, None) {
            debug!("[doc-sync] {} trusted from cache, skipping poll", transaction_id);
            return Ok(PollOutcome::TrustedCache);
        }

        self.wait_until_mined(ledger, transaction_id, max_retries)
            .await
            .map(PollOutcome::Mined)
    }

    /// Poll the ledger until mined, ignoring the cache.
    ///
    /// Status errors count as "not yet mined"; this loop is the engine's only
    /// retry policy. A budget of 0 is treated as 1.
    pub async fn wait_until_mined<L>(
        &self,
        ledger: &L,
        transaction_id: &str,
        max_retries: u32,
    ) -> Result<ConfirmationInfo, DocumentSyncError>
    where
        L: LedgerService + ?Sized,
    {
        let budget = max_retries.max(1);
        let mut last_error: Option<String> = None;
        let mut state = PollState::Unconfirmed { attempt: 0 };

        loop {
            state = match state {
                PollState::Unconfirmed { attempt } => {
                    let checked = attempt + 1;
                    match ledger.get_transaction_status(transaction_id).await {
                        Ok(status) => match status.confirmed {
                            Some(info) => PollState::Confirmed(info),
                            None => {
                                debug!(
                                    "[doc-sync] {} unconfirmed (status {}), attempt {}/{}",
                                    transaction_id, status.status, checked, budget
                                );
                                self.advance(checked, budget).await
                            }
                        },
                        Err(e) => {
                            warn!(
                                "[doc-sync] Status check for {} failed (attempt {}/{}): {}",
                                transaction_id, checked, budget, e
                            );
                            last_error = Some(e.to_string());
                            self.advance(checked, budget).await
                        }
                    }
                }
                PollState::Confirmed(info) => {
                    debug!(
                        "[doc-sync] {} mined at height {} ({} confirmations)",
                        transaction_id, info.height, info.confirmations
                    );
                    return Ok(info);
                }
                PollState::Exhausted { attempts } => {
                    return Err(DocumentSyncError::ConfirmationTimeout {
                        transaction_id: transaction_id.to_string(),
                        attempts,
                        last_error,
                    });
                }
            };
        }
    }

    async fn advance(&self, checked: u32, budget: u32) -> PollState {
        if checked >= budget {
            return PollState::Exhausted { attempts: checked };
        }
        tokio::time::sleep(self.backoff_for_attempt(checked - 1)).await;
        PollState::Unconfirmed { attempt: checked }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::domain::{Document, DocumentTags, Tag};

    fn fast_poller() -> ConfirmationPoller {
        ConfirmationPoller::new(PollConfig {
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
            multiplier: 2.0,
        })
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let poller = ConfirmationPoller::new(PollConfig {
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
            multiplier: 2.0,
        });
        assert_eq!(poller.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(poller.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(poller.backoff_for_attempt(3), Duration::from_millis(800));
        assert_eq!(poller.backoff_for_attempt(4), Duration::from_millis(1_000));
        assert_eq!(poller.backoff_for_attempt(40), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_poll_without_id_is_invalid() {
        let ledger = InMemoryLedger::new("admin");
        let cache = DocumentCache::new(4);
        let result = fast_poller().poll(&ledger, &cache, None, 3).await;
        assert!(matches!(result, Err(DocumentSyncError::InvalidRequest(_))));
        assert_eq!(ledger.status_check_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_trusted_cache_fast_path() {
        let ledger = InMemoryLedger::new("admin").with_auto_mine(false);
        let cache = DocumentCache::new(4);
        let mut doc = Document::new("doc", "v0", DocumentTags::new());
        doc.mark_posted("tx-cached".to_string());
        cache.put(&doc);

        let outcome = fast_poller()
            .poll(&ledger, &cache, Some("tx-cached"), 3)
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::TrustedCache);
        assert!(outcome.confirmation().is_none());
        assert_eq!(ledger.status_check_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_exhausts_after_exact_budget() {
        let ledger = InMemoryLedger::new("admin").with_auto_mine(false);
        let tx = ledger.inject_transaction("admin", b"{}".to_vec(), vec![], false);
        let cache = DocumentCache::new(0);

        let result = fast_poller().poll(&ledger, &cache, Some(tx.as_str()), 3).await;
        assert!(matches!(
            result,
            Err(DocumentSyncError::ConfirmationTimeout { attempts: 3, .. })
        ));
        assert_eq!(ledger.status_check_count(), 3);
    }

    #[tokio::test]
    async fn test_poll_confirms_mined_transaction() {
        let ledger = InMemoryLedger::new("admin");
        let tx = ledger.inject_transaction("admin", b"{}".to_vec(), vec![Tag::new("a", "b")], true);
        let cache = DocumentCache::new(4);

        let outcome = fast_poller().poll(&ledger, &cache, Some(tx.as_str()), 3).await.unwrap();
        let info = outcome.confirmation().unwrap();
        assert_eq!(info.confirmations, 1);
        assert_eq!(ledger.status_check_count(), 1);
    }

    #[tokio::test]
    async fn test_status_errors_are_retried_then_reported() {
        let ledger = InMemoryLedger::new("admin");
        ledger.fail_status_checks(true);

        let err = fast_poller()
            .wait_until_mined(&ledger, "tx-missing", 2)
            .await
            .unwrap_err();
        match err {
            DocumentSyncError::ConfirmationTimeout {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.status_check_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_budget_still_checks_once() {
        let ledger = InMemoryLedger::new("admin").with_auto_mine(false);
        let result = fast_poller().wait_until_mined(&ledger, "tx-unknown", 0).await;
        assert!(matches!(
            result,
            Err(DocumentSyncError::ConfirmationTimeout { attempts: 1, .. })
        ));
        assert_eq!(ledger.status_check_count(), 1);
    }
}
