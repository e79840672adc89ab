use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerError, ledger::Ledger, requests::LedgerRequest, responses::LedgerReply,
};

pub const DEFAULT_READ_ATTEMPTS: u32 = 3;
pub const DEFAULT_READ_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    Fixed,
    Exponential { factor: u32, max_delay: Duration },
}

/// How many times, and how far apart, an eventually-consistent read is retried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, delay: Duration, factor: u32, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Exponential { factor, max_delay },
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_attempts == 0 {
            return Err(LedgerError::InvalidRetryPolicy("max_attempts must be at least 1"));
        }
        if let Backoff::Exponential { factor, .. } = self.backoff {
            if factor == 0 {
                return Err(LedgerError::InvalidRetryPolicy("backoff factor must be at least 1"));
            }
        }
        Ok(())
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max_delay } => {
                let multiplier = factor.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(multiplier).min(max_delay)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_READ_ATTEMPTS, DEFAULT_READ_DELAY)
    }
}

/// Submit a read until `checker` accepts the reply, tolerating replication lag.
///
/// Returns the first accepted reply; nothing is submitted after it. A reply the
/// checker rejects counts as "not yet applied". Submission errors are returned
/// straight away. Once `policy.max_attempts` replies have been rejected the read
/// fails with [LedgerError::ReadExhausted].
pub async fn ensure_previous_request_applied<L, F>(
    ledger: &L,
    request: &LedgerRequest,
    policy: &RetryPolicy,
    checker: F,
) -> Result<LedgerReply, LedgerError>
where
    L: Ledger + ?Sized,
    F: Fn(&LedgerReply) -> bool,
{
    policy.validate()?;

    for attempt in 1..=policy.max_attempts {
        let reply = ledger.submit_request(request).await?;
        if checker(&reply) {
            return Ok(reply);
        }

        if attempt < policy.max_attempts {
            let delay = policy.delay_after_attempt(attempt);
            tracing::debug!(
                txn = request.operation.txn_name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "ledger read not yet applied, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    tracing::warn!(
        txn = request.operation.txn_name(),
        attempts = policy.max_attempts,
        "ledger read exhausted"
    );
    Err(LedgerError::ReadExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::{
        requests::build_get_schema_request,
        responses::{LedgerReply, ReplyResult},
    };

    /// Answers with empty data until `ready_on` submissions have been made.
    struct FlakyLedger {
        calls: AtomicU32,
        ready_on: u32,
    }

    impl FlakyLedger {
        fn ready_on(ready_on: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                ready_on,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Ledger for FlakyLedger {
        async fn submit_request(
            &self,
            request: &LedgerRequest,
        ) -> Result<LedgerReply, LedgerError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let data = (call >= self.ready_on).then(|| json!({ "call": call }));
            Ok(LedgerReply {
                op: "REPLY".to_owned(),
                result: ReplyResult {
                    txn_type: "107".to_owned(),
                    req_id: request.req_id,
                    identifier: None,
                    id: Some("schema".to_owned()),
                    data,
                    seq_no: None,
                    txn_time: None,
                },
            })
        }
    }

    struct BrokenLedger;

    #[async_trait]
    impl Ledger for BrokenLedger {
        async fn submit_request(&self, _: &LedgerRequest) -> Result<LedgerReply, LedgerError> {
            Err(LedgerError::Rejected("pool unreachable".to_owned()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_satisfying_reply() {
        let ledger = FlakyLedger::ready_on(2);
        let request = build_get_schema_request(None, "schema");

        let reply = ensure_previous_request_applied(
            &ledger,
            &request,
            &RetryPolicy::default(),
            LedgerReply::has_data,
        )
        .await
        .unwrap();

        assert_eq!(reply.result.data.unwrap()["call"], 2);
        assert_eq!(ledger.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exact_attempt_count() {
        let ledger = FlakyLedger::ready_on(u32::MAX);
        let request = build_get_schema_request(None, "schema");
        let started = Instant::now();

        let result = ensure_previous_request_applied(
            &ledger,
            &request,
            &RetryPolicy::default(),
            LedgerReply::has_data,
        )
        .await;

        assert!(matches!(result, Err(LedgerError::ReadExhausted { attempts: 3 })));
        assert_eq!(ledger.calls(), 3);
        // two waits between three attempts, none after the last
        assert_eq!(started.elapsed(), DEFAULT_READ_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_timing() {
        let ledger = FlakyLedger::ready_on(4);
        let request = build_get_schema_request(None, "schema");
        let policy =
            RetryPolicy::exponential(5, Duration::from_secs(1), 2, Duration::from_secs(3));
        let started = Instant::now();

        ensure_previous_request_applied(&ledger, &request, &policy, LedgerReply::has_data)
            .await
            .unwrap();

        // 1s + 2s + min(4s, 3s)
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(ledger.calls(), 4);
    }

    #[tokio::test]
    async fn test_submission_errors_are_not_retried() {
        let request = build_get_schema_request(None, "schema");
        let result = ensure_previous_request_applied(
            &BrokenLedger,
            &request,
            &RetryPolicy::default(),
            LedgerReply::has_data,
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_zero_attempt_policy_rejected() {
        let ledger = FlakyLedger::ready_on(1);
        let request = build_get_schema_request(None, "schema");
        let policy = RetryPolicy::fixed(0, Duration::ZERO);

        let result =
            ensure_previous_request_applied(&ledger, &request, &policy, LedgerReply::has_data)
                .await;
        assert!(matches!(result, Err(LedgerError::InvalidRetryPolicy(_))));
        assert_eq!(ledger.calls(), 0);
    }

    #[test]
    fn test_delay_schedule() {
        let fixed = RetryPolicy::default();
        assert_eq!(fixed.delay_after_attempt(1), DEFAULT_READ_DELAY);
        assert_eq!(fixed.delay_after_attempt(7), DEFAULT_READ_DELAY);

        let expo = RetryPolicy::exponential(10, Duration::from_millis(100), 3, Duration::from_secs(1));
        assert_eq!(expo.delay_after_attempt(1), Duration::from_millis(100));
        assert_eq!(expo.delay_after_attempt(2), Duration::from_millis(300));
        assert_eq!(expo.delay_after_attempt(3), Duration::from_millis(900));
        assert_eq!(expo.delay_after_attempt(4), Duration::from_secs(1));
    }
}
