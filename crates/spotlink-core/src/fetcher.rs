//! Resilient single-request fetcher.
//!
//! One logical request is retried on HTTP 429, HTTP 5xx and transport
//! failures, up to the policy's attempt budget. Every other status is handed
//! back untouched for the caller to interpret.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLog, ActivityRecord};
use crate::error::MarketDataError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::retry::{parse_retry_after, RetryPolicy};

#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    policy: RetryPolicy,
    activity: Arc<dyn ActivityLog>,
}

impl Fetcher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        policy: RetryPolicy,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            client,
            policy,
            activity,
        }
    }

    /// Performs `request` with retries.
    ///
    /// Returns the first response that is neither 429 nor 5xx, whatever its
    /// status. Fails with `RateLimited`, `Server` or `Network` once the final
    /// attempt fails, and with `Cancelled` as soon as `cancel` fires.
    pub async fn fetch(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, MarketDataError> {
        let url = request.full_url();
        let mut attempt = 0_u32;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(self.cancelled(&url, attempt)),
                outcome = self.client.execute(request.clone()) => outcome,
            };

            let wait = match outcome {
                Ok(response) if response.is_rate_limited() => {
                    let retry_after = response.header("retry-after").and_then(parse_retry_after);
                    if self.policy.is_final(attempt) {
                        self.activity.record(
                            ActivityRecord::error(format!(
                                "429 rate limited on {url}. giving up after {attempt} attempts"
                            ))
                            .with_extra("status", response.status)
                            .with_extra("retry_after", retry_after),
                        );
                        return Err(MarketDataError::RateLimited {
                            url,
                            retry_after,
                            attempts: attempt,
                        });
                    }
                    let wait = self.policy.rate_limit_delay(attempt, retry_after);
                    self.activity.record(
                        ActivityRecord::warn(format!(
                            "429 rate limited on {url}. attempt={attempt}. waiting {}s",
                            wait.as_secs_f64()
                        ))
                        .with_extra("attempt", attempt)
                        .with_extra("wait_secs", wait.as_secs_f64())
                        .with_extra("retry_after", retry_after),
                    );
                    wait
                }
                Ok(response) if response.is_server_error() => {
                    let status = response.status;
                    if self.policy.is_final(attempt) {
                        self.activity.record(
                            ActivityRecord::error(format!(
                                "Server error {status} on {url}. giving up after {attempt} attempts"
                            ))
                            .with_extra("status", status)
                            .with_extra("body", response.body),
                        );
                        return Err(MarketDataError::Server {
                            url,
                            status,
                            attempts: attempt,
                        });
                    }
                    let wait = self.policy.backoff(attempt);
                    self.activity.record(
                        ActivityRecord::warn(format!(
                            "Server error {status} on {url}. attempt={attempt}. waiting {}s",
                            wait.as_secs_f64()
                        ))
                        .with_extra("attempt", attempt)
                        .with_extra("wait_secs", wait.as_secs_f64()),
                    );
                    wait
                }
                Ok(response) => return Ok(response),
                Err(error) => {
                    if self.policy.is_final(attempt) {
                        self.activity.record(
                            ActivityRecord::error(format!(
                                "Request failed after {attempt} attempts for {url}."
                            ))
                            .with_extra("error", error.message())
                            .with_extra("kind", error.kind().as_str()),
                        );
                        return Err(MarketDataError::Network {
                            url,
                            message: error.message().to_owned(),
                            attempts: attempt,
                        });
                    }
                    let wait = self.policy.backoff(attempt);
                    self.activity.record(
                        ActivityRecord::warn(format!(
                            "Network error on {url}: {error}. attempt={attempt}. waiting {}s",
                            wait.as_secs_f64()
                        ))
                        .with_extra("attempt", attempt)
                        .with_extra("wait_secs", wait.as_secs_f64())
                        .with_extra("kind", error.kind().as_str()),
                    );
                    wait
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(self.cancelled(&url, attempt)),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }

    fn cancelled(&self, url: &str, attempt: u32) -> MarketDataError {
        self.activity.record(
            ActivityRecord::warn(format!("request cancelled on {url}. attempt={attempt}"))
                .with_extra("attempt", attempt),
        );
        MarketDataError::Cancelled
    }
}
