//! Asynchronous domain verification registry
//!
//! `DnsVerifier` owns the set of domains awaiting verification against the
//! email-delivery provider. A lazily started background task polls the
//! provider with exponential backoff until each domain is verified or its
//! completion budget runs out, then fires exactly one callback per domain.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mailrail_email::EmailDeliveryPort;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Callback invoked when a domain becomes verified
pub type CompletionCallback = Box<dyn Fn(&str) + Send + Sync>;
/// Callback invoked when verification gives up, with a failure message
pub type ErrorCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Internal state of a tracked domain
///
/// `Verified`, `Failed` and `Expired` are terminal: the scheduler never
/// transitions an entry out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
    Expired,
}

impl VerificationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Failed => write!(f, "failed"),
            VerificationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Externally visible status of a tracked domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Pending,
    Verified,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Pending => write!(f, "pending"),
            DomainStatus::Verified => write!(f, "verified"),
        }
    }
}

/// Scheduling and backoff configuration
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Base period of the verification cycle
    pub check_interval: Duration,
    /// Backoff delay before the second attempt
    pub base_delay: Duration,
    /// Backoff cap
    pub max_delay: Duration,
    /// Budget after which a still-pending domain is abandoned
    pub max_completion_time: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(10),
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(300),
            max_completion_time: Duration::from_secs(600),
        }
    }
}

/// Exponential backoff: `min(base_delay * 1.5^(attempts - 1), max_delay)`.
///
/// This is the minimum spacing between successive checks for a domain, not
/// a fixed schedule; a domain is only checked once a cycle finds its
/// elapsed time clears this threshold.
fn backoff_delay(attempts: u32, config: &VerifierConfig) -> Duration {
    let factor = 1.5f64.powi(attempts.saturating_sub(1).min(i32::MAX as u32) as i32);
    let delay = config.base_delay.as_secs_f64() * factor;
    Duration::from_secs_f64(delay.min(config.max_delay.as_secs_f64()))
}

/// One domain under active verification
pub struct PendingVerification {
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
    /// Counts the implicit first check made at registration time
    pub attempts: u32,
    pub status: VerificationStatus,
    pub last_error: Option<String>,
    on_complete: Option<CompletionCallback>,
    on_error: Option<ErrorCallback>,
}

impl PendingVerification {
    fn new(
        domain: &str,
        on_complete: Option<CompletionCallback>,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.to_string(),
            created_at: now,
            last_attempt_at: now,
            attempts: 1,
            status: VerificationStatus::Pending,
            last_error: None,
            on_complete,
            on_error,
        }
    }

    /// Whether the scheduler should keep retrying this entry.
    ///
    /// Flips the entry to `Expired` once its completion budget (measured
    /// from creation) is exhausted.
    fn should_retry(&mut self, now: DateTime<Utc>, max_completion_time: Duration) -> bool {
        if self.status != VerificationStatus::Pending {
            return false;
        }

        let age = (now - self.created_at).to_std().unwrap_or_default();
        if age > max_completion_time {
            self.status = VerificationStatus::Expired;
            return false;
        }

        true
    }

    fn next_delay(&self, config: &VerifierConfig) -> Duration {
        backoff_delay(self.attempts, config)
    }
}

impl std::fmt::Debug for PendingVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingVerification")
            .field("domain", &self.domain)
            .field("created_at", &self.created_at)
            .field("last_attempt_at", &self.last_attempt_at)
            .field("attempts", &self.attempts)
            .field("status", &self.status)
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Running,
}

struct VerifierInner {
    pending: HashMap<String, PendingVerification>,
    scheduler: SchedulerState,
    task_handle: Option<JoinHandle<()>>,
}

/// Registry of domains awaiting verification
///
/// The inner mutex guards map membership and entry bookkeeping only; it is
/// never held across provider calls or callback invocations.
#[derive(Clone)]
pub struct DnsVerifier {
    email_delivery: Arc<dyn EmailDeliveryPort>,
    config: Arc<VerifierConfig>,
    inner: Arc<Mutex<VerifierInner>>,
    shutdown_token: CancellationToken,
}

impl DnsVerifier {
    pub fn new(email_delivery: Arc<dyn EmailDeliveryPort>) -> Self {
        Self::with_config(email_delivery, VerifierConfig::default())
    }

    pub fn with_config(email_delivery: Arc<dyn EmailDeliveryPort>, config: VerifierConfig) -> Self {
        Self {
            email_delivery,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(VerifierInner {
                pending: HashMap::new(),
                scheduler: SchedulerState::Idle,
                task_handle: None,
            })),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Track a domain for verification.
    ///
    /// Returns `true` if the domain is now pending: either a new entry was
    /// created (starting the scheduler if needed) or an existing pending
    /// entry had its callbacks replaced. Returns `false` if the domain was
    /// already resolved (`Verified`/`Failed`) or the verifier has been shut
    /// down; resolved domains are not re-verified. An `Expired` entry is
    /// replaced by a fresh one.
    pub async fn add_pending_verification(
        &self,
        domain: &str,
        on_complete: Option<CompletionCallback>,
        on_error: Option<ErrorCallback>,
    ) -> bool {
        // After shutdown no scheduler will ever run again, so accepting the
        // entry would strand it unresolved and unnotified
        if self.shutdown_token.is_cancelled() {
            warn!(
                "Rejecting verification of {}: verifier is shut down",
                domain
            );
            return false;
        }

        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.pending.get_mut(domain) {
            match existing.status {
                VerificationStatus::Verified | VerificationStatus::Failed => {
                    warn!(
                        "Domain {} already processed with status {}",
                        domain, existing.status
                    );
                    return false;
                }
                VerificationStatus::Pending => {
                    if let Some(cb) = on_complete {
                        existing.on_complete = Some(cb);
                    }
                    if let Some(cb) = on_error {
                        existing.on_error = Some(cb);
                    }
                    debug!("Updated callbacks for pending domain {}", domain);
                    return true;
                }
                // An expired entry may be retried with a fresh budget
                VerificationStatus::Expired => {}
            }
        }

        inner.pending.insert(
            domain.to_string(),
            PendingVerification::new(domain, on_complete, on_error),
        );
        info!("Added domain {} for DNS verification", domain);

        self.ensure_scheduler_running(&mut inner);
        true
    }

    /// Remove a domain from verification (e.g. if the caller cancels).
    ///
    /// No callback fires for a removed entry.
    pub async fn remove_domain(&self, domain: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.pending.remove(domain).is_some() {
            info!("Removed domain {} from verification", domain);
            true
        } else {
            false
        }
    }

    /// Status of a tracked domain; `None` if the domain is unknown.
    pub async fn get_domain_status(&self, domain: &str) -> Option<DomainStatus> {
        let inner = self.inner.lock().await;
        inner.pending.get(domain).map(|entry| match entry.status {
            VerificationStatus::Verified => DomainStatus::Verified,
            _ => DomainStatus::Pending,
        })
    }

    /// Number of tracked domains (any status).
    pub async fn tracked_count(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    /// Stop the scheduler and notify all still-pending domains.
    ///
    /// Waits at most `timeout` for an in-flight cycle to finish, then
    /// best-effort invokes `on_error` once per pending entry.
    pub async fn shutdown(&self, timeout: Duration) {
        info!("Shutting down DNS verifier");
        self.shutdown_token.cancel();

        let handle = self.inner.lock().await.task_handle.take();
        if let Some(handle) = handle {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!(
                    "DNS verification scheduler did not stop within {:?}",
                    timeout
                );
            }
        }

        let mut to_notify = Vec::new();
        {
            let mut inner = self.inner.lock().await;
            for (domain, entry) in inner.pending.iter_mut() {
                if entry.status == VerificationStatus::Pending {
                    entry.on_complete = None;
                    if let Some(cb) = entry.on_error.take() {
                        to_notify.push((domain.clone(), cb));
                    }
                }
            }
        }

        for (domain, cb) in to_notify {
            if catch_unwind(AssertUnwindSafe(|| cb(&domain, "DNS verifier shutting down"))).is_err()
            {
                error!("Error callback panicked during shutdown for {}", domain);
            }
        }

        info!("DNS verifier shutdown complete");
    }

    fn ensure_scheduler_running(&self, inner: &mut VerifierInner) {
        if inner.scheduler == SchedulerState::Running || self.shutdown_token.is_cancelled() {
            return;
        }

        inner.scheduler = SchedulerState::Running;

        let verifier = self.clone();
        inner.task_handle = Some(tokio::spawn(async move {
            verifier.run_scheduler().await;
        }));

        debug!(
            "Started DNS verification scheduler (interval {:?})",
            self.config.check_interval
        );
    }

    async fn run_scheduler(self) {
        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.check_interval) => {}
            }

            self.run_cycle().await;

            let mut inner = self.inner.lock().await;
            let pending_remaining = inner
                .pending
                .values()
                .any(|p| p.status == VerificationStatus::Pending);

            if !pending_remaining {
                inner.scheduler = SchedulerState::Idle;
                info!("Stopped DNS verification scheduler (no pending domains)");
                return;
            }
        }

        let mut inner = self.inner.lock().await;
        inner.scheduler = SchedulerState::Idle;
    }

    /// One verification cycle: collect due domains, check them against the
    /// provider, dispatch outcome callbacks.
    async fn run_cycle(&self) {
        let now = Utc::now();
        let mut due = Vec::new();
        let mut failed: Vec<(String, String)> = Vec::new();

        {
            let mut inner = self.inner.lock().await;
            for (domain, entry) in inner.pending.iter_mut() {
                let was_pending = entry.status == VerificationStatus::Pending;

                if !entry.should_retry(now, self.config.max_completion_time) {
                    // Entries that ran out of budget while waiting for their
                    // backoff window still get their error notification
                    if was_pending && entry.status == VerificationStatus::Expired {
                        failed.push((
                            domain.clone(),
                            format!("Domain verification expired for {}", domain),
                        ));
                    }
                    continue;
                }

                let since_last = (now - entry.last_attempt_at).to_std().unwrap_or_default();
                if since_last >= entry.next_delay(&self.config) {
                    entry.attempts += 1;
                    entry.last_attempt_at = now;
                    due.push(domain.clone());
                }
            }
        }

        let mut completed = Vec::new();

        // Provider calls happen outside the lock so slow round-trips never
        // block new registrations
        for domain in due {
            debug!("Verifying domain {}", domain);
            let result = self.email_delivery.verify_domain(&domain).await;

            let mut inner = self.inner.lock().await;
            let Some(entry) = inner.pending.get_mut(&domain) else {
                // Removed while the provider call was in flight
                continue;
            };
            if entry.status != VerificationStatus::Pending {
                continue;
            }

            match result {
                Ok(true) => {
                    entry.status = VerificationStatus::Verified;
                    info!("Domain {} verified successfully", domain);
                    completed.push(domain.clone());
                }
                Ok(false) => {
                    entry.last_error = Some("Domain verification failed".to_string());
                }
                Err(e) => {
                    error!("Error verifying domain {}: {}", domain, e);
                    entry.last_error = Some(e.to_string());
                }
            }

            // A single failed check does not fail the domain; only running
            // out of the completion budget does
            if entry.status == VerificationStatus::Pending
                && !entry.should_retry(Utc::now(), self.config.max_completion_time)
            {
                let message = match entry.status {
                    VerificationStatus::Expired => {
                        format!("Domain verification expired for {}", domain)
                    }
                    _ => format!(
                        "Domain verification failed for {}: {}",
                        domain,
                        entry.last_error.as_deref().unwrap_or("unknown error")
                    ),
                };
                failed.push((domain.clone(), message));
            }
        }

        self.dispatch_outcomes(completed, failed).await;
    }

    /// Hand each resolved domain its single notification.
    ///
    /// Callbacks are taken out of the entry under the lock and invoked
    /// outside it, so each entry notifies at most once and never both ways.
    async fn dispatch_outcomes(&self, completed: Vec<String>, failed: Vec<(String, String)>) {
        let mut to_complete = Vec::new();
        let mut to_fail = Vec::new();

        {
            let mut inner = self.inner.lock().await;

            for domain in completed {
                if let Some(entry) = inner.pending.get_mut(&domain) {
                    entry.on_error = None;
                    if let Some(cb) = entry.on_complete.take() {
                        to_complete.push((domain, cb));
                    }
                }
            }

            for (domain, message) in failed {
                if let Some(entry) = inner.pending.get_mut(&domain) {
                    warn!("{}", message);
                    entry.on_complete = None;
                    if let Some(cb) = entry.on_error.take() {
                        to_fail.push((domain, message, cb));
                    }
                }
            }
        }

        for (domain, cb) in to_complete {
            if catch_unwind(AssertUnwindSafe(|| cb(&domain))).is_err() {
                error!("Completion callback panicked for {}", domain);
            }
        }

        for (domain, message, cb) in to_fail {
            if catch_unwind(AssertUnwindSafe(|| cb(&domain, &message))).is_err() {
                error!("Error callback panicked for {}", domain);
            }
        }
    }
}
