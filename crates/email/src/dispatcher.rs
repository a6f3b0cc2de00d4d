//! Verification-email delivery pipeline
//!
//! A fixed-capacity job queue drained by a fixed pool of workers, started
//! once at process initialization. Callers enqueue with a bounded wait and
//! get a boolean back: `false` means the queue stayed saturated for the whole
//! enqueue window and the caller should fall back to a synchronous
//! best-effort send. The pipeline never blocks a caller indefinitely and
//! never drops a job silently.
//!
//! Workers retry failed sends with exponential backoff (1s base, doubling).
//! No distinction is made between permanent and transient delivery failures;
//! every failure is retried identically until the attempts are exhausted,
//! at which point the job is logged as a terminal failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::{EmailError, EmailService};

/// Delivery pipeline sizing and timeouts.
///
/// Every field falls back to a safe default when the environment leaves it
/// unset or non-positive.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Bounded queue capacity
    pub queue_capacity: usize,
    /// Number of worker tasks
    pub workers: usize,
    /// Send attempts per job before recording a terminal failure
    pub max_attempts: u32,
    /// How long `enqueue` may wait for queue space
    pub enqueue_timeout: Duration,
    /// Per-attempt send timeout
    pub send_timeout: Duration,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 200,
            workers: 5,
            max_attempts: 3,
            enqueue_timeout: Duration::from_millis(200),
            send_timeout: Duration::from_secs(10),
        }
    }
}

impl MailerConfig {
    /// Load from environment variables (`EMAIL_QUEUE_CAPACITY`,
    /// `EMAIL_WORKERS`, `EMAIL_MAX_ATTEMPTS`, `EMAIL_ENQUEUE_TIMEOUT_MS`,
    /// `EMAIL_SEND_TIMEOUT_MS`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let read = |name: &str| std::env::var(name).ok().and_then(|v| v.parse::<u64>().ok());

        Self {
            queue_capacity: read("EMAIL_QUEUE_CAPACITY")
                .map(|v| v as usize)
                .unwrap_or(defaults.queue_capacity),
            workers: read("EMAIL_WORKERS")
                .map(|v| v as usize)
                .unwrap_or(defaults.workers),
            max_attempts: read("EMAIL_MAX_ATTEMPTS")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_attempts),
            enqueue_timeout: read("EMAIL_ENQUEUE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.enqueue_timeout),
            send_timeout: read("EMAIL_SEND_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.send_timeout),
        }
        .normalized()
    }

    /// Replace zero values with the documented defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.queue_capacity == 0 {
            self.queue_capacity = defaults.queue_capacity;
        }
        if self.workers == 0 {
            self.workers = defaults.workers;
        }
        if self.max_attempts == 0 {
            self.max_attempts = defaults.max_attempts;
        }
        if self.send_timeout.is_zero() {
            self.send_timeout = defaults.send_timeout;
        }
        self
    }
}

/// A queued verification-email job. Never persisted; lives only inside the
/// queue and worker scope.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub recipient: String,
    pub code: String,
}

/// Handle to the delivery pipeline.
///
/// Cloning shares the same queue and worker pool.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<EmailJob>,
    service: Arc<dyn EmailService>,
    config: MailerConfig,
}

impl Mailer {
    /// Start the worker pool and return the enqueue handle.
    pub fn start(config: MailerConfig, service: Arc<dyn EmailService>) -> Self {
        let config = config.normalized();
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.workers {
            tokio::spawn(worker_loop(
                worker_id,
                rx.clone(),
                service.clone(),
                config.clone(),
            ));
        }
        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "email delivery pipeline started"
        );

        Self {
            tx,
            service,
            config,
        }
    }

    /// Try to queue a verification email.
    ///
    /// Non-blocking first; if the queue is full, waits up to the enqueue
    /// timeout for space. Returns `false` when the queue stayed saturated so
    /// the caller can apply its fallback policy.
    pub async fn enqueue(&self, recipient: &str, code: &str) -> bool {
        let job = EmailJob {
            recipient: recipient.to_string(),
            code: code.to_string(),
        };

        let job = match self.tx.try_send(job) {
            Ok(()) => return true,
            Err(mpsc::error::TrySendError::Full(job)) => job,
            Err(mpsc::error::TrySendError::Closed(_)) => return false,
        };

        match tokio::time::timeout(self.config.enqueue_timeout, self.tx.send(job)).await {
            Ok(Ok(())) => true,
            _ => {
                tracing::warn!(%recipient, "email queue saturated, enqueue rejected");
                false
            }
        }
    }

    /// Synchronous best-effort send, bounded by the send timeout.
    ///
    /// The fallback path for a saturated queue; a failure here is the
    /// caller's to log, never to propagate.
    pub async fn send_now(&self, recipient: &str, code: &str) -> Result<(), EmailError> {
        send_once(&*self.service, recipient, code, self.config.send_timeout).await?;
        Ok(())
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<EmailJob>>>,
    service: Arc<dyn EmailService>,
    config: MailerConfig,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            tracing::debug!(worker_id, "email queue closed, worker exiting");
            break;
        };
        send_with_retry(&*service, &job, &config).await;
    }
}

async fn send_with_retry(service: &dyn EmailService, job: &EmailJob, config: &MailerConfig) {
    for attempt in 1..=config.max_attempts {
        match send_once(service, &job.recipient, &job.code, config.send_timeout).await {
            Ok(()) => {
                tracing::info!(recipient = %job.recipient, attempt, "verification email delivered");
                return;
            }
            Err(e) => {
                tracing::warn!(
                    recipient = %job.recipient,
                    attempt,
                    error = %e,
                    "verification email send failed"
                );
            }
        }
        if attempt < config.max_attempts {
            // Exponential backoff: 1s, 2s, 4s, ...
            tokio::time::sleep(Duration::from_secs(1u64 << (attempt - 1))).await;
        }
    }

    // Terminal failure: logged only. A production deployment should persist
    // or alert on these.
    tracing::error!(
        recipient = %job.recipient,
        attempts = config.max_attempts,
        "verification email delivery exhausted"
    );
}

async fn send_once(
    service: &dyn EmailService,
    recipient: &str,
    code: &str,
    send_timeout: Duration,
) -> Result<(), EmailError> {
    match tokio::time::timeout(send_timeout, service.send_verification_code(recipient, code)).await
    {
        Ok(Ok(_receipt)) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(EmailError::Delivery("send timed out".to_string())),
    }
}
