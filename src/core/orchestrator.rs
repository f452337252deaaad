use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};

use super::errors::ProbeError;
use super::models::Credential;
use crate::submitters::Submitter;

const BASELINE_USERNAME_LEN: usize = 8;
const BASELINE_PASSWORD_LEN: usize = 13;

/// Fixed wait plus a uniform random jitter, applied after every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub wait: Duration,
    pub jitter: Duration,
}

impl Pacing {
    pub fn from_secs(wait: u64, jitter: u64) -> Self {
        Self {
            wait: Duration::from_secs(wait),
            jitter: Duration::from_secs(jitter),
        }
    }

    pub fn delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.wait + Duration::from_millis(extra)
    }
}

/// Notified as the run progresses; purely for display.
pub trait ProgressObserver {
    fn on_attempt(&self, credential: &Credential);
    fn on_candidate(&self, credential: &Credential);
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Drives the attempt loop: one baseline with random credentials, then every
/// username/password pair in username-major order, strictly one at a time.
pub struct Orchestrator<S: Submitter> {
    submitter: S,
    usernames: Vec<String>,
    passwords: Vec<String>,
    pacing: Pacing,
    candidates: Vec<String>,
    observer: Option<Box<dyn ProgressObserver + Send>>,
}

impl<S: Submitter> Orchestrator<S> {
    pub fn new(submitter: S, usernames: Vec<String>, passwords: Vec<String>, pacing: Pacing) -> Self {
        Self {
            submitter,
            usernames,
            passwords,
            pacing,
            candidates: Vec::new(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn username_count(&self) -> usize {
        self.usernames.len()
    }

    pub fn password_count(&self) -> usize {
        self.passwords.len()
    }

    pub fn total_attempts(&self) -> usize {
        self.usernames.len() * self.passwords.len()
    }

    /// Worst-case run length in minutes, shown before the operator commits.
    pub fn estimated_duration_minutes(&self) -> f64 {
        let per_attempt = (self.pacing.wait + self.pacing.jitter).as_secs_f64();
        self.total_attempts() as f64 * per_attempt / 60.0
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Any error aborts the whole run: once a request fails the target can no
    /// longer be assumed to behave like it did for the baseline.
    pub async fn run(&mut self) -> Result<Vec<String>, ProbeError> {
        let base_user = random_alphanumeric(BASELINE_USERNAME_LEN);
        let base_pass = random_alphanumeric(BASELINE_PASSWORD_LEN);
        let baseline = self
            .submitter
            .attempt(&base_user, &base_pass)
            .await
            .map_err(|e| ProbeError::Baseline(Box::new(e)))?;
        info!("Baseline signature: {}", baseline);

        for username in &self.usernames {
            for password in &self.passwords {
                let credential = Credential::new(username.as_str(), password.as_str());
                if let Some(observer) = &self.observer {
                    observer.on_attempt(&credential);
                }

                let signature = self.submitter.attempt(username, password).await?;
                debug!("{} -> {}", signature.username(), signature);
                if signature.is_candidate(&baseline) {
                    warn!(
                        "Candidate found: {} (redirects {} vs {}, status {} vs {}, {} vs {} bytes)",
                        credential,
                        signature.redirect_count(),
                        baseline.redirect_count(),
                        signature.status_code(),
                        baseline.status_code(),
                        signature.response_body_size(),
                        baseline.response_body_size()
                    );
                    if let Some(observer) = &self.observer {
                        observer.on_candidate(&credential);
                    }
                    self.candidates.push(credential.to_string());
                }

                let delay = self.pacing.delay();
                debug!("Waiting {:?} before next attempt", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Ok(self.candidates.clone())
    }
}
