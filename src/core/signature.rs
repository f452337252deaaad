use std::fmt;
use std::time::Duration;

/// Observable fingerprint of one authentication attempt.
///
/// Built once from the live response of an attempt and never changed
/// afterwards, which is why every field is private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    redirect_count: u32,
    status_code: u16,
    response_body_size: usize,
    server_processing_time: Duration,
    username: String,
}

impl Signature {
    pub fn new(
        redirect_count: u32,
        status_code: u16,
        response_body_size: usize,
        server_processing_time: Duration,
        username: impl Into<String>,
    ) -> Self {
        Self {
            redirect_count,
            status_code,
            response_body_size,
            server_processing_time,
            username: username.into(),
        }
    }

    pub fn redirect_count(&self) -> u32 {
        self.redirect_count
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn response_body_size(&self) -> usize {
        self.response_body_size
    }

    pub fn server_processing_time(&self) -> Duration {
        self.server_processing_time
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Differential classification against a known-invalid baseline.
    ///
    /// A different redirect/status shape always flags. Otherwise ten times the
    /// body size, integer-divided by the baseline size, has to exceed 11: 1.2x
    /// flags, 1.1x and 1.15x do not. A zero-sized baseline cannot be compared
    /// by size.
    pub fn is_candidate(&self, baseline: &Signature) -> bool {
        if self.redirect_count != baseline.redirect_count
            || self.status_code != baseline.status_code
        {
            return true;
        }

        if baseline.response_body_size == 0 {
            return false;
        }

        self.response_body_size.saturating_mul(10) / baseline.response_body_size > 11
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Redirects: {}, Status: {}, Length: {}, ServerProcessing: {:?}",
            self.redirect_count, self.status_code, self.response_body_size, self.server_processing_time
        )
    }
}
