use std::fmt;

use async_trait::async_trait;

use crate::core::errors::ProbeError;
use crate::core::signature::Signature;

/// How credentials are presented to the target. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitterKind {
    Form,
    BasicAuth,
}

impl SubmitterKind {
    pub fn from_flags(basic_auth: bool) -> Self {
        if basic_auth {
            Self::BasicAuth
        } else {
            Self::Form
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::BasicAuth => "basic-auth",
        }
    }
}

impl fmt::Display for SubmitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way of presenting a credential pair to the target.
#[async_trait]
pub trait Submitter: Send {
    fn kind(&self) -> SubmitterKind;

    /// Where attempts are sent, for display.
    fn target(&self) -> &str;

    /// Performs exactly one authentication attempt and fingerprints the response.
    async fn attempt(&mut self, username: &str, password: &str) -> Result<Signature, ProbeError>;
}

#[async_trait]
impl<S: Submitter + ?Sized> Submitter for Box<S> {
    fn kind(&self) -> SubmitterKind {
        (**self).kind()
    }

    fn target(&self) -> &str {
        (**self).target()
    }

    async fn attempt(&mut self, username: &str, password: &str) -> Result<Signature, ProbeError> {
        (**self).attempt(username, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_flags() {
        assert_eq!(SubmitterKind::from_flags(true), SubmitterKind::BasicAuth);
        assert_eq!(SubmitterKind::from_flags(false).to_string(), "form");
    }
}
