use async_trait::async_trait;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::StatusCode;
use tracing::info;
use url::Url;

use super::dispatch::{dispatch, HttpClient, HttpSettings, RequestSpec};
use super::types::{Submitter, SubmitterKind};
use crate::core::errors::ProbeError;
use crate::core::signature::Signature;

pub struct BasicAuthSubmitter {
    client: HttpClient,
    settings: HttpSettings,
    url: Url,
}

impl BasicAuthSubmitter {
    pub fn new(url: &str, settings: HttpSettings, client: HttpClient) -> Result<Self, ProbeError> {
        let url = Url::parse(url)
            .map_err(|e| ProbeError::Setup(format!("invalid url {:?}: {}", url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ProbeError::Setup(format!("unsupported scheme {:?}", url.scheme())));
        }
        Ok(Self { client, settings, url })
    }
}

#[async_trait]
impl Submitter for BasicAuthSubmitter {
    fn kind(&self) -> SubmitterKind {
        SubmitterKind::BasicAuth
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }

    async fn attempt(&mut self, username: &str, password: &str) -> Result<Signature, ProbeError> {
        let mut spec = RequestSpec::get(self.url.clone());
        spec.basic_auth = Some((username.to_string(), password.to_string()));

        let dispatched = dispatch(&self.client, &self.settings, spec, username).await?;

        let header = dispatched
            .headers
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if dispatched.status != StatusCode::OK && !header.starts_with("Basic") {
            return Err(ProbeError::ProtocolMismatch {
                url: self.url.to_string(),
                header: header.to_string(),
            });
        }

        info!("{}", dispatched.signature);
        Ok(dispatched.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submitters::dispatch::build_client;
    use crate::submitters::stub::{StubResponse, StubServer};

    fn submitter(url: &str) -> BasicAuthSubmitter {
        BasicAuthSubmitter::new(url, HttpSettings::default(), build_client(None).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_basic_challenge_returns_signature() {
        let server = StubServer::start(|req| {
            // "admin:letmein"
            if req.header("authorization") == Some("Basic YWRtaW46bGV0bWVpbg==") {
                StubResponse::ok("<h1>admin console</h1>")
            } else {
                StubResponse::new(401, "nope").with_header("WWW-Authenticate", "Basic realm=\"ops\"")
            }
        })
        .await;
        let mut basic = submitter(&server.url("/admin"));

        let denied = basic.attempt("admin", "wrong").await.unwrap();
        assert_eq!(denied.status_code(), 401);
        assert_eq!(denied.response_body_size(), 4);

        let granted = basic.attempt("admin", "letmein").await.unwrap();
        assert_eq!(granted.status_code(), 200);
        assert_eq!(granted.username(), "admin");
        assert!(granted.is_candidate(&denied));
    }

    #[tokio::test]
    async fn test_non_basic_endpoint_is_protocol_mismatch() {
        let server = StubServer::start(|_| {
            StubResponse::new(401, "").with_header("WWW-Authenticate", "Bearer realm=\"api\"")
        })
        .await;
        let mut basic = submitter(&server.url("/api"));

        let err = basic.attempt("admin", "admin").await.unwrap_err();
        match err {
            ProbeError::ProtocolMismatch { header, .. } => assert_eq!(header, "Bearer realm=\"api\""),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_challenge_header_is_protocol_mismatch() {
        let server = StubServer::start(|_| StubResponse::new(403, "forbidden")).await;
        let mut basic = submitter(&server.url("/"));

        let err = basic.attempt("admin", "admin").await.unwrap_err();
        assert!(matches!(err, ProbeError::ProtocolMismatch { .. }));
    }

    #[tokio::test]
    async fn test_plain_200_page_is_accepted() {
        let server = StubServer::start(|_| StubResponse::ok("public")).await;
        let mut basic = submitter(&server.url("/"));

        let sig = basic.attempt("admin", "admin").await.unwrap();
        assert_eq!(sig.status_code(), 200);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = BasicAuthSubmitter::new("ftp://example.com", HttpSettings::default(), build_client(None).unwrap());
        assert!(matches!(result, Err(ProbeError::Setup(_))));
    }
}
