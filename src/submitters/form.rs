use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, COOKIE, REFERER, SET_COOKIE};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::dispatch::{dispatch, HttpClient, HttpSettings, RequestSpec};
use super::types::{Submitter, SubmitterKind};
use crate::core::errors::ProbeError;
use crate::core::models::{ContentType, FormDescriptor};
use crate::core::signature::Signature;

const CSRF_TOKEN_SELECTOR: &str = "head > meta[name='csrf-token']";

/// Authentication material scraped from a fresh load of the login page.
#[derive(Debug, Default, PartialEq, Eq)]
struct Session {
    token: String,
    cookie: Option<String>,
}

/// Posts the login form described by a [`FormDescriptor`], refreshing the
/// CSRF token and session cookie before every attempt.
pub struct FormSubmitter {
    client: HttpClient,
    settings: HttpSettings,
    descriptor: FormDescriptor,
    page_url: Url,
    action_url: Url,
}

impl FormSubmitter {
    pub fn new(
        descriptor: FormDescriptor,
        settings: HttpSettings,
        client: HttpClient,
    ) -> Result<Self, ProbeError> {
        descriptor.validate()?;
        let page_url = Url::parse(&descriptor.url)
            .map_err(|e| ProbeError::Setup(format!("invalid form url {:?}: {}", descriptor.url, e)))?;
        let action_url = descriptor.action_url()?;

        Ok(Self {
            client,
            settings,
            descriptor,
            page_url,
            action_url,
        })
    }

    async fn refresh_session(&self) -> Result<Session, ProbeError> {
        let page = dispatch(
            &self.client,
            &self.settings,
            RequestSpec::get(self.page_url.clone()),
            "",
        )
        .await?;

        if page.status != StatusCode::OK {
            debug!("Login page answered {}, continuing without token or cookie", page.status);
            return Ok(Session::default());
        }

        let cookie = page
            .headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty());

        let token = extract_csrf_token(&String::from_utf8_lossy(&page.body));

        Ok(Session { token, cookie })
    }

    fn build_body(&self, username: &str, password: &str) -> Result<String, ProbeError> {
        let d = &self.descriptor;
        let mut fields: BTreeMap<&str, &str> = BTreeMap::new();

        if d.content_type == ContentType::FormUrlEncoded && !d.token_value.is_empty() {
            if self.settings.verbose {
                debug!("Set authenticity token {}", d.token_value);
            }
            fields.insert(&d.token_name, &d.token_value);
        }
        fields.insert(&d.username_field, username);
        fields.insert(&d.password_field, password);
        for input in &d.extra_inputs {
            fields.insert(&input.name, &input.value);
        }

        match d.content_type {
            ContentType::Json => serde_json::to_string(&fields)
                .map_err(|e| ProbeError::Setup(format!("failed to encode json body: {}", e))),
            ContentType::FormUrlEncoded => Ok(url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish()),
        }
    }
}

/// Reads the `csrf-token` meta tag of a page, empty when absent.
fn extract_csrf_token(html: &str) -> String {
    let Ok(selector) = Selector::parse(CSRF_TOKEN_SELECTOR) else {
        return String::new();
    };
    Html::parse_document(html)
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

fn cookie_header(cookie: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(cookie) {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Session cookie {:?} is not a valid header value, sending none", cookie);
            None
        }
    }
}

#[async_trait]
impl Submitter for FormSubmitter {
    fn kind(&self) -> SubmitterKind {
        SubmitterKind::Form
    }

    fn target(&self) -> &str {
        self.action_url.as_str()
    }

    async fn attempt(&mut self, username: &str, password: &str) -> Result<Signature, ProbeError> {
        let session = self.refresh_session().await?;
        self.descriptor.token_value = session.token;

        let body = self.build_body(username, password)?;
        let mut spec = RequestSpec::post(self.action_url.clone(), self.descriptor.content_type.mime(), body);
        spec.headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        if let Some(referer) = self.descriptor.referer.as_deref().filter(|r| !r.is_empty()) {
            let value = HeaderValue::from_str(referer)
                .map_err(|_| ProbeError::Setup(format!("invalid referer {:?}", referer)))?;
            spec.headers.insert(REFERER, value);
        }

        if let Some(cookie) = session.cookie {
            if self.settings.verbose {
                debug!("Set cookie {}", cookie);
            }
            if let Some(value) = cookie_header(&cookie) {
                spec.headers.insert(COOKIE, value);
            }
        }

        if self.settings.verbose {
            debug!("Posting at {}", self.action_url);
        }

        let dispatched = dispatch(&self.client, &self.settings, spec, username).await?;
        info!("{}", dispatched.signature);
        Ok(dispatched.signature)
    }
}
