use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::ProbeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "application/x-www-form-urlencoded")]
    FormUrlEncoded,
    #[serde(rename = "application/json")]
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
        }
    }
}

/// Static field sent unchanged with every submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub value: String,
}

/// Everything needed to submit a login form. Built once before a run,
/// only `token_value` changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDescriptor {
    pub url: String,
    pub referer: Option<String>,
    pub action_path: String,
    pub content_type: ContentType,
    pub username_field: String,
    pub password_field: String,
    pub token_name: String,
    pub token_value: String,
    pub extra_inputs: Vec<Input>,
}

impl FormDescriptor {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read form file: {}", path.display()))?;

        let descriptor: FormDescriptor = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse form file: {}", path.display()))?;

        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.url.is_empty() {
            return Err(ProbeError::Setup("form url is required".to_string()));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| ProbeError::Setup(format!("invalid form url {:?}: {}", self.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ProbeError::Setup(format!(
                "unsupported scheme {:?} in form url",
                url.scheme()
            )));
        }

        if self.username_field.is_empty() {
            return Err(ProbeError::Setup("username field name is required".to_string()));
        }
        if self.password_field.is_empty() {
            return Err(ProbeError::Setup("password field name is required".to_string()));
        }

        Ok(())
    }

    /// Where the form gets posted: an absolute action is used as is,
    /// otherwise it replaces the path of the page url.
    pub fn action_url(&self) -> Result<Url, ProbeError> {
        if self.action_path.starts_with("http") {
            return Url::parse(&self.action_path).map_err(|e| {
                ProbeError::Setup(format!("invalid action url {:?}: {}", self.action_path, e))
            });
        }

        let mut url = Url::parse(&self.url)
            .map_err(|e| ProbeError::Setup(format!("invalid form url {:?}: {}", self.url, e)))?;
        if !self.action_path.is_empty() {
            url.set_path(&self.action_path);
        }
        Ok(url)
    }
}

/// One (username, password) pair of the cartesian product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.username, self.password)
    }
}
