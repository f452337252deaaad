use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("setup failure: {0}")]
    Setup(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("stopped after {limit} redirects starting from {url}")]
    TooManyRedirects { url: String, limit: u32 },

    #[error("invalid redirect from {url} to {location:?}")]
    InvalidRedirect { url: String, location: String },

    #[error("{url} does not respond as basic auth (header WWW-Authenticate={header:?}), try form mode")]
    ProtocolMismatch { url: String, header: String },

    #[error("could not establish baseline signature: {0}")]
    Baseline(#[source] Box<ProbeError>),
}

impl ProbeError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }
}
