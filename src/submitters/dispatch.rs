use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION, USER_AGENT,
};
use reqwest::{redirect, Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use super::timing::{ConnectClock, ConnectTimerLayer, RequestTrace};
use crate::core::errors::ProbeError;
use crate::core::signature::Signature;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:63.0) Gecko/20100101 Firefox/63.0";
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

// Bodies below this size are dumped in verbose mode.
const SMALL_BODY_BYTES: usize = 200;

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub user_agent: String,
    pub max_redirects: u32,
    pub verbose: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            verbose: false,
        }
    }
}

/// Pooled client whose connector reports connection setup time.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    clock: ConnectClock,
}

/// Redirects are followed by `dispatch` itself so every hop can be counted.
pub fn build_client(connect_timeout: Option<Duration>) -> Result<HttpClient, ProbeError> {
    let clock = ConnectClock::default();
    let mut builder = Client::builder()
        .redirect(redirect::Policy::none())
        .connector_layer(ConnectTimerLayer::new(clock.clone()));
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    let inner = builder
        .build()
        .map_err(|e| ProbeError::Setup(format!("failed to build http client: {}", e)))?;
    Ok(HttpClient { inner, clock })
}

pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub basic_auth: Option<(String, String)>,
}

impl RequestSpec {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
            basic_auth: None,
        }
    }

    pub fn post(url: Url, content_type: &'static str, body: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        Self {
            method: Method::POST,
            url,
            headers,
            body: Some(body),
            basic_auth: None,
        }
    }
}

pub struct Dispatched {
    pub signature: Signature,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Sends `spec`, following redirects up to `settings.max_redirects`, reads the
/// whole final body and fingerprints the exchange for `username`.
pub async fn dispatch(
    client: &HttpClient,
    settings: &HttpSettings,
    spec: RequestSpec,
    username: &str,
) -> Result<Dispatched, ProbeError> {
    let origin = spec.url.to_string();
    let origin_host = spec.url.host_str().map(str::to_ascii_lowercase);
    let RequestSpec {
        mut method,
        mut url,
        mut headers,
        mut body,
        mut basic_auth,
    } = spec;

    let user_agent = HeaderValue::from_str(&settings.user_agent)
        .map_err(|_| ProbeError::Setup(format!("invalid user agent {:?}", settings.user_agent)))?;
    headers.insert(USER_AGENT, user_agent);

    let mut redirect_count = 0u32;
    loop {
        let mut request = client.inner.request(method.clone(), url.clone()).headers(headers.clone());
        if let Some((user, pass)) = &basic_auth {
            request = request.basic_auth(user, Some(pass));
        }
        if let Some(payload) = &body {
            request = request.body(payload.clone());
        }

        if settings.verbose {
            debug!(
                "------------------------------------------------\n{} {}\n{:?}\n{}\n------------------------------------------------",
                method,
                url,
                headers,
                body.as_deref().unwrap_or("")
            );
        }

        let mut trace = RequestTrace::begin(&client.clock);
        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::transport(url.as_str(), e))?;
        trace.got_first_response_byte(&client.clock);
        if trace.new_connections() > 0 {
            debug!("Opened connection to {} in {:?}", url, trace.connect_time());
        }

        let status = response.status();
        if is_followed_redirect(status) {
            if let Some(raw_location) = response.headers().get(LOCATION) {
                let location = raw_location.to_str().map_err(|_| ProbeError::InvalidRedirect {
                    url: url.to_string(),
                    location: String::from_utf8_lossy(raw_location.as_bytes()).into_owned(),
                })?;
                let next = url.join(location).map_err(|_| ProbeError::InvalidRedirect {
                    url: url.to_string(),
                    location: location.to_string(),
                })?;

                redirect_count += 1;
                if redirect_count > settings.max_redirects {
                    return Err(ProbeError::TooManyRedirects {
                        url: origin,
                        limit: settings.max_redirects,
                    });
                }
                if settings.verbose {
                    debug!("Redirecting to {} ({})", next, redirect_count);
                }

                if matches!(status.as_u16(), 301 | 302 | 303) && method != Method::HEAD {
                    method = Method::GET;
                    body = None;
                    headers.remove(CONTENT_TYPE);
                    headers.remove(CONTENT_LENGTH);
                }
                // Credentials only ever go to the host they were meant for.
                if next.host_str().map(str::to_ascii_lowercase) != origin_host
                    && (basic_auth.is_some() || headers.contains_key(COOKIE) || headers.contains_key(AUTHORIZATION))
                {
                    debug!("Redirect leaves {}, dropping credentials", origin_host.as_deref().unwrap_or(""));
                    basic_auth = None;
                    headers.remove(COOKIE);
                    headers.remove(AUTHORIZATION);
                }
                url = next;
                continue;
            }
        }

        if settings.verbose {
            debug!("-> Response {}", status);
        }

        let response_headers = response.headers().clone();
        let payload = response
            .bytes()
            .await
            .map_err(|e| ProbeError::transport(url.as_str(), e))?
            .to_vec();

        if settings.verbose && payload.len() < SMALL_BODY_BYTES {
            debug!(
                "----------- Response Body ---------\n{}\n-----------------------------",
                String::from_utf8_lossy(&payload)
            );
        }

        let signature = Signature::new(
            redirect_count,
            status.as_u16(),
            payload.len(),
            trace.server_processing_time(),
            username,
        );
        if settings.verbose {
            debug!("Server processing took {:?}", signature.server_processing_time());
        }

        return Ok(Dispatched {
            signature,
            status,
            headers: response_headers,
            body: payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submitters::stub::{StubResponse, StubServer};

    fn settings() -> HttpSettings {
        HttpSettings {
            verbose: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_dispatch_counts_redirects() {
        let server = StubServer::start(|req| match req.path.as_str() {
            "/a" => StubResponse::redirect("/b"),
            "/b" => StubResponse::redirect("/c"),
            _ => StubResponse::ok("welcome"),
        })
        .await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/a")).unwrap();

        let out = dispatch(&client, &settings(), RequestSpec::get(url), "alice").await.unwrap();
        assert_eq!(out.signature.redirect_count(), 2);
        assert_eq!(out.signature.status_code(), 200);
        assert_eq!(out.signature.response_body_size(), 7);
        assert_eq!(out.signature.username(), "alice");
        assert_eq!(out.body, b"welcome");

        let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_dispatch_allows_exactly_the_cap() {
        let server = StubServer::start(|req| {
            let hop: u32 = req.path.trim_start_matches("/hop/").parse().unwrap_or(0);
            if hop < 10 {
                StubResponse::redirect(&format!("/hop/{}", hop + 1))
            } else {
                StubResponse::ok("done")
            }
        })
        .await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/hop/0")).unwrap();

        let out = dispatch(&client, &settings(), RequestSpec::get(url), "alice").await.unwrap();
        assert_eq!(out.signature.redirect_count(), 10);
    }

    #[tokio::test]
    async fn test_dispatch_fails_past_redirect_cap() {
        let server = StubServer::start(|_| StubResponse::redirect("/loop")).await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/loop")).unwrap();

        let err = dispatch(&client, &settings(), RequestSpec::get(url), "alice")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::TooManyRedirects { limit: 10, .. }));
        assert_eq!(server.requests().len(), 11);
    }

    #[tokio::test]
    async fn test_post_becomes_get_after_found() {
        let server = StubServer::start(|req| match req.path.as_str() {
            "/session" => StubResponse::redirect("/dashboard"),
            _ => StubResponse::ok("dashboard"),
        })
        .await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/session")).unwrap();
        let spec = RequestSpec::post(url, "application/x-www-form-urlencoded", "a=b".to_string());

        dispatch(&client, &settings(), spec, "alice").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].body, "a=b");
        assert_eq!(requests[1].method, "GET");
        assert_eq!(requests[1].body, "");
        assert_eq!(requests[1].header("user-agent"), Some(DEFAULT_USER_AGENT));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = build_client(Some(Duration::from_secs(2))).unwrap();
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        let err = dispatch(&client, &settings(), RequestSpec::get(url), "alice")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_cross_host_redirect_drops_credentials() {
        let elsewhere = StubServer::start(|_| StubResponse::ok("other site")).await;
        let landing = elsewhere.url("/landing").replace("127.0.0.1", "localhost");
        let target = StubServer::start(move |_| StubResponse::redirect(&landing)).await;
        let client = build_client(None).unwrap();

        let mut spec = RequestSpec::get(Url::parse(&target.url("/admin")).unwrap());
        spec.basic_auth = Some(("admin".to_string(), "s3cret".to_string()));
        spec.headers.insert(COOKIE, HeaderValue::from_static("_session=abc"));

        let out = dispatch(&client, &settings(), spec, "admin").await.unwrap();
        assert_eq!(out.signature.redirect_count(), 1);

        let first = &target.requests()[0];
        assert_eq!(first.header("authorization"), Some("Basic YWRtaW46czNjcmV0"));
        assert_eq!(first.header("cookie"), Some("_session=abc"));

        let followed = &elsewhere.requests()[0];
        assert_eq!(followed.header("authorization"), None);
        assert_eq!(followed.header("cookie"), None);
        assert_eq!(followed.header("user-agent"), Some(DEFAULT_USER_AGENT));
    }

    #[tokio::test]
    async fn test_same_host_redirect_keeps_credentials() {
        let server = StubServer::start(|req| match req.path.as_str() {
            "/admin" => StubResponse::redirect("/admin/"),
            _ => StubResponse::ok("console"),
        })
        .await;
        let client = build_client(None).unwrap();
        let mut spec = RequestSpec::get(Url::parse(&server.url("/admin")).unwrap());
        spec.basic_auth = Some(("admin".to_string(), "s3cret".to_string()));

        dispatch(&client, &settings(), spec, "admin").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[1].header("authorization"), Some("Basic YWRtaW46czNjcmV0"));
    }

    #[tokio::test]
    async fn test_non_ascii_location_is_invalid_redirect() {
        let server = StubServer::start(|_| StubResponse::redirect("/caf\u{e9}")).await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/start")).unwrap();

        let err = dispatch(&client, &settings(), RequestSpec::get(url), "alice")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::InvalidRedirect { .. }));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_first_request_separates_connect_from_server_time() {
        let server = StubServer::start(|_| StubResponse::ok("slow").with_delay(Duration::from_millis(150))).await;
        let client = build_client(None).unwrap();
        let url = Url::parse(&server.url("/")).unwrap();

        let out = dispatch(&client, &settings(), RequestSpec::get(url), "alice").await.unwrap();

        let totals = client.clock.totals();
        assert_eq!(totals.connects, 1);
        assert!(out.signature.server_processing_time() >= Duration::from_millis(150));
        assert!(out.signature.server_processing_time() < Duration::from_secs(5));
    }
}
