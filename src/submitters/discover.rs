use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::dispatch::{dispatch, HttpClient, HttpSettings, RequestSpec};
use crate::core::errors::ProbeError;
use crate::core::models::{ContentType, FormDescriptor, Input};

const CSRF_PARAM_SELECTOR: &str = "head > meta[name='csrf-param']";
const CSRF_TOKEN_SELECTOR: &str = "head > meta[name='csrf-token']";

fn selector(css: &str) -> Result<Selector, ProbeError> {
    Selector::parse(css).map_err(|e| ProbeError::Setup(format!("bad selector {:?}: {}", css, e)))
}

fn meta_content(document: &Html, css: &str) -> Result<String, ProbeError> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .unwrap_or_default()
        .to_string())
}

fn has_input(form: &ElementRef<'_>, inputs: &Selector, name: &str) -> bool {
    form.select(inputs).any(|input| input.value().attr("name") == Some(name))
}

fn is_login_action(action: &str) -> bool {
    let action = action.to_ascii_lowercase();
    action.contains("sign") || action.contains("login")
}

/// Fetches `url` and builds a descriptor from the login form it serves.
pub async fn discover_form(
    client: &HttpClient,
    settings: &HttpSettings,
    url: &str,
) -> Result<FormDescriptor, ProbeError> {
    let page_url =
        Url::parse(url).map_err(|e| ProbeError::Setup(format!("invalid url {:?}: {}", url, e)))?;
    let page = dispatch(client, settings, RequestSpec::get(page_url), "").await?;
    if page.status != StatusCode::OK {
        return Err(ProbeError::Setup(format!(
            "login page {} answered {}, cannot discover its form",
            url, page.status
        )));
    }

    let descriptor = parse_login_form(url, &String::from_utf8_lossy(&page.body))?;
    info!(
        "Discovered login form posting to {:?} ({} / {})",
        descriptor.action_path, descriptor.username_field, descriptor.password_field
    );
    Ok(descriptor)
}

/// Picks the last form whose action mentions signing or logging in (and
/// which carries the CSRF field when the page declares one), then sorts its
/// inputs into username, password and static extras.
pub fn parse_login_form(url: &str, html: &str) -> Result<FormDescriptor, ProbeError> {
    let document = Html::parse_document(html);
    let token_name = meta_content(&document, CSRF_PARAM_SELECTOR)?;
    let token_value = meta_content(&document, CSRF_TOKEN_SELECTOR)?;

    let forms = selector("form")?;
    let inputs = selector("input")?;

    let form = document
        .select(&forms)
        .filter(|form| form.value().attr("action").is_some_and(is_login_action))
        .filter(|form| token_name.is_empty() || has_input(form, &inputs, &token_name))
        .last()
        .ok_or_else(|| ProbeError::Setup(format!("no login form found at {}", url)))?;

    let mut descriptor = FormDescriptor {
        url: url.to_string(),
        action_path: form.value().attr("action").unwrap_or_default().to_string(),
        content_type: ContentType::FormUrlEncoded,
        token_name,
        token_value,
        ..Default::default()
    };

    for input in form.select(&inputs) {
        let Some(name) = input.value().attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();

        if name.contains("pass") {
            descriptor.password_field = name.to_string();
        } else if name.contains("log") || name.contains("name") || name.contains("mail") {
            descriptor.username_field = name.to_string();
        } else if !value.is_empty() && name != descriptor.token_name {
            descriptor.extra_inputs.push(Input {
                name: name.to_string(),
                value: value.to_string(),
            });
        } else {
            debug!("Skipping form input {:?}", name);
        }
    }

    descriptor.validate()?;
    Ok(descriptor)
}
