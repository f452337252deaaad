use std::net::IpAddr;

use url::{Host, Url};

// Birth-year window for first-name passwords.
const MIN_AGE: i32 = 30;
const MAX_AGE: i32 = 50;

// Recent years combined with the organization word.
const RECENT_YEARS: i32 = 5;

pub fn common() -> Vec<String> {
    [
        "12345678",
        "123456789",
        "qwertyuiop",
        "qwertyui",
        "asdfghjk",
        "password",
        "password123456",
        "password123456789",
        "password987654321",
        "password1234",
        "password123!",
        "1qa2ws3ed4rf",
        "1q2w3e4r5t6y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn keyboard_walks() -> Vec<String> {
    [
        // qwerty
        "1qa2ws3ed4rf",
        "1q2w3e4r5t6y",
        // azerty
        "1aq2sz3de4rf",
        "1a2z3e4r5t6y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// `{name}{year}` for every birth year giving an age between 30 and 50.
pub fn from_first_name(first_name: &str, current_year: i32) -> Vec<String> {
    if first_name.is_empty() {
        return Vec::new();
    }
    (current_year - MAX_AGE..=current_year - MIN_AGE)
        .map(|year| format!("{}{}", first_name, year))
        .collect()
}

pub fn from_org_or_url(seed: &str, current_year: i32) -> Vec<String> {
    let Some(word) = org_word(seed) else {
        return Vec::new();
    };

    let mut list = Vec::with_capacity(RECENT_YEARS as usize * 4);
    for year in (current_year - RECENT_YEARS + 1..=current_year).rev() {
        let short = format!("{:02}", year.rem_euclid(100));
        list.push(format!("{}{}", word, year));
        list.push(format!("{}{}", word, short));
        list.push(format!("{}@{}", word, year));
        list.push(format!("{}@{}", word, short));
    }
    list
}

/// The word an organization seed contributes. IP literals give nothing, URLs
/// give their lowercased host minus TLD and second-level label, anything
/// else is used verbatim.
pub fn org_word(seed: &str) -> Option<String> {
    if seed.is_empty() || seed.parse::<IpAddr>().is_ok() {
        return None;
    }

    if !seed.contains("://") {
        return Some(seed.to_string());
    }

    let Ok(url) = Url::parse(seed) else {
        return Some(seed.to_string());
    };

    match url.host() {
        Some(Host::Domain(domain)) => {
            let host = domain.to_lowercase();
            let mut labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
            // top-level, then second-level when something remains
            for _ in 0..2 {
                if labels.len() > 1 {
                    labels.pop();
                }
            }
            labels.first().map(|label| label.to_string())
        }
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => None,
        None => Some(seed.to_string()),
    }
}
