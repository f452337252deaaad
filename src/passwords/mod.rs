//! Contextual password candidates: common and keyboard-walk passwords plus
//! birth-year and organization/year guesses, optionally expanded with
//! capitalization and light leet-speak.

pub mod sources;
pub mod stages;

use std::collections::BTreeSet;

use chrono::Datelike;

use stages::pipeline_for_depth;

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub depth: u8,
    pub first_name: Option<String>,
    pub org_or_url: Option<String>,
}

/// Generates the deduplicated, sorted candidate list for today's year.
pub fn generate(options: &Options) -> Vec<String> {
    generate_for_year(options, chrono::Local::now().year())
}

pub fn generate_for_year(options: &Options, current_year: i32) -> Vec<String> {
    let mut base = sources::common();
    base.extend(sources::keyboard_walks());
    if let Some(name) = options.first_name.as_deref() {
        base.extend(sources::from_first_name(name, current_year));
    }
    if let Some(seed) = options.org_or_url.as_deref() {
        base.extend(sources::from_org_or_url(seed, current_year));
    }

    let expanded = pipeline_for_depth(options.depth)
        .iter()
        .fold(base, |list, stage| stage.apply(list));

    let unique: BTreeSet<String> = expanded.into_iter().collect();
    tracing::debug!("Generated {} passwords at depth {}", unique.len(), options.depth);
    unique.into_iter().collect()
}
