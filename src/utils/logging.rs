use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn level_from_flags(verbose: bool, debug: bool) -> tracing::Level {
    if debug {
        tracing::Level::DEBUG
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    }
}

// HTTP plumbing stays quiet unless RUST_LOG asks for it.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn", "html5ever=warn"];

fn filter_for(level: tracing::Level, env: Option<&str>) -> Result<EnvFilter> {
    let mut filter = match env.filter(|s| !s.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => {
            let mut filter = EnvFilter::new(level.to_string());
            for directive in QUIET_DEPENDENCIES {
                filter = filter.add_directive(directive.parse()?);
            }
            filter
        }
    };
    filter = filter.add_directive(format!("loginprobe={}", level).parse()?);
    Ok(filter)
}

/// Installs the stderr subscriber; stdout is left to results.
pub fn init(level: tracing::Level) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_for(level, env.as_deref())?;
    let debug = level >= tracing::Level::DEBUG;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(debug)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
