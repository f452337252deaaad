use crate::{
    cli::args::{Cli, Command, DiscoverArgs, GeneratorArgs, ProbeArgs},
    config::{ConfigLoader, ProbeConfig},
    core::{
        errors::ProbeError,
        models::{ContentType, FormDescriptor, Input},
        orchestrator::{Orchestrator, Pacing},
    },
    passwords,
    submitters::{
        discover_form,
        dispatch::{build_client, HttpClient},
        BasicAuthSubmitter, FormSubmitter, HttpSettings, Submitter, SubmitterKind,
    },
    ui::{printer, progress::ProbeProgress},
    utils::{fs, logging},
};
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::Path;
use std::time::Duration;

pub async fn run(cli: Cli) -> Result<()> {
    let level = logging::level_from_flags(cli.verbose, cli.debug);
    logging::init(level)?;

    let config = ConfigLoader::load_with_custom_path(cli.config.as_deref())?;
    tracing::info!(
        "Configuration loaded: wait {}s, jitter {}s, max {} redirects",
        config.pacing.wait_s,
        config.pacing.jitter_s,
        config.http.max_redirects
    );

    match &cli.command {
        Some(Command::Generate(args)) => {
            for password in passwords::generate(&generator_options(args, &config, None)) {
                println!("{}", password);
            }
            Ok(())
        }
        Some(Command::Discover(args)) => discover(args, &config, cli.verbose || cli.debug).await,
        None => probe(&cli, &config).await,
    }
}

fn generator_options(args: &GeneratorArgs, config: &ProbeConfig, target: Option<&str>) -> passwords::Options {
    passwords::Options {
        depth: args.depth.unwrap_or(config.generator.depth),
        first_name: args.first_name.clone().filter(|s| !s.is_empty()),
        org_or_url: args
            .org_or_url
            .clone()
            .or_else(|| target.map(str::to_string))
            .filter(|s| !s.is_empty()),
    }
}

fn parse_fields(fields: &[String]) -> Result<Vec<Input>> {
    fields
        .iter()
        .map(|field| -> Result<Input> {
            let (name, value) = field
                .split_once('=')
                .ok_or_else(|| ProbeError::Setup(format!("invalid --field {:?}, expected NAME=VALUE", field)))?;
            Ok(Input {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

fn descriptor_from_flags(args: &ProbeArgs, url: &str, username_field: &str, password_field: &str) -> Result<FormDescriptor> {
    let descriptor = FormDescriptor {
        url: url.to_string(),
        referer: args.referer.clone(),
        action_path: args.action_path.clone().unwrap_or_default(),
        content_type: if args.json { ContentType::Json } else { ContentType::FormUrlEncoded },
        username_field: username_field.to_string(),
        password_field: password_field.to_string(),
        token_name: args.token_name.clone(),
        token_value: String::new(),
        extra_inputs: parse_fields(&args.fields)?,
    };
    descriptor.validate()?;
    Ok(descriptor)
}

/// Flags that make sense on top of a scraped form.
fn apply_overrides(mut descriptor: FormDescriptor, args: &ProbeArgs) -> Result<FormDescriptor> {
    if args.referer.is_some() {
        descriptor.referer = args.referer.clone();
    }
    if let Some(action_path) = &args.action_path {
        descriptor.action_path = action_path.clone();
    }
    if args.json {
        descriptor.content_type = ContentType::Json;
    }
    descriptor.extra_inputs.extend(parse_fields(&args.fields)?);
    descriptor.validate()?;
    Ok(descriptor)
}

async fn form_descriptor(args: &ProbeArgs, client: &HttpClient, settings: &HttpSettings) -> Result<FormDescriptor> {
    if let Some(path) = &args.form_file {
        let descriptor = FormDescriptor::load(path)?;
        tracing::info!("Loaded form descriptor from {}", path.display());
        return Ok(descriptor);
    }

    let Some(url) = &args.url else {
        anyhow::bail!(ProbeError::Setup("missing target: pass --url or --form-file".to_string()));
    };
    match (&args.username_field, &args.password_field) {
        (Some(username_field), Some(password_field)) => {
            descriptor_from_flags(args, url, username_field, password_field)
        }
        (None, None) => {
            let discovered = discover_form(client, settings, url)
                .await
                .with_context(|| format!("Failed to discover the login form at {}", url))?;
            apply_overrides(discovered, args)
        }
        _ => anyhow::bail!(ProbeError::Setup(format!(
            "incomplete login form for {}: pass both --username-field and --password-field, or neither to discover it",
            url
        ))),
    }
}

fn http_settings(config: &ProbeConfig, verbose: bool) -> HttpSettings {
    HttpSettings {
        user_agent: config.http.user_agent.clone(),
        max_redirects: config.http.max_redirects,
        verbose,
    }
}

fn http_client(config: &ProbeConfig) -> Result<HttpClient> {
    let connect_timeout = (config.http.connect_timeout_s > 0)
        .then(|| Duration::from_secs(config.http.connect_timeout_s));
    Ok(build_client(connect_timeout)?)
}

fn save_descriptor(path: &Path, descriptor: &FormDescriptor) -> Result<()> {
    fs::write_json(path, descriptor)?;
    tracing::info!("Form descriptor written to {}", path.display());
    Ok(())
}

async fn build_submitter(args: &ProbeArgs, config: &ProbeConfig, verbose: bool) -> Result<Box<dyn Submitter>> {
    let settings = http_settings(config, verbose);
    let client = http_client(config)?;

    match SubmitterKind::from_flags(args.basic_auth) {
        SubmitterKind::BasicAuth => {
            let Some(url) = &args.url else {
                anyhow::bail!(ProbeError::Setup("basic-auth mode requires --url".to_string()));
            };
            Ok(Box::new(BasicAuthSubmitter::new(url, settings, client)?))
        }
        SubmitterKind::Form => {
            let descriptor = form_descriptor(args, &client, &settings).await?;
            if let Some(path) = &args.save_form {
                save_descriptor(path, &descriptor)?;
            }
            Ok(Box::new(FormSubmitter::new(descriptor, settings, client)?))
        }
    }
}

async fn discover(args: &DiscoverArgs, config: &ProbeConfig, verbose: bool) -> Result<()> {
    let client = http_client(config)?;
    let descriptor = discover_form(&client, &http_settings(config, verbose), &args.url)
        .await
        .with_context(|| format!("Failed to discover the login form at {}", args.url))?;

    match &args.output {
        Some(path) => save_descriptor(path, &descriptor),
        None => {
            println!("{}", serde_json::to_string_pretty(&descriptor).context("Failed to serialize form descriptor")?);
            Ok(())
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

async fn probe(cli: &Cli, config: &ProbeConfig) -> Result<()> {
    let args = &cli.probe;
    let verbose = cli.verbose || cli.debug;

    let Some(usernames) = &args.usernames else {
        anyhow::bail!(ProbeError::Setup("--usernames is required".to_string()));
    };
    let usernames = fs::read_list(usernames)?;
    if usernames.is_empty() {
        anyhow::bail!(ProbeError::Setup("username list is empty".to_string()));
    }

    let submitter = build_submitter(args, config, verbose).await?;

    let passwords = match &args.passwords {
        Some(list) => fs::read_list(list)?,
        None => {
            let seed = args.url.as_deref().unwrap_or(submitter.target());
            passwords::generate(&generator_options(&args.generator, config, Some(seed)))
        }
    };
    if passwords.is_empty() {
        anyhow::bail!(ProbeError::Setup("password list is empty".to_string()));
    }

    let wait_s = args.wait.unwrap_or(config.pacing.wait_s);
    let jitter_s = args.jitter.unwrap_or(config.pacing.jitter_s);
    let orchestrator = Orchestrator::new(submitter, usernames, passwords, Pacing::from_secs(wait_s, jitter_s));

    printer::print_plan(&printer::RunPlan {
        mode: orchestrator.submitter().kind().as_str(),
        target: orchestrator.submitter().target(),
        usernames: orchestrator.username_count(),
        passwords: orchestrator.password_count(),
        wait_s,
        jitter_s,
        estimated_minutes: orchestrator.estimated_duration_minutes(),
    });

    if !args.yes && !confirm("Start probing?")? {
        println!("Aborted, no request sent.");
        return Ok(());
    }

    // Request dumps and a redrawing bar do not mix.
    let progress = if verbose {
        ProbeProgress::hidden(orchestrator.total_attempts())
    } else {
        ProbeProgress::new(orchestrator.total_attempts())
    };
    let bar = progress.handle();
    let mut orchestrator = orchestrator.with_observer(Box::new(progress));

    let candidates = match orchestrator.run().await {
        Ok(candidates) => candidates,
        Err(e) => {
            bar.abandon_with_message("run aborted");
            if !orchestrator.candidates().is_empty() {
                println!("Candidates found before the run stopped:");
                printer::print_candidates(orchestrator.candidates());
            }
            return Err(e).context("Probe run aborted");
        }
    };
    bar.finish_with_message("done");

    printer::print_candidates(&candidates);
    Ok(())
}
