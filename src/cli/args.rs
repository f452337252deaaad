use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "loginprobe", version, author = "loginprobe")]
#[command(about = "Differential-response credential prober for authorized login testing")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub probe: ProbeArgs,

    /// Verbose human output (logs every request and response)
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue, global = true)]
    pub debug: bool,

    /// Path to a loginprobe.toml configuration file
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the generated password list without probing anything
    Generate(GeneratorArgs),
    /// Scrape a login page and print (or save) its form descriptor
    Discover(DiscoverArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Login page serving the form
    #[arg(short = 'u', long = "url")]
    pub url: String,

    /// Write the descriptor here instead of printing it
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Use HTTP Basic authentication instead of posting a login form
    #[arg(long = "basic-auth", action = ArgAction::SetTrue)]
    pub basic_auth: bool,

    /// Target URL (login page in form mode, protected resource in basic-auth mode).
    /// Without --form-file or field flags the login form is discovered from it
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// JSON form descriptor to post with
    #[arg(long = "form-file", value_name = "PATH")]
    pub form_file: Option<PathBuf>,

    /// Form field carrying the username
    #[arg(long = "username-field")]
    pub username_field: Option<String>,

    /// Form field carrying the password
    #[arg(long = "password-field")]
    pub password_field: Option<String>,

    /// Path (or absolute URL) the form posts to
    #[arg(long = "action-path")]
    pub action_path: Option<String>,

    /// Referer header sent with each submission
    #[arg(long = "referer")]
    pub referer: Option<String>,

    /// Form field carrying the CSRF token
    #[arg(long = "token-name", default_value = "authenticity_token")]
    pub token_name: String,

    /// Submit the form as a JSON object instead of form-encoded
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Extra static form field sent with every submission (repeatable)
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Write the effective form descriptor to this path for later runs
    #[arg(long = "save-form", value_name = "PATH")]
    pub save_form: Option<PathBuf>,

    /// Comma-separated usernames or a file with one username per line
    #[arg(long = "usernames", value_name = "LIST|FILE")]
    pub usernames: Option<String>,

    /// Comma-separated passwords or a file with one per line (skips generation)
    #[arg(long = "passwords", value_name = "LIST|FILE")]
    pub passwords: Option<String>,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Seconds to wait after each attempt
    #[arg(long = "wait", value_name = "SECS")]
    pub wait: Option<u64>,

    /// Upper bound in seconds of the random delay added to the wait
    #[arg(long = "jitter", value_name = "SECS")]
    pub jitter: Option<u64>,

    /// Do not ask for confirmation before starting
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorArgs {
    /// Organization name or URL to derive passwords from (defaults to the target URL)
    #[arg(long = "org-or-url")]
    pub org_or_url: Option<String>,

    /// First name to derive birth-year passwords from
    #[arg(long = "first-name")]
    pub first_name: Option<String>,

    /// 0: base list, 1: +capitalized, 2: +leet-speak, 3: leet-speak then capitalized
    #[arg(long = "depth")]
    pub depth: Option<u8>,
}
