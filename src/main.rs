mod app;
mod cli;
mod config;
mod core;
mod passwords;
mod submitters;
mod ui;
mod utils;

use clap::Parser;
use human_panic::setup_panic;

#[tokio::main]
async fn main() {
    setup_panic!();

    let cli = cli::args::Cli::parse();
    if let Err(err) = app::run(cli).await {
        eprintln!("fatal: {:#}", err);
        std::process::exit(1);
    }
}
