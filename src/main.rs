use anyhow::Result;
use api_client::{Api, ApiClient};
use args::{Args, Command};
use clap::Parser;
use runner::{Runner, SettingsOutcome};
use settings::{Settings, SettingsStore};
use std::io::{self, Write};

mod api_client;
mod args;
mod article;
mod error;
mod readable;
mod runner;
mod settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let store = args.settings_store()?;
    log::debug!("Using settings at {}", store.path().display());
    let stdout = io::stdout();

    dispatch(&args, &store, stdout.lock(), |settings| {
        ApiClient::new(&args.base_url, settings)
    })
}

/// Runs `settings` unconditionally; every other command only once stored
/// settings load and validate, and only then is `connect` invoked.
fn dispatch<A, W, F>(args: &Args, store: &SettingsStore, mut out: W, connect: F) -> Result<()>
where
    A: Api,
    W: Write,
    F: FnOnce(Settings) -> error::Result<A>,
{
    if let Command::Settings { show, .. } = &args.command {
        let outcome = runner::settings(store, *show, args.command.settings_updates(), &mut out)?;
        if outcome == SettingsOutcome::NothingToDo {
            write!(out, "{}", Args::settings_usage())?;
        }
        return Ok(());
    }

    let settings = match store.load().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) if e.is_config() => {
            writeln!(out, "{}", e)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut runner = Runner::new(connect(settings)?, out);
    match &args.command {
        Command::Add { url } => runner.add(url),
        Command::List {
            count,
            since,
            reverse,
        } => runner.list(*count, *since, *reverse),
        Command::Read { url } => runner.read(url),
        Command::Search { query } => runner.search(query),
        Command::Limit => runner.limit(),
        Command::Settings { .. } => Ok(()),
    }
}
