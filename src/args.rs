use crate::{api_client::DEFAULT_BASE_URL, error::Result, settings::{Settings, SettingsStore}};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Read it later from the command line")]
pub struct Args {
    /// Settings file, defaults to <config dir>/readitlater/settings.json
    #[arg(long, global = true, env = "READITLATER_SETTINGS")]
    pub settings_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = DEFAULT_BASE_URL,
        env = "READITLATER_BASE_URL"
    )]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add url to readitlater
    Add {
        /// Url to add
        url: String,
    },

    /// List articles
    List {
        /// Number of articles to retrieve
        #[arg(long)]
        count: Option<u32>,

        /// Only retrieve articles added since this time
        #[arg(long)]
        since: Option<i64>,

        /// Reverse order of results
        #[arg(short, long)]
        reverse: bool,
    },

    /// Read text version of url
    Read {
        /// Url to read
        url: String,
    },

    /// Search articles
    Search {
        /// Search query
        query: String,
    },

    /// Print current API limits
    Limit,

    /// Show or configure settings
    Settings {
        /// API Key to use
        #[arg(long)]
        apikey: Option<String>,

        /// Username to use
        #[arg(long)]
        username: Option<String>,

        /// Password to use
        #[arg(long)]
        password: Option<String>,

        /// Show current settings
        #[arg(long)]
        show: bool,
    },
}

impl Args {
    pub fn settings_store(&self) -> Result<SettingsStore> {
        match &self.settings_file {
            Some(path) => Ok(SettingsStore::new(path)),
            None => SettingsStore::default_path().map(SettingsStore::new),
        }
    }

    pub fn settings_usage() -> String {
        let mut command = Args::command();
        command
            .find_subcommand_mut("settings")
            .map(|sub| sub.render_help().to_string())
            .unwrap_or_default()
    }
}

impl Command {
    /// Fields given to `settings`, keyed by their settings name.
    pub fn settings_updates(&self) -> Settings {
        match self {
            Command::Settings {
                apikey,
                username,
                password,
                ..
            } => [("apikey", apikey), ("username", username), ("password", password)]
                .into_iter()
                .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
                .collect(),
            _ => Settings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_flags() {
        let args = Args::try_parse_from(["readitlater", "list", "--count", "5", "-r"]).unwrap();
        assert_eq!(
            args.command,
            Command::List {
                count: Some(5),
                since: None,
                reverse: true
            }
        );
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn settings_updates_skip_absent_flags() {
        let args = Args::try_parse_from([
            "readitlater",
            "settings",
            "--username",
            "alice",
            "--apikey",
            "k3y",
        ])
        .unwrap();

        let updates = args.command.settings_updates();

        assert_eq!(updates.get("username"), Some("alice"));
        assert_eq!(updates.get("apikey"), Some("k3y"));
        assert_eq!(updates.get("password"), None);
    }

    #[test]
    fn settings_file_flag_overrides_default() {
        let args =
            Args::try_parse_from(["readitlater", "limit", "--settings-file", "/tmp/s.json"]).unwrap();
        let store = args.settings_store().unwrap();
        assert_eq!(store.path(), std::path::Path::new("/tmp/s.json"));
    }

    #[test]
    fn settings_usage_lists_flags() {
        let usage = Args::settings_usage();
        assert!(usage.contains("--apikey"));
        assert!(usage.contains("--show"));
    }

    #[test]
    fn command_requires_subcommand() {
        assert!(Args::try_parse_from(["readitlater"]).is_err());
        assert!(Args::try_parse_from(["readitlater", "add"]).is_err());
    }
}
