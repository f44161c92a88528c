//! LifeLine CLI - terminal client for the LifeLine assistant.

mod app;
mod commands;
mod output;

use app::App;
use clap::{Parser, Subcommand};
use lifeline_config::{Config, Paths};
use lifeline_state::{PreferencesUpdate, Theme};
use tracing::debug;

/// LifeLine CLI - Chat with your assistant and manage preferences and sessions.
#[derive(Parser)]
#[command(name = "lifeline")]
#[command(about = "LifeLine CLI for chatting and managing preferences and sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Backend base URL; overrides the config file
    #[arg(long, global = true, env = "LIFELINE_API_URL")]
    api_url: Option<String>,

    /// Chat socket URL; overrides the config file
    #[arg(long, global = true, env = "LIFELINE_WS_URL")]
    ws_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Open an existing session
        #[arg(short, long)]
        session: Option<i64>,
    },

    /// Manage preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Set the theme (system, light, or dark)
    Theme {
        #[arg(value_parser = parse_theme)]
        theme: Theme,
    },

    /// Complete first-run setup
    Onboard {
        /// Your name
        name: String,
        /// Theme (system, light, or dark)
        #[arg(short, long, default_value = "system", value_parser = parse_theme)]
        theme: Theme,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show preferences
    Show,
    /// Update preferences
    Set {
        /// Display name
        #[arg(long, conflicts_with = "clear_name")]
        name: Option<String>,
        /// Remove the display name
        #[arg(long)]
        clear_name: bool,
        /// Theme (system, light, or dark)
        #[arg(long, value_parser = parse_theme)]
        theme: Option<Theme>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f64>,
        /// Maximum reply tokens
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions
    List,
    /// Create a new session
    New,
    /// Delete a session
    Delete {
        /// Session ID
        id: i64,
    },
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    raw.parse::<Theme>().map_err(|e| e.to_string())
}

/// Config file, then environment, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<(Config, Paths)> {
    let paths = Paths::new()?;
    let mut config = Config::load(&paths)?;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(url) = &cli.ws_url {
        config.chat_socket_url = url.clone();
    }
    config.validate()?;
    Ok((config, paths))
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let mut app = App::from_config(&config)?;
    let format = cli.format;

    match cli.command {
        Commands::Chat { session } => commands::chat(&mut app, session, &format).await,
        Commands::Prefs { command } => match command {
            PrefsCommands::Show => commands::prefs_show(&app.store, &format).await,
            PrefsCommands::Set {
                name,
                clear_name,
                theme,
                model,
                temperature,
                max_tokens,
            } => {
                let update = PreferencesUpdate {
                    name: if clear_name { Some(None) } else { name.map(Some) },
                    theme,
                    model,
                    temperature,
                    max_tokens,
                };
                commands::prefs_set(&app.store, update, &format).await
            }
        },
        Commands::Theme { theme } => commands::theme(&app.store, theme, &format).await,
        Commands::Onboard { name, theme } => {
            commands::onboard(&app.store, &name, theme, &format).await
        }
        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions_list(&app.store, &format).await,
            SessionCommands::New => commands::sessions_new(&app.store, &format).await,
            SessionCommands::Delete { id } => {
                commands::sessions_delete(&app.store, id, &format).await
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    let (config, paths) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            output::print_error(&e.to_string(), &format);
            std::process::exit(2);
        }
    };

    // The CLI owns the terminal; logs go to the JSONL file only.
    lifeline_config::init_logging("cli", &config.log_level, &paths, false);
    debug!(api = %config.api_base_url, socket = %config.chat_socket_url, "Starting CLI");

    if let Err(e) = run(cli, config).await {
        output::print_error(&e.to_string(), &format);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prefs_set() {
        let cli = Cli::try_parse_from([
            "lifeline", "prefs", "set", "--theme", "dark", "--max-tokens", "800",
        ])
        .unwrap();

        match cli.command {
            Commands::Prefs {
                command:
                    PrefsCommands::Set {
                        theme, max_tokens, ..
                    },
            } => {
                assert_eq!(theme, Some(Theme::Dark));
                assert_eq!(max_tokens, Some(800));
            }
            _ => panic!("expected prefs set"),
        }
    }

    #[test]
    fn test_rejects_unknown_theme() {
        assert!(Cli::try_parse_from(["lifeline", "theme", "sepia"]).is_err());
    }

    #[test]
    fn test_name_conflicts_with_clear_name() {
        assert!(Cli::try_parse_from([
            "lifeline", "prefs", "set", "--name", "Ada", "--clear-name"
        ])
        .is_err());
    }
}
