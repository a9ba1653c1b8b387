mod commands;
mod embeds;
mod fake;
mod sync;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use statuswatch_core::client::ChannelKind;
use statuswatch_core::config::{Config, ConfigError};
use statuswatch_core::store::StatusStore;

use commands::{CommandAction, CommandHandler, CommandRequest};
use embeds::EmbedStyle;
use fake::InMemoryChat;
use sync::ChannelSync;

/// Current version, substituted into activity and footer placeholders
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "statuswatch")]
#[command(about = "Service status registry with channel report sync", long_about = None)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Path to the durable status store
    #[arg(long, default_value = "status.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config template
    Init,
    /// Run the command console against the in-memory chat client
    Demo {
        /// Treat the status channel as an announcement channel
        #[arg(long)]
        announcement: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            if let Err(e) = Config::write_default(&cli.config) {
                error!(error = %e, "failed to write default config");
                std::process::exit(1);
            }
            println!("Wrote {}", cli.config.display());
        }
        Some(Commands::Demo { announcement }) => {
            demo(&cli.config, &cli.store, announcement).await;
        }
        None => demo(&cli.config, &cli.store, false).await,
    }
}

/// Load config, creating the template first when none exists
fn load_config(path: &Path) -> Config {
    let loaded = match Config::load(path) {
        Err(ConfigError::NotFound { .. }) => {
            Config::write_default(path).and_then(|()| Config::load(path))
        }
        other => other,
    };
    match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(path = %path.display(), error = %e, "cannot load configuration");
            std::process::exit(1);
        }
    }
}

async fn demo(config_path: &Path, store_path: &Path, announcement: bool) {
    let config = Arc::new(load_config(config_path));

    let store = match StatusStore::open(store_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(path = %store_path.display(), error = %e, "cannot open status store");
            std::process::exit(1);
        }
    };

    let style = EmbedStyle::from_config(&config.embeds, VERSION);
    let client = Arc::new(InMemoryChat::new());
    let kind = if announcement {
        ChannelKind::Announcement
    } else {
        ChannelKind::Text
    };
    client.add_channel(&config.status.status_channel_id, kind);

    let handler = CommandHandler::new(store.clone(), config.clone(), style.clone());
    let syncer = ChannelSync::new(client.clone(), config.clone(), style);
    tokio::spawn(syncer.run(store.subscribe()));

    // Demo runs look like an operator with the first configured admin role
    let caller_roles = config.bot.administrator_role_ids.clone();

    println!("statuswatch {VERSION} demo console");
    println!("commands: add, update, remove, list, show, quit");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let tokens = tokenize(&line);
        let Some(action) = parse_action(&tokens) else {
            match tokens.first().map(String::as_str) {
                Some("quit") | Some("exit") => break,
                Some("show") => {
                    show_channel(&client, &config);
                    continue;
                }
                Some(_) => {
                    println!("unrecognized command");
                    continue;
                }
                None => continue,
            }
        };

        let reply = handler
            .handle(CommandRequest {
                caller_id: "console".to_string(),
                caller_roles: caller_roles.clone(),
                action,
            })
            .await;
        if let Some(title) = &reply.title {
            println!("{title}");
        }
        println!("{}", reply.description);

        // Give the spawned sync cycle a beat before the next prompt so
        // `show` reflects it
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

fn show_channel(client: &InMemoryChat, config: &Config) {
    let channel_id = &config.status.status_channel_id;
    println!("channel name: {}", client.channel_name(channel_id));
    for embed in client.embeds(channel_id) {
        if let Some(title) = &embed.title {
            println!("--- {title} (#{:06x})", embed.color);
        }
        println!("{}", embed.description);
    }
}

/// Parse a console line into a command action, or None for non-command input
fn parse_action(tokens: &[String]) -> Option<CommandAction> {
    let mut it = tokens.iter();
    match it.next().map(String::as_str)? {
        "add" => Some(CommandAction::Add {
            service_id: it.next()?.clone(),
            display_name: it.next()?.clone(),
            description: it.next()?.clone(),
            parent_id: it.next().cloned(),
        }),
        "update" => {
            let service_id = it.next()?.clone();
            let status = it.next()?.clone();
            let rest: Vec<&String> = it.collect();
            let clear_outage = rest.iter().any(|t| t.as_str() == "--clear-outage");
            let mut positional = rest.iter().filter(|t| t.as_str() != "--clear-outage");
            Some(CommandAction::Update {
                service_id,
                status,
                description: positional.next().map(|t| t.to_string()),
                outage_description: positional.next().map(|t| t.to_string()),
                clear_outage,
            })
        }
        "remove" => Some(CommandAction::Remove {
            service_id: it.next()?.clone(),
        }),
        "list" => Some(CommandAction::List),
        _ => None,
    }
}

/// Whitespace tokenizer with double-quote grouping
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.trim().chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_words() {
        assert_eq!(tokenize("remove api"), vec!["remove", "api"]);
    }

    #[test]
    fn test_tokenize_quoted_groups() {
        assert_eq!(
            tokenize(r#"add api "Core API" "The main API""#),
            vec!["add", "api", "Core API", "The main API"]
        );
    }

    #[test]
    fn test_tokenize_empty_line() {
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_parse_add_with_parent() {
        let tokens = tokenize(r#"add db "DB" "Database" api"#);
        let Some(CommandAction::Add {
            service_id,
            display_name,
            parent_id,
            ..
        }) = parse_action(&tokens)
        else {
            panic!("expected add");
        };
        assert_eq!(service_id, "db");
        assert_eq!(display_name, "DB");
        assert_eq!(parent_id.as_deref(), Some("api"));
    }

    #[test]
    fn test_parse_update_with_clear_flag() {
        let tokens = tokenize("update db operational --clear-outage");
        let Some(CommandAction::Update {
            status,
            clear_outage,
            description,
            ..
        }) = parse_action(&tokens)
        else {
            panic!("expected update");
        };
        assert_eq!(status, "operational");
        assert!(clear_outage);
        assert!(description.is_none());
    }

    #[test]
    fn test_parse_unknown_is_none() {
        assert!(parse_action(&tokenize("frobnicate api")).is_none());
    }
}
