use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use memchat_core::MemoryChatClient;
use memchat_core::chat::ChatBackend;
use memchat_core::memory::MemoryStore;
use memchat_core::pipeline::{RejectReason, SubmitOutcome};
use memchat_core::session::{ClientEvent, EventReceiver, Session, TurnRole};
use memchat_infrastructure::JsonFileMemoryStore;
use memchat_interaction::{ClientConfig, DemoChatBackend, RemoteChatBackend, RemoteMemoryStore};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/remember".to_string(),
                "/forget".to_string(),
                "/facts".to_string(),
                "/stats".to_string(),
                "/memory".to_string(),
                "/help".to_string(),
                "/quit".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Prints client events as they arrive: turns, failures, and stats.
fn spawn_event_printer(mut rx: EventReceiver) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ClientEvent::TurnStarted => {}
                ClientEvent::TurnEmitted { turn } => match turn.role {
                    TurnRole::User => {}
                    TurnRole::Assistant => {
                        for line in turn.text.lines() {
                            println!("{}", line.bright_blue());
                        }
                        if !turn.used_facts.is_empty() {
                            let keys: Vec<&str> =
                                turn.used_facts.iter().map(|f| f.key.as_str()).collect();
                            println!(
                                "{}",
                                format!(
                                    "(used {} memor{}: {})",
                                    keys.len(),
                                    if keys.len() == 1 { "y" } else { "ies" },
                                    keys.join(", ")
                                )
                                .bright_black()
                            );
                        }
                        println!();
                    }
                },
                ClientEvent::TurnFailed { message } => {
                    eprintln!("{}", format!("Exchange failed: {}", message).red());
                }
                ClientEvent::StatsChanged { stats } => {
                    println!(
                        "{}",
                        format!(
                            "[memories: {} | conversations: {}]",
                            stats.total_facts, stats.conversation_turns
                        )
                        .bright_black()
                    );
                }
            }
        }
    });
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    println!("  /remember <key> <value>  store a fact");
    println!("  /forget                  clear all facts (asks for confirmation)");
    println!("  /facts                   list stored facts");
    println!("  /stats                   show session statistics");
    println!("  /memory                  toggle memory usage for exchanges");
    println!("  /quit                    exit");
    println!("Anything else is sent to the assistant.");
}

/// The main entry point for the memchat REPL.
///
/// Builds a client in one of two modes:
/// - default: device-local fact store plus the offline demo backend
/// - `--remote`: service-backed store and chat transport from the
///   client configuration
/// then loops on user input, sending slash commands to the memory
/// surface and everything else through the message pipeline.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let remote = std::env::args().any(|arg| arg == "--remote");

    // ===== Backend Initialization =====
    let (client, rx) = if remote {
        let config = ClientConfig::load()?;
        let session = Session::new();
        let store: Arc<dyn MemoryStore> =
            Arc::new(RemoteMemoryStore::from_config(&config, session.id()));
        let backend = RemoteChatBackend::from_config(&config);

        match backend.health().await {
            Ok(health) => println!(
                "{}",
                format!(
                    "Connected to {} (status: {}, active sessions: {})",
                    config.base_url, health.status, health.active_sessions
                )
                .bright_green()
            ),
            Err(e) => eprintln!(
                "{}",
                format!("Warning: health check failed: {}", e).yellow()
            ),
        }

        MemoryChatClient::with_session(session, store, Arc::new(backend))
    } else {
        let store = Arc::new(JsonFileMemoryStore::default_location()?);
        let backend: Arc<dyn ChatBackend> = Arc::new(DemoChatBackend::new(store.clone()));
        MemoryChatClient::new(store, backend)
    };

    spawn_event_printer(rx);

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== memchat ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Session {}", client.session_id()).bright_black()
    );
    println!(
        "{}",
        "Type a message to chat, or '/help' for commands.".bright_black()
    );
    println!();

    let mut use_memory = true;

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match trimmed.split_whitespace().next().unwrap_or_default() {
                    "/quit" | "/exit" => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    "/help" => print_help(),
                    "/memory" => {
                        use_memory = !use_memory;
                        println!(
                            "{}",
                            format!(
                                "Memory usage is now {}",
                                if use_memory { "on" } else { "off" }
                            )
                            .bright_yellow()
                        );
                    }
                    "/remember" => {
                        let rest = trimmed.trim_start_matches("/remember").trim();
                        let Some((key, value)) = rest.split_once(char::is_whitespace) else {
                            eprintln!("{}", "Usage: /remember <key> <value>".yellow());
                            continue;
                        };
                        if let Err(e) = client.add_fact(key, value).await {
                            eprintln!("{}", format!("Could not store fact: {}", e).red());
                        }
                    }
                    "/forget" => {
                        let confirm = rl.readline("Clear all memories? This cannot be undone (y/N): ");
                        match confirm {
                            Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                                if let Err(e) = client.clear_facts().await {
                                    eprintln!(
                                        "{}",
                                        format!("Could not clear memories: {}", e).red()
                                    );
                                }
                            }
                            _ => println!("{}", "Cancelled.".bright_black()),
                        }
                    }
                    "/facts" => match client.list_facts().await {
                        Ok(facts) if facts.is_empty() => {
                            println!("{}", "No memories stored yet".bright_black());
                        }
                        Ok(facts) => {
                            for fact in facts {
                                println!(
                                    "  {} {}",
                                    fact.key.bright_cyan(),
                                    format!("(accessed {}x)", fact.access_count).bright_black()
                                );
                            }
                        }
                        Err(e) => {
                            eprintln!("{}", format!("Could not list facts: {}", e).red());
                        }
                    },
                    "/stats" => match client.current_stats().await {
                        Ok(stats) => println!(
                            "{}",
                            format!(
                                "memories: {} | conversations: {}",
                                stats.total_facts, stats.conversation_turns
                            )
                            .bright_yellow()
                        ),
                        Err(e) => {
                            eprintln!("{}", format!("Could not fetch stats: {}", e).red());
                        }
                    },
                    _ => match client.submit(trimmed, use_memory).await {
                        Ok(SubmitOutcome::Rejected(RejectReason::Busy)) => {
                            println!("{}", "Still waiting on the previous message".yellow());
                        }
                        Ok(_) => {}
                        Err(e) => eprintln!("{}", format!("Submit failed: {}", e).red()),
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Readline error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
