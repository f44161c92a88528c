//! Interactive chat.

use crate::app::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use lifeline_channel::{ChannelError, ChannelEvent, MessageKind};
use lifeline_state::Theme;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Message(String),
    NewChat,
    ListSessions,
    Switch(i64),
    Quit,
    Help,
    Invalid(String),
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), None) => Input::Quit,
        (Some("new"), None) => Input::NewChat,
        (Some("sessions"), None) => Input::ListSessions,
        (Some("help"), None) => Input::Help,
        (Some("switch"), Some(id)) => match id.parse() {
            Ok(id) => Input::Switch(id),
            Err(_) => Input::Invalid(format!("not a session id: {id}")),
        },
        _ => Input::Invalid(format!("unknown command: /{command}")),
    }
}

const HELP: &str = "Commands: /new, /sessions, /switch ID, /help, /quit";

/// Text for a channel event, or `None` when it is not shown.
fn describe_event(event: &ChannelEvent) -> Option<String> {
    match event {
        ChannelEvent::Connected => Some("[connected]".to_string()),
        ChannelEvent::Disconnected(Some(reason)) => Some(format!("[disconnected: {reason}]")),
        ChannelEvent::Disconnected(None) => Some("[disconnected]".to_string()),
        ChannelEvent::Reconnecting { attempt, delay } => Some(format!(
            "[reconnecting in {:.1}s, attempt {attempt}]",
            delay.as_secs_f64()
        )),
        ChannelEvent::GaveUp => Some("[gave up reconnecting; restart to try again]".to_string()),
        ChannelEvent::MessageAppended(message) => match message.kind {
            MessageKind::Assistant => Some(format!("assistant> {}", message.content)),
            MessageKind::Error => Some(format!("error> {}", message.content)),
            MessageKind::User | MessageKind::Thinking => None,
        },
        ChannelEvent::ThinkingChanged(true) => Some("... thinking".to_string()),
        ChannelEvent::Connecting
        | ChannelEvent::ThinkingChanged(false)
        | ChannelEvent::FrameDropped(_)
        | ChannelEvent::TranscriptCleared => None,
    }
}

fn render_event(event: &ChannelEvent, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            if let Some(text) = describe_event(event) {
                println!("{}", text);
            }
        }
        OutputFormat::Json => {
            if let ChannelEvent::MessageAppended(message) = event {
                if message.kind.is_visible() && message.kind != MessageKind::User {
                    output::print_json(message);
                }
            }
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    Ok(lines.next_line().await?)
}

/// Ask for a name (and optional theme) until onboarding succeeds or input ends.
async fn run_onboarding(
    app: &App,
    lines: &mut Lines<BufReader<Stdin>>,
    format: &OutputFormat,
) -> Result<bool> {
    println!("Welcome to LifeLine! Let's get you set up.");
    loop {
        prompt("Your name: ");
        let Some(name) = read_line(lines).await? else {
            return Ok(false);
        };
        if name.trim().is_empty() {
            println!("Please enter a name.");
            continue;
        }

        prompt("Theme [system/light/dark] (system): ");
        let theme = match read_line(lines).await? {
            Some(raw) if !raw.trim().is_empty() => match raw.parse::<Theme>() {
                Ok(theme) => theme,
                Err(e) => {
                    output::print_error(&e.to_string(), format);
                    continue;
                }
            },
            Some(_) => Theme::System,
            None => return Ok(false),
        };

        match app.store.complete_onboarding(&name, theme).await {
            Ok(prefs) => {
                println!("Welcome, {}!", prefs.name.as_deref().unwrap_or(name.trim()));
                return Ok(true);
            }
            Err(e) => output::print_error(&e.to_string(), format),
        }
    }
}

/// Run the interactive chat loop.
pub async fn chat(app: &mut App, session: Option<i64>, format: &OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    app.store.load().await;
    if app.store.preferences().is_none() {
        anyhow::bail!("Could not load preferences. Is the LifeLine backend running?");
    }
    if app.store.needs_onboarding() && !run_onboarding(app, &mut lines, format).await? {
        return Ok(());
    }

    if let Some(id) = session {
        if !app.store.sessions().iter().any(|s| s.id == id) {
            anyhow::bail!("Session {} not found", id);
        }
        app.switch_session(Some(id));
    }

    let mut events = app.channel.subscribe();
    app.connect();
    if *format == OutputFormat::Text {
        println!("{}", HELP);
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Quit => break,
                    Input::Help => println!("{}", HELP),
                    Input::Invalid(reason) => output::print_error(&reason, format),
                    Input::ListSessions => {
                        if let Err(e) = app.store.refresh_sessions().await {
                            output::print_error(&e.to_string(), format);
                        }
                        output::print_sessions(&app.store.sessions(), app.store.current_session_id(), format);
                    }
                    Input::NewChat => match app.new_chat().await {
                        Some(id) => output::print_success(&format!("Started session {}", id), format),
                        None => output::print_error("Could not create a new session", format),
                    },
                    Input::Switch(id) => {
                        if app.store.sessions().iter().any(|s| s.id == id) {
                            app.switch_session(Some(id));
                            output::print_success(&format!("Switched to session {}", id), format);
                        } else {
                            output::print_error(&format!("Session {} not found", id), format);
                        }
                    }
                    Input::Message(text) => match app.channel.send(&text) {
                        Ok(message) => debug!(id = message.id, "Sent message"),
                        Err(ChannelError::NotConnected) => {
                            output::print_error("Not connected; message not sent", format);
                        }
                        Err(e) => output::print_error(&e.to_string(), format),
                    },
                }
            }
            event = events.recv() => match event {
                Ok(event) => render_event(&event, format),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Chat output lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    app.shutdown().await;
    Ok(())
}
