//! DebateArena CLI - Watch two AI agents debate
//!
//! Sends a topic to the debate endpoint and reveals the rounds turn by turn.

use clap::{ArgAction, Parser};
use colored::Colorize;
use debatearena_core::{
    Config, DebateSession, SessionCallback, SessionEvent, SessionPhase, Speaker,
    TopicSuggestions, default_config,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "debatearena",
    version,
    about = "AI Debate Arena - Watch two AIs debate a topic",
    long_about = "Pick two debating agents and a round count, submit a topic, and watch the debate unfold turn by turn."
)]
struct Cli {
    /// The topic to debate
    #[arg(value_name = "TOPIC", required_unless_present_any = ["suggestion", "list_agents", "list_topics"])]
    topic: Option<String>,

    /// Agent arguing for the topic (name or id)
    #[arg(short = 'f', long, value_name = "AGENT")]
    first: Option<String>,

    /// Agent arguing against the topic (name or id)
    #[arg(short = 'a', long, value_name = "AGENT")]
    second: Option<String>,

    /// Number of debate rounds (1-10)
    #[arg(short, long, value_name = "ROUNDS", allow_negative_numbers = true)]
    rounds: Option<i64>,

    /// Debate one of the suggested topics instead (see --list-topics)
    #[arg(short, long, value_name = "INDEX", conflicts_with = "topic")]
    suggestion: Option<usize>,

    /// List the available agents and exit
    #[arg(long)]
    list_agents: bool,

    /// List the suggested topics and exit
    #[arg(long)]
    list_topics: bool,

    /// Path to a TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debate endpoint URL (overrides config and DEBATEARENA_ENDPOINT)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Simulated typing delay per turn, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };
    config.apply_env();
    if let Some(url) = &cli.endpoint {
        config.endpoint.url = url.clone();
    }
    if let Some(ms) = cli.delay_ms {
        config.reveal.turn_delay_ms = ms;
    }

    if cli.list_agents {
        print_agents(&config);
        return Ok(());
    }

    let suggestions = TopicSuggestions::new(config.topics.clone());
    if cli.list_topics {
        for (i, topic) in suggestions.all().iter().enumerate() {
            println!("  {:>2}. {}", i, topic);
        }
        return Ok(());
    }

    let session = DebateSession::from_config(&config)?.with_callback(create_console_callback());

    session.select_pair_by_key(cli.first.as_deref(), cli.second.as_deref())?;
    if let Some(rounds) = cli.rounds {
        if let Err(e) = session.set_round_count(rounds) {
            eprintln!("{} {}", "Warning:".yellow().bold(), e);
            eprintln!("Keeping {} rounds.", session.round_count());
        }
    }

    match (cli.suggestion, &cli.topic) {
        (Some(index), _) => {
            let topic = suggestions.get(index).ok_or_else(|| {
                format!(
                    "No suggested topic #{} (there are {}). Use --list-topics.",
                    index,
                    suggestions.all().len()
                )
            })?;
            session.pick_topic(topic);
        }
        (None, Some(topic)) => session.edit_topic(topic.as_str()),
        (None, None) => {}
    }

    let view = session.view();
    info!(endpoint = %config.endpoint.url, "Starting debate");

    // Print header
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        format!(
            "  {} - {} vs {}",
            "DebateArena".bold(),
            view.first.name,
            view.second.name
        )
        .bright_blue()
        .bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!(
        "  {} {} ({})   {} {} ({})   {} {}",
        "For:".bold(),
        view.first.name.bright_cyan(),
        view.first.id.dimmed(),
        "Against:".bold(),
        view.second.name.bright_magenta(),
        view.second.id.dimmed(),
        "Rounds:".bold(),
        view.rounds
    );
    println!("{}", "─".repeat(70).dimmed());

    // Errors are reported through the callback; the final phase decides the exit code.
    let phase = session
        .submit_draft()
        .await
        .unwrap_or_else(|_| session.phase());

    println!();
    println!("{}", "═".repeat(70).bright_blue());
    match phase {
        SessionPhase::Complete => {
            println!("{}", "  Debate concluded.".bright_green().bold());
            println!("{}", "═".repeat(70).bright_blue());
            println!();
            Ok(())
        }
        _ => {
            println!("{}", "  Debate did not complete.".bright_red().bold());
            println!("{}", "═".repeat(70).bright_blue());
            std::process::exit(1);
        }
    }
}

/// Initialize logging based on verbosity level.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_agents(config: &Config) {
    println!("{}", "Agents:".bold());
    for agent in &config.agents {
        let availability = if agent.available {
            "available".green()
        } else {
            "unavailable".red()
        };
        println!(
            "  {} {} [{}]",
            agent.name.bright_cyan(),
            format!("({})", agent.id).dimmed(),
            availability
        );
    }
}

/// Create a callback that prints session events to the console.
fn create_console_callback() -> SessionCallback {
    Box::new(move |event: SessionEvent| match event {
        SessionEvent::PhaseChanged(SessionPhase::Constructing) => {
            println!("{}", "  Constructing debate...".bright_blue().dimmed());
        }
        SessionEvent::PhaseChanged(_) => {}
        SessionEvent::TurnAppended(turn) => match turn.speaker {
            Speaker::User => {
                println!();
                println!("{} {}", "Topic:".bold(), turn.text.bright_white());
            }
            Speaker::Agent(agent) => {
                println!();
                println!("{} {}", "▶".bright_cyan(), agent.name.bright_cyan().bold());
                let wrapped = textwrap(&turn.text, 66);
                for line in wrapped.lines() {
                    println!("  {}", line);
                }
            }
        },
        SessionEvent::Typing { label, .. } => {
            println!();
            println!("  {}", label.dimmed().italic());
        }
        SessionEvent::TypingCleared => {}
        SessionEvent::Error(message) => {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        SessionEvent::Warning(message) => {
            eprintln!("{} {}", "Warning:".yellow().bold(), message);
        }
    })
}

/// Greedy word wrap to `width` columns, counted in characters.
fn textwrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if line_width > 0 && line_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if line_width > 0 {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(word);
        line_width += word_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}
