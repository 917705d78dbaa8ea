//! Debate runner
//!
//! Runs one debate session end to end with the built-in template provider
//! and prints the transcript and verdict.
//!
//! # Usage
//!
//! ```bash
//! # Default topic and personas
//! debate
//!
//! # Custom topic, personas and JSON output
//! debate "Is remote work better than office work?" --agent-a economist --json
//!
//! # Configuration from file and environment, events to a JSONL log
//! DEBATE_MAX_RETRIES=3 debate --config debate.toml --events events.jsonl
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use debate_coordination::{
    DebateOutcome, JsonlSink, SessionConfig, SpeakerBindings, StaticPersonaResolver,
    TemplateProvider, TurnController,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Debate topic
    #[arg(default_value = "Should AI be regulated like medicine?")]
    topic: String,

    /// Persona bound to speaker A
    #[arg(long, default_value = "scientist")]
    agent_a: String,

    /// Persona bound to speaker B
    #[arg(long, default_value = "philosopher")]
    agent_b: String,

    /// Total rounds (overrides DEBATE_TOTAL_ROUNDS / config file)
    #[arg(long)]
    rounds: Option<u32>,

    /// Retries per round (overrides DEBATE_MAX_RETRIES / config file)
    #[arg(long)]
    max_retries: Option<u32>,

    /// TOML session config; environment variables are ignored when given
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every debate event to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Print the outcome as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debate_coordination=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::from_env(),
    };
    if let Some(rounds) = args.rounds {
        config.total_rounds = rounds;
    }
    if let Some(retries) = args.max_retries {
        config.max_retries = retries;
    }

    let bindings = SpeakerBindings::resolve(
        &args.agent_a,
        &args.agent_b,
        &StaticPersonaResolver::default(),
    );
    // The controller logs its own transitions and turns.
    let mut controller = TurnController::open(&args.topic, bindings, config)?;
    if let Some(path) = &args.events {
        let file = File::create(path)
            .with_context(|| format!("failed to create events file {}", path.display()))?;
        controller = controller.with_sink(Box::new(JsonlSink::new(BufWriter::new(file))));
    }

    let run = controller.run(&mut TemplateProvider::new()).map(|_| ());
    if let Err(e) = run {
        tracing::warn!(
            error = %e,
            status = %controller.state().status_line(),
            "Debate did not complete"
        );
    }

    let outcome = controller
        .outcome()
        .context("debate stopped in a non-terminal state")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.is_complete() {
        bail!("{}", outcome.summary_line());
    }
    Ok(())
}

fn print_outcome(outcome: &DebateOutcome) {
    println!("{}", outcome.summary_line());
    println!();
    for turn in &outcome.transcript {
        println!("R{} {} ({}): {}", turn.round, turn.speaker, turn.persona, turn.text);
    }
    if let Some(verdict) = &outcome.verdict {
        println!();
        for (speaker, card) in &verdict.breakdown {
            println!(
                "{}: total={:.3} quality={:.3} coherence={:.3} relevance={:.3}",
                speaker, card.total, card.argument_quality, card.coherence, card.relevance
            );
        }
        println!("{}", verdict.rationale);
    }
}
