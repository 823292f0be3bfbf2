// src/cli.rs
use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::PipelineApi;
use crate::error::ControlError;
use crate::outreach::SendOutcome;
use crate::pipeline::{PipelineClient, PipelineState, Stage, StageStatus};
use crate::render;
use crate::shell;

#[derive(Parser)]
#[command(name = "talentscout")]
#[command(about = "Drive the TalentScout recruiting pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Backend base URL (overrides config and TALENTSCOUT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// File holding client state between sessions
    #[arg(long, global = true)]
    pub state_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive session (default)
    Shell,
    /// Print pipeline status and every data snapshot once
    Status,
    /// Run the stages in order, waiting for each one to finish
    Run {
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        persona: String,
        /// Stop after the deep scrape
        #[arg(long)]
        no_analyze: bool,
    },
    /// Check the LinkedIn inbox for replies
    CheckReplies,
    /// Generate a personalized outreach message
    Draft {
        #[arg(long)]
        candidate_id: String,
        /// Role to pitch; defaults to the last search role
        #[arg(long)]
        role: Option<String>,
    },
    /// Send an outreach message
    Send {
        #[arg(long)]
        candidate_id: String,
        #[arg(long)]
        message: String,
    },
}

pub async fn handle_command<A: PipelineApi>(
    command: Command,
    client: PipelineClient<A>,
) -> Result<()> {
    let outcome = match command {
        Command::Shell => shell::run_shell(&client).await,
        Command::Status => print_status(&client).await,
        Command::Run {
            role,
            location,
            persona,
            no_analyze,
        } => run_pipeline(&client, &role, &location, &persona, !no_analyze).await,
        Command::CheckReplies => match client.check_replies().await {
            Ok(_) => {
                println!("{}", client.snapshot().status_message);
                Ok(())
            }
            Err(e) => {
                println!("{}", client.snapshot().status_message);
                Err(e.into())
            }
        },
        Command::Draft { candidate_id, role } => {
            let draft = client.outreach().open(&candidate_id, role.as_deref()).await;
            println!("{}", draft.message_text);
            Ok(())
        }
        Command::Send {
            candidate_id,
            message,
        } => send_message(&client, &candidate_id, &message).await,
    };

    client.shutdown().await;
    outcome
}

async fn print_status<A: PipelineApi>(client: &PipelineClient<A>) -> Result<()> {
    client.load().await;
    let state = client.snapshot();

    println!("{}", render::render_status(&state));
    if state.sourced.is_empty() && !state.any_running() {
        println!("\n{}", render::render_welcome());
        return Ok(());
    }

    println!("\nSourced Candidates ({})", state.sourced.len());
    println!("{}", render::render_sourced(&state.sourced));
    if !state.ranked.is_empty() {
        println!("\nRanked Candidates");
        println!("{}", render::render_ranked(&state.ranked));
    }
    if !state.deep_scraped.is_empty() {
        println!("\nDeep Profile Search");
        println!("{}", render::render_deep_scraped(&state.deep_scraped));
    }
    if !state.results.is_empty() {
        println!("\nAI Analysis");
        println!("{}", render::render_results(&state.results));
    }
    Ok(())
}

async fn run_pipeline<A: PipelineApi>(
    client: &PipelineClient<A>,
    role: &str,
    location: &str,
    persona: &str,
    analyze: bool,
) -> Result<()> {
    client.load().await;
    let state = client.snapshot();
    if state.any_running() {
        bail!(
            "A stage is already running on the backend: {}",
            state.status_message
        );
    }

    let printer = spawn_progress_printer(client.subscribe());

    let mut stages = vec![Stage::Sourcing, Stage::Ranking, Stage::DeepScrape];
    if analyze {
        stages.push(Stage::Analyze);
    }

    let mut outcome = Ok(());
    for stage in stages {
        let started = match stage {
            Stage::Sourcing => client.start_sourcing(role, location).await,
            Stage::Ranking => client.start_ranking(persona).await,
            Stage::DeepScrape => client.start_deep_scrape().await,
            Stage::Analyze => client.start_analyze().await,
        };
        if let Err(e) = started {
            outcome = Err(stage_error(stage, e));
            break;
        }

        if client.wait_for(stage).await != StageStatus::Done {
            let message = client.snapshot().status_message;
            error!("{} ended in error: {}", stage, message);
            outcome = Err(anyhow::anyhow!("{} failed: {}", stage, message));
            break;
        }
        info!("{} finished", stage);
    }

    printer.abort();

    let state = client.snapshot();
    if !state.results.is_empty() {
        println!("\n{}", render::render_results(&state.results));
    } else if !state.deep_scraped.is_empty() {
        println!("\n{}", render::render_deep_scraped(&state.deep_scraped));
    }
    outcome
}

fn stage_error(stage: Stage, e: ControlError) -> anyhow::Error {
    error!("Could not start {}: {}", stage, e);
    anyhow::anyhow!("Could not start {}: {}", stage, e)
}

async fn send_message<A: PipelineApi>(
    client: &PipelineClient<A>,
    candidate_id: &str,
    message: &str,
) -> Result<()> {
    let outreach = client.outreach();
    outreach.compose(candidate_id, message).await;
    let outcome = outreach.send().await;

    if let Some(status) = outreach.draft().await.status {
        println!("{}", status);
    }
    match outcome {
        SendOutcome::Sent => Ok(()),
        SendOutcome::Rejected => bail!("Outreach to {} was rejected", candidate_id),
        SendOutcome::Unreachable => bail!("Backend unreachable"),
    }
}

/// Print a timestamped line whenever stage statuses or the status
/// message change.
pub(crate) fn spawn_progress_printer(mut rx: watch::Receiver<PipelineState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = rx.borrow_and_update().clone();
        while rx.changed().await.is_ok() {
            let next = rx.borrow_and_update().clone();
            if let Some(line) = render::render_progress(&last, &next) {
                println!("{} {}", Local::now().format("%H:%M:%S"), line);
            }
            last = next;
        }
    })
}
