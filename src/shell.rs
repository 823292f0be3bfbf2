// src/shell.rs
//! Interactive operator session.
//!
//! Stage starts return immediately; a background printer reports status
//! changes while the poller runs. Form fields persist for the session and
//! feed every stage start.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::core::PipelineApi;
use crate::error::ControlError;
use crate::outreach::Outreach;
use crate::pipeline::PipelineClient;
use crate::render;
use crate::utils::normalize_input;

const HELP: &str = "\
Form:     role <text> | location <text> | persona <text>
Stages:   source | rank | deep-scrape | analyze
Views:    status | sourced | ranked | deep | results
Outreach: replies | reach-out <candidate_id> [role] | edit <text> | send | cancel
          help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Role(String),
    Location(String),
    Persona(String),
    Source,
    Rank,
    DeepScrape,
    Analyze,
    Status,
    Sourced,
    Ranked,
    Deep,
    Results,
    Replies,
    /// Role defaults to the last sourced role when omitted.
    ReachOut {
        candidate_id: String,
        role: Option<String>,
    },
    Edit(String),
    Send,
    Cancel,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "role" => ShellCommand::Role(rest.to_string()),
        "location" => ShellCommand::Location(rest.to_string()),
        "persona" => ShellCommand::Persona(rest.to_string()),
        "source" => ShellCommand::Source,
        "rank" => ShellCommand::Rank,
        "deep-scrape" | "scrape" => ShellCommand::DeepScrape,
        "analyze" => ShellCommand::Analyze,
        "status" => ShellCommand::Status,
        "sourced" => ShellCommand::Sourced,
        "ranked" => ShellCommand::Ranked,
        "deep" => ShellCommand::Deep,
        "results" => ShellCommand::Results,
        "replies" => ShellCommand::Replies,
        "reach-out" => {
            let (id, role) = match rest.split_once(char::is_whitespace) {
                Some((id, role)) => (id, normalize_input(role)),
                None => (rest, None),
            };
            match normalize_input(id) {
                Some(candidate_id) => ShellCommand::ReachOut { candidate_id, role },
                None => return Err("Usage: reach-out <candidate_id> [role]".to_string()),
            }
        }
        "edit" => ShellCommand::Edit(rest.to_string()),
        "send" => ShellCommand::Send,
        "cancel" => ShellCommand::Cancel,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type `help`.", other)),
    };
    Ok(Some(command))
}

pub async fn run_shell<A: PipelineApi>(client: &PipelineClient<A>) -> Result<()> {
    client.load().await;
    if let Some(role) = client.store().last_role().await {
        client.update_form(|form| form.role = role).await;
    }

    let state = client.snapshot();
    println!("{}", render::render_status(&state));
    if state.sourced.is_empty() && !state.any_running() {
        println!("\n{}", render::render_welcome());
    }
    println!("\n{}", HELP);

    let printer = crate::cli::spawn_progress_printer(client.subscribe());
    let outreach = client.outreach();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = execute(client, &outreach, command).await {
                    println!("❌ {}", e);
                }
            }
            Ok(None) => {}
            Err(message) => println!("{}", message),
        }
        prompt();
    }

    printer.abort();
    Ok(())
}

fn prompt() {
    print!("scout> ");
    if let Err(e) = std::io::stdout().flush() {
        debug!("Failed to flush prompt: {}", e);
    }
}

async fn execute<A: PipelineApi>(
    client: &PipelineClient<A>,
    outreach: &Outreach<A>,
    command: ShellCommand,
) -> Result<(), ControlError> {
    match command {
        ShellCommand::Role(role) => client.update_form(|form| form.role = role).await,
        ShellCommand::Location(location) => {
            client.update_form(|form| form.location = location).await
        }
        ShellCommand::Persona(persona) => {
            client.update_form(|form| form.persona = persona).await
        }
        ShellCommand::Source => {
            let form = client.form().await;
            client.start_sourcing(&form.role, &form.location).await?;
        }
        ShellCommand::Rank => {
            let form = client.form().await;
            client.start_ranking(&form.persona).await?;
        }
        ShellCommand::DeepScrape => client.start_deep_scrape().await?,
        ShellCommand::Analyze => client.start_analyze().await?,
        ShellCommand::Status => {
            let form = client.form().await;
            println!("{}", render::render_status(&client.snapshot()));
            println!(
                "  role: {} | location: {} | persona: {}",
                or_dash(&form.role),
                or_dash(&form.location),
                or_dash(&form.persona)
            );
        }
        ShellCommand::Sourced => {
            let state = client.snapshot();
            println!("Sourced Candidates ({})", state.sourced.len());
            println!("{}", render::render_sourced(&state.sourced));
        }
        ShellCommand::Ranked => println!("{}", render::render_ranked(&client.snapshot().ranked)),
        ShellCommand::Deep => {
            println!(
                "{}",
                render::render_deep_scraped(&client.snapshot().deep_scraped)
            )
        }
        ShellCommand::Results => {
            let state = client.snapshot();
            if state.results.is_empty() && state.sourced.is_empty() {
                println!("{}", render::render_welcome());
            } else {
                println!("{}", render::render_results(&state.results));
            }
        }
        ShellCommand::Replies => {
            let outcome = client.check_replies().await;
            println!("{}", client.snapshot().status_message);
            outcome?;
        }
        ShellCommand::ReachOut { candidate_id, role } => {
            let draft = outreach.open(&candidate_id, role.as_deref()).await;
            println!("{}", render::render_draft(&draft));
        }
        ShellCommand::Edit(text) => {
            if !outreach.draft().await.is_messaging {
                return Err(ControlError::Validation(
                    "Open a draft with `reach-out <candidate_id>` first.".to_string(),
                ));
            }
            outreach.edit(&text).await;
            println!("{}", render::render_draft(&outreach.draft().await));
        }
        ShellCommand::Send => {
            if !outreach.draft().await.is_messaging {
                return Err(ControlError::Validation("No outreach draft open.".to_string()));
            }
            outreach.send().await;
            println!("{}", render::render_draft(&outreach.draft().await));
        }
        ShellCommand::Cancel => outreach.cancel().await,
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "—"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LocalStore;
    use crate::pipeline::{Stage, StageStatus};
    use crate::testing::{Call, FakeApi};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_form_fields_keep_inner_spacing() {
        assert_eq!(
            parse_command("  role   AI Agent Developer ").unwrap(),
            Some(ShellCommand::Role("AI Agent Developer".to_string()))
        );
        assert_eq!(
            parse_command("persona").unwrap(),
            Some(ShellCommand::Persona(String::new()))
        );
    }

    #[test]
    fn test_parse_commands_and_errors() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("Deep-Scrape").unwrap(), Some(ShellCommand::DeepScrape));
        assert_eq!(
            parse_command("reach-out cand-42").unwrap(),
            Some(ShellCommand::ReachOut {
                candidate_id: "cand-42".to_string(),
                role: None,
            })
        );
        assert_eq!(
            parse_command("reach-out cand-42  Staff Data Engineer").unwrap(),
            Some(ShellCommand::ReachOut {
                candidate_id: "cand-42".to_string(),
                role: Some("Staff Data Engineer".to_string()),
            })
        );
        assert!(parse_command("reach-out").is_err());
        assert!(parse_command("launch").unwrap_err().contains("Unknown command 'launch'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_uses_session_form() {
        let dir = TempDir::new().unwrap();
        let client = PipelineClient::new(
            FakeApi::new(),
            LocalStore::new(dir.path().join("state.toml")),
            Duration::from_secs(3),
        );
        let outreach = client.outreach();

        let err = execute(&client, &outreach, ShellCommand::Source)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ControlError::Validation("Enter a target role first.".to_string())
        );

        execute(&client, &outreach, ShellCommand::Role("SRE".to_string()))
            .await
            .unwrap();
        execute(&client, &outreach, ShellCommand::Source)
            .await
            .unwrap();
        assert_eq!(
            client.snapshot().status(Stage::Sourcing),
            StageStatus::Running
        );
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_without_draft_is_refused() {
        let dir = TempDir::new().unwrap();
        let client = PipelineClient::new(
            FakeApi::new(),
            LocalStore::new(dir.path().join("state.toml")),
            Duration::from_secs(3),
        );
        let outreach = client.outreach();

        assert!(execute(&client, &outreach, ShellCommand::Send).await.is_err());
        execute(
            &client,
            &outreach,
            ShellCommand::ReachOut {
                candidate_id: "c1".to_string(),
                role: None,
            },
        )
        .await
        .unwrap();
        execute(&client, &outreach, ShellCommand::Send).await.unwrap();
        assert_eq!(
            client
                .api()
                .count(&Call::Send(crate::types::OutreachRequest {
                    candidate_id: "c1".to_string(),
                    personalized_message:
                        "Hi c1, let's talk about the Software Engineer role.".to_string(),
                })),
            1
        );
    }

    #[tokio::test]
    async fn test_reach_out_pitches_last_sourced_role_not_form_edit() {
        let dir = TempDir::new().unwrap();
        let client = PipelineClient::new(
            FakeApi::new(),
            LocalStore::new(dir.path().join("state.toml")),
            Duration::from_secs(3),
        );
        let outreach = client.outreach();

        execute(&client, &outreach, ShellCommand::Role("AI Agent Developer".to_string()))
            .await
            .unwrap();
        execute(&client, &outreach, ShellCommand::Source).await.unwrap();
        execute(&client, &outreach, ShellCommand::Role("Data Engineer".to_string()))
            .await
            .unwrap();
        execute(
            &client,
            &outreach,
            ShellCommand::ReachOut {
                candidate_id: "c1".to_string(),
                role: None,
            },
        )
        .await
        .unwrap();

        let generated: Vec<_> = client
            .api()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Generate { .. }))
            .collect();
        assert_eq!(
            generated,
            vec![Call::Generate {
                candidate_id: "c1".to_string(),
                role: "AI Agent Developer".to_string(),
            }]
        );
        client.shutdown().await;
    }
}
