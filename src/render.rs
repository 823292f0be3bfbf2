// src/render.rs
//! Plain-text views of the pipeline state for the terminal

use crate::outreach::OutreachDraft;
use crate::pipeline::state::{PipelineState, Stage, StageStatus};
use crate::types::{
    count_promoted, AnalysisResult, DeepScrapedCandidate, RankedCandidate, SourcedCandidate,
};
use crate::utils::truncate;

const LINE_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    /// Band for a ranking score (promotion at 80, warning below 50).
    pub fn for_ranking(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Band for a final assessment score.
    pub fn for_assessment(score: u32) -> Self {
        if score >= 80 {
            Self::High
        } else if score >= 60 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::High => "▲",
            Self::Medium => "■",
            Self::Low => "▼",
        }
    }
}

fn status_marker(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Idle => "·",
        StageStatus::Running => "…",
        StageStatus::Done => "✓",
        StageStatus::Error => "✗",
    }
}

/// One line per stage plus the backend's status message.
pub fn render_status(state: &PipelineState) -> String {
    let mut lines = Vec::new();
    for stage in Stage::ALL {
        let status = state.status(stage);
        let count = match stage {
            Stage::Ranking if !state.ranked.is_empty() => format!(
                "{} ≥80% / {} total",
                state.promoted_count(),
                state.ranked.len()
            ),
            _ if state.count(stage) > 0 => format!("{} {}", state.count(stage), count_noun(stage)),
            _ => String::new(),
        };
        lines.push(format!(
            "{} {}. {:<20} {:<8} {:<22} [{}]",
            status_marker(status),
            stage.number(),
            stage.title(),
            status.to_string(),
            count,
            stage.action_label(status),
        ));
    }
    if !state.status_message.is_empty() {
        lines.push(format!("  {}", state.status_message));
    }
    lines.join("\n")
}

fn count_noun(stage: Stage) -> &'static str {
    match stage {
        Stage::Sourcing => "found",
        Stage::Ranking => "ranked",
        Stage::DeepScrape => "scraped",
        Stage::Analyze => "analyzed",
    }
}

/// Empty-state banner shown before anything has been sourced.
pub fn render_welcome() -> String {
    [
        "Ready to Scout",
        "Set a role (and optionally a location), then run `source`.",
        "You control each step manually.",
    ]
    .join("\n")
}

pub fn render_sourced(candidates: &[SourcedCandidate]) -> String {
    if candidates.is_empty() {
        return "No candidates sourced yet.\nStart an analysis to begin sourcing.".to_string();
    }

    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut line = format!(
                "{:>2}. [{}] {} - {}",
                i + 1,
                c.initial(),
                c.display_name(),
                truncate(c.headline.as_deref().unwrap_or("No headline"), 48)
            );
            if c.is_open_to_work {
                line.push_str("  ✓ Open to Work");
            }
            if let Some(url) = &c.profile_url {
                line.push_str(&format!("\n      {}", url));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_ranked(candidates: &[RankedCandidate]) -> String {
    if candidates.is_empty() {
        return "No ranking yet.".to_string();
    }

    let mut lines = vec![format!(
        "{} ≥80% / {} total",
        count_promoted(candidates),
        candidates.len()
    )];
    for c in candidates {
        let score = c.score();
        let mut line = format!(
            "{} {:>3}%  {} - {}",
            ScoreBand::for_ranking(score).marker(),
            score.round() as i64,
            c.candidate.display_name(),
            truncate(c.candidate.headline.as_deref().unwrap_or(""), 40)
        );
        if c.is_promoted() {
            line.push_str("  → Deep Scrape");
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn render_deep_scraped(candidates: &[DeepScrapedCandidate]) -> String {
    if candidates.is_empty() {
        return "Waiting for deep scrape data...".to_string();
    }

    let mut blocks = Vec::new();
    for c in candidates {
        let profile = c.profile();
        let mut lines = vec![format!(
            "[{}] {}{}  ✓ Scraped",
            profile.initial(),
            profile.display_name(),
            if profile.is_open_to_work {
                "  Open to Work"
            } else {
                ""
            }
        )];
        if let Some(headline) = profile.headline.as_deref().filter(|h| !h.is_empty()) {
            lines.push(format!("    {}", truncate(headline, LINE_WIDTH)));
        }
        if let Some(location) = profile.location.as_deref().filter(|l| !l.is_empty()) {
            lines.push(format!("    📍 {}", location));
        }
        if let Some(url) = &profile.profile_url {
            lines.push(format!("    {}", url));
        }
        for (label, text) in [
            ("About", c.about()),
            ("Experience", c.experience()),
            ("Education", c.education()),
        ] {
            if let Some(text) = text {
                lines.push(format!("    {}: {}", label, truncate(text, LINE_WIDTH)));
            }
        }
        if !c.is_enriched() {
            lines.push("    Awaiting profile data...".to_string());
        }
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}

pub fn render_result(result: &AnalysisResult) -> String {
    let fit = &result.role_fit_analysis;
    let mut lines = vec![
        format!(
            "[{}] {}  Tier {}  {}  Score {} {}",
            result.initial(),
            result.display_name(),
            result.tier,
            result.recommended_action,
            result.overall_score,
            ScoreBand::for_assessment(result.overall_score).marker(),
        ),
        format!("    id: {}", result.candidate_id),
    ];
    if !result.reasoning_summary.is_empty() {
        lines.push(format!("    {}", result.reasoning_summary));
    }
    if let Some(evidence) = fit.evidence.as_deref().filter(|e| !e.is_empty()) {
        lines.push(format!("    Evidence: {}", truncate(evidence, LINE_WIDTH)));
    }
    lines.push(format!("    Strengths: {}", top_three(&fit.strengths)));
    lines.push(format!("    Gaps: {}", top_three(&fit.gaps)));
    for flag in &result.risk_flags {
        lines.push(format!("    ⚠ {}", flag));
    }
    lines.join("\n")
}

pub fn render_results(results: &[AnalysisResult]) -> String {
    if results.is_empty() {
        return "No analysis results yet.".to_string();
    }
    results
        .iter()
        .map(render_result)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn top_three(items: &[String]) -> String {
    if items.is_empty() {
        return "—".to_string();
    }
    items.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
}

/// One progress line when the stage statuses or the status message
/// changed between two observations; `None` for a no-op poll.
pub fn render_progress(prev: &PipelineState, next: &PipelineState) -> Option<String> {
    if prev.statuses() == next.statuses() && prev.status_message == next.status_message {
        return None;
    }

    let stages = Stage::ALL
        .iter()
        .map(|stage| status_marker(next.status(*stage)))
        .collect::<Vec<_>>()
        .join("");
    let mut line = format!("[{}] {}", stages, next.status_message);

    for stage in Stage::ALL {
        if prev.status(stage) != StageStatus::Done && next.status(stage) == StageStatus::Done {
            line.push_str(&format!(
                "\n  {} complete: {} {}",
                stage.title(),
                next.count(stage),
                count_noun(stage)
            ));
        }
    }
    Some(line)
}

pub fn render_draft(draft: &OutreachDraft) -> String {
    if !draft.is_messaging {
        return "No outreach draft open.".to_string();
    }
    let mut lines = vec![format!("Personalized Outreach → {}", draft.candidate_id)];
    if let Some(status) = &draft.status {
        lines.push(status.clone());
    }
    lines.push(draft.message_text.clone());
    if draft.is_sending {
        lines.push("Sending...".to_string());
    }
    lines.join("\n")
}
