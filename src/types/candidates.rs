// src/types/candidates.rs
//! Candidate records mirrored from the pipeline backend.
//!
//! Every field is server-owned and may be missing or `null` on the wire,
//! so the structures default generously instead of failing a whole poll.

use serde::{Deserialize, Deserializer, Serialize};

/// Score at which a ranked candidate is shown as promoted to deep scrape.
pub const PROMOTION_THRESHOLD: f64 = 80.0;

// ===== Stage 1: Sourcing =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcedCandidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_open_to_work: bool,
}

impl SourcedCandidate {
    pub fn display_name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or("Unknown")
    }

    /// First letter of the name, uppercased, used as an avatar.
    pub fn initial(&self) -> char {
        initial_of(self.name.as_deref())
    }
}

// ===== Stage 2: AI ranking =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: SourcedCandidate,
    #[serde(default)]
    pub ai_score: Option<f64>,
}

impl RankedCandidate {
    /// Ranking score, 0 when the backend has not scored the candidate.
    pub fn score(&self) -> f64 {
        self.ai_score.unwrap_or(0.0)
    }

    pub fn is_promoted(&self) -> bool {
        self.score() >= PROMOTION_THRESHOLD
    }
}

/// Count candidates at or above the promotion threshold.
pub fn count_promoted(ranked: &[RankedCandidate]) -> usize {
    ranked.iter().filter(|c| c.is_promoted()).count()
}

// ===== Stage 3: Deep scrape =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepScrapedCandidate {
    #[serde(flatten)]
    pub ranked: RankedCandidate,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub experience_text: Option<String>,
    #[serde(default)]
    pub education_text: Option<String>,
}

impl DeepScrapedCandidate {
    pub fn profile(&self) -> &SourcedCandidate {
        &self.ranked.candidate
    }

    pub fn about(&self) -> Option<&str> {
        substantial(self.about.as_deref())
    }

    pub fn experience(&self) -> Option<&str> {
        substantial(self.experience_text.as_deref())
    }

    pub fn education(&self) -> Option<&str> {
        substantial(self.education_text.as_deref())
    }

    /// True once the scraper has returned an about or experience block.
    pub fn is_enriched(&self) -> bool {
        self.about().is_some() || self.experience().is_some()
    }
}

// ===== Stage 4: Final analysis =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RecommendedAction {
    Shortlist,
    Review,
    #[default]
    Hold,
    Reject,
}

impl From<String> for RecommendedAction {
    fn from(value: String) -> Self {
        match value.trim() {
            "Shortlist" => Self::Shortlist,
            "Review" => Self::Review,
            "Reject" => Self::Reject,
            _ => Self::Hold,
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Shortlist => "Shortlist",
            Self::Review => "Review",
            Self::Hold => "Hold",
            Self::Reject => "Reject",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleFitAnalysis {
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_score: u32,
    #[serde(default = "default_tier", deserialize_with = "tier_or_default")]
    pub tier: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_action: RecommendedAction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role_fit_analysis: RoleFitAnalysis,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_flags: Vec<String>,
}

impl AnalysisResult {
    /// Name shown on the result card, falling back to the candidate id.
    pub fn display_name(&self) -> &str {
        non_blank(self.candidate_name.as_deref()).unwrap_or(&self.candidate_id)
    }

    pub fn initial(&self) -> char {
        initial_of(Some(self.display_name()))
    }
}

fn default_tier() -> u8 {
    3
}

fn tier_or_default<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let tier = Option::<u8>::deserialize(deserializer)?;
    Ok(tier.filter(|t| (1..=3).contains(t)).unwrap_or_else(default_tier))
}

/// Deserialize `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Long-form scraped text only counts once it carries more than a stub.
fn substantial(value: Option<&str>) -> Option<&str> {
    value.filter(|v| v.chars().count() > 5)
}

fn initial_of(name: Option<&str>) -> char {
    non_blank(name)
        .and_then(|n| n.trim().chars().next())
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}
