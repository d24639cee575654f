//! Result-side data model
//!
//! `AnalysisResult` is always fully populated: every key is present on the
//! wire, with empty strings, empty lists or default enum values standing in
//! for anything the model left out.

use serde::{Deserialize, Serialize};

/// Confidence below which only clarifying questions are returned
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Confidence used when the model reports none
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Derived confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// confidence >= 0.8
    High,
    /// confidence >= 0.6
    Medium,
    /// anything lower
    Low,
}

impl ConfidenceLevel {
    /// Bucket a confidence value. Pure function of its input.
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Whether a homeowner can reasonably do the repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiyFriendly {
    /// Suitable for most homeowners
    Yes,
    /// Depends on skill and comfort
    #[default]
    Maybe,
    /// Leave it to a professional
    No,
}

impl DiyFriendly {
    /// Lenient parse of a model-supplied value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "diy" => Some(Self::Yes),
            "maybe" | "partial" | "depends" => Some(Self::Maybe),
            "no" | "false" | "pro" => Some(Self::No),
            _ => None,
        }
    }
}

/// Repair difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy
    Easy,
    /// Medium
    #[default]
    Medium,
    /// Hard
    Hard,
}

impl Difficulty {
    /// Lenient parse of a model-supplied value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" | "beginner" | "simple" => Some(Self::Easy),
            "medium" | "moderate" | "intermediate" => Some(Self::Medium),
            "hard" | "difficult" | "advanced" | "expert" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Damage severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic
    Minor,
    /// Needs attention soon
    #[default]
    Moderate,
    /// Needs attention now
    Severe,
    /// Safety or structural risk
    Critical,
}

impl Severity {
    /// Lenient parse of a model-supplied value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minor" | "low" | "cosmetic" => Some(Self::Minor),
            "moderate" | "medium" => Some(Self::Moderate),
            "severe" | "high" | "major" => Some(Self::Severe),
            "critical" | "urgent" | "emergency" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Observed damage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Damage {
    /// Damage type (e.g. "water damage")
    #[serde(rename = "type")]
    pub damage_type: String,
    /// Severity
    pub severity: Severity,
    /// Affected area description
    pub affected_area: String,
}

/// Material needed for the repair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// What to buy
    pub item: String,
    /// Amount, free text ("1 tube")
    pub qty: String,
    /// What it is for
    pub description: String,
    /// Price range, free text
    pub estimated_cost: String,
}

/// Tool needed for the repair, in canonical shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,
    /// What it is used for; empty when the model gave a bare name
    pub description: String,
}

/// A clarifying question with suggested answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    /// Question text
    pub question: String,
    /// Suggested answers, in display order
    pub suggestions: Vec<String>,
}

/// Normalized diagnosis, discriminated by `needs_more_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// True when only `confidence`, `summary` and `questions` are meaningful
    pub needs_more_info: bool,
    /// Clamped to [0, 1]
    pub confidence: f64,
    /// Derived from `confidence`, never model-supplied
    pub confidence_level: ConfidenceLevel,
    /// One or two sentence assessment
    pub summary: String,
    /// At most three, only while `needs_more_info`
    pub questions: Vec<ClarifyingQuestion>,

    /// Short problem title
    pub problem_short: String,
    /// Whether a homeowner can do it
    pub diy_friendly: DiyFriendly,
    /// Repair difficulty
    pub difficulty: Difficulty,
    /// e.g. "1-2 hours"
    pub time_estimate: String,
    /// DIY cost range
    pub cost_estimate: String,
    /// Professional cost range
    pub pro_cost_estimate: String,
    /// Severity and affected area
    pub damage: Damage,
    /// Materials to buy
    pub materials: Vec<Material>,
    /// Tools needed
    pub tools: Vec<Tool>,
    /// Repair steps in order
    pub steps: Vec<String>,
    /// Safety warnings
    pub warnings: Vec<String>,
    /// Conditions that mean hiring a professional
    pub call_a_pro_if: Vec<String>,
    /// Search query for a how-to video
    pub youtube_search_query: String,
    /// Kind of professional to call
    pub pro_type: String,
    /// Follow-up chat prompts, non-empty only
    pub suggested_questions: Vec<String>,
}

impl AnalysisResult {
    /// An empty result at the given confidence, all fields defaulted
    #[must_use]
    pub fn empty(confidence: f64) -> Self {
        let confidence = clamp_confidence(confidence);
        Self {
            needs_more_info: confidence < CONFIDENCE_THRESHOLD,
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            summary: String::new(),
            questions: Vec::new(),
            problem_short: String::new(),
            diy_friendly: DiyFriendly::default(),
            difficulty: Difficulty::default(),
            time_estimate: String::new(),
            cost_estimate: String::new(),
            pro_cost_estimate: String::new(),
            damage: Damage::default(),
            materials: Vec::new(),
            tools: Vec::new(),
            steps: Vec::new(),
            warnings: Vec::new(),
            call_a_pro_if: Vec::new(),
            youtube_search_query: String::new(),
            pro_type: String::new(),
            suggested_questions: Vec::new(),
        }
    }

    /// Reset every full-analysis field to its default
    pub fn clear_full_analysis(&mut self) {
        let blank = Self::empty(self.confidence);
        self.problem_short = blank.problem_short;
        self.diy_friendly = blank.diy_friendly;
        self.difficulty = blank.difficulty;
        self.time_estimate = blank.time_estimate;
        self.cost_estimate = blank.cost_estimate;
        self.pro_cost_estimate = blank.pro_cost_estimate;
        self.damage = blank.damage;
        self.materials = blank.materials;
        self.tools = blank.tools;
        self.steps = blank.steps;
        self.warnings = blank.warnings;
        self.call_a_pro_if = blank.call_a_pro_if;
        self.youtube_search_query = blank.youtube_search_query;
        self.pro_type = blank.pro_type;
        self.suggested_questions = blank.suggested_questions;
    }

    /// Whether every full-analysis field holds its default
    #[must_use]
    pub fn full_analysis_is_empty(&self) -> bool {
        let mut stripped = self.clone();
        stripped.clear_full_analysis();
        stripped == *self
    }
}

/// Clamp into [0, 1]; non-finite values become the default
#[must_use]
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_level_boundaries() {
        assert_eq!(ConfidenceLevel::from_confidence(1.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_confidence(0.0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
        assert_eq!(clamp_confidence(f64::NAN), DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_empty_result_serializes_every_key() {
        let json = serde_json::to_value(AnalysisResult::empty(0.9)).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "needsMoreInfo",
            "confidence",
            "confidenceLevel",
            "summary",
            "questions",
            "problemShort",
            "diyFriendly",
            "difficulty",
            "timeEstimate",
            "costEstimate",
            "proCostEstimate",
            "damage",
            "materials",
            "tools",
            "steps",
            "warnings",
            "callAProIf",
            "youtubeSearchQuery",
            "proType",
            "suggestedQuestions",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(json["damage"]["type"], "");
        assert_eq!(json["damage"]["severity"], "moderate");
        assert_eq!(json["damage"]["affectedArea"], "");
        assert_eq!(json["diyFriendly"], "maybe");
        assert_eq!(json["confidenceLevel"], "high");
    }

    #[test]
    fn test_clear_full_analysis() {
        let mut result = AnalysisResult::empty(0.9);
        result.problem_short = "Leaky trap".to_string();
        result.steps = vec!["Tighten nut".to_string()];
        result.summary = "kept".to_string();
        assert!(!result.full_analysis_is_empty());

        result.clear_full_analysis();
        assert!(result.full_analysis_is_empty());
        assert_eq!(result.summary, "kept");
    }

    #[test]
    fn test_lenient_enum_parsing() {
        assert_eq!(DiyFriendly::parse("YES"), Some(DiyFriendly::Yes));
        assert_eq!(Difficulty::parse("moderate"), Some(Difficulty::Medium));
        assert_eq!(Severity::parse("Critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse("purple"), None);
    }
}
