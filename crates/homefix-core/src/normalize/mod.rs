//! Result normalization
//!
//! Turns semi-structured model output into a fully populated
//! `AnalysisResult`. Fails only when no JSON object can be located; any
//! object that is found is repaired with defaults rather than rejected.

mod extract;


pub use extract::extract_json;

use crate::analysis::{
    clamp_confidence, AnalysisResult, ClarifyingQuestion, ConfidenceLevel, Damage, Difficulty,
    DiyFriendly, Material, Severity, Tool, CONFIDENCE_THRESHOLD, DEFAULT_CONFIDENCE,
};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Most clarifying questions kept
pub const MAX_QUESTIONS: usize = 3;
/// Most suggestions kept per question
pub const MAX_SUGGESTIONS: usize = 4;
/// Most suggested follow-up questions kept
pub const MAX_SUGGESTED_QUESTIONS: usize = 3;

const EXCERPT_BYTES: usize = 200;

/// A tool entry as models actually emit it: a bare name or an object.
///
/// Never leaves this module; everything is mapped to `Tool` immediately.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTool {
    Name(String),
    Entry {
        #[serde(default, alias = "tool", alias = "item")]
        name: Option<Value>,
        #[serde(default, alias = "purpose", alias = "use")]
        description: Option<Value>,
    },
}

impl RawTool {
    fn into_tool(self) -> Option<Tool> {
        let tool = match self {
            Self::Name(name) => Tool {
                name: name.trim().to_string(),
                description: String::new(),
            },
            Self::Entry { name, description } => Tool {
                name: name.as_ref().map(scalar_text).unwrap_or_default(),
                description: description.as_ref().map(scalar_text).unwrap_or_default(),
            },
        };
        (!tool.name.is_empty()).then_some(tool)
    }
}

/// A material entry: a bare item name or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMaterial {
    Name(String),
    Entry {
        #[serde(default, alias = "name")]
        item: Option<Value>,
        #[serde(default, alias = "quantity")]
        qty: Option<Value>,
        #[serde(default)]
        description: Option<Value>,
        #[serde(default, rename = "estimatedCost", alias = "estimated_cost", alias = "cost")]
        estimated_cost: Option<Value>,
    },
}

impl RawMaterial {
    fn into_material(self) -> Option<Material> {
        let material = match self {
            Self::Name(item) => Material {
                item: item.trim().to_string(),
                ..Default::default()
            },
            Self::Entry {
                item,
                qty,
                description,
                estimated_cost,
            } => Material {
                item: item.as_ref().map(scalar_text).unwrap_or_default(),
                qty: qty.as_ref().map(scalar_text).unwrap_or_default(),
                description: description.as_ref().map(scalar_text).unwrap_or_default(),
                estimated_cost: estimated_cost.as_ref().map(scalar_text).unwrap_or_default(),
            },
        };
        (!material.item.is_empty()).then_some(material)
    }
}

/// Normalize raw model output for a question round.
///
/// `needsMoreInfo` is `model_flag || confidence < 0.7`. When it is true the
/// full-analysis fields are cleared; when false the questions are cleared.
pub fn normalize_analysis(raw: &str) -> Result<AnalysisResult> {
    let mut result = parse_result(raw)?;
    if result.needs_more_info {
        result.clear_full_analysis();
    } else {
        result.questions.clear();
    }
    Ok(result)
}

/// Normalize raw model output for the final round.
///
/// No more questions are allowed after the last round, so the result is
/// always a full analysis and keeps whatever confidence the model reported.
pub fn normalize_final_analysis(raw: &str) -> Result<AnalysisResult> {
    let mut result = parse_result(raw)?;
    if result.needs_more_info {
        debug!(
            confidence = result.confidence,
            "final round committed below confidence threshold"
        );
    }
    result.needs_more_info = false;
    result.questions.clear();
    Ok(result)
}

fn parse_result(raw: &str) -> Result<AnalysisResult> {
    let object = locate_object(raw)?;

    let confidence = object
        .get("confidence")
        .and_then(number_value)
        .map(clamp_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let model_flag = object
        .get("needsMoreInfo")
        .or_else(|| object.get("needs_more_info"))
        .and_then(bool_value)
        .unwrap_or(false);
    let needs_more_info = model_flag || confidence < CONFIDENCE_THRESHOLD;
    if model_flag != (confidence < CONFIDENCE_THRESHOLD) {
        debug!(
            confidence,
            model_flag, "model needsMoreInfo disagrees with confidence threshold"
        );
    }

    let mut result = AnalysisResult::empty(confidence);
    result.needs_more_info = needs_more_info;
    result.confidence_level = ConfidenceLevel::from_confidence(confidence);
    result.summary = text_field(&object, "summary");
    result.questions = questions(object.get("questions"));

    result.problem_short = text_field(&object, "problemShort");
    result.diy_friendly = enum_field(&object, "diyFriendly", DiyFriendly::parse);
    result.difficulty = enum_field(&object, "difficulty", Difficulty::parse);
    result.time_estimate = text_field(&object, "timeEstimate");
    result.cost_estimate = text_field(&object, "costEstimate");
    result.pro_cost_estimate = text_field(&object, "proCostEstimate");
    result.damage = damage(object.get("damage"));
    result.materials = list(object.get("materials"), |v| {
        serde_json::from_value::<RawMaterial>(v)
            .ok()
            .and_then(RawMaterial::into_material)
    });
    result.tools = list(object.get("tools"), |v| {
        serde_json::from_value::<RawTool>(v)
            .ok()
            .and_then(RawTool::into_tool)
    });
    result.steps = string_list(object.get("steps"));
    result.warnings = string_list(object.get("warnings"));
    result.call_a_pro_if = string_list(object.get("callAProIf"));
    result.youtube_search_query = text_field(&object, "youtubeSearchQuery");
    result.pro_type = text_field(&object, "proType");
    result.suggested_questions = string_list(object.get("suggestedQuestions"));
    result.suggested_questions.truncate(MAX_SUGGESTED_QUESTIONS);

    Ok(result)
}

fn locate_object(raw: &str) -> Result<Map<String, Value>> {
    let Some(json) = extract_json(raw) else {
        warn!(
            excerpt = %homefix_llm::util::truncate_safe(raw.trim(), EXCERPT_BYTES),
            "no JSON object in model output"
        );
        return Err(Error::MalformedModelOutput(
            "no JSON object found in model output".to_string(),
        ));
    };

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::MalformedModelOutput(
            "model output JSON is not an object".to_string(),
        )),
        Err(e) => {
            warn!(
                error = %e,
                excerpt = %homefix_llm::util::truncate_safe(json, EXCERPT_BYTES),
                "unparseable JSON object in model output"
            );
            Err(Error::MalformedModelOutput(format!(
                "model output JSON could not be parsed: {}",
                e
            )))
        }
    }
}

/// Numbers and numeric strings
fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn bool_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Render a scalar as text; arrays, objects and null become empty
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).map(scalar_text).unwrap_or_default()
}

fn enum_field<T: Default>(
    object: &Map<String, Value>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    object
        .get(key)
        .map(scalar_text)
        .and_then(|s| parse(&s))
        .unwrap_or_default()
}

/// Map each array element, dropping the ones that don't fit.
/// A single non-array value is treated as a one-element array.
fn list<T>(value: Option<&Value>, map: impl Fn(Value) -> Option<T>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items.iter().cloned().filter_map(map).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => map(single.clone()).into_iter().collect(),
    }
}

/// Non-empty trimmed strings only
fn string_list(value: Option<&Value>) -> Vec<String> {
    list(value, |v| match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => None,
    })
}

fn questions(value: Option<&Value>) -> Vec<ClarifyingQuestion> {
    let mut questions = list(value, |v| {
        let question = match v {
            Value::String(s) => ClarifyingQuestion {
                question: s.trim().to_string(),
                suggestions: Vec::new(),
            },
            Value::Object(map) => {
                let mut suggestions = string_list(map.get("suggestions").or(map.get("options")));
                suggestions.truncate(MAX_SUGGESTIONS);
                ClarifyingQuestion {
                    question: text_field(&map, "question"),
                    suggestions,
                }
            }
            _ => return None,
        };
        (!question.question.is_empty()).then_some(question)
    });
    questions.truncate(MAX_QUESTIONS);
    questions
}

fn damage(value: Option<&Value>) -> Damage {
    match value {
        Some(Value::Object(map)) => Damage {
            damage_type: text_field(map, "type"),
            severity: enum_field(map, "severity", Severity::parse),
            affected_area: text_field(map, "affectedArea"),
        },
        Some(Value::String(s)) => Damage {
            damage_type: s.trim().to_string(),
            ..Default::default()
        },
        _ => Damage::default(),
    }
}
