//! Prompt composition
//!
//! Pure functions from accumulated context to prompt text. The same inputs
//! always produce byte-identical output.

use crate::chat::{ChatRequest, ChatRole};
use crate::round::RoundMode;
use crate::types::DiagnosticRequest;
use std::fmt::Write as _;

/// Fixed system instructions for diagnosis rounds
pub const DIAGNOSIS_SYSTEM_PROMPT: &str = r#"You are an experienced home repair diagnostician helping a homeowner understand and fix a problem in their home.

## Output
Respond with ONE JSON object inside a ```json code block and nothing else. Use exactly these keys:
{
  "needsMoreInfo": boolean,
  "confidence": number between 0 and 1,
  "summary": "1-2 sentence plain-language summary of what you think is going on",
  "questions": [{"question": "string", "suggestions": ["string", "string", "string"]}],
  "problemShort": "3-6 word name of the problem",
  "diyFriendly": "yes" | "maybe" | "no",
  "difficulty": "easy" | "medium" | "hard",
  "timeEstimate": "string",
  "costEstimate": "string",
  "proCostEstimate": "string",
  "damage": {"type": "string", "severity": "minor" | "moderate" | "severe" | "critical", "affectedArea": "string"},
  "materials": [{"item": "string", "qty": "string", "description": "string", "estimatedCost": "string"}],
  "tools": [{"name": "string", "description": "string"}],
  "steps": ["string"],
  "warnings": ["string"],
  "callAProIf": ["string"],
  "youtubeSearchQuery": "string",
  "proType": "string",
  "suggestedQuestions": ["string"]
}

## Confidence rubric
Confidence measures DIAGNOSTIC CLARITY: how sure you are of the specific problem AND its cause.
It is not a measure of how long the conversation has been or how good the repair plan is.
- 0.9-1.0: the problem and cause are unambiguous from the evidence
- 0.7-0.89: one clear leading diagnosis, minor open details that do not change the repair
- 0.5-0.69: two or more plausible causes that need different repairs
- below 0.5: the problem itself is unclear
If confidence is below 0.7, set "needsMoreInfo": true, fill only "confidence", "summary" and "questions", and leave every other field empty.
If confidence is 0.7 or higher, set "needsMoreInfo": false, set "questions": [] and fill every other field.

## Formatting rules
- Cost estimates are US dollar ranges like "$20-$40". Time estimates are ranges like "1-2 hours".
- materials: 2-5 entries. tools: 2-4 entries. steps: 3-7 entries, each one concrete action.
- questions: 2-3 entries, each with 3-4 short suggestions. suggestedQuestions: 2-3 follow-up questions the homeowner might ask next.
- Put safety hazards (electrical, gas, structural, mold, asbestos, lead) in "warnings" first.
- "youtubeSearchQuery" is a short query that finds a tutorial for this exact repair.
- "proType" names the trade to call (e.g. "plumber", "roofer", "electrician")."#;

/// Fixed system instructions for follow-up chat
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are a friendly home repair assistant answering follow-up questions about a diagnosis you already gave.
Answer in 2-5 short sentences of plain text (no JSON, no markdown headings).
Stay grounded in the diagnosis below. If the question goes beyond it or involves a safety hazard, say so and recommend the right professional."#;

/// Most recent chat turns included in the prompt
pub const MAX_CHAT_TURNS: usize = 20;

/// Compose the diagnosis prompt for one round.
///
/// Sections appear in a fixed order: system instructions, description and
/// details, home profile, prior Q&A, photo note, round instruction.
#[must_use]
pub fn compose_diagnosis_prompt(
    request: &DiagnosticRequest,
    image_count: usize,
    mode: RoundMode,
) -> String {
    let mut prompt = String::with_capacity(DIAGNOSIS_SYSTEM_PROMPT.len() + 1024);
    prompt.push_str(DIAGNOSIS_SYSTEM_PROMPT);
    prompt.push_str("\n\n");

    prompt.push_str("## Problem description\n");
    prompt.push_str(request.description.trim());
    prompt.push('\n');

    let details = request.known_details();
    if !details.is_empty() {
        prompt.push_str("\n## Details provided\n");
        for (label, value) in details {
            let _ = writeln!(prompt, "- {}: {}", label, value);
        }
    }

    if let Some(profile) = request.home_profile.as_ref().filter(|p| !p.is_empty()) {
        prompt.push_str("\n## Home profile\n");
        prompt.push_str(
            "(Adapt likely causes, materials and safety advice to the home's age and materials. \
             Older homes may have galvanized or polybutylene pipes, lead paint or asbestos.)\n",
        );
        for (label, value) in profile.attributes() {
            let _ = writeln!(prompt, "- {}: {}", label, value);
        }
    }

    if !request.conversation_history.is_empty() {
        prompt.push_str("\n## Previous questions and answers\n");
        for pair in &request.conversation_history {
            let _ = writeln!(prompt, "Q: {}", pair.question.trim());
            let _ = writeln!(prompt, "A: {}", pair.rendered_answer());
        }
    }

    prompt.push_str("\n## Photos\n");
    if image_count == 0 {
        prompt.push_str(
            "No photos provided. Base the assessment on the text only; \
             if a photo would settle the diagnosis, ask about what it would show.\n",
        );
    } else {
        let _ = writeln!(
            prompt,
            "{} photo(s) attached after this text. Examine them for damage type, extent, \
             materials and anything the description leaves out.",
            image_count
        );
    }

    prompt.push_str("\n## This round\n");
    prompt.push_str(&mode.instruction());
    prompt.push('\n');
    prompt
}

/// Compose the single-turn chat prompt
#[must_use]
pub fn compose_chat_prompt(request: &ChatRequest) -> String {
    let mut prompt = String::with_capacity(CHAT_SYSTEM_PROMPT.len() + 1024);
    prompt.push_str(CHAT_SYSTEM_PROMPT);
    prompt.push_str("\n\n## Original problem\n");
    prompt.push_str(request.original_description.trim());
    prompt.push('\n');

    let context = &request.analysis_context;
    prompt.push_str("\n## Diagnosis\n");
    if !context.problem_summary.trim().is_empty() {
        let _ = writeln!(prompt, "Problem: {}", context.problem_summary.trim());
    }
    for (label, value) in [
        ("Materials", &context.materials),
        ("Tools", &context.tools),
        ("Steps", &context.steps),
        ("Warnings", &context.warnings),
    ] {
        if !value.trim().is_empty() {
            let _ = writeln!(prompt, "{}: {}", label, value.trim());
        }
    }

    let start = request.history.len().saturating_sub(MAX_CHAT_TURNS);
    let recent = &request.history[start..];
    if !recent.is_empty() {
        prompt.push_str("\n## Conversation so far\n");
        for turn in recent {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            let _ = writeln!(prompt, "{}: {}", speaker, turn.content.trim());
        }
    }

    prompt.push_str("\n## New question\n");
    let _ = writeln!(prompt, "User: {}", request.message.trim());
    prompt.push_str("Assistant:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{AnalysisContext, ChatTurn};
    use crate::types::{HomeProfile, Location, QaPair, RepairGoal};

    fn sample_request() -> DiagnosticRequest {
        let mut request = DiagnosticRequest::new("Brown stain spreading on the bathroom ceiling");
        request.location = Location::Bathroom;
        request.repair_goal = RepairGoal::Diy;
        request
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let request = sample_request().with_history(vec![QaPair::answered("Is it wet?", "Yes")]);
        let mode = RoundMode::from_history_len(1);

        let a = compose_diagnosis_prompt(&request, 2, mode);
        let b = compose_diagnosis_prompt(&request, 2, mode);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let request = sample_request()
            .with_home_profile(HomeProfile {
                year_built: Some("1958".to_string()),
                ..Default::default()
            })
            .with_history(vec![QaPair::answered("Is it wet?", "Yes")]);
        let prompt = compose_diagnosis_prompt(&request, 1, RoundMode::from_history_len(1));

        let order = [
            "## Confidence rubric",
            "## Problem description",
            "## Details provided",
            "## Home profile",
            "## Previous questions and answers",
            "## Photos",
            "## This round",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|heading| prompt.find(heading).unwrap_or_else(|| panic!("missing {}", heading)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_optional_blocks_omitted() {
        let prompt = compose_diagnosis_prompt(
            &DiagnosticRequest::new("Door sticks"),
            0,
            RoundMode::Initial,
        );
        assert!(!prompt.contains("## Details provided"));
        assert!(!prompt.contains("## Home profile"));
        assert!(!prompt.contains("## Previous questions and answers"));
        assert!(prompt.contains("No photos provided"));
    }

    #[test]
    fn test_empty_profile_omitted() {
        let request = DiagnosticRequest::new("Door sticks").with_home_profile(HomeProfile {
            roof_type: Some("  ".to_string()),
            ..Default::default()
        });
        let prompt = compose_diagnosis_prompt(&request, 0, RoundMode::Initial);
        assert!(!prompt.contains("## Home profile"));
    }

    #[test]
    fn test_profile_lists_only_present_attributes() {
        let request = DiagnosticRequest::new("Low water pressure").with_home_profile(HomeProfile {
            pipe_type: Some("Galvanized steel".to_string()),
            year_built: Some("1948".to_string()),
            ..Default::default()
        });
        let prompt = compose_diagnosis_prompt(&request, 0, RoundMode::Initial);

        assert!(prompt.contains("- Year built: 1948\n- Pipe type: Galvanized steel\n"));
        assert!(!prompt.contains("Roof type"));
    }

    #[test]
    fn test_history_rendered_in_order_with_skipped() {
        let request = sample_request().with_history(vec![
            QaPair::answered("Is the stain wet?", "Yes, damp"),
            QaPair::skipped("Is there a bathroom above?"),
            QaPair::answered("How old is it?", ""),
        ]);
        let prompt = compose_diagnosis_prompt(&request, 0, RoundMode::from_history_len(3));

        assert!(prompt.contains(
            "Q: Is the stain wet?\nA: Yes, damp\nQ: Is there a bathroom above?\nA: (skipped)\nQ: How old is it?\nA: (skipped)\n"
        ));
    }

    #[test]
    fn test_photo_note_counts_images() {
        let prompt = compose_diagnosis_prompt(&sample_request(), 3, RoundMode::Initial);
        assert!(prompt.contains("3 photo(s) attached"));
    }

    #[test]
    fn test_round_instruction_last() {
        let mode = RoundMode::from_history_len(6);
        let prompt = compose_diagnosis_prompt(&sample_request(), 0, mode);
        assert!(prompt.trim_end().ends_with(mode.instruction().trim_end()));
    }

    #[test]
    fn test_chat_prompt_caps_history() {
        let history: Vec<ChatTurn> = (0..30)
            .map(|i| ChatTurn::user(format!("turn {}", i)))
            .collect();
        let request = ChatRequest {
            original_description: "Dripping faucet".to_string(),
            analysis_context: AnalysisContext {
                problem_summary: "Worn cartridge".to_string(),
                steps: "1. Shut off water".to_string(),
                ..Default::default()
            },
            history,
            message: "Which cartridge do I buy?".to_string(),
        };
        let prompt = compose_chat_prompt(&request);

        assert!(!prompt.contains("User: turn 9\n"));
        assert!(prompt.contains("User: turn 10\n"));
        assert!(prompt.contains("User: turn 29\n"));
        assert!(prompt.contains("Problem: Worn cartridge"));
        assert!(prompt.contains("Steps: 1. Shut off water"));
        assert!(!prompt.contains("Warnings:"));
        assert!(prompt.ends_with("User: Which cartridge do I buy?\nAssistant:"));
    }
}
