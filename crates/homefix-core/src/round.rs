//! Round protocol
//!
//! The round is never stored. It is recomputed from the length of the
//! conversation history on every request, which keeps the entrypoint
//! stateless.

use serde::Serialize;

/// Questions asked per round, used to derive the round from history length
pub const QUESTIONS_PER_ROUND: usize = 3;

/// Rounds before the engine forces a final answer
pub const MAX_ROUNDS: u32 = 3;

/// Round number for a history of `history_len` Q&A pairs: `ceil(len / 3) + 1`
#[must_use]
pub fn round_for_history(history_len: usize) -> u32 {
    let completed = history_len.div_ceil(QUESTIONS_PER_ROUND);
    u32::try_from(completed).unwrap_or(u32::MAX).saturating_add(1)
}

/// Which instruction the engine sends this round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoundMode {
    /// No history yet
    Initial,
    /// History present, rounds remain
    Continuation {
        /// Round number (2 while `MAX_ROUNDS` is 3)
        round: u32,
    },
    /// Round >= `MAX_ROUNDS`; no more questions allowed
    Final {
        /// Computed round number, may exceed `MAX_ROUNDS`
        round: u32,
    },
}

impl RoundMode {
    /// Derive the mode from history length
    #[must_use]
    pub fn from_history_len(history_len: usize) -> Self {
        let round = round_for_history(history_len);
        if round >= MAX_ROUNDS {
            Self::Final { round }
        } else if history_len == 0 {
            Self::Initial
        } else {
            Self::Continuation { round }
        }
    }

    /// Computed round number
    #[must_use]
    pub fn round(&self) -> u32 {
        match self {
            Self::Initial => 1,
            Self::Continuation { round } | Self::Final { round } => *round,
        }
    }

    /// Whether further questions are forbidden
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }

    /// Round-specific instruction appended to the prompt
    #[must_use]
    pub fn instruction(&self) -> String {
        match self {
            Self::Initial => format!(
                "ROUND 1 of {max}: INITIAL ASSESSMENT\n\
                 Assess how confident you are that you can identify the specific problem and its cause \
                 from the description, details and photos above.\n\
                 - If confidence is 0.7 or higher, set \"needsMoreInfo\": false and return the full analysis.\n\
                 - If confidence is below 0.7, set \"needsMoreInfo\": true, explain what is unclear in \"summary\", \
                 and return 2-3 targeted questions whose answers would most change your diagnosis. \
                 Each question must have 3-4 short suggested answers. Leave every other field empty.",
                max = MAX_ROUNDS
            ),
            Self::Continuation { round } => format!(
                "ROUND {round} of {max}: REASSESSMENT\n\
                 The user has responded to the previous questions listed above.\n\
                 Reassess confidence based on DIAGNOSTIC CLARITY: can you now identify the specific problem and its cause?\n\
                 - Do NOT raise confidence just because questions were answered or because this is a later round.\n\
                 - Answers marked (skipped) provide no new information. A skipped answer must never increase confidence.\n\
                 - Vague or irrelevant answers should not increase confidence either.\n\
                 - If confidence is now 0.7 or higher, set \"needsMoreInfo\": false and return the full analysis.\n\
                 - If it is still below 0.7, set \"needsMoreInfo\": true and ask 2-3 NEW questions that were not asked before, \
                 each with 3-4 suggested answers.",
                round = round,
                max = MAX_ROUNDS
            ),
            Self::Final { .. } => format!(
                "FINAL ROUND ({max} of {max}): COMMIT TO A DIAGNOSIS\n\
                 This is the last round. Do NOT ask any more questions, even if your confidence is still low.\n\
                 - Set \"needsMoreInfo\": false and \"questions\": [].\n\
                 - Provide your best-effort full analysis using everything above.\n\
                 - Report your honest confidence. Do not inflate it to finish the conversation; \
                 describe the remaining uncertainty in \"summary\" and \"warnings\", and widen \"callAProIf\" accordingly.",
                max = MAX_ROUNDS
            ),
        }
    }
}
