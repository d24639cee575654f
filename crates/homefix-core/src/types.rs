//! Request-side data model
//!
//! A `DiagnosticRequest` is rebuilt by the caller on every round; nothing here
//! is stored between requests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker rendered for a question the user did not answer
pub const SKIPPED_ANSWER: &str = "(skipped)";

/// Declares a metadata enum that tolerates unknown wire values.
///
/// Any unrecognised or missing string becomes `Unknown`, which the prompt omits.
macro_rules! metadata_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
            /// Not provided or not recognised
            #[default]
            Unknown,
        }

        impl $name {
            /// Parse a wire value, falling back to `Unknown`
            #[must_use]
            pub fn parse(value: &str) -> Self {
                let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }

            /// Wire value
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown => "unknown",
                }
            }

            /// Human label for the prompt, `None` when unknown
            #[must_use]
            pub fn label(&self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($label),)+
                    Self::Unknown => None,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Option::<String>::deserialize(deserializer)?;
                Ok(value.map(|v| Self::parse(&v)).unwrap_or_default())
            }
        }
    };
}

metadata_enum! {
    /// Where in the home the problem is
    Location {
        Kitchen => "kitchen", "Kitchen";
        Bathroom => "bathroom", "Bathroom";
        Basement => "basement", "Basement";
        Attic => "attic", "Attic";
        Bedroom => "bedroom", "Bedroom";
        LivingArea => "living_area", "Living area";
        Garage => "garage", "Garage";
        Laundry => "laundry", "Laundry room";
        Exterior => "exterior", "Exterior wall or siding";
        Roof => "roof", "Roof";
        Yard => "yard", "Yard or outdoor area";
    }
}

metadata_enum! {
    /// Whether water is involved
    WaterExposure {
        Active => "active", "Active water or leaking now";
        Past => "past", "Past water exposure, currently dry";
        None => "none", "No water involved";
    }
}

metadata_enum! {
    /// Whether the problem is progressing
    GettingWorse {
        Yes => "yes", "Getting worse over time";
        No => "no", "Stable, not getting worse";
    }
}

metadata_enum! {
    /// Visible state of the affected surface
    SurfaceCondition {
        Intact => "intact", "Surface intact";
        Stained => "stained", "Stained or discolored";
        Cracked => "cracked", "Cracked";
        Soft => "soft", "Soft or spongy to the touch";
        Peeling => "peeling", "Peeling or bubbling";
        Moldy => "moldy", "Visible mold or mildew";
        Broken => "broken", "Broken or missing pieces";
    }
}

metadata_enum! {
    /// What the user wants out of the diagnosis
    RepairGoal {
        Diy => "diy", "Wants to fix it themselves";
        Hire => "hire", "Plans to hire a professional";
        Understand => "understand", "Wants to understand the problem first";
        Temporary => "temporary", "Needs a temporary fix for now";
    }
}

/// One prior clarifying question and the user's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    /// Question asked in an earlier round
    pub question: String,
    /// Answer, `None` or blank when skipped
    #[serde(default)]
    pub answer: Option<String>,
}

impl QaPair {
    /// Create an answered pair
    #[must_use]
    pub fn answered(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: Some(answer.into()),
        }
    }

    /// Create a skipped pair
    #[must_use]
    pub fn skipped(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: None,
        }
    }

    /// Whether the user gave no real answer
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        match self.answer.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(answer) => answer.eq_ignore_ascii_case(SKIPPED_ANSWER),
        }
    }

    /// Answer text as rendered in the prompt
    #[must_use]
    pub fn rendered_answer(&self) -> &str {
        if self.is_skipped() {
            SKIPPED_ANSWER
        } else {
            self.answer.as_deref().map(str::trim).unwrap_or(SKIPPED_ANSWER)
        }
    }
}

/// Sparse home attributes used only to enrich the prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeProfile {
    /// House, condo, townhouse, ...
    #[serde(default, deserialize_with = "lenient_string")]
    pub home_type: Option<String>,
    /// Construction year
    #[serde(default, deserialize_with = "lenient_string")]
    pub year_built: Option<String>,
    /// Supply pipe material
    #[serde(default, deserialize_with = "lenient_string")]
    pub pipe_type: Option<String>,
    /// Age of the plumbing
    #[serde(default, deserialize_with = "lenient_string")]
    pub pipe_age: Option<String>,
    /// Tank, tankless, ...
    #[serde(default, deserialize_with = "lenient_string")]
    pub water_heater_type: Option<String>,
    /// Age of the water heater
    #[serde(default, deserialize_with = "lenient_string")]
    pub water_heater_age: Option<String>,
    /// Heating and cooling system
    #[serde(default, deserialize_with = "lenient_string")]
    pub hvac_type: Option<String>,
    /// Age of the HVAC system
    #[serde(default, deserialize_with = "lenient_string")]
    pub hvac_age: Option<String>,
    /// Roofing material
    #[serde(default, deserialize_with = "lenient_string")]
    pub roof_type: Option<String>,
    /// Age of the roof
    #[serde(default, deserialize_with = "lenient_string")]
    pub roof_age: Option<String>,
    /// Main flooring material
    #[serde(default, deserialize_with = "lenient_string")]
    pub flooring_type: Option<String>,
}

impl HomeProfile {
    /// Present attributes as `(label, value)` in a fixed order
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        [
            ("Home type", &self.home_type),
            ("Year built", &self.year_built),
            ("Pipe type", &self.pipe_type),
            ("Pipe age", &self.pipe_age),
            ("Water heater type", &self.water_heater_type),
            ("Water heater age", &self.water_heater_age),
            ("HVAC type", &self.hvac_type),
            ("HVAC age", &self.hvac_age),
            ("Roof type", &self.roof_type),
            ("Roof age", &self.roof_age),
            ("Flooring", &self.flooring_type),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }

    /// Whether no attribute is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes().is_empty()
    }
}

/// Accepts strings, numbers and booleans as an optional string
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Everything the caller knows about the problem, resent every round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRequest {
    /// Free-text problem description
    pub description: String,
    /// Where in the home
    #[serde(default)]
    pub location: Location,
    /// Water involvement
    #[serde(default)]
    pub water_exposure: WaterExposure,
    /// Whether it is progressing
    #[serde(default)]
    pub getting_worse: GettingWorse,
    /// State of the surface
    #[serde(default)]
    pub surface_condition: SurfaceCondition,
    /// What the user wants to do
    #[serde(default)]
    pub repair_goal: RepairGoal,
    /// Saved home attributes, when known
    #[serde(default)]
    pub home_profile: Option<HomeProfile>,
    /// Prior rounds' questions and answers, in asking order
    #[serde(default)]
    pub conversation_history: Vec<QaPair>,
}

impl DiagnosticRequest {
    /// Create a request with only a description
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Set the conversation history
    #[must_use]
    pub fn with_history(mut self, history: Vec<QaPair>) -> Self {
        self.conversation_history = history;
        self
    }

    /// Set the home profile
    #[must_use]
    pub fn with_home_profile(mut self, profile: HomeProfile) -> Self {
        self.home_profile = Some(profile);
        self
    }

    /// Reject requests the engine cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.description.trim().is_empty() {
            return Err(crate::Error::invalid_input("description is required"));
        }
        if let Some(pair) = self
            .conversation_history
            .iter()
            .find(|pair| pair.question.trim().is_empty())
        {
            return Err(crate::Error::invalid_input(format!(
                "conversation history contains an empty question (answer: {:?})",
                pair.answer
            )));
        }
        Ok(())
    }

    /// `(label, value)` for every metadata field the user provided
    #[must_use]
    pub fn known_details(&self) -> Vec<(&'static str, &'static str)> {
        [
            ("Location", self.location.label()),
            ("Water exposure", self.water_exposure.label()),
            ("Progression", self.getting_worse.label()),
            ("Surface condition", self.surface_condition.label()),
            ("Repair goal", self.repair_goal.label()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }
}
