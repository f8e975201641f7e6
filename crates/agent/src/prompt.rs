//! Prompt builder.
//!
//! The wording of the four report sections and the 70 / 140 / 300 mg/dL
//! thresholds are safety-relevant and must not be edited casually; the
//! tests below pin them.

use diabecare_core::message::ChatTurn;
use serde::Deserialize;

/// Placeholder for a field the user left blank.
pub const NOT_PROVIDED: &str = "Not provided";

pub const LOW_THRESHOLD_MG_DL: f32 = 70.0;
pub const TARGET_CEILING_MG_DL: f32 = 140.0;
pub const HIGH_THRESHOLD_MG_DL: f32 = 300.0;

const UNIT_SUFFIX: &str = "mg/dl";

/// The persona instruction sent as the first turn of every request.
pub fn system_prompt() -> &'static str {
    "You are an expert diabetes health assistant. Provide clear, practical, \
     and supportive guidance on blood sugar management, diet, exercise, and medications. \
     Always remind users to consult their healthcare provider for medical decisions. \
     Keep responses concise (4-6 sentences) and actionable."
}

/// Health data submitted for a one-shot analysis. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthData {
    pub sugar: Option<String>,
    pub medication: Option<String>,
    pub activity: Option<String>,
}

impl HealthData {
    pub fn new(
        sugar: impl Into<String>,
        medication: impl Into<String>,
        activity: impl Into<String>,
    ) -> Self {
        Self {
            sugar: Some(sugar.into()),
            medication: Some(medication.into()),
            activity: Some(activity.into()),
        }
    }

    pub fn sugar(&self) -> &str {
        normalize(&self.sugar)
    }

    pub fn medication(&self) -> &str {
        normalize(&self.medication)
    }

    pub fn activity(&self) -> &str {
        normalize(&self.activity)
    }
}

/// Trimmed value, or [`NOT_PROVIDED`] when blank.
fn normalize(field: &Option<String>) -> &str {
    match field.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => NOT_PROVIDED,
    }
}

/// Where a reported blood sugar value falls against the reference range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SugarReading {
    /// Below 70 mg/dL
    Low(f32),
    /// 70 to 140 mg/dL
    InRange(f32),
    /// Above 140 up to 300 mg/dL
    Elevated(f32),
    /// Above 300 mg/dL
    High(f32),
    /// Missing, not a single number, or in another unit
    Unknown,
}

impl SugarReading {
    /// Classify the sugar field when it holds a single mg/dL value.
    pub fn classify(data: &HealthData) -> Self {
        match reading_mg_dl(data.sugar()) {
            Some(v) if v < LOW_THRESHOLD_MG_DL => Self::Low(v),
            Some(v) if v <= TARGET_CEILING_MG_DL => Self::InRange(v),
            Some(v) if v <= HIGH_THRESHOLD_MG_DL => Self::Elevated(v),
            Some(v) => Self::High(v),
            None => Self::Unknown,
        }
    }

    pub fn requires_urgent_action(&self) -> bool {
        matches!(self, Self::Low(_) | Self::High(_))
    }

    /// An extra instruction appended to the report request, if any.
    fn guidance(&self) -> Option<String> {
        match *self {
            Self::Low(v) => Some(format!(
                "Note: The reported blood sugar ({v} mg/dL) is dangerously low (<70). \
                 Section 4 (⚠️ Urgent Actions) is required: list the immediate steps to take now."
            )),
            Self::High(v) => Some(format!(
                "Note: The reported blood sugar ({v} mg/dL) is dangerously high (>300). \
                 Section 4 (⚠️ Urgent Actions) is required: list the immediate steps to take now."
            )),
            Self::InRange(v) | Self::Elevated(v) => Some(format!(
                "Note: The reported blood sugar ({v} mg/dL) does not meet the urgent thresholds. \
                 In section 4 (⚠️ Urgent Actions), state that no urgent action is needed."
            )),
            Self::Unknown => None,
        }
    }
}

/// Parse a field that is exactly one number, optionally followed by
/// `mg/dL` (e.g. "250", "250 mg/dL"). Anything else yields `None`: units
/// such as mmol/L, dates and lists of readings are not classified.
fn reading_mg_dl(text: &str) -> Option<f32> {
    let lower = text.trim().to_ascii_lowercase();
    let number = lower.strip_suffix(UNIT_SUFFIX).unwrap_or(&lower).trim_end();

    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    number.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Render the structured health-report request.
pub fn analysis_prompt(data: &HealthData) -> String {
    let mut prompt = format!(
        "Analyze this diabetes patient data and provide a comprehensive health report:\n\
         \n\
         📊 Patient Data:\n\
         - Blood Sugar Level: {sugar} mg/dL\n\
         - Medications Taken: {medication}\n\
         - Daily Activities & Food: {activity}\n\
         \n\
         Please provide:\n\
         1. 📊 Blood Sugar Status (evaluate against 70-140 mg/dL range)\n\
         2. 🍽️ Diet Analysis (identify concerning foods like sweets, high carbs)\n\
         3. 💡 Recommendations (give 5-7 specific, actionable tips)\n\
         4. ⚠️ Urgent Actions (if blood sugar is dangerously low <70 or high >300)\n\
         \n",
        sugar = data.sugar(),
        medication = data.medication(),
        activity = data.activity(),
    );

    if let Some(note) = SugarReading::classify(data).guidance() {
        prompt.push_str(&note);
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Format your response clearly with headers and bullet points. \
         Be supportive and encouraging.",
    );
    prompt
}

/// The `[system, user]` pair sent for a one-shot analysis.
pub fn analysis_messages(data: &HealthData) -> Vec<ChatTurn> {
    vec![
        ChatTurn::system(system_prompt()),
        ChatTurn::user(analysis_prompt(data)),
    ]
}
