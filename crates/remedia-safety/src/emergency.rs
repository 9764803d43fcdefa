//! Compiled-in emergency phrase scan.
//!
//! Runs against the raw user text before anything else in the gate and
//! never depends on loaded tables.

/// Phrases that indicate a possibly life-threatening situation.
pub const EMERGENCY_PHRASES: &[&str] = &[
    "chest pain",
    "heart attack",
    "severe chest pain",
    "crushing chest pain",
    "chest pressure",
    "heart feels like",
    "stroke",
    "can't breathe",
    "cannot breathe",
    "difficulty breathing",
    "choking",
    "severe bleeding",
    "heavy bleeding",
    "bleeding heavily",
    "unconscious",
    "loss of consciousness",
    "passed out",
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "seizure",
    "convulsion",
    "anaphylaxis",
    "severe allergic reaction",
    "throat closing",
    "can't swallow",
    "severe burn",
    "severe trauma",
    "head injury",
    "severe head pain",
    "worst headache of my life",
    "sudden severe headache",
    "coughing blood",
    "coughing up blood",
    "vomiting blood",
    "blood in vomit",
    "blood in stool",
    "severe abdominal pain",
    "sudden vision loss",
    "sudden paralysis",
    "numbness on one side",
    "slurred speech",
    "confusion and fever",
    "stiff neck and fever",
    "severe dehydration",
];

pub const EMERGENCY_MESSAGE: &str = "MEDICAL EMERGENCY: your symptoms may indicate a \
life-threatening condition. Call emergency services now (India: 102 / 108 / 112, US: 911, \
UK: 999, EU: 112). Do not wait to see if symptoms improve, do not drive yourself to hospital, \
and do not rely on this tool for emergency advice.";

/// First emergency phrase found in `text`, if any.
///
/// Matching is case-insensitive and treats typographic apostrophes as ASCII
/// ones, so "can’t breathe" is caught as well.
pub fn scan(text: &str) -> Option<&'static str> {
    let normalized = text.trim().to_lowercase().replace('\u{2019}', "'");
    if normalized.is_empty() {
        return None;
    }
    EMERGENCY_PHRASES
        .iter()
        .copied()
        .find(|phrase| normalized.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_chest_pain() {
        assert_eq!(scan("severe chest pain and sweating"), Some("chest pain"));
    }

    #[test]
    fn detects_case_and_apostrophe_variants() {
        assert_eq!(scan("I CAN'T BREATHE"), Some("can't breathe"));
        assert_eq!(scan("i can\u{2019}t breathe properly"), Some("can't breathe"));
    }

    #[test]
    fn detects_suicidal_ideation() {
        assert_eq!(scan("sometimes i want to end my life"), Some("end my life"));
    }

    #[test]
    fn ignores_ordinary_complaints() {
        assert_eq!(scan("mild headache and runny nose"), None);
        assert_eq!(scan(""), None);
        assert_eq!(scan("   "), None);
    }
}
