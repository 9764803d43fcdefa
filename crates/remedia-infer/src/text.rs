//! Text normalisation shared by every inference strategy.

/// Lower-case and trim. Keyword and pattern matching run on this form, so
/// punctuation such as the apostrophe in "can't sleep" is preserved.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Lower-case, replace everything except ASCII letters and whitespace with a
/// space, then collapse runs of whitespace.
///
/// This is the form the vocabulary matchers and the statistical model see.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalise the first letter of every alphabetic run: "heart disease"
/// becomes "Heart Disease".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// True if any of `terms` occurs as a substring of `text`.
pub fn contains_any<S: AsRef<str>>(text: &str, terms: &[S]) -> bool {
    terms.iter().any(|t| text.contains(t.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize("  Can't SLEEP \n"), "can't sleep");
    }

    #[test]
    fn clean_text_strips_non_letters() {
        assert_eq!(clean_text("Fever, 102°F!!  and   CHILLS"), "fever f and chills");
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text("can't"), "can t");
    }

    #[test]
    fn title_case_capitalises_each_word() {
        assert_eq!(title_case("heart disease"), "Heart Disease");
        assert_eq!(title_case("gerd"), "Gerd");
        assert_eq!(title_case("HIGH blood-pressure"), "High Blood-Pressure");
    }

    #[test]
    fn contains_any_matches_substrings() {
        assert!(contains_any("high fever since monday", &["chills", "fever"]));
        assert!(!contains_any("sore throat", &["fever"]));
        assert!(!contains_any::<&str>("anything", &[]));
    }
}
