use std::sync::OnceLock;

use regex::Regex;

/// Contact details lifted directly from raw user input, before any model
/// involvement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeadCapture {
    pub email: String,
    pub name: String,
    pub message: String,
}

/// Deterministic lead capture that runs ahead of the model. If the user
/// volunteers an email address the lead is recorded immediately, which
/// guarantees capture even when the model never decides to call the
/// corresponding tool. This intentionally overlaps with the model-driven
/// `record_customer_interest` path; the two strategies are composed in
/// order by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeadPreFilter;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
            .unwrap_or_else(|error| panic!("email pattern must compile: {error}"))
    })
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"\b(?:I am|I'm|My name is)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)")
            .unwrap_or_else(|error| panic!("name pattern must compile: {error}"))
    })
}

impl LeadPreFilter {
    /// Match the first email address anywhere in the text, plus an
    /// optional capitalized name following an introduction cue. Returns
    /// `None` when no email is present, in which case the model path is
    /// taken.
    pub fn try_extract(&self, raw_text: &str) -> Option<LeadCapture> {
        let email = email_pattern().find(raw_text)?.as_str().to_string();

        let name = name_pattern()
            .captures(raw_text)
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str().trim().to_string())
            .unwrap_or_default();

        Some(LeadCapture { email, name, message: raw_text.trim().to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::LeadPreFilter;

    #[test]
    fn extracts_email_and_cued_name() {
        let filter = LeadPreFilter;
        let input = "Hi, I'm Jane Doe, reach me at jane@example.com for a quote";

        let capture = filter.try_extract(input).expect("email input should match");

        assert_eq!(capture.email, "jane@example.com");
        assert_eq!(capture.name, "Jane Doe");
        assert_eq!(capture.message, input);
    }

    #[test]
    fn first_email_wins_when_several_are_present() {
        let filter = LeadPreFilter;

        let capture = filter
            .try_extract("Contact first@example.com or second@example.com")
            .expect("should match");

        assert_eq!(capture.email, "first@example.com");
    }

    #[test]
    fn name_is_empty_without_an_introduction_cue() {
        let filter = LeadPreFilter;

        let capture =
            filter.try_extract("You can reach Jane Doe at jane@example.com").expect("should match");

        assert_eq!(capture.name, "");
    }

    #[test]
    fn supports_each_introduction_cue() {
        let filter = LeadPreFilter;

        for (input, expected_name) in [
            ("I am Marco Polo, email marco@example.com", "Marco Polo"),
            ("My name is Ada, write to ada@example.com", "Ada"),
            ("I'm Grace Hopper - grace@example.com", "Grace Hopper"),
        ] {
            let capture = filter.try_extract(input).expect("should match");
            assert_eq!(capture.name, expected_name, "input: {input}");
        }
    }

    #[test]
    fn no_email_means_no_capture() {
        let filter = LeadPreFilter;

        assert!(filter.try_extract("What trips do you offer in spring?").is_none());
        assert!(filter.try_extract("my handle is jane@nowhere").is_none());
    }
}
