//! Message templates

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::domain::communication::recipients::RecipientRecord;

lazy_static! {
    static ref TOKEN_REGEX: Regex = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap();
}

/// The subject, body and sender name shared by every message of a send.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Subject, may contain `{{field}}` tokens
    pub subject: String,

    /// Body, may contain `{{field}}` tokens
    pub body: String,

    /// Display name of the sender, not templated
    pub from_name: String,
}

impl MessageTemplate {
    /// Create a new template
    pub fn new(subject: &str, body: &str, from_name: &str) -> Self {
        Self {
            subject: subject.to_string(),
            body: body.to_string(),
            from_name: from_name.to_string(),
        }
    }

    /// A copy with every part trimmed, taken once at the start of a send.
    pub(crate) fn snapshot(&self) -> Self {
        Self::new(self.subject.trim(), self.body.trim(), self.from_name.trim())
    }
}

/// Replace every `{{ field }}` token in `template` with the record's value.
///
/// Unknown or empty fields render as an empty string. Substituted values are
/// inserted verbatim and never rescanned for tokens.
pub fn render(template: &str, record: &RecipientRecord) -> String {
    TOKEN_REGEX
        .replace_all(template, |caps: &Captures<'_>| {
            record.get(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> RecipientRecord {
        RecipientRecord::new("a@x.com", "Ana")
    }

    #[test]
    fn test_render_known_field() {
        assert_eq!(render("Hi {{name}}", &ana()), "Hi Ana");
    }

    #[test]
    fn test_render_missing_field_is_empty() {
        let record = RecipientRecord::default().with_field("email", "a@x.com");

        assert_eq!(render("Hi {{missing}}", &record), "Hi ");
        assert_eq!(render("Hi {{name}}", &record), "Hi ");
    }

    #[test]
    fn test_render_allows_inner_whitespace() {
        assert_eq!(render("{{ email }} / {{name  }}", &ana()), "a@x.com / Ana");
    }

    #[test]
    fn test_render_is_case_sensitive() {
        assert_eq!(render("Hi {{Name}}", &ana()), "Hi ");
    }

    #[test]
    fn test_render_does_not_expand_recursively() {
        let record = ana().with_field("bio", "{{name}} $1");

        assert_eq!(render("{{bio}}", &record), "{{name}} $1");
    }

    #[test]
    fn test_render_leaves_non_tokens_alone() {
        let text = "{name} {{ two words }} {{}} {{name";

        assert_eq!(render(text, &ana()), text);
    }

    #[test]
    fn test_snapshot_trims() {
        let template = MessageTemplate::new("  Hello ", "\nBody\n", " Acme ");

        assert_eq!(template.snapshot(), MessageTemplate::new("Hello", "Body", "Acme"));
    }
}
