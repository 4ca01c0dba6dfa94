use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// A single check applied to one field value.
///
/// Every rule carries the message shown next to the field when it fails.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Non-empty after trimming whitespace.
    Required(&'static str),
    /// At most this many characters (Unicode scalar values).
    MaxLength(usize, &'static str),
    /// `local@domain.tld` with no whitespace.
    Email(&'static str),
}

impl Rule {
    fn holds(&self, value: &str) -> bool {
        match self {
            Rule::Required(_) => !value.trim().is_empty(),
            Rule::MaxLength(max, _) => value.chars().count() <= *max,
            Rule::Email(_) => EMAIL_RE.is_match(value),
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Rule::Required(msg) | Rule::MaxLength(_, msg) | Rule::Email(msg) => *msg,
        }
    }
}

/// Field name -> messages of every rule that field failed, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Run every rule against `value`; all failures are recorded, not just the first.
    pub fn check(&mut self, field: &'static str, value: &str, rules: &[Rule]) {
        for rule in rules {
            if !rule.holds(value) {
                self.add(field, rule.message());
            }
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_whitespace() {
        let rule = Rule::Required("blank");
        assert!(!rule.holds(""));
        assert!(!rule.holds("   \t"));
        assert!(rule.holds(" x "));
    }

    #[test]
    fn max_length_counts_characters() {
        let rule = Rule::MaxLength(3, "long");
        assert!(rule.holds("äöü"));
        assert!(!rule.holds("abcd"));
    }

    #[test]
    fn email_format() {
        let rule = Rule::Email("bad");
        assert!(rule.holds("a@x.com"));
        assert!(rule.holds("first.last@mail.example.org"));
        assert!(!rule.holds("a@x"));
        assert!(!rule.holds("no-at.com"));
        assert!(!rule.holds("a b@x.com"));
        assert!(!rule.holds("a@@x.com"));
    }

    #[test]
    fn all_failing_rules_are_reported() {
        let mut errors = FieldErrors::new();
        errors.check(
            "email",
            "",
            &[Rule::Required("blank"), Rule::Email("bad"), Rule::MaxLength(50, "long")],
        );
        assert_eq!(errors.get("email"), ["blank", "bad"]);
        assert!(errors.get("other").is_empty());
        assert!(errors.into_result().is_err());
    }
}
