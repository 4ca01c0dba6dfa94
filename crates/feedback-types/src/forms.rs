use serde::Deserialize;

use crate::validation::{FieldErrors, Rule};

// -- Auth --

/// Missing fields decode as empty strings so that validation, not the
/// extractor, reports them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("username", &self.username, &[Rule::Required("Username can't be blank")]);
        errors.check("password", &self.password, &[Rule::Required("Password can't be blank")]);
        errors.check(
            "email",
            &self.email,
            &[
                Rule::Required("Email can't be blank"),
                Rule::Email("Not valid email"),
                Rule::MaxLength(50, "Too many characters"),
            ],
        );
        errors.check(
            "first_name",
            &self.first_name,
            &[
                Rule::Required("First Name can't be blank"),
                Rule::MaxLength(30, "Too many characters"),
            ],
        );
        errors.check(
            "last_name",
            &self.last_name,
            &[
                Rule::Required("Last Name can't be blank"),
                Rule::MaxLength(30, "Too many characters"),
            ],
        );
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check("username", &self.username, &[Rule::Required("Username can't be blank")]);
        errors.check("password", &self.password, &[Rule::Required("Password can't be blank")]);
        errors.into_result()
    }
}

// -- Feedback --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            "title",
            &self.title,
            &[
                Rule::Required("Title can't be blank"),
                Rule::MaxLength(50, "Max length: 50 character"),
            ],
        );
        errors.check("content", &self.content, &[Rule::Required("Content can't be blank")]);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> RegisterForm {
        RegisterForm {
            username: "alice".into(),
            password: "pw1".into(),
            email: "a@x.com".into(),
            first_name: "Alice".into(),
            last_name: "A".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(alice().validate().is_ok());
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let form = RegisterForm {
            email: "x".repeat(51),
            first_name: "F".repeat(31),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("username"), ["Username can't be blank"]);
        assert_eq!(errors.get("password"), ["Password can't be blank"]);
        assert_eq!(errors.get("email"), ["Not valid email", "Too many characters"]);
        assert_eq!(errors.get("first_name"), ["Too many characters"]);
        assert_eq!(errors.get("last_name"), ["Last Name can't be blank"]);
    }

    #[test]
    fn username_only_needs_to_be_present() {
        let long = "u".repeat(31);
        for username in ["alice smith", "José", "al/ice", long.as_str()] {
            let form = RegisterForm { username: username.into(), ..alice() };
            assert!(form.validate().is_ok(), "{username:?}");
        }
        let blank = RegisterForm { username: "  ".into(), ..alice() };
        assert_eq!(blank.validate().unwrap_err().get("username"), ["Username can't be blank"]);
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["password", "username"]);
        let ok = LoginForm { username: "alice".into(), password: "pw1".into() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn feedback_rejects_empty_and_long_title() {
        let errors = FeedbackForm::default().validate().unwrap_err();
        assert_eq!(errors.get("title"), ["Title can't be blank"]);
        assert_eq!(errors.get("content"), ["Content can't be blank"]);

        let long = FeedbackForm { title: "t".repeat(51), content: "body".into() };
        assert_eq!(long.validate().unwrap_err().get("title"), ["Max length: 50 character"]);

        let exact = FeedbackForm { title: "t".repeat(50), content: "body".into() };
        assert!(exact.validate().is_ok());
    }
}
