//! Form payloads and their validation rules.
//!
//! Missing fields deserialize to empty strings so they surface as field
//! errors on the re-rendered form instead of a rejected request.

use serde::{Deserialize, Serialize};

use super::utils::{normalize_email, valid_email};

const REQUIRED: &str = "This field is required.";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RegisterErrors {
    pub name: Vec<String>,
    pub surname: Vec<String>,
    pub email: Vec<String>,
    pub password: Vec<String>,
    pub confirm: Vec<String>,
}

impl RegisterErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.surname.is_empty()
            && self.email.is_empty()
            && self.password.is_empty()
            && self.confirm.is_empty()
    }
}

impl RegisterForm {
    #[must_use]
    pub fn validate(&self) -> RegisterErrors {
        let email = normalize_email(&self.email);

        let mut errors = RegisterErrors {
            name: required_max(&self.name, 25),
            surname: required_max(&self.surname, 25),
            ..RegisterErrors::default()
        };

        if email.is_empty() {
            errors.email.push(REQUIRED.to_string());
        } else {
            if !valid_email(&email) {
                errors.email.push("Invalid email address.".to_string());
            }
            if !within(&email, 6, 40) {
                errors.email.push(between(6, 40));
            }
        }

        if !within(&self.password, 6, 25) {
            errors.password.push(between(6, 25));
        }

        if self.confirm != self.password {
            errors.confirm.push("Passwords must match.".to_string());
        }

        errors
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct LoginErrors {
    pub username: Vec<String>,
    pub password: Vec<String>,
}

impl LoginErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl LoginForm {
    #[must_use]
    pub fn validate(&self) -> LoginErrors {
        let mut errors = LoginErrors::default();
        if self.username.trim().is_empty() {
            errors.username.push(REQUIRED.to_string());
        }
        if self.password.is_empty() {
            errors.password.push(REQUIRED.to_string());
        }
        errors
    }
}

fn required_max(value: &str, max: usize) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        vec![REQUIRED.to_string()]
    } else if value.chars().count() > max {
        vec![format!("Field cannot be longer than {max} characters.")]
    } else {
        Vec::new()
    }
}

fn within(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

fn between(min: usize, max: usize) -> String {
    format!("Field must be between {min} and {max} characters long.")
}
