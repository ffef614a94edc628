//! Password policy models

use super::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPolicy {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub default_policy: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub include_numbers: bool,
    pub include_special_characters: bool,
    pub letters_in_mixed_case: bool,
    pub max_consecutive_letters: Option<u32>,
    pub exclude_user_profile_info_in_password: bool,
    pub password_history_enabled: bool,
    /// Number of previous passwords that may not be reused
    pub old_passwords: Option<u32>,
    /// Days before the password expires
    pub expiry_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordPolicy {
    /// Check a candidate password, returning the first violated rule
    pub fn evaluate(&self, password: &str, user: Option<&User>) -> Result<(), String> {
        let length = password.chars().count() as u32;

        if let Some(min_length) = self.min_length {
            if length < min_length {
                return Err(format!(
                    "Password must be at least {} characters",
                    min_length
                ));
            }
        }

        if let Some(max_length) = self.max_length {
            if length > max_length {
                return Err(format!(
                    "Password must be at most {} characters",
                    max_length
                ));
            }
        }

        if self.include_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }

        if self.include_special_characters
            && !password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            return Err("Password must contain at least one special character".to_string());
        }

        if self.letters_in_mixed_case
            && !(password.chars().any(|c| c.is_uppercase())
                && password.chars().any(|c| c.is_lowercase()))
        {
            return Err("Password must contain letters in mixed case".to_string());
        }

        if let Some(max) = self.max_consecutive_letters {
            if max > 0 && longest_run(password) > max {
                return Err(format!(
                    "Password must not contain more than {} consecutive identical characters",
                    max
                ));
            }
        }

        if self.exclude_user_profile_info_in_password {
            if let Some(user) = user {
                let lowered = password.to_lowercase();
                let profile = [
                    Some(user.username.as_str()),
                    user.first_name.as_deref(),
                    user.last_name.as_deref(),
                    user.email.as_deref(),
                ];
                if profile
                    .iter()
                    .flatten()
                    .filter(|value| value.len() >= 3)
                    .any(|value| lowered.contains(&value.to_lowercase()))
                {
                    return Err("Password must not contain user profile information".to_string());
                }
            }
        }

        Ok(())
    }

    /// How many previous hashes must be checked on reset, 0 when disabled
    pub fn history_depth(&self) -> usize {
        if self.password_history_enabled {
            self.old_passwords.unwrap_or(0) as usize
        } else {
            0
        }
    }
}

fn longest_run(password: &str) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<char> = None;
    for c in password.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordPolicy {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 1, max = 128))]
    pub min_length: Option<u32>,
    #[validate(range(min = 1, max = 256))]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub include_numbers: bool,
    #[serde(default)]
    pub include_special_characters: bool,
    #[serde(default)]
    pub letters_in_mixed_case: bool,
    pub max_consecutive_letters: Option<u32>,
    #[serde(default)]
    pub exclude_user_profile_info_in_password: bool,
    #[serde(default)]
    pub password_history_enabled: bool,
    #[validate(range(min = 1, max = 24))]
    pub old_passwords: Option<u32>,
    pub expiry_duration: Option<u32>,
}

impl NewPasswordPolicy {
    /// Reject length bounds that cannot be satisfied together
    pub fn check_lengths(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if max < min {
                return Err("maxLength must be greater than or equal to minLength".to_string());
            }
        }
        Ok(())
    }
}

/// Full replacement of a password policy's rules
pub type UpdatePasswordPolicy = NewPasswordPolicy;
