// src/utils/validation.rs

use std::sync::LazyLock;

use regex::Regex;
use url::Url;
use validator::ValidationErrors;

use crate::error::AppError;
use crate::models::user::SocialLinks;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email regex is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 6 to 20 characters with at least one digit, one lowercase and one
/// uppercase letter. Mirrors the client-side rule.
pub fn is_strong_password(password: &str) -> bool {
    let len = password.chars().count();
    (6..=20).contains(&len)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
}

/// First human-readable message out of a `validator` error set, without
/// the field-name prefix that `ValidationErrors::to_string` adds.
pub fn first_message(errors: &ValidationErrors) -> String {
    for errs in errors.field_errors().values() {
        if let Some(message) = errs.iter().find_map(|e| e.message.as_ref()) {
            return message.to_string();
        }
    }
    errors.to_string()
}

/// Rejects social links that are not full http(s) URLs. Empty entries
/// are allowed; the client sends "" for platforms left blank.
pub fn check_social_links(links: &SocialLinks) -> Result<(), AppError> {
    for (platform, link) in links.entries() {
        if link.is_empty() {
            continue;
        }
        let parsed = Url::parse(link).map_err(|_| invalid_link(platform))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(invalid_link(platform));
        }
    }
    Ok(())
}

fn invalid_link(platform: &str) -> AppError {
    AppError::Validation(format!(
        "{} link is invalid. You must enter a full link",
        platform
    ))
}
