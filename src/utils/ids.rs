// src/utils/ids.rs

use rand::{Rng, distributions::Alphanumeric};

/// Length of generated blog slugs.
const SLUG_LEN: usize = 12;

/// Length of the suffix appended to colliding usernames at signup.
const USERNAME_SUFFIX_LEN: usize = 5;

/// URL-safe random alphanumeric token.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn blog_slug() -> String {
    random_token(SLUG_LEN)
}

pub fn username_suffix() -> String {
    random_token(USERNAME_SUFFIX_LEN)
}

/// Generated avatar URL assigned to fresh accounts.
pub fn default_avatar() -> String {
    format!(
        "https://api.dicebear.com/6.x/notionists-neutral/svg?seed={}",
        random_token(8)
    )
}
