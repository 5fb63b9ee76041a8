// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Social profile links, stored as a single JSONB document on the user row.
/// Absent keys deserialize to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub website: String,
}

impl SocialLinks {
    /// (platform, url) pairs, in display order.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("youtube", &self.youtube),
            ("instagram", &self.instagram),
            ("facebook", &self.facebook),
            ("twitter", &self.twitter),
            ("github", &self.github),
            ("website", &self.website),
        ]
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub fullname: String,

    /// Unique email address, used for login.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Unique handle, derived from the email local part at signup.
    pub username: String,

    pub bio: String,

    pub profile_img: String,

    pub social_links: sqlx::types::Json<SocialLinks>,

    pub total_posts: i64,

    /// Reads accumulated across all of this user's blogs.
    pub total_reads: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Author columns joined alongside blogs, comments and notifications.
#[derive(Debug, Clone)]
pub struct AuthorInfo {
    pub fullname: String,
    pub username: String,
    pub profile_img: String,
    pub bio: String,
}

impl AuthorInfo {
    pub fn card(&self) -> AuthorCard {
        AuthorCard::new(&self.fullname, &self.username, &self.profile_img)
    }

    /// Card variant carrying the bio, used on the blog reading page.
    pub fn card_with_bio(&self) -> AuthorCard {
        self.card().with_bio(&self.bio)
    }
}

impl From<&User> for AuthorInfo {
    fn from(user: &User) -> Self {
        Self {
            fullname: user.fullname.clone(),
            username: user.username.clone(),
            profile_img: user.profile_img.clone(),
            bio: user.bio.clone(),
        }
    }
}

/// The `personal_info` block embedded in profile and author payloads.
#[derive(Debug, Serialize)]
pub struct PersonalInfo {
    pub fullname: String,
    pub username: String,
    pub profile_img: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Author or actor reference nested under a `personal_info` key, the shape
/// the client expects for blog authors, commenters and notification actors.
#[derive(Debug, Serialize)]
pub struct AuthorCard {
    pub personal_info: PersonalInfo,
}

impl AuthorCard {
    pub fn new(fullname: &str, username: &str, profile_img: &str) -> Self {
        Self {
            personal_info: PersonalInfo {
                fullname: fullname.to_string(),
                username: username.to_string(),
                profile_img: profile_img.to_string(),
                bio: None,
            },
        }
    }

    pub fn with_bio(mut self, bio: &str) -> Self {
        self.personal_info.bio = Some(bio.to_string());
        self
    }
}

/// The `account_info` block of a profile payload.
#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub total_posts: i64,
    pub total_reads: i64,
}

/// Profile payload for `/get-user` and `/get-user/{user_id}`.
/// Social links are only disclosed to the profile's owner.
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub personal_info: PersonalInfo,
    pub account_info: AccountInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
}

impl UserProfileResponse {
    pub fn public(user: &User) -> Self {
        Self {
            personal_info: PersonalInfo {
                fullname: user.fullname.clone(),
                username: user.username.clone(),
                profile_img: user.profile_img.clone(),
                bio: Some(user.bio.clone()),
            },
            account_info: AccountInfo {
                total_posts: user.total_posts,
                total_reads: user.total_reads,
            },
            social_links: None,
        }
    }

    pub fn private(user: &User) -> Self {
        let mut profile = Self::public(user);
        profile.social_links = Some(user.social_links.0.clone());
        profile
    }
}

/// DTO for account creation (signup).
/// Email and password rules are checked by hand in the handler so the
/// client sees the exact message for whichever rule failed first.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, message = "Fullname must be at least 3 letters long"))]
    pub fullname: String,

    pub email: String,

    pub password: String,
}

/// DTO for email/password login.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Session payload returned by signup and signin.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub profile_img: String,
    pub username: String,
    pub fullname: String,
}

impl SessionResponse {
    pub fn for_user(user: &User, access_token: String) -> Self {
        Self {
            access_token,
            profile_img: user.profile_img.clone(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
        }
    }
}

/// DTO for the authenticated password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// DTO for profile updates.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, message = "Username should be at least 3 letters long"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "Bio should not be more than 200 characters"))]
    pub bio: String,

    #[serde(default)]
    pub social_links: SocialLinks,
}

/// Query parameters for user search.
#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    pub query: String,
}
