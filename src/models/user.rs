use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use super::Language;

/// A registered user as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// bcrypt hash of the password.
    pub password: String,
    pub native_language: Language,
    pub is_superuser: bool,
    pub created: DateTime<Utc>,
}

/// Public representation of a user; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub native_language: Language,
    pub created: DateTime<Utc>,
    pub is_superuser: bool,
}

/// Payload for `POST /user`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub native_language: Language,
}

/// Payload for `PATCH /user/{id}`; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub native_language: Option<Language>,
}

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password, native_language, is_superuser, created";

impl User {
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            native_language: self.native_language,
            created: self.created,
            is_superuser: self.is_superuser,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            username: user.username,
            email: user.email,
            native_language: user.native_language,
            created: user.created,
            is_superuser: user.is_superuser,
        }
    }
}
