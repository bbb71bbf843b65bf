/// User accounts
///
/// Profile access for every role, account management for admins.

use serde::{Deserialize, Deserializer, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::validators::is_valid_password;

/// Account role. Ordered so that `USER < COLLECTOR < ADMIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Collector,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default, alias = "nom")]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
}

impl User {
    /// Whether the user's role is at least `required` in the role hierarchy
    pub fn has_role(&self, required: Role) -> bool {
        self.role >= required
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

// Backends disagree on whether user ids are strings or integers
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    client.get("/api/users/me").await
}

pub async fn list(client: &ApiClient) -> Result<Vec<User>, ApiError> {
    client.get("/api/users").await
}

pub async fn create<T: Serialize + ?Sized>(client: &ApiClient, user: &T) -> Result<User, ApiError> {
    client.post("/api/users", serde_json::to_value(user)?).await
}

pub async fn update<T: Serialize + ?Sized>(
    client: &ApiClient,
    id: &str,
    changes: &T,
) -> Result<User, ApiError> {
    client
        .put(&format!("/api/users/{}", id), serde_json::to_value(changes)?)
        .await
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&format!("/api/users/{}", id)).await
}

pub async fn change_password(
    client: &ApiClient,
    current_password: &str,
    new_password: &str,
) -> Result<serde_json::Value, ApiError> {
    if current_password.is_empty() {
        return Err(crate::error::ValidationError::EmptyField("ancienPassword").into());
    }
    is_valid_password("nouveauPassword", new_password)?;

    client
        .post(
            "/api/users/change-password",
            serde_json::json!({
                "ancienPassword": current_password,
                "nouveauPassword": new_password,
            }),
        )
        .await
}
