/// Authentication endpoints
///
/// Login and registration go out without credentials and bypass refresh
/// handling: a 401 there means bad credentials, not an expired session.

use serde::{Deserialize, Serialize};

use crate::api::users::User;
use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::session::Notification;
use crate::token_store::TokenPair;
use crate::transport::ApiRequest;
use crate::validators::{is_valid_email, is_valid_password, is_valid_phone, required_text};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

impl AuthResponse {
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    pub nom: String,
    pub email: String,
    pub password: String,
    pub telephone: String,
    pub adresse: String,
}

impl RegisterInput {
    /// Normalised copy of the input, or the first invalid field
    pub fn validate(&self) -> Result<Self, ValidationError> {
        is_valid_password("password", &self.password)?;
        Ok(Self {
            nom: required_text("nom", &self.nom)?,
            email: is_valid_email(&self.email)?,
            password: self.password.clone(),
            telephone: is_valid_phone(&self.telephone)?,
            adresse: required_text("adresse", &self.adresse)?,
        })
    }
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
    let email = is_valid_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let request = ApiRequest::post("/api/auth/login")
        .with_json(serde_json::json!({ "email": email, "password": password }));
    establish_session(client, request, "login").await
}

pub async fn register(client: &ApiClient, input: &RegisterInput) -> Result<AuthResponse, ApiError> {
    let input = input.validate()?;
    let request = ApiRequest::post("/api/auth/register").with_json(serde_json::to_value(&input)?);
    establish_session(client, request, "register").await
}

/// Send the credentials and keep the returned tokens. Any failure leaves no session behind.
async fn establish_session(
    client: &ApiClient,
    request: ApiRequest,
    operation: &str,
) -> Result<AuthResponse, ApiError> {
    let outcome = async {
        let response: AuthResponse = client.execute_anonymous(request).await?.json()?;
        client.store_session(&response.tokens()).await?;
        Ok::<_, ApiError>(response)
    }
    .await;

    match outcome {
        Ok(response) => {
            tracing::info!(operation = operation, user_id = %response.user.id, role = ?response.user.role, "Session established");
            Ok(response)
        }
        Err(e) => {
            e.log_error(operation);
            if let Err(clear_error) = client.clear_session().await {
                tracing::error!(error = %clear_error, "Failed to clear tokens after {} failure", operation);
            }
            Err(e)
        }
    }
}

/// Tell the backend to end the session. Local tokens are cleared whether or not that succeeds.
pub async fn logout(client: &ApiClient) -> Result<(), ApiError> {
    let outcome = client.execute(ApiRequest::post("/api/auth/logout")).await;
    client.clear_session().await?;

    match outcome {
        Ok(_) => {
            client.events().notify(Notification::logged_out());
            Ok(())
        }
        // An expired session is already gone, which is what logout wanted
        Err(ApiError::SessionExpired(_)) => Ok(()),
        Err(e) => {
            e.log_error("logout");
            Err(e)
        }
    }
}
