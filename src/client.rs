/// Authenticated HTTP client
///
/// Attaches the stored access token to every request and recovers from
/// access-token expiry:
/// - the first 401 on a request starts a single refresh-token exchange
/// - 401s arriving while that exchange runs are queued and replayed, in
///   order, with the new token once it resolves
/// - a request is replayed at most once, so a second 401 reaches the caller
/// - a failed exchange clears the stored tokens, notifies the user once and
///   navigates to the login route once, whatever the number of waiters

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::configuration::ApiSettings;
use crate::error::{ApiError, RefreshError};
use crate::session::{Notification, RefreshCoordinator, RefreshGuard, SessionEvents, Ticket};
use crate::token_store::{TokenPair, TokenStore};
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    events: Arc<dyn SessionEvents>,
    coordinator: RefreshCoordinator,
    login_route: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("login_route", &self.inner.login_route)
            .field("coordinator", &self.inner.coordinator)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        events: Arc<dyn SessionEvents>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                events,
                coordinator: RefreshCoordinator::new(),
                login_route: login_route.into(),
            }),
        }
    }

    /// Client talking to `settings.base_url` through `reqwest`
    pub fn from_settings(
        settings: &ApiSettings,
        store: Arc<dyn TokenStore>,
        events: Arc<dyn SessionEvents>,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(settings.base_url.clone(), settings.timeout())?;
        Ok(Self::new(
            Arc::new(transport),
            store,
            events,
            settings.login_route.clone(),
        ))
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Persist tokens obtained from login or registration
    pub async fn store_session(&self, tokens: &TokenPair) -> Result<(), ApiError> {
        self.inner.store.save(tokens).await?;
        self.inner.coordinator.reset();
        Ok(())
    }

    pub async fn clear_session(&self) -> Result<(), ApiError> {
        self.inner.store.clear().await?;
        self.inner.coordinator.reset();
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.inner.store.load().await?.is_some())
    }

    pub async fn tokens(&self) -> Result<Option<TokenPair>, ApiError> {
        Ok(self.inner.store.load().await?)
    }

    pub fn events(&self) -> &dyn SessionEvents {
        self.inner.events.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Requests currently waiting on a refresh
    pub fn pending_requests(&self) -> usize {
        self.inner.coordinator.pending()
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Send an authenticated request. Non-success statuses become `ApiError::Status`.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            %request_id,
            method = %request.method,
            path = %request.path
        );
        self.execute_authenticated(request).instrument(span).await
    }

    /// Send a request without credentials and without refresh handling
    /// (login, registration, the refresh exchange itself).
    pub async fn execute_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.inner.transport.send(&request, None).await?;
        into_result(response)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        Ok(response.json()?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::post(path).with_json(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::put(path).with_json(body)).await
    }

    /// DELETE whose response body, if any, is ignored
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }

    async fn execute_authenticated(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_with = self
            .inner
            .store
            .load()
            .await?
            .map(|tokens| tokens.access_token);

        let response = self.inner.transport.send(&request, sent_with.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return into_result(response);
        }

        tracing::debug!("Access token rejected");
        let replayed = self.recover(&request, sent_with.as_deref()).await?;
        into_result(replayed)
    }

    /// Obtain a usable access token for a request that got its first 401 and
    /// send it once more. The replay is never recovered again.
    async fn recover(
        &self,
        request: &ApiRequest,
        sent_with: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let access_token = match self.inner.coordinator.enter(sent_with) {
            Ticket::Leader { guard, outcome } => {
                // The exchange runs on its own task so cancelling this
                // request does not abandon the requests queued behind it.
                let client = self.clone();
                tokio::spawn(
                    async move { client.refresh(guard).await }.instrument(tracing::Span::current()),
                );
                outcome.await.unwrap_or(Err(RefreshError::Interrupted))?
            }
            Ticket::Queued(receiver) => {
                tracing::debug!("Refresh in progress, request queued");
                receiver.await.unwrap_or(Err(RefreshError::Interrupted))?
            }
            Ticket::Rotated(token) => {
                tracing::debug!("Token was refreshed while request was in flight");
                token
            }
            Ticket::Expired(error) => {
                tracing::debug!("Session already ended, not refreshing again");
                return Err(error.into());
            }
        };

        tracing::debug!("Replaying request with refreshed token");
        Ok(self.inner.transport.send(request, Some(&access_token)).await?)
    }

    async fn refresh(&self, guard: RefreshGuard) {
        tracing::info!("Refreshing session");

        match self.exchange_refresh_token().await {
            Ok(tokens) => {
                let released = guard.succeed(tokens.access_token);
                tracing::info!(queued_requests = released, "Session refreshed");
            }
            Err(error) => {
                tracing::warn!(error = %error, "Session refresh failed, tearing down session");
                let error = match self.teardown().await {
                    Ok(()) => error,
                    Err(incomplete) => incomplete,
                };
                let released = guard.fail(error);
                tracing::info!(queued_requests = released, "Queued requests released with refresh failure");
            }
        }
    }

    /// POST the stored refresh token and persist the returned pair.
    async fn exchange_refresh_token(&self) -> Result<TokenPair, RefreshError> {
        let refresh_token = self
            .inner
            .store
            .load()
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .map(|tokens| tokens.refresh_token)
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = ApiRequest::post(REFRESH_PATH)
            .with_json(serde_json::json!({ "refreshToken": refresh_token }));
        let response = self
            .inner
            .transport
            .send(&request, None)
            .await
            .map_err(RefreshError::Network)?;

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
                message: response.backend_message(),
            });
        }

        let tokens: TokenPair = response
            .json()
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;

        self.inner
            .store
            .save(&tokens)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;

        Ok(tokens)
    }

    /// Clear the tokens, notify once and go to the login route. A store that
    /// could not be cleared is reported back so callers see the session survived.
    async fn teardown(&self) -> Result<(), RefreshError> {
        let cleared = self.inner.store.clear().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to clear stored tokens");
            RefreshError::Storage(e.to_string())
        });
        self.inner.events.notify(Notification::session_expired());
        self.inner.events.navigate(&self.inner.login_route);
        cleared
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    let message = response.backend_message();
    Err(ApiError::Status {
        status: response.status,
        message,
        body: response.body,
    })
}
