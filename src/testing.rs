//! In-memory collaborators for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::REFRESH_PATH;
use crate::error::NetworkError;
use crate::session::{Notification, SessionEvents};
use crate::transport::{ApiRequest, ApiResponse, Transport};

type Responder = dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, NetworkError> + Send + Sync;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ApiRequest,
    pub bearer: Option<String>,
}

/// Transport answering from a closure and recording every call in dispatch order.
///
/// A gated path blocks every call to it until its gate is notified:
/// `gate_refresh` / `refresh_gate()` for the refresh exchange, `gate_path` / `gate_for` for others.
pub struct FakeTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
    gates: Vec<(String, Arc<Notify>)>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, NetworkError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            gates: Vec::new(),
        }
    }

    pub fn gate_path(mut self, path: &str) -> Self {
        self.gates.push((path.to_string(), Arc::new(Notify::new())));
        self
    }

    pub fn gate_for(&self, path: &str) -> Arc<Notify> {
        self.gates
            .iter()
            .find(|(gated, _)| gated == path)
            .map(|(_, gate)| gate.clone())
            .expect("path is gated")
    }

    pub fn gate_refresh(self) -> Self {
        self.gate_path(REFRESH_PATH)
    }

    pub fn refresh_gate(&self) -> Arc<Notify> {
        self.gate_for(REFRESH_PATH)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.request.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, NetworkError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            bearer: bearer.map(str::to_string),
        });

        let gate = self
            .gates
            .iter()
            .find(|(gated, _)| *gated == request.path)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        (self.responder)(request, bearer)
    }
}

#[derive(Debug, Default)]
pub struct RecordingEvents {
    notifications: Mutex<Vec<Notification>>,
    navigations: Mutex<Vec<String>>,
}

impl RecordingEvents {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

impl SessionEvents for RecordingEvents {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn navigate(&self, route: &str) {
        self.navigations.lock().unwrap().push(route.to_string());
    }
}
