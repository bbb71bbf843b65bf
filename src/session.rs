/// Session lifecycle plumbing
///
/// - `SessionEvents`: the outward side effects of a terminated session
///   (user notification, navigation to the login route)
/// - `RefreshCoordinator`: the refresh-in-progress flag and the FIFO queue
///   of requests waiting on that refresh

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::{RefreshError, SESSION_EXPIRED_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn session_expired() -> Self {
        Self::new(NotificationLevel::Warning, "Session expired", SESSION_EXPIRED_MESSAGE)
    }

    pub fn logged_out() -> Self {
        Self::new(NotificationLevel::Info, "Logged out", "You have been logged out successfully.")
    }
}

/// Receives the user-visible effects of session changes
pub trait SessionEvents: Send + Sync {
    fn notify(&self, notification: Notification);
    fn navigate(&self, route: &str);
}

/// Default sink: records session events in the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSessionEvents;

impl SessionEvents for TracingSessionEvents {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Warning | NotificationLevel::Error => tracing::warn!(
                title = %notification.title,
                message = %notification.message,
                "User notification"
            ),
            NotificationLevel::Info | NotificationLevel::Success => tracing::info!(
                title = %notification.title,
                message = %notification.message,
                "User notification"
            ),
        }
    }

    fn navigate(&self, route: &str) {
        tracing::info!(route = route, "Navigation requested");
    }
}

/// Access token delivered to a queued request, or the shared refresh failure
pub type RefreshOutcome = Result<String, RefreshError>;

/// What a request that just received a 401 should do next
#[derive(Debug)]
pub enum Ticket {
    /// No refresh is running: this caller starts one, and its own outcome
    /// arrives on `outcome` ahead of every queued request.
    Leader {
        guard: RefreshGuard,
        outcome: oneshot::Receiver<RefreshOutcome>,
    },
    /// A refresh is running: wait for its outcome.
    Queued(oneshot::Receiver<RefreshOutcome>),
    /// A refresh finished after this request was sent: replay with the newer token.
    Rotated(String),
    /// The session this request was sent with has already been torn down.
    Expired(RefreshError),
}

#[derive(Debug)]
struct EndedSession {
    access_token: Option<String>,
    error: RefreshError,
}

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    leader: Option<oneshot::Sender<RefreshOutcome>>,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
    // Access token minted by the last successful refresh of this session
    latest: Option<String>,
    // Set by a failed refresh until the next login or logout
    ended: Option<EndedSession>,
}

/// Single-flight coordination of refresh-token exchanges.
///
/// Every transition happens under one lock that is never held across an
/// `.await`. The queue is non-empty only while `refreshing` is set, and the
/// flag is cleared in the same critical section that drains the queue.
///
/// Outcomes are delivered leader first, then waiters in enqueue order. Each
/// receiver replays from its own task, so on a single-threaded runtime the
/// replays go out in that order; a multi-threaded runtime only guarantees
/// the order in which they are woken.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<RefreshState>>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide how a request sent with `sent_with` recovers from a 401.
    pub fn enter(&self, sent_with: Option<&str>) -> Ticket {
        let mut state = lock(&self.state);

        if state.refreshing {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            return Ticket::Queued(receiver);
        }

        if let Some(latest) = state.latest.as_deref() {
            if sent_with != Some(latest) {
                return Ticket::Rotated(latest.to_string());
            }
        }

        if let Some(ended) = &state.ended {
            if sent_with.is_none() || sent_with == ended.access_token.as_deref() {
                return Ticket::Expired(ended.error.clone());
            }
        }

        let (sender, outcome) = oneshot::channel();
        state.refreshing = true;
        state.leader = Some(sender);
        Ticket::Leader {
            guard: RefreshGuard {
                state: Arc::clone(&self.state),
                sent_with: sent_with.map(str::to_string),
                finished: false,
            },
            outcome,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).refreshing
    }

    /// Number of requests queued behind the request leading the current refresh
    pub fn pending(&self) -> usize {
        lock(&self.state).waiters.len()
    }

    /// Forget the previous session, e.g. after a new login or a logout.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.latest = None;
        state.ended = None;
    }
}

/// Owned by the task performing a refresh.
///
/// Dropping it without calling `succeed` or `fail` (the refresh task
/// panicked or its runtime shut down) releases everyone with
/// `RefreshError::Interrupted` so the session never stays stuck refreshing.
#[derive(Debug)]
pub struct RefreshGuard {
    state: Arc<Mutex<RefreshState>>,
    sent_with: Option<String>,
    finished: bool,
}

impl RefreshGuard {
    /// Hand the new access token to the leader, then to every waiter in FIFO
    /// order. Returns how many waiters were released.
    pub fn succeed(mut self, access_token: String) -> usize {
        self.finish(Ok(access_token))
    }

    /// Share a terminal failure. Later 401s for the same session get it too
    /// instead of starting another refresh.
    pub fn fail(mut self, error: RefreshError) -> usize {
        self.finish(Err(error))
    }

    fn finish(&mut self, outcome: RefreshOutcome) -> usize {
        self.finished = true;
        let (leader, waiters) = {
            let mut state = lock(&self.state);
            match &outcome {
                Ok(access_token) => {
                    state.latest = Some(access_token.clone());
                    state.ended = None;
                }
                Err(RefreshError::Interrupted) => state.latest = None,
                Err(error) => {
                    state.latest = None;
                    state.ended = Some(EndedSession {
                        access_token: self.sent_with.take(),
                        error: error.clone(),
                    });
                }
            }
            state.refreshing = false;
            (state.leader.take(), std::mem::take(&mut state.waiters))
        };

        // A receiver whose caller went away has nothing left to replay
        if let Some(leader) = leader {
            let _ = leader.send(outcome.clone());
        }
        let released = waiters.len();
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        released
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Refresh abandoned before completion, releasing waiters");
            self.finish(Err(RefreshError::Interrupted));
        }
    }
}
