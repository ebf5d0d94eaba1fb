//! Request Lifecycle
//!
//! Per-panel guard that decides which in-flight fetch may touch visible
//! state. Starting a fetch supersedes the previous one: its abort handle
//! fires and its token stops being current, so a late result is dropped
//! no matter when it arrives.
//!
//! ## States
//!
//! `Idle → Fetching → Resolved | Cancelled | Aborted`
//!
//! - **Cancelled**: the last fetch was superseded without a successor finishing
//! - **Aborted**: `cancel_all` ran (unmount); terminal

use futures_util::future::{AbortHandle, AbortRegistration};
use uuid::Uuid;

/// Lifecycle state of a panel's request slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Fetching,
    Resolved,
    Cancelled,
    Aborted,
}

/// Identifies one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    generation: u64,
    id: Uuid,
}

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request id for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Issues tokens and tracks which one is current
#[derive(Debug)]
pub struct RequestGuard {
    generation: u64,
    state: RequestState,
    current: Option<AbortHandle>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: RequestState::Idle,
            current: None,
        }
    }

    /// Start a new fetch, superseding any in-flight one.
    ///
    /// The returned registration must wrap the fetch future in
    /// `futures_util::future::Abortable`. After `cancel_all` the token is
    /// born stale and the registration is already aborted.
    pub fn begin(&mut self) -> (RequestToken, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        let token = RequestToken {
            generation: self.generation + 1,
            id: Uuid::new_v4(),
        };

        if self.state == RequestState::Aborted {
            handle.abort();
            return (token, registration);
        }

        if let Some(previous) = self.current.take() {
            previous.abort();
            tracing::debug!(generation = self.generation, "superseded in-flight request");
        }

        self.generation = token.generation;
        self.current = Some(handle);
        self.state = RequestState::Fetching;
        (token, registration)
    }

    /// Whether results for `token` may still be applied
    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.state == RequestState::Fetching && token.generation == self.generation
    }

    /// Mark `token`'s fetch as settled.
    ///
    /// Returns true if the token was current; a stale token leaves the
    /// guard untouched.
    pub fn finish(&mut self, token: &RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.current = None;
        self.state = RequestState::Resolved;
        true
    }

    /// Abort the current fetch and keep the slot open for new ones
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
        if self.state == RequestState::Fetching {
            self.generation += 1;
            self.state = RequestState::Cancelled;
        }
    }

    /// Abort everything and refuse future fetches (unmount)
    pub fn cancel_all(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
        self.generation += 1;
        self.state = RequestState::Aborted;
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == RequestState::Aborted
    }
}

impl Default for RequestGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::{Abortable, Aborted};

    #[test]
    fn test_begin_and_finish() {
        let mut guard = RequestGuard::new();
        assert_eq!(guard.state(), RequestState::Idle);

        let (token, _reg) = guard.begin();
        assert_eq!(guard.state(), RequestState::Fetching);
        assert!(guard.is_current(&token));

        assert!(guard.finish(&token));
        assert_eq!(guard.state(), RequestState::Resolved);
        assert!(!guard.is_current(&token));
    }

    #[test]
    fn test_newer_begin_supersedes() {
        let mut guard = RequestGuard::new();
        let (a, _reg_a) = guard.begin();
        let (b, _reg_b) = guard.begin();

        assert!(!guard.is_current(&a));
        assert!(guard.is_current(&b));
        assert!(!guard.finish(&a));
        assert_eq!(guard.state(), RequestState::Fetching);
        assert!(guard.finish(&b));
    }

    #[tokio::test]
    async fn test_superseded_future_observes_abort() {
        let mut guard = RequestGuard::new();
        let (_a, reg_a) = guard.begin();
        let pending = Abortable::new(std::future::pending::<()>(), reg_a);

        let (_b, _reg_b) = guard.begin();

        assert_eq!(pending.await, Err(Aborted));
    }

    #[test]
    fn test_cancel_allows_restart() {
        let mut guard = RequestGuard::new();
        let (a, _reg) = guard.begin();
        guard.cancel();

        assert_eq!(guard.state(), RequestState::Cancelled);
        assert!(!guard.is_current(&a));

        let (b, _reg) = guard.begin();
        assert!(guard.is_current(&b));
    }

    #[tokio::test]
    async fn test_cancel_all_is_terminal() {
        let mut guard = RequestGuard::new();
        let (a, reg_a) = guard.begin();
        guard.cancel_all();

        assert_eq!(guard.state(), RequestState::Aborted);
        assert!(!guard.is_current(&a));
        assert_eq!(Abortable::new(async {}, reg_a).await, Err(Aborted));

        let (late, reg_late) = guard.begin();
        assert!(!guard.is_current(&late));
        assert!(guard.is_closed());
        assert_eq!(Abortable::new(async {}, reg_late).await, Err(Aborted));
    }

    #[test]
    fn test_tokens_have_distinct_ids() {
        let mut guard = RequestGuard::new();
        let (a, _) = guard.begin();
        let (b, _) = guard.begin();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.generation(), a.generation() + 1);
    }
}
