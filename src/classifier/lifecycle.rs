use crate::{Error, Result};
use tracing::{debug, warn};

// Request states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Validated,
    Staged,
    Inferred,
    Cleaned,
    Responded,
    /// Responded with an error body.
    Failed,
}

// Request events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Validate,
    Stage,
    Infer,
    Cleanup,
    Respond,
    Fail,
}

/// Tracks one classification request through
/// `Received → Validated → Staged → Inferred → Cleaned → Responded`.
/// Any pre-response state may exit through `Fail`.
#[derive(Debug)]
pub struct RequestLifecycle {
    state: RequestState,
    request_id: String,
}

impl RequestLifecycle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            state: RequestState::Received,
            request_id: request_id.into(),
        }
    }

    pub fn current_state(&self) -> RequestState {
        self.state
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn transition(&mut self, event: RequestEvent) -> Result<()> {
        use RequestEvent as E;
        use RequestState as S;

        let new_state = match (self.state, event) {
            (S::Received, E::Validate) => S::Validated,
            (S::Validated, E::Stage) => S::Staged,
            (S::Staged, E::Infer) => S::Inferred,
            (S::Inferred, E::Cleanup) => S::Cleaned,
            (S::Cleaned, E::Respond) => S::Responded,
            (S::Received | S::Validated | S::Staged | S::Inferred, E::Fail) => S::Failed,
            _ => {
                warn!(
                    "Invalid request transition from {:?} with event {:?} (request {})",
                    self.state, event, self.request_id
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", self.state),
                    requested: format!("{:?}", event),
                });
            }
        };

        debug!(
            "Request {} state: {:?} -> {:?} (event: {:?})",
            self.request_id, self.state, new_state, event
        );
        self.state = new_state;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RequestState::Responded | RequestState::Failed)
    }
}
