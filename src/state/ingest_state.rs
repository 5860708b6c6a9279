/// Ingestion state definitions
///
/// This module defines the states a single ingestion passes through, from the
/// raw fetch to a searchable document.
use crate::ReadEngineError;
use std::fmt;

/// Represents the current state of one ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestState {
    // ===== Active States =====
    /// The page is being fetched or read
    Pending,

    /// Raw bytes were retrieved and normalized to UTF-8
    Fetched,

    /// Comment markup was removed
    Sanitized,

    /// Title and description were derived
    Extracted,

    /// The document was committed to the store
    Stored,

    // ===== Terminal States =====
    /// The document is stored and searchable
    Indexed,

    /// The document is stored but the index write failed
    Degraded,

    /// The ingestion stopped before anything was stored
    Failed,
}

impl IngestState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::Degraded | Self::Failed)
    }

    /// Returns true if the document is durable in this state
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored | Self::Indexed | Self::Degraded)
    }

    /// Returns true if the ingestion completed fully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Indexed)
    }

    /// Checks whether moving from `self` to `next` is allowed
    ///
    /// Anything before `Stored` may fail; once stored, the only outcomes are
    /// `Indexed` or `Degraded`, never `Failed`.
    pub fn can_transition_to(&self, next: IngestState) -> bool {
        use IngestState::*;
        matches!(
            (self, next),
            (Pending, Fetched)
                | (Fetched, Sanitized)
                | (Sanitized, Extracted)
                | (Extracted, Stored)
                | (Stored, Indexed)
                | (Stored, Degraded)
                | (Pending, Failed)
                | (Fetched, Failed)
                | (Sanitized, Failed)
                | (Extracted, Failed)
        )
    }

    /// Converts the state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Sanitized => "sanitized",
            Self::Extracted => "extracted",
            Self::Stored => "stored",
            Self::Indexed => "indexed",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible ingestion states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Fetched,
            Self::Sanitized,
            Self::Extracted,
            Self::Stored,
            Self::Indexed,
            Self::Degraded,
            Self::Failed,
        ]
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Follows one ingestion through its states, rejecting illegal moves
#[derive(Debug)]
pub struct IngestTracker {
    source: String,
    state: IngestState,
}

impl IngestTracker {
    /// Starts tracking an ingestion whose content is still to be retrieved
    pub fn pending(source: &str) -> Self {
        Self::starting_at(source, IngestState::Pending)
    }

    /// Starts tracking an ingestion whose content has just been fetched
    pub fn fetched(source: &str) -> Self {
        Self::starting_at(source, IngestState::Fetched)
    }

    fn starting_at(source: &str, state: IngestState) -> Self {
        tracing::debug!(source, %state, "ingestion started");
        Self {
            source: source.to_string(),
            state,
        }
    }

    /// The current state
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Moves to `next`, or fails with `InvalidTransition`
    pub fn advance(&mut self, next: IngestState) -> Result<(), ReadEngineError> {
        if !self.state.can_transition_to(next) {
            return Err(ReadEngineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(source = %self.source, from = %self.state, to = %next, "ingestion state");
        self.state = next;
        Ok(())
    }

    /// Marks the ingestion as failed if it has not been stored yet
    ///
    /// Returns the state the ingestion ends in.
    pub fn fail(&mut self, reason: &dyn fmt::Display) -> IngestState {
        if self.state.can_transition_to(IngestState::Failed) {
            tracing::warn!(source = %self.source, at = %self.state, "ingestion failed: {}", reason);
            self.state = IngestState::Failed;
        }
        self.state
    }
}
