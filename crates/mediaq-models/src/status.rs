//! Media item status state machine.
//!
//! Statuses form a closed, exact-match string enumeration on the wire:
//! `Queued`, `Processing`, `Completed`, `Failed`.

use serde::{Deserialize, Serialize};

use crate::item::ValidationError;

/// Processing status of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MediaStatus {
    /// Item is queued waiting for a worker
    #[default]
    Queued,
    /// Item is actively being processed
    Processing,
    /// Processing completed successfully
    Completed,
    /// Processing failed with an error
    Failed,
}

/// Classification of a requested status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Forward move along the state machine; write it.
    Advance,
    /// Re-applying the current status; succeed without writing.
    Idempotent,
    /// Terminal state overwritten by a different terminal state.
    /// Accepted last-write-wins, but callers should flag it as an anomaly.
    TerminalOverwrite,
    /// Backward or otherwise impossible move; reject before any I/O.
    Rejected,
}

impl MediaStatus {
    /// Get the exact wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Queued => "Queued",
            MediaStatus::Processing => "Processing",
            MediaStatus::Completed => "Completed",
            MediaStatus::Failed => "Failed",
        }
    }

    /// Parse the exact wire representation. Any other string is a
    /// validation error; there is no lenient fallback.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "Queued" => Ok(MediaStatus::Queued),
            "Processing" => Ok(MediaStatus::Processing),
            "Completed" => Ok(MediaStatus::Completed),
            "Failed" => Ok(MediaStatus::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Completed | MediaStatus::Failed)
    }

    /// Classify a transition from `self` to `next`.
    ///
    /// The machine is `Queued -> Processing -> {Completed, Failed}` with a
    /// direct `Queued -> Failed` edge for pre-processing failures.
    pub fn classify_transition(self, next: MediaStatus) -> Transition {
        use MediaStatus::*;

        if self == next {
            return Transition::Idempotent;
        }

        match (self, next) {
            (Queued, Processing)
            | (Queued, Failed)
            | (Processing, Completed)
            | (Processing, Failed) => Transition::Advance,
            (Completed, Failed) | (Failed, Completed) => Transition::TerminalOverwrite,
            _ => Transition::Rejected,
        }
    }
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_are_exact_match() {
        assert_eq!(MediaStatus::Queued.as_str(), "Queued");
        assert_eq!(MediaStatus::parse("Processing").unwrap(), MediaStatus::Processing);
        assert!(MediaStatus::parse("processing").is_err());
        assert!(MediaStatus::parse("Done").is_err());
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&MediaStatus::Completed).unwrap();
        assert_eq!(json, "\"Completed\"");
        let status: MediaStatus = serde_json::from_str("\"Failed\"").unwrap();
        assert_eq!(status, MediaStatus::Failed);
    }

    #[test]
    fn forward_transitions_advance() {
        use MediaStatus::*;
        assert_eq!(Queued.classify_transition(Processing), Transition::Advance);
        assert_eq!(Processing.classify_transition(Completed), Transition::Advance);
        assert_eq!(Processing.classify_transition(Failed), Transition::Advance);
    }

    #[test]
    fn queued_to_failed_is_allowed() {
        assert_eq!(
            MediaStatus::Queued.classify_transition(MediaStatus::Failed),
            Transition::Advance
        );
    }

    #[test]
    fn reapplying_current_status_is_idempotent() {
        use MediaStatus::*;
        for status in [Queued, Processing, Completed, Failed] {
            assert_eq!(status.classify_transition(status), Transition::Idempotent);
        }
    }

    #[test]
    fn terminal_overwrite_is_flagged_not_rejected() {
        assert_eq!(
            MediaStatus::Completed.classify_transition(MediaStatus::Failed),
            Transition::TerminalOverwrite
        );
        assert_eq!(
            MediaStatus::Failed.classify_transition(MediaStatus::Completed),
            Transition::TerminalOverwrite
        );
    }

    #[test]
    fn backward_and_skip_transitions_are_rejected() {
        use MediaStatus::*;
        assert_eq!(Processing.classify_transition(Queued), Transition::Rejected);
        assert_eq!(Completed.classify_transition(Processing), Transition::Rejected);
        assert_eq!(Failed.classify_transition(Queued), Transition::Rejected);
        assert_eq!(Queued.classify_transition(Completed), Transition::Rejected);
    }

    #[test]
    fn terminal_detection() {
        assert!(MediaStatus::Completed.is_terminal());
        assert!(MediaStatus::Failed.is_terminal());
        assert!(!MediaStatus::Queued.is_terminal());
        assert!(!MediaStatus::Processing.is_terminal());
    }
}
