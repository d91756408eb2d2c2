//! Error types for the rating engine
//!
//! This module defines the error taxonomy shared by the rating store, the
//! match orchestrator and configuration validation.

use crate::types::CompetitorId;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EloSimError>;

/// Custom error types for specific rating engine scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EloSimError {
    #[error("Competitor not found: {competitor_id}")]
    NotFound { competitor_id: CompetitorId },

    #[error("Insufficient population for pairing: {population} competitor(s)")]
    InsufficientPopulation { population: usize },

    #[error("Competitor {competitor_id} cannot be paired against itself")]
    SelfPairing { competitor_id: CompetitorId },

    #[error("Backing store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EloSimError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            EloSimError::NotFound { .. } => "not_found",
            EloSimError::InsufficientPopulation { .. } => "insufficient_population",
            EloSimError::SelfPairing { .. } => "self_pairing",
            EloSimError::StoreUnavailable { .. } => "store_unavailable",
            EloSimError::InvalidConfig { .. } => "invalid_config",
            EloSimError::Internal { .. } => "internal",
        }
    }

    /// Whether the orchestrator may skip the match and keep simulating
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EloSimError::NotFound { .. }
                | EloSimError::SelfPairing { .. }
                | EloSimError::StoreUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EloSimError::NotFound { competitor_id: 7 }.kind(), "not_found");
        assert_eq!(
            EloSimError::InvalidConfig {
                message: "bad".to_string()
            }
            .kind(),
            "invalid_config"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(EloSimError::SelfPairing { competitor_id: 1 }.is_recoverable());
        assert!(EloSimError::StoreUnavailable {
            message: "down".to_string()
        }
        .is_recoverable());
        assert!(!EloSimError::InsufficientPopulation { population: 1 }.is_recoverable());
        assert!(!EloSimError::InvalidConfig {
            message: "bad".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = EloSimError::NotFound { competitor_id: 42 };
        assert_eq!(err.to_string(), "Competitor not found: 42");
    }
}
