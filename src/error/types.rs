// src/error/types.rs
use crate::domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A strategy's underlying lookup failed. Aborts only the current source.
    #[error("strategy {strategy} failed: {source}")]
    Strategy {
        strategy: String,
        #[source]
        source: Box<AppError>,
    },

    /// Every strategy in the chain declined.
    #[error("no target found for {0}")]
    NoTargetFound(String),

    /// Cooperative cancellation observed on the run token.
    #[error("operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// Wrap an error with the name of the strategy that produced it.
    pub fn strategy(strategy: impl Into<String>, source: AppError) -> Self {
        AppError::Strategy {
            strategy: strategy.into(),
            source: Box::new(source),
        }
    }

    /// True when this error, or any strategy error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            AppError::Cancelled => true,
            AppError::Strategy { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_detected_through_strategy_wrapper() {
        let err = AppError::strategy("api_search", AppError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "strategy api_search failed: operation cancelled");
    }

    #[test]
    fn test_plain_failures_are_not_cancellation() {
        let err = AppError::strategy("offline_db", AppError::ExternalService("503".to_string()));
        assert!(!err.is_cancelled());
        assert!(!AppError::NoTargetFound("Monster".to_string()).is_cancelled());
    }
}
