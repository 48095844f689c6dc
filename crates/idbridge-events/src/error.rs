//! Error types for the idbridge-events crate.

use thiserror::Error;

/// Errors that can occur while configuring or running the bus consumer.
#[derive(Debug, Error)]
pub enum EventError {
    // Configuration errors (permanent)
    /// Required configuration variable is missing.
    #[error("Configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("Configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    // Connection errors (fatal to the consumer loop)
    /// Failed to create a consumer against the configured brokers.
    #[error("Connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    /// Failed to open the subscription on a topic.
    #[error("Failed to subscribe to topic {topic}: {cause}")]
    SubscribeFailed { topic: String, cause: String },

    /// Broker metadata could not be fetched within the timeout.
    #[error("Broker metadata fetch failed: {cause}")]
    MetadataFailed { cause: String },

    /// Internal Kafka client error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl EventError {
    /// Returns true if this error terminates the consumer loop.
    ///
    /// Connection and subscription failures are fatal; there is no
    /// reconnect loop around subscription establishment.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. }
                | EventError::SubscribeFailed { .. }
                | EventError::MetadataFailed { .. }
        )
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EventError::ConfigMissing { .. } | EventError::ConfigInvalid { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_is_fatal() {
        let err = EventError::ConnectionFailed {
            broker: "localhost:9092".to_string(),
            cause: "all brokers down".to_string(),
        };
        assert!(err.is_fatal());

        let err = EventError::ConfigMissing {
            var: "KAFKA_SASL_USERNAME".to_string(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_is_config_error() {
        let config_err = EventError::ConfigInvalid {
            var: "KAFKA_SECURITY_PROTOCOL".to_string(),
            reason: "Unknown protocol: QUIC".to_string(),
        };
        assert!(config_err.is_config_error());

        let other = EventError::SubscribeFailed {
            topic: "user.created".to_string(),
            cause: "unknown topic".to_string(),
        };
        assert!(!other.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = EventError::SubscribeFailed {
            topic: "user.created".to_string(),
            cause: "broker unreachable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to subscribe to topic user.created: broker unreachable"
        );
    }
}
