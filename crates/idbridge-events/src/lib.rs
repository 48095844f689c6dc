//! # idbridge-events
//!
//! Kafka plumbing for the idbridge provisioning worker.
//!
//! Provides the consumer side of the event bus: connection configuration,
//! a raw-string topic consumer with per-message failure isolation, and a
//! broker health check used at startup.
//!
//! ## Design notes
//!
//! Message values on the provisioning topic are bare UTF-8 identifiers, not
//! JSON envelopes, so the consumer hands each decoded value to an
//! [`EventHandler`] together with its bus coordinates. A handler failure is
//! logged and absorbed; the loop always advances to the next message.

pub mod config;
pub mod consumer;
pub mod error;

pub use config::{KafkaConfig, KafkaConfigBuilder};
pub use consumer::{EventConsumer, EventHandler, HealthStatus, InboundEvent};
pub use error::EventError;
