//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for the webhook processing pipeline.

pub mod binding;
pub mod incoming_log;
pub mod notification;
pub mod rule;
pub mod service;
pub mod tracked_entity;

pub use binding::BindingRepository;
pub use incoming_log::IncomingLogRepository;
pub use notification::NotificationRepository;
pub use rule::{RuleRepository, TriggerScope};
pub use service::ServiceRepository;
pub use tracked_entity::TrackedEntityRepository;
