//! # Data Models
//!
//! This module contains all the data models used throughout the Fanout API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod incoming_log;
pub mod notification;
pub mod rule;
pub mod service;
pub mod service_binding;
pub mod template;
pub mod tracked_entity;
pub mod user;

pub use incoming_log::Entity as IncomingLog;
pub use notification::Entity as Notification;
pub use rule::Entity as Rule;
pub use service::Entity as Service;
pub use service_binding::Entity as ServiceBinding;
pub use template::Entity as Template;
pub use tracked_entity::Entity as TrackedEntity;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "fanout".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
