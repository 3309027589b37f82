//! # Service Binding Repository
//!
//! Data access for the links between platform users and external services.
//! The resolver uses these rows to translate service-side usernames into
//! platform user ids when deciding who a rule can fire for.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::service_binding::{Column, Entity as ServiceBinding, Model};

/// Repository for ServiceBinding database operations
pub struct BindingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BindingRepository<'a> {
    /// Create a new BindingRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List all bindings for a service that carry a non-empty service username
    ///
    /// An empty `service_username` means the user never linked an identity on
    /// that service, so the row cannot match any webhook participant and is
    /// skipped here.
    pub async fn bound_for_service(&self, service_id: Uuid) -> Result<Vec<Model>, DbErr> {
        ServiceBinding::find()
            .filter(Column::ServiceId.eq(service_id))
            .filter(Column::ServiceUsername.ne(""))
            .all(self.db)
            .await
    }
}
