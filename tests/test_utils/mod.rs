//! Shared fixtures for integration tests.
//!
//! Provides an in-memory SQLite database with all migrations applied, seed
//! helpers for the rows a webhook delivery touches, and token signing with
//! the test RSA keypair under `tests/fixtures/`.

use anyhow::Result;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::json;
use uuid::Uuid;

use fanout::auth::ServiceClaims;
use fanout::models::{rule, service, service_binding, template, user};

const PRIVATE_PEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/webhook_signing_key.pem"
));

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Signs a webhook token the way the token issuer would.
pub fn sign_webhook_token(service_id: Uuid, validation_key: &str) -> String {
    let key = EncodingKey::from_rsa_pem(PRIVATE_PEM.as_bytes())
        .expect("test signing key should parse");
    let claims = ServiceClaims {
        service_id,
        validation_key: validation_key.to_string(),
    };
    encode(&Header::new(Algorithm::RS256), &claims, &key).expect("token should sign")
}

/// Inserts a user row and returns its id.
pub async fn seed_user(db: &DatabaseConnection, name: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Inserts a service row carrying the given validation key.
pub async fn seed_service(
    db: &DatabaseConnection,
    service_type: &str,
    validation_key: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    service::ActiveModel {
        id: Set(id),
        name: Set(format!("{service_type} service")),
        service_type: Set(service_type.to_string()),
        data: Set(json!({"validation_key": validation_key})),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Binds a user to a service under their provider-side username.
pub async fn seed_binding(
    db: &DatabaseConnection,
    user_id: Uuid,
    service_id: Uuid,
    service_username: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    service_binding::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        service_id: Set(service_id),
        service_username: Set(service_username.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Inserts a template rendered by the given engine.
pub async fn seed_template(
    db: &DatabaseConnection,
    title: &str,
    render_engine: &str,
    content: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    template::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        content: Set(content.to_string()),
        render_engine: Set(render_engine.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Inserts an active subscription rule for the given trigger.
pub async fn seed_rule(
    db: &DatabaseConnection,
    user_id: Uuid,
    in_service_id: Uuid,
    out_service_id: Uuid,
    out_template_id: Uuid,
    trigger: &str,
    priority_order: i32,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    rule::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        trigger: Set(trigger.to_string()),
        in_service_id: Set(in_service_id),
        out_service_id: Set(out_service_id),
        out_template_id: Set(out_template_id),
        priority_order: Set(priority_order),
        fired_count: Set(0),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(id)
}
