//! Bootstrap tool: creates the first admin operator.
//!
//! ```text
//! CAJA_DATABASE_PATH=caja.db caja-seed "Nombre" admin@example.com contraseña
//! ```
//!
//! Every other operator can then be created through the API by that admin.

use tracing::info;
use tracing_subscriber::EnvFilter;

use caja_api::auth::hash_password;
use caja_api::config::ApiConfig;
use caja_core::OperatorRole;
use caja_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (name, email, password) = match (args.next(), args.next(), args.next()) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => {
            eprintln!("usage: caja-seed <name> <email> <password>");
            std::process::exit(2);
        }
    };

    let config = ApiConfig::load()?;
    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let hash = hash_password(&password)?;
    let operator = db
        .operators()
        .create(&name, &email, &hash, OperatorRole::Admin)
        .await?;

    info!(
        operator_id = operator.id,
        email = %operator.email,
        "admin operator created"
    );

    db.close().await;
    Ok(())
}
