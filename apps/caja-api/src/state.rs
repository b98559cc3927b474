//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use caja_db::Database;

use crate::auth::JwtManager;

/// State shared by every handler. Cloning is cheap; the database pool and
/// the JWT manager are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,

    pub jwt: Arc<JwtManager>,

    /// Serializes safe-ledger writes across the process. The repository
    /// transaction protects the chain against a crash mid-write; this lock
    /// protects it against two concurrent registrations reading the same
    /// prior balance.
    pub ledger_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
            ledger_lock: Arc::new(Mutex::new(())),
        }
    }
}
