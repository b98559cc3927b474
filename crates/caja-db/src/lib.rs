//! # caja-db: Database Layer for the Caja Backend
//!
//! Owns every SQL statement in the system. The layout follows one
//! repository per aggregate:
//!
//! - [`repository::session`] - cash-session lifecycle, including the
//!   transactional close
//! - [`repository::sale`] / [`repository::expense`] - sale and expense
//!   registration and filtered listings
//! - [`repository::safe`] - the append-only safe ledger
//! - [`repository::report`] - read-side rollups
//! - [`repository::operator`] - operator accounts for authentication
//!
//! [`pool::Database`] is the shared handle; construct it once at startup
//! and hand out repositories from it.

pub mod error;
pub mod filter;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use filter::{DateRange, ExpenseFilter, MovementFilter, SaleFilter, SessionFilter};
pub use pool::{Database, DbConfig};
