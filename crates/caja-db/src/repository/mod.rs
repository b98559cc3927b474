//! Repository implementations, one per aggregate.

pub mod expense;
pub mod operator;
pub mod report;
pub mod safe;
pub mod sale;
pub mod session;

pub use expense::{ExpenseRepository, NewExpense};
pub use operator::{OperatorRecord, OperatorRepository};
pub use report::ReportRepository;
pub use safe::{NewMovement, SafeRepository};
pub use sale::{NewSale, SaleRepository};
pub use session::SessionRepository;
