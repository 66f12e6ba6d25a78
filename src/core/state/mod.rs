//! core::state
//!
//! Durable workspace state: trunk plus managed branch records, one file per
//! repository.
//!
//! - [`schema`] - JSON record and conversion to/from [`StackModel`](crate::core::stack::StackModel)
//! - [`store`] - [`StateStore`] load/save with atomic replacement

pub mod schema;
pub mod store;

pub use schema::StateRecord;
pub use store::{StateError, StateStore};
