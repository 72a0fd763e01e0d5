//! Infrastructure layer: stores (in-memory + Postgres), application services,
//! the batch coordinator and configuration.

pub mod batch_executor;
pub mod catalog_store;
pub mod config;
pub mod error;
pub mod ledger_store;
pub mod postgres;
pub mod revision_store;
pub mod services;

#[cfg(test)]
mod integration_tests;

pub use batch_executor::BatchExecutor;
pub use error::{ServiceError, StoreError};
