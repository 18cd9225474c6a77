//! SQLite backend for the GameVault order store.
//!
//! Implements the [`crate::traits::OrderStore`] trait on top of a `sqlx` connection pool.
mod sqlite_impl;

pub mod db;

pub use sqlite_impl::SqliteDatabase;
