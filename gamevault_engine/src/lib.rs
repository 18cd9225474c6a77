//! GameVault Order Engine
//!
//! GameVault is a storefront for digital game accounts. Payments are manual: the customer
//! transfers money over QRIS, a bank virtual account or an e-wallet, reports that they have paid,
//! and an administrator verifies the transfer and delivers the account credentials over WhatsApp.
//! This library contains the core logic for that flow. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend behind the `sqlite` feature). The
//!    [`traits::OrderStore`] trait is the contract the engine requires: fetches plus a
//!    conditional, compare-and-set style update. You should never need to touch the database
//!    directly; use the engine API. The exception is the data types, which live in
//!    [`mod@db_types`] and are public.
//! 2. The engine public API ([`OrderFlowApi`]). This drives orders through their lifecycle,
//!    enforces the payment window both lazily (on read) and eagerly (via [`mod@sweeper`]), and
//!    fires each lifecycle notification exactly once.
//! 3. Notification dispatch ([`mod@notify`]). Outbound WhatsApp messages are a best-effort side
//!    effect of committed state changes; a failed send is logged and never rolls anything back.
pub mod config;
pub mod db_types;
mod gve_api;
pub mod helpers;
pub mod notify;
#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
pub mod sweeper;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use gve_api::{
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_objects::{CheckoutRequest, SweepResult},
};
