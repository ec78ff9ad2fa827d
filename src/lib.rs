//! Compound-interest projections with an account-scoped history of saved
//! calculations.
//!
//! - [`core`] -- the pure projection engine
//! - [`history`] -- saved calculations and their storage backends
//! - [`api`] -- the axum HTTP surface and embedded web UI
//! - [`config`] -- layered settings

pub mod api;
pub mod config;
pub mod core;
pub mod history;
