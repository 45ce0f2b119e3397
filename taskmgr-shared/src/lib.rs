//! # TaskMgr Shared Library
//!
//! This crate contains the domain types, persistence adapters and business
//! logic used by the TaskMgr API server.
//!
//! ## Module Organization
//!
//! - `models`: User and task records plus their input/patch types
//! - `validation`: Field-level rules shared by registration, profile and task operations
//! - `auth`: Password hashing, session tokens, request guard helpers and ownership checks
//! - `store`: Storage traits with PostgreSQL and in-memory implementations
//! - `db`: PostgreSQL pool management and embedded migrations
//! - `services`: Authentication and ownership-scoped task services
//! - `error`: The service-level error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

/// Current version of the TaskMgr shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
