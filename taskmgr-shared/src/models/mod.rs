//! Domain models for TaskMgr
//!
//! # Models
//!
//! - `user`: User accounts, their public projections and profile changes
//! - `task`: Owner-scoped tasks with status and priority
//!
//! Each model also carries its PostgreSQL queries; the [`crate::store`]
//! module wraps them behind storage traits.

pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a nullable field so that `null` and "absent" differ
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
