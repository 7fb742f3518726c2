//! Domain layer: database queries
//!
//! All functions use the generic Executor pattern, allowing them to work
//! with both `&PgPool` (standalone queries) and `&mut PgConnection`
//! (transactions). Ownership authorization is not done here; routes
//! fetch the record, compare owners, then call the mutation, so that
//! "not found" and "not yours" stay distinguishable.

pub mod tweets;
pub mod users;
pub mod videos;
