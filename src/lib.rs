//! SCIM PATCH parsing, schema path resolution and request authorization.
//!
//! - [`scim`]: turns SCIM PATCH operations into validated [`scim::PatchOperation`]s
//!   and resolves SCIM attribute paths to storage paths inside a
//!   [`scim::SchemaTree`].
//! - [`auth`]: derives authentication attributes from an `Authorization`
//!   header (Bearer or Basic) and asks a [`auth::TenantAuthorizer`] for the
//!   tenant.
//! - [`middleware`]: axum middleware running requests through the gate.
//! - [`config`]: TOML configuration with `${VAR}` expansion.

pub mod auth;
pub mod config;
pub mod middleware;
#[cfg(feature = "server")]
pub mod observability;
pub mod scim;

#[cfg(test)]
mod tests;
