mod credentials;
mod error;
mod gate;
mod token;

pub use credentials::{AuthStrategy, Credentials};
pub use error::AuthError;
pub use gate::{RequestAuthorizationGate, Tenant, TenantAuthorizer};
#[cfg(feature = "jwt")]
pub use token::JwtDecoder;
pub use token::TokenDecoder;
