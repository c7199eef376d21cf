//! App identity: identifiers, redacted secrets, credentials, and tenant tokens.

pub mod credentials;
pub mod id;
pub mod secret;

pub use credentials::*;
pub use id::*;
pub use secret::*;
