//! Session token issuance.
//!
//! Tokens are opaque: issued once at registration, never verified, rotated
//! or revoked here.

use uuid::Uuid;

/// Generate a new process-wide unique token.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}
