//! Social provider seam.
//!
//! Verifies third-party credentials (OAuth tokens, platform tickets) and
//! resolves them to the provider's account id. The concrete HTTP clients live
//! outside this crate.

use async_trait::async_trait;

use arena_core::protocol::AuthProvider;
use arena_core::{ArenaError, Result};

#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Returns the provider-side account id for a valid token.
    async fn verify(&self, provider: AuthProvider, token: &str) -> Result<String>;
}

/// Default client when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSocial;

#[async_trait]
impl SocialClient for UnconfiguredSocial {
    async fn verify(&self, provider: AuthProvider, _token: &str) -> Result<String> {
        Err(ArenaError::ProviderUnavailable(provider.as_str().to_string()))
    }
}
