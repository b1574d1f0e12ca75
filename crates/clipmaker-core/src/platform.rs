//! Boundary traits for the identity/entitlement platform.
//!
//! The service never talks to the platform directly; it goes through these
//! traits so the HTTP client, the offline fixture platform and the test mocks
//! are interchangeable.

use async_trait::async_trait;

use crate::error::{IdentityError, PlatformError};
use crate::types::{AccessDecision, ExperienceProfile, UserProfile, VerifiedIdentity};

/// Resolves a user token to a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Short backend name used in logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn verify_user_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Answers whether a user may open an experience.
#[async_trait]
pub trait AccessChecker: Send + Sync {
    async fn check_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, PlatformError>;
}

/// Display attributes for users and experiences.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<UserProfile, PlatformError>;

    async fn get_experience(&self, experience_id: &str)
        -> Result<ExperienceProfile, PlatformError>;
}
