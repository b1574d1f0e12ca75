use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{IdentityError, PlatformError};
use crate::platform::{AccessChecker, Directory, IdentityVerifier};
use crate::types::{AccessDecision, AccessLevel, ExperienceProfile, UserProfile, VerifiedIdentity};

/// In-memory platform for tests.
///
/// Knows a fixed set of tokens, users, experiences and grants, can be told to
/// fail, and counts calls so tests can assert that gates short-circuit and
/// that access is never served from a cache.
#[derive(Debug, Default)]
pub struct MockPlatform {
    tokens: HashMap<String, String>,
    users: HashMap<String, UserProfile>,
    experiences: HashMap<String, ExperienceProfile>,
    grants: HashMap<(String, String), AccessLevel>,
    fail_verification: bool,
    fail_access_checks: bool,
    verify_calls: AtomicUsize,
    access_calls: AtomicUsize,
    directory_calls: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user reachable through `token`.
    pub fn with_user(mut self, token: impl Into<String>, user: UserProfile) -> Self {
        self.tokens.insert(token.into(), user.id.clone());
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn with_experience(mut self, experience: ExperienceProfile) -> Self {
        self.experiences.insert(experience.id.clone(), experience);
        self
    }

    pub fn grant(
        mut self,
        user_id: impl Into<String>,
        experience_id: impl Into<String>,
        level: AccessLevel,
    ) -> Self {
        self.grants
            .insert((user_id.into(), experience_id.into()), level);
        self
    }

    pub fn failing_verification(mut self) -> Self {
        self.fail_verification = true;
        self
    }

    pub fn failing_access_checks(mut self) -> Self {
        self.fail_access_checks = true;
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }

    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for MockPlatform {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn verify_user_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verification {
            return Err(IdentityError::Upstream("mock verification outage".into()));
        }
        self.tokens
            .get(token)
            .map(|user_id| VerifiedIdentity {
                user_id: user_id.clone(),
            })
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".into()))
    }
}

#[async_trait]
impl AccessChecker for MockPlatform {
    async fn check_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, PlatformError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_access_checks {
            return Err(PlatformError::Upstream("mock access outage".into()));
        }
        Ok(self
            .grants
            .get(&(user_id.to_string(), experience_id.to_string()))
            .map(|level| AccessDecision::granted(*level))
            .unwrap_or_else(AccessDecision::denied))
    }
}

#[async_trait]
impl Directory for MockPlatform {
    async fn get_user(&self, user_id: &str) -> Result<UserProfile, PlatformError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| PlatformError::user_not_found(user_id))
    }

    async fn get_experience(
        &self,
        experience_id: &str,
    ) -> Result<ExperienceProfile, PlatformError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.experiences
            .get(experience_id)
            .cloned()
            .ok_or_else(|| PlatformError::experience_not_found(experience_id))
    }
}
