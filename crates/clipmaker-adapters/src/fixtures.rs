use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use clipmaker_core::error::{IdentityError, PlatformError};
use clipmaker_core::platform::{AccessChecker, Directory, IdentityVerifier};
use clipmaker_core::types::{
    AccessDecision, AccessLevel, ExperienceProfile, UserProfile, VerifiedIdentity,
};
use serde::{Deserialize, Serialize};

/// A user known to the offline platform, reachable through `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureUser {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    /// experience id -> access level
    #[serde(default)]
    pub access: BTreeMap<String, AccessLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFixtures {
    #[serde(default)]
    pub users: Vec<FixtureUser>,
    #[serde(default)]
    pub experiences: Vec<ExperienceProfile>,
}

impl PlatformFixtures {
    /// Small fixture set for running the service without a platform account.
    pub fn demo() -> Self {
        Self {
            users: vec![
                FixtureUser {
                    token: "demo-member-token".into(),
                    id: "user_demo_member".into(),
                    name: Some("Demo Member".into()),
                    username: "demo_member".into(),
                    access: BTreeMap::from([("exp_demo".to_string(), AccessLevel::Customer)]),
                },
                FixtureUser {
                    token: "demo-visitor-token".into(),
                    id: "user_demo_visitor".into(),
                    name: Some("Demo Visitor".into()),
                    username: "demo_visitor".into(),
                    access: BTreeMap::new(),
                },
            ],
            experiences: vec![ExperienceProfile {
                id: "exp_demo".into(),
                name: "Demo Clip Studio".into(),
            }],
        }
    }
}

/// Platform answered entirely from fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    tokens: HashMap<String, String>,
    users: HashMap<String, FixtureUser>,
    experiences: HashMap<String, ExperienceProfile>,
}

impl StaticPlatform {
    pub fn new(fixtures: PlatformFixtures) -> Self {
        let mut platform = Self::default();
        for user in fixtures.users {
            platform.tokens.insert(user.token.clone(), user.id.clone());
            platform.users.insert(user.id.clone(), user);
        }
        for experience in fixtures.experiences {
            platform
                .experiences
                .insert(experience.id.clone(), experience);
        }
        platform
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl IdentityVerifier for StaticPlatform {
    fn backend(&self) -> &'static str {
        "static"
    }

    async fn verify_user_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.tokens
            .get(token)
            .map(|user_id| VerifiedIdentity {
                user_id: user_id.clone(),
            })
            .ok_or_else(|| IdentityError::InvalidToken("token not in fixtures".into()))
    }
}

#[async_trait]
impl AccessChecker for StaticPlatform {
    async fn check_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, PlatformError> {
        let level = self
            .users
            .get(user_id)
            .ok_or_else(|| PlatformError::user_not_found(user_id))?
            .access
            .get(experience_id)
            .copied()
            .unwrap_or(AccessLevel::NoAccess);

        Ok(match level {
            AccessLevel::NoAccess => AccessDecision::denied(),
            level => AccessDecision::granted(level),
        })
    }
}

#[async_trait]
impl Directory for StaticPlatform {
    async fn get_user(&self, user_id: &str) -> Result<UserProfile, PlatformError> {
        self.users
            .get(user_id)
            .map(|user| UserProfile {
                id: user.id.clone(),
                name: user.name.clone(),
                username: user.username.clone(),
            })
            .ok_or_else(|| PlatformError::user_not_found(user_id))
    }

    async fn get_experience(
        &self,
        experience_id: &str,
    ) -> Result<ExperienceProfile, PlatformError> {
        self.experiences
            .get(experience_id)
            .cloned()
            .ok_or_else(|| PlatformError::experience_not_found(experience_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_fixtures_grant_member_and_deny_visitor() {
        let platform = StaticPlatform::new(PlatformFixtures::demo());

        let member = platform
            .verify_user_token("demo-member-token")
            .await
            .unwrap();
        assert!(platform
            .check_access(&member.user_id, "exp_demo")
            .await
            .unwrap()
            .has_access);

        let visitor = platform
            .verify_user_token("demo-visitor-token")
            .await
            .unwrap();
        let decision = platform
            .check_access(&visitor.user_id, "exp_demo")
            .await
            .unwrap();
        assert!(!decision.has_access);
        assert_eq!(decision.access_level, AccessLevel::NoAccess);
    }

    #[tokio::test]
    async fn unknown_token_and_ids_are_errors() {
        let platform = StaticPlatform::new(PlatformFixtures::demo());
        assert!(matches!(
            platform.verify_user_token("nope").await,
            Err(IdentityError::InvalidToken(_))
        ));
        assert!(platform.get_user("user_ghost").await.is_err());
        assert!(platform.get_experience("exp_ghost").await.is_err());
    }

    #[test]
    fn fixtures_deserialize_from_config_shape() {
        let fixtures: PlatformFixtures = serde_json::from_value(serde_json::json!({
            "users": [{
                "token": "t",
                "id": "user_1",
                "username": "one",
                "access": { "exp_1": "admin" }
            }],
            "experiences": [{ "id": "exp_1", "name": "One" }]
        }))
        .unwrap();

        assert_eq!(fixtures.users[0].name, None);
        assert_eq!(
            fixtures.users[0].access.get("exp_1"),
            Some(&AccessLevel::Admin)
        );
        assert_eq!(StaticPlatform::new(fixtures).user_count(), 1);
    }

    #[test]
    fn access_decision_defaults_level_when_platform_omits_it() {
        let decision: AccessDecision =
            serde_json::from_value(serde_json::json!({ "has_access": true })).unwrap();
        assert!(decision.has_access);
        assert_eq!(decision.access_level, AccessLevel::NoAccess);
    }
}
