//! Identity and entitlement gates.
//!
//! A request flows through the gates in order and stops at the first one that
//! fails:
//!
//! 1. **Identity**: the user token header is verified by the platform.
//! 2. **Entitlement**: the platform decides whether the user may open the
//!    experience. A `false` decision yields [`GateOutcome::AccessDenied`].
//! 3. **Display attributes**: user and experience profiles are fetched for
//!    the page header.
//!
//! Any error raised along the way, from a bad token to a failed lookup after
//! verification, yields [`GateOutcome::AuthenticationRequired`]. Nothing is
//! retried and nothing is cached between requests.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GateError, IdentityError, PlatformError};
use crate::links::LinkTemplates;
use crate::platform::{AccessChecker, Directory, IdentityVerifier};
use crate::types::{AccessDecision, ExperienceProfile, RequestHeaders, Session, UserProfile};

/// Everything the content view needs about who is looking at what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub session: Session,
    pub user: UserProfile,
    pub experience: ExperienceProfile,
    pub access: AccessDecision,
}

/// Result of the full experience pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Identity could not be established, or a lookup failed.
    AuthenticationRequired { reason: String },
    /// Identity is fine but the user has no access to the experience.
    AccessDenied {
        experience_id: String,
        checkout_url: String,
    },
    /// Both gates passed.
    Granted(Box<Viewer>),
}

impl GateOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, GateOutcome::Granted(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateOutcome::AuthenticationRequired { .. } => "authentication_required",
            GateOutcome::AccessDenied { .. } => "access_denied",
            GateOutcome::Granted(_) => "granted",
        }
    }
}

/// Result of the identity-only pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    AuthenticationRequired { reason: String },
    Authenticated { session: Session, user: UserProfile },
}

/// Runs the identity and entitlement gates against the platform.
#[derive(Clone)]
pub struct ExperienceGate {
    token_header: String,
    identity: Arc<dyn IdentityVerifier>,
    access: Arc<dyn AccessChecker>,
    directory: Arc<dyn Directory>,
    links: LinkTemplates,
}

impl ExperienceGate {
    pub fn new(
        token_header: impl Into<String>,
        identity: Arc<dyn IdentityVerifier>,
        access: Arc<dyn AccessChecker>,
        directory: Arc<dyn Directory>,
        links: LinkTemplates,
    ) -> Self {
        Self {
            token_header: token_header.into(),
            identity,
            access,
            directory,
            links,
        }
    }

    /// Build a gate whose three collaborators are the same platform client.
    pub fn from_platform<P>(
        token_header: impl Into<String>,
        platform: Arc<P>,
        links: LinkTemplates,
    ) -> Self
    where
        P: IdentityVerifier + AccessChecker + Directory + 'static,
    {
        Self::new(
            token_header,
            platform.clone(),
            platform.clone(),
            platform,
            links,
        )
    }

    pub fn token_header(&self) -> &str {
        &self.token_header
    }

    pub fn links(&self) -> &LinkTemplates {
        &self.links
    }

    pub fn identity_backend(&self) -> &'static str {
        self.identity.backend()
    }

    /// Identity Gate: headers -> session.
    pub async fn verify_session(
        &self,
        headers: &RequestHeaders,
    ) -> Result<Session, IdentityError> {
        let token = headers
            .get(&self.token_header)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| IdentityError::MissingToken(self.token_header.clone()))?;

        let identity = self.identity.verify_user_token(token).await?;
        debug!(user_id = %identity.user_id, "user token verified");

        Ok(Session {
            token: token.to_string(),
            user_id: identity.user_id,
        })
    }

    /// Entitlement Gate: (session, experience) -> decision. Always asks the platform.
    pub async fn check_entitlement(
        &self,
        session: &Session,
        experience_id: &str,
    ) -> Result<AccessDecision, PlatformError> {
        self.access
            .check_access(&session.user_id, experience_id)
            .await
    }

    /// Run both gates for `experience_id` and fetch display attributes.
    pub async fn admit(&self, headers: &RequestHeaders, experience_id: &str) -> GateOutcome {
        match self.try_admit(headers, experience_id).await {
            Ok(outcome) => {
                match &outcome {
                    GateOutcome::AccessDenied { .. } => {
                        info!(experience_id, "access denied; offering checkout")
                    }
                    GateOutcome::Granted(viewer) => {
                        info!(
                            experience_id,
                            user_id = %viewer.session.user_id,
                            "access granted"
                        )
                    }
                    GateOutcome::AuthenticationRequired { .. } => {}
                }
                outcome
            }
            Err(err) => {
                warn!(experience_id, error = %err, "experience gate failed");
                GateOutcome::AuthenticationRequired {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn try_admit(
        &self,
        headers: &RequestHeaders,
        experience_id: &str,
    ) -> Result<GateOutcome, GateError> {
        let session = self.verify_session(headers).await?;
        let access = self.check_entitlement(&session, experience_id).await?;

        if !access.has_access {
            return Ok(GateOutcome::AccessDenied {
                experience_id: experience_id.to_string(),
                checkout_url: self.links.checkout_url(experience_id),
            });
        }

        let user = self.directory.get_user(&session.user_id).await?;
        let experience = self.directory.get_experience(experience_id).await?;

        Ok(GateOutcome::Granted(Box::new(Viewer {
            session,
            user,
            experience,
            access,
        })))
    }

    /// Identity Gate plus the user's profile, with no experience involved.
    pub async fn authenticate(&self, headers: &RequestHeaders) -> IdentityOutcome {
        match self.try_authenticate(headers).await {
            Ok((session, user)) => IdentityOutcome::Authenticated { session, user },
            Err(err) => {
                warn!(error = %err, "identity gate failed");
                IdentityOutcome::AuthenticationRequired {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn try_authenticate(
        &self,
        headers: &RequestHeaders,
    ) -> Result<(Session, UserProfile), GateError> {
        let session = self.verify_session(headers).await?;
        let user = self.directory.get_user(&session.user_id).await?;
        Ok((session, user))
    }
}
