//! Clip maker core.
//!
//! Request handling runs through two short-circuiting gates before any content
//! is shown:
//!
//! 1. **Identity Gate**: the user token carried in the request headers is
//!    verified against the platform and resolved to a user id.
//! 2. **Entitlement Gate**: the platform decides whether that user may open the
//!    requested experience.
//!
//! Only a request that passes both gates reaches the clip request form, whose
//! state machine ([`FormState`]) tracks a video URL and a clip count and
//! gates a single simulated submission.

#![deny(unsafe_code)]

pub mod error;
pub mod form;
pub mod gate;
pub mod links;
pub mod mocks;
pub mod platform;
pub mod submission;
pub mod types;

pub use error::{FormError, GateError, IdentityError, PlatformError};
pub use form::{
    parse_leading_integer, FormEvent, FormPhase, FormState, UrlPolicy, CUSTOM_COUNT_MAX_HINT,
    PRESET_CLIP_COUNTS, VIDEO_PLATFORM_HOSTS,
};
pub use gate::{ExperienceGate, GateOutcome, IdentityOutcome, Viewer};
pub use links::LinkTemplates;
pub use mocks::MockPlatform;
pub use platform::{AccessChecker, Directory, IdentityVerifier};
pub use submission::{
    run_submission, ClipRequest, ClipSubmitter, SimulatedSubmitter, SubmissionReceipt,
    DEFAULT_SUBMIT_DELAY,
};
pub use types::{
    AccessDecision, AccessLevel, ExperienceProfile, RequestHeaders, Session, UserProfile,
    VerifiedIdentity,
};
