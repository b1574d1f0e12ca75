//! Platform adapters for the clip maker.
//!
//! - [`HttpPlatformClient`] talks to the platform API over HTTPS.
//! - [`StaticPlatform`] answers from configured fixtures, for offline
//!   development and for service tests.

#![deny(unsafe_code)]

pub mod fixtures;
pub mod http;

pub use fixtures::{FixtureUser, PlatformFixtures, StaticPlatform};
pub use http::{HttpPlatformClient, HttpPlatformConfig};
