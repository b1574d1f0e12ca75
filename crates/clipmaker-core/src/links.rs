use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

pub const EXPERIENCE_PLACEHOLDER: &str = "{experience_id}";
pub const APP_PLACEHOLDER: &str = "{app_id}";
pub const COMPANY_PLACEHOLDER: &str = "{company_id}";

/// Outbound link templates.
///
/// Substituted values are percent-encoded, so identifiers made only of
/// unreserved characters (the platform's `exp_...` / `app_...` ids) appear in
/// the link verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkTemplates {
    pub checkout_url_template: String,
    pub install_url_template: String,
    pub dashboard_url_template: String,
}

impl Default for LinkTemplates {
    fn default() -> Self {
        Self {
            checkout_url_template: "https://whop.com/checkout?experienceId={experience_id}"
                .to_string(),
            install_url_template: "https://whop.com/apps/{app_id}/install".to_string(),
            dashboard_url_template: "https://whop.com/dashboard/{company_id}".to_string(),
        }
    }
}

impl LinkTemplates {
    /// Purchase link shown on the "Access Denied" view.
    pub fn checkout_url(&self, experience_id: &str) -> String {
        fill(&self.checkout_url_template, EXPERIENCE_PLACEHOLDER, experience_id)
    }

    /// App install link shown on the landing page.
    pub fn install_url(&self, app_id: &str) -> String {
        fill(&self.install_url_template, APP_PLACEHOLDER, app_id)
    }

    /// Creator dashboard link shown on the landing page.
    pub fn dashboard_url(&self, company_id: &str) -> String {
        fill(&self.dashboard_url_template, COMPANY_PLACEHOLDER, company_id)
    }
}

/// Values are form-urlencoded, so a space becomes `+` and reserved characters
/// become `%XX`. Only ASCII letters, digits and `*-._` pass through unchanged.
fn fill(template: &str, placeholder: &str, value: &str) -> String {
    let encoded: String = byte_serialize(value.as_bytes()).collect();
    template.replace(placeholder, &encoded)
}
