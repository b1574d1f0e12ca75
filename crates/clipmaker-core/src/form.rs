//! Clip request form state.
//!
//! The form tracks two inputs, a video URL and a clip count, and derives a
//! single readiness flag from them. The clip count has two mutually exclusive
//! sources: a preset shortcut and free-form custom text. Choosing either one
//! clears the other, so at most one of them is authoritative at any time.
//!
//! Phases:
//!
//! ```text
//!   Idle --begin_submission (ready)--> Loading --finish_submission--> Idle
//! ```
//!
//! There is no cancellation edge. Inputs stay editable while Loading.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FormError;
use crate::submission::ClipRequest;

/// Clip-count shortcuts offered next to the custom field.
pub const PRESET_CLIP_COUNTS: [u32; 3] = [3, 5, 10];

/// Upper bound advertised on the custom field. Rendered as an input hint only.
pub const CUSTOM_COUNT_MAX_HINT: u32 = 50;

/// Host substrings accepted by [`UrlPolicy::VideoPlatform`].
pub const VIDEO_PLATFORM_HOSTS: [&str; 4] = ["youtube.com", "youtu.be", "vimeo.com", "twitch.tv"];

/// Which URLs count as valid video links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UrlPolicy {
    /// Any syntactically valid absolute URL.
    #[default]
    Permissive,
    /// A valid URL whose host contains one of [`VIDEO_PLATFORM_HOSTS`].
    VideoPlatform,
}

impl UrlPolicy {
    pub fn accepts(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        match self {
            UrlPolicy::Permissive => true,
            UrlPolicy::VideoPlatform => url
                .host_str()
                .map(|host| {
                    let host = host.to_ascii_lowercase();
                    VIDEO_PLATFORM_HOSTS
                        .iter()
                        .any(|allowed| host.contains(allowed))
                })
                .unwrap_or(false),
        }
    }

    /// Inline hint shown under a non-empty URL field that fails the policy.
    pub fn invalid_hint(&self) -> &'static str {
        match self {
            UrlPolicy::Permissive => "Please enter a valid URL",
            UrlPolicy::VideoPlatform => "Please enter a valid YouTube, Vimeo, or Twitch URL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlPolicy::Permissive => "permissive",
            UrlPolicy::VideoPlatform => "video-platform",
        }
    }
}

/// Parse the integer prefix of `raw`.
///
/// Leading whitespace and a single sign are accepted, digits are consumed up
/// to the first non-digit and anything after is ignored: `" 7 clips"` is 7,
/// `"2.5"` is 2, `"abc"` has no value. Out-of-range values saturate.
pub fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0_i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Submission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Loading,
}

/// One user interaction with the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SetVideoUrl(String),
    SelectPreset(u32),
    SetCustomCount(String),
}

/// In-memory state of the clip request form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    policy: UrlPolicy,
    video_url: String,
    custom_count: String,
    selected_preset: Option<u32>,
    phase: FormPhase,
}

impl FormState {
    pub fn new(policy: UrlPolicy) -> Self {
        Self {
            policy,
            video_url: String::new(),
            custom_count: String::new(),
            selected_preset: None,
            phase: FormPhase::Idle,
        }
    }

    pub fn policy(&self) -> UrlPolicy {
        self.policy
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn custom_count(&self) -> &str {
        &self.custom_count
    }

    pub fn selected_preset(&self) -> Option<u32> {
        self.selected_preset
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FormPhase::Loading
    }

    pub fn set_video_url(&mut self, value: impl Into<String>) {
        self.video_url = value.into();
    }

    /// Select a preset count. Clears the custom text.
    pub fn select_preset(&mut self, count: u32) -> Result<(), FormError> {
        if !PRESET_CLIP_COUNTS.contains(&count) {
            return Err(FormError::UnknownPreset(count));
        }
        self.selected_preset = Some(count);
        self.custom_count.clear();
        Ok(())
    }

    /// Replace the custom text. Clears any preset, even when the text is empty.
    pub fn set_custom_count(&mut self, value: impl Into<String>) {
        self.custom_count = value.into();
        self.selected_preset = None;
    }

    pub fn apply(&mut self, event: FormEvent) -> Result<(), FormError> {
        match event {
            FormEvent::SetVideoUrl(value) => self.set_video_url(value),
            FormEvent::SelectPreset(count) => self.select_preset(count)?,
            FormEvent::SetCustomCount(value) => self.set_custom_count(value),
        }
        Ok(())
    }

    /// Resolved clip count: the preset if one is selected, otherwise the
    /// integer prefix of the custom text.
    pub fn selected_count(&self) -> Option<i64> {
        if let Some(preset) = self.selected_preset {
            return Some(i64::from(preset));
        }
        if self.custom_count.is_empty() {
            return None;
        }
        parse_leading_integer(&self.custom_count)
    }

    pub fn url_is_valid(&self) -> bool {
        self.policy.accepts(&self.video_url)
    }

    /// The URL hint is shown for any non-empty value that fails the policy.
    pub fn show_url_error(&self) -> bool {
        !self.video_url.is_empty() && !self.url_is_valid()
    }

    /// Why the form cannot submit yet, if anything stops it.
    pub fn readiness_issue(&self) -> Option<&'static str> {
        if self.video_url.trim().is_empty() {
            return Some("video URL is empty");
        }
        if !self.url_is_valid() {
            return Some("video URL is not valid");
        }
        match self.selected_count() {
            None => Some("no clip count selected"),
            Some(count) if count <= 0 => Some("clip count must be positive"),
            Some(_) => None,
        }
    }

    pub fn can_make_clips(&self) -> bool {
        self.readiness_issue().is_none()
    }

    /// Whether the submit control is enabled.
    pub fn submit_enabled(&self) -> bool {
        self.can_make_clips() && !self.is_loading()
    }

    /// Idle -> Loading. Rejected while not ready or already Loading.
    pub fn begin_submission(&mut self) -> Result<ClipRequest, FormError> {
        if self.is_loading() {
            return Err(FormError::AlreadyLoading);
        }
        if let Some(issue) = self.readiness_issue() {
            return Err(FormError::NotReady(issue.to_string()));
        }
        let clip_count = self
            .selected_count()
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| FormError::NotReady("clip count must be positive".to_string()))?;

        self.phase = FormPhase::Loading;
        Ok(ClipRequest {
            video_url: self.video_url.clone(),
            clip_count,
        })
    }

    /// Loading -> Idle.
    pub fn finish_submission(&mut self) -> Result<(), FormError> {
        if !self.is_loading() {
            return Err(FormError::NotLoading);
        }
        self.phase = FormPhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ready_form(policy: UrlPolicy) -> FormState {
        let mut form = FormState::new(policy);
        form.set_video_url("https://youtube.com/watch?v=abc123");
        form.select_preset(5).unwrap();
        form
    }

    #[test]
    fn garbage_url_is_never_ready() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.set_video_url("not a url");
        form.select_preset(10).unwrap();
        assert!(!form.can_make_clips());
        form.set_custom_count("25");
        assert!(!form.can_make_clips());
        assert!(form.show_url_error());
    }

    #[test]
    fn generic_host_depends_on_policy() {
        for (policy, expected) in [
            (UrlPolicy::Permissive, true),
            (UrlPolicy::VideoPlatform, false),
        ] {
            let mut form = FormState::new(policy);
            form.set_video_url("https://example.com/video");
            form.select_preset(5).unwrap();
            assert_eq!(form.can_make_clips(), expected, "{:?}", policy);
        }
    }

    #[test]
    fn video_platform_policy_accepts_known_hosts() {
        let policy = UrlPolicy::VideoPlatform;
        assert!(policy.accepts("https://www.youtube.com/watch?v=1"));
        assert!(policy.accepts("https://youtu.be/1"));
        assert!(policy.accepts("https://vimeo.com/123"));
        assert!(policy.accepts("https://www.twitch.tv/videos/9"));
        assert!(policy.accepts("https://WWW.YOUTUBE.COM/watch?v=1"));
        assert!(!policy.accepts("https://dailymotion.com/video/x"));
        assert!(!policy.accepts("mailto:someone@youtube.com"));
    }

    #[test]
    fn custom_text_after_preset_wins() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.select_preset(5).unwrap();
        form.set_custom_count("7");
        assert_eq!(form.selected_count(), Some(7));
        assert_eq!(form.selected_preset(), None);
    }

    #[test]
    fn preset_after_custom_text_clears_it() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.set_custom_count("12");
        form.select_preset(3).unwrap();
        assert_eq!(form.custom_count(), "");
        assert_eq!(form.selected_count(), Some(3));
    }

    #[test]
    fn clearing_custom_text_also_drops_preset() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.select_preset(10).unwrap();
        form.set_custom_count("");
        assert_eq!(form.selected_count(), None);
    }

    #[test]
    fn zero_or_negative_count_is_not_ready() {
        let mut form = ready_form(UrlPolicy::Permissive);
        form.set_custom_count("0");
        assert!(!form.can_make_clips());
        assert_eq!(form.readiness_issue(), Some("clip count must be positive"));
        form.set_custom_count("-4");
        assert!(!form.can_make_clips());
    }

    #[test]
    fn unknown_preset_is_rejected_without_side_effects() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.set_custom_count("8");
        assert_eq!(form.select_preset(7), Err(FormError::UnknownPreset(7)));
        assert_eq!(form.custom_count(), "8");
    }

    #[test]
    fn blank_url_is_not_ready_even_if_count_is_set() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.set_video_url("   ");
        form.select_preset(3).unwrap();
        assert_eq!(form.readiness_issue(), Some("video URL is empty"));
        assert!(form.show_url_error());
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(parse_leading_integer("7"), Some(7));
        assert_eq!(parse_leading_integer("  42"), Some(42));
        assert_eq!(parse_leading_integer("2.5"), Some(2));
        assert_eq!(parse_leading_integer("9 clips"), Some(9));
        assert_eq!(parse_leading_integer("+3"), Some(3));
        assert_eq!(parse_leading_integer("-3"), Some(-3));
        assert_eq!(parse_leading_integer("abc"), None);
        assert_eq!(parse_leading_integer("-"), None);
        assert_eq!(parse_leading_integer(""), None);
        assert_eq!(
            parse_leading_integer("99999999999999999999999"),
            Some(i64::MAX)
        );
    }

    #[test]
    fn submission_walks_idle_loading_idle() {
        let mut form = ready_form(UrlPolicy::Permissive);
        assert_eq!(form.phase(), FormPhase::Idle);

        let request = form.begin_submission().unwrap();
        assert_eq!(request.clip_count, 5);
        assert_eq!(request.video_url, "https://youtube.com/watch?v=abc123");
        assert_eq!(form.phase(), FormPhase::Loading);
        assert!(!form.submit_enabled());

        assert_eq!(form.begin_submission(), Err(FormError::AlreadyLoading));

        form.finish_submission().unwrap();
        assert_eq!(form.phase(), FormPhase::Idle);
        assert_eq!(form.finish_submission(), Err(FormError::NotLoading));
    }

    #[test]
    fn submission_refused_when_not_ready() {
        let mut form = FormState::new(UrlPolicy::Permissive);
        form.set_video_url("https://vimeo.com/1");
        let err = form.begin_submission().unwrap_err();
        assert!(matches!(err, FormError::NotReady(_)));
        assert_eq!(form.phase(), FormPhase::Idle);
    }

    #[test]
    fn inputs_stay_editable_while_loading() {
        let mut form = ready_form(UrlPolicy::Permissive);
        form.begin_submission().unwrap();
        form.set_custom_count("4");
        form.set_video_url("https://vimeo.com/2");
        assert_eq!(form.selected_count(), Some(4));
        assert!(form.is_loading());
    }

    fn event_strategy() -> impl Strategy<Value = FormEvent> {
        prop_oneof![
            "[ -~]{0,24}".prop_map(FormEvent::SetVideoUrl),
            prop::sample::select(PRESET_CLIP_COUNTS.to_vec()).prop_map(FormEvent::SelectPreset),
            "[ 0-9a-z+-]{0,6}".prop_map(FormEvent::SetCustomCount),
        ]
    }

    proptest! {
        #[test]
        fn count_sources_stay_mutually_exclusive(events in prop::collection::vec(event_strategy(), 0..24)) {
            let mut form = FormState::new(UrlPolicy::Permissive);
            for event in events {
                form.apply(event).unwrap();
                prop_assert!(form.selected_preset().is_none() || form.custom_count().is_empty());
            }
        }

        #[test]
        fn ready_implies_positive_count_and_valid_url(events in prop::collection::vec(event_strategy(), 0..24)) {
            let mut form = FormState::new(UrlPolicy::VideoPlatform);
            for event in events {
                form.apply(event).unwrap();
            }
            if form.can_make_clips() {
                prop_assert!(form.selected_count().unwrap_or(0) > 0);
                prop_assert!(UrlPolicy::VideoPlatform.accepts(form.video_url()));
            }
        }

        #[test]
        fn unparseable_url_never_ready(count in 1u32..=50, preset in prop::sample::select(PRESET_CLIP_COUNTS.to_vec())) {
            let mut form = FormState::new(UrlPolicy::Permissive);
            form.set_video_url("not a url");
            form.set_custom_count(count.to_string());
            prop_assert!(!form.can_make_clips());
            form.select_preset(preset).unwrap();
            prop_assert!(!form.can_make_clips());
        }
    }
}
