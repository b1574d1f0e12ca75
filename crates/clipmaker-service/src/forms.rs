//! Posted clip-maker form and its replay onto [`FormState`].
//!
//! Every interaction posts the whole form. The page carries the current
//! preset and the custom text it was rendered with in hidden fields, so the
//! server can tell which count source the user touched last:
//!
//! 1. `SetVideoUrl` with the posted URL.
//! 2. `SelectPreset` with the hidden preset, when it names a known preset.
//! 3. `SetCustomCount` when the custom text is non-empty and either no preset
//!    was selected or the text differs from what was rendered.
//! 4. The requested action: `preset-N` selects a preset, `submit` submits,
//!    `update` only re-renders.

use clipmaker_core::{FormError, FormEvent, FormState, UrlPolicy, PRESET_CLIP_COUNTS};
use serde::Deserialize;

use crate::error::ApiError;

/// Raw `application/x-www-form-urlencoded` body of the clip-maker form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClipMakerForm {
    #[serde(default)]
    pub video_url: String,

    #[serde(default)]
    pub custom_count: String,

    /// Preset selected when the page was rendered.
    #[serde(default)]
    pub preset: String,

    /// Custom text the page was rendered with.
    #[serde(default)]
    pub rendered_custom: String,

    #[serde(default)]
    pub action: String,
}

/// What the user asked for with this post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Update,
    Preset(u32),
    Submit,
}

impl FormAction {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let raw = raw.trim();
        match raw {
            "" | "update" => Ok(FormAction::Update),
            "submit" => Ok(FormAction::Submit),
            other => other
                .strip_prefix("preset-")
                .and_then(|count| count.parse::<u32>().ok())
                .map(FormAction::Preset)
                .ok_or_else(|| ApiError::bad_request(format!("unknown form action '{}'", other))),
        }
    }
}

impl ClipMakerForm {
    fn hidden_preset(&self) -> Option<u32> {
        self.preset
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|count| PRESET_CLIP_COUNTS.contains(count))
    }

    /// Events restoring the state the user was looking at, plus their edits.
    pub fn events(&self) -> Vec<FormEvent> {
        let mut events = vec![FormEvent::SetVideoUrl(self.video_url.clone())];

        let preset = self.hidden_preset();
        if let Some(count) = preset {
            events.push(FormEvent::SelectPreset(count));
        }

        let custom_edited = preset.is_none() || self.custom_count != self.rendered_custom;
        if !self.custom_count.is_empty() && custom_edited {
            events.push(FormEvent::SetCustomCount(self.custom_count.clone()));
        }

        events
    }

    /// Rebuild the form state and resolve the requested action. A `preset-N`
    /// action is applied here; `submit` is left to the caller.
    pub fn replay(&self, policy: UrlPolicy) -> Result<(FormState, FormAction), ApiError> {
        let action = FormAction::parse(&self.action)?;
        let mut state = FormState::new(policy);
        for event in self.events() {
            state.apply(event).map_err(form_rejection)?;
        }
        if let FormAction::Preset(count) = action {
            state.select_preset(count).map_err(form_rejection)?;
        }
        Ok((state, action))
    }
}

fn form_rejection(err: FormError) -> ApiError {
    ApiError::bad_request(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(
        video_url: &str,
        custom: &str,
        preset: &str,
        rendered: &str,
        action: &str,
    ) -> ClipMakerForm {
        ClipMakerForm {
            video_url: video_url.into(),
            custom_count: custom.into(),
            preset: preset.into(),
            rendered_custom: rendered.into(),
            action: action.into(),
        }
    }

    #[test]
    fn preset_button_selects_preset_and_clears_custom() {
        let posted = form("https://example.com/video", "7", "", "7", "preset-5");
        let (state, action) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(action, FormAction::Preset(5));
        assert_eq!(state.selected_preset(), Some(5));
        assert_eq!(state.custom_count(), "");
        assert_eq!(state.selected_count(), Some(5));
    }

    #[test]
    fn typing_a_custom_count_clears_the_rendered_preset() {
        let posted = form("https://example.com/video", "7", "5", "", "update");
        let (state, _) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(state.selected_preset(), None);
        assert_eq!(state.selected_count(), Some(7));
    }

    #[test]
    fn untouched_preset_survives_a_round_trip() {
        let posted = form("https://example.com/video", "", "10", "", "update");
        let (state, _) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(state.selected_preset(), Some(10));
        assert!(state.can_make_clips());
    }

    #[test]
    fn custom_count_survives_a_round_trip() {
        let posted = form("https://example.com/video", "12abc", "", "12abc", "update");
        let (state, _) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(state.custom_count(), "12abc");
        assert_eq!(state.selected_count(), Some(12));
    }

    #[test]
    fn forged_hidden_preset_is_ignored() {
        let posted = form("https://example.com/video", "", "7", "", "update");
        let (state, _) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(state.selected_preset(), None);
        assert_eq!(state.selected_count(), None);
    }

    #[test]
    fn unknown_preset_action_is_a_bad_request() {
        let posted = form("https://example.com/video", "", "", "", "preset-4");
        assert!(posted.replay(UrlPolicy::Permissive).is_err());
    }

    #[test]
    fn actions_parse() {
        assert_eq!(FormAction::parse("").unwrap(), FormAction::Update);
        assert_eq!(FormAction::parse("update").unwrap(), FormAction::Update);
        assert_eq!(FormAction::parse("submit").unwrap(), FormAction::Submit);
        assert_eq!(FormAction::parse("preset-3").unwrap(), FormAction::Preset(3));
        assert!(FormAction::parse("delete").is_err());
        assert!(FormAction::parse("preset-x").is_err());
    }

    #[test]
    fn replay_always_starts_idle() {
        let posted = form("https://example.com/video", "", "3", "", "submit");
        let (state, action) = posted.replay(UrlPolicy::Permissive).unwrap();
        assert_eq!(action, FormAction::Submit);
        assert!(!state.is_loading());
        assert!(state.submit_enabled());
    }
}
