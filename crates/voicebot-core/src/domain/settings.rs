//! Per-call session settings.
//!
//! Settings are owned by the presentation layer and passed into the turn
//! controller with each request; the controller never stores them beyond the
//! operation they were passed for.

use serde::{Deserialize, Serialize};

use crate::locale::DEFAULT_LOCALE;

/// Speech rate bounds accepted by the settings panel.
pub const RATE_RANGE: (f32, f32) = (0.6, 1.4);
/// Pitch bounds accepted by the settings panel.
pub const PITCH_RANGE: (f32, f32) = (0.6, 1.6);
/// Volume bounds.
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Language tags and voice parameters for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Speak answers automatically once they finish streaming.
    pub auto_speak: bool,

    /// Locale used for recognition and for the answer language.
    pub input_language: String,

    /// Locale used to pick a synthesis voice.
    pub output_language: String,

    /// Explicit voice identity; `None` selects by language.
    pub voice_id: Option<String>,

    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_speak: true,
            input_language: DEFAULT_LOCALE.to_owned(),
            output_language: DEFAULT_LOCALE.to_owned(),
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SessionSettings {
    /// Settings with both input and output set to `locale`.
    #[must_use]
    pub fn for_locale(locale: impl Into<String>) -> Self {
        let locale = locale.into();
        Self {
            output_language: locale.clone(),
            input_language: locale,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_auto_speak(mut self, auto_speak: bool) -> Self {
        self.auto_speak = auto_speak;
        self
    }

    #[must_use]
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Copy with rate, pitch and volume clamped into their accepted ranges.
    ///
    /// Non-finite values fall back to 1.0 (rate/pitch) or the upper volume
    /// bound.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            rate: clamp_or(self.rate, RATE_RANGE, 1.0),
            pitch: clamp_or(self.pitch, PITCH_RANGE, 1.0),
            volume: clamp_or(self.volume, VOLUME_RANGE, VOLUME_RANGE.1),
            ..self.clone()
        }
    }

    /// The input locale, or the default when unset.
    #[must_use]
    pub fn input_locale(&self) -> &str {
        let tag = self.input_language.trim();
        if tag.is_empty() { DEFAULT_LOCALE } else { tag }
    }
}

fn clamp_or(value: f32, (lo, hi): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}
