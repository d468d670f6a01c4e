//! Voice selection policy for speech output adapters.
//!
//! Adapters call [`select_voice`] when turning an [`Utterance`] into a
//! platform request, and settings panels use [`voices_for_language`] to list
//! plausible choices.
//!
//! [`Utterance`]: voicebot_core::Utterance

use voicebot_core::VoiceDescriptor;

/// Pick the voice to use for an utterance.
///
/// Order of preference:
/// 1. the voice whose id equals `voice_id`;
/// 2. the first voice whose language tag equals `language`;
/// 3. the first voice whose language starts with the same two-letter prefix
///    (case-insensitive);
/// 4. the platform default voice.
///
/// Returns `None` when nothing applies; the platform then picks on its own.
#[must_use]
pub fn select_voice<'a>(
    voices: &'a [VoiceDescriptor],
    voice_id: Option<&str>,
    language: &str,
) -> Option<&'a VoiceDescriptor> {
    if let Some(id) = voice_id.filter(|id| !id.is_empty()) {
        if let Some(voice) = voices.iter().find(|v| v.id == id) {
            return Some(voice);
        }
        tracing::debug!(voice_id = id, "Requested voice not available, matching by language");
    }

    if !language.is_empty() {
        if let Some(voice) = voices.iter().find(|v| v.language == language) {
            return Some(voice);
        }
        let prefix = language_prefix(language);
        if let Some(voice) = voices
            .iter()
            .find(|v| v.language.to_ascii_lowercase().starts_with(&prefix))
        {
            return Some(voice);
        }
    }

    voices.iter().find(|v| v.is_default)
}

/// Voices matching `language`'s two-letter prefix, or every voice when none
/// match (or `language` is blank).
#[must_use]
pub fn voices_for_language<'a>(
    voices: &'a [VoiceDescriptor],
    language: &str,
) -> Vec<&'a VoiceDescriptor> {
    if language.trim().is_empty() {
        return voices.iter().collect();
    }
    let prefix = language_prefix(language);
    let matching: Vec<_> = voices
        .iter()
        .filter(|v| v.language.to_ascii_lowercase().starts_with(&prefix))
        .collect();
    if matching.is_empty() {
        voices.iter().collect()
    } else {
        matching
    }
}

fn language_prefix(language: &str) -> String {
    language
        .trim()
        .to_ascii_lowercase()
        .chars()
        .take(2)
        .collect()
}
