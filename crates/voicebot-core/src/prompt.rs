//! System prompt derivation for answer providers.

use crate::locale::{DEFAULT_LOCALE, base_language};

/// Build the system prompt sent ahead of the conversation history.
///
/// The answer must come back in the locale's base language, short enough to
/// be spoken aloud, with numbered steps for architecture questions and
/// minimal code plus explanation for code questions.
#[must_use]
pub fn system_prompt_for_locale(locale: &str) -> String {
    let locale = match locale.trim() {
        "" => DEFAULT_LOCALE,
        tag => tag,
    };
    let lang = base_language(locale);

    format!(
        "You are a voice assistant demo for a voice bot engineer.\n\
         - Reply in the user's language (locale hint: {locale}).\n\
         - Be concise and spoken-audio friendly (short paragraphs, minimal jargon).\n\
         - If the user asks about architecture, give numbered steps.\n\
         - If the user asks for code, give minimal code plus an explanation.\n\
         Language hint: {lang}"
    )
}
