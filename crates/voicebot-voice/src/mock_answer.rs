//! Local streaming answer source.
//!
//! Produces a canned, interview-style answer without any network access and
//! streams it word by word with a small delay, so the turn controller can be
//! exercised end to end with no server or credential.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{StreamExt, stream};
use voicebot_core::{AnswerRequest, AnswerSource, FragmentStream, base_language};

use crate::text_utils::split_preserving_whitespace;

/// Delay between fragments, roughly a fast typing speed.
pub const DEFAULT_FRAGMENT_DELAY: Duration = Duration::from_millis(18);

const EN_TEMPLATES: [&str; 3] = [
    "Here’s how I’d approach that in a production voice bot: (1) detect intent + entities, (2) confirm critical slots, (3) call tools/APIs, (4) speak a concise response, (5) log traces + transcripts for QA.",
    "For customer-service voice flows: add barge-in handling, retry prompts, confidence thresholds, and a fallback to agent handoff.",
    "For web voice UX: keep replies short, chunk long answers, show transcript, and provide a visible “Stop speaking” control.",
];

const EN_EXTRAS: [&str; 3] = [
    "Implementation detail: stream partial responses to the UI while TTS is playing to reduce perceived latency.",
    "Safety: redact PII in logs + add a policy layer to prevent sensitive content from being spoken aloud.",
    "Observability: emit events like STT_START, STT_FINAL, LLM_REQUEST, LLM_LATENCY_MS, TTS_START/END.",
];

const ES_TEMPLATES: [&str; 3] = [
    "Así lo haría en un bot de voz de producción: (1) intención + entidades, (2) confirmar datos críticos, (3) herramientas/APIs, (4) respuesta corta para TTS, (5) trazas + transcripciones.",
    "Para atención al cliente: barge-in, reintentos, umbrales de confianza, y fallback a agente humano.",
    "UX de voz en web: respuestas cortas, dividir contenido largo, mostrar transcripción, y botón de “Detener”.",
];

const ES_EXTRAS: [&str; 3] = [
    "Detalle: reproducir TTS por bloques para reducir latencia percibida.",
    "Seguridad: redactar PII en logs y evitar hablar datos sensibles.",
    "Observabilidad: STT_START, STT_FINAL, LLM_REQUEST, LLM_LATENCY_MS, TTS_START/END.",
];

/// Languages the mock can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockLanguage {
    English,
    Spanish,
}

impl MockLanguage {
    /// Spanish for `es-*` locales, English for everything else.
    #[must_use]
    pub fn from_locale(locale: &str) -> Self {
        if base_language(locale) == "es" {
            Self::Spanish
        } else {
            Self::English
        }
    }
}

/// Build the mock answer for `user_text`.
///
/// `variant` selects the template and closing remark; callers rotate it to
/// vary answers deterministically.
#[must_use]
pub fn compose_answer(user_text: &str, language: MockLanguage, variant: usize) -> String {
    let quoted = match user_text.trim() {
        "" => "(empty)",
        text => text,
    };
    let (templates, extras, said) = match language {
        MockLanguage::English => (&EN_TEMPLATES, &EN_EXTRAS, "You said"),
        MockLanguage::Spanish => (&ES_TEMPLATES, &ES_EXTRAS, "Dijiste"),
    };
    let template = templates[variant % templates.len()];
    let extra = extras[(variant / templates.len()) % extras.len()];

    format!("{template}\n\n{said}: “{quoted}”\n\n{extra}")
}

/// Answer source that streams [`compose_answer`] output.
#[derive(Debug)]
pub struct MockAnswerSource {
    delay: Duration,
    next_variant: AtomicUsize,
}

impl Default for MockAnswerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnswerSource {
    /// Mock with the default fragment delay.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_delay(DEFAULT_FRAGMENT_DELAY)
    }

    /// Mock with a custom fragment delay; zero streams without sleeping.
    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            next_variant: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl AnswerSource for MockAnswerSource {
    fn answer(&self, request: AnswerRequest) -> FragmentStream {
        let variant = self.next_variant.fetch_add(1, Ordering::Relaxed);
        let language = MockLanguage::from_locale(&request.locale);
        let text = compose_answer(&request.user_text, language, variant);
        let parts = split_preserving_whitespace(&text);
        let delay = self.delay;

        tracing::debug!(
            ?language,
            variant,
            fragments = parts.len(),
            history = request.history.len(),
            "Mock answer prepared"
        );

        stream::iter(parts)
            .then(move |part| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(part)
            })
            .boxed()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
