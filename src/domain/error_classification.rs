//! Error classification - maps any failure to a category, status and
//! fixed user-facing message

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::DomainError;

static RETRY_AFTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)retry[- _]after[^0-9]{0,8}(\d{1,5})").expect("valid regex")
});

const AUTH_SIGNALS: &[&str] = &[
    "401",
    "403",
    "unauthorized",
    "unauthorised",
    "forbidden",
    "invalid api key",
    "invalid_api_key",
    "incorrect api key",
    "authentication",
];

const RATE_LIMIT_SIGNALS: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "quota",
];

const NETWORK_SIGNALS: &[&str] = &[
    "econnrefused",
    "econnreset",
    "enotfound",
    "connection refused",
    "connection reset",
    "error sending request",
    "network",
    "dns",
    "502",
    "503",
    "bad gateway",
    "service unavailable",
];

const TIMEOUT_SIGNALS: &[&str] = &["timeout", "timed out", "etimedout", "deadline"];

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Auth,
    RateLimit,
    ServiceUnavailable,
    Timeout,
    Unknown,
}

impl ErrorCategory {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Auth => 401,
            Self::RateLimit => 429,
            Self::ServiceUnavailable => 503,
            Self::Timeout => 504,
            Self::Unknown => 500,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => "Forespørselen er ugyldig. Sjekk meldingen og prøv igjen.",
            Self::Auth => "Søketjenesten er ikke riktig konfigurert. Kontakt administrator.",
            Self::RateLimit => "For mange forespørsler. Vent litt og prøv igjen.",
            Self::ServiceUnavailable => {
                "Søketjenesten er midlertidig utilgjengelig. Prøv igjen om litt."
            }
            Self::Timeout => "Søket tok for lang tid. Prøv igjen, gjerne med et kortere spørsmål.",
            Self::Unknown => "Det oppstod en uventet feil. Prøv igjen senere.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    /// Categories worth retrying against the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::ServiceUnavailable | Self::Timeout
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure normalized for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub http_status: u16,
    pub user_message: String,
    #[serde(skip)]
    pub technical_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, technical_message: impl Into<String>) -> Self {
        Self {
            category,
            http_status: category.http_status(),
            user_message: category.user_message().to_string(),
            technical_message: technical_message.into(),
            retry_after_secs: None,
        }
    }

    pub fn with_retry_after(mut self, secs: Option<u64>) -> Self {
        self.retry_after_secs = secs;
        self
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.category, self.http_status, self.technical_message)
    }
}

impl std::error::Error for ClassifiedError {}

/// Classifies failures. Total: every input maps to exactly one category.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(&self, error: &DomainError) -> ClassifiedError {
        let technical = error.to_string();

        match error {
            DomainError::Validation { .. } => {
                ClassifiedError::new(ErrorCategory::Validation, technical)
            }
            DomainError::Authentication { .. } => {
                ClassifiedError::new(ErrorCategory::Auth, technical)
            }
            DomainError::RateLimited {
                retry_after_secs, ..
            } => ClassifiedError::new(ErrorCategory::RateLimit, technical.clone())
                .with_retry_after(retry_after_secs.or_else(|| parse_retry_after(&technical))),
            DomainError::Unavailable { .. } => {
                ClassifiedError::new(ErrorCategory::ServiceUnavailable, technical)
            }
            DomainError::Timeout { .. } => ClassifiedError::new(ErrorCategory::Timeout, technical),
            _ => self.classify_message(&technical),
        }
    }

    /// Classifies an arbitrary error, using the domain variant when available
    pub fn classify_dyn(&self, error: &(dyn std::error::Error + 'static)) -> ClassifiedError {
        if let Some(domain) = error.downcast_ref::<DomainError>() {
            return self.classify(domain);
        }

        if let Some(classified) = error.downcast_ref::<ClassifiedError>() {
            return classified.clone();
        }

        let mut message = error.to_string();
        let mut source = error.source();

        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        self.classify_message(&message)
    }

    /// Message-based classification for errors without a typed category
    pub fn classify_message(&self, message: &str) -> ClassifiedError {
        let lowered = message.to_lowercase();

        let category = if contains_any(&lowered, AUTH_SIGNALS) {
            ErrorCategory::Auth
        } else if contains_any(&lowered, RATE_LIMIT_SIGNALS) {
            ErrorCategory::RateLimit
        } else if contains_any(&lowered, NETWORK_SIGNALS) {
            ErrorCategory::ServiceUnavailable
        } else if contains_any(&lowered, TIMEOUT_SIGNALS) {
            ErrorCategory::Timeout
        } else {
            ErrorCategory::Unknown
        };

        let classified = ClassifiedError::new(category, message);

        if category == ErrorCategory::RateLimit {
            classified.with_retry_after(parse_retry_after(message))
        } else {
            classified
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn parse_retry_after(message: &str) -> Option<u64> {
    RETRY_AFTER
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
