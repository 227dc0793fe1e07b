use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by a translation request.
///
/// The display strings are the messages returned to API clients.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Translation API key not configured")]
    MissingApiKey,

    #[error("Localization is not configured")]
    LocalizationNotConfigured,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Collection not found")]
    CollectionNotFound,

    #[error("Invalid source locale")]
    InvalidSourceLocale,

    #[error("Invalid target locales")]
    InvalidTargetLocales,

    #[error("Document not found")]
    DocumentNotFound,

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("Translation to {locale} failed: {message}")]
    Oracle { locale: String, message: String },

    #[error("Saving {locale} failed: {message}")]
    Persist { locale: String, message: String },
}

impl TranslateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslateError::MissingFields
            | TranslateError::InvalidSourceLocale
            | TranslateError::InvalidTargetLocales => StatusCode::BAD_REQUEST,
            TranslateError::CollectionNotFound | TranslateError::DocumentNotFound => {
                StatusCode::NOT_FOUND
            }
            TranslateError::MissingApiKey
            | TranslateError::LocalizationNotConfigured
            | TranslateError::Store(_)
            | TranslateError::Persist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            TranslateError::Oracle { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        assert_eq!(TranslateError::MissingFields.to_string(), "Missing required fields");
        assert_eq!(
            TranslateError::MissingApiKey.to_string(),
            "Translation API key not configured"
        );
        let err = TranslateError::Oracle {
            locale: "cz".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Translation to cz failed: timeout");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TranslateError::InvalidTargetLocales.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(TranslateError::DocumentNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            TranslateError::LocalizationNotConfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TranslateError::Store(anyhow::anyhow!("db down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let persist = TranslateError::Persist {
            locale: "cz".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(persist.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let oracle = TranslateError::Oracle {
            locale: "cz".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(oracle.status_code(), StatusCode::BAD_GATEWAY);
    }
}
