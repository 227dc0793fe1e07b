//! Document translation: validate a request, then run
//! extract → translate → patch → strip → persist once per target locale.

use crate::error::TranslateError;
use crate::extract::{self, ExtractOptions, TranslatableField};
use crate::locale::{LocaleConfig, LocaleRegistry};
use crate::metrics::TranslationMetrics;
use crate::oracle::{OracleRequest, TranslationOracle};
use crate::patch::apply_translations;
use crate::schema::ContentConfig;
use crate::store::{ContentStore, DocumentId};
use crate::strip::strip_system_fields;
use crate::validator::BatchCheck;
use crate::Document;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Body of a translate request.
///
/// Every field is optional at the parsing stage so that missing values are
/// reported as [`TranslateError::MissingFields`] rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateRequest {
    pub collection: Option<String>,
    pub document_id: Option<DocumentId>,
    /// Falls back to the configured default locale when absent
    pub source_locale: Option<String>,
    pub target_locales: Vec<String>,
}

/// Result of a translate request that got past validation.
#[derive(Debug)]
pub struct TranslationOutcome {
    /// Translatable fields found in the source document
    pub translated_fields: usize,
    /// Locales written to the store, in request order
    pub translated_locales: Vec<String>,
    /// Locales that were going to be attempted
    pub requested_locales: usize,
    /// Set when a locale failed after at least one locale was committed
    pub failure: Option<TranslateError>,
}

impl TranslationOutcome {
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }

    pub fn message(&self) -> String {
        if self.translated_fields == 0 {
            return "No translatable fields found".to_string();
        }
        if self.is_partial() {
            return format!(
                "Translated {} field(s) to {} of {} locale(s)",
                self.translated_fields,
                self.translated_locales.len(),
                self.requested_locales
            );
        }
        format!(
            "Successfully translated {} field(s) to {} locale(s)",
            self.translated_fields,
            self.translated_locales.len()
        )
    }
}

pub struct TranslationService {
    content: Arc<ContentConfig>,
    locales: Option<LocaleRegistry>,
    store: Arc<dyn ContentStore>,
    oracle: Option<Arc<dyn TranslationOracle>>,
    metrics: Arc<TranslationMetrics>,
    options: ExtractOptions,
}

impl TranslationService {
    /// `oracle` is `None` when no API key is configured; requests then fail
    /// with [`TranslateError::MissingApiKey`].
    pub fn new(
        content: Arc<ContentConfig>,
        store: Arc<dyn ContentStore>,
        oracle: Option<Arc<dyn TranslationOracle>>,
    ) -> Self {
        let locales = content.localization.as_ref().map(LocaleRegistry::from_config);
        Self {
            content,
            locales,
            store,
            oracle,
            metrics: Arc::new(TranslationMetrics::new()),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    /// Translate one document into the requested locales.
    ///
    /// Locales are processed in order; a failing locale stops the run. Locales
    /// already written stay written and are reported in the outcome. `Err`
    /// is returned for validation failures and when the first locale fails.
    pub async fn translate(
        &self,
        request: TranslateRequest,
    ) -> Result<TranslationOutcome, TranslateError> {
        let (collection_slug, document_id) = match (
            non_blank(request.collection.as_deref()),
            request.document_id.as_ref(),
        ) {
            (Some(slug), Some(id)) if !request.target_locales.is_empty() => (slug, id),
            _ => return Err(TranslateError::MissingFields),
        };

        let oracle = self.oracle.as_ref().ok_or(TranslateError::MissingApiKey)?;

        let collection = self
            .content
            .collection(collection_slug)
            .ok_or(TranslateError::CollectionNotFound)?;

        let locales = self
            .locales
            .as_ref()
            .ok_or(TranslateError::LocalizationNotConfigured)?;

        let source = match non_blank(request.source_locale.as_deref()) {
            Some(code) => locales.get_by_code(code).ok_or_else(|| {
                warn!(
                    "Unsupported source locale '{}', expected one of {}",
                    code,
                    locales.codes().join(", ")
                );
                TranslateError::InvalidSourceLocale
            })?,
            None => locales.default_locale().ok_or(TranslateError::MissingFields)?,
        };

        let targets = locales.resolve_targets(&request.target_locales, &source.code);
        if targets.is_empty() {
            return Err(TranslateError::InvalidTargetLocales);
        }

        let document = self
            .store
            .find_by_id(&collection.slug, document_id, &source.code)
            .await?
            .ok_or(TranslateError::DocumentNotFound)?;

        let fields = extract::extract_with(&document, &collection.fields, self.options);
        if fields.is_empty() {
            info!(
                "No translatable fields in {}/{} ({})",
                collection.slug, document_id, source.code
            );
            return Ok(TranslationOutcome {
                translated_fields: 0,
                translated_locales: Vec::new(),
                requested_locales: targets.len(),
                failure: None,
            });
        }

        self.metrics.record_document();
        info!(
            "Translating {} field(s) of {}/{} from {} to {}",
            fields.len(),
            collection.slug,
            document_id,
            source.code,
            targets.iter().map(|t| t.code.as_str()).collect::<Vec<_>>().join(", ")
        );

        let mut outcome = TranslationOutcome {
            translated_fields: fields.len(),
            translated_locales: Vec::with_capacity(targets.len()),
            requested_locales: targets.len(),
            failure: None,
        };

        for target in targets {
            let job = LocaleJob {
                collection: &collection.slug,
                id: document_id,
                source,
                target,
                document: &document,
                fields: &fields,
            };

            if let Err(e) = self.translate_locale(oracle.as_ref(), job).await {
                error!("{}", e);
                if outcome.translated_locales.is_empty() {
                    return Err(e);
                }
                outcome.failure = Some(e);
                break;
            }
            outcome.translated_locales.push(target.code.clone());
        }

        Ok(outcome)
    }

    async fn translate_locale(
        &self,
        oracle: &dyn TranslationOracle,
        job: LocaleJob<'_>,
    ) -> Result<(), TranslateError> {
        let texts = extract::texts(job.fields);

        self.metrics.record_oracle_call();
        let translations = oracle
            .translate(OracleRequest {
                source: job.source,
                target: job.target,
                texts: &texts,
            })
            .await
            .map_err(|e| {
                self.metrics.record_oracle_failure();
                TranslateError::Oracle {
                    locale: job.target.code.clone(),
                    message: format!("{:#}", e),
                }
            })?;

        let check = BatchCheck::new(&texts, &translations);
        if !check.is_complete() {
            warn!("{}: {}", job.target.code, check);
        }

        let patched = apply_translations(job.document, job.fields, &translations);
        let data = strip_system_fields(&patched);

        self.store
            .update(job.collection, job.id, &job.target.code, data)
            .await
            .map_err(|e| TranslateError::Persist {
                locale: job.target.code.clone(),
                message: format!("{:#}", e),
            })?;

        self.metrics.record_locale(check.applied());
        info!(
            "Saved {} translation of {}/{}",
            job.target.code, job.collection, job.id
        );
        Ok(())
    }
}

/// Everything one locale's cycle reads.
struct LocaleJob<'a> {
    collection: &'a str,
    id: &'a DocumentId,
    source: &'a LocaleConfig,
    target: &'a LocaleConfig,
    document: &'a Document,
    fields: &'a [TranslatableField],
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
