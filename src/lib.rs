//! Translation of structured CMS documents.
//!
//! The core ([`extract`], [`patch`], [`strip`], [`rich_text`], [`path`]) is
//! synchronous and pure. [`service`] drives it per target locale against a
//! [`store::ContentStore`] and a [`oracle::TranslationOracle`]; [`server`]
//! exposes it over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod locale;
pub mod metrics;
pub mod oracle;
pub mod patch;
pub mod path;
pub mod retry;
pub mod rich_text;
pub mod schema;
pub mod server;
pub mod service;
pub mod store;
pub mod strip;
pub mod validator;

/// A document as stored by the content framework: a JSON object whose key
/// order is preserved.
pub type Document = serde_json::Map<String, serde_json::Value>;
