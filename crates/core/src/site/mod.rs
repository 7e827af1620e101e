//! The site record: domains mapped to a root document, plus error-document
//! and redirect configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::ports::{Document, DocumentSource, SiteRecord};

mod data;
pub mod serialize;

pub use data::SiteData;

/// A domain-to-content-root mapping used for multi-site routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    id: Option<i64>,
    domains: Vec<String>,
    root_id: Option<i64>,
    root_document: Option<Document>,
    root_path: Option<String>,
    main_domain: String,
    error_document: String,
    localized_error_documents: BTreeMap<String, String>,
    redirect_to_main_domain: bool,
    creation_date: Option<i64>,
    modification_date: Option<i64>,
}

impl Site {
    /// Empty, unsaved site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a site from persisted fields, resolving the root document.
    ///
    /// # Errors
    ///
    /// Fails if a serialized field cannot be decoded or the document source errors.
    pub async fn from_record(record: SiteRecord, documents: &dyn DocumentSource) -> Result<Self, Error> {
        let mut site = Self::new();
        site.set_id(record.id)
            .set_domains(serialize::resolve("domains", record.domains)?)
            .set_root_path(record.root_path)
            .set_main_domain(record.main_domain)
            .set_error_document(record.error_document)
            .set_localized_error_documents(serialize::resolve(
                "localized_error_documents",
                record.localized_error_documents,
            )?)
            .set_redirect_to_main_domain(record.redirect_to_main_domain);
        site.creation_date = record.creation_date;
        site.modification_date = record.modification_date;
        site.set_root_id(record.root_id, documents).await?;
        Ok(site)
    }

    /// `None` until an id has been assigned.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Overwrites any previous id.
    pub fn set_id(&mut self, id: i64) -> &mut Self {
        self.id = Some(id);
        self
    }

    /// Domains in configured order.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Replace the domain list.
    pub fn set_domains(&mut self, domains: Vec<String>) -> &mut Self {
        self.domains = domains;
        self
    }

    /// Set domains from their JSON text form.
    pub fn set_domains_serialized(&mut self, text: &str) -> Result<&mut Self, Error> {
        self.domains = serialize::decode("domains", text)?;
        Ok(self)
    }

    /// Id of the root document, once set.
    pub fn root_id(&self) -> Option<i64> {
        self.root_id
    }

    /// Set the root id and resolve the root document for it.
    ///
    /// The stored document is whatever the source returns, so an unknown id
    /// leaves the site without a root document.
    ///
    /// # Errors
    ///
    /// Propagates document source failures; the site is left unchanged.
    pub async fn set_root_id(&mut self, root_id: i64, documents: &dyn DocumentSource) -> Result<&mut Self, Error> {
        let document = documents.find_page(root_id).await?;
        if document.is_none() {
            tracing::debug!(root_id, "Root document not found");
        }
        self.root_id = Some(root_id);
        Ok(self.set_root_document(document))
    }

    /// Root page resolved by the last `set_root_id`, if any.
    pub fn root_document(&self) -> Option<&Document> {
        self.root_document.as_ref()
    }

    /// Set the root page directly, without touching `root_id`.
    pub fn set_root_document(&mut self, document: Option<Document>) -> &mut Self {
        self.root_document = document;
        self
    }

    /// Explicit root path; `None` or empty falls back to the root document.
    pub fn set_root_path(&mut self, path: Option<String>) -> &mut Self {
        self.root_path = path;
        self
    }

    /// The explicit root path, else the root document's path.
    pub fn root_path(&self) -> Option<&str> {
        match self.root_path.as_deref() {
            Some(path) if !path.is_empty() => Some(path),
            _ => self
                .root_document
                .as_ref()
                .map(|doc| doc.real_full_path.as_str())
                .or(self.root_path.as_deref()),
        }
    }

    /// Canonical domain; empty when not configured.
    pub fn main_domain(&self) -> &str {
        &self.main_domain
    }

    /// Set the canonical domain.
    pub fn set_main_domain(&mut self, main_domain: impl Into<String>) -> &mut Self {
        self.main_domain = main_domain.into();
        self
    }

    /// Global error document path; empty when not configured.
    pub fn error_document(&self) -> &str {
        &self.error_document
    }

    /// Set the global error document path.
    pub fn set_error_document(&mut self, error_document: impl Into<String>) -> &mut Self {
        self.error_document = error_document.into();
        self
    }

    /// Error document paths keyed by locale.
    pub fn localized_error_documents(&self) -> &BTreeMap<String, String> {
        &self.localized_error_documents
    }

    /// Replace the per-locale error documents.
    pub fn set_localized_error_documents(&mut self, documents: BTreeMap<String, String>) -> &mut Self {
        self.localized_error_documents = documents;
        self
    }

    /// Set localized error documents from their JSON text form.
    pub fn set_localized_error_documents_serialized(&mut self, text: &str) -> Result<&mut Self, Error> {
        self.localized_error_documents = serialize::decode("localized_error_documents", text)?;
        Ok(self)
    }

    /// Error document for `locale`, falling back to the global one.
    pub fn error_document_for(&self, locale: &str) -> Option<&str> {
        self.localized_error_documents
            .get(locale)
            .map(String::as_str)
            .filter(|path| !path.is_empty())
            .or_else(|| Some(self.error_document.as_str()).filter(|path| !path.is_empty()))
    }

    /// Whether requests on other domains redirect to the main domain.
    pub fn redirect_to_main_domain(&self) -> bool {
        self.redirect_to_main_domain
    }

    /// Enable or disable redirection to the main domain.
    pub fn set_redirect_to_main_domain(&mut self, redirect: bool) -> &mut Self {
        self.redirect_to_main_domain = redirect;
        self
    }

    /// Whether `host` is one of this site's domains.
    ///
    /// Matching ignores ASCII case; an entry `*.example.com` matches any
    /// subdomain of `example.com` but not `example.com` itself.
    pub fn serves_domain(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            match domain.strip_prefix("*.") {
                Some(suffix) => host.len() > suffix.len() + 1 && host.ends_with(&format!(".{suffix}")),
                None => domain == host,
            }
        })
    }

    /// Host to redirect to when the request did not arrive on the main domain.
    pub fn redirect_target(&self, host: &str) -> Option<&str> {
        if !self.redirect_to_main_domain || self.main_domain.is_empty() {
            return None;
        }
        (!self.main_domain.eq_ignore_ascii_case(host)).then_some(self.main_domain.as_str())
    }

    /// Creation time in epoch seconds.
    pub fn creation_date(&self) -> Option<i64> {
        self.creation_date
    }

    /// Set the creation time in epoch seconds.
    pub fn set_creation_date(&mut self, timestamp: i64) -> &mut Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Last modification time in epoch seconds.
    pub fn modification_date(&self) -> Option<i64> {
        self.modification_date
    }

    /// Set the modification time in epoch seconds.
    pub fn set_modification_date(&mut self, timestamp: i64) -> &mut Self {
        self.modification_date = Some(timestamp);
        self
    }

    /// Stamp modification (and first creation) time before a save.
    pub fn touch(&mut self, now: chrono::DateTime<chrono::Utc>) -> &mut Self {
        let timestamp = now.timestamp();
        if self.creation_date.is_none() {
            self.creation_date = Some(timestamp);
        }
        self.set_modification_date(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FieldValue;
    use crate::testing::FakeDocuments;
    use chrono::TimeZone;

    fn page(id: i64, path: &str) -> Document {
        Document { id, real_full_path: path.to_string() }
    }

    #[tokio::test]
    async fn test_set_root_id_resolves_document() {
        let documents = FakeDocuments::with(vec![page(7, "/en")]);
        let mut site = Site::new();
        site.set_root_id(7, &documents).await.unwrap();

        assert_eq!(site.root_id(), Some(7));
        assert_eq!(site.root_document(), Some(&page(7, "/en")));
    }

    #[tokio::test]
    async fn test_set_root_id_unknown_clears_document() {
        let documents = FakeDocuments::with(vec![page(7, "/en")]);
        let mut site = Site::new();
        site.set_root_id(7, &documents).await.unwrap();
        site.set_root_id(8, &documents).await.unwrap();

        assert_eq!(site.root_id(), Some(8));
        assert!(site.root_document().is_none());
    }

    #[tokio::test]
    async fn test_set_root_id_failure_leaves_site_unchanged() {
        let documents = FakeDocuments::failing();
        let mut site = Site::new();
        let result = site.set_root_id(7, &documents).await;

        assert!(matches!(result, Err(Error::Document(_))));
        assert!(site.root_id().is_none());
    }

    #[tokio::test]
    async fn test_root_path_precedence() {
        let documents = FakeDocuments::with(vec![page(7, "/de/home")]);
        let mut site = Site::new();
        assert!(site.root_path().is_none());

        site.set_root_id(7, &documents).await.unwrap();
        assert_eq!(site.root_path(), Some("/de/home"));

        site.set_root_path(Some(String::new()));
        assert_eq!(site.root_path(), Some("/de/home"));

        site.set_root_path(Some("/custom".to_string()));
        assert_eq!(site.root_path(), Some("/custom"));
    }

    #[test]
    fn test_root_path_empty_without_document() {
        let mut site = Site::new();
        site.set_root_path(Some(String::new()));
        assert_eq!(site.root_path(), Some(""));
    }

    #[tokio::test]
    async fn test_from_record_decodes_serialized_fields() {
        let documents = FakeDocuments::with(vec![page(3, "/site")]);
        let record = SiteRecord {
            id: 5,
            domains: FieldValue::Serialized(r#"["example.com","www.example.com"]"#.to_string()),
            root_id: 3,
            main_domain: "example.com".to_string(),
            localized_error_documents: FieldValue::Serialized(r#"{"de":"/de/404"}"#.to_string()),
            creation_date: Some(100),
            modification_date: Some(200),
            ..Default::default()
        };

        let site = Site::from_record(record, &documents).await.unwrap();
        assert_eq!(site.id(), Some(5));
        assert_eq!(site.domains(), ["example.com", "www.example.com"]);
        assert_eq!(site.root_path(), Some("/site"));
        assert_eq!(site.localized_error_documents().get("de").map(String::as_str), Some("/de/404"));
        assert_eq!(site.creation_date(), Some(100));
        assert_eq!(site.modification_date(), Some(200));
    }

    #[test]
    fn test_set_domains_serialized_rejects_garbage() {
        let mut site = Site::new();
        assert!(matches!(site.set_domains_serialized("a.com,b.com"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_error_document_fallback() {
        let mut site = Site::new();
        assert!(site.error_document_for("de").is_none());

        site.set_error_document("/404");
        site.set_localized_error_documents_serialized(r#"{"de":"/de/404","fr":""}"#).unwrap();
        assert_eq!(site.error_document_for("de"), Some("/de/404"));
        assert_eq!(site.error_document_for("fr"), Some("/404"));
        assert_eq!(site.error_document_for("en"), Some("/404"));
    }

    #[test]
    fn test_serves_domain() {
        let mut site = Site::new();
        site.set_domains(vec!["Example.com".to_string(), "*.example.org".to_string()]);

        assert!(site.serves_domain("example.com"));
        assert!(site.serves_domain("shop.example.org"));
        assert!(!site.serves_domain("example.org"));
        assert!(!site.serves_domain("badexample.org"));
        assert!(!site.serves_domain("www.example.com"));
    }

    #[test]
    fn test_redirect_target() {
        let mut site = Site::new();
        site.set_main_domain("example.com");
        assert!(site.redirect_target("www.example.com").is_none());

        site.set_redirect_to_main_domain(true);
        assert_eq!(site.redirect_target("www.example.com"), Some("example.com"));
        assert!(site.redirect_target("EXAMPLE.com").is_none());

        site.set_main_domain("");
        assert!(site.redirect_target("www.example.com").is_none());
    }

    #[test]
    fn test_touch_keeps_creation_date() {
        let mut site = Site::new();
        let first = chrono::Utc.timestamp_opt(1_000, 0).unwrap();
        let second = chrono::Utc.timestamp_opt(2_000, 0).unwrap();

        site.touch(first);
        site.touch(second);
        assert_eq!(site.creation_date(), Some(1_000));
        assert_eq!(site.modification_date(), Some(2_000));
    }

    #[test]
    fn test_set_id_overwrites() {
        let mut site = Site::new();
        site.set_id(1).set_id(2);
        assert_eq!(site.id(), Some(2));
    }
}
