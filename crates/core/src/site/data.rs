//! Creation input for new, unsaved sites.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Site, serialize};
use crate::Error;
use crate::ports::{DocumentSource, FieldValue};

/// Field values for [`Site::create`]. Unknown keys are ignored when
/// deserializing, absent ones keep the site defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteData {
    pub id: Option<i64>,
    pub domains: Option<FieldValue<Vec<String>>>,
    pub root_id: Option<i64>,
    pub root_path: Option<String>,
    pub main_domain: Option<String>,
    pub error_document: Option<String>,
    pub localized_error_documents: Option<FieldValue<BTreeMap<String, String>>>,
    pub redirect_to_main_domain: Option<bool>,
    pub creation_date: Option<i64>,
    pub modification_date: Option<i64>,
}

impl SiteData {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `root_id` is missing.
    pub fn validate(&self) -> Result<(), Error> {
        if self.root_id.is_none() {
            return Err(Error::InvalidInput("root_id is required".to_string()));
        }
        Ok(())
    }
}

impl Site {
    /// Build and populate a new in-memory site. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for missing `root_id` or blank domains,
    /// `Error::Serialization` for undecodable text fields, and propagates
    /// document source failures.
    pub async fn create(data: SiteData, documents: &dyn DocumentSource) -> Result<Self, Error> {
        data.validate()?;

        let mut site = Self::new();
        if let Some(id) = data.id {
            site.set_id(id);
        }
        if let Some(domains) = data.domains {
            let domains = serialize::resolve("domains", domains)?;
            if let Some(position) = domains.iter().position(|d| d.trim().is_empty()) {
                return Err(Error::InvalidInput(format!("domains[{position}] must not be empty")));
            }
            site.set_domains(domains);
        }
        if let Some(localized) = data.localized_error_documents {
            site.set_localized_error_documents(serialize::resolve("localized_error_documents", localized)?);
        }
        if let Some(main_domain) = data.main_domain {
            site.set_main_domain(main_domain);
        }
        if let Some(error_document) = data.error_document {
            site.set_error_document(error_document);
        }
        if let Some(redirect) = data.redirect_to_main_domain {
            site.set_redirect_to_main_domain(redirect);
        }
        if let Some(timestamp) = data.creation_date {
            site.set_creation_date(timestamp);
        }
        if let Some(timestamp) = data.modification_date {
            site.set_modification_date(timestamp);
        }
        site.set_root_path(data.root_path);
        if let Some(root_id) = data.root_id {
            site.set_root_id(root_id, documents).await?;
        }

        Ok(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Document;
    use crate::testing::FakeDocuments;

    #[tokio::test]
    async fn test_create_populates_fields() {
        let documents = FakeDocuments::with(vec![Document { id: 1, real_full_path: "/".to_string() }]);
        let data: SiteData = serde_json::from_value(serde_json::json!({
            "domains": "[\"example.com\"]",
            "root_id": 1,
            "main_domain": "example.com",
            "redirect_to_main_domain": true,
            "unknown_key": "ignored"
        }))
        .unwrap();

        let site = Site::create(data, &documents).await.unwrap();
        assert!(site.id().is_none());
        assert_eq!(site.domains(), ["example.com"]);
        assert_eq!(site.main_domain(), "example.com");
        assert!(site.redirect_to_main_domain());
        assert_eq!(site.root_path(), Some("/"));
        assert_eq!(documents.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_root_id() {
        let documents = FakeDocuments::default();
        let result = Site::create(SiteData::default(), &documents).await;
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("root_id")));
        assert_eq!(documents.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_domain() {
        let documents = FakeDocuments::default();
        let data = SiteData {
            root_id: Some(1),
            domains: Some(FieldValue::Value(vec!["example.com".to_string(), " ".to_string()])),
            ..Default::default()
        };
        let result = Site::create(data, &documents).await;
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("domains[1]")));
    }
}
