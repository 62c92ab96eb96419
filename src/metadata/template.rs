//! Metadata templates.
//!
//! ```json
//! {
//!   "default_locale": "en",
//!   "tags": ["kitesurf", "drone"],
//!   "locales": {
//!     "en": { "title": "Kitesurf {location}", "description": "...", "vars": { "location": "Ceará" } },
//!     "pt": { "title": "Kitesurf {location}", "description": "..." }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use reelsmith_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// A parsed metadata template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTemplate {
    pub default_locale: String,
    /// Tags shared by every locale.
    #[serde(default)]
    pub tags: Vec<String>,
    pub locales: BTreeMap<String, LocaleTemplate>,
}

/// Title and description for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Extra tags for this locale.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lowest-precedence variables for this locale.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl MetadataTemplate {
    /// Parse and validate a template.
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid metadata template: {e}")))?;
        template.validate()?;
        Ok(template)
    }

    /// Load a template file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "cannot read metadata template {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
            .map_err(|e| Error::configuration(format!("{}: {e}", path.display())))
    }

    fn validate(&self) -> Result<()> {
        if !self.locales.contains_key(&self.default_locale) {
            return Err(Error::configuration(format!(
                "default locale {:?} has no entry in locales",
                self.default_locale
            )));
        }
        if let Some((code, _)) = self.locales.iter().find(|(_, l)| l.title.trim().is_empty()) {
            return Err(Error::configuration(format!("locale {code:?} has an empty title")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_locale() {
        let json = r#"{"default_locale": "en", "locales": {"pt": {"title": "x"}}}"#;
        let err = MetadataTemplate::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("\"en\""));
    }

    #[test]
    fn test_parse_minimal() {
        let json = r#"{"default_locale": "en", "locales": {"en": {"title": "Hello {date}"}}}"#;
        let template = MetadataTemplate::from_json(json).unwrap();
        assert!(template.tags.is_empty());
        assert_eq!(template.locales["en"].description, "");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = MetadataTemplate::load(Path::new("/nonexistent/metadata.json")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
