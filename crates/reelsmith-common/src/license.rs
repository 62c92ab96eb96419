//! Content licenses and the allowed-license filter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// License tag attached to an asset.
///
/// Only [`License::Cc0`] and [`License::CcBy`] may ever reach a montage; any
/// other tag is kept verbatim so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum License {
    /// Public domain dedication.
    Cc0,
    /// Attribution required.
    CcBy,
    /// Anything else, as reported by the provider.
    Other(String),
}

impl License {
    /// Parse a provider license tag.
    ///
    /// Accepts the spellings used by the stock providers and in config files:
    /// `cc0`, `CC0`, `by`, `cc-by`, `CC BY`. The Public Domain Mark (`pdm`)
    /// labels a work rather than dedicating it, so it stays [`License::Other`].
    pub fn parse(tag: &str) -> Self {
        let norm: String = tag
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();
        match norm.as_str() {
            "cc0" | "cc-0" => Self::Cc0,
            "by" | "cc-by" | "ccby" => Self::CcBy,
            _ => Self::Other(norm),
        }
    }

    /// Whether this license requires attribution in the credits.
    pub fn requires_attribution(&self) -> bool {
        !matches!(self, Self::Cc0)
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cc0 => write!(f, "CC0"),
            Self::CcBy => write!(f, "CC-BY"),
            Self::Other(tag) => write!(f, "{}", tag),
        }
    }
}

impl std::str::FromStr for License {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("empty license tag".to_string());
        }
        Ok(Self::parse(s))
    }
}

impl Serialize for License {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for License {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The set of licenses a run accepts.
///
/// Always a subset of {CC0, CC-BY}; [`LicenseSet::new`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LicenseSet(Vec<License>);

impl LicenseSet {
    /// Build a license set, rejecting licenses outside CC0 / CC-BY.
    pub fn new(licenses: Vec<License>) -> std::result::Result<Self, String> {
        if licenses.is_empty() {
            return Err("allowed license set is empty".to_string());
        }
        let mut out: Vec<License> = Vec::with_capacity(licenses.len());
        for license in licenses {
            if let License::Other(tag) = &license {
                return Err(format!(
                    "license {:?} is not allowed; only CC0 and CC-BY may be used",
                    tag
                ));
            }
            if !out.contains(&license) {
                out.push(license);
            }
        }
        out.sort();
        Ok(Self(out))
    }

    /// Whether `license` is in the set.
    pub fn allows(&self, license: &License) -> bool {
        self.0.contains(license)
    }

    /// Licenses in the set, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &License> {
        self.0.iter()
    }
}

impl Default for LicenseSet {
    fn default() -> Self {
        Self(vec![License::Cc0, License::CcBy])
    }
}

impl<'de> Deserialize<'de> for LicenseSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let licenses = Vec::<License>::deserialize(deserializer)?;
        LicenseSet::new(licenses).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spellings() {
        assert_eq!(License::parse("cc0"), License::Cc0);
        assert_eq!(License::parse("CC0"), License::Cc0);
        assert_eq!(License::parse("pdm"), License::Other("pdm".into()));
        assert_eq!(License::parse("by"), License::CcBy);
        assert_eq!(License::parse("CC BY"), License::CcBy);
        assert_eq!(License::parse("cc_by"), License::CcBy);
        assert_eq!(License::parse("by-nc"), License::Other("by-nc".into()));
        assert_eq!(License::parse("BY-SA"), License::Other("by-sa".into()));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for license in [License::Cc0, License::CcBy] {
            assert_eq!(License::parse(&license.to_string()), license);
        }
    }

    #[test]
    fn test_requires_attribution() {
        assert!(!License::Cc0.requires_attribution());
        assert!(License::CcBy.requires_attribution());
    }

    #[test]
    fn test_license_set_rejects_other() {
        let err = LicenseSet::new(vec![License::Cc0, License::Other("by-sa".into())]);
        assert!(err.is_err());
        assert!(LicenseSet::new(vec![]).is_err());
    }

    #[test]
    fn test_license_set_dedups() {
        let set = LicenseSet::new(vec![License::CcBy, License::Cc0, License::CcBy]).unwrap();
        assert_eq!(set.iter().count(), 2);
        assert!(set.allows(&License::Cc0));
        assert!(set.allows(&License::CcBy));
    }

    #[test]
    fn test_public_domain_mark_is_not_allowed() {
        assert!(!LicenseSet::default().allows(&License::parse("pdm")));
    }

    #[test]
    fn test_cc0_only_set() {
        let set = LicenseSet::new(vec![License::Cc0]).unwrap();
        assert!(!set.allows(&License::CcBy));
    }

    #[test]
    fn test_license_set_deserialize() {
        let set: LicenseSet = serde_json::from_str(r#"["cc0", "CC-BY"]"#).unwrap();
        assert_eq!(set, LicenseSet::default());
        let bad: std::result::Result<LicenseSet, _> = serde_json::from_str(r#"["by-nc"]"#);
        assert!(bad.is_err());
    }
}
