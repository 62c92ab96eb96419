//! Variable substitution for text templates.

use std::collections::BTreeMap;

/// Variable substitution context.
///
/// Supports variable substitution in strings using the `{varname}` syntax.
/// Substitution is a single left-to-right pass: substituted values are never
/// scanned again, and unknown placeholders are left in place so callers can
/// report them with [`TemplateContext::unresolved`].
///
/// # Example
///
/// ```
/// use reelsmith_av::TemplateContext;
///
/// let ctx = TemplateContext::new()
///     .with_var("location", "Cumbuco")
///     .with_var("scene_count", "5");
///
/// assert_eq!(ctx.substitute("{scene_count} cuts at {location}"), "5 cuts at Cumbuco");
/// assert_eq!(ctx.unresolved("{location} {year}"), vec!["year".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom variable.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Set a variable only if it is not already defined.
    ///
    /// Returns `false` when the key was taken.
    pub fn set_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.vars.contains_key(key) {
            return false;
        }
        self.vars.insert(key.to_string(), value.to_string());
        true
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Iterate variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute variables in a string.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match placeholder_name(after) {
                Some(name) => {
                    match self.vars.get(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Substitute variables in a list of strings.
    pub fn substitute_all(&self, templates: &[String]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }

    /// Placeholders in `template` that this context cannot resolve, in order
    /// of first appearance.
    pub fn unresolved(&self, template: &str) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in placeholders(template) {
            if !self.vars.contains_key(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

/// All `{name}` placeholders in `text`, in order.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match placeholder_name(after) {
            Some(name) => {
                found.push(name);
                rest = &after[name.len() + 1..];
            }
            None => rest = after,
        }
    }
    found
}

/// If `s` starts with `name}` where name is `[A-Za-z0-9_]+`, return name.
fn placeholder_name(s: &str) -> Option<&str> {
    let end = s.find('}')?;
    let name = &s[..end];
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}
