//! Title, description, tags and chapters for a montage.
//!
//! The generator is a pure function of the template, the scene assignment,
//! the soundtrack, the configured variables and the run date. It reads no
//! clock and iterates only ordered maps, so identical inputs give
//! byte-identical `metadata.json`.
//!
//! Credits list exactly the assets in the assignment plus the soundtrack.

pub mod template;

pub use template::{LocaleTemplate, MetadataTemplate};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use reelsmith_av::TemplateContext;
use reelsmith_common::{Error, LicensedAsset, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assemble::matcher::{total_secs, SceneAssignment};

/// Variables the generator always defines.
pub const BUILTIN_VARS: &[&str] = &[
    "date",
    "scene_count",
    "duration",
    "music_track",
    "captions",
    "locale",
];

/// Separator of the `{captions}` variable.
const CAPTION_SEPARATOR: &str = " · ";

/// A chapter marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// `m:ss` (or `h:mm:ss`) timestamp.
    pub start: String,
    pub start_secs: f64,
    pub title: String,
}

/// One locale's rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleRecord {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Contents of `metadata.json`.
///
/// The top-level title, description and tags are the default locale's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub chapters: Vec<Chapter>,
    pub credits: Vec<String>,
    pub locale: String,
    pub scheduled_date: NaiveDate,
    pub duration_secs: f64,
    pub locales: BTreeMap<String, LocaleRecord>,
}

impl MetadataRecord {
    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write to `path` through a temporary sibling file.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, self.to_json()?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read a written record.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}

/// Everything the generator reads.
#[derive(Debug, Clone, Copy)]
pub struct MetadataInput<'a> {
    pub template: &'a MetadataTemplate,
    pub assignments: &'a [SceneAssignment],
    pub soundtrack: Option<&'a LicensedAsset>,
    /// `[metadata.vars]`.
    pub vars: &'a BTreeMap<String, String>,
    /// `[metadata.locale_vars.<code>]`.
    pub locale_vars: &'a BTreeMap<String, BTreeMap<String, String>>,
    pub date: NaiveDate,
}

/// Format seconds as a chapter timestamp.
///
/// ```
/// use reelsmith::metadata::format_timestamp;
///
/// assert_eq!(format_timestamp(0.0), "0:00");
/// assert_eq!(format_timestamp(74.6), "1:14");
/// assert_eq!(format_timestamp(3725.0), "1:02:05");
/// ```
pub fn format_timestamp(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Seconds without a trailing `.0` for whole numbers.
fn format_secs(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        format!("{secs:.1}")
    }
}

/// Sorted, deduplicated credit lines for the used assets and soundtrack.
pub fn credits_for(
    assignments: &[SceneAssignment],
    soundtrack: Option<&LicensedAsset>,
) -> Vec<String> {
    let lines: BTreeSet<String> = assignments
        .iter()
        .map(|a| a.asset.attribution())
        .chain(soundtrack.map(|s| s.attribution()))
        .collect();
    lines.into_iter().collect()
}

/// Chapter markers from the assigned durations.
pub fn chapters_for(assignments: &[SceneAssignment]) -> Vec<Chapter> {
    let mut start = 0.0;
    assignments
        .iter()
        .map(|a| {
            let title = if a.scene.caption.trim().is_empty() {
                format!("Scene {}", a.index + 1)
            } else {
                a.scene.caption.trim().to_string()
            };
            let chapter = Chapter {
                start: format_timestamp(start),
                start_secs: start,
                title,
            };
            start += a.duration_secs;
            chapter
        })
        .collect()
}

fn music_track_name(soundtrack: Option<&LicensedAsset>) -> String {
    match soundtrack {
        Some(track) => track.title.clone().unwrap_or_else(|| track.file_name()),
        None => "none".to_string(),
    }
}

/// Build the variable context for one locale.
fn context_for(input: &MetadataInput<'_>, code: &str, locale: &LocaleTemplate) -> TemplateContext {
    let mut ctx = TemplateContext::new();

    let captions: Vec<&str> = input
        .assignments
        .iter()
        .map(|a| a.scene.caption.trim())
        .filter(|c| !c.is_empty())
        .collect();
    ctx.set("date", &input.date.to_string());
    ctx.set("scene_count", &input.assignments.len().to_string());
    ctx.set("duration", &format_secs(total_secs(input.assignments)));
    ctx.set("music_track", &music_track_name(input.soundtrack));
    ctx.set("captions", &captions.join(CAPTION_SEPARATOR));
    ctx.set("locale", code);
    for a in input.assignments {
        ctx.set(&format!("caption_{}", a.index + 1), a.scene.caption.trim());
    }

    let layers = [
        input.locale_vars.get(code),
        Some(input.vars),
        Some(&locale.vars),
    ];
    for vars in layers.into_iter().flatten() {
        for (key, value) in vars {
            if !ctx.set_if_absent(key, value) && is_builtin(key) {
                warn!(var = %key, "Ignoring override of built-in template variable");
            }
        }
    }
    ctx
}

fn is_builtin(key: &str) -> bool {
    BUILTIN_VARS.contains(&key)
        || key
            .strip_prefix("caption_")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Tags in order of first appearance, without case-insensitive duplicates.
fn dedup_tags<'a>(tags: impl IntoIterator<Item = &'a String>, ctx: &TemplateContext) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|t| ctx.substitute(t).trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn render_description(body: &str, chapters: &[Chapter], credits: &[String]) -> String {
    let mut out = body.trim_end().to_string();
    let mut push_block = |lines: Vec<String>| {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&lines.join("\n"));
    };
    if !chapters.is_empty() {
        push_block(
            chapters
                .iter()
                .map(|c| format!("{} {}", c.start, c.title))
                .collect(),
        );
    }
    if !credits.is_empty() {
        let mut lines = vec!["Credits:".to_string()];
        lines.extend(credits.iter().cloned());
        push_block(lines);
    }
    out
}

/// Render the record for every locale in the template.
///
/// # Errors
///
/// [`Error::Configuration`] when a title keeps an unresolved placeholder.
/// Unresolved placeholders in a description are only logged.
pub fn generate(input: &MetadataInput<'_>) -> Result<MetadataRecord> {
    let chapters = chapters_for(input.assignments);
    let credits = credits_for(input.assignments, input.soundtrack);
    let mut locales = BTreeMap::new();

    for (code, locale) in &input.template.locales {
        let ctx = context_for(input, code, locale);

        let missing = ctx.unresolved(&locale.title);
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "title for locale {code:?} has unresolved placeholders: {}",
                missing.join(", ")
            )));
        }
        let missing = ctx.unresolved(&locale.description);
        if !missing.is_empty() {
            warn!(locale = %code, missing = %missing.join(", "), "Description has unresolved placeholders");
        }

        let record = LocaleRecord {
            title: ctx.substitute(&locale.title).trim().to_string(),
            description: render_description(&ctx.substitute(&locale.description), &chapters, &credits),
            tags: dedup_tags(input.template.tags.iter().chain(&locale.tags), &ctx),
        };
        debug!(locale = %code, title = %record.title, "Rendered metadata");
        locales.insert(code.clone(), record);
    }

    let default = locales
        .get(&input.template.default_locale)
        .cloned()
        .ok_or_else(|| Error::configuration("default locale missing from template"))?;

    Ok(MetadataRecord {
        title: default.title,
        description: default.description,
        tags: default.tags,
        chapters,
        credits,
        locale: input.template.default_locale.clone(),
        scheduled_date: input.date,
        duration_secs: total_secs(input.assignments),
        locales,
    })
}
