//! Metadata generation over a real asset directory and the shipped template.

mod common;

use std::collections::BTreeSet;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use reelsmith::assemble::assign_scenes;
use reelsmith::library::load_assets;
use reelsmith::metadata::{generate, MetadataInput, MetadataRecord, MetadataTemplate};
use reelsmith::pipeline;
use reelsmith_common::{Asset, Error, License, LicensedAsset, MediaKind};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()
}

fn soundtrack(dir: &std::path::Path) -> LicensedAsset {
    let path = dir.join("ambient-7.m4a");
    std::fs::write(&path, b"audio").unwrap();
    Asset::new(&path, "generated", License::Cc0, "Reelsmith", MediaKind::Audio)
        .with_title("Ambient pad in D minor (seed 7)")
        .with_duration(30.0)
        .into_licensed(&Default::default())
        .unwrap()
}

#[test]
fn test_metadata_is_byte_identical_across_runs() {
    let root = tempfile::tempdir().unwrap();
    let config = common::config_in(root.path());
    let dir = common::complete_asset_dir(&config, "2025-08-22");
    common::five_cc0_clips(&dir);

    let first = root.path().join("a/metadata.json");
    let second = root.path().join("b/metadata.json");
    for output in [&first, &second] {
        let plan = pipeline::plan_run(&config, Some(&dir), None).unwrap_err();
        // No soundtrack on disk and no tools to generate one.
        assert_matches!(plan, Error::Configuration(_));

        let mut quiet = config.clone();
        quiet.audio.enabled = false;
        let plan = pipeline::plan_run(&quiet, Some(&dir), None).unwrap();
        pipeline::write_metadata(&quiet, &plan, date(), output).unwrap();
    }

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_credits_are_exactly_the_used_assets() {
    let root = tempfile::tempdir().unwrap();
    let config = common::config_in(root.path());
    let dir = common::complete_asset_dir(&config, "2025-08-22");
    common::five_cc0_clips(&dir);
    // Spare clip that the plan does not need.
    common::write_asset(&dir, "spare.mp4", License::CcBy, MediaKind::Video, Some(30.0));

    let library = load_assets(&dir, &config.fetch.licenses).unwrap();
    let assignments = assign_scenes(&config.scenes, &library).unwrap();
    let track = soundtrack(root.path());
    let template = MetadataTemplate::load(&config.template_path()).unwrap();

    let record = generate(&MetadataInput {
        template: &template,
        assignments: &assignments,
        soundtrack: Some(&track),
        vars: &config.metadata.vars,
        locale_vars: &config.metadata.locale_vars,
        date: date(),
    })
    .unwrap();

    let expected: BTreeSet<String> = assignments
        .iter()
        .map(|a| a.asset.attribution())
        .chain([track.attribution()])
        .collect();
    let found: BTreeSet<String> = record.credits.iter().cloned().collect();
    assert_eq!(found, expected);
    assert_eq!(record.credits.len(), assignments.len() + 1);

    for line in &record.credits {
        assert!(record.description.contains(line.as_str()));
    }
    let unused = library.visual("spare.mp4").unwrap().attribution();
    if !assignments.iter().any(|a| a.asset.file_name() == "spare.mp4") {
        assert!(!record.credits.contains(&unused));
    }
}

#[test]
fn test_shipped_template_renders_every_locale() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::config_in(root.path());
    config
        .metadata
        .locale_vars
        .entry("pt".into())
        .or_default()
        .insert("location".into(), "Jericoacoara".into());
    let dir = common::complete_asset_dir(&config, "run");
    common::five_cc0_clips(&dir);
    config.audio.enabled = false;

    let plan = pipeline::plan_run(&config, Some(&dir), None).unwrap();
    let output = root.path().join("metadata.json");
    let record = pipeline::write_metadata(&config, &plan, date(), &output).unwrap();

    assert_eq!(record.locale, "en");
    assert_eq!(record.scheduled_date, date());
    assert_eq!(record.chapters.len(), 5);
    assert_eq!(record.chapters[0].start, "0:00");
    assert_eq!(record.chapters[4].start, "0:24");
    assert!(record.title.contains("Ceará"));
    assert!(record.title.contains("27s"));
    assert!(!record.title.contains('{'));

    let pt = &record.locales["pt"];
    assert!(pt.title.contains("Jericoacoara"));
    assert!(pt.tags.iter().any(|t| t == "Jericoacoara"));
    assert_eq!(record.tags.iter().filter(|t| t.eq_ignore_ascii_case("drone")).count(), 1);

    let read_back = MetadataRecord::read(&output).unwrap();
    assert_eq!(read_back, record);
}

#[test]
fn test_unresolved_title_is_a_configuration_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::config_in(root.path());
    config.audio.enabled = false;
    let template_path = root.path().join("template.json");
    std::fs::write(
        &template_path,
        r#"{"default_locale": "en", "locales": {"en": {"title": "{sponsor} presents"}}}"#,
    )
    .unwrap();
    config.metadata.template = Some(template_path);

    let dir = common::complete_asset_dir(&config, "run");
    common::five_cc0_clips(&dir);
    let plan = pipeline::plan_run(&config, Some(&dir), None).unwrap();

    let output = root.path().join("metadata.json");
    let err = pipeline::write_metadata(&config, &plan, date(), &output).unwrap_err();
    assert_matches!(err, Error::Configuration(ref msg) if msg.contains("sponsor"));
    assert!(!output.exists());
}

#[test]
fn test_missing_template_is_a_configuration_error() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::config_in(root.path());
    config.audio.enabled = false;
    config.metadata.template = Some(root.path().join("nope.json"));

    let dir = common::complete_asset_dir(&config, "run");
    common::five_cc0_clips(&dir);
    let plan = pipeline::plan_run(&config, Some(&dir), None).unwrap();

    let err = pipeline::write_metadata(&config, &plan, date(), &root.path().join("m.json"))
        .unwrap_err();
    assert_matches!(err, Error::Configuration(_));
}
