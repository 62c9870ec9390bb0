//! Integration tests for upgrade-path resolution
//!
//! Exercises the resolver end to end:
//! - Built-in manifest under full-matrix and family-targeted runs
//! - Local source substitution of the indev destination
//! - Operator override manifests loaded from YAML files
//! - Environment-driven configuration feeding the resolver
//! - Fail-fast behaviour for malformed descriptors and duplicate names

use dtest_core::config::{
    HarnessConfig, ENV_CASSANDRA_DIR, ENV_CASSANDRA_GITREF, ENV_CASSANDRA_VERSION,
    ENV_RUN_STATIC_UPGRADE_MATRIX, ENV_UPGRADE_OVERRIDE_MANIFEST,
};
use dtest_core::errors::HarnessError;
use dtest_core::upgrade::{
    build_upgrade_pairs, Manifest, OverrideManifestFile, PathBuilder, ResolverOptions, UpgradePath, Variant,
    VersionCatalog, VersionMeta,
};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

// ==================== Test Helper Functions ====================

fn names(paths: &[UpgradePath]) -> Vec<&str> {
    paths.iter().map(|p| p.name.as_str()).collect()
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn meta(name: &str, family: &str, variant: Variant, version: &str, min: u8, max: u8) -> VersionMeta {
    VersionMeta::new(name, family, variant, version, min, max)
}

// ==================== Built-in Manifest ====================

/// Test: Full matrix emits every defined, protocol-compatible current->indev pair
#[test]
fn test_full_matrix_over_builtin_manifest() {
    let paths = build_upgrade_pairs(ResolverOptions::full_matrix()).unwrap();

    assert_eq!(
        names(&paths),
        vec![
            "Upgrade_current_2_0_x_To_indev_2_1_x",
            "Upgrade_current_2_1_x_To_indev_2_1_x",
            "Upgrade_current_2_1_x_To_indev_2_2_x",
            "Upgrade_current_2_1_x_To_indev_3_0_x",
            "Upgrade_current_2_1_x_To_indev_3_x",
            "Upgrade_current_2_1_x_To_head_trunk",
            "Upgrade_current_2_2_x_To_indev_2_2_x",
            "Upgrade_current_2_2_x_To_indev_3_0_x",
            "Upgrade_current_2_2_x_To_indev_3_x",
            "Upgrade_current_2_2_x_To_head_trunk",
            "Upgrade_current_3_0_x_To_indev_3_0_x",
            "Upgrade_current_3_0_x_To_indev_3_x",
            "Upgrade_current_3_0_x_To_head_trunk",
            "Upgrade_current_3_x_To_indev_3_x",
            "Upgrade_current_3_x_To_head_trunk",
        ]
    );

    // No substitution: selectors come straight from the catalog
    let first = &paths[0];
    assert_eq!(first.starting_version, "2.0.17");
    assert_eq!(first.upgrade_version, "git:cassandra-2.1");
}

/// Test: Summary accounts for every candidate in the built-in manifest
#[test]
fn test_full_matrix_summary() {
    let builder = PathBuilder::with_builtin(ResolverOptions::full_matrix()).unwrap();
    let (paths, summary) = builder.build_with_summary().unwrap();

    assert_eq!(summary.candidates, 41);
    assert_eq!(summary.emitted, paths.len());
    assert_eq!(summary.undefined, 3);
    assert_eq!(summary.protocol_mismatch, 0);
    assert_eq!(
        summary.candidates,
        summary.emitted + summary.undefined + summary.untargeted + summary.protocol_mismatch
    );
}

/// Test: Targeted run keeps only the local family and points it at the local ref
#[test]
fn test_targeted_3_0_run_substitutes_local_ref() {
    let paths = build_upgrade_pairs(ResolverOptions::targeted("3.0.x", "git:deadbeef")).unwrap();

    assert_eq!(
        names(&paths),
        vec![
            "Upgrade_current_2_1_x_To_indev_3_0_x",
            "Upgrade_current_2_2_x_To_indev_3_0_x",
            "Upgrade_current_3_0_x_To_indev_3_0_x",
        ]
    );

    let catalog = VersionCatalog::builtin();
    for path in &paths {
        assert_eq!(path.upgrade_version, "git:deadbeef");

        // Only the version selector changes; variant, family and protocol range stay
        let catalog_dest = catalog.slot(&path.upgrade_meta.name).unwrap().unwrap();
        assert_eq!(path.upgrade_meta, catalog_dest.clone_with_local_version("git:deadbeef"));

        let catalog_origin = catalog.slot(&path.starting_meta.name).unwrap().unwrap();
        assert_eq!(&path.starting_meta, catalog_origin);
        assert_eq!(path.starting_version, catalog_origin.version);
    }
}

/// Test: A 3.x build upgrades from every current line that reaches 3.x
#[test]
fn test_targeted_3_x_run() {
    let paths = build_upgrade_pairs(ResolverOptions::targeted("3.x", "git:cafe")).unwrap();

    assert_eq!(
        names(&paths),
        vec![
            "Upgrade_current_2_1_x_To_indev_3_x",
            "Upgrade_current_2_2_x_To_indev_3_x",
            "Upgrade_current_3_0_x_To_indev_3_x",
            "Upgrade_current_3_x_To_indev_3_x",
        ]
    );
}

/// Test: Unknown local family yields no paths and needs no local ref
#[test]
fn test_unknown_family_yields_nothing() {
    let options = ResolverOptions {
        local_family: "unknown".to_string(),
        ..ResolverOptions::default()
    };
    assert!(build_upgrade_pairs(options).unwrap().is_empty());
}

/// Test: Missing local ref aborts a run that needs substitution
#[test]
fn test_missing_local_ref_fails() {
    let options = ResolverOptions {
        local_family: "2.2.x".to_string(),
        ..ResolverOptions::default()
    };
    assert!(matches!(
        build_upgrade_pairs(options),
        Err(HarnessError::MissingLocalRef(_))
    ));
}

/// Test: Resolution is deterministic across calls
#[test]
fn test_repeated_resolution_is_identical() {
    let first = build_upgrade_pairs(ResolverOptions::full_matrix()).unwrap();
    let second = build_upgrade_pairs(ResolverOptions::full_matrix()).unwrap();
    assert_eq!(first, second);
}

// ==================== Custom Manifests ====================

/// Test: Protocol filter rejects destinations the origin cannot talk to
#[test]
fn test_protocol_incompatible_pair_is_dropped() {
    let manifest = Manifest::new().with_entry(
        Some(meta("old", "X", Variant::Current, "1.2.19", 1, 2)),
        vec![
            Some(meta("near", "X", Variant::Indev, "git:near", 2, 3)),
            Some(meta("far", "X", Variant::Indev, "git:far", 3, 4)),
        ],
    );

    let builder = PathBuilder::new(manifest, ResolverOptions::full_matrix());
    let (paths, summary) = builder.build_with_summary().unwrap();

    assert_eq!(names(&paths), vec!["Upgrade_old_To_near"]);
    assert_eq!(summary.protocol_mismatch, 1);
}

/// Test: Malformed descriptor aborts the whole run
#[test]
fn test_malformed_descriptor_fails_fast() {
    let manifest = Manifest::new().with_entry(
        Some(meta("a", "X", Variant::Current, "1.0", 1, 2)),
        vec![
            Some(meta("b", "X", Variant::Indev, "git:b", 1, 2)),
            Some(meta("c", "", Variant::Indev, "git:c", 1, 2)),
        ],
    );

    let result = PathBuilder::new(manifest, ResolverOptions::full_matrix()).build_upgrade_pairs();
    assert!(matches!(result, Err(HarnessError::MalformedManifest(_))));
}

/// Test: Two accepted pairs with the same name abort the run
#[test]
fn test_duplicate_path_name_fails_fast() {
    let origin = meta("a", "X", Variant::Current, "1.0", 1, 2);
    let manifest = Manifest::new()
        .with_entry(Some(origin.clone()), vec![Some(meta("b", "X", Variant::Indev, "git:b", 1, 2))])
        .with_entry(Some(origin), vec![Some(meta("b", "X", Variant::Indev, "git:b2", 1, 2))]);

    let result = PathBuilder::new(manifest, ResolverOptions::full_matrix()).build_upgrade_pairs();
    assert!(matches!(result, Err(HarnessError::DuplicateUpgradePath(name)) if name == "Upgrade_a_To_b"));
}

// ==================== Override Manifest Files ====================

/// Test: Override file replaces the built-in manifest and disables substitution
#[test]
fn test_override_file_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("override.yaml");
    fs::write(
        &path,
        r#"
versions:
  - name: local_4_0
    family: "4.0.x"
    variant: indev
    version: "git:cassandra-4.0"
    min_proto_v: 3
    max_proto_v: 5
upgrades:
  - from: current_3_x
    to: [local_4_0, current_3_0_x]
  - from: indev_3_x
    to: [current_3_x]
  - from: indev_2_0_x
    to: [local_4_0]
"#,
    )
    .unwrap();

    let manifest = OverrideManifestFile::load(&path)
        .unwrap()
        .into_manifest(VersionCatalog::builtin())
        .unwrap();

    // Family and ref are ignored once an override is active
    let options = ResolverOptions::targeted("2.1.x", "git:ignored").with_override(manifest);
    let paths = build_upgrade_pairs(options).unwrap();

    assert_eq!(
        names(&paths),
        vec![
            "Upgrade_current_3_x_To_local_4_0",
            "Upgrade_current_3_x_To_current_3_0_x",
            "Upgrade_indev_3_x_To_current_3_x",
        ]
    );
    assert_eq!(paths[0].upgrade_version, "git:cassandra-4.0");
    assert_eq!(paths[2].starting_version, "git:cassandra-3.7");
}

/// Test: Override naming an unknown slot is rejected
#[test]
fn test_override_with_unknown_slot_fails() {
    let file = OverrideManifestFile::parse("upgrades:\n  - from: current_3_x\n    to: [next_3_x]\n").unwrap();
    assert!(matches!(
        file.into_manifest(VersionCatalog::builtin()),
        Err(HarnessError::MalformedManifest(_))
    ));
}

/// Test: An override file with no upgrades behaves like no override
#[test]
fn test_empty_override_file_falls_back_to_builtin() {
    let manifest = OverrideManifestFile::parse("upgrades: []\n")
        .unwrap()
        .into_manifest(VersionCatalog::builtin())
        .unwrap();
    assert!(manifest.is_empty());

    let with_empty = build_upgrade_pairs(ResolverOptions::targeted("3.x", "git:x").with_override(manifest)).unwrap();
    let without = build_upgrade_pairs(ResolverOptions::targeted("3.x", "git:x")).unwrap();
    assert_eq!(with_empty, without);
}

/// Test: Invalid YAML surfaces as a parse error
#[test]
fn test_override_invalid_yaml() {
    let result = OverrideManifestFile::parse("upgrades: [from: {");
    assert!(matches!(result, Err(HarnessError::ParseError(_))));

    let unsupported_variant = r#"
versions:
  - name: future
    family: "4.0.x"
    variant: next
    version: "git:trunk"
    min_proto_v: 3
    max_proto_v: 5
"#;
    assert!(matches!(
        OverrideManifestFile::parse(unsupported_variant),
        Err(HarnessError::ParseError(_))
    ));
}

// ==================== Environment Configuration ====================

/// Test: Environment with an explicit version and ref drives a targeted run
#[test]
fn test_config_targeted_run() {
    let config = HarnessConfig::from_lookup(lookup_from(&[
        (ENV_CASSANDRA_VERSION, "2.2.6"),
        (ENV_CASSANDRA_GITREF, "git:0123abc"),
    ]))
    .unwrap();
    config.validate().unwrap();

    let paths = build_upgrade_pairs(config.resolver_options().unwrap()).unwrap();
    assert_eq!(
        names(&paths),
        vec!["Upgrade_current_2_1_x_To_indev_2_2_x", "Upgrade_current_2_2_x_To_indev_2_2_x"]
    );
    assert!(paths.iter().all(|p| p.upgrade_version == "git:0123abc"));
}

/// Test: Version read from the source tree's build.xml
#[test]
fn test_config_reads_build_xml() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("build.xml"),
        r#"<project name="apache-cassandra">
    <property name="base.version" value="2.1.15"/>
</project>"#,
    )
    .unwrap();
    let dir = temp_dir.path().to_string_lossy().to_string();

    let config = HarnessConfig::from_lookup(lookup_from(&[
        (ENV_CASSANDRA_DIR, dir.as_str()),
        (ENV_CASSANDRA_GITREF, "git:feed"),
    ]))
    .unwrap();

    let paths = build_upgrade_pairs(config.resolver_options().unwrap()).unwrap();
    assert_eq!(
        names(&paths),
        vec!["Upgrade_current_2_0_x_To_indev_2_1_x", "Upgrade_current_2_1_x_To_indev_2_1_x"]
    );
}

/// Test: Static matrix flag from the environment
#[test]
fn test_config_full_matrix_needs_no_ref() {
    let config = HarnessConfig::from_lookup(lookup_from(&[(ENV_RUN_STATIC_UPGRADE_MATRIX, "true")])).unwrap();
    config.validate().unwrap();

    let paths = build_upgrade_pairs(config.resolver_options().unwrap()).unwrap();
    assert_eq!(paths.len(), 15);
}

/// Test: Override manifest path from the environment
#[test]
fn test_config_override_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.yaml");
    fs::write(&path, "upgrades:\n  - from: current_3_0_x\n    to: [current_3_x]\n").unwrap();
    let path_str = path.to_string_lossy().to_string();

    let config = HarnessConfig::from_lookup(lookup_from(&[(ENV_UPGRADE_OVERRIDE_MANIFEST, path_str.as_str())])).unwrap();
    config.validate().unwrap();

    let paths = build_upgrade_pairs(config.resolver_options().unwrap()).unwrap();
    assert_eq!(names(&paths), vec!["Upgrade_current_3_0_x_To_current_3_x"]);
    assert_eq!(paths[0].upgrade_version, "3.5");
}

/// Test: An override file without upgrades does not excuse a missing local ref
#[test]
fn test_config_empty_override_without_ref_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.yaml");
    fs::write(&path, "upgrades: []\n").unwrap();
    let path_str = path.to_string_lossy().to_string();

    let config = HarnessConfig::from_lookup(lookup_from(&[
        (ENV_CASSANDRA_VERSION, "3.0.5"),
        (ENV_UPGRADE_OVERRIDE_MANIFEST, path_str.as_str()),
    ]))
    .unwrap();

    assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    assert!(matches!(
        build_upgrade_pairs(config.resolver_options().unwrap()),
        Err(HarnessError::MissingLocalRef(_))
    ));
}
