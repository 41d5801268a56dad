//! Save → load round-trip tests over real files.

use padforge_mapping::{ForceEffectStyle, MappingConfig, PadOutput, StickZone};
use padforge_schemas::{
    DeviceCapabilities, DeviceClass, DeviceEntry, InstanceId, ProductGuid, UserSetting,
};
use padforge_settings::{Settings, SettingsError, LEGACY_FILE, PRIMARY_FILE};

fn sample_config() -> MappingConfig {
    let mut config = MappingConfig::default()
        .with_binding(PadOutput::A, "Button 0".parse().expect("descriptor"))
        .with_binding(PadOutput::B, "Button 1".parse().expect("descriptor"))
        .with_binding(PadOutput::LeftTrigger, "H Axis 2".parse().expect("descriptor"))
        .with_binding(PadOutput::LeftStickX, "Axis 0".parse().expect("descriptor"))
        .with_binding(PadOutput::LeftStickY, "I Axis 1".parse().expect("descriptor"))
        .with_binding(PadOutput::DPadUp, "POV 0 Up".parse().expect("descriptor"));
    config.left_stick = StickZone::new(20, 5);
    config.force.overall_gain = 80;
    config.force.swap_motors = true;
    config.force.effect_style = ForceEffectStyle::SinePeriodic;
    config
}

fn sample_settings() -> Settings {
    let config = sample_config();
    let checksum = config.checksum();
    let instance = InstanceId::from_path("usb#2/port1", 0x046D, 0xC216);

    Settings {
        devices: vec![DeviceEntry {
            instance_id: instance.clone(),
            product_guid: ProductGuid::new(0x046D, 0xC216),
            name: "Dual Action".into(),
            vendor_id: 0x046D,
            product_id: 0xC216,
            class: DeviceClass::Gamepad,
            capabilities: DeviceCapabilities::new(4, 12).with_hats(1).with_rumble(),
            hidden: false,
            enabled: true,
        }],
        user_settings: vec![UserSetting {
            instance_id: instance,
            product_guid: ProductGuid::new(0x046D, 0xC216),
            slot: 0,
            map_checksum: checksum,
            enabled: true,
            sort_order: 1,
            created_at: "2024-11-02T10:00:00Z".into(),
            updated_at: "2025-01-15T18:30:00Z".into(),
        }],
        pad_settings: vec![config],
        app: Default::default(),
    }
}

#[test]
fn save_then_load_is_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = sample_settings();

    let path = settings.save(dir.path()).expect("save");
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(PRIMARY_FILE));

    let loaded = Settings::load_or_default(dir.path()).expect("load");
    assert_eq!(loaded, settings);

    // The checksum graph survives: the one user setting still resolves.
    assert!(loaded.validate_links().is_empty());
    assert_eq!(
        loaded.pad_settings[0].checksum(),
        settings.pad_settings[0].checksum()
    );
}

#[test]
fn second_save_overwrites_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = sample_settings();
    settings.save(dir.path()).expect("first save");

    settings.user_settings[0].slot = 2;
    settings.save(dir.path()).expect("second save");

    let loaded = Settings::load_or_default(dir.path()).expect("load");
    assert_eq!(loaded.user_settings[0].slot, 2);
    // No temp file left behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn legacy_file_name_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = sample_settings();
    settings.save(dir.path()).expect("save");
    std::fs::rename(dir.path().join(PRIMARY_FILE), dir.path().join(LEGACY_FILE))
        .expect("rename to legacy");

    let loaded = Settings::load_or_default(dir.path()).expect("load");
    assert_eq!(loaded, settings);
}

#[test]
fn primary_wins_over_legacy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut primary = sample_settings();
    primary.save(dir.path()).expect("save primary");
    std::fs::rename(dir.path().join(PRIMARY_FILE), dir.path().join(LEGACY_FILE))
        .expect("stash as legacy");

    primary.user_settings[0].slot = 3;
    primary.save(dir.path()).expect("save primary again");

    let loaded = Settings::load_or_default(dir.path()).expect("load");
    assert_eq!(loaded.user_settings[0].slot, 3);
}

#[test]
fn missing_files_mean_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = Settings::load_or_default(dir.path()).expect("load");
    assert_eq!(loaded, Settings::default());
}

#[test]
fn garbage_document_is_an_error_not_a_reset() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(PRIMARY_FILE), "<not really xml").expect("write");
    assert!(matches!(
        Settings::load_or_default(dir.path()),
        Err(SettingsError::Parse { .. })
    ));
}

#[test]
fn errors_classify_at_the_engine_level() {
    use padforge_errors::{ErrorSeverity, PadForgeError};

    let dangling: PadForgeError = SettingsError::DanglingChecksum {
        device: "a1b2".into(),
        checksum: 7,
    }
    .into();
    assert!(matches!(dangling, PadForgeError::Config(_)));
    assert_eq!(dangling.severity(), ErrorSeverity::Warning);

    let io: PadForgeError = SettingsError::Io {
        path: std::path::PathBuf::from("PadForge.xml"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
    }
    .into();
    assert!(matches!(io, PadForgeError::Io(_)));
}

#[test]
fn dangling_checksums_are_reported() {
    let mut settings = sample_settings();
    settings.user_settings[0].map_checksum = 0xDEAD_BEEF;
    let problems = settings.validate_links();
    assert_eq!(problems.len(), 1);
    assert!(matches!(
        problems[0],
        SettingsError::DanglingChecksum { checksum: 0xDEAD_BEEF, .. }
    ));
}

#[test]
fn intern_config_deduplicates_by_content() {
    let mut settings = Settings::default();
    let first = settings.intern_config(sample_config());
    let second = settings.intern_config(sample_config());
    assert_eq!(first, second);
    assert_eq!(settings.pad_settings.len(), 1);

    let mut different = sample_config();
    different.right_stick = StickZone::new(9, 0);
    let third = settings.intern_config(different);
    assert_ne!(third, first);
    assert_eq!(settings.pad_settings.len(), 2);
}

#[test]
fn unknown_binding_text_degrades_to_unbound() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = sample_settings();
    settings.save(dir.path()).expect("save");

    // Corrupt one binding's text in place.
    let path = dir.path().join(PRIMARY_FILE);
    let text = std::fs::read_to_string(&path).expect("read");
    let corrupted = text.replace("Button 1", "Knob 7");
    std::fs::write(&path, corrupted).expect("write");

    let loaded = Settings::load_or_default(dir.path()).expect("load");
    let config = &loaded.pad_settings[0];
    assert!(config.descriptors.get(PadOutput::B).is_none());
    // The neighbours survive.
    assert!(config.descriptors.get(PadOutput::A).is_some());
    assert!(config.descriptors.get(PadOutput::LeftTrigger).is_some());
}
