//! Archive export and merge between two populated repositories

use super::test_utils::TestRepo;
use hotbox::archive::{export, export_to_base64, import_from_base64, import_from_file, export_to_file};
use hotbox::types::{Ordinal, Section};
use std::fs;

#[test]
fn test_file_roundtrip_between_repositories() {
    let source = TestRepo::new();
    let blur = source.repo.class_path(Section::Single, "Blur");
    source.write_leaf(&blur, 1, "soften", "print('soften')\n");
    let submenu = source
        .store
        .create_submenu(&blur, Ordinal::new(2).unwrap(), "Extras")
        .unwrap();
    source.write_leaf(&submenu, 1, "edge", "pass\n");

    let archive_path = export_to_file(
        source.repo.root(),
        &source.temp_dir.path().join("backup"),
    )
    .unwrap();

    let dest = TestRepo::new();
    let report = import_from_file(&dest.store, &dest.repo, &archive_path).unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.created, 3);

    // Created in sorted logical path order: the submenu sorts before the
    // leaf, so the destination ordinals differ from the source's.
    let dest_blur = dest.repo.class_path(Section::Single, "Blur");
    assert_eq!(dest.names_in(&dest_blur), vec!["Extras", "soften"]);
    assert_eq!(dest.names_in(&dest_blur.join("001")), vec!["edge"]);
}

#[test]
fn test_merge_preserves_destination_items_and_order() {
    let source = TestRepo::new();
    let all = source.repo.section_path(Section::All);
    source.write_leaf(&all, 1, "shared", "print('v2')\n");
    source.write_leaf(&all, 2, "incoming", "pass\n");

    let dest = TestRepo::new();
    let dest_all = dest.repo.section_path(Section::All);
    dest.write_leaf(&dest_all, 1, "mine", "pass\n");
    dest.write_leaf(&dest_all, 2, "shared", "print('v1')\n");

    let armored = export_to_base64(source.repo.root()).unwrap();
    let report = import_from_base64(&dest.store, &dest.repo, &armored).unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 1);
    // Destination items keep their slots; only the new one is appended.
    assert_eq!(dest.names_in(&dest_all), vec!["mine", "shared", "incoming"]);
    assert!(fs::read_to_string(dest_all.join("002.py"))
        .unwrap()
        .contains("v2"));
}

#[test]
fn test_merge_reuses_existing_submenu_by_name() {
    let source = TestRepo::new();
    let all = source.repo.section_path(Section::All);
    let submenu = source
        .store
        .create_submenu(&all, Ordinal::FIRST, "Utilities")
        .unwrap();
    source.write_leaf(&submenu, 1, "incoming tool", "pass\n");

    let dest = TestRepo::new();
    let dest_all = dest.repo.section_path(Section::All);
    let dest_submenu = dest
        .store
        .create_submenu(&dest_all, Ordinal::FIRST, "Utilities")
        .unwrap();
    dest.write_leaf(&dest_submenu, 1, "existing tool", "pass\n");

    let bytes = export(source.repo.root()).unwrap();
    let archive_path = source.temp_dir.path().join("utils.hotbox");
    fs::write(&archive_path, bytes).unwrap();
    let report = import_from_file(&dest.store, &dest.repo, &archive_path).unwrap();

    // Only the leaf is new; the submenu matched by display name.
    assert_eq!(report.created, 1);
    assert_eq!(dest.names_in(&dest_all), vec!["Utilities"]);
    assert_eq!(
        dest.names_in(&dest_submenu),
        vec!["existing tool", "incoming tool"]
    );
}

#[test]
fn test_merge_is_idempotent() {
    let source = TestRepo::new();
    let rule_dir = source.repo.section_path(Section::Rules).join("deep");
    fs::create_dir_all(&rule_dir).unwrap();
    fs::write(rule_dir.join("_rule.py"), "ret = True\n").unwrap();
    source.write_leaf(&rule_dir, 1, "ruled", "pass\n");

    let armored = export_to_base64(source.repo.root()).unwrap();
    let dest = TestRepo::new();

    import_from_base64(&dest.store, &dest.repo, &armored).unwrap();
    let second = import_from_base64(&dest.store, &dest.repo, &armored).unwrap();

    assert_eq!(second.created, 0);
    let dest_rule = dest.repo.section_path(Section::Rules).join("deep");
    assert_eq!(dest.names_in(&dest_rule), vec!["ruled"]);
    assert_eq!(
        fs::read_to_string(dest_rule.join("_rule.py")).unwrap(),
        "ret = True\n"
    );
}
