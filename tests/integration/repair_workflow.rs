//! Item lifecycle and repair across a whole repository

use super::test_utils::TestRepo;
use hotbox::repair::{repair_folder, repair_repository};
use hotbox::repository::Manager;
use hotbox::store::NAME_SIDECAR;
use hotbox::types::Section;
use std::fs;

#[test]
fn test_create_edit_remove_lifecycle() {
    let fixture = TestRepo::new();
    let manager = Manager::new(&fixture.store);
    let folder = fixture.repo.class_path(Section::Single, "No Selection");

    let first = manager.create_leaf_item(&folder, "first").unwrap();
    let second = manager.create_leaf_item(&folder, "second").unwrap();
    manager.create_leaf_item(&folder, "third").unwrap();
    manager
        .write_script(&first, "first", "print('hello')\n")
        .unwrap();

    manager.remove_item(&second).unwrap();

    assert_eq!(fixture.names_in(&folder), vec!["first", "third"]);
    let (name, body) = manager.read_script(&folder.join("001.py")).unwrap();
    assert_eq!(name.as_deref(), Some("first"));
    assert_eq!(body, "print('hello')\n");
}

#[test]
fn test_repair_heals_manual_edits_across_sections() {
    let fixture = TestRepo::new();

    // Simulate a hand-edited repository: gaps everywhere, one nested
    // submenu, one drifted rule folder.
    let blur = fixture.repo.class_path(Section::Single, "Blur");
    fixture.write_leaf(&blur, 4, "a", "pass\n");
    fixture.write_leaf(&blur, 9, "b", "pass\n");

    let all = fixture.repo.section_path(Section::All);
    fs::create_dir(all.join("006")).unwrap();
    fs::write(all.join("006").join(NAME_SIDECAR), "menu").unwrap();
    fixture.write_leaf(&all.join("006"), 7, "deep", "pass\n");

    let rule = fixture.repo.section_path(Section::Rules).join("my_rule");
    fs::create_dir_all(&rule).unwrap();
    fs::write(rule.join("_rule.py"), "ret = True\n").unwrap();
    fixture.write_leaf(&rule, 3, "ruled", "pass\n");

    repair_repository(&fixture.store, &fixture.repo).unwrap();

    assert_eq!(fixture.names_in(&blur), vec!["a", "b"]);
    assert!(blur.join("001.py").is_file());
    assert!(blur.join("002.py").is_file());

    // The submenu moved to 001 and its contents are dense too.
    assert!(all.join("001").is_dir());
    assert!(all.join("001").join("001.py").is_file());

    // The rule folder kept its name and its gating script.
    assert!(rule.join("_rule.py").is_file());
    assert!(rule.join("001.py").is_file());
}

#[test]
fn test_repair_is_idempotent() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.section_path(Section::All);
    fixture.write_leaf(&folder, 2, "x", "pass\n");
    fixture.write_leaf(&folder, 5, "y", "pass\n");

    repair_folder(&fixture.store, &folder).unwrap();
    let after_first = fixture.names_in(&folder);

    repair_folder(&fixture.store, &folder).unwrap();
    assert_eq!(fixture.names_in(&folder), after_first);
    assert_eq!(after_first, vec!["x", "y"]);
}

#[test]
fn test_duplicate_lands_at_next_free_ordinal() {
    let fixture = TestRepo::new();
    let manager = Manager::new(&fixture.store);
    let folder = fixture.repo.section_path(Section::Templates);

    let original = manager.create_leaf_item(&folder, "template").unwrap();
    manager.duplicate_item(&original).unwrap();

    assert_eq!(fixture.names_in(&folder), vec!["template", "template"]);
}
