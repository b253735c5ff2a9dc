//! Drag-and-drop reordering inside a live repository

use super::test_utils::TestRepo;
use hotbox::reorder::{classify_drop, execute_move, plan_drop, DragZoneConfig, DropZone};
use hotbox::store::OrdinalStore;
use hotbox::types::{Item, Ordinal, Section};
use std::path::Path;

fn item_at(store: &OrdinalStore, folder: &Path, ordinal: u32) -> Item {
    store
        .list_ordered(folder)
        .into_iter()
        .find(|item| item.ordinal.get() == ordinal)
        .unwrap()
}

#[test]
fn test_drag_through_classified_zone() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.class_path(Section::Single, "Blur");
    for (ordinal, name) in [(1, "a"), (2, "b"), (3, "c")] {
        fixture.write_leaf(&folder, ordinal, name, "pass\n");
    }

    // The cursor sits in the lower half of item 1's slot: drop below it.
    let zones = DragZoneConfig::default();
    let zone = classify_drop(0.8, false, &zones);
    assert_eq!(zone, DropZone::Below);

    let dragged = item_at(&fixture.store, &folder, 3);
    let target = item_at(&fixture.store, &folder, 1);
    let placement = plan_drop(&dragged, &target, zone).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();

    assert_eq!(fixture.names_in(&folder), vec!["a", "c", "b"]);
}

#[test]
fn test_drag_into_submenu_and_back_out() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.section_path(Section::All);
    fixture.write_leaf(&folder, 1, "loose", "pass\n");
    let submenu = fixture
        .store
        .create_submenu(&folder, Ordinal::new(2).unwrap(), "Menu")
        .unwrap();
    fixture.write_leaf(&submenu, 1, "kept", "pass\n");

    // Into the submenu.
    let dragged = item_at(&fixture.store, &folder, 1);
    let target = item_at(&fixture.store, &folder, 2);
    let placement = plan_drop(&dragged, &target, DropZone::Into).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();

    let submenu = folder.join("001");
    assert_eq!(fixture.names_in(&folder), vec!["Menu"]);
    assert_eq!(fixture.names_in(&submenu), vec!["loose", "kept"]);

    // And back out, above the submenu.
    let dragged = item_at(&fixture.store, &submenu, 1);
    let target = item_at(&fixture.store, &folder, 1);
    let placement = plan_drop(&dragged, &target, DropZone::Above).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();

    assert_eq!(fixture.names_in(&folder), vec!["loose", "Menu"]);
    assert_eq!(fixture.names_in(&folder.join("002")), vec!["kept"]);
}

#[test]
fn test_move_then_inverse_move_restores_order() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.section_path(Section::Templates);
    for (ordinal, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
        fixture.write_leaf(&folder, ordinal, name, "pass\n");
    }

    let dragged = item_at(&fixture.store, &folder, 2);
    let target = item_at(&fixture.store, &folder, 4);
    let placement = plan_drop(&dragged, &target, DropZone::Below).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();
    assert_eq!(fixture.names_in(&folder), vec!["a", "c", "d", "b"]);

    let dragged = item_at(&fixture.store, &folder, 4);
    let target = item_at(&fixture.store, &folder, 2);
    let placement = plan_drop(&dragged, &target, DropZone::Above).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();
    assert_eq!(fixture.names_in(&folder), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_reorder_scope_repairs_sibling_submenus_too() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.section_path(Section::All);
    fixture.write_leaf(&folder, 1, "a", "pass\n");
    fixture.write_leaf(&folder, 2, "b", "pass\n");
    let submenu = fixture
        .store
        .create_submenu(&folder, Ordinal::new(3).unwrap(), "Menu")
        .unwrap();
    // Nested drift that the reorder pass should heal along the way.
    fixture.write_leaf(&submenu, 5, "deep", "pass\n");

    let dragged = item_at(&fixture.store, &folder, 1);
    let target = item_at(&fixture.store, &folder, 2);
    let placement = plan_drop(&dragged, &target, DropZone::Below).unwrap();
    execute_move(&fixture.store, &folder, &dragged, &placement).unwrap();

    assert_eq!(fixture.names_in(&folder), vec!["b", "a", "Menu"]);
    assert!(folder.join("003").join("001.py").is_file());
}
