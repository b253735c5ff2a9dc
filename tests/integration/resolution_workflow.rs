//! End-to-end resolution: config, repositories, rules and layout

use super::test_utils::TestRepo;
use hotbox::repository::Repository;
use hotbox::resolve::{LayoutConfig, MenuHalf, Resolver};
use hotbox::rules::ScriptFailure;
use hotbox::store::OrdinalStore;
use hotbox::types::{SelectedNode, Selection, Section};
use std::fs;

fn no_rules(_: &str, _: &Selection) -> Result<bool, ScriptFailure> {
    Ok(false)
}

fn flatten(store: &OrdinalStore, half: &MenuHalf) -> Vec<String> {
    half.rows
        .iter()
        .flat_map(|row| row.iter())
        .map(|resolved| store.display_name(&resolved.item.path).unwrap())
        .collect()
}

#[test]
fn test_empty_selection_resolves_no_selection_folder() {
    let fixture = TestRepo::new();
    let folder = fixture.repo.class_path(Section::Single, "No Selection");
    fixture.write_leaf(&folder, 1, "idle", "pass\n");

    let layout = LayoutConfig::default();
    let resolver = Resolver::new(&fixture.store, &no_rules, &layout);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &Selection::empty());

    assert_eq!(flatten(&fixture.store, &menu.contextual), vec!["idle"]);
}

#[test]
fn test_group_name_variant_widens_the_match() {
    let fixture = TestRepo::new();
    let generic = fixture.repo.class_path(Section::Single, "Group");
    fixture.write_leaf(&generic, 1, "any group", "pass\n");
    let named = fixture.repo.class_path(Section::Single, "LightRig");
    fixture.write_leaf(&named, 1, "rig tools", "pass\n");

    let layout = LayoutConfig {
        side_insertion: false,
        ..LayoutConfig::default()
    };
    let resolver = Resolver::new(&fixture.store, &no_rules, &layout);

    let selection = Selection::of(vec![SelectedNode::new("Group", "LightRig3")]);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &selection);
    assert_eq!(
        flatten(&fixture.store, &menu.contextual),
        vec!["any group", "rig tools"]
    );

    // A generically named group only hits the generic folder.
    let selection = Selection::of(vec![SelectedNode::new("Group", "Group7")]);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &selection);
    assert_eq!(
        flatten(&fixture.store, &menu.contextual),
        vec!["any group"]
    );
}

#[test]
fn test_rule_gates_on_live_selection() {
    let fixture = TestRepo::new();
    let rule_dir = fixture.repo.section_path(Section::Rules).join("blur_only");
    fs::create_dir_all(&rule_dir).unwrap();
    fs::write(rule_dir.join("_rule.py"), "ret = has_blur\n").unwrap();
    fixture.write_leaf(&rule_dir, 1, "blur extras", "pass\n");

    // A runner that inspects the selection, standing in for the host
    // interpreter.
    let runner = |_: &str, selection: &Selection| -> Result<bool, ScriptFailure> {
        Ok(selection.nodes.iter().any(|node| node.class == "Blur"))
    };

    let layout = LayoutConfig::default();
    let resolver = Resolver::new(&fixture.store, &runner, &layout);

    let selection = Selection::of(vec![SelectedNode::new("Blur", "Blur1")]);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &selection);
    assert_eq!(
        flatten(&fixture.store, &menu.contextual),
        vec!["blur extras"]
    );

    let selection = Selection::of(vec![SelectedNode::new("Merge", "Merge1")]);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &selection);
    assert!(flatten(&fixture.store, &menu.contextual).is_empty());
}

#[test]
fn test_extra_repositories_contribute_in_configured_order() {
    let fixture = TestRepo::new();
    let studio = Repository::named("studio", fixture.temp_dir.path().join("studio"));
    studio.ensure_layout().unwrap();

    let local_blur = fixture.repo.class_path(Section::Single, "Blur");
    fixture.write_leaf(&local_blur, 1, "mine", "pass\n");
    let studio_blur = studio.class_path(Section::Single, "Blur");
    fixture.write_leaf(&studio_blur, 1, "shared", "pass\n");

    let layout = LayoutConfig {
        side_insertion: false,
        ..LayoutConfig::default()
    };
    let resolver = Resolver::new(&fixture.store, &no_rules, &layout);
    let selection = Selection::of(vec![SelectedNode::new("Blur", "Blur1")]);
    let menu = resolver.resolve(&[fixture.repo.clone(), studio], &selection);

    assert_eq!(
        flatten(&fixture.store, &menu.contextual),
        vec!["mine", "shared"]
    );
    let row = &menu.contextual.rows[0];
    assert_eq!(row[0].repository, None);
    assert_eq!(row[1].repository.as_deref(), Some("studio"));
}

#[test]
fn test_broken_rule_never_hides_the_rest_of_the_menu() {
    let fixture = TestRepo::new();

    let broken = fixture.repo.section_path(Section::Rules).join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("_rule.py"), "ret = undefined_name\n").unwrap();
    fixture.write_leaf(&broken, 1, "never shown", "pass\n");

    let folder = fixture.repo.class_path(Section::Single, "Blur");
    fixture.write_leaf(&folder, 1, "still here", "pass\n");

    let runner = |_: &str, _: &Selection| -> Result<bool, ScriptFailure> {
        Err(ScriptFailure::new("NameError: undefined_name"))
    };

    let layout = LayoutConfig::default();
    let resolver = Resolver::new(&fixture.store, &runner, &layout);
    let selection = Selection::of(vec![SelectedNode::new("Blur", "Blur1")]);
    let menu = resolver.resolve(std::slice::from_ref(&fixture.repo), &selection);

    assert_eq!(
        flatten(&fixture.store, &menu.contextual),
        vec!["still here"]
    );
}
