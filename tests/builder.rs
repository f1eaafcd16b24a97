use std::cell::RefCell;

use gallium::menu::{
    CallbackRegistry, EntryOutcome, MenuBuilder, MenuEntry, Modifiers, ShortcutError,
    ShortcutPolicy,
};
use gallium::platform::{
    recording::{NativeCall, RecordingSurface},
    NativeSurface,
};

fn noop() {}

#[test]
fn children_keep_declaration_order() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![
        MenuEntry::item("A", "cmd+a", noop),
        MenuEntry::submenu("B", vec![MenuEntry::item("C", "", noop)]),
        MenuEntry::item("D", "", noop),
    ];
    let report = MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Fallback)
        .build(entries, &root)
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(surface.titles(root), vec!["A", "B", "D"]);

    let b = surface.find(root, &["B"]).unwrap();
    assert!(b.action.is_none());
    let submenu = b.submenu.expect("B has a submenu");
    assert_eq!(surface.titles(submenu), vec!["C"]);

    let a = surface.find(root, &["A"]).unwrap();
    let shortcut = a.shortcut.as_ref().unwrap();
    assert_eq!(shortcut.key, "a");
    assert_eq!(shortcut.modifiers, Modifiers::CMD);
}

#[test]
fn nested_submenus_are_created_before_the_leaf() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![MenuEntry::submenu(
        "Outer",
        vec![MenuEntry::submenu("Inner", vec![MenuEntry::item("Leaf", "", noop)])],
    )];
    MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Fallback)
        .build(entries, &root)
        .unwrap();

    let kinds = surface
        .calls()
        .iter()
        .filter_map(|call| match call {
            NativeCall::CreateMenu { title, .. } => Some(format!("menu:{title}")),
            NativeCall::AddMenuItem { title, .. } => Some(format!("item:{title}")),
            NativeCall::SetSubmenu { .. } => Some("attach".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            "menu:<root>",
            "item:Outer",
            "menu:Outer",
            "attach",
            "item:Inner",
            "menu:Inner",
            "attach",
            "item:Leaf",
        ]
    );

    let leaf = surface.find(root, &["Outer", "Inner", "Leaf"]).unwrap();
    assert!(leaf.action.is_some());
}

#[test]
fn every_leaf_gets_its_own_handle() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![
        MenuEntry::item("One", "", noop),
        MenuEntry::submenu(
            "Sub",
            vec![MenuEntry::item("Two", "", noop), MenuEntry::item("Three", "", noop)],
        ),
        MenuEntry::item("Four", "", noop),
    ];
    MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Fallback)
        .build(entries, &root)
        .unwrap();

    let handles = [
        vec!["One"],
        vec!["Sub", "Two"],
        vec!["Sub", "Three"],
        vec!["Four"],
    ]
    .iter()
    .map(|path| surface.find(root, path).unwrap().action.unwrap().raw())
    .collect::<Vec<_>>();
    assert_eq!(handles, vec![0, 1, 2, 3]);
    assert_eq!(registry.borrow().len(), 4);
}

#[test]
fn fallback_policy_builds_item_without_shortcut() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![
        MenuEntry::item("Bad", "hyper+x", noop),
        MenuEntry::item("Good", "cmd+g", noop),
    ];
    let report = MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Fallback)
        .build(entries, &root)
        .unwrap();

    assert_eq!(surface.titles(root), vec!["Bad", "Good"]);
    let bad = surface.find(root, &["Bad"]).unwrap();
    assert!(bad.shortcut.is_none());
    assert!(bad.action.is_some());

    let fallbacks = report.fallbacks().collect::<Vec<_>>();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].path, "Bad");
    assert_eq!(
        fallbacks[0].outcome,
        EntryOutcome::BuiltWithoutShortcut(ShortcutError::UnknownModifier("hyper".into()))
    );
}

#[test]
fn skip_policy_leaves_item_out_and_registers_nothing() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![
        MenuEntry::item("First", "", noop),
        MenuEntry::item("Broken", "cmd+", noop),
        MenuEntry::item("Last", "", noop),
    ];
    let report = MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Skip)
        .build(entries, &root)
        .unwrap();

    assert_eq!(surface.titles(root), vec!["First", "Last"]);
    assert_eq!(registry.borrow().len(), 2);
    let skipped = report.skipped().collect::<Vec<_>>();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].outcome, EntryOutcome::Skipped(ShortcutError::EmptyKey));
}

#[test]
fn strict_policy_aborts_with_typed_error() {
    let mut surface = RecordingSurface::new();
    let registry = RefCell::new(CallbackRegistry::new());
    let root = surface.create_menu("<root>").unwrap();

    let entries = vec![MenuEntry::submenu(
        "File",
        vec![MenuEntry::item("Open", "cmd+xyz+o", noop)],
    )];
    let err = MenuBuilder::new(&mut surface, &registry, ShortcutPolicy::Strict)
        .build(entries, &root)
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ShortcutError>(),
        Some(&ShortcutError::UnknownModifier("xyz".into()))
    );
    assert!(err.to_string().contains("File > Open"));
    assert!(registry.borrow().is_empty());
}
