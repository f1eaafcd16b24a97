use std::{cell::Cell, rc::Rc};

use gallium::menu::{Handle, Menu, MenuEntry, ShortcutPolicy};
use gallium::platform::{recording::RecordingSurface, StatusItemWidth};
use gallium::App;

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move || inner.set(inner.get() + 1))
}

#[test]
fn click_invokes_exactly_the_registered_callback() {
    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    let (new_count, on_new) = counter();
    let (open_count, on_open) = counter();
    let (quit_count, on_quit) = counter();

    app.set_menu(vec![
        Menu::new(
            "File",
            vec![
                MenuEntry::item("New", "cmd+n", on_new),
                MenuEntry::item("Open", "cmd+o", on_open),
            ],
        ),
        Menu::new("App", vec![MenuEntry::item("Quit", "cmd+q", on_quit)]),
    ])
    .unwrap();

    app.click_path(&["File", "Open"]).unwrap();

    assert_eq!(new_count.get(), 0);
    assert_eq!(open_count.get(), 1);
    assert_eq!(quit_count.get(), 0);

    app.click_path(&["App", "Quit"]).unwrap();
    app.click_path(&["App", "Quit"]).unwrap();
    assert_eq!(quit_count.get(), 2);
    assert_eq!(open_count.get(), 1);
}

#[test]
fn status_items_share_the_registry_with_the_main_menu() {
    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    let (count, on_click) = counter();

    app.set_menu(vec![Menu::new("File", vec![MenuEntry::item("New", "", || {})])])
        .unwrap();
    app.add_status_item(
        StatusItemWidth::Fixed(24.0),
        "S",
        true,
        vec![MenuEntry::item("Ping", "", on_click)],
    )
    .unwrap();

    assert_eq!(app.registered_callbacks(), 2);
    {
        let surface = app.surface();
        let status = &surface.status_items()[0];
        assert_eq!(status.title, "S");
        assert!(status.highlight);
        assert_eq!(status.width, StatusItemWidth::Fixed(24.0));

        let ping = surface.find(status.menu, &["Ping"]).unwrap();
        assert_eq!(ping.action, Some(Handle::from_raw(1)));
    }

    app.click(Handle::from_raw(1)).unwrap();
    assert_eq!(count.get(), 1);
    app.click_path(&["Ping"]).unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn callback_can_add_a_status_item_while_dispatching() {
    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    let pings = Rc::new(Cell::new(0));

    let weak = app.downgrade();
    let on_ping = pings.clone();
    app.add_status_item(
        StatusItemWidth::Variable,
        "First",
        false,
        vec![MenuEntry::item("Add", "", move || {
            let app = weak.upgrade().unwrap();
            let on_ping = on_ping.clone();
            app.add_status_item(
                StatusItemWidth::Square,
                "Second",
                false,
                vec![MenuEntry::item("Ping", "cmd+p", move || {
                    on_ping.set(on_ping.get() + 1)
                })],
            )
            .unwrap();
        })],
    )
    .unwrap();

    app.click_path(&["Add"]).unwrap();

    {
        let surface = app.surface();
        let titles = surface
            .status_items()
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(surface.titles(surface.status_items()[1].menu), vec!["Ping"]);
    }
    assert_eq!(app.registered_callbacks(), 2);

    app.click_path(&["Ping"]).unwrap();
    assert_eq!(pings.get(), 1);
}

#[test]
fn click_path_reports_missing_items() {
    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    app.set_menu(vec![Menu::new("File", vec![MenuEntry::item("New", "", || {})])])
        .unwrap();

    let err = app.click_path(&["File", "Close"]).unwrap_err();
    assert!(err.to_string().contains("File > Close"), "{err}");
    assert!(app.click_path(&["File"]).is_err());
}

#[test]
#[should_panic(expected = "never registered")]
fn click_with_unissued_handle_is_fatal() {
    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    app.add_status_item(
        StatusItemWidth::Variable,
        "S",
        false,
        vec![MenuEntry::item("Only", "", || {})],
    )
    .unwrap();

    let _ = app.click(Handle::from_raw(42));
}

#[test]
fn run_enters_the_native_loop_once() {
    use gallium::platform::recording::NativeCall;

    let app = App::new(RecordingSurface::new(), ShortcutPolicy::Fallback).unwrap();
    app.run().unwrap();
    let runs = app
        .surface()
        .calls()
        .iter()
        .filter(|c| **c == NativeCall::Run)
        .count();
    assert_eq!(runs, 1);
}
