use anyhow::Result;

#[cfg(not(target_os = "macos"))]
fn main() -> Result<()> {
    anyhow::bail!("gallium-demo is only supported on macOS");
}

#[cfg(target_os = "macos")]
fn main() -> Result<()> {
    demo::run()
}

#[cfg(target_os = "macos")]
mod demo {
    use std::{cell::Cell, path::PathBuf, rc::Rc};

    use anyhow::{Context, Result};
    use clap::Parser;
    use gallium::{
        config::{self, ActivationPolicy},
        logging,
        menu::{Menu, MenuEntry},
        platform::{self, macos, StatusItemWidth},
        App,
    };

    #[derive(Parser, Debug)]
    #[command(name = "gallium-demo", about = "Sample app with a main menu and a status item")]
    struct Args {
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
        /// Keep running after the launching terminal closes; output goes to this file.
        #[arg(long)]
        detach: Option<PathBuf>,
        /// Status item only, no Dock icon or main menu.
        #[arg(long)]
        accessory: bool,
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        if let Some(path) = &args.detach {
            macos::detach_from_terminal(path).context("detach from terminal")?;
        }

        let cfg = config::load_or_default()?;
        logging::init_logging(&cfg.log_config(args.verbose)?).context("init logging")?;

        let activation = if args.accessory {
            ActivationPolicy::Accessory
        } else {
            cfg.activation_policy
        };
        let surface = platform::native(activation).context("create AppKit surface")?;
        let app = App::new(surface, cfg.shortcut_policy)?;

        let clicks = Rc::new(Cell::new(0u32));

        if activation == ActivationPolicy::Regular {
            let report = app.set_menu(main_menu(clicks.clone()))?;
            for entry in report.fallbacks() {
                tracing::warn!(item = %entry.path, "built without shortcut");
            }
        }

        let counter = clicks.clone();
        let weak = app.downgrade();
        app.add_status_item(
            StatusItemWidth::Variable,
            "gallium",
            true,
            vec![
                MenuEntry::item("Count", "cmd+k", move || {
                    counter.set(counter.get() + 1);
                    tracing::info!(clicks = counter.get(), "count");
                }),
                MenuEntry::submenu(
                    "More",
                    vec![MenuEntry::item("Say hello", "", || {
                        tracing::info!("hello from the status bar")
                    })],
                ),
                MenuEntry::item("Another status item", "", move || {
                    let Some(app) = weak.upgrade() else { return };
                    let added = app.add_status_item(
                        StatusItemWidth::Square,
                        "+",
                        false,
                        vec![MenuEntry::item("Quit", "", macos::terminate)],
                    );
                    if let Err(err) = added {
                        tracing::error!(error = %err, "add status item");
                    }
                }),
                MenuEntry::item("Quit", "cmd+q", macos::terminate),
            ],
        )?;

        app.run()
    }

    fn main_menu(clicks: Rc<Cell<u32>>) -> Vec<Menu> {
        vec![
            Menu::new(
                "gallium-demo",
                vec![MenuEntry::item("Quit gallium-demo", "cmd+q", macos::terminate)],
            ),
            Menu::new(
                "Actions",
                vec![
                    MenuEntry::item("Count", "cmd+shift+k", move || {
                        clicks.set(clicks.get() + 1);
                        tracing::info!(clicks = clicks.get(), "count");
                    }),
                    MenuEntry::submenu(
                        "Nested",
                        vec![MenuEntry::item("Deep item", "option+d", || {
                            tracing::info!("deep item")
                        })],
                    ),
                ],
            ),
        ]
    }
}
