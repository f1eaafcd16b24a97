use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gallium::{
    bundle::{self, BundleRequest},
    config, logging,
    menu::{
        layout::{self, MenuLayout},
        shortcut, EntryOutcome, ShortcutPolicy,
    },
    platform::{recording::RecordingSurface, StatusItemWidth},
    App,
};

#[derive(Parser, Debug)]
#[command(name = "gallium", version, about = "Native menu tooling for macOS apps")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds a JSON menu layout without a window server and prints the result.
    Check {
        /// Layout file with `menus` and/or `status_items`.
        layout: PathBuf,
        /// Overrides `shortcut_policy` from the config file.
        #[arg(long, value_enum)]
        policy: Option<ShortcutPolicy>,
        /// Activates an item after building. Repeat once per title along the
        /// path, e.g. `--click File --click New`. The main menu is searched
        /// first, then each status item's menu.
        #[arg(long = "click", value_name = "TITLE")]
        click: Vec<String>,
    },
    /// Parses a shortcut such as "cmd+shift+n" and prints its key and mask.
    Shortcut { spec: String },
    /// Packages an executable into a .app bundle.
    Bundle {
        executable: PathBuf,
        /// Bundle path; must end with .app. Defaults to <executable>.app.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// CFBundleIdentifier. Defaults to the bundle name.
        #[arg(long)]
        bundle_identifier: Option<String>,
        /// Framework directory to embed under Contents/Frameworks.
        #[arg(long)]
        framework: Option<PathBuf>,
    },
    /// Prints the config path that would be used (if any).
    ConfigPath,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default()?;
    logging::init_logging(&cfg.log_config(cli.verbose)?).context("init logging")?;

    match cli.command {
        Command::Check {
            layout,
            policy,
            click,
        } => check(&layout, policy.unwrap_or(cfg.shortcut_policy), &click)?,
        Command::Shortcut { spec } => {
            let parsed = shortcut::parse(&spec).with_context(|| format!("parse '{spec}'"))?;
            println!("key: {}", parsed.key);
            println!("modifiers: {} (0x{:02x})", parsed.modifiers, parsed.modifiers.bits());
            println!("canonical: {parsed}");
        }
        Command::Bundle {
            executable,
            output,
            bundle_identifier,
            framework,
        } => {
            let path = bundle::create(&BundleRequest {
                executable,
                output,
                bundle_identifier,
                framework,
            })?;
            println!("{}", path.display());
        }
        Command::ConfigPath => {
            if let Some(path) = config::resolve_config_path() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn check(path: &Path, policy: ShortcutPolicy, click: &[String]) -> Result<()> {
    let declared = MenuLayout::load(path)?;
    let app = App::new(RecordingSurface::new(), policy)?;

    let menus = declared
        .menus
        .into_iter()
        .map(|m| m.into_menu(&layout::log_activation))
        .collect::<Vec<_>>();
    let mut report = app.set_menu(menus).context("build main menu")?;

    for item in declared.status_items {
        let width = item
            .width
            .map(StatusItemWidth::Fixed)
            .unwrap_or(StatusItemWidth::Variable);
        let entries = layout::into_entries(item.entries, &layout::log_activation);
        let status = app
            .add_status_item(width, &item.title, item.highlight, entries)
            .with_context(|| format!("build status item '{}'", item.title))?;
        report.extend(status);
    }

    {
        let surface = app.surface();
        if let Some(root) = surface.main_menu() {
            println!("main menu:");
            for line in surface.outline(root) {
                println!("  {line}");
            }
        }
        for status in surface.status_items() {
            println!("status item '{}':", status.title);
            for line in surface.outline(status.menu) {
                println!("  {line}");
            }
        }
    }

    for entry in &report.entries {
        match &entry.outcome {
            EntryOutcome::Built => {}
            EntryOutcome::BuiltWithoutShortcut(err) => {
                println!("warning: {}: shortcut dropped ({err})", entry.path)
            }
            EntryOutcome::Skipped(err) => println!("warning: {}: skipped ({err})", entry.path),
        }
    }
    println!(
        "{} entries, {} callbacks registered",
        report.entries.len(),
        app.registered_callbacks()
    );

    if !click.is_empty() {
        let path = click.iter().map(String::as_str).collect::<Vec<_>>();
        app.click_path(&path)
            .with_context(|| format!("click '{}'", path.join(" > ")))?;
    }

    Ok(())
}
