use std::cell::RefCell;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{
    entry::MenuEntry,
    registry::CallbackRegistry,
    shortcut::{self, Shortcut, ShortcutError},
};
use crate::platform::NativeSurface;

/// What to do with an item whose shortcut does not parse.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutPolicy {
    /// Build the item without a shortcut.
    #[default]
    Fallback,
    /// Leave the item out of the menu.
    Skip,
    /// Abort the whole build.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Built,
    BuiltWithoutShortcut(ShortcutError),
    Skipped(ShortcutError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    /// Titles from the build root down to the entry, joined with ` > `.
    pub path: String,
    pub outcome: EntryOutcome,
}

/// Per-entry results of a build, in visiting order.
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    pub entries: Vec<EntryReport>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.outcome == EntryOutcome::Built)
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::BuiltWithoutShortcut(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Skipped(_)))
    }

    pub fn extend(&mut self, other: BuildReport) {
        self.entries.extend(other.entries);
    }
}

/// Turns a [`MenuEntry`] tree into native menus, registering each leaf's
/// callback on the way.
pub struct MenuBuilder<'a, S: NativeSurface> {
    surface: &'a mut S,
    registry: &'a RefCell<CallbackRegistry>,
    policy: ShortcutPolicy,
}

impl<'a, S: NativeSurface> MenuBuilder<'a, S> {
    pub fn new(
        surface: &'a mut S,
        registry: &'a RefCell<CallbackRegistry>,
        policy: ShortcutPolicy,
    ) -> Self {
        Self {
            surface,
            registry,
            policy,
        }
    }

    /// Builds `entries` into `parent`, preserving order.
    pub fn build(&mut self, entries: Vec<MenuEntry>, parent: &S::Menu) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        self.add_entries(entries, parent, "", &mut report)?;
        Ok(report)
    }

    fn add_entries(
        &mut self,
        entries: Vec<MenuEntry>,
        parent: &S::Menu,
        prefix: &str,
        report: &mut BuildReport,
    ) -> Result<()> {
        for entry in entries {
            let path = if prefix.is_empty() {
                entry.title().to_string()
            } else {
                format!("{prefix} > {}", entry.title())
            };

            match entry {
                MenuEntry::Submenu(menu) => {
                    let item = self
                        .surface
                        .add_menu_item(parent, &menu.title, None, None)
                        .with_context(|| format!("add submenu item '{path}'"))?;
                    let submenu = self
                        .surface
                        .create_menu(&menu.title)
                        .with_context(|| format!("create submenu '{path}'"))?;
                    self.surface
                        .set_submenu(&item, &submenu)
                        .with_context(|| format!("attach submenu '{path}'"))?;
                    report.entries.push(EntryReport {
                        path: path.clone(),
                        outcome: EntryOutcome::Built,
                    });
                    self.add_entries(menu.entries, &submenu, &path, report)?;
                }
                MenuEntry::Item {
                    title,
                    shortcut,
                    on_click,
                } => {
                    let (parsed, outcome) = self.resolve_shortcut(&path, &shortcut)?;
                    if matches!(outcome, EntryOutcome::Skipped(_)) {
                        report.entries.push(EntryReport { path, outcome });
                        continue;
                    }

                    let handle = self.registry.borrow_mut().register(on_click);
                    self.surface
                        .add_menu_item(parent, &title, parsed.as_ref(), Some(handle))
                        .with_context(|| format!("add menu item '{path}'"))?;
                    tracing::debug!(item = %path, %handle, shortcut = %shortcut, "built menu item");
                    report.entries.push(EntryReport { path, outcome });
                }
            }
        }
        Ok(())
    }

    /// Parses `spec` and applies the shortcut policy. An empty spec means no
    /// shortcut. Only [`ShortcutPolicy::Strict`] turns a parse error into `Err`.
    fn resolve_shortcut(&self, path: &str, spec: &str) -> Result<(Option<Shortcut>, EntryOutcome)> {
        if spec.is_empty() {
            return Ok((None, EntryOutcome::Built));
        }
        let err = match shortcut::parse(spec) {
            Ok(parsed) => return Ok((Some(parsed), EntryOutcome::Built)),
            Err(err) => err,
        };

        match self.policy {
            ShortcutPolicy::Fallback => {
                tracing::warn!(item = %path, shortcut = %spec, error = %err, "ignoring invalid shortcut");
                Ok((None, EntryOutcome::BuiltWithoutShortcut(err)))
            }
            ShortcutPolicy::Skip => {
                tracing::warn!(item = %path, shortcut = %spec, error = %err, "skipping item with invalid shortcut");
                Ok((None, EntryOutcome::Skipped(err)))
            }
            ShortcutPolicy::Strict => Err(anyhow::Error::new(err)
                .context(format!("invalid shortcut '{spec}' for '{path}'"))),
        }
    }
}
