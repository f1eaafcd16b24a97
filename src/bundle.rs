//! Packaging of an executable into a macOS `.app` bundle.
//!
//! The bundle is staged in a temporary directory next to the output and moved
//! into place with a single rename once complete.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use thiserror::Error;

const PKG_INFO: &[u8] = b"????????";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("output must end with .app: {0}")]
    NotAnAppPath(PathBuf),
    #[error("executable has no file name: {0}")]
    NoExecutableName(PathBuf),
    #[error("framework not found at {0}")]
    FrameworkMissing(PathBuf),
    #[error("{0} is not a directory")]
    FrameworkNotADirectory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub executable: PathBuf,
    pub output: Option<PathBuf>,
    pub bundle_identifier: Option<String>,
    /// Directory copied into `Contents/Frameworks/` (e.g. `Foo.framework`).
    pub framework: Option<PathBuf>,
}

/// Names and paths derived from a [`BundleRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePlan {
    pub name: String,
    pub identifier: String,
    pub output: PathBuf,
}

impl BundleRequest {
    /// Without `-o` the bundle is `<exe name>.app` in the current directory;
    /// with it, the bundle name is the output's stem.
    pub fn plan(&self) -> Result<BundlePlan, BundleError> {
        let (name, output) = match &self.output {
            None => {
                let name = self
                    .executable
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| BundleError::NoExecutableName(self.executable.clone()))?
                    .to_string();
                let output = PathBuf::from(format!("{name}.app"));
                (name, output)
            }
            Some(output) => {
                let file_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");
                let Some(name) = file_name.strip_suffix(".app").filter(|n| !n.is_empty()) else {
                    return Err(BundleError::NotAnAppPath(output.clone()));
                };
                (name.to_string(), output.clone())
            }
        };

        let identifier = self
            .bundle_identifier
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| name.clone());

        Ok(BundlePlan {
            name,
            identifier,
            output,
        })
    }
}

/// Builds the bundle and returns its final path.
pub fn create(request: &BundleRequest) -> Result<PathBuf> {
    let plan = request.plan()?;

    if let Some(fw) = &request.framework {
        let st = fs::metadata(fw).map_err(|_| BundleError::FrameworkMissing(fw.clone()))?;
        if !st.is_dir() {
            return Err(BundleError::FrameworkNotADirectory(fw.clone()).into());
        }
    }

    let parent = match plan.output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).with_context(|| format!("create {}", parent.display()))?;
    let staging = tempfile::Builder::new()
        .prefix(".bundle-")
        .tempdir_in(&parent)
        .with_context(|| format!("create staging dir in {}", parent.display()))?;
    let root = staging.path();
    tracing::debug!(staging = %root.display(), "staging bundle");

    if let Some(fw) = &request.framework {
        let fw_name = fw
            .file_name()
            .ok_or_else(|| BundleError::FrameworkMissing(fw.clone()))?;
        let fw_dst = root.join("Contents").join("Frameworks").join(fw_name);
        fs::create_dir_all(fw_dst.parent().unwrap_or(root))
            .context("create Frameworks dir")?;
        copy_tree(&fw_dst, fw).with_context(|| format!("copy framework {}", fw.display()))?;
    }

    let exe_dst = root.join("Contents").join("MacOS").join(&plan.name);
    fs::create_dir_all(root.join("Contents").join("MacOS")).context("create MacOS dir")?;
    copy_file(&exe_dst, &request.executable)
        .with_context(|| format!("copy executable {}", request.executable.display()))?;

    let plist = info_plist(&plan.name, &plan.identifier);
    fs::write(root.join("Contents").join("Info.plist"), plist).context("write Info.plist")?;
    fs::write(root.join("Contents").join("PkgInfo"), PKG_INFO).context("write PkgInfo")?;

    if fs::symlink_metadata(&plan.output).is_ok() {
        remove_path(&plan.output)
            .with_context(|| format!("remove existing {}", plan.output.display()))?;
    }
    // The staged tree is renamed away, so TempDir must not clean it up.
    let staged = staging.keep();
    if let Err(err) = fs::rename(&staged, &plan.output) {
        let _ = fs::remove_dir_all(&staged);
        return Err(err).with_context(|| format!("move bundle to {}", plan.output.display()));
    }

    tracing::info!(bundle = %plan.output.display(), identifier = %plan.identifier, "bundle created");
    Ok(plan.output)
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copies `src` to `dst`, keeping the permission bits.
fn copy_file(dst: &Path, src: &Path) -> Result<()> {
    let st = fs::metadata(src).with_context(|| format!("stat {}", src.display()))?;
    let buf = fs::read(src).with_context(|| format!("read {}", src.display()))?;
    fs::write(dst, buf).with_context(|| format!("write {}", dst.display()))?;
    fs::set_permissions(dst, st.permissions())
        .with_context(|| format!("set permissions on {}", dst.display()))?;
    Ok(())
}

/// Recursively copies the directory `src` to `dst`. Symlinks are recreated,
/// not followed.
fn copy_tree(dst: &Path, src: &Path) -> Result<()> {
    fs::create_dir(dst).with_context(|| format!("create {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("read {}", src.display()))? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            let referent =
                fs::read_link(&path).with_context(|| format!("readlink {}", path.display()))?;
            symlink(&referent, &target)
                .with_context(|| format!("symlink {}", target.display()))?;
        } else if file_type.is_dir() {
            copy_tree(&target, &path)?;
        } else {
            copy_file(&target, &path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(referent: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(referent, target)
}

#[cfg(not(unix))]
fn symlink(_referent: &Path, target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::other(format!(
        "cannot recreate symlink {} on this platform",
        target.display()
    )))
}

fn info_plist(name: &str, identifier: &str) -> String {
    let name = xml_escape(name);
    let identifier = xml_escape(identifier);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>CFBundleExecutable</key><string>{name}</string>
  <key>CFBundleIdentifier</key><string>{identifier}</string>
  <key>CFBundleName</key><string>{name}</string>
  <key>CFBundleInfoDictionaryVersion</key><string>6.0</string>
  <key>CFBundlePackageType</key><string>APPL</string>
  <key>CFBundleShortVersionString</key><string>1.0</string>
  <key>CFBundleVersion</key><string>1</string>
  <key>NSHighResolutionCapable</key><true/>
  <key>NSPrincipalClass</key><string>NSApplication</string>
</dict>
</plist>
"#
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(exe: &str, output: Option<&str>, id: Option<&str>) -> BundleRequest {
        BundleRequest {
            executable: PathBuf::from(exe),
            output: output.map(PathBuf::from),
            bundle_identifier: id.map(str::to_string),
            framework: None,
        }
    }

    #[test]
    fn default_output_is_exe_name_dot_app() {
        let plan = request("target/release/notes", None, None).plan().unwrap();
        assert_eq!(plan.name, "notes");
        assert_eq!(plan.identifier, "notes");
        assert_eq!(plan.output, PathBuf::from("notes.app"));
    }

    #[test]
    fn output_stem_names_the_bundle() {
        let plan = request("bin/notes", Some("dist/Notes.app"), Some("com.example.notes"))
            .plan()
            .unwrap();
        assert_eq!(plan.name, "Notes");
        assert_eq!(plan.identifier, "com.example.notes");
    }

    #[test]
    fn output_without_app_suffix_is_rejected() {
        let err = request("bin/notes", Some("dist/Notes"), None).plan().unwrap_err();
        assert!(matches!(err, BundleError::NotAnAppPath(_)));
        let err = request("bin/notes", Some(".app"), None).plan().unwrap_err();
        assert!(matches!(err, BundleError::NotAnAppPath(_)));
    }

    #[test]
    fn plist_carries_name_and_identifier() {
        let plist = info_plist("Notes", "com.example.notes");
        assert!(plist.contains("<key>CFBundleExecutable</key><string>Notes</string>"));
        assert!(plist.contains("<string>com.example.notes</string>"));
    }

    #[test]
    fn plist_escapes_markup_in_names() {
        let plist = info_plist("R&D <beta>", "com.example.r&d");
        assert!(plist.contains("<string>R&amp;D &lt;beta&gt;</string>"));
        assert!(plist.contains("<string>com.example.r&amp;d</string>"));
        assert!(!plist.contains("R&D"));
    }
}
