//! Desktop launcher entries for development builds.
//!
//! # Responsibilities
//! - Locate the packaging config and read its `linux.desktop` section
//! - Point the entry at the working copy (`Path`, `Exec`)
//! - Write it under the user's applications dir and register it with
//!   `xdg-desktop-menu`

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;

use crate::config::env::EnvSource;

/// Packaging config file names, in lookup order.
pub const CONFIG_CANDIDATES: [&str; 1] = ["electron-builder.json"];

/// Launch command used when none is given.
pub const DEFAULT_EXEC: &str = r#"npm run launch:electron "%u""#;

#[derive(Debug, Error)]
pub enum DesktopEntryError {
    #[error("packaging config could not be found in {}; looked for: {}", .0.display(), CONFIG_CANDIDATES.join(", "))]
    ConfigNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} has no linux.desktop section", .0.display())]
    MissingDesktopSection(PathBuf),

    #[error("HOME environment variable is not set.")]
    MissingHome,

    #[error("xdg-desktop-menu {action} failed: {detail}")]
    Menu { action: &'static str, detail: String },
}

/// Why generation should be skipped in this environment, if it should.
pub fn skip_reason(env: &EnvSource, os: &str) -> Option<&'static str> {
    if env.is_set("CI") {
        Some("Skipping desktop file generation in CI.")
    } else if !matches!(os, "linux" | "macos") {
        Some("Desktop files are only generated on Linux and macOS.")
    } else {
        None
    }
}

/// First packaging config present in `dir`.
pub fn find_config(dir: &Path) -> Result<PathBuf, DesktopEntryError> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| DesktopEntryError::ConfigNotFound(dir.to_path_buf()))
}

/// The `linux.desktop` object of the config at `path`, keys in file order.
pub async fn read_desktop_section(path: &Path) -> Result<Map<String, Value>, DesktopEntryError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DesktopEntryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let mut config: Value = serde_json::from_str(&content).map_err(|source| DesktopEntryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match config.pointer_mut("/linux/desktop").map(Value::take) {
        Some(Value::Object(section)) => Ok(section),
        _ => Err(DesktopEntryError::MissingDesktopSection(path.to_path_buf())),
    }
}

/// Render the entry, with `Path` and `Exec` pointing at the working copy.
pub fn render(mut section: Map<String, Value>, working_dir: &Path, exec: &str) -> String {
    section.insert("Path".to_string(), Value::String(working_dir.display().to_string()));
    section.insert("Exec".to_string(), Value::String(exec.to_string()));

    let mut contents = String::from("[Desktop Entry]");
    for (key, value) in &section {
        contents.push('\n');
        contents.push_str(key);
        contents.push('=');
        contents.push_str(&entry_value(value));
    }
    contents
}

fn entry_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(entry_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Where the development entry for `app_name` is installed.
pub fn install_path(env: &EnvSource, app_name: &str) -> Result<PathBuf, DesktopEntryError> {
    let home = env.get("HOME").ok_or(DesktopEntryError::MissingHome)?;
    Ok(PathBuf::from(home)
        .join(".local/share/applications")
        .join(format!("dev-{app_name}.desktop")))
}

/// Write `contents` to `path` with mode 755.
pub async fn write_entry(path: &Path, contents: &str) -> Result<(), DesktopEntryError> {
    let io_err = |source| DesktopEntryError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, contents).await.map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(io_err)?;
    }
    Ok(())
}

/// Re-register the entry at `path` with the desktop menu.
///
/// A failed uninstall is expected on first install and only logged.
pub async fn install(path: &Path) -> Result<(), DesktopEntryError> {
    if let Err(err) = xdg_desktop_menu("uninstall", path).await {
        tracing::info!(error = %err, "Previous desktop entry not removed");
    }
    xdg_desktop_menu("install", path).await
}

async fn xdg_desktop_menu(action: &'static str, path: &Path) -> Result<(), DesktopEntryError> {
    let output = Command::new("xdg-desktop-menu")
        .arg(action)
        .arg(path)
        .output()
        .await
        .map_err(|err| DesktopEntryError::Menu {
            action,
            detail: err.to_string(),
        })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(DesktopEntryError::Menu {
            action,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "appId": "com.example.app",
        "linux": {
            "desktop": {
                "Name": "Example",
                "Type": "Application",
                "Exec": "placeholder",
                "Terminal": false,
                "MimeType": ["x-scheme-handler/app", "text/html"]
            }
        }
    }"#;

    #[tokio::test]
    async fn test_render_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("electron-builder.json"), CONFIG).unwrap();

        let path = find_config(dir.path()).unwrap();
        let section = read_desktop_section(&path).await.unwrap();
        let contents = render(section, Path::new("/work/app"), DEFAULT_EXEC);

        assert_eq!(
            contents,
            "[Desktop Entry]\n\
             Name=Example\n\
             Type=Application\n\
             Exec=npm run launch:electron \"%u\"\n\
             Terminal=false\n\
             MimeType=x-scheme-handler/app,text/html\n\
             Path=/work/app"
        );
    }

    #[tokio::test]
    async fn test_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(find_config(dir.path()), Err(DesktopEntryError::ConfigNotFound(_))));

        let path = dir.path().join("electron-builder.json");
        std::fs::write(&path, r#"{"linux": {}}"#).unwrap();
        assert!(matches!(
            read_desktop_section(&path).await,
            Err(DesktopEntryError::MissingDesktopSection(_))
        ));

        std::fs::write(&path, "{").unwrap();
        assert!(matches!(read_desktop_section(&path).await, Err(DesktopEntryError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_write_entry() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvSource::fixed([("HOME", dir.path().to_str().unwrap())]);
        let path = install_path(&env, "example").unwrap();
        assert!(path.ends_with(".local/share/applications/dev-example.desktop"));

        write_entry(&path, "[Desktop Entry]").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[Desktop Entry]");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        assert!(matches!(install_path(&EnvSource::empty(), "x"), Err(DesktopEntryError::MissingHome)));
    }

    #[test]
    fn test_skip_reason() {
        assert!(skip_reason(&EnvSource::fixed([("CI", "1")]), "linux").is_some());
        assert!(skip_reason(&EnvSource::empty(), "windows").is_some());
        assert!(skip_reason(&EnvSource::empty(), "linux").is_none());
        assert!(skip_reason(&EnvSource::empty(), "macos").is_none());
    }
}
