use std::fs;
use std::io;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::css::CompilePolicy;

/// Compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Emit a local @font-face block for a font family without a font URL
    #[serde(default = "default_local_font_face")]
    pub local_font_face: bool,
}

fn default_local_font_face() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            local_font_face: default_local_font_face(),
        }
    }
}

impl From<&CompilerSettings> for CompilePolicy {
    fn from(settings: &CompilerSettings) -> Self {
        CompilePolicy {
            local_font_face: settings.local_font_face,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub compiler: CompilerSettings,
    /// Key-value store file holding themes, last inputs and the applied patch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Stylesheet file the patch is applied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet_path: Option<String>,
    /// tracing filter used when PAGESTYLE_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler: CompilerSettings::default(),
            storage_path: None,
            stylesheet_path: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Returns the config directory path (~/.pagestyle)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".pagestyle"))
    }

    /// Returns the config file path (~/.pagestyle/settings.json)
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.json"))
    }

    /// Ensures the config directory and default settings file exist
    pub fn ensure_config_exists() {
        if let Some(config_dir) = Self::config_dir() {
            if !config_dir.exists() && fs::create_dir_all(&config_dir).is_ok() {
                // Set directory permissions to user-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = fs::Permissions::from_mode(0o700);
                    let _ = fs::set_permissions(&config_dir, perms);
                }
            }
        }

        if let Some(config_path) = Self::config_path() {
            if !config_path.exists() {
                let _ = Self::default().save();
            }
        }
    }

    /// Loads settings from the config file, returns default if not found or invalid
    pub fn load() -> Self {
        Self::load_with_error().unwrap_or_default()
    }

    /// Loads settings from the config file with error information
    pub fn load_with_error() -> Result<Self, String> {
        Self::ensure_config_exists();

        let config_path = Self::config_path()
            .ok_or_else(|| "Could not determine config path".to_string())?;

        let content = fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in settings.json: {}", e))
    }

    /// Saves settings to the config file using atomic write pattern
    pub fn save(&self) -> io::Result<()> {
        let Some(config_dir) = Self::config_dir() else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine config directory",
            ));
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = fs::Permissions::from_mode(0o700);
                let _ = fs::set_permissions(&config_dir, perms);
            }
        }

        let config_path = config_dir.join("settings.json");
        let temp_path = config_dir.join("settings.json.tmp");
        let content = serde_json::to_string_pretty(self)?;

        // Atomic write: write to temp file first, then rename
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &config_path)?;

        Ok(())
    }

    pub fn compile_policy(&self) -> CompilePolicy {
        CompilePolicy::from(&self.compiler)
    }

    /// Resolved key-value store file
    pub fn storage_file(&self) -> PathBuf {
        resolve_file(&self.storage_path, "storage.json")
    }

    /// Resolved target stylesheet file
    pub fn stylesheet_file(&self) -> PathBuf {
        resolve_file(&self.stylesheet_path, "pagestyle.css")
    }
}

/// Uses the configured path when it is absolute, otherwise the default file
/// inside the config directory.
/// Security: relative paths are rejected so the working directory never decides
/// where state is written
fn resolve_file(path_opt: &Option<String>, default_name: &str) -> PathBuf {
    if let Some(path_str) = path_opt {
        let path = PathBuf::from(path_str);
        if path.is_absolute() {
            return path;
        }
    }
    Settings::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(default_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.compiler.local_font_face);
        assert_eq!(settings.log_filter, "warn");
        assert!(settings.storage_path.is_none());
        assert!(settings.compile_policy().local_font_face);
    }

    #[test]
    fn test_parse_partial_json() {
        let json = r#"{"compiler":{"local_font_face":false}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(!settings.compiler.local_font_face);
        assert_eq!(settings.log_filter, "warn");
        assert!(settings.stylesheet_path.is_none());
    }

    #[test]
    fn test_relative_paths_fall_back_to_config_dir() {
        let settings = Settings {
            storage_path: Some("relative/storage.json".to_string()),
            ..Settings::default()
        };
        let file = settings.storage_file();
        assert!(file.ends_with("storage.json"));
        assert_ne!(file, PathBuf::from("relative/storage.json"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("user.css");
        let settings = Settings {
            stylesheet_path: Some(css.to_string_lossy().to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.stylesheet_file(), css);
    }

    #[test]
    fn test_settings_to_json() {
        let json = serde_json::to_string_pretty(&Settings::default()).unwrap();
        assert!(json.contains("\"local_font_face\": true"));
        assert!(!json.contains("storage_path"));
    }
}
