use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

use crate::provenance::TIMESTAMP_FORMAT;
use crate::version::DEFAULT_MAX_STACK_SIZE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

/// Which paragraphs an undo snapshot covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoScope {
    /// Only the active paragraph.
    Paragraph,
    /// Every paragraph of the document.
    #[default]
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_stack_size")]
    pub max_stack_size: usize,
    #[serde(default)]
    pub scope: UndoScope,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stack_size: default_max_stack_size(),
            scope: UndoScope::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub default_annotator: Option<String>,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_annotator: None,
            timestamp_format: default_timestamp_format(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelsConfig {
    /// Colours handed to new labels in order; empty uses the built-in palette.
    #[serde(default)]
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub annotator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

impl EffectiveConfig {
    /// Annotator name: explicit value, then `REFANNO_ANNOTATOR`, then the
    /// project default, then the user config.
    #[must_use]
    pub fn resolve_annotator(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| env::var("REFANNO_ANNOTATOR").ok())
            .or_else(|| self.project.export.default_annotator.clone())
            .or_else(|| self.user.annotator.clone())
            .filter(|name| !name.trim().is_empty())
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".refanno/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    validate_timestamp_format(&config.export.timestamp_format)
        .with_context(|| format!("Invalid [export] section in {}", path.display()))?;
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("refanno/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("REFANNO_FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Reject strftime patterns chrono cannot render.
pub fn validate_timestamp_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        bail!("timestamp_format must not be empty");
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("timestamp_format '{format}' is not a valid strftime pattern");
    }
    Ok(())
}

fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_max_stack_size() -> usize {
    DEFAULT_MAX_STACK_SIZE
}

fn default_timestamp_format() -> String {
    TIMESTAMP_FORMAT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir must be created");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.history.max_stack_size, 50);
        assert_eq!(cfg.history.scope, UndoScope::Document);
        assert_eq!(cfg.export.timestamp_format, "%Y-%m-%dT%H:%M:%SZ");
        assert!(cfg.export.default_annotator.is_none());
        assert!(cfg.labels.palette.is_empty());
    }

    #[test]
    fn project_config_sections_parse() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".refanno")).expect("create .refanno");
        std::fs::write(
            root.path().join(".refanno/config.toml"),
            r#"
[history]
max_stack_size = 10
scope = "paragraph"

[export]
default_annotator = "ana"

[labels]
palette = ["red-11", "blue-11"]
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.history.max_stack_size, 10);
        assert_eq!(cfg.history.scope, UndoScope::Paragraph);
        assert_eq!(cfg.export.default_annotator.as_deref(), Some("ana"));
        assert_eq!(cfg.export.timestamp_format, TIMESTAMP_FORMAT);
        assert_eq!(cfg.labels.palette, ["red-11", "blue-11"]);
    }

    #[test]
    fn broken_toml_reports_path() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(".refanno")).expect("create .refanno");
        std::fs::write(root.path().join(".refanno/config.toml"), "[history\n").expect("write");
        let err = load_project_config(root.path()).expect_err("must fail");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        assert!(validate_timestamp_format("%Y-%m-%d").is_ok());
        assert!(validate_timestamp_format("%Q").is_err());
        assert!(validate_timestamp_format("  ").is_err());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(resolve_output(true, Some("pretty"), Some("text")), "json");
    }

    #[test]
    fn env_beats_user_config() {
        assert_eq!(resolve_output(false, Some("json"), Some("human")), "pretty");
        assert_eq!(resolve_output(false, Some("plain"), Some("bogus")), "text");
    }

    #[test]
    fn annotator_prefers_explicit_value() {
        let cfg = EffectiveConfig {
            project: ProjectConfig {
                export: ExportConfig {
                    default_annotator: Some("project".into()),
                    ..ExportConfig::default()
                },
                ..ProjectConfig::default()
            },
            user: UserConfig {
                output: None,
                annotator: Some("user".into()),
            },
            resolved_output: "text".into(),
        };
        assert_eq!(cfg.resolve_annotator(Some("cli")).as_deref(), Some("cli"));
    }
}
