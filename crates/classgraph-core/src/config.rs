//! Run configuration for analysis and output.
//!
//! Load order: `.classgraph/config.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Diagram formats accepted by `output.diagram`.
pub const DIAGRAM_FORMATS: [&str; 4] = ["plantuml", "dot", "mermaid", "none"];

/// Top-level classgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassGraphConfig {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

/// Source scanning and extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory holding one `<language>.txt` ignore list per language.
    /// Relative paths are resolved against the project root.
    pub ignore_dir: PathBuf,
    /// Worker threads for per-file extraction. 0 lets rayon decide.
    pub jobs: usize,
    /// Honor `.gitignore` files while walking the tree.
    pub respect_gitignore: bool,
    /// Files larger than this are skipped.
    pub max_file_bytes: u64,
}

/// Where and how results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for timestamped graph files, relative to the project root.
    pub dir: PathBuf,
    /// Diagram written next to each graph file: plantuml, dot, mermaid or none.
    pub diagram: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ignore_dir: PathBuf::from(".classgraph/ignore"),
            jobs: 0,
            respect_gitignore: true,
            max_file_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".classgraph/out"),
            diagram: "plantuml".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl ClassGraphConfig {
    /// Load config from `.classgraph/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".classgraph").join("config.toml");

        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override("CLASSGRAPH_IGNORE_DIR", &mut config.analysis.ignore_dir);
        env_override("CLASSGRAPH_JOBS", &mut config.analysis.jobs);
        env_override(
            "CLASSGRAPH_MAX_FILE_BYTES",
            &mut config.analysis.max_file_bytes,
        );
        env_override("CLASSGRAPH_OUT_DIR", &mut config.output.dir);
        env_override("CLASSGRAPH_DIAGRAM", &mut config.output.diagram);

        config.output.diagram = config.output.diagram.to_lowercase();
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.output.dir.as_os_str().is_empty() {
            anyhow::bail!("output.dir must not be empty");
        }
        if self.analysis.max_file_bytes == 0 {
            anyhow::bail!("analysis.max_file_bytes must be greater than zero");
        }
        if !DIAGRAM_FORMATS.contains(&self.output.diagram.as_str()) {
            anyhow::bail!(
                "unknown output.diagram '{}': expected one of {}",
                self.output.diagram,
                DIAGRAM_FORMATS.join(", ")
            );
        }
        Ok(())
    }

    /// Ignore-list directory resolved against the project root.
    pub fn ignore_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.analysis.ignore_dir)
    }

    /// Output directory resolved against the project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output.dir)
    }
}
