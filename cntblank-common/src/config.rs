use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub sheet: usize, // 0 = first sheet
}

fn default_delimiter() -> String {
    "\t".into()
}
fn default_encoding() -> String {
    "utf8".into()
}
fn default_true() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            encoding: default_encoding(),
            header: true,
            strict: false,
            sheet: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_true")]
    pub header: bool,
    #[serde(default)]
    pub metadata: bool,
}

fn default_format() -> String {
    "csv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            delimiter: default_delimiter(),
            encoding: default_encoding(),
            header: true,
            metadata: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    [".csv", ".tsv", ".txt", ".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub collect: CollectConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cntblank")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        let path = if let Ok(env_path) = std::env::var("CNTBLANK_CONFIG") {
            PathBuf::from(env_path) // $CNTBLANK_CONFIG overrides default config path
        } else {
            Self::config_path()
        };
        Self::load_from(&path)
    }

    /// missing file yields defaults; a malformed one is an error
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&content).map_err(|e| crate::CntblankError::Config(e.to_string()))?;
        Ok(cfg)
    }
}
