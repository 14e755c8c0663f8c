use crate::core::cache::CachePolicy;
use crate::core::loader::LoadOptions;
use crate::domain::model::Variant;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{FinderError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SOURCE_PATH: &str = "templates.csv";
pub const DEFAULT_DOWNLOAD_EXTENSION: &str = "html";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinderConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: String,
    pub variant: Option<Variant>,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// 圖片網址前綴，原樣與 ImageFile 串接
    #[serde(default)]
    pub image_base: String,
    #[serde(default = "default_download_extension")]
    pub download_extension: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicy,
}

fn default_source_path() -> String {
    DEFAULT_SOURCE_PATH.to_string()
}

fn default_download_extension() -> String {
    DEFAULT_DOWNLOAD_EXTENSION.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            variant: None,
            delimiter: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            image_base: String::new(),
            download_extension: default_download_extension(),
        }
    }
}

impl FinderConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| FinderError::ConfigError {
            message: format!(
                "Cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FinderError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TEMPLATE_ROOT})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FinderError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = match &self.source.delimiter {
            Some(value) => validation::validate_delimiter("source.delimiter", value)?,
            None => b',',
        };
        Ok(LoadOptions {
            variant: self.source.variant,
            delimiter,
        })
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache.policy
    }
}

impl ConfigProvider for FinderConfig {
    fn source_path(&self) -> &str {
        &self.source.path
    }

    fn image_base(&self) -> &str {
        &self.display.image_base
    }

    fn download_extension(&self) -> &str {
        &self.display.download_extension
    }
}

impl Validate for FinderConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("source.path", &self.source.path)?;
        validation::validate_file_extension("source.path", &self.source.path, &["csv", "tsv", "txt"])?;
        self.load_options()?;
        validation::validate_extension_fragment(
            "display.download_extension",
            &self.display.download_extension,
        )?;

        if self.source.variant == Some(Variant::Image) {
            // 圖片型態沒有前綴時只能顯示原始檔名
            if self.display.image_base.is_empty() {
                tracing::warn!("display.image_base is empty; image references will be bare file names");
            }
        }
        Ok(())
    }
}
