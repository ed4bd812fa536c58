use crate::utils::error::{Result, SheetError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Full run configuration. Every section and field has a default, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub catalog: CatalogConfig,
    pub fetch: FetchConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStyle {
    /// `GET {base}{lookup_path}/{key}`
    #[default]
    Path,
    /// `GET {base}{lookup_path}?{query_param}={key}`
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub lookup_style: LookupStyle,
    pub lookup_path: String,
    pub query_param: String,
    /// JSON pointer to the artwork path inside the catalog response.
    pub image_pointer: String,
    pub timeout_seconds: u64,
    pub headers: HashMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.gatcg.com".to_string(),
            lookup_style: LookupStyle::Path,
            lookup_path: "/cards".to_string(),
            query_param: "name".to_string(),
            image_pointer: "/editions/0/image".to_string(),
            timeout_seconds: 10,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub concurrency: usize,
    pub timeout_seconds: u64,
    pub print_dpi: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            timeout_seconds: 20,
            print_dpi: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rows: usize,
    pub cols: usize,
    pub card_width_mm: f64,
    pub card_height_mm: f64,
    pub page_width_mm: f64,
    pub page_height_mm: f64,
}

impl LayoutConfig {
    /// One large card per A4 page.
    pub fn full_page() -> Self {
        Self {
            rows: 1,
            cols: 1,
            card_width_mm: 180.0,
            card_height_mm: 250.0,
            ..Self::default()
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            card_width_mm: 63.0,
            card_height_mm: 88.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub filename: String,
    pub directory: String,
    pub jpeg_quality: u8,
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: "carte.pdf".to_string(),
            directory: "./output".to_string(),
            jpeg_quality: 90,
            title: "Card sheet".to_string(),
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

impl SheetConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SheetError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| SheetError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl Validate for CatalogConfig {
    fn validate(&self) -> Result<()> {
        validate_url("catalog.base_url", &self.base_url)?;
        if self.lookup_style == LookupStyle::Query {
            validate_non_empty_string("catalog.query_param", &self.query_param)?;
        }
        if !self.image_pointer.starts_with('/') {
            return Err(SheetError::InvalidConfigValue {
                field: "catalog.image_pointer".to_string(),
                value: self.image_pointer.clone(),
                reason: "JSON pointer must start with '/'".to_string(),
            });
        }
        validate_positive_number("catalog.timeout_seconds", self.timeout_seconds as usize, 1)
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("fetch.concurrency", self.concurrency, 1)?;
        validate_positive_number("fetch.timeout_seconds", self.timeout_seconds as usize, 1)?;
        validate_range("fetch.print_dpi", self.print_dpi, 36, 1200)
    }
}

impl Validate for LayoutConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("layout.rows", self.rows, 1)?;
        validate_positive_number("layout.cols", self.cols, 1)?;
        validate_range("layout.card_width_mm", self.card_width_mm, 1.0, 2000.0)?;
        validate_range("layout.card_height_mm", self.card_height_mm, 1.0, 2000.0)?;
        validate_range("layout.page_width_mm", self.page_width_mm, 1.0, 5000.0)?;
        validate_range("layout.page_height_mm", self.page_height_mm, 1.0, 5000.0)?;

        // 網格必須放得進頁面
        let grid_width = self.cols as f64 * self.card_width_mm;
        let grid_height = self.rows as f64 * self.card_height_mm;
        if grid_width > self.page_width_mm || grid_height > self.page_height_mm {
            return Err(SheetError::InvalidConfigValue {
                field: "layout".to_string(),
                value: format!("{}x{} mm grid", grid_width, grid_height),
                reason: format!(
                    "grid does not fit on a {}x{} mm page",
                    self.page_width_mm, self.page_height_mm
                ),
            });
        }
        Ok(())
    }
}

impl Validate for OutputConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("output.filename", &self.filename)?;
        validate_non_empty_string("output.directory", &self.directory)?;
        validate_range("output.jpeg_quality", self.jpeg_quality, 1, 100)
    }
}

impl Validate for SheetConfig {
    fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        self.fetch.validate()?;
        self.layout.validate()?;
        self.output.validate()
    }
}
