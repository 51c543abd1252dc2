use crate::domain::model::Seat;
use crate::utils::error::{CouncilError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BUILTIN_CONFIG: &str = include_str!("default_council.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    pub council: SeatConfig,
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub coding: CodingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

/// Which provider sits in which seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatConfig {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    /// Any `/chat/completions` endpoint (Groq, OpenRouter, OpenAI, Ollama...).
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// 尚未替換的 `${VAR}` 或空字串視為沒有設定
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !(key.starts_with("${") && key.ends_with('}')))
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(120)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingConfig {
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,
    #[serde(default = "default_rounds")]
    pub max_qa_rounds: usize,
    #[serde(default = "default_rounds")]
    pub max_runtime_rounds: usize,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
    #[serde(default = "default_qa_context_chars")]
    pub qa_context_chars: usize,
    #[serde(default = "default_error_log_chars")]
    pub error_log_chars: usize,
    #[serde(default = "default_fix_context_chars")]
    pub fix_context_chars: usize,
    #[serde(default = "default_min_landing_page_chars")]
    pub min_landing_page_chars: usize,
}

fn default_projects_dir() -> String {
    ".".to_string()
}
fn default_rounds() -> usize {
    3
}
fn default_run_timeout() -> u64 {
    10
}
fn default_install_timeout() -> u64 {
    60
}
fn default_qa_context_chars() -> usize {
    50_000
}
fn default_error_log_chars() -> usize {
    2_000
}
fn default_fix_context_chars() -> usize {
    5_000
}
fn default_min_landing_page_chars() -> usize {
    1_500
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            max_qa_rounds: default_rounds(),
            max_runtime_rounds: default_rounds(),
            run_timeout_secs: default_run_timeout(),
            install_timeout_secs: default_install_timeout(),
            qa_context_chars: default_qa_context_chars(),
            error_log_chars: default_error_log_chars(),
            fix_context_chars: default_fix_context_chars(),
            min_landing_page_chars: default_min_landing_page_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub strip_markdown: bool,
    pub transcripts_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            strip_markdown: true,
            transcripts_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl CouncilConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CouncilError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 內建的三個供應商 (gemini / groq / openrouter)
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CouncilError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GROQ_API_KEY})；找不到的保留原字串
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;
        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn provider_name(&self, seat: Seat) -> &str {
        match seat {
            Seat::Primary => &self.council.primary,
            Seat::Secondary => &self.council.secondary,
            Seat::Tertiary => &self.council.tertiary,
        }
    }

    pub fn provider_for(&self, seat: Seat) -> Result<&ProviderConfig> {
        let name = self.provider_name(seat);
        self.providers
            .get(name)
            .ok_or_else(|| CouncilError::InvalidConfigValueError {
                field: format!("council.{}", seat),
                value: name.to_string(),
                reason: "No provider with this name is configured".to_string(),
            })
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        for seat in Seat::ALL {
            let name = self.provider_name(seat);
            validation::validate_non_empty_string(&format!("council.{}", seat), name)?;
            let provider = self.provider_for(seat)?;

            validation::validate_url(&format!("providers.{}.base_url", name), &provider.base_url)?;
            validation::validate_non_empty_string(
                &format!("providers.{}.model", name),
                &provider.model,
            )?;
            if provider.resolved_api_key().is_none() {
                return Err(CouncilError::MissingConfigError {
                    field: format!("providers.{}.api_key", name),
                });
            }
            validation::validate_range(
                &format!("providers.{}.request_timeout_secs", name),
                provider.request_timeout_secs(),
                1,
                3600,
            )?;
        }

        validation::validate_path("coding.projects_dir", &self.coding.projects_dir)?;
        validation::validate_positive_number("coding.max_qa_rounds", self.coding.max_qa_rounds, 1)?;
        validation::validate_positive_number(
            "coding.max_runtime_rounds",
            self.coding.max_runtime_rounds,
            1,
        )?;
        validation::validate_range("coding.run_timeout_secs", self.coding.run_timeout_secs, 1, 600)?;
        validation::validate_range(
            "coding.install_timeout_secs",
            self.coding.install_timeout_secs,
            1,
            3600,
        )?;
        validation::validate_positive_number(
            "coding.qa_context_chars",
            self.coding.qa_context_chars,
            1,
        )?;

        if let Some(dir) = &self.output.transcripts_dir {
            validation::validate_path("output.transcripts_dir", dir)?;
        }

        Ok(())
    }
}

impl Validate for CouncilConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_PROVIDER_CONFIG: &str = r#"
[council]
primary = "local"
secondary = "local"
tertiary = "hosted"

[providers.local]
kind = "openai"
base_url = "http://localhost:11434/v1"
model = "llama3"
api_key = "unused"

[providers.hosted]
kind = "gemini"
base_url = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-2.0-flash"
api_key = "secret"
request_timeout_secs = 30

[coding]
projects_dir = "./projects"
max_qa_rounds = 2
"#;

    #[test]
    fn test_parse_council_config() {
        let config = CouncilConfig::from_toml_str(TWO_PROVIDER_CONFIG).unwrap();

        assert_eq!(config.provider_name(Seat::Secondary), "local");
        assert_eq!(
            config.provider_for(Seat::Tertiary).unwrap().kind,
            ProviderKind::Gemini
        );
        assert_eq!(config.coding.max_qa_rounds, 2);
        // 未指定的欄位使用預設值
        assert_eq!(config.coding.max_runtime_rounds, 3);
        assert_eq!(config.coding.run_timeout_secs, 10);
        assert!(config.output.strip_markdown);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COUNCIL_TEST_LOCAL_KEY", "from-env");

        let content = TWO_PROVIDER_CONFIG.replace("\"unused\"", "\"${COUNCIL_TEST_LOCAL_KEY}\"");
        let config = CouncilConfig::from_toml_str(&content).unwrap();
        assert_eq!(
            config.providers["local"].resolved_api_key(),
            Some("from-env")
        );

        std::env::remove_var("COUNCIL_TEST_LOCAL_KEY");
    }

    #[test]
    fn test_unset_key_fails_validation() {
        let content =
            TWO_PROVIDER_CONFIG.replace("\"secret\"", "\"${COUNCIL_TEST_DEFINITELY_UNSET}\"");
        let config = CouncilConfig::from_toml_str(&content).unwrap();

        match config.validate().unwrap_err() {
            CouncilError::MissingConfigError { field } => {
                assert_eq!(field, "providers.hosted.api_key")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_seat_provider() {
        let content = TWO_PROVIDER_CONFIG.replace("tertiary = \"hosted\"", "tertiary = \"nope\"");
        let config = CouncilConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let content = TWO_PROVIDER_CONFIG.replace("http://localhost:11434/v1", "localhost");
        let config = CouncilConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builtin_config_shape() {
        let config = CouncilConfig::builtin().unwrap();
        assert_eq!(config.provider_name(Seat::Primary), "gemini");
        assert_eq!(config.provider_name(Seat::Secondary), "groq");
        assert_eq!(config.provider_name(Seat::Tertiary), "openrouter");
        let openrouter = &config.providers["openrouter"];
        assert_eq!(
            openrouter.headers.as_ref().unwrap()["X-Title"],
            "Multi LLM CLI Tool"
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(TWO_PROVIDER_CONFIG.as_bytes()).unwrap();

        let config = CouncilConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.coding.projects_dir, "./projects");
    }
}
