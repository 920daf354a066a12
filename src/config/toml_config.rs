use crate::core::journey::JourneySeparators;
use crate::core::ConfigProvider;
use crate::utils::error::{PermissionsError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_MILLIS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    pub permissions_service: ServiceConfig,
    pub auth: Option<AuthConfig>,
    pub journey: Option<JourneyConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub address: String,
    pub timeout_millis: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyConfig {
    pub name_separator: Option<String>,
    pub stage_separator: Option<String>,
}

impl JourneyConfig {
    pub fn separators(&self) -> Result<JourneySeparators> {
        let defaults = JourneySeparators::default();

        let name = match &self.name_separator {
            Some(value) => validation::validate_single_char("journey.name_separator", value)?,
            None => defaults.name(),
        };
        let stage = match &self.stage_separator {
            Some(value) => validation::validate_single_char("journey.stage_separator", value)?,
            None => defaults.stage(),
        };

        JourneySeparators::new(name, stage)
    }
}

/// 只讀取 `[journey]` 區塊，其他區塊 (包括 `[permissions_service]`) 可有可無
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JourneyFile {
    pub journey: Option<JourneyConfig>,
}

impl JourneyFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PermissionsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = PermissionsConfig::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PermissionsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn separators(&self) -> Result<JourneySeparators> {
        match &self.journey {
            Some(journey) => journey.separators(),
            None => Ok(JourneySeparators::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl PermissionsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PermissionsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PermissionsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PERMISSIONS_JWT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PermissionsError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout_millis(&self) -> u64 {
        self.permissions_service
            .timeout_millis
            .unwrap_or(DEFAULT_TIMEOUT_MILLIS)
    }

    pub fn token(&self) -> Result<&String> {
        let token = self.auth.as_ref().and_then(|a| a.token.as_ref());
        validation::validate_required_field("auth.token", &token).copied()
    }

    /// 未設定時使用預設的 `_` 和 `|`
    pub fn journey_separators(&self) -> Result<JourneySeparators> {
        match &self.journey {
            Some(journey) => journey.separators(),
            None => Ok(JourneySeparators::default()),
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("permissions_service.address", &self.permissions_service.address)?;
        validation::validate_positive_number(
            "permissions_service.timeout_millis",
            self.timeout_millis(),
            1,
        )?;

        if let Some(token) = self.auth.as_ref().and_then(|a| a.token.as_ref()) {
            validation::validate_non_empty_string("auth.token", token)?;
        }

        self.journey_separators()?;
        Ok(())
    }
}

impl ConfigProvider for PermissionsConfig {
    fn address(&self) -> &str {
        &self.permissions_service.address
    }

    fn timeout_millis(&self) -> u64 {
        self.timeout_millis()
    }
}

impl Validate for PermissionsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
