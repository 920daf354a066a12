pub mod toml_config;

pub use toml_config::PermissionsConfig;

#[cfg(feature = "cli")]
use crate::core::journey::JourneySeparators;
#[cfg(feature = "cli")]
use toml_config::JourneyFile;

#[cfg(feature = "cli")]
use crate::utils::error::{PermissionsError, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "lite-permissions")]
#[command(about = "Query the permissions service and inspect journey strings")]
pub struct CliConfig {
    #[arg(long, env = "PERMISSIONS_CONFIG", default_value = "permissions.toml")]
    pub config: PathBuf,

    #[arg(long, env = "PERMISSIONS_SERVICE_ADDRESS", help = "Overrides permissions_service.address")]
    pub address: Option<String>,

    #[arg(long, env = "PERMISSIONS_SERVICE_TIMEOUT", help = "Overrides permissions_service.timeout_millis")]
    pub timeout_millis: Option<u64>,

    #[arg(long, env = "PERMISSIONS_SERVICE_TOKEN", hide_env_values = true, help = "Overrides auth.token")]
    pub token: Option<String>,

    #[arg(long, help = "Correlation id sent with every request")]
    pub correlation_id: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Service(ServiceCommand),
    /// Create, advance or inspect a serialized journey
    #[command(subcommand)]
    Journey(JourneyCommand),
}

/// Commands that call the permissions service.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum ServiceCommand {
    /// Register an OGEL from a JSON payload file
    RegisterOgel {
        #[arg(long)]
        payload: PathBuf,
        #[arg(long)]
        callback_url: String,
    },
    /// List a user's OGEL registrations
    OgelRegistrations { user_id: String },
    /// Fetch a single OGEL registration by reference
    OgelRegistration { user_id: String, reference: String },
    /// List a user's licences
    Licences { user_id: String },
    /// Fetch a single licence by reference
    Licence { user_id: String, reference: String },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum JourneyCommand {
    New { name: String, stage: String },
    Advance { serialized: String, stage: String },
    Show { serialized: Option<String> },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// journey 子命令只需要 `[journey]` 區塊；設定檔不存在時才用預設分隔符
    pub fn journey_separators(&self) -> Result<JourneySeparators> {
        if !self.config.exists() {
            return Ok(JourneySeparators::default());
        }
        JourneyFile::from_file(&self.config)?.separators()
    }

    /// 讀取設定檔，並套用命令列參數覆寫
    pub fn load(&self) -> Result<PermissionsConfig> {
        let mut config = if self.config.exists() {
            PermissionsConfig::from_file(&self.config)?
        } else {
            let address = self.address.clone().ok_or_else(|| PermissionsError::ConfigError {
                message: format!(
                    "{} not found and no --address given",
                    self.config.display()
                ),
            })?;
            PermissionsConfig {
                permissions_service: toml_config::ServiceConfig {
                    address,
                    timeout_millis: None,
                },
                auth: None,
                journey: None,
                logging: None,
            }
        };

        if let Some(address) = &self.address {
            config.permissions_service.address = address.clone();
        }
        if let Some(timeout) = self.timeout_millis {
            config.permissions_service.timeout_millis = Some(timeout);
        }
        if let Some(token) = &self.token {
            config.auth = Some(toml_config::AuthConfig {
                token: Some(token.clone()),
            });
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_overrides_without_config_file() {
        let cli = CliConfig::parse_from([
            "lite-permissions",
            "--config",
            "does-not-exist.toml",
            "--address",
            "http://localhost:7000",
            "--timeout-millis",
            "300",
            "--token",
            "jwt",
            "licences",
            "user-1",
        ]);

        let config = cli.load().unwrap();

        assert_eq!(config.address(), "http://localhost:7000");
        assert_eq!(config.timeout_millis(), 300);
        assert_eq!(config.token().unwrap(), "jwt");
        assert!(matches!(
            cli.command,
            Command::Service(ServiceCommand::Licences { ref user_id }) if user_id == "user-1"
        ));
    }

    #[test]
    fn test_missing_config_and_address() {
        let cli = CliConfig::parse_from([
            "lite-permissions",
            "--config",
            "does-not-exist.toml",
            "journey",
            "show",
        ]);

        assert!(cli.load().is_err());
        assert_eq!(cli.journey_separators().unwrap(), JourneySeparators::default());
    }

    #[test]
    fn test_journey_separators_from_journey_only_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[journey]\nname_separator = \"~\"\nstage_separator = \",\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap();

        let cli = CliConfig::parse_from(["lite-permissions", "--config", path, "journey", "new", "J", "s0"]);

        assert!(cli.load().is_err());
        assert_eq!(
            cli.journey_separators().unwrap(),
            JourneySeparators::new('~', ',').unwrap()
        );
        assert!(matches!(
            cli.command,
            Command::Journey(JourneyCommand::New { ref name, .. }) if name == "J"
        ));
    }

    #[test]
    fn test_journey_separators_propagate_broken_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[journey]\nname_separator = \"~~\"\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap();

        let cli = CliConfig::parse_from(["lite-permissions", "--config", path, "journey", "show"]);

        assert!(matches!(
            cli.journey_separators(),
            Err(PermissionsError::InvalidConfigValueError { .. })
        ));

        let mut unparsable = NamedTempFile::new().unwrap();
        unparsable.write_all(b"[journey\n").unwrap();
        let path = unparsable.path().to_str().unwrap();
        let cli = CliConfig::parse_from(["lite-permissions", "--config", path, "journey", "show"]);

        assert!(matches!(
            cli.journey_separators(),
            Err(PermissionsError::ConfigError { .. })
        ));
    }
}
