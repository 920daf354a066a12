use clap::Parser;
use lite_permissions::config::{Command, JourneyCommand, ServiceCommand};
use lite_permissions::core::RegisterParam;
use lite_permissions::utils::error::ErrorCategory;
use lite_permissions::utils::logger::{self, LogFormat};
use lite_permissions::utils::validation::Validate;
use lite_permissions::{
    CliConfig, CorrelationId, Journey, PermissionsConfig, PermissionsError,
    PermissionsServiceClient, StaticTokenProvider,
};
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 日誌設定可來自命令列或設定檔的 [logging] 區塊
    let loaded = cli.load();
    let (json_logs, level) = match &loaded {
        Ok(config) => (cli.json_logs || config.json_logs(), config.log_level()),
        Err(_) => (cli.json_logs, None),
    };
    let level = if cli.verbose { Some("debug") } else { level };

    let format = if json_logs { LogFormat::Json } else { LogFormat::Compact };
    logger::init_logger(level, format);

    tracing::debug!("CLI command: {:?}", cli.command);

    if let Err(e) = run(&cli, loaded).await {
        tracing::error!("❌ {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e);

        let exit_code = match e.category() {
            ErrorCategory::Upstream => 1,
            ErrorCategory::Journey => 2,
            ErrorCategory::Configuration => 3,
            ErrorCategory::Io => 4,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(
    cli: &CliConfig,
    loaded: Result<PermissionsConfig, PermissionsError>,
) -> Result<(), PermissionsError> {
    let command = match &cli.command {
        // journey 子命令不需要連線設定
        Command::Journey(command) => return run_journey(command, &cli.journey_separators()?),
        Command::Service(command) => command,
    };

    let config = loaded?;
    config.validate()?;

    let client = build_client(&config)?;
    let correlation_id = cli
        .correlation_id
        .clone()
        .unwrap_or_else(CorrelationId::current_or_new);

    CorrelationId::scope(correlation_id, run_client(&client, command)).await
}

fn build_client(config: &PermissionsConfig) -> Result<PermissionsServiceClient, PermissionsError> {
    let token = config.token()?.clone();
    PermissionsServiceClient::new(config, Arc::new(StaticTokenProvider::new(token)))
}

async fn run_client(
    client: &PermissionsServiceClient,
    command: &ServiceCommand,
) -> Result<(), PermissionsError> {
    match command {
        ServiceCommand::RegisterOgel {
            payload,
            callback_url,
        } => {
            let content = std::fs::read_to_string(payload)?;
            let param: RegisterParam =
                serde_json::from_str(&content).map_err(|e| PermissionsError::ConfigError {
                    message: format!("Invalid payload {}: {}", payload.display(), e),
                })?;
            let request_id = client.register_ogel(&param, callback_url).await?;
            println!("{}", request_id);
        }
        ServiceCommand::OgelRegistrations { user_id } => {
            print_json(&client.get_ogel_registrations(user_id).await?)?;
        }
        ServiceCommand::OgelRegistration { user_id, reference } => {
            print_json(&client.get_ogel_registration(user_id, reference).await?)?;
        }
        ServiceCommand::Licences { user_id } => {
            print_json(&client.get_licences(user_id).await?)?;
        }
        ServiceCommand::Licence { user_id, reference } => {
            print_json(&client.get_licence(user_id, reference).await?)?;
        }
    }
    Ok(())
}

fn run_journey(
    command: &JourneyCommand,
    separators: &lite_permissions::JourneySeparators,
) -> Result<(), PermissionsError> {
    match command {
        JourneyCommand::New { name, stage } => {
            let journey = Journey::create(name.as_str(), stage.as_str())?;
            println!("{}", journey.serialize(separators));
        }
        JourneyCommand::Advance { serialized, stage } => {
            let mut journey = Journey::parse(Some(serialized.as_str()), separators)?.ok_or_else(|| {
                PermissionsError::JourneyFormat {
                    message: "cannot advance an empty journey".to_string(),
                }
            })?;
            journey.advance(stage.as_str());
            println!("{}", journey.serialize(separators));
        }
        JourneyCommand::Show { serialized } => match Journey::parse(serialized.as_deref(), separators)? {
            Some(journey) => {
                println!("name:    {}", journey.name());
                println!("current: {}", journey.current_stage());
                println!("history: {}", journey.history().join(" -> "));
            }
            None => println!("(no journey)"),
        },
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PermissionsError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| PermissionsError::ConfigError {
        message: format!("Unable to render output: {}", e),
    })?;
    println!("{}", json);
    Ok(())
}
