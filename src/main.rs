use anyhow::Context;
use clap::Parser;
use drive_amplifier::config::LogFormat;
use drive_amplifier::core::attributes;
use drive_amplifier::utils::error::ErrorSeverity;
use drive_amplifier::utils::{logger, validation::Validate};
use drive_amplifier::{
    AlarmMonitor, CliCommand, CliConfig, DeviceConfig, DeviceError, DriveAmplifier, SignalValue,
    TangoRestSource,
};
use std::sync::Arc;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if let CliCommand::Attributes = cli.command {
        print_attribute_table();
        return Ok(());
    }

    // 載入 TOML 配置
    let config = match DeviceConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.log_format() {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    tracing::info!("🚀 Starting drive amplifier {}", config.device.name);
    tracing::debug!("Configuration: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let span = logger::device_span(&config.device.name);
    if let Err(e) = run(&cli, &config).instrument(span).await {
        tracing::error!(
            "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
            config.device.name,
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: &DeviceConfig) -> Result<(), DeviceError> {
    let source = TangoRestSource::new(&config.rest)?;
    let device = Arc::new(DriveAmplifier::new(source, &config.properties)?);
    device.init_device();

    match &cli.command {
        CliCommand::Serve => serve(device, config).await,
        CliCommand::Status => {
            let outcome = device.check_alarms().await;
            let snapshot = device.state();
            println!("State:  {}", snapshot.state);
            println!("Status: {}", snapshot.status);
            outcome.map(|_| ())
        }
        CliCommand::Read { attribute } => {
            let value = device.read_attribute(attribute).await?;
            println!("{} = {}", attribute, value);
            Ok(())
        }
        CliCommand::Write { attribute, value } => {
            let parsed = SignalValue::parse_literal(value).ok_or_else(|| {
                DeviceError::InvalidConfigValueError {
                    field: attribute.clone(),
                    value: value.clone(),
                    reason: "Expected true, false or a number".to_string(),
                }
            })?;
            device.write_attribute(attribute, parsed).await?;
            println!("✅ {} <- {}", attribute, parsed);
            Ok(())
        }
        CliCommand::Exec { command } => {
            let result = device.execute_command(command).await?;
            println!("✅ {} -> {}", command, result);
            Ok(())
        }
        CliCommand::Attributes => {
            print_attribute_table();
            Ok(())
        }
    }
}

async fn serve(device: Arc<DriveAmplifier<TangoRestSource>>, config: &DeviceConfig) -> Result<(), DeviceError> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let monitor = AlarmMonitor::new(device.clone(), config.poll_interval());
    let handle = tokio::spawn(monitor.run(shutdown_rx).in_current_span());

    if let Err(e) = wait_for_interrupt().await {
        tracing::error!("{:#}", e);
    }
    tracing::info!("🛑 Shutting down");

    let _ = shutdown_tx.send(true);
    if let Err(e) = handle.await {
        tracing::error!("Alarm monitor task failed: {}", e);
    }

    let snapshot = device.state();
    tracing::info!("Final state: {} ({})", snapshot.state, snapshot.status);
    Ok(())
}

async fn wait_for_interrupt() -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
}

fn print_attribute_table() {
    print!("{}", attributes::render_table());
}
