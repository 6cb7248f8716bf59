//! Landing zone engine - Entry Point
//!
//! Serves the deployment API and drives Terraform for each request.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use landing_zone::app::options::AppOptions;
use landing_zone::app::run::run;
use landing_zone::diagnostic::run_diagnostic;
use landing_zone::filesys::file::File;
use landing_zone::logs::{init_logging, LogOptions};
use landing_zone::storage::layout::StorageLayout;
use landing_zone::storage::settings::Settings;
use landing_zone::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", version.version),
        }
        return ExitCode::SUCCESS;
    }

    // Resolve storage and settings
    let mut layout = match cli_args.get("storage") {
        Some(dir) => StorageLayout::new(dir),
        None => env::var("LZ_STORAGE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(StorageLayout::new)
            .unwrap_or_default(),
    };
    let settings_file = cli_args
        .get("settings")
        .map(File::new)
        .unwrap_or_else(|| layout.settings_file());

    let mut settings = match Settings::load(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = settings.apply_env_vars() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    if !cli_args.contains_key("storage") {
        if let Some(dir) = &settings.storage_dir {
            layout = StorageLayout::new(dir);
        }
    }
    if let Some(port) = cli_args.get("port") {
        match port.parse() {
            Ok(port) => settings.server.port = port,
            Err(_) => {
                eprintln!("Invalid --port value: {}", port);
                return ExitCode::FAILURE;
            }
        }
    }

    let options = AppOptions::from_settings(&settings, layout);

    // Run diagnostics
    if cli_args.contains_key("diagnostic") || cli_args.contains_key("diag") {
        return match run_diagnostic(&options).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    }

    // Initialize logging
    let logs_dir = options.storage.logs_dir();
    let file_output = settings.log_to_file && logs_dir.create().await.is_ok();
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: logs_dir.path().to_path_buf(),
        json_format: settings.log_json,
        file_output,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the server
    info!("Running landing zone engine with options: {:?}", options);
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the engine: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Ctrl+C received, shutting down...");
                    }
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
