mod config;

use clap::{Args, Parser};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
enum CliCommand {
    /// Run the log drain service
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

fn main() {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Run(args) => run(args),
    }
}

fn run(args: RunArgs) {
    let config = match config::Config::from_file(&args.config_file_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            process::exit(1);
        }
    };

    // Dropping the guard flushes pending sentry events
    let _sentry = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_layer = config
        .common
        .logging
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    if let Some(metrics_config) = &config.common.metrics {
        let recorder = StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
            .build(Some("logdrain"));
        match recorder {
            Ok(recorder) => {
                if let Err(e) = metrics::set_global_recorder(recorder) {
                    tracing::error!(error = %e, "Failed to install metrics recorder");
                }
                shared::describe_metrics!(log_ingest::metrics_defs::ALL_METRICS);
            }
            Err(e) => tracing::error!(error = %e, "Failed to build statsd recorder"),
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            process::exit(1);
        }
    };

    tracing::info!("Starting log drain");
    let result = runtime.block_on(async {
        tokio::select! {
            result = log_ingest::run(config.log_drain) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                Ok(())
            }
        }
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "Log drain exited");
        process::exit(1);
    }
}
