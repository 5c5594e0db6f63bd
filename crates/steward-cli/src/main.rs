use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use steward_core::config::Settings;
use steward_core::domain::{FailureReport, Report};
use steward_core::impls::FixtureCloud;
use steward_core::ports::CloudClient;
use steward_core::{Invoker, Poller, Reconciler, StewardError};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;

use args::{Cli, Command, GlobalArgs};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = match load_settings(&cli.global) {
        Ok(settings) => settings,
        Err(err) => return report_failure(&err),
    };
    init_tracing(&settings.log_level, cli.global.log_json)?;

    match run(cli.command, &settings).await {
        Ok(report) => {
            println!("{}", serde_json::to_string(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = err.kind(), "{err}");
            report_failure(&err)
        }
    }
}

/// 設定ファイル・環境変数に CLI フラグを重ねる
fn load_settings(global: &GlobalArgs) -> Result<Settings, StewardError> {
    let mut settings = Settings::load(global.config.as_deref())?;
    if let Some(region) = &global.region {
        settings.region = Some(region.clone());
    }
    if let Some(access_key) = &global.access_key {
        settings.access_key = Some(access_key.clone());
    }
    if let Some(secret_key) = &global.secret_key {
        settings.secret_key = Some(secret_key.clone());
    }
    if let Some(fixture) = &global.fixture {
        settings.fixture = Some(fixture.clone());
    }
    if let Some(log_level) = &global.log_level {
        settings.log_level = log_level.clone();
    }
    Ok(settings)
}

fn init_tracing(log_level: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    // stdout is reserved for the JSON report
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn connect(settings: &Settings) -> Result<Arc<dyn CloudClient>, StewardError> {
    let connection = settings.connection()?;
    let fixture = settings.fixture.as_deref().ok_or_else(|| {
        StewardError::Config(
            "no provider configured: pass --fixture or set STEWARD_FIXTURE".to_string(),
        )
    })?;
    let cloud = FixtureCloud::load(fixture)?;
    debug!(
        region = %connection.region,
        fixture = %cloud.path().display(),
        explicit_credentials = connection.credentials.is_some(),
        "provider ready"
    );
    Ok(Arc::new(cloud))
}

async fn run(command: Command, settings: &Settings) -> Result<Report, StewardError> {
    let client = connect(settings)?;

    match command {
        Command::Wait(args) => {
            let spec = args.into_spec();
            Poller::new(client).wait(&spec).await?.into_result()?;
            Ok(Report::unchanged())
        }
        Command::Tags(args) => {
            let desired = args.tags.unwrap_or_default();
            let result = Reconciler::new(client)
                .reconcile(args.state, &args.name, &desired, args.check)
                .await?;
            Ok(Report::with_tags(result.changed, result.tags))
        }
        Command::Call(args) => {
            let invocation = Invoker::new(client)
                .invoke(&args.name, &args.operation, &args.parameters)
                .await?;
            Ok(Report::with_response(invocation.response))
        }
    }
}

fn report_failure(err: &StewardError) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string(&FailureReport::from(err))?);
    Ok(ExitCode::FAILURE)
}
