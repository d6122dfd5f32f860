mod config;
mod http;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_obs::init_tracing;
use platform_upstream::HttpEmployeeGateway;
use products_hr::{EmployeeService, aggregate};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "employee-api", version, about = "Employee API over the upstream employee service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Fetch the employee list once and report what the upstream returned.
    Check,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    init_tracing(app_config.obs.clone())?;
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Check => check_upstream(&app_config).await,
    }
}

fn employee_service(config: &AppConfig) -> Result<EmployeeService<HttpEmployeeGateway>> {
    let gateway =
        HttpEmployeeGateway::new(&config.upstream).context("failed to build upstream client")?;
    Ok(EmployeeService::new(gateway))
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    info!(upstream = %config.upstream.base_url, "using upstream employee service");
    let state = AppState::new(employee_service(&config)?, config.clone());
    http::serve(cmd.into(), state).await
}

async fn check_upstream(config: &AppConfig) -> Result<()> {
    let employees = employee_service(config)?.list_all().await;
    if employees.is_empty() {
        warn!(
            upstream = %config.upstream.base_url,
            "upstream returned no employees; it may be unreachable"
        );
    } else {
        info!(
            upstream = %config.upstream.base_url,
            count = employees.len(),
            highest_salary = aggregate::highest_salary(&employees),
            "upstream reachable"
        );
    }
    Ok(())
}
