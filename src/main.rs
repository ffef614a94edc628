use am_management::{config::Config, jwt::JwtManager, server, telemetry};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "am-management", about = "Access management administration API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a management token for a platform user
    IssueToken {
        #[arg(long, env = "AM_TOKEN_USER_ID")]
        user_id: String,
        #[arg(long, env = "AM_TOKEN_USERNAME")]
        username: String,
        #[arg(long)]
        display_name: Option<String>,
        /// Defaults to the bootstrap organization
        #[arg(long)]
        organization_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let prometheus_handle = telemetry::init(&config.telemetry)?;
            info!("Starting {}", config.telemetry.service_name);
            info!("HTTP server listening on {}", config.http_addr());
            server::run(config, prometheus_handle).await
        }
        Command::IssueToken {
            user_id,
            username,
            display_name,
            organization_id,
        } => {
            let organization_id =
                organization_id.unwrap_or_else(|| config.bootstrap.organization_id.clone());
            let jwt_manager = JwtManager::new(config.jwt)?;
            let token = jwt_manager.create_management_token(
                &user_id,
                &username,
                display_name.as_deref(),
                &organization_id,
            )?;
            println!("{}", token);
            Ok(())
        }
    }
}
