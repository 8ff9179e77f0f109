mod cli;
mod config;
mod error;
mod ipc;
mod models;
mod process;
mod search;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{App, Cli, Commands, SearchCommands};
use models::SearchKind;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => {
            app.run()?;
        }
        Commands::Kill => {
            app.kill()?;
        }
        Commands::Ping => {
            app.ping()?;
        }
        Commands::Pid => {
            app.pid()?;
        }
        Commands::Raise => {
            app.raise().await?;
        }
        Commands::Quit => {
            app.quit().await?;
        }
        Commands::Next => {
            app.next().await?;
        }
        Commands::Previous => {
            app.previous().await?;
        }
        Commands::Open { uri } => {
            app.open(&uri).await?;
        }
        Commands::Seek { offset } => {
            app.seek(offset).await?;
        }
        Commands::Play => {
            app.play().await?;
        }
        Commands::Pause => {
            app.pause().await?;
        }
        Commands::Stop => {
            app.stop().await?;
        }
        Commands::Toggle => {
            app.toggle().await?;
        }
        Commands::Status => {
            app.status().await?;
        }
        Commands::Track => {
            app.track().await?;
        }
        Commands::SetPosition { position } => {
            app.set_position(position.into()).await?;
        }
        Commands::Length => {
            app.length().await?;
        }
        Commands::Position => {
            app.position().await?;
        }
        Commands::CanPlay => {
            app.can_play().await?;
        }
        Commands::CanNext => {
            app.can_go_next().await?;
        }
        Commands::CanPrevious => {
            app.can_go_previous().await?;
        }
        Commands::CanControl => {
            app.can_control().await?;
        }
        Commands::Search { command, token } => {
            let (kind, args) = match command {
                SearchCommands::Artist(args) => (SearchKind::Artist, args),
                SearchCommands::Album(args) => (SearchKind::Album, args),
                SearchCommands::Track(args) => (SearchKind::Track, args),
            };
            app.search(kind, &args.term, args.interactive, token).await?;
        }
    }

    Ok(())
}
