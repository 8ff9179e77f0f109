use anyhow::{Context, Result, anyhow, bail};
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::Error;
use crate::ipc::MprisClient;
use crate::models::{Offset, SearchKind, format_duration};
use crate::process::ProcessController;
use crate::search::{HttpFetch, SearchClient, SearchEvent};

pub struct App {
    pub config: Config,
    process: ProcessController,
    player: MprisClient,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let process = ProcessController::new(config.process.name.clone());
        let player = MprisClient::new(config.player.bus_name.clone());
        Self {
            config,
            process,
            player,
        }
    }

    fn search_client(&self, token: Option<String>) -> Result<SearchClient> {
        let search = &self.config.search;
        let fetch = HttpFetch::new(search.timeout(), token.or_else(|| search.token.clone()))
            .context("Failed to build HTTP client")?;
        SearchClient::new(Arc::new(fetch), &search.endpoint, search.page_size)
            .with_context(|| format!("Invalid search endpoint {:?}", search.endpoint))
    }

    // Process

    pub fn run(&self) -> Result<()> {
        let pid = self.process.start()?;
        println!("Started {} (pid {pid})", self.process.name());
        Ok(())
    }

    pub fn kill(&self) -> Result<()> {
        let pid = self.process.kill()?;
        println!("Killed {} (pid {pid})", self.process.name());
        Ok(())
    }

    pub fn ping(&self) -> Result<()> {
        match self.process.ping() {
            Ok(_) => println!("Running"),
            Err(Error::NotRunning { .. }) => println!("Not running"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn pid(&self) -> Result<()> {
        println!("{}", self.process.attach()?);
        Ok(())
    }

    // Transport

    pub async fn raise(&self) -> Result<()> {
        self.player.raise().await?;
        Ok(())
    }

    pub async fn quit(&self) -> Result<()> {
        self.player.quit().await?;
        Ok(())
    }

    pub async fn next(&self) -> Result<()> {
        self.player.next().await?;
        Ok(())
    }

    pub async fn previous(&self) -> Result<()> {
        self.player.previous().await?;
        Ok(())
    }

    pub async fn open(&self, uri: &str) -> Result<()> {
        self.player
            .open(uri)
            .await
            .with_context(|| format!("Failed to open {uri}"))?;
        Ok(())
    }

    pub async fn seek(&self, offset: Offset) -> Result<()> {
        self.player.seek(offset).await?;
        println!("Seeked {offset}");
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        self.player.play().await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        self.player.pause().await?;
        println!("Paused");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        self.player.stop().await?;
        println!("Stopped");
        Ok(())
    }

    pub async fn toggle(&self) -> Result<()> {
        self.player.toggle().await?;
        Ok(())
    }

    pub async fn set_position(&self, position: Duration) -> Result<()> {
        let track = self.player.current_track().await?;
        let Some(track_id) = track.track_id else {
            bail!("Current track has no track id");
        };
        self.player.set_position(&track_id, position).await?;
        println!("Position: {}", format_duration(position));
        Ok(())
    }

    // Queries

    pub async fn status(&self) -> Result<()> {
        println!("{}", self.player.status().await?);
        Ok(())
    }

    pub async fn track(&self) -> Result<()> {
        println!("{}", self.player.current_track().await?);
        Ok(())
    }

    pub async fn length(&self) -> Result<()> {
        println!("{}", format_duration(self.player.length().await?));
        Ok(())
    }

    pub async fn position(&self) -> Result<()> {
        println!("{}", format_duration(self.player.position().await?));
        Ok(())
    }

    pub async fn can_play(&self) -> Result<()> {
        println!("{}", self.player.can_play().await?);
        Ok(())
    }

    pub async fn can_go_next(&self) -> Result<()> {
        println!("{}", self.player.can_go_next().await?);
        Ok(())
    }

    pub async fn can_go_previous(&self) -> Result<()> {
        println!("{}", self.player.can_go_previous().await?);
        Ok(())
    }

    pub async fn can_control(&self) -> Result<()> {
        println!("{}", self.player.can_control().await?);
        Ok(())
    }

    // Search

    pub async fn search(
        &self,
        kind: SearchKind,
        term: &str,
        interactive: bool,
        token: Option<String>,
    ) -> Result<()> {
        let client = self.search_client(token)?;
        let shown = match kind {
            SearchKind::Artist => print_results(client.artists(term)).await,
            SearchKind::Album => print_results(client.albums(term)).await,
            SearchKind::Track => print_results(client.tracks(term)).await,
        }
        .with_context(|| format!("{kind} search for {term:?} failed"))?;

        if shown == 0 {
            println!("No {} found.", kind.envelope_key());
            return Ok(());
        }

        if interactive {
            let uri = prompt("Play: ").await?;
            if !uri.is_empty() {
                self.open(&uri).await?;
            }
        }
        Ok(())
    }
}

/// Prints every page as it arrives and returns the number of results shown.
async fn print_results<T: Display>(mut events: mpsc::Receiver<SearchEvent<T>>) -> Result<usize> {
    let mut shown = 0;
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::Page(items) => {
                for item in &items {
                    println!("{item}");
                }
                shown += items.len();
            }
            SearchEvent::Failed(e) => return Err(e.into()),
            done => {
                debug_assert!(done.is_end_of_results());
                return Ok(shown);
            }
        }
    }
    Err(anyhow!("search stopped without reporting an outcome"))
}

async fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artist;

    #[tokio::test]
    async fn test_print_results_counts_pages() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(SearchEvent::Page(vec![
            Artist::new("spotify:artist:1", "Tenacious D"),
            Artist::new("spotify:artist:2", "Tenacious Defenders"),
        ]))
        .await
        .unwrap();
        tx.send(SearchEvent::Page(vec![Artist::new("spotify:artist:3", "D")]))
            .await
            .unwrap();
        tx.send(SearchEvent::Done).await.unwrap();

        assert_eq!(print_results(rx).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_print_results_failure() {
        let (tx, rx) = mpsc::channel::<SearchEvent<Artist>>(4);
        tx.send(SearchEvent::Failed(Error::RemoteApi {
            status: 429,
            message: "API rate limit exceeded".to_string(),
        }))
        .await
        .unwrap();

        let err = print_results(rx).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_print_results_closed_without_outcome() {
        let (tx, rx) = mpsc::channel::<SearchEvent<Artist>>(1);
        drop(tx);
        assert!(print_results(rx).await.is_err());
    }

    #[test]
    fn test_ping_not_running() {
        let mut config = Config::default();
        config.process.name = "sscc-test-no-such-process".to_string();
        let app = App::with_config(config);
        assert!(app.ping().is_ok());
    }
}
