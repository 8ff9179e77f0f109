use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Offset;

mod commands;
pub use commands::*;

#[derive(Parser)]
#[command(name = "sscc")]
#[command(about = "A command-line controller for the Spotify desktop app")]
#[command(version)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "SSCC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the desktop app
    Run,

    /// Kill the desktop app
    Kill,

    /// Check whether the desktop app is running
    Ping,

    /// Show the pid of the running desktop app
    Pid,

    /// Bring the player window to the front
    Raise,

    /// Ask the player to quit
    Quit,

    /// Skip to the next track
    Next,

    /// Go to the previous track
    #[command(name = "prev")]
    Previous,

    /// Play a track, album, artist or playlist by URI
    Open {
        /// Spotify URI, e.g. spotify:track:6rqhFgbbKwnb9MLmUQDhG6
        uri: String,
    },

    /// Seek relative to the current position (e.g. "30s", "-1m 5s")
    Seek {
        #[arg(allow_hyphen_values = true)]
        offset: Offset,
    },

    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Stop playback
    Stop,

    /// Toggle between play and pause
    Toggle,

    /// Show the playback status
    Status,

    /// Show the current track
    Track,

    /// Jump to a position in the current track (e.g. "1m 30s")
    #[command(name = "setpos")]
    SetPosition { position: humantime::Duration },

    /// Show the length of the current track
    Length,

    /// Show the position in the current track
    #[command(name = "pos")]
    Position,

    /// Can the player start playback
    #[command(name = "canplay")]
    CanPlay,

    /// Can the player skip to the next track
    #[command(name = "cannext")]
    CanNext,

    /// Can the player go back to the previous track
    #[command(name = "canprev")]
    CanPrevious,

    /// Can the player be controlled at all
    #[command(name = "canctrl")]
    CanControl,

    /// Search the catalog
    Search {
        #[command(subcommand)]
        command: SearchCommands,

        /// Bearer token for the web API
        #[arg(long, global = true, env = "SSCC_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SearchCommands {
    /// Search for artists
    Artist(SearchArgs),
    /// Search for albums
    Album(SearchArgs),
    /// Search for tracks
    Track(SearchArgs),
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Search term
    pub term: String,

    /// Prompt for a URI to play once results are listed
    #[arg(short, long)]
    pub interactive: bool,
}
