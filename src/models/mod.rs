use std::fmt;
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub uri: String,
    pub name: String,
}

impl Artist {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uri)
    }
}

/// Album search result. `artists` stays empty until the album has been
/// looked up individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub uri: String,
    pub name: String,
    pub artists: Vec<Artist>,
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.artists.is_empty() {
            write!(f, " by {}", artist_names(&self.artists))?;
        }
        write!(f, " ({})", self.uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub name: String,
    pub album_uri: String,
    pub album_name: String,
    pub artists: Vec<Artist>,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.artists.is_empty() {
            write!(f, " by {}", artist_names(&self.artists))?;
        }
        write!(f, " on {} ({})", self.album_name, self.uri)
    }
}

fn artist_names(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Artist,
    Album,
    Track,
}

impl SearchKind {
    /// Value of the `type` query parameter.
    pub fn tag(self) -> &'static str {
        match self {
            SearchKind::Artist => "artist",
            SearchKind::Album => "album",
            SearchKind::Track => "track",
        }
    }

    /// Name of the single top-level object in a search response.
    pub fn envelope_key(self) -> &'static str {
        match self {
            SearchKind::Artist => "artists",
            SearchKind::Album => "albums",
            SearchKind::Track => "tracks",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Paused => write!(f, "Paused"),
        }
    }
}

impl std::str::FromStr for PlaybackStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Playing" => Ok(PlaybackStatus::Playing),
            "Paused" => Ok(PlaybackStatus::Paused),
            _ => Err(Error::UnsupportedStatus(s.to_string())),
        }
    }
}

/// Now-playing metadata as reported by the player.
///
/// Only the first artist is kept, even when the player lists several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrack {
    pub title: String,
    pub url: String,
    pub album: String,
    pub artist: String,
    pub track_id: Option<String>,
}

impl fmt::Display for CurrentTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:  {}", self.title)?;
        writeln!(f, "Artist: {}", self.artist)?;
        writeln!(f, "Album:  {}", self.album)?;
        write!(f, "URL:    {}", self.url)
    }
}

/// Relative seek offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Forward(Duration),
    Backward(Duration),
}

impl Offset {
    /// Signed microseconds, saturating at `i64` bounds.
    pub fn as_micros(self) -> i64 {
        match self {
            Offset::Forward(d) => i64::try_from(d.as_micros()).unwrap_or(i64::MAX),
            Offset::Backward(d) => i64::try_from(d.as_micros())
                .map(|us| -us)
                .unwrap_or(i64::MIN),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Forward(d) => write!(f, "+{}", humantime::format_duration(*d)),
            Offset::Backward(d) => write!(f, "-{}", humantime::format_duration(*d)),
        }
    }
}

impl std::str::FromStr for Offset {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('-') {
            humantime::parse_duration(rest).map(Offset::Backward)
        } else {
            humantime::parse_duration(s.strip_prefix('+').unwrap_or(s)).map(Offset::Forward)
        }
    }
}

/// Formats a bus duration for display, dropping sub-millisecond noise.
pub fn format_duration(d: Duration) -> String {
    let millis = Duration::from_millis(d.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}
