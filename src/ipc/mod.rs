use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use zbus::Connection;
use zbus::proxy::CacheProperties;
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use crate::error::{Error, Result};
use crate::models::{CurrentTrack, Offset, PlaybackStatus};

mod proxy;
use proxy::{MediaPlayer2Proxy, PlayerProxy};

#[derive(Clone)]
struct Handle {
    root: MediaPlayer2Proxy<'static>,
    player: PlayerProxy<'static>,
}

/// MPRIS client for the desktop player on the session bus.
///
/// The bus connection is opened on first use and shared by every later
/// call on the same client.
pub struct MprisClient {
    bus_name: String,
    handle: Mutex<Option<Handle>>,
}

impl MprisClient {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
            handle: Mutex::new(None),
        }
    }

    async fn handle(&self) -> Result<Handle> {
        let mut handle = self.handle.lock().await;
        if let Some(h) = handle.as_ref() {
            return Ok(h.clone());
        }

        let conn = Connection::session().await?;
        let root = MediaPlayer2Proxy::builder(&conn)
            .destination(self.bus_name.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let player = PlayerProxy::builder(&conn)
            .destination(self.bus_name.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        debug!(bus_name = %self.bus_name, "connected to session bus");

        let h = Handle { root, player };
        *handle = Some(h.clone());
        Ok(h)
    }

    async fn player(&self) -> Result<PlayerProxy<'static>> {
        Ok(self.handle().await?.player)
    }

    pub async fn next(&self) -> Result<()> {
        Ok(self.player().await?.next().await?)
    }

    pub async fn previous(&self) -> Result<()> {
        Ok(self.player().await?.previous().await?)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.player().await?.pause().await?)
    }

    pub async fn play(&self) -> Result<()> {
        Ok(self.player().await?.play().await?)
    }

    pub async fn stop(&self) -> Result<()> {
        Ok(self.player().await?.stop().await?)
    }

    pub async fn toggle(&self) -> Result<()> {
        Ok(self.player().await?.play_pause().await?)
    }

    pub async fn quit(&self) -> Result<()> {
        Ok(self.handle().await?.root.quit().await?)
    }

    pub async fn raise(&self) -> Result<()> {
        Ok(self.handle().await?.root.raise().await?)
    }

    pub async fn seek(&self, offset: Offset) -> Result<()> {
        Ok(self.player().await?.seek(offset.as_micros()).await?)
    }

    /// Jumps to `position` in `track_id`. The player ignores the call when
    /// the id is not the current track.
    pub async fn set_position(&self, track_id: &str, position: Duration) -> Result<()> {
        let path = ObjectPath::try_from(track_id)
            .map_err(|_| Error::InvalidTrackId(track_id.to_string()))?;
        let micros = i64::try_from(position.as_micros()).unwrap_or(i64::MAX);
        Ok(self.player().await?.set_position(&path, micros).await?)
    }

    pub async fn open(&self, uri: &str) -> Result<()> {
        Ok(self.player().await?.open_uri(uri).await?)
    }

    pub async fn current_track(&self) -> Result<CurrentTrack> {
        let metadata = self.player().await?.metadata().await.map_err(property_error)?;
        track_from_metadata(&metadata)
    }

    pub async fn status(&self) -> Result<PlaybackStatus> {
        let status = self
            .player()
            .await?
            .playback_status()
            .await
            .map_err(property_error)?;
        status.parse()
    }

    pub async fn length(&self) -> Result<Duration> {
        let metadata = self.player().await?.metadata().await.map_err(property_error)?;
        length_from_metadata(&metadata)
    }

    pub async fn position(&self) -> Result<Duration> {
        let micros = self
            .player()
            .await?
            .position()
            .await
            .map_err(property_error)?;
        micros_to_duration(micros)
    }

    pub async fn can_play(&self) -> Result<bool> {
        self.player().await?.can_play().await.map_err(property_error)
    }

    pub async fn can_go_next(&self) -> Result<bool> {
        self.player().await?.can_go_next().await.map_err(property_error)
    }

    pub async fn can_go_previous(&self) -> Result<bool> {
        self.player()
            .await?
            .can_go_previous()
            .await
            .map_err(property_error)
    }

    pub async fn can_control(&self) -> Result<bool> {
        self.player().await?.can_control().await.map_err(property_error)
    }
}

/// A property that arrived with the wrong type is a bad response, not a
/// failed call.
fn property_error(e: zbus::Error) -> Error {
    match e {
        zbus::Error::Variant(e) => Error::InvalidResponse(e.to_string()),
        other => Error::TransportCallFailed(other),
    }
}

fn entry<'a>(metadata: &'a HashMap<String, OwnedValue>, key: &str) -> Result<&'a Value<'static>> {
    let mut value: &Value<'static> = metadata
        .get(key)
        .ok_or_else(|| Error::InvalidResponse(format!("metadata has no {key:?}")))?;
    while let Value::Value(inner) = value {
        value = &**inner;
    }
    Ok(value)
}

fn string_entry<'a>(metadata: &'a HashMap<String, OwnedValue>, key: &str) -> Result<&'a str> {
    match entry(metadata, key)? {
        Value::Str(s) => Ok(s.as_str()),
        other => Err(Error::InvalidResponse(format!(
            "{key:?} is not a string: {other:?}"
        ))),
    }
}

fn track_from_metadata(metadata: &HashMap<String, OwnedValue>) -> Result<CurrentTrack> {
    let title = string_entry(metadata, "xesam:title")?;
    let url = string_entry(metadata, "xesam:url")?;
    let album = string_entry(metadata, "xesam:album")?;

    let artist = match entry(metadata, "xesam:artist")? {
        Value::Array(artists) => match artists.inner().first() {
            Some(Value::Str(s)) => s.as_str(),
            Some(other) => {
                return Err(Error::InvalidResponse(format!(
                    "\"xesam:artist\" holds a non-string: {other:?}"
                )));
            }
            None => {
                return Err(Error::InvalidResponse(
                    "\"xesam:artist\" is empty".to_string(),
                ));
            }
        },
        other => {
            return Err(Error::InvalidResponse(format!(
                "\"xesam:artist\" is not a list: {other:?}"
            )));
        }
    };

    let track_id = match entry(metadata, "mpris:trackid") {
        Ok(Value::ObjectPath(path)) => Some(path.to_string()),
        Ok(Value::Str(s)) => Some(s.to_string()),
        _ => None,
    };

    Ok(CurrentTrack {
        title: title.to_string(),
        url: url.to_string(),
        album: album.to_string(),
        artist: artist.to_string(),
        track_id,
    })
}

fn length_from_metadata(metadata: &HashMap<String, OwnedValue>) -> Result<Duration> {
    match entry(metadata, "mpris:length")? {
        Value::U64(us) => Ok(Duration::from_micros(*us)),
        Value::I64(us) => micros_to_duration(*us),
        other => Err(Error::InvalidResponse(format!(
            "\"mpris:length\" is not an integer: {other:?}"
        ))),
    }
}

fn micros_to_duration(micros: i64) -> Result<Duration> {
    u64::try_from(micros)
        .map(Duration::from_micros)
        .map_err(|_| Error::InvalidResponse(format!("negative time value {micros}")))
}
