//! Wire formats of the catalog API and their conversion to public models.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Album, Artist, SearchKind, Track};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    status: u16,
    #[serde(default)]
    message: String,
}

/// Parses a body, surfacing an embedded API error before anything else.
pub fn parse_body(body: &str) -> Result<Value> {
    if let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(body) {
        if error.status != 0 {
            return Err(Error::RemoteApi {
                status: error.status,
                message: error.message,
            });
        }
    }
    Ok(serde_json::from_str(body)?)
}

/// A search response is an object with exactly one member, named after the
/// kind, carrying a `next` pointer (possibly null).
pub fn check_shape(value: &Value, kind: SearchKind) -> Result<()> {
    let key = kind.envelope_key();
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidResponseShape("response is not an object".to_string()))?;

    if object.len() != 1 {
        return Err(Error::InvalidResponseShape(format!(
            "expected a single {key:?} member, found {}",
            object.len()
        )));
    }

    let paging = object
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::InvalidResponseShape(format!("missing {key:?} object")))?;

    if !paging.contains_key("next") {
        return Err(Error::InvalidResponseShape(format!(
            "{key:?} has no \"next\" pointer"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    total: u32,
    next: Option<String>,
}

/// One decoded page.
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub next: Option<String>,
}

impl<T> Page<T> {
    fn convert<U>(paging: Paging<U>, f: impl FnMut(U) -> T) -> Self {
        Self {
            items: paging.items.into_iter().map(f).collect(),
            total: paging.total,
            next: paging.next,
        }
    }
}

/// Search response of one kind, convertible to a page of public results.
pub trait Envelope: DeserializeOwned + Send + 'static {
    type Item: Send + 'static;

    const KIND: SearchKind;

    fn into_page(self) -> Page<Self::Item>;
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    uri: String,
    name: String,
}

impl From<ArtistObject> for Artist {
    fn from(a: ArtistObject) -> Self {
        Artist::new(a.uri, a.name)
    }
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    uri: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    uri: String,
    name: String,
    album: AlbumObject,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistsEnvelope {
    artists: Paging<ArtistObject>,
}

impl Envelope for ArtistsEnvelope {
    type Item = Artist;

    const KIND: SearchKind = SearchKind::Artist;

    fn into_page(self) -> Page<Artist> {
        Page::convert(self.artists, Artist::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct AlbumsEnvelope {
    albums: Paging<AlbumObject>,
}

impl Envelope for AlbumsEnvelope {
    type Item = Album;

    const KIND: SearchKind = SearchKind::Album;

    fn into_page(self) -> Page<Album> {
        Page::convert(self.albums, |a| Album {
            uri: a.uri,
            name: a.name,
            artists: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TracksEnvelope {
    tracks: Paging<TrackObject>,
}

impl Envelope for TracksEnvelope {
    type Item = Track;

    const KIND: SearchKind = SearchKind::Track;

    fn into_page(self) -> Page<Track> {
        Page::convert(self.tracks, |t| Track {
            uri: t.uri,
            name: t.name,
            album_uri: t.album.uri,
            album_name: t.album.name,
            artists: t.artists.into_iter().map(Artist::from).collect(),
        })
    }
}

/// Body of the per-album lookup.
#[derive(Debug, Deserialize)]
pub struct AlbumLookup {
    pub artists: Vec<ArtistObject>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_remote_error() {
        let body = json!({"error": {"status": 401, "message": "No token provided"}}).to_string();
        match parse_body(&body) {
            Err(Error::RemoteApi { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "No token provided");
            }
            other => panic!("expected RemoteApi, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_body_not_json() {
        assert!(matches!(parse_body("<html>"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_check_shape() {
        let ok = json!({"artists": {"items": [], "total": 0, "next": null}});
        assert!(check_shape(&ok, SearchKind::Artist).is_ok());

        let wrong_kind = json!({"albums": {"items": [], "total": 0, "next": null}});
        assert!(matches!(
            check_shape(&wrong_kind, SearchKind::Artist),
            Err(Error::InvalidResponseShape(_))
        ));

        let extra = json!({
            "artists": {"items": [], "total": 0, "next": null},
            "albums": {"items": [], "total": 0, "next": null}
        });
        assert!(matches!(
            check_shape(&extra, SearchKind::Artist),
            Err(Error::InvalidResponseShape(_))
        ));

        let no_next = json!({"tracks": {"items": [], "total": 0}});
        assert!(matches!(
            check_shape(&no_next, SearchKind::Track),
            Err(Error::InvalidResponseShape(_))
        ));

        assert!(matches!(
            check_shape(&json!([]), SearchKind::Track),
            Err(Error::InvalidResponseShape(_))
        ));
    }

    #[test]
    fn test_track_conversion() {
        let body = json!({"tracks": {
            "items": [{
                "uri": "spotify:track:1",
                "name": "Tribute",
                "album": {"uri": "spotify:album:7mv1ciCld5Bp1y6TDGtjQY", "name": "Tenacious D"},
                "artists": [
                    {"uri": "spotify:artist:1XpDYCrUJnvCo9Ez6yeMWh", "name": "Tenacious D"},
                    {"uri": "spotify:artist:2", "name": "Jack Black"}
                ]
            }],
            "total": 1,
            "next": null
        }});

        let page = serde_json::from_value::<TracksEnvelope>(body).unwrap().into_page();
        assert!(page.next.is_none());
        assert_eq!(page.total, 1);
        assert_eq!(
            page.items,
            vec![Track {
                uri: "spotify:track:1".to_string(),
                name: "Tribute".to_string(),
                album_uri: "spotify:album:7mv1ciCld5Bp1y6TDGtjQY".to_string(),
                album_name: "Tenacious D".to_string(),
                artists: vec![
                    Artist::new("spotify:artist:1XpDYCrUJnvCo9Ez6yeMWh", "Tenacious D"),
                    Artist::new("spotify:artist:2", "Jack Black"),
                ],
            }]
        );
    }
}
