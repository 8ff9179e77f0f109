use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{Album, Artist, SearchKind, Track};

mod fetch;
mod response;

pub use fetch::{Fetch, HttpFetch};
use response::{
    AlbumLookup, AlbumsEnvelope, ArtistsEnvelope, Envelope, Page, TracksEnvelope, check_shape,
    parse_body,
};

const ALBUM_URI_PREFIX: &str = "spotify:album:";

/// What a running search reports. Every search ends with exactly one of
/// `Done` or `Failed`.
#[derive(Debug)]
pub enum SearchEvent<T> {
    Page(Vec<T>),
    Done,
    Failed(Error),
}

impl<T> SearchEvent<T> {
    pub fn is_end_of_results(&self) -> bool {
        matches!(self, SearchEvent::Done)
    }
}

/// State of one search call.
struct Session {
    term: String,
    kind: SearchKind,
    offset: u32,
    page_size: u32,
}

impl Session {
    fn advance(&mut self) {
        self.offset += self.page_size;
    }
}

/// Paginated catalog search.
///
/// Each search runs in its own task and streams one event per page through a
/// channel of capacity one, so fetching never runs more than a page ahead of
/// the consumer.
#[derive(Clone)]
pub struct SearchClient {
    fetch: Arc<dyn Fetch>,
    endpoint: Url,
    page_size: u32,
}

impl SearchClient {
    pub fn new(fetch: Arc<dyn Fetch>, endpoint: &str, page_size: u32) -> Result<Self> {
        let mut endpoint = Url::parse(endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            fetch,
            endpoint,
            page_size: page_size.max(1),
        })
    }

    pub fn artists(&self, term: &str) -> mpsc::Receiver<SearchEvent<Artist>> {
        self.spawn::<ArtistsEnvelope>(term)
    }

    /// Album results carry their artists, fetched with one extra request
    /// per album.
    pub fn albums(&self, term: &str) -> mpsc::Receiver<SearchEvent<Album>> {
        self.spawn::<AlbumsEnvelope>(term)
    }

    pub fn tracks(&self, term: &str) -> mpsc::Receiver<SearchEvent<Track>> {
        self.spawn::<TracksEnvelope>(term)
    }

    fn spawn<E>(&self, term: &str) -> mpsc::Receiver<SearchEvent<E::Item>>
    where
        E: Envelope,
        E::Item: Enrich,
    {
        let (tx, rx) = mpsc::channel(1);
        let client = self.clone();
        let session = Session {
            term: term.to_string(),
            kind: E::KIND,
            offset: 0,
            page_size: self.page_size,
        };

        tokio::spawn(async move {
            let terminal = match client.run::<E>(session, &tx).await {
                Ok(()) => SearchEvent::Done,
                Err(e) => SearchEvent::Failed(e),
            };
            let _ = tx.send(terminal).await;
        });

        rx
    }

    async fn run<E>(&self, mut session: Session, tx: &mpsc::Sender<SearchEvent<E::Item>>) -> Result<()>
    where
        E: Envelope,
        E::Item: Enrich,
    {
        loop {
            let mut page = self.fetch_page::<E>(&session).await?;
            debug!(
                kind = %session.kind,
                offset = session.offset,
                items = page.items.len(),
                total = page.total,
                "fetched page"
            );

            <E::Item as Enrich>::enrich(self, &mut page.items).await?;

            if !page.items.is_empty() && tx.send(SearchEvent::Page(page.items)).await.is_err() {
                debug!(kind = %session.kind, "search receiver dropped");
                return Ok(());
            }

            if page.next.is_none() {
                return Ok(());
            }
            session.advance();
        }
    }

    async fn fetch_page<E: Envelope>(&self, session: &Session) -> Result<Page<E::Item>> {
        let url = self.search_url(session)?;
        let body = self.fetch.get(&url).await?;

        let value = parse_body(&body)?;
        check_shape(&value, E::KIND)?;
        let envelope: E = serde_json::from_value(value)?;
        Ok(envelope.into_page())
    }

    fn search_url(&self, session: &Session) -> Result<Url> {
        let mut url = self.endpoint.join("search")?;
        url.query_pairs_mut()
            .append_pair("q", &session.term)
            .append_pair("type", session.kind.tag())
            .append_pair("offset", &session.offset.to_string())
            .append_pair("limit", &session.page_size.to_string());
        Ok(url)
    }

    async fn lookup_album(&self, uri: &str) -> Result<Vec<Artist>> {
        let id = uri.strip_prefix(ALBUM_URI_PREFIX).unwrap_or(uri);
        let mut url = self.endpoint.join("albums/")?;
        url.path_segments_mut()
            .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        let body = self.fetch.get(&url).await?;

        let lookup: AlbumLookup = serde_json::from_value(parse_body(&body)?)?;
        Ok(lookup.artists.into_iter().map(Artist::from).collect())
    }
}

/// Second pass over a decoded page, for fields the search endpoint omits.
#[async_trait]
trait Enrich: Sized + Send {
    async fn enrich(client: &SearchClient, items: &mut [Self]) -> Result<()>;
}

#[async_trait]
impl Enrich for Artist {
    async fn enrich(_client: &SearchClient, _items: &mut [Self]) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Enrich for Track {
    async fn enrich(_client: &SearchClient, _items: &mut [Self]) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Enrich for Album {
    async fn enrich(client: &SearchClient, albums: &mut [Self]) -> Result<()> {
        for album in albums.iter_mut() {
            let artists = client.lookup_album(&album.uri).await?;
            album.artists.extend(artists);
        }
        Ok(())
    }
}
