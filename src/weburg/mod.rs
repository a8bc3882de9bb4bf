//! Weburg movie scraper: resolves a movie page URL into direct torrent
//! download URLs by scraping the site's AJAX download listing and
//! decoding each torrent's metainfo.

mod client;

pub use client::Client;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const MOVIE_SOURCE_URL: &str = "http://weburg.net/ajax/download/movie?obj_id=";

static TORRENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("valid regex"));
static TORRENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="objects__name">([^<]*)<"#).expect("valid regex"));
static TORRENT_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="objects-metric__size">([^<]*)<"#).expect("valid regex")
});
static MOVIE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"weburg\.net/movies/info/([0-9]+)").expect("valid regex"));

#[derive(Debug, Error)]
pub enum WeburgError {
    #[error("Get non Weburg link: {0}")]
    NotAMovieLink(String),

    #[error("Nothing found")]
    NothingFound,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response code: {0}")]
    BadStatus(u16),

    #[error("could not decode torrent metainfo: {0}")]
    Metainfo(#[from] serde_bencode::Error),
}

pub type Result<T> = std::result::Result<T, WeburgError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub download_url: String,
    pub size: String,
    pub name: String,
    #[serde(skip)]
    torrent_url: String,
}

/// The slice of a torrent metainfo dictionary we care about.
#[derive(Debug, Deserialize)]
struct MetaInfo {
    #[serde(rename = "url-list", default)]
    url_list: Vec<String>,
}

pub struct MovieService {
    client: Client,
}

fn movie_id_from_link(rawurl: &str) -> Result<&str> {
    MOVIE_ID_RE
        .captures(rawurl)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| WeburgError::NotAMovieLink(rawurl.to_string()))
}

/// Scrape the download listing into (torrent-url, name, size) triples.
fn parse_body(body: &str) -> Result<Vec<Movie>> {
    let hrefs: Vec<&str> = TORRENT_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let names: Vec<&str> = TORRENT_NAME_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let sizes: Vec<&str> = TORRENT_SIZE_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    if hrefs.is_empty() || names.is_empty() || sizes.is_empty() {
        return Err(WeburgError::NothingFound);
    }

    Ok(hrefs
        .into_iter()
        .zip(names)
        .zip(sizes)
        .map(|((href, name), size)| Movie {
            download_url: String::new(),
            size: size.to_string(),
            name: name.to_string(),
            torrent_url: href.to_string(),
        })
        .collect())
}

impl MovieService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn raw_sources(&self, movie_id: &str) -> Result<String> {
        let url = format!("{}{}", MOVIE_SOURCE_URL, movie_id);
        let body = self.client.get(&url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn torrent_meta(&self, url: &str) -> Result<MetaInfo> {
        let body = self.client.get(url).await?;
        Ok(serde_bencode::from_bytes(&body)?)
    }

    /// A movie whose metainfo cannot be fetched or carries no url-list
    /// keeps an empty `download_url`.
    async fn resolve_torrents(&self, movies: &mut [Movie]) {
        for movie in movies.iter_mut() {
            match self.torrent_meta(&movie.torrent_url).await {
                Ok(meta) => {
                    if let Some(url) = meta.url_list.into_iter().next() {
                        movie.download_url = url;
                    }
                }
                Err(err) => {
                    debug!(torrent_url = %movie.torrent_url, error = %err, "Skipping torrent");
                }
            }
        }
    }

    /// Resolve a movie page link into its downloadable torrents.
    pub async fn info(&self, rawurl: &str) -> Result<Vec<Movie>> {
        let movie_id = movie_id_from_link(rawurl)?;
        let body = self.raw_sources(movie_id).await?;
        let mut movies = parse_body(&body)?;
        self.resolve_torrents(&mut movies).await;
        Ok(movies)
    }
}
