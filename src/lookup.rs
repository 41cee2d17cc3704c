//! External lookups with pluggable backends.
//!
//! Three collaborators feed the resolver:
//!
//! * [`CatalogSearch`]: free-text song search returning [`Candidate`]s
//! * [`StreamingLinkLookup`]: catalog track id to streaming URL
//! * [`VideoLookup`]: song/artist/label to a video id
//!
//! The HTTP backends below are thin: one GET each, JSON decode, field pick.
//! No retries and no rate limiting.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::models::{Candidate, CatalogResponse, SongQuery, TrackId};
use crate::normalize::{catalog_term, video_query};

// ============================================================================
// Traits
// ============================================================================

pub trait CatalogSearch: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, query: &SongQuery) -> Result<Vec<Candidate>>;
}

pub trait StreamingLinkLookup: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the service answered but has no link for this track.
    fn streaming_link(&self, track_id: &TrackId) -> Result<Option<String>>;
}

pub trait VideoLookup: Send + Sync {
    fn name(&self) -> &str;

    fn video_id(&self, query: &SongQuery) -> Result<Option<String>>;
}

// ============================================================================
// URL Helpers
// ============================================================================

fn endpoint_base(endpoint: &str) -> &str {
    endpoint.trim().trim_end_matches('/')
}

fn build_url(endpoint: &str, params: &[(&str, &str)]) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect();
    format!("{}?{}", endpoint_base(endpoint), query.join("&"))
}

fn get_json<T: DeserializeOwned>(agent: &ureq::Agent, url: &str) -> Result<T> {
    agent
        .get(url)
        .call()
        .with_context(|| format!("Request failed: {}", url))?
        .into_json::<T>()
        .with_context(|| format!("Invalid JSON from {}", url))
}

// ============================================================================
// Catalog Search (iTunes)
// ============================================================================

/// Catalog search against the iTunes Search API.
pub struct ItunesCatalog {
    agent: ureq::Agent,
    endpoint: String,
    country: String,
    media: String,
    entity: String,
    limit: u32,
}

impl ItunesCatalog {
    pub fn new(config: &ResolverConfig, agent: ureq::Agent) -> Self {
        Self {
            agent,
            endpoint: config.catalog_url.clone(),
            country: config.country.clone(),
            media: config.media.clone(),
            entity: config.entity.clone(),
            limit: config.limit,
        }
    }

    pub fn search_url(&self, query: &SongQuery) -> String {
        let term = catalog_term(&query.song, &query.artist);
        let limit = self.limit.to_string();
        build_url(
            &self.endpoint,
            &[
                ("term", term.as_str()),
                ("country", self.country.as_str()),
                ("media", self.media.as_str()),
                ("entity", self.entity.as_str()),
                ("limit", limit.as_str()),
            ],
        )
    }
}

impl CatalogSearch for ItunesCatalog {
    fn name(&self) -> &str {
        "iTunes"
    }

    fn search(&self, query: &SongQuery) -> Result<Vec<Candidate>> {
        let response: CatalogResponse = get_json(&self.agent, &self.search_url(query))?;
        Ok(response.results)
    }
}

// ============================================================================
// Streaming Link Lookup (Spotify via findspot)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    spotify_url: Option<String>,
}

impl LinkResponse {
    fn into_link(self) -> Option<String> {
        if self.success {
            self.spotify_url
        } else {
            None
        }
    }
}

/// Resolves a catalog track id to a Spotify URL.
pub struct SpotifyLinkLookup {
    agent: ureq::Agent,
    endpoint: String,
}

impl SpotifyLinkLookup {
    pub fn new(config: &ResolverConfig, agent: ureq::Agent) -> Self {
        Self {
            agent,
            endpoint: config.link_lookup_url.clone(),
        }
    }

    pub fn lookup_url(&self, track_id: &TrackId) -> String {
        build_url(&self.endpoint, &[("id", track_id.as_str())])
    }
}

impl StreamingLinkLookup for SpotifyLinkLookup {
    fn name(&self) -> &str {
        "Spotify"
    }

    fn streaming_link(&self, track_id: &TrackId) -> Result<Option<String>> {
        let response: LinkResponse = get_json(&self.agent, &self.lookup_url(track_id))?;
        Ok(response.into_link())
    }
}

// ============================================================================
// Video Lookup
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct VideoResponse {
    #[serde(default)]
    top_result: Option<VideoHit>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoHit {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

impl VideoResponse {
    /// An empty id counts as no hit.
    fn into_video_id(self) -> Option<String> {
        self.top_result
            .and_then(|hit| hit.video_id)
            .filter(|id| !id.is_empty())
    }
}

/// Video search keyed on song/artist/label text. Independent of catalog matching.
pub struct VideoSearchLookup {
    agent: ureq::Agent,
    endpoint: String,
}

impl VideoSearchLookup {
    pub fn new(config: &ResolverConfig, agent: ureq::Agent) -> Self {
        Self {
            agent,
            endpoint: config.video_lookup_url.clone(),
        }
    }

    pub fn search_url(&self, query: &SongQuery) -> String {
        let q = video_query(&query.song, &query.artist, &query.label);
        build_url(&self.endpoint, &[("q", q.as_str())])
    }
}

impl VideoLookup for VideoSearchLookup {
    fn name(&self) -> &str {
        "Video"
    }

    fn video_id(&self, query: &SongQuery) -> Result<Option<String>> {
        let response: VideoResponse = get_json(&self.agent, &self.search_url(query))?;
        Ok(response.into_video_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(song: &str, artist: &str, label: &str) -> SongQuery {
        SongQuery {
            song: song.to_string(),
            artist: artist.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_catalog_search_url() {
        let config = ResolverConfig::default();
        let catalog = ItunesCatalog::new(&config, config.http_agent());
        let url = catalog.search_url(&query("Tum Hi Ho", "Arijit Singh", "T-Series"));
        assert_eq!(
            url,
            "https://itunes.apple.com/search?term=Tum%20Hi%20Ho%20Arijit%20Singh&country=IN&media=music&entity=song&limit=10"
        );
    }

    #[test]
    fn test_catalog_search_url_without_artist() {
        let config = ResolverConfig::default();
        let catalog = ItunesCatalog::new(&config, config.http_agent());
        let url = catalog.search_url(&query("Blue", "", ""));
        assert!(url.contains("term=Blue&"));
    }

    #[test]
    fn test_link_lookup_url_trims_trailing_slash() {
        let config = ResolverConfig {
            link_lookup_url: "https://links.example/api/".to_string(),
            ..ResolverConfig::default()
        };
        let lookup = SpotifyLinkLookup::new(&config, config.http_agent());
        assert_eq!(
            lookup.lookup_url(&TrackId::new("1440857781")),
            "https://links.example/api?id=1440857781"
        );
    }

    #[test]
    fn test_video_search_url_uses_label() {
        let config = ResolverConfig::default();
        let lookup = VideoSearchLookup::new(&config, config.http_agent());
        let url = lookup.search_url(&query("Song", "", "T-Series"));
        assert_eq!(
            url,
            "https://ayushvid.vercel.app/api?q=Song%20T-Series%20official%20Full%20video"
        );
    }

    #[test]
    fn test_link_response_requires_success() {
        let ok: LinkResponse = serde_json::from_str(
            r#"{"success": true, "spotifyUrl": "https://open.spotify.com/track/abc"}"#,
        )
        .unwrap();
        assert_eq!(
            ok.into_link().as_deref(),
            Some("https://open.spotify.com/track/abc")
        );

        let failed: LinkResponse =
            serde_json::from_str(r#"{"success": false, "spotifyUrl": "x"}"#).unwrap();
        assert_eq!(failed.into_link(), None);

        let empty: LinkResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_link(), None);
    }

    #[test]
    fn test_video_response_top_result() {
        let hit: VideoResponse =
            serde_json::from_str(r#"{"top_result": {"videoId": "dQw4w9WgXcQ", "title": "x"}}"#)
                .unwrap();
        assert_eq!(hit.into_video_id().as_deref(), Some("dQw4w9WgXcQ"));

        let miss: VideoResponse = serde_json::from_str(r#"{"top_result": null}"#).unwrap();
        assert_eq!(miss.into_video_id(), None);

        let blank: VideoResponse =
            serde_json::from_str(r#"{"top_result": {"videoId": ""}}"#).unwrap();
        assert_eq!(blank.into_video_id(), None);

        let miss: VideoResponse = serde_json::from_str(r#"{"top_result": {}}"#).unwrap();
        assert_eq!(miss.into_video_id(), None);

        let bare: VideoResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(bare.into_video_id(), None);
    }
}
