//! Core data models for song link resolution.
//!
//! This module contains the request/response types, catalog candidates,
//! match tiers and the batch statistics used throughout the crate.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Request Models
// ============================================================================

/// The caller's search intent as seen by the matcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Target {
    pub title: String,
    pub artist: String, // May be empty: disables the artist veto
}

impl Target {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
        }
    }
}

/// Outer request: song plus optional artist and label.
/// The label only feeds the video search, never the catalog search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongQuery {
    pub song: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub label: String,
}

impl SongQuery {
    /// Build a query, rejecting a blank song before any lookup happens.
    pub fn new(song: &str, artist: Option<&str>, label: Option<&str>) -> Result<Self> {
        let query = Self {
            song: song.to_string(),
            artist: artist.unwrap_or("").to_string(),
            label: label.unwrap_or("").to_string(),
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<()> {
        // Whitespace-only songs are rejected too, not just empty ones
        if self.song.trim().is_empty() {
            bail!("Please provide a 'song' parameter.");
        }
        Ok(())
    }

    /// The matcher's view of this query. The label is not part of it.
    pub fn target(&self) -> Target {
        Target::new(&self.song, &self.artist)
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// Opaque catalog track identifier.
/// The catalog sends numbers; saved fixtures sometimes carry strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTrackId", into = "String")]
pub struct TrackId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrackId {
    Number(i64),
    Text(String),
}

impl From<RawTrackId> for TrackId {
    fn from(raw: RawTrackId) -> Self {
        match raw {
            RawTrackId::Number(n) => TrackId(n.to_string()),
            RawTrackId::Text(s) => TrackId(s),
        }
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.0
    }
}

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        TrackId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog search result. Field names follow the catalog's JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "trackName", default)]
    pub title: Option<String>,
    #[serde(rename = "artistName", default)]
    pub artist_field: Option<String>, // "A & B, C" style multi-artist credit
    #[serde(rename = "trackId", default)]
    pub id: Option<TrackId>,
}

impl Candidate {
    pub fn new(title: &str, artist_field: &str, id: impl Into<String>) -> Self {
        Self {
            title: Some(title.to_string()),
            artist_field: Some(artist_field.to_string()),
            id: Some(TrackId::new(id)),
        }
    }
}

/// Catalog search response envelope: `{ "resultCount": n, "results": [...] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub results: Vec<Candidate>,
}

// ============================================================================
// Scoring Models
// ============================================================================

/// Outcome of scanning a candidate's artist list against the target artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistMatch {
    /// First element equal to the target artist
    Exact,
    /// First element where either name contains the other
    Partial,
    /// Target artist empty: flat score, no veto possible
    Unconstrained,
    /// Non-empty target artist found nowhere: candidate scores 0
    Vetoed,
}

/// Relation between the normalized candidate title and target title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleMatch {
    Exact,
    Prefix,
    Substring,
    None,
}

/// A candidate with its score and the tiers that produced it.
/// `title_match` is `None` when the artist veto skipped title scoring.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub score: u32,
    pub artist_match: ArtistMatch,
    pub title_match: Option<TitleMatch>,
}

// ============================================================================
// Output Models
// ============================================================================

/// Final response envelope. Both links are independently optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLinks {
    pub streaming_link: Option<String>,
    pub video_id: Option<String>,
}

/// One line of batch output.
#[derive(Clone, Debug, Serialize)]
pub struct BatchEntry {
    pub query: SongQuery,
    pub links: ResolvedLinks,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Batch resolution statistics, logged the same way as other phase stats.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ResolveStats {
    pub total_queries: usize,
    pub invalid_queries: usize,
    pub streaming_links: usize,
    pub video_ids: usize,
    pub both_links: usize,
    pub no_links: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl ResolveStats {
    /// Tally one resolved query.
    pub fn record(&mut self, links: &ResolvedLinks) {
        self.total_queries += 1;
        let has_link = links.streaming_link.is_some();
        let has_video = links.video_id.is_some();
        if has_link {
            self.streaming_links += 1;
        }
        if has_video {
            self.video_ids += 1;
        }
        match (has_link, has_video) {
            (true, true) => self.both_links += 1,
            (false, false) => self.no_links += 1,
            _ => {}
        }
    }

    /// Tally a query rejected before any lookup (blank song).
    pub fn record_invalid(&mut self) {
        self.total_queries += 1;
        self.invalid_queries += 1;
    }

    /// Streaming link rate as a percentage of valid queries
    pub fn link_rate(&self) -> f64 {
        let valid = self.total_queries - self.invalid_queries;
        if valid == 0 {
            0.0
        } else {
            100.0 * self.streaming_links as f64 / valid as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }
}
