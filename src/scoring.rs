//! Scoring functions for catalog candidate matching.
//!
//! This module contains all scoring-related functions including:
//! - Artist tier (find-first scan with veto)
//! - Title tier
//! - Per-candidate score
//! - Best candidate selection (first-seen wins ties)

use crate::models::{ArtistMatch, Candidate, ScoredCandidate, Target, TitleMatch};
use crate::normalize::{normalize, normalize_opt, split_artists};

// ============================================================================
// Score Weights
// ============================================================================

pub const ARTIST_EXACT_SCORE: u32 = 100;
pub const ARTIST_PARTIAL_SCORE: u32 = 80;
/// Flat artist credit when the caller gave no artist
pub const ARTIST_UNCONSTRAINED_SCORE: u32 = 50;

pub const TITLE_EXACT_SCORE: u32 = 100;
pub const TITLE_PREFIX_SCORE: u32 = 80;
pub const TITLE_SUBSTRING_SCORE: u32 = 50;

impl ArtistMatch {
    pub fn score(self) -> u32 {
        match self {
            ArtistMatch::Exact => ARTIST_EXACT_SCORE,
            ArtistMatch::Partial => ARTIST_PARTIAL_SCORE,
            ArtistMatch::Unconstrained => ARTIST_UNCONSTRAINED_SCORE,
            ArtistMatch::Vetoed => 0,
        }
    }
}

impl TitleMatch {
    pub fn score(self) -> u32 {
        match self {
            TitleMatch::Exact => TITLE_EXACT_SCORE,
            TitleMatch::Prefix => TITLE_PREFIX_SCORE,
            TitleMatch::Substring => TITLE_SUBSTRING_SCORE,
            TitleMatch::None => 0,
        }
    }
}

// ============================================================================
// Normalized Target
// ============================================================================

/// Target title/artist normalized once per request, not once per candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedTarget {
    pub title: String,
    pub artist: String,
}

impl NormalizedTarget {
    pub fn new(target: &Target) -> Self {
        Self {
            title: normalize(&target.title),
            artist: normalize(&target.artist),
        }
    }
}

// ============================================================================
// Tier Matching
// ============================================================================

/// Scan the candidate's artists in credit order and stop at the first hit.
/// An exact hit on an element wins over a containment hit on the same element;
/// an earlier containment hit still wins over a later exact one.
pub fn match_artist(target_artist: &str, candidate_artists: &[String]) -> ArtistMatch {
    if target_artist.is_empty() {
        return ArtistMatch::Unconstrained;
    }

    candidate_artists
        .iter()
        .find_map(|artist| {
            if artist == target_artist {
                Some(ArtistMatch::Exact)
            } else if artist.contains(target_artist) || target_artist.contains(artist.as_str()) {
                Some(ArtistMatch::Partial)
            } else {
                None
            }
        })
        .unwrap_or(ArtistMatch::Vetoed)
}

/// Compare normalized titles. Substring only counts one way: the candidate
/// title containing the target title.
pub fn match_title(candidate_title: &str, target_title: &str) -> TitleMatch {
    if candidate_title == target_title {
        TitleMatch::Exact
    } else if candidate_title.starts_with(target_title) || target_title.starts_with(candidate_title)
    {
        TitleMatch::Prefix
    } else if candidate_title.contains(target_title) {
        TitleMatch::Substring
    } else {
        TitleMatch::None
    }
}

// ============================================================================
// Candidate Scoring
// ============================================================================

/// Score one candidate against a normalized target.
/// A vetoed artist short-circuits: the title is never compared.
pub fn score_candidate<'a>(target: &NormalizedTarget, candidate: &'a Candidate) -> ScoredCandidate<'a> {
    let artists = split_artists(candidate.artist_field.as_deref().unwrap_or(""));
    let artist_match = match_artist(&target.artist, &artists);

    if artist_match == ArtistMatch::Vetoed {
        return ScoredCandidate {
            candidate,
            score: 0,
            artist_match,
            title_match: None,
        };
    }

    let title = normalize_opt(candidate.title.as_deref());
    let title_match = match_title(&title, &target.title);

    ScoredCandidate {
        candidate,
        score: artist_match.score() + title_match.score(),
        artist_match,
        title_match: Some(title_match),
    }
}

/// Score every candidate, in input order. Serialized as JSON for `--explain`.
pub fn rank_candidates<'a>(
    candidates: &'a [Candidate],
    target: &Target,
) -> Vec<ScoredCandidate<'a>> {
    let target = NormalizedTarget::new(target);
    candidates
        .iter()
        .map(|c| score_candidate(&target, c))
        .collect()
}

// ============================================================================
// Best Candidate Selection
// ============================================================================

/// Running best during selection. Starts at score 0, so only a positive score
/// can ever install a candidate.
struct Best<'a> {
    score: u32,
    candidate: Option<&'a Candidate>,
}

/// Pick the highest-scoring candidate, or None if nothing scores above 0.
/// Ties keep the earliest candidate: a later one must score strictly higher.
pub fn best_match<'a>(candidates: &'a [Candidate], target: &Target) -> Option<&'a Candidate> {
    let target = NormalizedTarget::new(target);

    let best = candidates.iter().fold(
        Best {
            score: 0,
            candidate: None,
        },
        |best, candidate| {
            let scored = score_candidate(&target, candidate);
            if scored.score > best.score {
                Best {
                    score: scored.score,
                    candidate: Some(candidate),
                }
            } else {
                best
            }
        },
    );

    best.candidate
}

// ============================================================================
// TESTS
// ============================================================================
