//! Song link resolution: catalog search, matching, and the downstream lookups.
//!
//! The video lookup runs on one side of a `rayon::join`. The other side runs
//! catalog search, then matching, then the streaming link lookup. A failing
//! downstream lookup degrades to `None` in the response; only a blank song is
//! an error.

use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::ResolverConfig;
use crate::lookup::{
    CatalogSearch, ItunesCatalog, SpotifyLinkLookup, StreamingLinkLookup, VideoLookup,
    VideoSearchLookup,
};
use crate::models::{BatchEntry, Candidate, ResolveStats, ResolvedLinks, SongQuery};
use crate::progress::log_progress;
use crate::scoring::best_match;

/// Queries between progress lines in log-only batch runs
const PROGRESS_LOG_INTERVAL: u64 = 50;

pub struct Resolver {
    catalog: Box<dyn CatalogSearch>,
    links: Box<dyn StreamingLinkLookup>,
    video: Box<dyn VideoLookup>,
    verbose: bool,
}

impl Resolver {
    pub fn new(
        catalog: Box<dyn CatalogSearch>,
        links: Box<dyn StreamingLinkLookup>,
        video: Box<dyn VideoLookup>,
    ) -> Self {
        Self {
            catalog,
            links,
            video,
            verbose: false,
        }
    }

    /// HTTP-backed resolver sharing one agent across all three lookups.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let agent = config.http_agent();
        Self::new(
            Box::new(ItunesCatalog::new(config, agent.clone())),
            Box::new(SpotifyLinkLookup::new(config, agent.clone())),
            Box::new(VideoSearchLookup::new(config, agent)),
        )
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve one query into both links.
    pub fn resolve_links(&self, query: &SongQuery) -> Result<ResolvedLinks> {
        query.validate()?;

        let (streaming_link, video_id) =
            rayon::join(|| self.streaming_link_for(query), || self.video_id_for(query));

        Ok(ResolvedLinks {
            streaming_link,
            video_id,
        })
    }

    /// Catalog failures count as an empty result list.
    fn search_catalog(&self, query: &SongQuery) -> Vec<Candidate> {
        match self.catalog.search(query) {
            Ok(candidates) => {
                if self.verbose {
                    eprintln!(
                        "[CATALOG] {} returned {} candidates for '{}'",
                        self.catalog.name(),
                        candidates.len(),
                        query.song
                    );
                }
                candidates
            }
            Err(e) => {
                eprintln!("[WARN] {} search failed: {:#}", self.catalog.name(), e);
                Vec::new()
            }
        }
    }

    fn streaming_link_for(&self, query: &SongQuery) -> Option<String> {
        let candidates = self.search_catalog(query);
        let best = best_match(&candidates, &query.target());

        let track_id = match best.and_then(|c| c.id.as_ref()) {
            Some(id) => id,
            None => {
                if self.verbose {
                    eprintln!("[MATCH] No acceptable match for '{}'", query.song);
                }
                return None;
            }
        };

        if self.verbose {
            eprintln!(
                "[MATCH] '{}' by '{}' -> track {}",
                best.and_then(|c| c.title.as_deref()).unwrap_or(""),
                best.and_then(|c| c.artist_field.as_deref()).unwrap_or(""),
                track_id
            );
        }

        match self.links.streaming_link(track_id) {
            Ok(link) => {
                if self.verbose && link.is_none() {
                    eprintln!("[LINK] {} has no link for track {}", self.links.name(), track_id);
                }
                link
            }
            Err(e) => {
                eprintln!("[WARN] {} lookup failed: {:#}", self.links.name(), e);
                None
            }
        }
    }

    fn video_id_for(&self, query: &SongQuery) -> Option<String> {
        match self.video.video_id(query) {
            Ok(id) => {
                if self.verbose && id.is_none() {
                    eprintln!("[VIDEO] {} found nothing for '{}'", self.video.name(), query.song);
                }
                id
            }
            Err(e) => {
                eprintln!("[WARN] {} lookup failed: {:#}", self.video.name(), e);
                None
            }
        }
    }

    /// Resolve many queries in parallel. Invalid queries yield empty links and
    /// are counted separately. Output order matches input order.
    pub fn resolve_batch(
        &self,
        queries: &[SongQuery],
        pb: &ProgressBar,
    ) -> (Vec<BatchEntry>, ResolveStats) {
        let start = Instant::now();
        let total = queries.len() as u64;
        let done = AtomicU64::new(0);

        let outcomes: Vec<Option<ResolvedLinks>> = queries
            .par_iter()
            .map(|query| {
                let outcome = self.resolve_links(query).ok();
                pb.inc(1);
                let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                log_progress("resolve", current, total, PROGRESS_LOG_INTERVAL);
                outcome
            })
            .collect();

        let mut stats = ResolveStats::default();
        let entries: Vec<BatchEntry> = queries
            .iter()
            .zip(outcomes)
            .map(|(query, outcome)| {
                let links = match outcome {
                    Some(links) => {
                        stats.record(&links);
                        links
                    }
                    None => {
                        stats.record_invalid();
                        ResolvedLinks::default()
                    }
                };
                BatchEntry {
                    query: query.clone(),
                    links,
                }
            })
            .collect();

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        (entries, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackId;
    use anyhow::bail;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct FakeCatalog {
        results: Option<Vec<Candidate>>,
    }

    impl CatalogSearch for FakeCatalog {
        fn name(&self) -> &str {
            "fake-catalog"
        }

        fn search(&self, _query: &SongQuery) -> Result<Vec<Candidate>> {
            match &self.results {
                Some(r) => Ok(r.clone()),
                None => bail!("catalog down"),
            }
        }
    }

    struct FakeLinks {
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StreamingLinkLookup for FakeLinks {
        fn name(&self) -> &str {
            "fake-links"
        }

        fn streaming_link(&self, track_id: &TrackId) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("links down");
            }
            Ok(Some(format!("https://open.spotify.com/track/{}", track_id)))
        }
    }

    struct FakeVideo {
        fail: bool,
    }

    impl VideoLookup for FakeVideo {
        fn name(&self) -> &str {
            "fake-video"
        }

        fn video_id(&self, query: &SongQuery) -> Result<Option<String>> {
            if self.fail {
                bail!("video down");
            }
            Ok(Some(format!("vid-{}", query.song.to_lowercase())))
        }
    }

    fn resolver(
        results: Option<Vec<Candidate>>,
        links_fail: bool,
        video_fail: bool,
    ) -> (Resolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Resolver::new(
            Box::new(FakeCatalog { results }),
            Box::new(FakeLinks {
                fail: links_fail,
                calls: Arc::clone(&calls),
            }),
            Box::new(FakeVideo { fail: video_fail }),
        );
        (resolver, calls)
    }

    fn sky_catalog() -> Vec<Candidate> {
        vec![
            Candidate::new("Blue (Remix)", "Sky", "2"),
            Candidate::new("Blue", "Sky", "1"),
        ]
    }

    fn query(song: &str, artist: &str) -> SongQuery {
        SongQuery::new(song, Some(artist), None).unwrap()
    }

    #[test]
    fn test_resolve_both_links() {
        let (resolver, calls) = resolver(Some(sky_catalog()), false, false);
        let links = resolver.resolve_links(&query("Blue", "Sky")).unwrap();
        assert_eq!(
            links.streaming_link.as_deref(),
            Some("https://open.spotify.com/track/1")
        );
        assert_eq!(links.video_id.as_deref(), Some("vid-blue"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_song_rejected() {
        let (resolver, calls) = resolver(Some(sky_catalog()), false, false);
        let blank = SongQuery {
            song: " ".to_string(),
            ..SongQuery::default()
        };
        assert!(resolver.resolve_links(&blank).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_catalog_failure_still_returns_video() {
        let (resolver, calls) = resolver(None, false, false);
        let links = resolver.resolve_links(&query("Blue", "Sky")).unwrap();
        assert_eq!(links.streaming_link, None);
        assert_eq!(links.video_id.as_deref(), Some("vid-blue"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_match_skips_link_lookup() {
        let (resolver, calls) = resolver(Some(sky_catalog()), false, false);
        let links = resolver.resolve_links(&query("Blue", "Drake")).unwrap();
        assert_eq!(links.streaming_link, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_match_without_id_skips_link_lookup() {
        let catalog = vec![Candidate {
            title: Some("Blue".to_string()),
            artist_field: Some("Sky".to_string()),
            id: None,
        }];
        let (resolver, calls) = resolver(Some(catalog), false, false);
        let links = resolver.resolve_links(&query("Blue", "Sky")).unwrap();
        assert_eq!(links.streaming_link, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_link_failure_degrades_to_none() {
        let (resolver, calls) = resolver(Some(sky_catalog()), true, false);
        let links = resolver.resolve_links(&query("Blue", "Sky")).unwrap();
        assert_eq!(links.streaming_link, None);
        assert_eq!(links.video_id.as_deref(), Some("vid-blue"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_video_failure_degrades_to_none() {
        let (resolver, _) = resolver(Some(sky_catalog()), false, true);
        let links = resolver.resolve_links(&query("Blue", "Sky")).unwrap();
        assert!(links.streaming_link.is_some());
        assert_eq!(links.video_id, None);
    }

    #[test]
    fn test_resolve_batch_preserves_order_and_counts() {
        let (resolver, _) = resolver(Some(sky_catalog()), false, false);
        let queries = vec![
            query("Blue", "Sky"),
            SongQuery::default(),
            query("Blue", "Drake"),
        ];
        let pb = ProgressBar::hidden();
        let (entries, stats) = resolver.resolve_batch(&queries, &pb);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].query.artist, "Sky");
        assert!(entries[0].links.streaming_link.is_some());
        assert_eq!(entries[1].links, ResolvedLinks::default());
        assert_eq!(entries[2].links.streaming_link, None);
        assert_eq!(entries[2].links.video_id.as_deref(), Some("vid-blue"));

        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.invalid_queries, 1);
        assert_eq!(stats.streaming_links, 1);
        assert_eq!(stats.video_ids, 2);
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn test_resolve_batch_empty() {
        let (resolver, calls) = resolver(Some(sky_catalog()), false, false);
        let pb = ProgressBar::hidden();
        let (entries, stats) = resolver.resolve_batch(&[], &pb);
        assert!(entries.is_empty());
        assert_eq!(stats.total_queries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
