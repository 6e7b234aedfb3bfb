//! Playlist name resolution and playlist append.
//!
//! Two name-matching rules coexist and are kept apart on purpose:
//! reading and playing a playlist use [`resolve_playlist_name`] (fuzzy),
//! while appending to an existing playlist uses an exact-name scan.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{CatalogClient, PlaylistRef};
use crate::error::ProviderError;
use crate::spotify::{track_uri, NewPlaylist, SpotifyApi};

/// A candidate must score strictly above this to match.
pub const FUZZY_THRESHOLD: f64 = 0.85;

const NEW_PLAYLIST_DESCRIPTION: &str = "My new playlist";

/// Ratcliff/Obershelp similarity, `2 * matches / (len(a) + len(b))`.
///
/// Case-sensitive and computed over chars. Two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

/// Longest common substring as `(start_a, start_b, len)`; ties go to the
/// earliest start in `a`, then in `b`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

/// First candidate, in enumeration order, whose name scores above
/// [`FUZZY_THRESHOLD`]. Later, better-scoring candidates are not considered.
pub fn resolve_playlist_name<'a>(
    spoken_name: &str,
    candidates: &'a [PlaylistRef],
) -> Option<&'a PlaylistRef> {
    candidates
        .iter()
        .find(|p| similarity_ratio(&p.name, spoken_name) > FUZZY_THRESHOLD)
}

/// Requested ids not already present, de-duplicated, in request order.
pub fn compute_delta(requested: &[String], existing: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = existing.iter().map(String::as_str).collect();
    requested
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[derive(Clone)]
pub struct PlaylistReconciler {
    api: Arc<dyn SpotifyApi>,
    catalog: CatalogClient,
}

impl PlaylistReconciler {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self {
            catalog: CatalogClient::new(api.clone()),
            api,
        }
    }

    /// Creates a private, non-collaborative playlist when `is_new`; otherwise
    /// looks for an exact name match among the user's playlists.
    pub async fn ensure_playlist(
        &self,
        name: &str,
        is_new: bool,
    ) -> Result<Option<PlaylistRef>, ProviderError> {
        if is_new {
            let user = self.catalog.current_user_id().await?;
            let created = self
                .api
                .create_playlist(
                    &user,
                    NewPlaylist {
                        name,
                        public: false,
                        collaborative: false,
                        description: NEW_PLAYLIST_DESCRIPTION,
                    },
                )
                .await?;
            info!("created playlist {:?} ({})", created.name, created.id);
            return Ok(Some(created));
        }

        let found = self
            .catalog
            .user_playlists()
            .await?
            .into_iter()
            .find(|p| p.name == name);
        if found.is_none() {
            debug!("no playlist named exactly {:?}", name);
        }
        Ok(found)
    }

    /// Add whichever of `track_ids` the playlist does not already hold.
    ///
    /// `Ok(false)` when the playlist cannot be found or nothing is left to
    /// add.
    pub async fn append_tracks(
        &self,
        name: &str,
        is_new: bool,
        track_ids: &[String],
    ) -> Result<bool, ProviderError> {
        let Some(playlist) = self.ensure_playlist(name, is_new).await? else {
            return Ok(false);
        };
        let existing: Vec<String> = if is_new {
            Vec::new()
        } else {
            self.catalog
                .playlist_tracks(&playlist.id)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect()
        };
        let delta = compute_delta(track_ids, &existing);
        debug!("delta for {:?}: {:?}", playlist.name, delta);
        if delta.is_empty() {
            return Ok(false);
        }
        let uris: Vec<String> = delta.iter().map(|id| track_uri(id)).collect();
        self.api.playlist_add_items(&playlist.id, &uris).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::{Call, FakeSpotify};

    fn playlists(names: &[(&str, &str)]) -> Vec<PlaylistRef> {
        names
            .iter()
            .map(|(name, id)| PlaylistRef {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_similarity_known_values() {
        assert_eq!(similarity_ratio("abcd", "bcde"), 0.75);
        assert_eq!(similarity_ratio("Deep Neil", "Deep Neil"), 1.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
        assert!(similarity_ratio("Chill Vibes", "Chill vibes") > FUZZY_THRESHOLD);
    }

    #[test]
    fn test_similarity_is_case_sensitive() {
        // "eep " + "eil" = 7 matching chars of 18.
        let ratio = similarity_ratio("deep neil", "Deep Neil");
        assert!((ratio - 14.0 / 18.0).abs() < 1e-9);
        assert!(ratio < FUZZY_THRESHOLD);
    }

    #[test]
    fn test_first_above_threshold_wins() {
        let exact_first = playlists(&[("Road Trip Mix", "exact"), ("Road Trip Mix!", "bang")]);
        let bang_first = playlists(&[("Road Trip Mix!", "bang"), ("Road Trip Mix", "exact")]);
        assert_eq!(
            resolve_playlist_name("Road Trip Mix", &exact_first).map(|p| p.id.as_str()),
            Some("exact")
        );
        // The exact match scores higher but comes second.
        assert_eq!(
            resolve_playlist_name("Road Trip Mix", &bang_first).map(|p| p.id.as_str()),
            Some("bang")
        );
        assert!(resolve_playlist_name("Workout", &exact_first).is_none());
    }

    #[test]
    fn test_delta_is_idempotent() {
        let requested = ids(&["a", "b", "c", "b"]);
        let existing = ids(&["b", "x"]);
        let delta = compute_delta(&requested, &existing);
        assert_eq!(delta, ids(&["a", "c"]));

        let mut after = existing.clone();
        after.extend(delta.iter().cloned());
        assert!(compute_delta(&delta, &after).is_empty());
        assert!(compute_delta(&requested, &after).is_empty());
    }

    #[tokio::test]
    async fn test_ensure_playlist_exact_match_only() {
        let fake = Arc::new(FakeSpotify::new().with_playlist("Deep Neil Young", "dny", &[]));
        let reconciler = PlaylistReconciler::new(fake.clone());
        assert!(reconciler.ensure_playlist("Deep Neil", false).await.unwrap().is_none());
        assert_eq!(
            reconciler
                .ensure_playlist("Deep Neil Young", false)
                .await
                .unwrap()
                .map(|p| p.id),
            Some("dny".to_string())
        );
        assert!(fake.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_playlist_creates_private() {
        let fake = Arc::new(FakeSpotify::new());
        let reconciler = PlaylistReconciler::new(fake.clone());
        let created = reconciler.ensure_playlist("Chillwave", true).await.unwrap().unwrap();
        assert_eq!(created.name, "Chillwave");
        assert_eq!(
            fake.mutating_calls(),
            vec![Call::CreatePlaylist {
                name: "Chillwave".into(),
                public: false,
                collaborative: false,
                description: "My new playlist".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_append_only_adds_missing_tracks() {
        let fake = Arc::new(FakeSpotify::new().with_playlist("Deep Neil", "dn", &[("a", "Helpless")]));
        let reconciler = PlaylistReconciler::new(fake.clone());
        assert!(reconciler
            .append_tracks("Deep Neil", false, &ids(&["a", "b"]))
            .await
            .unwrap());
        assert_eq!(
            fake.mutating_calls(),
            vec![Call::PlaylistAddItems {
                playlist_id: "dn".into(),
                uris: vec!["spotify:track:b".into()],
            }]
        );
        // Second run has nothing left to add.
        assert!(!reconciler
            .append_tracks("Deep Neil", false, &ids(&["a", "b"]))
            .await
            .unwrap());
        assert_eq!(fake.mutating_calls().len(), 1);
    }
}
