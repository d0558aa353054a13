use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::migrator::bounded;
use crate::session::{DestinationSession, SearchCandidate, Track};

/// Results requested per search. Only the top-ranked one is ever used.
const SEARCH_LIMIT: usize = 1;

/// Finds the destination song for a source track with a single search.
pub struct TrackResolver<'a, D: ?Sized> {
    destination: &'a D,
    call_timeout: Option<Duration>,
}

impl<'a, D> TrackResolver<'a, D>
where
    D: DestinationSession + ?Sized,
{
    pub fn new(destination: &'a D, call_timeout: Option<Duration>) -> Self {
        Self {
            destination,
            call_timeout,
        }
    }

    /// `Ok(None)` is a miss. `Err` only for failed requests.
    pub async fn resolve(&self, track: &Track) -> Result<Option<SearchCandidate>> {
        let query = track.search_query();

        let results = bounded(
            self.call_timeout,
            "Song search",
            self.destination.search_songs(&query, SEARCH_LIMIT),
        )
        .await?;

        let best = results
            .into_iter()
            .next()
            .filter(|c| !c.destination_track_id.is_empty());

        match &best {
            Some(candidate) => debug!("Resolved '{}' to {}", query, candidate.destination_track_id),
            None => debug!("No match found for '{}'", query),
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::session::MockDestinationSession;
    use mockall::predicate::eq;

    fn track(title: &str, artist: &str) -> Track {
        Track {
            title: title.to_string(),
            primary_artist: artist.to_string(),
        }
    }

    fn candidate(id: &str, title: &str) -> SearchCandidate {
        SearchCandidate {
            destination_track_id: id.to_string(),
            display_title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_returns_top_ranked_candidate() {
        let mut destination = MockDestinationSession::new();
        destination
            .expect_search_songs()
            .with(eq("Bohemian Rhapsody Queen"), eq(1))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    candidate("fJ9rUzIMcZQ", "Bohemian Rhapsody"),
                    candidate("other", "Bohemian Rhapsody (Live)"),
                ])
            });

        let resolver = TrackResolver::new(&destination, None);
        let found = resolver
            .resolve(&track("Bohemian Rhapsody", "Queen"))
            .await
            .unwrap();

        assert_eq!(found, Some(candidate("fJ9rUzIMcZQ", "Bohemian Rhapsody")));
    }

    #[tokio::test]
    async fn test_no_results_is_none_not_error() {
        let mut destination = MockDestinationSession::new();
        destination
            .expect_search_songs()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let resolver = TrackResolver::new(&destination, None);
        let found = resolver.resolve(&track("Nope", "Nobody")).await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_top_result_without_id_is_a_miss() {
        let mut destination = MockDestinationSession::new();
        destination
            .expect_search_songs()
            .returning(|_, _| Ok(vec![candidate("", "Some Video")]));

        let resolver = TrackResolver::new(&destination, None);
        assert!(resolver.resolve(&track("a", "b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_failure_is_an_error() {
        let mut destination = MockDestinationSession::new();
        destination
            .expect_search_songs()
            .times(1)
            .returning(|_, _| Err(AppError::RateLimited("429".into())));

        let resolver = TrackResolver::new(&destination, None);
        let err = resolver.resolve(&track("a", "b")).await.unwrap_err();

        assert!(matches!(err, AppError::RateLimited(_)));
    }
}
