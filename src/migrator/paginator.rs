use std::future::Future;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::session::{Page, PageCursor, PlaylistSummary, SourceSession};

/// Collects every item of a paginated collection, starting from an already
/// fetched first page and following `next` cursors until none is left.
/// Items keep the order they were received in.
pub async fn fetch_all<T, F, Fut>(first_page: Page<T>, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = first_page.items;
    let mut next = first_page.next;

    while let Some(cursor) = next {
        debug!("Fetching page at offset {} of {}", cursor.offset, cursor.collection);
        let page = fetch_page(cursor).await.map_err(|e| match e {
            AppError::UpstreamFetch { .. } => e,
            other => AppError::UpstreamFetch {
                source: Box::new(other),
            },
        })?;
        items.extend(page.items);
        next = page.next;
    }

    Ok(items)
}

/// All playlists of the signed-in source user.
pub async fn fetch_user_playlists<S>(source: &S) -> Result<Vec<PlaylistSummary>>
where
    S: SourceSession + ?Sized,
{
    let first = source
        .user_playlists_page(None)
        .await
        .map_err(|e| AppError::UpstreamFetch { source: Box::new(e) })?;

    fetch_all(first, |cursor| source.user_playlists_page(Some(cursor))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSourceSession;
    use std::cell::Cell;

    fn cursor(offset: u32) -> PageCursor {
        PageCursor {
            collection: "pl".to_string(),
            offset,
        }
    }

    /// Pages of the given sizes, numbered consecutively across pages.
    fn pages(sizes: &[usize]) -> Vec<Page<usize>> {
        let mut n = 0;
        let mut out = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let items: Vec<usize> = (n..n + size).collect();
            n += size;
            let next = (i + 1 < sizes.len()).then(|| cursor(n as u32));
            out.push(Page::new(items, next));
        }
        out
    }

    async fn collect(sizes: &[usize]) -> Vec<usize> {
        let mut all = pages(sizes).into_iter();
        let first = all.next().unwrap_or_else(Page::exhausted);
        fetch_all(first, |_| {
            let page = all.next().expect("asked for a page past the end");
            async move { Ok(page) }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        for sizes in [vec![], vec![0], vec![3], vec![2, 0, 5], vec![100, 100, 7]] {
            let items = collect(&sizes).await;
            let expected: Vec<usize> = (0..sizes.iter().sum::<usize>()).collect();
            assert_eq!(items, expected, "sizes {:?}", sizes);
        }
    }

    #[tokio::test]
    async fn test_exhausted_first_page_makes_no_requests() {
        let calls = Cell::new(0);
        let items: Vec<u8> = fetch_all(Page::exhausted(), |_| {
            calls.set(calls.get() + 1);
            async { Ok(Page::exhausted()) }
        })
        .await
        .unwrap();

        assert!(items.is_empty());
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_failed_page_is_upstream_fetch_error() {
        let first = Page::new(vec![1, 2], Some(cursor(2)));
        let err = fetch_all(first, |_| async {
            Err::<Page<i32>, _>(AppError::RateLimited("429".into()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::UpstreamFetch { .. }));
    }

    #[tokio::test]
    async fn test_does_not_deduplicate() {
        let first = Page::new(vec!["a", "b"], Some(cursor(2)));
        let items = fetch_all(first, |_| async { Ok(Page::new(vec!["a"], None)) })
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_user_playlists_follow_cursor() {
        let mut source = MockSourceSession::new();
        source
            .expect_user_playlists_page()
            .withf(|c| c.is_none())
            .times(1)
            .returning(|_| {
                Ok(Page::new(
                    vec![PlaylistSummary {
                        id: "a".into(),
                        name: "Road Trip".into(),
                        total_tracks: 3,
                    }],
                    Some(PageCursor {
                        collection: "me".into(),
                        offset: 50,
                    }),
                ))
            });
        source
            .expect_user_playlists_page()
            .withf(|c| c.as_ref().map(|c| c.offset) == Some(50))
            .times(1)
            .returning(|_| {
                Ok(Page::new(
                    vec![PlaylistSummary {
                        id: "b".into(),
                        name: "Chill".into(),
                        total_tracks: 0,
                    }],
                    None,
                ))
            });

        let playlists = fetch_user_playlists(&source).await.unwrap();
        let names: Vec<_> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Road Trip", "Chill"]);
    }
}
