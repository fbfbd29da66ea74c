//! Pagination over feature services.
//!
//! Two shapes of the same traversal: [`features`] delivers each page to a
//! callback that decides whether to continue, [`pages`] yields pages lazily
//! as a stream that can be cancelled while a request is in flight.
//!
//! Both follow the first `next` link of each page until a page has none.
//! A `next` href already visited in the same traversal also ends it.

use std::collections::HashSet;

use async_stream::try_stream;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;
use crate::types::FeaturePage;

use super::source::{collection_items_url, resolve_href, FeatureQuery, PageSource};

/// Fetches pages of `feat_type` from `endpoint`, handing each to `callback`.
///
/// The callback returns `true` to request the next page. Traversal stops when
/// it returns `false` or the page has no `next` link.
///
/// Returns the number of pages delivered to the callback.
pub async fn features<S, F>(
    source: &S,
    endpoint: &str,
    feat_type: &str,
    query: &FeatureQuery,
    callback: F,
) -> Result<usize>
where
    S: PageSource + ?Sized,
    F: FnMut(&FeaturePage) -> bool,
{
    let mut url = collection_items_url(endpoint, feat_type)?;
    query.apply_to(&mut url);
    traverse(source, url, callback).await
}

/// Fetches pages starting at `start`, handing each to `callback`.
///
/// Same contract as [`features`] for an already-built URL.
pub async fn traverse<S, F>(source: &S, start: Url, mut callback: F) -> Result<usize>
where
    S: PageSource + ?Sized,
    F: FnMut(&FeaturePage) -> bool,
{
    let mut visited = HashSet::new();
    let mut url = start;
    let mut delivered = 0;

    loop {
        visited.insert(url.to_string());
        let page = source.get_page(&url).await?;
        delivered += 1;
        tracing::debug!(page = delivered, features = page.len(), "page received");

        if !callback(&page) {
            break;
        }

        let Some(href) = page.next_link() else {
            break;
        };
        let next = resolve_href(&url, href)?;
        if visited.contains(next.as_str()) {
            tracing::warn!(%next, "next link loops back to a visited page, stopping");
            break;
        }
        url = next;
    }

    Ok(delivered)
}

/// Returns a lazy stream of pages starting at `start`.
///
/// Nothing is fetched until the stream is polled. Each call starts a fresh
/// traversal. The stream ends after yielding the first error, after the
/// last page, or as soon as `token` is cancelled, including while a request
/// is in flight.
pub fn pages<'a, S>(
    source: &'a S,
    start: Url,
    token: CancellationToken,
) -> impl Stream<Item = Result<FeaturePage>> + 'a
where
    S: PageSource + ?Sized,
{
    try_stream! {
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(url) = next.take() {
            if token.is_cancelled() {
                tracing::debug!(%url, "traversal cancelled");
                break;
            }
            visited.insert(url.to_string());

            let page = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%url, "traversal cancelled during request");
                    break;
                }
                page = source.get_page(&url) => page,
            };
            let page = page?;
            let href = page.next_link().map(str::to_owned);

            yield page;

            if let Some(href) = href {
                let resolved = resolve_href(&url, &href)?;
                if visited.contains(resolved.as_str()) {
                    tracing::warn!(next = %resolved, "next link loops back to a visited page, stopping");
                } else {
                    next = Some(resolved);
                }
            }
        }
    }
}
