use std::future::Future;

use color_eyre::eyre::{Report, Result};
use futures::stream::{self, Stream, TryStreamExt};

use crate::ports::youtube::Page;

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily walks a continuation-token listing, one request per polled page.
///
/// The stream ends after the first page without a `next_page_token`; an empty
/// token counts as absent. Building a new stream starts over from the first page.
pub fn paginate<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>>> + 'a
where
    T: 'a,
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>>> + 'a,
{
    stream::try_unfold((fetch, Cursor::Start), |(mut fetch, cursor)| async move {
        let page_token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = fetch(page_token).await?;
        let next = match page.next_page_token.as_deref() {
            Some(token) if !token.is_empty() => Cursor::Next(token.to_string()),
            _ => Cursor::Done,
        };
        Ok(Some((page, (fetch, next))))
    })
}

/// Same as [`paginate`], flattened to the individual items.
pub fn paginate_items<'a, T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T>> + 'a
where
    T: 'a,
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>>> + 'a,
{
    paginate(fetch)
        .map_ok(|page| stream::iter(page.items.into_iter().map(Ok::<T, Report>)))
        .try_flatten()
}
