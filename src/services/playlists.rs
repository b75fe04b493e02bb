use std::future;

use color_eyre::eyre::{Result, WrapErr};
use futures::TryStreamExt;

use crate::pagination::paginate_items;
use crate::ports::youtube::YoutubeClient;

/// Ids of every playlist on the account whose title equals `name` exactly.
///
/// An empty result is not an error here; the caller decides what no match means.
pub async fn resolve_playlist_ids<C>(client: &C, name: &str) -> Result<Vec<String>>
where
    C: YoutubeClient + ?Sized,
{
    let ids = paginate_items(|page_token| client.list_my_playlists(page_token))
        .try_filter_map(|playlist| {
            future::ready(Ok((playlist.title == name).then_some(playlist.id)))
        })
        .try_collect::<Vec<_>>()
        .await
        .wrap_err_with(|| format!("Failed to resolve playlist '{}'", name))?;

    tracing::debug!(name, matches = ids.len(), "Resolved playlist name");
    Ok(ids)
}
