use std::io::Write;

use color_eyre::eyre::{Result, WrapErr};

use crate::ports::youtube::YoutubeClient;
use crate::services::deleter::delete_item;
use crate::services::duplicates::{DeletionMode, find_duplicates};
use crate::services::playlists::resolve_playlist_ids;

/// Stages of a run. Each one is entered exactly once, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupState {
    Unauthenticated,
    Authenticated,
    PlaylistResolved,
    DuplicatesFound,
    Deleting,
    Done,
}

pub fn enter(state: DedupState) {
    tracing::debug!(?state, "Entering state");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupOutcome {
    /// No playlist on the account carries the requested name.
    NoSuchPlaylist,
    Done { deleted: usize },
}

/// Runs resolve -> scan -> delete against an authenticated client, writing
/// the human-readable report to `out`.
pub struct DedupService<C: YoutubeClient> {
    client: C,
    mode: DeletionMode,
}

impl<C: YoutubeClient> DedupService<C> {
    pub fn new(client: C, mode: DeletionMode) -> Self {
        Self { client, mode }
    }

    pub async fn run(&self, playlist_name: &str, out: &mut impl Write) -> Result<DedupOutcome> {
        let playlist_ids = resolve_playlist_ids(&self.client, playlist_name).await?;
        writeln!(out, "playlist_ids: {:?}", playlist_ids)?;
        writeln!(out)?;

        let Some(playlist_id) = playlist_ids.first() else {
            return Ok(DedupOutcome::NoSuchPlaylist);
        };
        if playlist_ids.len() > 1 {
            tracing::warn!(
                "{} playlists are named '{}', only scanning {}",
                playlist_ids.len(),
                playlist_name,
                playlist_id
            );
        }
        enter(DedupState::PlaylistResolved);

        let duplicates = find_duplicates(&self.client, playlist_id).await?;
        if duplicates.is_empty() {
            tracing::info!(playlist_id, "No duplicate titles found");
        }
        for group in duplicates.iter() {
            writeln!(out, "{}: {}", group.title, group.first_id)?;
        }
        enter(DedupState::DuplicatesFound);

        enter(DedupState::Deleting);
        let mut deleted = 0;
        for group in duplicates.iter() {
            for item_id in group.ids_to_delete(self.mode) {
                writeln!(out, "Delete {}", group.title)?;
                delete_item(&self.client, item_id)
                    .await
                    .wrap_err_with(|| format!("Failed to delete duplicate of '{}'", group.title))?;
                deleted += 1;
            }
        }

        enter(DedupState::Done);
        tracing::info!(deleted, mode = ?self.mode, "Finished removing duplicates");
        Ok(DedupOutcome::Done { deleted })
    }
}
