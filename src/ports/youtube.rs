use color_eyre::eyre::Result;

/// One page of a listing call, plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Decoupled representation of a playlist owned by the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeApiPlaylist {
    pub id: String,
    pub title: String,
}

/// Decoupled representation of one playlist entry. `id` is the playlist-scoped
/// item id, not the video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeApiPlaylistItem {
    pub id: String,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("Platform rejected deletion of playlist item {item_id} ({status}): {body}")]
    Rejected {
        item_id: String,
        status: u16,
        body: String,
    },
    #[error("Failed to send delete request for playlist item {item_id}: {source}")]
    Request {
        item_id: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Port trait wrapping the YouTube Data API calls used by business logic.
///
/// Implementations live in `youtube::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait YoutubeClient: Send + Sync {
    async fn list_my_playlists(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<YoutubeApiPlaylist>>;

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<YoutubeApiPlaylistItem>>;

    async fn delete_playlist_item(&self, item_id: &str) -> Result<(), DeleteError>;
}
