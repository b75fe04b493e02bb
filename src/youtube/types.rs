use serde::Deserialize;

use crate::ports::youtube::{Page, YoutubeApiPlaylist, YoutubeApiPlaylistItem};

/// Envelope shared by every `*.list` response
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snippet {
    pub title: String,
}

/// `playlists` resource, as requested with `part=id,snippet`
#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub snippet: Snippet,
}

/// `playlistItems` resource, as requested with `part=id,snippet`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub snippet: Snippet,
}

impl From<ListResponse<Playlist>> for Page<YoutubeApiPlaylist> {
    fn from(response: ListResponse<Playlist>) -> Self {
        Page {
            items: response
                .items
                .into_iter()
                .map(|playlist| YoutubeApiPlaylist {
                    id: playlist.id,
                    title: playlist.snippet.title,
                })
                .collect(),
            next_page_token: response.next_page_token,
        }
    }
}

impl From<ListResponse<PlaylistItem>> for Page<YoutubeApiPlaylistItem> {
    fn from(response: ListResponse<PlaylistItem>) -> Self {
        Page {
            items: response
                .items
                .into_iter()
                .map(|item| YoutubeApiPlaylistItem {
                    id: item.id,
                    title: item.snippet.title,
                })
                .collect(),
            next_page_token: response.next_page_token,
        }
    }
}
