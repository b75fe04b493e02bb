use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::ports::youtube::{
    DeleteError, Page, YoutubeApiPlaylist, YoutubeApiPlaylistItem, YoutubeClient,
};
use crate::youtube::types::{ListResponse, Playlist, PlaylistItem};

/// Largest page the listing endpoints hand out.
pub const MAX_RESULTS: u32 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// YouTube Data API client authorized with a bearer token.
///
/// Docs: https://developers.google.com/youtube/v3/docs
pub struct YoutubeHttpAdapter {
    client: Client,
    playlists_url: Url,
    playlist_items_url: Url,
    access_token: String,
}

impl YoutubeHttpAdapter {
    pub fn new(config: &Config, access_token: String) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url()).wrap_err("Invalid API base URL")?;
        let endpoint = |resource: &str| {
            base_url
                .join(resource)
                .wrap_err_with(|| format!("Failed to build URL for {}", resource))
        };
        Ok(Self {
            client: Client::new(),
            playlists_url: endpoint("playlists")?,
            playlist_items_url: endpoint("playlistItems")?,
            access_token,
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<ListResponse<T>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        // The body names the reason, e.g. quotaExceeded or playlistNotFound.
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string());
            bail!("API returned {}: {}", status, body);
        }

        response
            .json::<ListResponse<T>>()
            .await
            .wrap_err("Failed to deserialize list response")
    }
}

fn with_page_token(url: &mut Url, page_token: Option<String>) {
    if let Some(token) = page_token {
        url.query_pairs_mut().append_pair("pageToken", &token);
    }
}

#[async_trait::async_trait]
impl YoutubeClient for YoutubeHttpAdapter {
    async fn list_my_playlists(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<YoutubeApiPlaylist>> {
        let mut url = self.playlists_url.clone();
        url.query_pairs_mut()
            .append_pair("part", "id,snippet")
            .append_pair("mine", "true")
            .append_pair("maxResults", &MAX_RESULTS.to_string());
        with_page_token(&mut url, page_token);

        let response = self
            .get_list::<Playlist>(url)
            .await
            .wrap_err("Failed to list playlists")?;
        Ok(response.into())
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<YoutubeApiPlaylistItem>> {
        let mut url = self.playlist_items_url.clone();
        url.query_pairs_mut()
            .append_pair("part", "id,snippet")
            .append_pair("playlistId", playlist_id)
            .append_pair("maxResults", &MAX_RESULTS.to_string());
        with_page_token(&mut url, page_token);

        let response = self
            .get_list::<PlaylistItem>(url)
            .await
            .wrap_err_with(|| format!("Failed to list items of playlist {}", playlist_id))?;
        Ok(response.into())
    }

    async fn delete_playlist_item(&self, item_id: &str) -> Result<(), DeleteError> {
        let to_request_error = |source| DeleteError::Request {
            item_id: item_id.to_string(),
            source,
        };

        let mut url = self.playlist_items_url.clone();
        url.query_pairs_mut().append_pair("id", item_id);

        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(to_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string());
            return Err(DeleteError::Rejected {
                item_id: item_id.to_string(),
                status,
                body,
            });
        }

        Ok(())
    }
}
