use crate::ports::youtube::{DeleteError, YoutubeClient};

/// Remove a single playlist entry. No retry: a rejection is returned as-is.
pub async fn delete_item<C>(client: &C, item_id: &str) -> Result<(), DeleteError>
where
    C: YoutubeClient + ?Sized,
{
    tracing::debug!(item_id, "Deleting playlist item");
    client.delete_playlist_item(item_id).await?;
    tracing::info!(item_id, "Deleted playlist item");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::youtube::MockYoutubeClient;

    #[tokio::test]
    async fn test_delete_item() {
        let mut client = MockYoutubeClient::new();
        client
            .expect_delete_playlist_item()
            .withf(|item_id| item_id == "UExhYmMuMDI")
            .times(1)
            .returning(|_| Ok(()));

        delete_item(&client, "UExhYmMuMDI").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_returned() {
        let mut client = MockYoutubeClient::new();
        client.expect_delete_playlist_item().times(1).returning(|id| {
            Err(DeleteError::Rejected {
                item_id: id.to_string(),
                status: 404,
                body: "playlistItemNotFound".into(),
            })
        });

        let error = delete_item(&client, "gone").await.unwrap_err();
        assert!(matches!(
            error,
            DeleteError::Rejected { ref item_id, status: 404, .. } if item_id == "gone"
        ));
    }
}
