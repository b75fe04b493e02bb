use std::collections::HashMap;

use color_eyre::eyre::{Result, WrapErr};
use futures::TryStreamExt;

use crate::pagination::paginate_items;
use crate::ports::youtube::YoutubeClient;

/// Which copies of a duplicated title get removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
    /// Delete only the recorded (first-seen) id of each duplicated title.
    ///
    /// Removes one copy per title per run; a title with three or more copies
    /// needs repeated runs to get down to one.
    Legacy,
    /// Keep the first-seen copy and delete every later one.
    KeepFirst,
}

/// Title -> item ids, both in playlist order.
#[derive(Debug, Default)]
pub struct TitleIndex {
    groups: Vec<(String, Vec<String>)>,
    positions: HashMap<String, usize>,
}

impl TitleIndex {
    pub fn insert(&mut self, title: String, item_id: String) {
        match self.positions.get(&title) {
            Some(&position) => self.groups[position].1.push(item_id),
            None => {
                self.positions.insert(title.clone(), self.groups.len());
                self.groups.push((title, vec![item_id]));
            }
        }
    }

    pub fn into_duplicates(self) -> DuplicateSet {
        let groups = self
            .groups
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(title, mut ids)| {
                let others = ids.split_off(1);
                DuplicateGroup {
                    title,
                    first_id: ids.remove(0),
                    other_ids: others,
                }
            })
            .collect();
        DuplicateSet { groups }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub title: String,
    /// Earliest id in pagination order.
    pub first_id: String,
    /// The remaining ids sharing the title, in playlist order.
    pub other_ids: Vec<String>,
}

impl DuplicateGroup {
    pub fn ids_to_delete(&self, mode: DeletionMode) -> Vec<&str> {
        match mode {
            DeletionMode::Legacy => vec![self.first_id.as_str()],
            DeletionMode::KeepFirst => self.other_ids.iter().map(String::as_str).collect(),
        }
    }
}

/// Every title that occurs at least twice, ordered by first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateSet {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateSet {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter()
    }
}

/// Scan every item of the playlist and collect the titles that occur more than once.
pub async fn find_duplicates<C>(client: &C, playlist_id: &str) -> Result<DuplicateSet>
where
    C: YoutubeClient + ?Sized,
{
    let items = paginate_items(|page_token| client.list_playlist_items(playlist_id, page_token));
    let mut items = std::pin::pin!(items);

    let mut index = TitleIndex::default();
    let mut scanned = 0usize;
    while let Some(item) = items
        .try_next()
        .await
        .wrap_err_with(|| format!("Failed to scan playlist {}", playlist_id))?
    {
        index.insert(item.title, item.id);
        scanned += 1;
    }

    let duplicates = index.into_duplicates();
    tracing::info!(
        playlist_id,
        scanned,
        duplicated_titles = duplicates.len(),
        "Scanned playlist"
    );
    Ok(duplicates)
}
