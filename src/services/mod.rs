pub mod dedup;
pub mod deleter;
pub mod duplicates;
pub mod playlists;
