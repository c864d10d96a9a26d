use domain::VideoDetails;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("lock on {0} was poisoned by a panicked writer")]
    LockPoisoned(&'static str),
}

/// Repository trait for data access abstraction
/// This allows switching between different storage backends (in-memory, redis, database)
pub trait Repository: Send + Sync {
    /// Insert or replace a video, keyed by its id
    fn save(&self, video: VideoDetails) -> Result<(), DatastoreError>;

    /// Set `indexed` on the stored copy of `expected`, but only while that copy still
    /// matches `expected` in every other field. Returns false when the video was
    /// removed or re-registered in the meantime.
    fn mark_indexed(&self, expected: &VideoDetails) -> Result<bool, DatastoreError>;

    /// Get a video by ID
    fn find_by_id(&self, id: &str) -> Result<Option<VideoDetails>, DatastoreError>;

    /// Get all videos of a channel, ordered by start time
    fn find_by_channel_name(&self, channel_name: &str) -> Result<Vec<VideoDetails>, DatastoreError>;

    /// Get all videos, ordered by start time
    fn find_all(&self) -> Result<Vec<VideoDetails>, DatastoreError>;
}

#[derive(Default)]
struct Store {
    videos: HashMap<String, VideoDetails>,
    /// channel name -> video ids
    by_channel: HashMap<String, BTreeSet<String>>,
}

/// In-memory implementation of the Repository trait
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_start_time(mut videos: Vec<VideoDetails>) -> Vec<VideoDetails> {
    videos.sort_by(|a, b| {
        a.video_start_time
            .cmp(&b.video_start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    videos
}

/// Equal in everything but the indexed flag
fn same_registration(a: &VideoDetails, b: &VideoDetails) -> bool {
    a.id == b.id
        && a.channel_name == b.channel_name
        && a.video_title == b.video_title
        && a.video_start_time == b.video_start_time
        && a.video_end_time == b.video_end_time
        && a.video_url == b.video_url
}

impl Repository for InMemoryRepository {
    fn save(&self, video: VideoDetails) -> Result<(), DatastoreError> {
        let mut store = self
            .store
            .write()
            .map_err(|_| DatastoreError::LockPoisoned("videos"))?;

        // Drop the stale index entry when a video moves to another channel
        let previous_channel = store
            .videos
            .get(&video.id)
            .filter(|previous| previous.channel_name != video.channel_name)
            .map(|previous| previous.channel_name.clone());
        if let Some(channel) = previous_channel {
            if let Some(ids) = store.by_channel.get_mut(&channel) {
                ids.remove(&video.id);
                if ids.is_empty() {
                    store.by_channel.remove(&channel);
                }
            }
        }

        debug!(id = %video.id, channel = %video.channel_name, indexed = video.indexed, "saving video");
        store
            .by_channel
            .entry(video.channel_name.clone())
            .or_default()
            .insert(video.id.clone());
        store.videos.insert(video.id.clone(), video);
        Ok(())
    }

    fn mark_indexed(&self, expected: &VideoDetails) -> Result<bool, DatastoreError> {
        let mut store = self
            .store
            .write()
            .map_err(|_| DatastoreError::LockPoisoned("videos"))?;

        match store.videos.get_mut(&expected.id) {
            Some(current) if same_registration(current, expected) => {
                debug!(id = %current.id, "marking video indexed");
                current.indexed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn find_by_id(&self, id: &str) -> Result<Option<VideoDetails>, DatastoreError> {
        let store = self
            .store
            .read()
            .map_err(|_| DatastoreError::LockPoisoned("videos"))?;
        Ok(store.videos.get(id).cloned())
    }

    fn find_by_channel_name(&self, channel_name: &str) -> Result<Vec<VideoDetails>, DatastoreError> {
        let store = self
            .store
            .read()
            .map_err(|_| DatastoreError::LockPoisoned("videos"))?;
        let videos = store
            .by_channel
            .get(channel_name)
            .into_iter()
            .flatten()
            .filter_map(|id| store.videos.get(id).cloned())
            .collect();
        Ok(by_start_time(videos))
    }

    fn find_all(&self) -> Result<Vec<VideoDetails>, DatastoreError> {
        let store = self
            .store
            .read()
            .map_err(|_| DatastoreError::LockPoisoned("videos"))?;
        Ok(by_start_time(store.videos.values().cloned().collect()))
    }
}
