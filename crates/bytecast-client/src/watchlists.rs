//! Watchlist/channel cache and its consistency rules.
//!
//! The cache is the authoritative client-side view of watchlists, the active
//! selection, and the active watchlist's channels. Every mutation talks to
//! the server first and commits to the snapshot only on success, in one
//! `send_modify`, so callers observe either the old state or the new state
//! and never a partial write. Channel fetches are keyed by watchlist id and
//! results whose id no longer matches the current selection are discarded;
//! the last selected watchlist wins regardless of completion order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use bytecast_api_models::{
    AddChannelRequest, Channel, ChannelsEnvelope, Watchlist, WatchlistDraft, WatchlistsEnvelope,
};

use crate::error::{ClientError, ClientResult};
use crate::gateway::AuthGateway;
use crate::storage::{ACTIVE_WATCHLIST_KEY, ProfileStore};

/// Immutable view of the cache state observed by consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Watchlists in server response order, never re-sorted client-side.
    pub watchlists: Vec<Watchlist>,
    /// Id of the active watchlist, when one is selected.
    pub active_id: Option<u64>,
    /// Channels of the active watchlist only.
    pub channels: Vec<Channel>,
    /// Channel count per watchlist id.
    pub channel_counts: HashMap<u64, usize>,
    /// Result set of the most recent channel search.
    pub search_results: Vec<Channel>,
}

impl CacheSnapshot {
    /// The active watchlist entry, resolved against the collection.
    #[must_use]
    pub fn active_watchlist(&self) -> Option<&Watchlist> {
        self.active_id
            .and_then(|id| self.watchlists.iter().find(|watchlist| watchlist.id == id))
    }
}

/// Client-side cache of watchlists, the active selection, and channels.
pub struct WatchlistCache {
    gateway: Arc<AuthGateway>,
    store: Arc<ProfileStore>,
    state: watch::Sender<CacheSnapshot>,
}

impl WatchlistCache {
    /// Build an empty cache over the given gateway and profile store.
    #[must_use]
    pub fn new(gateway: Arc<AuthGateway>, store: Arc<ProfileStore>) -> Self {
        let (state, _) = watch::channel(CacheSnapshot::default());
        Self {
            gateway,
            store,
            state,
        }
    }

    /// Current cache state.
    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to cache state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot> {
        self.state.subscribe()
    }

    /// Initial load: fetch the collection, restore and revalidate the
    /// persisted active id (falling back to the first fetched watchlist, or
    /// none when the collection is empty), then prime the channel view and
    /// per-watchlist counts.
    ///
    /// # Errors
    /// Fails when the collection fetch fails or the healed active id cannot
    /// be persisted. Count priming is best-effort and only logs.
    pub async fn hydrate(&self) -> ClientResult<CacheSnapshot> {
        let watchlists = self.fetch_watchlists().await?;
        let persisted = self
            .store
            .get(ACTIVE_WATCHLIST_KEY)
            .and_then(|raw| raw.parse::<u64>().ok());
        let active = persisted.map_or_else(
            || watchlists.first().map(|watchlist| watchlist.id),
            |id| validate_active(id, &watchlists),
        );
        self.state.send_modify(|state| {
            state.watchlists.clone_from(&watchlists);
            state.active_id = active;
            state.channels.clear();
            state
                .channel_counts
                .retain(|id, _| watchlists.iter().any(|watchlist| watchlist.id == *id));
        });
        self.persist_active(active)?;
        for watchlist in &watchlists {
            match self.fetch_channels(watchlist.id).await {
                Ok(channels) => self.apply_channels(watchlist.id, channels),
                Err(error) => {
                    warn!(watchlist = watchlist.id, %error, "channel count priming failed");
                }
            }
        }
        Ok(self.snapshot())
    }

    /// Fetch the full collection and replace the cached one wholesale.
    ///
    /// An active id that vanished from the fetched collection heals to the
    /// first fetched watchlist (or none), and the channel view follows.
    ///
    /// # Errors
    /// Fails when the fetch fails; the cache is then left untouched.
    pub async fn refresh_watchlists(&self) -> ClientResult<Vec<Watchlist>> {
        let watchlists = self.fetch_watchlists().await?;
        let previous = self.state.borrow().active_id;
        let active = previous.and_then(|id| validate_active(id, &watchlists));
        self.state.send_modify(|state| {
            state.watchlists.clone_from(&watchlists);
            state
                .channel_counts
                .retain(|id, _| watchlists.iter().any(|watchlist| watchlist.id == *id));
            if state.active_id != active {
                state.active_id = active;
                state.channels.clear();
            }
        });
        if previous != active {
            self.persist_active(active)?;
            if let Some(id) = active {
                match self.fetch_channels(id).await {
                    Ok(channels) => self.apply_channels(id, channels),
                    Err(error) => warn!(watchlist = id, %error, "channel refresh after heal failed"),
                }
            }
        }
        Ok(watchlists)
    }

    /// Create a watchlist and append it to the collection. The new watchlist
    /// does not become active.
    ///
    /// # Errors
    /// Fails when the server rejects the draft; the cache is left untouched.
    pub async fn create_watchlist(&self, draft: &WatchlistDraft) -> ClientResult<Watchlist> {
        let created: Watchlist = self.gateway.post_json("/watchlists", draft).await?;
        self.state.send_modify(|state| {
            state.channel_counts.insert(created.id, 0);
            state.watchlists.push(created.clone());
        });
        Ok(created)
    }

    /// Update a watchlist in place. The active view follows automatically
    /// since it is resolved against the collection.
    ///
    /// # Errors
    /// Fails when the server rejects the update; the cache is left untouched.
    pub async fn update_watchlist(
        &self,
        id: u64,
        draft: &WatchlistDraft,
    ) -> ClientResult<Watchlist> {
        let updated: Watchlist = self
            .gateway
            .put_json(&format!("/watchlists/{id}"), draft)
            .await?;
        self.state.send_modify(|state| {
            if let Some(slot) = state
                .watchlists
                .iter_mut()
                .find(|watchlist| watchlist.id == id)
            {
                *slot = updated.clone();
            }
        });
        Ok(updated)
    }

    /// Delete a watchlist. Refused locally, before any network call, when it
    /// is the last remaining one or not in the cached collection. Deleting
    /// the active watchlist clears the selection, the channel view, and the
    /// persisted active id.
    ///
    /// # Errors
    /// [`ClientError::LastWatchlist`] or [`ClientError::UnknownWatchlist`]
    /// from the local guards, else a translated server error.
    pub async fn delete_watchlist(&self, id: u64) -> ClientResult<()> {
        {
            let state = self.state.borrow();
            if state.watchlists.len() <= 1 {
                return Err(ClientError::LastWatchlist);
            }
            if !state.watchlists.iter().any(|watchlist| watchlist.id == id) {
                return Err(ClientError::UnknownWatchlist { id });
            }
        }
        self.gateway.delete(&format!("/watchlists/{id}")).await?;
        let mut was_active = false;
        self.state.send_modify(|state| {
            state.watchlists.retain(|watchlist| watchlist.id != id);
            state.channel_counts.remove(&id);
            if state.active_id == Some(id) {
                state.active_id = None;
                state.channels.clear();
                was_active = true;
            }
        });
        if was_active {
            self.store.remove(ACTIVE_WATCHLIST_KEY)?;
        }
        Ok(())
    }

    /// Change the active selection. The pointer moves and persists
    /// immediately; selecting a watchlist then refreshes its channel view
    /// asynchronously, while deselecting clears the view with no network
    /// call. A refresh result that arrives after the selection moved on is
    /// discarded.
    ///
    /// # Errors
    /// Storage failures persisting the pointer, or a translated server error
    /// from the channel refresh.
    pub async fn select_watchlist(&self, watchlist: Option<&Watchlist>) -> ClientResult<()> {
        match watchlist {
            Some(watchlist) => {
                let id = watchlist.id;
                self.state.send_modify(|state| state.active_id = Some(id));
                self.store.set(ACTIVE_WATCHLIST_KEY, id.to_string())?;
                let channels = self.fetch_channels(id).await?;
                self.apply_channels(id, channels);
                Ok(())
            }
            None => {
                self.state.send_modify(|state| {
                    state.active_id = None;
                    state.channels.clear();
                });
                self.store.remove(ACTIVE_WATCHLIST_KEY)
            }
        }
    }

    /// Attach a channel (by YouTube id or URL) to a watchlist, then re-fetch
    /// that watchlist's channel list so server-side dedup/validation is
    /// reflected rather than guessed at locally.
    ///
    /// # Errors
    /// Fails when the server rejects the attach or the re-fetch fails.
    pub async fn add_channel(&self, watchlist_id: u64, channel_ref: &str) -> ClientResult<()> {
        self.gateway
            .post_unit(
                &format!("/watchlists/{watchlist_id}/channels"),
                &AddChannelRequest {
                    channel_id: channel_ref.to_string(),
                },
            )
            .await?;
        let channels = self.fetch_channels(watchlist_id).await?;
        self.apply_channels(watchlist_id, channels);
        Ok(())
    }

    /// Detach a channel from a watchlist. The channel is addressed by its
    /// record id against the cached view; the server path carries its
    /// YouTube id. The membership list is then re-fetched wholesale.
    ///
    /// # Errors
    /// [`ClientError::UnknownChannel`] when the record id is not in the
    /// active channel view, else a translated server error.
    pub async fn remove_channel(&self, channel_id: u64, watchlist_id: u64) -> ClientResult<()> {
        let youtube_id = self
            .state
            .borrow()
            .channels
            .iter()
            .find(|channel| channel.id == channel_id)
            .map(|channel| channel.youtube_id.clone())
            .ok_or(ClientError::UnknownChannel { id: channel_id })?;
        self.gateway
            .delete(&format!("/watchlists/{watchlist_id}/channels/{youtube_id}"))
            .await?;
        let channels = self.fetch_channels(watchlist_id).await?;
        self.apply_channels(watchlist_id, channels);
        Ok(())
    }

    /// Search channels. The result set replaces the previous one wholesale;
    /// nothing is merged.
    ///
    /// # Errors
    /// Fails when the search request fails; the previous result set is kept.
    pub async fn search_channels(&self, query: &str) -> ClientResult<Vec<Channel>> {
        let results: Vec<Channel> = self
            .gateway
            .get_json_with_query("/search", &[("q", query)])
            .await?;
        self.state
            .send_modify(|state| state.search_results.clone_from(&results));
        Ok(results)
    }

    async fn fetch_watchlists(&self) -> ClientResult<Vec<Watchlist>> {
        let envelope: WatchlistsEnvelope = self.gateway.get_json("/watchlists").await?;
        Ok(envelope.watchlists)
    }

    async fn fetch_channels(&self, watchlist_id: u64) -> ClientResult<Vec<Channel>> {
        let envelope: ChannelsEnvelope = self
            .gateway
            .get_json(&format!("/watchlists/{watchlist_id}/channels"))
            .await?;
        Ok(envelope.channels)
    }

    /// Commit a fetched channel list: the count is always fresh information,
    /// the view only when the watchlist is still the active one.
    fn apply_channels(&self, watchlist_id: u64, channels: Vec<Channel>) {
        self.state.send_modify(|state| {
            state.channel_counts.insert(watchlist_id, channels.len());
            if state.active_id == Some(watchlist_id) {
                state.channels = channels;
            } else {
                debug!(watchlist = watchlist_id, "discarding stale channel fetch");
            }
        });
    }

    fn persist_active(&self, active: Option<u64>) -> ClientResult<()> {
        match active {
            Some(id) => self.store.set(ACTIVE_WATCHLIST_KEY, id.to_string()),
            None => self.store.remove(ACTIVE_WATCHLIST_KEY),
        }
    }
}

/// Revalidate an active-watchlist id against a fetched collection: a present
/// id is kept, a vanished one falls back to the first watchlist, and an empty
/// collection yields none.
fn validate_active(candidate: u64, watchlists: &[Watchlist]) -> Option<u64> {
    if watchlists.iter().any(|watchlist| watchlist.id == candidate) {
        Some(candidate)
    } else {
        watchlists.first().map(|watchlist| watchlist.id)
    }
}
