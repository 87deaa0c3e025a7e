// ABOUTME: Per-account broadcast hub publishing AccountSnapshot values after committed writes
// ABOUTME: Backs the server-sent event stream clients use for live progression updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Live account updates
//!
//! Services publish a fresh [`AccountSnapshot`] after every committed ledger
//! mutation. Subscribers that fall behind skip the missed snapshots, since
//! only the latest state matters.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::AccountSnapshot;

/// Default per-account channel capacity
pub const DEFAULT_EVENT_BUFFER: usize = 32;

/// Broadcast hub keyed by account id
#[derive(Clone)]
pub struct AccountEvents {
    channels: Arc<RwLock<HashMap<Uuid, broadcast::Sender<AccountSnapshot>>>>,
    buffer_size: usize,
}

impl AccountEvents {
    /// Create a hub with the given per-account buffer
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Receive every snapshot published for `account_id` from now on
    pub async fn subscribe(&self, account_id: Uuid) -> broadcast::Receiver<AccountSnapshot> {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(account_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        sender.subscribe()
    }

    /// Snapshot stream for `account_id`, skipping over lagged messages
    pub async fn subscribe_stream(
        &self,
        account_id: Uuid,
    ) -> impl Stream<Item = AccountSnapshot> + Send + 'static {
        let receiver = self.subscribe(account_id).await;
        BroadcastStream::new(receiver).filter_map(move |item| async move {
            match item {
                Ok(snapshot) => Some(snapshot),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(account.id = %account_id, skipped = skipped, "Account event subscriber lagged");
                    None
                }
            }
        })
    }

    /// Publish a snapshot to the account's subscribers
    pub async fn publish(&self, snapshot: &AccountSnapshot) {
        let account_id = snapshot.account_id;
        let delivered = {
            let channels = self.channels.read().await;
            channels
                .get(&account_id)
                .map(|sender| sender.send(snapshot.clone()).is_ok())
        };

        match delivered {
            Some(true) => debug!(account.id = %account_id, "Published account snapshot"),
            Some(false) => {
                let mut channels = self.channels.write().await;
                if channels
                    .get(&account_id)
                    .is_some_and(|sender| sender.receiver_count() == 0)
                {
                    channels.remove(&account_id);
                }
            }
            None => {}
        }
    }

    /// Number of live subscribers for an account
    pub async fn subscriber_count(&self, account_id: Uuid) -> usize {
        self.channels
            .read()
            .await
            .get(&account_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for AccountEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
