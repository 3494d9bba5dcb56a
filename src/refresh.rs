//! Periodic bus position polling
//!
//! Re-fetches the buses of a fixed set of routes on an interval in a
//! background task and sends the results to the caller over a tokio channel.
//! Polling stops on `shutdown` or when the handle is dropped.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::data::{visible_buses, ApiError, Bus, TransitApi};

/// Messages sent from the background poller to the caller
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A polling round started
    RefreshStarted,
    /// Fresh buses for a route
    BusesUpdated { route_id: i64, buses: Vec<Bus> },
    /// Fetching buses for a route failed; polling continues
    RefreshError { route_id: i64, error: ApiError },
    /// A polling round finished
    RefreshCompleted,
}

/// Configuration for bus polling
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between polling rounds
    pub interval: Duration,
    /// Drop buses that are not adapted for reduced mobility
    pub only_accessible: bool,
    /// Whether polling is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            only_accessible: false,
            enabled: true,
        }
    }
}

/// Handle for controlling the background poller
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns a task polling the buses of `route_ids` in `city_id`
    ///
    /// The first round runs immediately.
    pub fn spawn(
        config: RefreshConfig,
        api: Arc<dyn TransitApi>,
        city_id: i64,
        route_ids: Vec<i64>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled && !route_ids.is_empty() {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let round = poll_round(api.as_ref(), city_id, &route_ids, config.only_accessible);
                            let messages = round.await;
                            for message in messages {
                                if msg_tx.send(message).await.is_err() {
                                    debug!("refresh receiver dropped, stopping");
                                    return;
                                }
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("refresh shut down");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message from the poller
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Stops the background poller
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Fetches every route once and returns the messages for the round
async fn poll_round(
    api: &dyn TransitApi,
    city_id: i64,
    route_ids: &[i64],
    only_accessible: bool,
) -> Vec<RefreshMessage> {
    let fetches = route_ids.iter().map(|&route_id| async move {
        match api.buses(city_id, route_id).await {
            Ok(buses) => RefreshMessage::BusesUpdated {
                route_id,
                buses: visible_buses(buses, only_accessible),
            },
            Err(error) => RefreshMessage::RefreshError { route_id, error },
        }
    });

    let mut messages = vec![RefreshMessage::RefreshStarted];
    messages.extend(join_all(fetches).await);
    messages.push(RefreshMessage::RefreshCompleted);
    messages
}

/// Checks for a pending refresh message without blocking
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
