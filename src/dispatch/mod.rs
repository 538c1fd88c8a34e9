mod connector;
mod event;

pub use connector::{
    Connector, Credentials, EnvCredentials, Incoming, Link, Outgoing, WsConnector,
};
pub use event::{AlertLevel, InboundEvent, OutboundEvent, RideRequest, VacationRequest};

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{
    connection_exhausted_error, disconnected_error, missing_credential_error, Error, ErrorKind,
};
use crate::task::Worker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionHealth {
    Offline,
    Connecting {
        attempt: u32,
    },
    Connected,
    Reconnecting {
        attempt: u32,
        retry_at: DateTime<Utc>,
        reason: Option<ErrorKind>,
    },
    /// The reconnect budget is spent; only an explicit `connect` revives it.
    Exhausted,
}

impl ConnectionHealth {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Reconnecting { .. } | Self::Exhausted)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConnectionConfig {
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_interval: Duration::from_secs(3),
        }
    }
}

struct Shared {
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn Credentials>,
    config: ConnectionConfig,
    events: async_channel::Sender<InboundEvent>,
    health: watch::Sender<ConnectionHealth>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

enum Closed {
    Deliberately,
    Abnormally(Option<ErrorKind>),
}

/// At most one connection task exists at a time. `connect` replaces it and
/// `disconnect` stops it without scheduling a reconnect.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn Credentials>,
        config: ConnectionConfig,
        events: async_channel::Sender<InboundEvent>,
    ) -> Self {
        let (health, _) = watch::channel(ConnectionHealth::Offline);

        Self {
            shared: Arc::new(Shared {
                connector,
                credentials,
                config,
                events,
                health,
                outbound: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn health(&self) -> ConnectionHealth {
        *self.shared.health.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionHealth> {
        self.shared.health.subscribe()
    }

    #[tracing::instrument(skip(self))]
    pub async fn connect(&self) {
        let mut worker = self.worker.lock().await;

        if let Some(previous) = worker.take() {
            previous.stop().await;
        }

        self.shared
            .health
            .send_replace(ConnectionHealth::Connecting { attempt: 0 });

        let shared = self.shared.clone();
        *worker = Some(Worker::spawn("dispatch-connection", move |cancel| {
            run(shared, cancel)
        }));
    }

    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self) {
        if let Some(previous) = self.worker.lock().await.take() {
            previous.stop().await;
        }

        *self.shared.outbound.lock().await = None;
        self.shared.health.send_replace(ConnectionHealth::Offline);

        tracing::info!("dispatch channel closed");
    }

    /// Best-effort push; nothing is queued for a later connection.
    pub async fn send(&self, event: &OutboundEvent) -> Result<(), Error> {
        let text = serde_json::to_string(event)?;

        let delivered = match self.shared.outbound.lock().await.as_ref() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        };

        if delivered {
            return Ok(());
        }

        tracing::warn!(?event, "dispatch channel not connected, dropping outbound event");

        match self.health() {
            ConnectionHealth::Exhausted => Err(connection_exhausted_error()),
            _ => Err(disconnected_error()),
        }
    }
}

async fn run(shared: Arc<Shared>, cancel: CancellationToken) {
    let config = shared.config;
    let mut attempt: u32 = 0;

    loop {
        shared
            .health
            .send_replace(ConnectionHealth::Connecting { attempt });

        let opened = match shared.credentials.token() {
            Some(token) => tokio::select! {
                _ = cancel.cancelled() => return,
                opened = shared.connector.open(&token) => opened,
            },
            None => Err(missing_credential_error()),
        };

        let reason = match opened {
            Ok(link) => {
                tracing::info!(attempt, "dispatch channel open");
                attempt = 0;

                match pump(&shared, link, &cancel).await {
                    Closed::Deliberately => return,
                    Closed::Abnormally(reason) => reason,
                }
            }
            Err(err) => {
                tracing::warn!(attempt, "failed to open dispatch channel: {}", err);
                Some(err.kind())
            }
        };

        if attempt >= config.max_attempts {
            tracing::error!(attempt, "dispatch reconnect budget spent, giving up");
            shared.health.send_replace(ConnectionHealth::Exhausted);
            return;
        }

        attempt += 1;

        let retry_at = Utc::now()
            + chrono::Duration::from_std(config.retry_interval)
                .unwrap_or_else(|_| chrono::Duration::zero());

        tracing::warn!(attempt, max_attempts = config.max_attempts, "scheduling dispatch reconnect");

        shared.health.send_replace(ConnectionHealth::Reconnecting {
            attempt,
            retry_at,
            reason,
        });

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.retry_interval) => {}
        }
    }
}

async fn pump(shared: &Shared, link: Link, cancel: &CancellationToken) -> Closed {
    let Link {
        mut incoming,
        mut outgoing,
    } = link;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    *shared.outbound.lock().await = Some(tx);
    shared.health.send_replace(ConnectionHealth::Connected);

    let closed = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(err) = outgoing.close().await {
                    tracing::debug!("error while closing dispatch channel: {}", err);
                }
                break Closed::Deliberately;
            }
            message = incoming.next() => match message {
                Some(Ok(text)) => {
                    if shared.events.send(InboundEvent::decode(&text)).await.is_err() {
                        tracing::warn!("event consumer is gone, closing dispatch channel");
                        break Closed::Deliberately;
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!("dispatch channel failed: {}", err);
                    break Closed::Abnormally(Some(err.kind()));
                }
                None => {
                    tracing::warn!("dispatch channel closed by server");
                    break Closed::Abnormally(None);
                }
            },
            Some(text) = rx.recv() => {
                if let Err(err) = outgoing.send(text).await {
                    tracing::warn!("failed to deliver outbound event: {}", err);
                }
            }
        }
    };

    *shared.outbound.lock().await = None;

    closed
}
