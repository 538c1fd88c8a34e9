use async_trait::async_trait;
use futures::future;
use futures::sink::{Sink, SinkExt};
use futures::stream::{BoxStream, StreamExt};
use std::env;
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Error;

pub type Incoming = BoxStream<'static, Result<String, Error>>;
pub type Outgoing = Pin<Box<dyn Sink<String, Error = Error> + Send>>;

pub struct Link {
    pub incoming: Incoming,
    pub outgoing: Outgoing,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, token: &str) -> Result<Link, Error>;
}

/// Resolves the bearer token. Consulted again on every connection attempt.
pub trait Credentials: Send + Sync {
    fn token(&self) -> Option<String>;
}

pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Credentials for EnvCredentials {
    fn token(&self) -> Option<String> {
        env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

pub struct WsConnector {
    base: String,
}

impl WsConnector {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    #[tracing::instrument(skip_all)]
    async fn open(&self, token: &str) -> Result<Link, Error> {
        let url = format!("{}/ws/{}", self.base, token);

        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = stream.split();

        let incoming = read
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(err) => Some(Err(Error::from(err))),
                }
            })
            .boxed();

        let outgoing = write
            .sink_map_err(Error::from)
            .with(|text: String| future::ready(Ok::<_, Error>(Message::Text(text))));

        Ok(Link {
            incoming,
            outgoing: Box::pin(outgoing),
        })
    }
}
