use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A background task paired with the token that stops it.
pub struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = f(cancel.clone());

        tracing::debug!(name, "spawning worker");

        Self {
            cancel,
            handle: tokio::spawn(task),
        }
    }

    pub async fn stop(self) {
        self.cancel.cancel();

        if let Err(err) = self.handle.await {
            if err.is_panic() {
                tracing::error!("worker panicked: {}", err);
            }
        }
    }
}
