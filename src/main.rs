use std::sync::Arc;

use caballus_driver::config::Config;
use caballus_driver::dispatch::{EnvCredentials, WsConnector};
use caballus_driver::engine::{Engine, LogNotifier, Services};
use caballus_driver::error::Error;
use caballus_driver::external::rest::RestClient;
use caballus_driver::geolocation;
use caballus_driver::server::serve;

const HOME_SPREAD_METRES: f64 = 25.0;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        tracing::error!("driver client exited: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let credentials = Arc::new(EnvCredentials::new(config.token_var.clone()));
    let api = Arc::new(RestClient::new(config.api_base.clone(), credentials.clone()));

    let geolocation = match config.home {
        Some(home) => geolocation::jitter(home, HOME_SPREAD_METRES)?,
        None => {
            tracing::warn!("no home position configured, device location unavailable");
            geolocation::unavailable()
        }
    };

    let services = Services {
        api,
        connector: Arc::new(WsConnector::new(config.dispatch_base.clone())),
        credentials,
        geolocation,
        notifier: Arc::new(LogNotifier),
    };

    let engine = Engine::new(services, config.settings);

    if let Err(err) = engine.start().await {
        tracing::warn!("could not load driver profile: {}", err);
    }

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {}", err);
        }
    };

    let served = serve(engine.clone(), config.listen_addr, shutdown).await;

    engine.shutdown().await;

    served
}
