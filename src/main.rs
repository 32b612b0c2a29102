use rider_client::api_client::ApiClient;
use rider_client::config::Config;
use rider_client::controller::{CompletedRidesController, Route, SplashController};
use rider_client::dispatcher::Dispatcher;
use rider_client::notifications::{NotificationBridge, NullPushProvider};
use rider_client::storage::MemoryStorage;
use rider_client::store::Store;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point.
///
/// Runs the same sequence the app runs on its splash screen (push setup,
/// profile fetch, KYC routing), then loads completed rides and logs a
/// summary. Useful for checking a backend and token from the command line.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rider_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let client = ApiClient::new(&config)?;
    tracing::info!("✓ API client initialized: {}", client.base_url());

    let store = Store::new();
    let dispatcher = Dispatcher::new(client, store.clone());
    let bridge = Arc::new(NotificationBridge::new(NullPushProvider));
    let storage = Arc::new(MemoryStorage::new());

    let mut splash = SplashController::new(dispatcher.clone(), bridge, storage);
    let route = match splash.bootstrap().await {
        Some(route) => route,
        None => {
            let reason = splash.screen.error().unwrap_or("profile unavailable");
            anyhow::bail!("Bootstrap failed: {}", reason);
        }
    };

    if let Some(profile) = store.state().profile {
        tracing::info!(
            "Signed in as {} (#{}), documents: {}",
            profile.full_name(),
            profile.customer_detail_id,
            profile.document_verified.code()
        );
    }

    match route {
        Route::KycGate => {
            tracing::info!("KYC documents required before reaching home");
        }
        Route::Home => {
            let mut rides = CompletedRidesController::new(dispatcher);
            rides.load().await;
            if let Some(err) = rides.screen.error() {
                tracing::error!("Failed to load completed rides: {}", err);
            }
            for ride in rides.rides() {
                tracing::info!(
                    "#{} {} {} -> {} ({:.2})",
                    ride.booking_detail_id,
                    ride.booking_status,
                    ride.from_details.address,
                    ride.to_details.address,
                    ride.total_amount
                );
            }
        }
    }

    splash.teardown();
    Ok(())
}
