//! Screen controllers.
//!
//! Each screen owns a [`ScreenController`] holding its transient state
//! (loading flag, last error, screen-specific view state). Controllers call
//! the dispatcher and read everything else from the store.

use crate::actions::Action;
use crate::dispatcher::Dispatcher;
use crate::errors::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::models::{DocumentStatus, Profile, Transaction};
use crate::notifications::{
    token_fingerprint, Handlers, NotificationBridge, Permissions, PushProvider, Subscription,
};
use crate::storage::{SecureStorage, DEVICE_TOKEN_KEY, FCM_TOKEN_KEY};
use crate::store::{select_completed_transactions, select_profile, Store};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Booking status shown on the completed-rides screen.
pub const COMPLETED_BOOKING_STATUS: &str = "Delivered";

/// Where the app goes once bootstrap finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Customer must upload KYC documents first.
    KycGate,
    Home,
}

/// Route for a freshly loaded profile.
pub fn initial_route(profile: &Profile) -> Route {
    if profile.requires_kyc() {
        Route::KycGate
    } else {
        Route::Home
    }
}

/// Status of the document shown in row `index` of the documents screen.
///
/// Rows map to server document ids starting at 1.
pub fn document_status(profile: Option<&Profile>, index: usize) -> DocumentStatus {
    let Some(doc_id) = i64::try_from(index).ok().and_then(|i| i.checked_add(1)) else {
        return DocumentStatus::NotUploaded;
    };
    profile
        .and_then(|p| p.document_by_doc_id(doc_id))
        .map(|d| d.status)
        .unwrap_or(DocumentStatus::NotUploaded)
}

/// Transient state shared by every screen.
#[derive(Default)]
pub struct ScreenController<V> {
    loading: bool,
    error: Option<String>,
    pub view: V,
    store: Option<Store>,
}

impl<V: Default> ScreenController<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that flags the store on rejected sessions.
    pub fn with_store(store: Store) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }
}

impl<V> ScreenController<V> {
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message for the dismissible alert, if the last call failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Runs one dispatcher call with loading/error bookkeeping.
    ///
    /// Loading is cleared on both paths. A failure is stored for display and
    /// reported as `None`; it never propagates further.
    pub async fn run<T, F>(&mut self, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        self.loading = true;
        self.error = None;
        let result = call.await;
        self.loading = false;

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Screen call failed ({} error): {}", err.kind(), err.message());
                if err.is_unauthorized() {
                    if let Some(ref store) = self.store {
                        store.dispatch(Action::AuthError(true));
                    }
                }
                self.error = Some(err.message().to_string());
                None
            }
        }
    }
}

// ============ Splash ============

#[derive(Debug, Default)]
pub struct SplashView {
    pub route: Option<Route>,
}

/// Bootstraps a session: push registration, tokens, permissions, profile.
pub struct SplashController<P> {
    dispatcher: Dispatcher,
    bridge: Arc<NotificationBridge<P>>,
    storage: Arc<dyn SecureStorage>,
    pub screen: ScreenController<SplashView>,
    subscription: Option<Subscription>,
}

impl<P: PushProvider> SplashController<P> {
    pub fn new(
        dispatcher: Dispatcher,
        bridge: Arc<NotificationBridge<P>>,
        storage: Arc<dyn SecureStorage>,
    ) -> Self {
        let screen = ScreenController::with_store(dispatcher.store().clone());
        Self {
            dispatcher,
            bridge,
            storage,
            screen,
            subscription: None,
        }
    }

    /// Runs the startup sequence and returns the initial route.
    ///
    /// Push failures are logged and skipped; only the profile fetch decides
    /// the outcome. `None` means no profile is available and `screen.error()`
    /// says why.
    pub async fn bootstrap(&mut self) -> Option<Route> {
        if self.subscription.is_none() {
            let runtime = Handle::try_current().ok();
            self.subscription = Some(self.bridge.subscribe(self.handlers(runtime)));
        }

        match self.bridge.fcm_token().await {
            Ok(Some(token)) => {
                tracing::info!("FCM token {} obtained", token_fingerprint(&token));
                if let Err(e) = self.storage.set(FCM_TOKEN_KEY, &token) {
                    tracing::error!("Failed to persist FCM token: {}", e);
                }
            }
            Ok(None) => tracing::info!("No FCM token available"),
            Err(e) => tracing::warn!("Failed to get FCM token: {}", e),
        }

        match self.bridge.check_permissions().await {
            Ok(granted) if granted.any() => {}
            Ok(_) => match self.bridge.request_permissions(Permissions::all()).await {
                Ok(granted) => tracing::info!("Push permissions after request: {:?}", granted),
                Err(e) => tracing::warn!("Push permission request failed: {}", e),
            },
            Err(e) => tracing::warn!("Push permission check failed: {}", e),
        }

        self.screen.run(self.dispatcher.fetch_profile()).await?;

        let route = self
            .dispatcher
            .store()
            .select(|s| select_profile(s).map(initial_route));
        if route.is_none() {
            tracing::warn!("Bootstrap finished without a profile");
            self.screen.error = Some(GENERIC_ERROR_MESSAGE.to_string());
        }
        self.screen.view.route = route;
        route
    }

    /// Releases the notification subscription.
    pub fn teardown(&mut self) {
        self.subscription = None;
    }

    /// Push callbacks may arrive on provider threads, so refreshes are
    /// spawned on the runtime that ran `bootstrap`.
    fn handlers(&self, runtime: Option<Handle>) -> Handlers {
        let storage = self.storage.clone();
        let dispatcher = self.dispatcher.clone();
        Handlers::new(
            move |token| {
                if let Err(e) = storage.set(DEVICE_TOKEN_KEY, &token.token) {
                    tracing::error!("Failed to persist device token: {}", e);
                }
            },
            move |_notification| match runtime {
                Some(ref runtime) => refresh_profile(&dispatcher, runtime),
                None => tracing::warn!("No async runtime; skipping profile refresh"),
            },
        )
    }
}

/// Re-fetches the profile in the background, through the normal dispatch path.
pub fn refresh_profile(dispatcher: &Dispatcher, runtime: &Handle) {
    let dispatcher = dispatcher.clone();
    runtime.spawn(async move {
        if let Err(e) = dispatcher.fetch_profile().await {
            tracing::warn!("Profile refresh after notification failed: {}", e);
        }
    });
}

// ============ Profile / documents ============

#[derive(Debug, Default)]
pub struct DocumentsView {
    /// Row whose upload modal is open.
    pub upload_modal: Option<usize>,
}

pub struct ProfileController {
    dispatcher: Dispatcher,
    pub screen: ScreenController<DocumentsView>,
}

impl ProfileController {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let screen = ScreenController::with_store(dispatcher.store().clone());
        Self { dispatcher, screen }
    }

    pub async fn on_focus(&mut self) {
        self.screen.run(self.dispatcher.fetch_profile()).await;
    }

    pub fn profile(&self) -> Option<Profile> {
        self.dispatcher.store().select(|s| select_profile(s).cloned())
    }

    pub fn document_status(&self, index: usize) -> DocumentStatus {
        self.dispatcher
            .store()
            .select(|s| document_status(select_profile(s), index))
    }

    pub fn open_upload(&mut self, index: usize) {
        self.screen.view.upload_modal = Some(index);
    }

    pub fn close_upload(&mut self) {
        self.screen.view.upload_modal = None;
    }

    pub fn rename(&self, name: impl Into<String>) {
        self.dispatcher.update_profile_name(name);
    }

    /// Clears all session data held in the store.
    pub fn sign_out(&self) {
        self.dispatcher.remove_profile();
        self.dispatcher.remove_completed_transactions();
        self.dispatcher.set_auth_error(false);
    }
}

// ============ Completed rides ============

pub struct CompletedRidesController {
    dispatcher: Dispatcher,
    pub screen: ScreenController<()>,
}

impl CompletedRidesController {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let screen = ScreenController::with_store(dispatcher.store().clone());
        Self { dispatcher, screen }
    }

    pub async fn load(&mut self) {
        self.screen
            .run(
                self.dispatcher
                    .fetch_completed_transactions(COMPLETED_BOOKING_STATUS),
            )
            .await;
    }

    pub fn rides(&self) -> Vec<Transaction> {
        self.dispatcher
            .store()
            .select(|s| select_completed_transactions(s).to_vec())
    }
}
