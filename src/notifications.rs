//! Push-notification bridge.
//!
//! Wraps a platform push provider. The provider is handed a [`PushSink`] once,
//! when the bridge is built, and reports registration tokens and received
//! notifications through it. Interested code calls
//! [`NotificationBridge::subscribe`] and keeps the returned [`Subscription`]
//! alive for as long as it wants events; dropping it unsubscribes.
//!
//! There is no queuing or retry: an event that arrives while nobody is
//! subscribed is dropped, and delivery guarantees are the provider's.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Device registration token reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub token: String,
}

/// A push received while the app is foregrounded or backgrounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub message: Option<String>,
    /// Provider payload, passed through untouched.
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            alert: true,
            badge: true,
            sound: true,
        }
    }

    pub fn any(&self) -> bool {
        self.alert || self.badge || self.sound
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// Push is not supported in this environment.
    Unavailable(String),
    /// The provider SDK reported a failure.
    Provider(String),
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Unavailable(msg) => write!(f, "Push unavailable: {}", msg),
            PushError::Provider(msg) => write!(f, "Push provider error: {}", msg),
        }
    }
}

impl std::error::Error for PushError {}

/// Platform push SDK seam.
pub trait PushProvider: Send + Sync {
    /// Called once by [`NotificationBridge::new`].
    fn attach(&self, sink: PushSink);

    /// Current FCM token, if the provider has one.
    fn fcm_token(&self) -> impl Future<Output = Result<Option<String>, PushError>> + Send;

    fn check_permissions(&self) -> impl Future<Output = Result<Permissions, PushError>> + Send;

    fn request_permissions(
        &self,
        wanted: Permissions,
    ) -> impl Future<Output = Result<Permissions, PushError>> + Send;

    fn abandon_permissions(&self) -> impl Future<Output = Result<(), PushError>> + Send;
}

type RegisterFn = dyn Fn(&TokenData) + Send + Sync;
type NotificationFn = dyn Fn(&Notification) + Send + Sync;

/// Callbacks for one subscriber.
#[derive(Clone)]
pub struct Handlers {
    on_register: Arc<RegisterFn>,
    on_notification: Arc<NotificationFn>,
}

impl Handlers {
    pub fn new(
        on_register: impl Fn(&TokenData) + Send + Sync + 'static,
        on_notification: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_register: Arc::new(on_register),
            on_notification: Arc::new(on_notification),
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Handlers)>>,
}

impl Registry {
    fn snapshot(&self) -> Vec<Handlers> {
        // Handlers run outside the lock so they may subscribe or unsubscribe
        match self.subscribers.lock() {
            Ok(subscribers) => subscribers.iter().map(|(_, h)| h.clone()).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|(_, h)| h.clone())
                .collect(),
        }
    }

    fn insert(&self, handlers: Handlers) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.push((id, handlers));
        id
    }

    fn remove(&self, id: u64) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|(sid, _)| *sid != id);
    }

    fn len(&self) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

/// Entry point the provider uses to report events.
#[derive(Clone)]
pub struct PushSink {
    registry: Arc<Registry>,
}

impl PushSink {
    /// Forwards a registration token to every live subscriber.
    pub fn register(&self, token: TokenData) {
        let handlers = self.registry.snapshot();
        tracing::info!(
            "Push registration token {} delivered to {} subscriber(s)",
            token_fingerprint(&token.token),
            handlers.len()
        );
        for h in handlers {
            (h.on_register)(&token);
        }
    }

    /// Forwards a received notification to every live subscriber.
    pub fn notify(&self, notification: Notification) {
        let handlers = self.registry.snapshot();
        if handlers.is_empty() {
            tracing::debug!("Notification dropped: no subscribers");
            return;
        }
        tracing::info!("Notification received: {:?}", notification.message);
        for h in handlers {
            (h.on_notification)(&notification);
        }
    }
}

/// Live subscription; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::debug!("Notification subscription {} released", self.id);
        }
    }
}

pub struct NotificationBridge<P> {
    provider: P,
    sink: PushSink,
}

impl<P: PushProvider> NotificationBridge<P> {
    /// Wraps `provider` and attaches the event sink to it.
    pub fn new(provider: P) -> Self {
        let sink = PushSink {
            registry: Arc::new(Registry::default()),
        };
        provider.attach(sink.clone());
        Self { provider, sink }
    }

    pub fn subscribe(&self, handlers: Handlers) -> Subscription {
        let id = self.sink.registry.insert(handlers);
        tracing::debug!("Notification subscription {} registered", id);
        Subscription {
            id,
            registry: Arc::downgrade(&self.sink.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sink.registry.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn fcm_token(&self) -> Result<Option<String>, PushError> {
        self.provider.fcm_token().await
    }

    pub async fn check_permissions(&self) -> Result<Permissions, PushError> {
        self.provider.check_permissions().await
    }

    pub async fn request_permissions(&self, wanted: Permissions) -> Result<Permissions, PushError> {
        self.provider.request_permissions(wanted).await
    }

    pub async fn abandon_permissions(&self) -> Result<(), PushError> {
        self.provider.abandon_permissions().await
    }
}

/// Provider for environments without push support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPushProvider;

impl PushProvider for NullPushProvider {
    fn attach(&self, _sink: PushSink) {}

    async fn fcm_token(&self) -> Result<Option<String>, PushError> {
        Ok(None)
    }

    async fn check_permissions(&self) -> Result<Permissions, PushError> {
        Ok(Permissions::default())
    }

    async fn request_permissions(&self, _wanted: Permissions) -> Result<Permissions, PushError> {
        Ok(Permissions::default())
    }

    async fn abandon_permissions(&self) -> Result<(), PushError> {
        Ok(())
    }
}

/// Short, stable identifier for a token, safe to log.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CapturingProvider {
        sink: Mutex<Option<PushSink>>,
    }

    impl CapturingProvider {
        fn sink(&self) -> PushSink {
            self.sink.lock().unwrap().clone().unwrap()
        }
    }

    impl PushProvider for CapturingProvider {
        fn attach(&self, sink: PushSink) {
            *self.sink.lock().unwrap() = Some(sink);
        }

        async fn fcm_token(&self) -> Result<Option<String>, PushError> {
            Ok(Some("fcm".to_string()))
        }

        async fn check_permissions(&self) -> Result<Permissions, PushError> {
            Ok(Permissions::all())
        }

        async fn request_permissions(&self, wanted: Permissions) -> Result<Permissions, PushError> {
            Ok(wanted)
        }

        async fn abandon_permissions(&self) -> Result<(), PushError> {
            Err(PushError::Provider("not supported".to_string()))
        }
    }

    fn counting_handlers(registered: Arc<AtomicUsize>, received: Arc<AtomicUsize>) -> Handlers {
        Handlers::new(
            move |_| {
                registered.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                received.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn test_events_fan_out_to_subscribers() {
        let bridge = NotificationBridge::new(CapturingProvider::default());
        let registered = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(AtomicUsize::new(0));

        let _a = bridge.subscribe(counting_handlers(registered.clone(), received.clone()));
        let _b = bridge.subscribe(counting_handlers(registered.clone(), received.clone()));

        let sink = bridge.provider().sink();
        sink.register(TokenData {
            token: "device-1".to_string(),
        });
        sink.notify(Notification {
            message: Some("Driver arrived".to_string()),
            ..Default::default()
        });

        assert_eq!(registered.load(Ordering::SeqCst), 2);
        assert_eq!(received.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bridge = NotificationBridge::new(CapturingProvider::default());
        let received = Arc::new(AtomicUsize::new(0));

        let subscription =
            bridge.subscribe(counting_handlers(Arc::new(AtomicUsize::new(0)), received.clone()));
        assert_eq!(bridge.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(bridge.subscriber_count(), 0);

        bridge.provider().sink().notify(Notification::default());
        assert_eq!(received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_outliving_bridge_is_harmless() {
        let bridge = NotificationBridge::new(CapturingProvider::default());
        let subscription = bridge.subscribe(Handlers::new(|_| {}, |_| {}));
        drop(bridge);
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_permission_calls_pass_through() {
        let bridge = NotificationBridge::new(CapturingProvider::default());
        assert_eq!(bridge.check_permissions().await.unwrap(), Permissions::all());
        let wanted = Permissions {
            alert: true,
            ..Default::default()
        };
        assert_eq!(bridge.request_permissions(wanted).await.unwrap(), wanted);
        assert!(bridge.abandon_permissions().await.is_err());
        assert_eq!(bridge.fcm_token().await.unwrap().as_deref(), Some("fcm"));
    }

    #[tokio::test]
    async fn test_null_provider() {
        let bridge = NotificationBridge::new(NullPushProvider);
        assert_eq!(bridge.fcm_token().await.unwrap(), None);
        assert!(!bridge.request_permissions(Permissions::all()).await.unwrap().any());
    }

    #[test]
    fn test_token_fingerprint_is_stable_and_short() {
        let a = token_fingerprint("secret-token");
        assert_eq!(a, token_fingerprint("secret-token"));
        assert_eq!(a.len(), 12);
        assert!(!a.contains("secret"));
    }
}
