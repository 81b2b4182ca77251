use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::PushConfig;
use crate::keys::url_base64_to_bytes;
use crate::platform::{Environment, Platform, detect_platform, is_push_supported};
use crate::ports::backend::NotificationBackend;
use crate::ports::push::{PermissionStatus, PlatformSubscribeError, PushService};
use crate::ports::time::TimeProvider;
use crate::types::push::{NotificationPreferences, PushSubscription, ServerSubscription};
use crate::worker::lifecycle::{WorkerError, WorkerLifecycle};
use crate::worker::runtime::{WorkerHost, WorkerScript};

/// Failure of a subscription operation. The `Display` text is the short,
/// user-facing message callers render directly; the variants keep the
/// underlying classification.
#[derive(Debug, PartialEq, Eq)]
pub enum SubscriptionError {
    Unsupported,
    PermissionDenied,
    Worker(WorkerError),
    Platform(PlatformSubscribeError),
    UnsubscribeFailed(String),
    BackendSync(String),
    NoActiveSubscription,
}

impl SubscriptionError {
    /// Underlying detail for diagnostics, not part of the user-facing text.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::UnsubscribeFailed(detail) | Self::BackendSync(detail) => Some(detail),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => {
                f.write_str("push notifications are not supported on this device")
            }
            Self::PermissionDenied => f.write_str(
                "notification permission was declined, enable it in your browser settings",
            ),
            Self::Worker(err) => write!(f, "{err}"),
            Self::Platform(PlatformSubscribeError::PermissionRevoked) => f.write_str(
                "notification permission was revoked, enable it in your browser settings",
            ),
            Self::Platform(PlatformSubscribeError::RejectedWhileGranted) => {
                f.write_str("the browser rejected the subscription, reload and try again")
            }
            Self::Platform(PlatformSubscribeError::Aborted(_)) => {
                f.write_str("subscribing failed, reload and try again")
            }
            Self::UnsubscribeFailed(_) => {
                f.write_str("could not remove the subscription, reload and try again")
            }
            Self::BackendSync(_) => {
                f.write_str("could not reach the notification service, try again later")
            }
            Self::NoActiveSubscription => f.write_str("no active subscription on this device"),
        }
    }
}

/// Orchestrates the end-to-end subscribe, unsubscribe and preference flows
/// against the platform push service, the worker lifecycle and the backend.
///
/// Operations are sequential within one call; overlapping calls are not
/// serialized here, callers disable their trigger while one is in flight.
pub struct SubscriptionController<P, B, T, S, F> {
    environment: Environment,
    config: PushConfig,
    push: P,
    backend: B,
    lifecycle: WorkerLifecycle<T>,
    host: Arc<WorkerHost<S, F>>,
    // Deployment constant, fetched at most once per controller lifetime and
    // never invalidated; key rotation requires a fresh controller.
    vapid_key: OnceCell<Vec<u8>>,
}

impl<P, B, T, S, F> SubscriptionController<P, B, T, S, F>
where
    P: PushService,
    B: NotificationBackend,
    T: TimeProvider,
    S: WorkerScript,
    F: Fn() -> Result<S, String> + Send + Sync + 'static,
{
    pub fn new(
        environment: Environment,
        config: PushConfig,
        push: P,
        backend: B,
        time: T,
        host: Arc<WorkerHost<S, F>>,
    ) -> Self {
        let lifecycle = WorkerLifecycle::new(time, config.activation_timeout);
        Self {
            environment,
            config,
            push,
            backend,
            lifecycle,
            host,
            vapid_key: OnceCell::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        detect_platform(&self.environment)
    }

    async fn cached_vapid_key(&self) -> Result<&Vec<u8>, SubscriptionError> {
        self.vapid_key
            .get_or_try_init(|| async {
                let raw = self
                    .backend
                    .vapid_public_key()
                    .await
                    .map_err(|err| SubscriptionError::BackendSync(err.to_string()))?;
                url_base64_to_bytes(&raw).map_err(|err| {
                    SubscriptionError::BackendSync(format!("invalid VAPID public key: {err}"))
                })
            })
            .await
    }

    /// Subscribes this installation: permission, worker readiness, platform
    /// subscribe, then the server mirror. Each step is an early exit; a
    /// failure after the platform subscribe leaves a dangling platform
    /// subscription, tolerated by design (the server upserts by endpoint, so
    /// retrying is safe).
    pub async fn subscribe(
        &self,
        preferences: &NotificationPreferences,
        restaurant_id: Option<i64>,
    ) -> Result<(), SubscriptionError> {
        if !is_push_supported(&self.environment) {
            return Err(SubscriptionError::Unsupported);
        }

        match self.push.request_permission().await {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied | PermissionStatus::Prompt => {
                return Err(SubscriptionError::PermissionDenied);
            }
        }

        let key = self.cached_vapid_key().await?;

        let registration = self
            .lifecycle
            .ready_registration(&self.host)
            .await
            .map_err(SubscriptionError::Worker)?;

        let subscription = self
            .push
            .subscribe(&registration, key)
            .await
            .map_err(SubscriptionError::Platform)?;

        let restaurant_id = restaurant_id.or(self.config.restaurant_id);
        self.backend
            .create_subscription(&subscription, preferences, self.platform(), restaurant_id)
            .await
            .map_err(|err| {
                eprintln!(
                    "push sync error: platform subscription created but not mirrored ({err})"
                );
                SubscriptionError::BackendSync(err.to_string())
            })?;
        Ok(())
    }

    /// Unsubscribes this installation. With no platform subscription this is
    /// an idempotent no-op. The server mirror is deleted first, while the
    /// endpoint is still known; nothing is rolled back on partial failure.
    pub async fn unsubscribe(&self) -> Result<(), SubscriptionError> {
        let Some(subscription) = self.push.current_subscription().await else {
            return Ok(());
        };

        let mirror_failure = match self.backend.delete_subscription(&subscription.endpoint).await
        {
            Ok(()) => None,
            Err(err) => {
                eprintln!("push sync warning: server mirror not deleted ({err})");
                Some(err.to_string())
            }
        };

        self.push
            .unsubscribe()
            .await
            .map_err(|err| SubscriptionError::UnsubscribeFailed(err.to_string()))?;

        match mirror_failure {
            Some(message) => Err(SubscriptionError::BackendSync(message)),
            None => Ok(()),
        }
    }

    /// Updates preferences of the existing subscription's server mirror.
    pub async fn update_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<(), SubscriptionError> {
        let Some(subscription) = self.push.current_subscription().await else {
            return Err(SubscriptionError::NoActiveSubscription);
        };
        self.backend
            .update_preferences(&subscription.endpoint, preferences)
            .await
            .map_err(|err| SubscriptionError::BackendSync(err.to_string()))
    }

    /// Fetches the server mirror for this installation. Any failure reads as
    /// "no remote state" rather than an error.
    pub async fn server_preferences(&self) -> Option<ServerSubscription> {
        let subscription = self.push.current_subscription().await?;
        match self.backend.fetch_preferences(&subscription.endpoint).await {
            Ok(server) => Some(server),
            Err(err) => {
                eprintln!("push sync warning: could not fetch server preferences ({err})");
                None
            }
        }
    }

    /// Asks the backend to push a test notification to this installation.
    pub async fn send_test_notification(&self) -> Result<(), SubscriptionError> {
        let Some(subscription) = self.push.current_subscription().await else {
            return Err(SubscriptionError::NoActiveSubscription);
        };
        self.backend
            .send_test(&subscription)
            .await
            .map_err(|err| SubscriptionError::BackendSync(err.to_string()))
    }

    /// The active platform subscription, if any. The platform is the source
    /// of truth; this is never cached.
    pub async fn current_subscription(&self) -> Option<PushSubscription> {
        self.push.current_subscription().await
    }
}
