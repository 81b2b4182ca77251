use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::URL_SAFE_NO_PAD;

use crate::platform::Platform;
use crate::ports;
use crate::ports::push::{PermissionStatus, PlatformSubscribeError};
use crate::types::push::{
    NotificationPreferences, PreferencesResponse, PublicKeyResponse, PushSubscription,
    ServerSubscription, SubscribeRequest, SubscriptionKeys, TestPushRequest,
    UnsubscribeRequest, UpdatePreferencesRequest,
};
use crate::worker::runtime::{Registration, WorkerState};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug)]
pub enum BackendError {
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(err) => write!(f, "backend request failed: {err}"),
            Self::Status(status) => write!(f, "backend returned {status}"),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err)
    }
}

/// REST client for the `/public/notifications` backend surface.
#[derive(Clone)]
pub struct HttpBackend {
    api_base: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(api_base: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            api_base: api_base.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.trim_end_matches('/'))
    }
}

fn checked(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status(status))
    }
}

type BoxedFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

impl ports::NotificationBackend for HttpBackend {
    type Error = BackendError;
    type KeyFut<'a>
        = BoxedFut<'a, String>
    where
        Self: 'a;
    type UnitFut<'a>
        = BoxedFut<'a, ()>
    where
        Self: 'a;
    type PreferencesFut<'a>
        = BoxedFut<'a, ServerSubscription>
    where
        Self: 'a;

    fn vapid_public_key<'a>(&'a self) -> Self::KeyFut<'a> {
        Box::pin(async move {
            let response = checked(self.client.get(self.url("vapid-public-key")).send().await?)?;
            let body: PublicKeyResponse = response.json().await?;
            Ok(body.public_key)
        })
    }

    fn create_subscription<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        preferences: &'a NotificationPreferences,
        platform: Platform,
        restaurant_id: Option<i64>,
    ) -> Self::UnitFut<'a> {
        Box::pin(async move {
            let body = SubscribeRequest {
                endpoint: subscription.endpoint.clone(),
                keys: subscription.keys.clone(),
                preferences: preferences.clone(),
                platform,
                restaurant_id,
            };
            checked(
                self.client
                    .post(self.url("subscribe"))
                    .json(&body)
                    .send()
                    .await?,
            )?;
            Ok(())
        })
    }

    fn delete_subscription<'a>(&'a self, endpoint: &'a str) -> Self::UnitFut<'a> {
        Box::pin(async move {
            let body = UnsubscribeRequest {
                endpoint: endpoint.to_string(),
            };
            checked(
                self.client
                    .delete(self.url("unsubscribe"))
                    .json(&body)
                    .send()
                    .await?,
            )?;
            Ok(())
        })
    }

    fn update_preferences<'a>(
        &'a self,
        endpoint: &'a str,
        preferences: &'a NotificationPreferences,
    ) -> Self::UnitFut<'a> {
        Box::pin(async move {
            let body = UpdatePreferencesRequest {
                endpoint: endpoint.to_string(),
                preferences: preferences.clone(),
            };
            checked(
                self.client
                    .put(self.url("preferences"))
                    .json(&body)
                    .send()
                    .await?,
            )?;
            Ok(())
        })
    }

    fn fetch_preferences<'a>(&'a self, endpoint: &'a str) -> Self::PreferencesFut<'a> {
        Box::pin(async move {
            let response = checked(
                self.client
                    .get(self.url("preferences"))
                    .query(&[("endpoint", endpoint)])
                    .send()
                    .await?,
            )?;
            let body: PreferencesResponse = response.json().await?;
            Ok(body.subscription)
        })
    }

    fn send_test<'a>(&'a self, subscription: &'a PushSubscription) -> Self::UnitFut<'a> {
        Box::pin(async move {
            let body = TestPushRequest {
                endpoint: subscription.endpoint.clone(),
                keys: subscription.keys.clone(),
            };
            checked(self.client.post(self.url("test")).json(&body).send().await?)?;
            Ok(())
        })
    }
}

/// Uncompressed P-256 point length the platform expects for the application
/// server key.
const SERVER_KEY_LEN: usize = 65;

struct PushServiceState {
    permission: PermissionStatus,
    prompt_decision: PermissionStatus,
    subscription: Option<PushSubscription>,
    next_endpoint: Option<String>,
    subscribe_rejection: Option<PlatformSubscribeError>,
    fail_unsubscribe: bool,
    permission_requests: usize,
}

/// Simulated platform push service. The real primitive lives inside a
/// browser; this stand-in observes the same contract for tests and local
/// harnesses: permission prompt at most once, one subscription per
/// installation, endpoint as the only identity.
#[derive(Clone)]
pub struct InMemoryPushService {
    inner: Arc<Mutex<PushServiceState>>,
}

impl InMemoryPushService {
    fn with_decision(decision: PermissionStatus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PushServiceState {
                permission: PermissionStatus::Prompt,
                prompt_decision: decision,
                subscription: None,
                next_endpoint: None,
                subscribe_rejection: None,
                fail_unsubscribe: false,
                permission_requests: 0,
            })),
        }
    }

    /// A service whose user grants the permission prompt.
    pub fn granting() -> Self {
        Self::with_decision(PermissionStatus::Granted)
    }

    /// A service whose user declines the permission prompt.
    pub fn denying() -> Self {
        Self::with_decision(PermissionStatus::Denied)
    }

    /// Pins the endpoint the next subscribe call will be issued.
    pub fn with_next_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.inner.lock().expect("push service lock").next_endpoint = Some(endpoint.into());
        self
    }

    /// Makes the next subscribe call fail with the given classification.
    pub fn rejecting_subscribe(self, error: PlatformSubscribeError) -> Self {
        self.inner
            .lock()
            .expect("push service lock")
            .subscribe_rejection = Some(error);
        self
    }

    /// Makes platform-side unsubscription fail.
    pub fn failing_unsubscribe(self) -> Self {
        self.inner.lock().expect("push service lock").fail_unsubscribe = true;
        self
    }

    pub fn permission_requests(&self) -> usize {
        self.inner
            .lock()
            .expect("push service lock")
            .permission_requests
    }

    pub fn revoke_permission(&self) {
        self.inner.lock().expect("push service lock").permission = PermissionStatus::Denied;
    }
}

fn random_endpoint() -> String {
    let value: u64 = rand::random();
    format!("https://push.example/{value:016x}")
}

fn random_key(len: usize) -> String {
    let bytes: Vec<u8> = (0..len).map(|_| rand::random()).collect();
    base64::encode_config(bytes, URL_SAFE_NO_PAD)
}

impl ports::PushService for InMemoryPushService {
    type Error = String;
    type PermissionFut<'a>
        = std::future::Ready<PermissionStatus>
    where
        Self: 'a;
    type SubscribeFut<'a>
        = std::future::Ready<Result<PushSubscription, PlatformSubscribeError>>
    where
        Self: 'a;
    type CurrentFut<'a>
        = std::future::Ready<Option<PushSubscription>>
    where
        Self: 'a;
    type UnsubscribeFut<'a>
        = std::future::Ready<Result<(), String>>
    where
        Self: 'a;

    fn request_permission<'a>(&'a self) -> Self::PermissionFut<'a> {
        let mut state = self.inner.lock().expect("push service lock");
        state.permission_requests += 1;
        if state.permission == PermissionStatus::Prompt {
            state.permission = state.prompt_decision;
        }
        std::future::ready(state.permission)
    }

    fn subscribe<'a>(
        &'a self,
        registration: &'a Registration,
        application_server_key: &'a [u8],
    ) -> Self::SubscribeFut<'a> {
        let mut state = self.inner.lock().expect("push service lock");
        let result = if let Some(rejection) = state.subscribe_rejection.take() {
            Err(rejection)
        } else if state.permission != PermissionStatus::Granted {
            Err(PlatformSubscribeError::PermissionRevoked)
        } else if application_server_key.len() != SERVER_KEY_LEN {
            Err(PlatformSubscribeError::Aborted(
                "invalid application server key".to_string(),
            ))
        } else if registration.state() != WorkerState::Activated {
            Err(PlatformSubscribeError::Aborted(
                "worker registration is not active".to_string(),
            ))
        } else {
            let subscription = state.subscription.clone().unwrap_or_else(|| {
                let endpoint = state
                    .next_endpoint
                    .take()
                    .unwrap_or_else(random_endpoint);
                PushSubscription {
                    endpoint,
                    keys: SubscriptionKeys {
                        p256dh: random_key(SERVER_KEY_LEN),
                        auth: random_key(16),
                    },
                }
            });
            state.subscription = Some(subscription.clone());
            Ok(subscription)
        };
        std::future::ready(result)
    }

    fn current_subscription<'a>(&'a self) -> Self::CurrentFut<'a> {
        std::future::ready(
            self.inner
                .lock()
                .expect("push service lock")
                .subscription
                .clone(),
        )
    }

    fn unsubscribe<'a>(&'a self) -> Self::UnsubscribeFut<'a> {
        let mut state = self.inner.lock().expect("push service lock");
        if state.fail_unsubscribe {
            return std::future::ready(Err("platform refused to unsubscribe".to_string()));
        }
        state.subscription = None;
        std::future::ready(Ok(()))
    }
}
