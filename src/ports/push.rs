use crate::types::push::PushSubscription;
use crate::worker::runtime::Registration;

/// Outcome of a notification permission request. The platform prompts at
/// most once per origin; a later request only reports the stored decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user dismissed the prompt without deciding.
    Prompt,
}

/// Classified failure of the platform subscribe primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformSubscribeError {
    /// Permission was revoked between the grant and the subscribe call.
    PermissionRevoked,
    /// Permission reads as granted but the platform still rejected the
    /// subscribe. Stale platform state, not a user action.
    RejectedWhileGranted,
    /// Generic abort or invalid-state failure.
    Aborted(String),
}

impl std::fmt::Display for PlatformSubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionRevoked => f.write_str("notification permission was revoked"),
            Self::RejectedWhileGranted => {
                f.write_str("platform rejected the subscription despite granted permission")
            }
            Self::Aborted(reason) => write!(f, "platform subscribe aborted: {reason}"),
        }
    }
}

/// Platform push primitives: the permission prompt and the per-installation
/// subscription owned by the platform push service.
pub trait PushService: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type PermissionFut<'a>: Future<Output = PermissionStatus> + Send + 'a
    where
        Self: 'a;
    type SubscribeFut<'a>: Future<Output = Result<PushSubscription, PlatformSubscribeError>>
        + Send
        + 'a
    where
        Self: 'a;
    type CurrentFut<'a>: Future<Output = Option<PushSubscription>> + Send + 'a
    where
        Self: 'a;
    type UnsubscribeFut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn request_permission<'a>(&'a self) -> Self::PermissionFut<'a>;

    /// Creates the installation's subscription through the given worker
    /// registration, using the decoded VAPID public key.
    fn subscribe<'a>(
        &'a self,
        registration: &'a Registration,
        application_server_key: &'a [u8],
    ) -> Self::SubscribeFut<'a>;

    /// The currently active subscription, if any. The platform is the source
    /// of truth; callers never cache the result.
    fn current_subscription<'a>(&'a self) -> Self::CurrentFut<'a>;

    fn unsubscribe<'a>(&'a self) -> Self::UnsubscribeFut<'a>;
}
