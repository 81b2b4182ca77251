use crate::platform::Platform;
use crate::types::push::{NotificationPreferences, PushSubscription, ServerSubscription};

/// REST boundary to the notification backend. One method per endpoint of the
/// `/public/notifications` surface.
pub trait NotificationBackend: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type KeyFut<'a>: Future<Output = Result<String, Self::Error>> + Send + 'a
    where
        Self: 'a;
    type UnitFut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;
    type PreferencesFut<'a>: Future<Output = Result<ServerSubscription, Self::Error>> + Send + 'a
    where
        Self: 'a;

    /// `GET vapid-public-key`. The key is a deployment constant; callers
    /// cache it for the session.
    fn vapid_public_key<'a>(&'a self) -> Self::KeyFut<'a>;

    /// `POST subscribe`. Upserts by endpoint server-side, so repeating the
    /// call with the same endpoint is safe.
    fn create_subscription<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        preferences: &'a NotificationPreferences,
        platform: Platform,
        restaurant_id: Option<i64>,
    ) -> Self::UnitFut<'a>;

    /// `DELETE unsubscribe`, keyed by endpoint.
    fn delete_subscription<'a>(&'a self, endpoint: &'a str) -> Self::UnitFut<'a>;

    /// `PUT preferences`, keyed by endpoint.
    fn update_preferences<'a>(
        &'a self,
        endpoint: &'a str,
        preferences: &'a NotificationPreferences,
    ) -> Self::UnitFut<'a>;

    /// `GET preferences?endpoint=…`.
    fn fetch_preferences<'a>(&'a self, endpoint: &'a str) -> Self::PreferencesFut<'a>;

    /// `POST test` — asks the backend to push a test notification back to
    /// this subscription.
    fn send_test<'a>(&'a self, subscription: &'a PushSubscription) -> Self::UnitFut<'a>;
}
