use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Per-subscriber notification preferences. Round-trips to and from the
/// backend unchanged; times are `HH:MM` strings and stay opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub notify_today_menu: bool,
    pub notify_today_menu_time: String,
    pub notify_tomorrow_menu: bool,
    pub notify_tomorrow_menu_time: String,
    pub notify_events: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            notify_today_menu: true,
            notify_today_menu_time: "11:00".to_string(),
            notify_tomorrow_menu: false,
            notify_tomorrow_menu_time: "19:00".to_string(),
            notify_events: true,
        }
    }
}

/// Encryption key bundle issued by the platform push service alongside the
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A platform-issued push subscription. The endpoint is the sole correlation
/// key with the server-side mirror; the application never stores this locally
/// and always re-fetches it from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Server-side mirror of a subscription, as returned by the backend. The
/// backend serializes it flat: identity fields next to the preference fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSubscription {
    pub id: i64,
    pub restaurant_id: i64,
    #[serde(flatten)]
    pub preferences: NotificationPreferences,
    pub platform: Option<String>,
    pub created_at: Option<String>,
}

/// Wire body for `POST subscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub preferences: NotificationPreferences,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
}

/// Wire body for `DELETE unsubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// Wire body for `PUT preferences`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub endpoint: String,
    pub preferences: NotificationPreferences,
}

/// Wire body for `POST test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPushRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub subscription: ServerSubscription,
}

/// Push message payload as sent by the backend. Every field is optional;
/// absent fields fall back to `DeliveryConfig` defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub url: Option<String>,
}
