use std::time::Duration;

/// Configuration for the foreground subscription flow.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Base path of the notification backend, e.g. `https://host/public/notifications`.
    pub api_base: String,
    /// Restaurant to attach new subscriptions to. The backend falls back to
    /// its default restaurant when absent.
    pub restaurant_id: Option<i64>,
    /// Scope the worker script is registered at.
    pub worker_scope: String,
    /// Bound on the wait for worker activation.
    pub activation_timeout: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            api_base: "/public/notifications".to_string(),
            restaurant_id: None,
            worker_scope: "/".to_string(),
            activation_timeout: Duration::from_secs(10),
        }
    }
}

/// Defaults applied when a push payload omits fields, plus the origin used
/// to match open clients on notification click.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub origin: String,
    pub default_title: String,
    pub default_tag: String,
    pub default_icon: String,
    pub default_badge: String,
    pub default_url: String,
    pub renotify: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            origin: "/".to_string(),
            default_title: "Mariam".to_string(),
            default_tag: "mariam-notification".to_string(),
            default_icon: "/web-app-manifest-192x192.png".to_string(),
            default_badge: "/favicon-96x96.png".to_string(),
            default_url: "/menu".to_string(),
            renotify: false,
        }
    }
}
