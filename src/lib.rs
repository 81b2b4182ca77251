pub mod adapters;
pub mod config;
pub mod controller;
pub mod delivery;
pub mod keys;
pub mod platform;
pub mod ports;
pub mod types;
pub mod worker;

pub use config::{DeliveryConfig, PushConfig};
pub use controller::{SubscriptionController, SubscriptionError};
pub use delivery::PushWorker;
pub use platform::{
    Environment, Platform, detect_platform, is_pwa_installed, is_push_supported,
    requires_pwa_for_push,
};
pub use types::push::{NotificationPreferences, PushSubscription, ServerSubscription};
