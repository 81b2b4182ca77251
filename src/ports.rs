pub mod backend;
pub mod clients;
pub mod notify;
pub mod push;
pub mod time;

pub use backend::NotificationBackend;
pub use clients::{ClientWindow, ClientWindows};
pub use notify::{Notification, NotificationDisplay};
pub use push::{PermissionStatus, PlatformSubscribeError, PushService};
pub use time::TimeProvider;
