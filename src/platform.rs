use serde::{Deserialize, Serialize};

/// Platform class a session runs on, derived once from environment signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Desktop,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Desktop => "desktop",
        }
    }
}

/// Snapshot of the environment signals the detector reads. Captured once per
/// session; classification never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub user_agent: String,
    /// Hardware platform string as reported by the runtime (e.g. "MacIntel").
    pub hardware_platform: String,
    pub max_touch_points: u32,
    /// Display-mode media query reports standalone.
    pub standalone_display_mode: bool,
    /// Legacy standalone flag (pre-media-query iOS signal).
    pub navigator_standalone: bool,
    pub has_worker_registration: bool,
    pub has_push_manager: bool,
    pub has_notifications: bool,
}

pub fn detect_platform(env: &Environment) -> Platform {
    let ua = env.user_agent.to_ascii_lowercase();
    if ua.contains("ipad") || ua.contains("iphone") || ua.contains("ipod") {
        return Platform::Ios;
    }
    // iPadOS reports Mac hardware but exposes a touch screen.
    if env.hardware_platform == "MacIntel" && env.max_touch_points > 1 {
        return Platform::Ios;
    }
    if ua.contains("android") {
        return Platform::Android;
    }
    Platform::Desktop
}

pub fn is_pwa_installed(env: &Environment) -> bool {
    env.standalone_display_mode || env.navigator_standalone
}

pub fn is_push_supported(env: &Environment) -> bool {
    env.has_worker_registration && env.has_push_manager && env.has_notifications
}

/// iOS only delivers push to installed apps; every other platform is fine
/// in a plain browser tab.
pub fn requires_pwa_for_push(env: &Environment) -> bool {
    detect_platform(env) == Platform::Ios && !is_pwa_installed(env)
}
