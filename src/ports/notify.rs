/// A system notification as the worker displays it. `url` travels in the
/// notification's data and becomes the navigation target on click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Deduplication tag: a repeated push with the same tag replaces the
    /// displayed notification instead of stacking.
    pub tag: String,
    /// Re-alert even when replacing a notification with the same tag.
    pub renotify: bool,
    pub url: String,
}

/// Notification surface available inside the worker context.
pub trait NotificationDisplay: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn show<'a>(&'a self, notification: &'a Notification) -> Self::Fut<'a>;

    /// Closes the displayed notification with the given tag.
    fn close<'a>(&'a self, tag: &'a str) -> Self::Fut<'a>;
}
