/// An open application window as seen from the worker context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// Client-matching handshake between the worker and open windows: claim on
/// activation, and the focus-or-open routing on notification click.
pub trait ClientWindows: Clone + Send + Sync + 'static {
    type ListFut<'a>: Future<Output = Vec<ClientWindow>> + Send + 'a
    where
        Self: 'a;
    type UnitFut<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    /// Takes control of already-open windows without requiring a reload.
    fn claim<'a>(&'a self) -> Self::UnitFut<'a>;

    /// Every open window, regardless of origin.
    fn list<'a>(&'a self) -> Self::ListFut<'a>;

    /// Navigates an existing window to `url` and brings it to the front.
    fn navigate_and_focus<'a>(&'a self, id: &'a str, url: &'a str) -> Self::UnitFut<'a>;

    /// Opens a fresh window at `url`.
    fn open<'a>(&'a self, url: &'a str) -> Self::UnitFut<'a>;
}
