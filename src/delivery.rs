use std::pin::Pin;
use std::sync::Arc;

use crate::config::DeliveryConfig;
use crate::ports::clients::ClientWindows;
use crate::ports::notify::{Notification, NotificationDisplay};
use crate::types::push::PushPayload;
use crate::worker::runtime::{ClickedNotification, InstallOutcome, WorkerScript};

/// Builds the notification for an inbound push payload. The payload is JSON;
/// anything unparsable degrades to a plain-text body under the default title.
pub fn build_notification(config: &DeliveryConfig, payload: &[u8]) -> Notification {
    match serde_json::from_slice::<PushPayload>(payload) {
        Ok(parsed) => Notification {
            title: parsed
                .title
                .unwrap_or_else(|| config.default_title.clone()),
            body: parsed.body.unwrap_or_default(),
            icon: parsed.icon.unwrap_or_else(|| config.default_icon.clone()),
            badge: parsed
                .badge
                .unwrap_or_else(|| config.default_badge.clone()),
            tag: parsed.tag.unwrap_or_else(|| config.default_tag.clone()),
            renotify: config.renotify,
            url: parsed.url.unwrap_or_else(|| config.default_url.clone()),
        },
        Err(_) => Notification {
            title: config.default_title.clone(),
            body: String::from_utf8_lossy(payload).into_owned(),
            icon: config.default_icon.clone(),
            badge: config.default_badge.clone(),
            tag: config.default_tag.clone(),
            renotify: config.renotify,
            url: config.default_url.clone(),
        },
    }
}

pub async fn handle_push<D: NotificationDisplay>(
    display: &D,
    config: &DeliveryConfig,
    payload: &[u8],
) {
    let notification = build_notification(config, payload);
    display.show(&notification).await;
}

/// Focus-or-open routing for a clicked notification: close it, scan ALL open
/// clients for one on our origin, navigate and focus it, or open a fresh
/// window. Runs to completion before returning so the worker stays alive
/// until navigation is done.
pub async fn handle_notification_click<D, C>(
    display: &D,
    clients: &C,
    config: &DeliveryConfig,
    clicked: ClickedNotification,
) where
    D: NotificationDisplay,
    C: ClientWindows,
{
    display.close(&clicked.tag).await;

    for client in clients.list().await {
        if client.url.starts_with(&config.origin) {
            clients.navigate_and_focus(&client.id, &clicked.url).await;
            return;
        }
    }
    clients.open(&clicked.url).await;
}

/// The worker script wired to the two ports available inside the worker
/// context. Install skips the waiting period so the foreground skip-wait
/// path always has an effect; activation claims open clients.
#[derive(Clone)]
pub struct PushWorker<D, C> {
    display: D,
    clients: C,
    config: Arc<DeliveryConfig>,
}

impl<D, C> PushWorker<D, C> {
    pub fn new(display: D, clients: C, config: DeliveryConfig) -> Self {
        Self {
            display,
            clients,
            config: Arc::new(config),
        }
    }
}

impl<D, C> WorkerScript for PushWorker<D, C>
where
    D: NotificationDisplay,
    C: ClientWindows,
{
    type InstallFut<'a>
        = std::future::Ready<InstallOutcome>
    where
        Self: 'a;
    type EventFut<'a>
        = Pin<Box<dyn Future<Output = ()> + Send + 'a>>
    where
        Self: 'a;

    fn install<'a>(&'a self) -> Self::InstallFut<'a> {
        std::future::ready(InstallOutcome::Installed { skip_waiting: true })
    }

    fn activate<'a>(&'a self) -> Self::EventFut<'a> {
        Box::pin(async move { self.clients.claim().await })
    }

    fn push<'a>(&'a self, payload: Vec<u8>) -> Self::EventFut<'a> {
        Box::pin(async move { handle_push(&self.display, &self.config, &payload).await })
    }

    fn notification_click<'a>(&'a self, clicked: ClickedNotification) -> Self::EventFut<'a> {
        Box::pin(async move {
            handle_notification_click(&self.display, &self.clients, &self.config, clicked).await
        })
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::clients::ClientWindow;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    pub(crate) struct TestDisplay {
        pub(crate) shown: Arc<Mutex<Vec<Notification>>>,
        pub(crate) closed: Arc<Mutex<Vec<String>>>,
    }

    impl NotificationDisplay for TestDisplay {
        type Fut<'a>
            = std::future::Ready<()>
        where
            Self: 'a;

        fn show<'a>(&'a self, notification: &'a Notification) -> Self::Fut<'a> {
            self.shown
                .lock()
                .expect("shown lock")
                .push(notification.clone());
            std::future::ready(())
        }

        fn close<'a>(&'a self, tag: &'a str) -> Self::Fut<'a> {
            self.closed.lock().expect("closed lock").push(tag.to_string());
            std::future::ready(())
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct TestClients {
        pub(crate) windows: Arc<Mutex<Vec<ClientWindow>>>,
        pub(crate) navigated: Arc<Mutex<Vec<(String, String)>>>,
        pub(crate) opened: Arc<Mutex<Vec<String>>>,
        pub(crate) claims: Arc<AtomicUsize>,
    }

    impl ClientWindows for TestClients {
        type ListFut<'a>
            = std::future::Ready<Vec<ClientWindow>>
        where
            Self: 'a;
        type UnitFut<'a>
            = std::future::Ready<()>
        where
            Self: 'a;

        fn claim<'a>(&'a self) -> Self::UnitFut<'a> {
            self.claims.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }

        fn list<'a>(&'a self) -> Self::ListFut<'a> {
            std::future::ready(self.windows.lock().expect("windows lock").clone())
        }

        fn navigate_and_focus<'a>(&'a self, id: &'a str, url: &'a str) -> Self::UnitFut<'a> {
            self.navigated
                .lock()
                .expect("navigated lock")
                .push((id.to_string(), url.to_string()));
            std::future::ready(())
        }

        fn open<'a>(&'a self, url: &'a str) -> Self::UnitFut<'a> {
            self.opened.lock().expect("opened lock").push(url.to_string());
            std::future::ready(())
        }
    }

    fn config() -> DeliveryConfig {
        DeliveryConfig {
            origin: "https://mariam.example".to_string(),
            ..DeliveryConfig::default()
        }
    }

    #[test]
    fn build_notification__should_use_payload_fields_and_default_tag() {
        // Given
        let payload = br#"{"title":"Menu du jour","url":"/menu"}"#;

        // When
        let notification = build_notification(&config(), payload);

        // Then
        assert_eq!(notification.title, "Menu du jour");
        assert_eq!(notification.tag, "mariam-notification");
        assert_eq!(notification.url, "/menu");
        assert_eq!(notification.icon, "/web-app-manifest-192x192.png");
    }

    #[test]
    fn build_notification__should_fall_back_to_plain_text_body() {
        // Given
        let payload = b"plain text alert";

        // When
        let notification = build_notification(&config(), payload);

        // Then
        assert_eq!(notification.title, "Mariam");
        assert_eq!(notification.body, "plain text alert");
        assert_eq!(notification.url, "/menu");
    }

    #[tokio::test]
    async fn handle_push__should_display_the_notification() {
        // Given
        let display = TestDisplay::default();

        // When
        handle_push(&display, &config(), r#"{"title":"Soirée jazz"}"#.as_bytes()).await;

        // Then
        let shown = display.shown.lock().expect("shown lock");
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Soirée jazz");
    }

    #[tokio::test]
    async fn handle_notification_click__should_open_window_when_no_client_matches() {
        // Given
        let display = TestDisplay::default();
        let clients = TestClients::default();
        let clicked = ClickedNotification {
            tag: "mariam-notification".to_string(),
            url: "/menu".to_string(),
        };

        // When
        handle_notification_click(&display, &clients, &config(), clicked).await;

        // Then
        assert_eq!(
            display.closed.lock().expect("closed lock").as_slice(),
            ["mariam-notification"]
        );
        assert_eq!(clients.opened.lock().expect("opened lock").as_slice(), ["/menu"]);
        assert!(clients.navigated.lock().expect("navigated lock").is_empty());
    }

    #[tokio::test]
    async fn handle_notification_click__should_focus_matching_client_past_foreign_ones() {
        // Given: the matching window is not the first in the list
        let display = TestDisplay::default();
        let clients = TestClients::default();
        clients.windows.lock().expect("windows lock").extend([
            ClientWindow {
                id: "w1".to_string(),
                url: "https://elsewhere.example/".to_string(),
            },
            ClientWindow {
                id: "w2".to_string(),
                url: "https://mariam.example/gallery".to_string(),
            },
        ]);
        let clicked = ClickedNotification {
            tag: "mariam-notification".to_string(),
            url: "/menu".to_string(),
        };

        // When
        handle_notification_click(&display, &clients, &config(), clicked).await;

        // Then
        assert_eq!(
            clients.navigated.lock().expect("navigated lock").as_slice(),
            [("w2".to_string(), "/menu".to_string())]
        );
        assert!(clients.opened.lock().expect("opened lock").is_empty());
    }

    #[tokio::test]
    async fn push_worker__should_skip_waiting_on_install_and_claim_on_activate() {
        // Given
        let display = TestDisplay::default();
        let clients = TestClients::default();
        let worker = PushWorker::new(display, clients.clone(), config());

        // When
        let outcome = worker.install().await;
        worker.activate().await;

        // Then
        assert_eq!(outcome, InstallOutcome::Installed { skip_waiting: true });
        assert_eq!(clients.claims.load(Ordering::SeqCst), 1);
    }
}
