//! Background-sync and push-notification hooks.

use cruzy_core::CartSnapshot;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::CartApi;
use crate::error::Result;
use crate::notify::Notifier;
use crate::page::Region;
use crate::sync::CartSync;

/// Tag that asks for the cart to be re-synchronised.
pub const SYNC_CART_TAG: &str = "sync-cart";

const NOTIFICATION_TITLE: &str = "Cruzy Coffee Co.";
const NOTIFICATION_BODY: &str = "New update from Cruzy Coffee!";
const NOTIFICATION_ICON: &str = "/static/img/pwa-icon-192.png";
const NOTIFICATION_TAG: &str = "cruzy-notification";
const VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];

/// A background-sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTag {
    /// Refresh the mini cart.
    Cart,
    /// Any tag this client does not handle.
    Other(String),
}

impl SyncTag {
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        if tag == SYNC_CART_TAG {
            Self::Cart
        } else {
            Self::Other(tag.to_string())
        }
    }

    /// Handle the tag. Returns the refreshed snapshot for [`SyncTag::Cart`]
    /// and `None` for ignored tags.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure.
    pub async fn run<A, R, N>(&self, cart: &CartSync<A, R, N>) -> Result<Option<CartSnapshot>>
    where
        A: CartApi,
        R: Region,
        N: Notifier,
    {
        match self {
            Self::Cart => {
                info!("Syncing cart data");
                cart.refresh().await.map(Some)
            }
            Self::Other(tag) => {
                debug!(tag = %tag, "Ignoring sync tag");
                Ok(None)
            }
        }
    }
}

/// What the shopper can do from a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    View,
    Close,
}

impl NotificationAction {
    /// Parse a clicked action id; unknown ids yield `None`.
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "view" => Some(Self::View),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    /// Page to open when the action is clicked.
    #[must_use]
    pub const fn target(self) -> Option<&'static str> {
        match self {
            Self::View => Some("/orders"),
            Self::Close => None,
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::View => "View Order",
            Self::Close => "Close",
        }
    }
}

/// A button on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationButton {
    pub action: NotificationAction,
    pub title: &'static str,
}

/// An order-update notification built from a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: &'static str,
    pub body: String,
    pub icon: &'static str,
    pub badge: &'static str,
    pub vibrate: Vec<u32>,
    pub tag: &'static str,
    pub actions: Vec<NotificationButton>,
}

impl PushNotification {
    /// Build the notification for a push payload.
    ///
    /// The payload text becomes the body; without one a generic update
    /// message is used.
    #[must_use]
    pub fn from_payload(payload: Option<&str>) -> Self {
        let actions = [NotificationAction::View, NotificationAction::Close]
            .into_iter()
            .map(|action| NotificationButton {
                action,
                title: action.title(),
            })
            .collect();

        Self {
            title: NOTIFICATION_TITLE,
            body: payload.unwrap_or(NOTIFICATION_BODY).to_string(),
            icon: NOTIFICATION_ICON,
            badge: NOTIFICATION_ICON,
            vibrate: VIBRATION_PATTERN.to_vec(),
            tag: NOTIFICATION_TAG,
            actions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_tag_parse() {
        assert_eq!(SyncTag::parse("sync-cart"), SyncTag::Cart);
        assert_eq!(
            SyncTag::parse("sync-orders"),
            SyncTag::Other("sync-orders".to_string())
        );
    }

    #[test]
    fn test_push_without_payload_uses_default_body() {
        let notification = PushNotification::from_payload(None);
        assert_eq!(notification.title, "Cruzy Coffee Co.");
        assert_eq!(notification.body, "New update from Cruzy Coffee!");
        assert_eq!(notification.vibrate, vec![200, 100, 200]);
        assert_eq!(notification.actions.len(), 2);
    }

    #[test]
    fn test_push_payload_becomes_body() {
        let notification = PushNotification::from_payload(Some("Order #42 has shipped"));
        assert_eq!(notification.body, "Order #42 has shipped");
    }

    #[test]
    fn test_notification_serializes_actions() {
        let json = serde_json::to_value(PushNotification::from_payload(None)).unwrap();
        assert_eq!(json["actions"][0]["action"], "view");
        assert_eq!(json["actions"][0]["title"], "View Order");
        assert_eq!(json["tag"], "cruzy-notification");
    }

    #[test]
    fn test_action_targets() {
        assert_eq!(NotificationAction::parse("view").unwrap().target(), Some("/orders"));
        assert_eq!(NotificationAction::parse("close").unwrap().target(), None);
        assert!(NotificationAction::parse("dismiss").is_none());
    }
}
