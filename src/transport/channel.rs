//! In-memory origin-addressed message hub.
//!
//! Models the browser's frame graph loosely: every endpoint occupies an
//! origin, and a posted message is delivered to all listeners subscribed
//! under the target origin. Messages addressed to an origin nobody
//! occupies are dropped silently, like a `postMessage` into the void.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

use super::{Inbound, Transport, ANY_ORIGIN};
use crate::error::Result;

#[derive(Default)]
struct HubInner {
    /// Listeners per occupied origin. Closed listeners are pruned on send.
    listeners: HashMap<String, Vec<mpsc::UnboundedSender<Inbound>>>,
}

/// Shared in-memory bus connecting any number of endpoints.
#[derive(Clone, Default)]
pub struct ChannelHub {
    inner: Arc<Mutex<HubInner>>,
}

impl ChannelHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an endpoint occupying the given origin.
    pub fn endpoint(&self, origin: &str) -> ChannelEndpoint {
        ChannelEndpoint {
            hub: self.clone(),
            origin: origin.to_string(),
        }
    }

    /// Convenience: two connected endpoints, e.g. a host and a child.
    pub fn pair(host_origin: &str, child_origin: &str) -> (ChannelEndpoint, ChannelEndpoint) {
        let hub = Self::new();
        (hub.endpoint(host_origin), hub.endpoint(child_origin))
    }

    fn deliver(&self, sender_origin: &str, target_origin: &str, message: Value) {
        let mut inner = self.inner.lock().expect("hub lock poisoned");
        let targets: Vec<&mut Vec<mpsc::UnboundedSender<Inbound>>> = if target_origin == ANY_ORIGIN
        {
            inner.listeners.values_mut().collect()
        } else {
            inner.listeners.get_mut(target_origin).into_iter().collect()
        };
        for listeners in targets {
            listeners.retain(|tx| {
                tx.send(Inbound {
                    origin: sender_origin.to_string(),
                    data: message.clone(),
                })
                .is_ok()
            });
        }
    }
}

/// One endpoint on a [`ChannelHub`].
#[derive(Clone)]
pub struct ChannelEndpoint {
    hub: ChannelHub,
    origin: String,
}

impl ChannelEndpoint {
    /// The origin this endpoint occupies.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Transport for ChannelEndpoint {
    fn post(&self, message: Value, target_origin: &str) -> Result<()> {
        self.hub.deliver(&self.origin, target_origin, message);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<Inbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.hub.inner.lock().expect("hub lock poisoned");
        inner
            .listeners
            .entry(self.origin.clone())
            .or_default()
            .push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_targeted_delivery_stamps_sender_origin() {
        let (host, child) = ChannelHub::pair("https://host.example.com", "https://child.example.com");
        let mut rx = child.subscribe();

        host.post(json!({"n": 1}), "https://child.example.com").unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.origin, "https://host.example.com");
        assert_eq!(msg.data, json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_mis_addressed_message_is_dropped() {
        let (host, child) = ChannelHub::pair("https://host.example.com", "https://child.example.com");
        let mut rx = child.subscribe();

        host.post(json!(1), "https://other.example.com").unwrap();
        host.post(json!(2), "https://child.example.com").unwrap();

        // Only the correctly addressed message arrives.
        assert_eq!(rx.recv().await.unwrap().data, json!(2));
    }

    #[tokio::test]
    async fn test_wildcard_reaches_every_endpoint() {
        let hub = ChannelHub::new();
        let a = hub.endpoint("https://a.example.com");
        let b = hub.endpoint("https://b.example.com");
        let mut rx_a = a.subscribe();
        let mut rx_b = b.subscribe();

        hub.endpoint("https://c.example.com")
            .post(json!("hi"), ANY_ORIGIN)
            .unwrap();

        assert_eq!(rx_a.recv().await.unwrap().data, json!("hi"));
        assert_eq!(rx_b.recv().await.unwrap().data, json!("hi"));
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_the_message() {
        let (host, child) = ChannelHub::pair("https://host.example.com", "https://child.example.com");
        let mut rx1 = child.subscribe();
        let mut rx2 = child.subscribe();

        host.post(json!(7), "https://child.example.com").unwrap();

        assert_eq!(rx1.recv().await.unwrap().data, json!(7));
        assert_eq!(rx2.recv().await.unwrap().data, json!(7));
    }
}
