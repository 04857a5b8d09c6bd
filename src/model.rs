//! Capability table.
//!
//! A model maps capability names to what one side exposes for the other
//! to read or invoke. Entries are a tagged variant rather than a runtime
//! type check: a literal value, a synchronous producer, or an async
//! producer. Producers always receive the call data and are free to
//! ignore it.
//!
//! # Example
//!
//! ```
//! use framelink::Model;
//! use serde_json::json;
//!
//! let model = Model::new()
//!     .with_value("height", json!(120))
//!     .with_producer("now", |_| json!("2024-01-01"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

/// Boxed future used by async producers and the resolver.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed synchronous producer.
pub type ProducerFn = Box<dyn Fn(Option<Value>) -> Value + Send + Sync>;

/// Boxed asynchronous producer.
pub type AsyncProducerFn = Box<dyn Fn(Option<Value>) -> BoxFuture<'static, Value> + Send + Sync>;

/// One exposed capability.
pub enum Capability {
    /// A literal value, returned as-is.
    Value(Value),
    /// A producer invoked with the call data, returning synchronously.
    Producer(ProducerFn),
    /// A producer invoked with the call data, settling later.
    AsyncProducer(AsyncProducerFn),
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Capability::Producer(_) => f.write_str("Producer(..)"),
            Capability::AsyncProducer(_) => f.write_str("AsyncProducer(..)"),
        }
    }
}

/// The named set of values and producers one side exposes.
///
/// Mutated exactly once after construction: at handshake time the child's
/// model is extended with host-supplied defaults for keys it does not
/// already define. Remote invocation resolves entries but can never add
/// or remove them.
#[derive(Debug, Default)]
pub struct Model {
    entries: HashMap<String, Capability>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal value capability.
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.entries.insert(name.to_string(), Capability::Value(value));
        self
    }

    /// Add a synchronous producer capability.
    pub fn with_producer<F>(mut self, name: &str, producer: F) -> Self
    where
        F: Fn(Option<Value>) -> Value + Send + Sync + 'static,
    {
        self.entries
            .insert(name.to_string(), Capability::Producer(Box::new(producer)));
        self
    }

    /// Add an asynchronous producer capability.
    pub fn with_async_producer<F, Fut>(mut self, name: &str, producer: F) -> Self
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.entries.insert(
            name.to_string(),
            Capability::AsyncProducer(Box::new(move |data| Box::pin(producer(data)))),
        );
        self
    }

    /// Insert a capability under the given name, replacing any prior entry.
    pub fn insert(&mut self, name: &str, capability: Capability) {
        self.entries.insert(name.to_string(), capability);
    }

    /// Whether the model defines the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve a capability to a settled value.
    ///
    /// Producers are invoked with the supplied data and awaited; literals
    /// resolve immediately. An absent name resolves to `Value::Null` -
    /// the protocol defines no not-found error for property reads.
    pub fn resolve(&self, name: &str, data: Option<Value>) -> BoxFuture<'static, Value> {
        match self.entries.get(name) {
            Some(Capability::Value(value)) => {
                let value = value.clone();
                Box::pin(async move { value })
            }
            Some(Capability::Producer(producer)) => {
                let value = producer(data);
                Box::pin(async move { value })
            }
            Some(Capability::AsyncProducer(producer)) => producer(data),
            None => Box::pin(async { Value::Null }),
        }
    }

    /// Fire-and-forget invocation. Only producers are invoked; a literal
    /// or absent entry is a no-op. Any produced value is discarded.
    pub async fn invoke(&self, name: &str, data: Option<Value>) {
        match self.entries.get(name) {
            Some(Capability::Producer(producer)) => {
                let _ = producer(data);
            }
            Some(Capability::AsyncProducer(producer)) => {
                let _ = producer(data).await;
            }
            _ => {}
        }
    }

    /// Snapshot of the literal entries, as sent on a handshake.
    ///
    /// Producers cannot cross the wire and are omitted.
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, capability) in &self.entries {
            if let Capability::Value(value) = capability {
                map.insert(name.clone(), value.clone());
            }
        }
        map
    }

    /// Merge host-supplied defaults into this model.
    ///
    /// Inserts a literal capability for every snapshot key not already
    /// defined locally. Local definitions always win; this is applied
    /// exactly once, at handshake.
    pub fn merge_defaults(&mut self, defaults: Map<String, Value>) {
        for (name, value) in defaults {
            self.entries
                .entry(name)
                .or_insert_with(|| Capability::Value(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolves_literal_value() {
        let model = Model::new().with_value("height", json!(120));
        assert_eq!(model.resolve("height", None).await, json!(120));
    }

    #[tokio::test]
    async fn test_resolves_producer_with_call_data() {
        let model = Model::new().with_producer("double", |data| {
            json!(data.and_then(|v| v.as_i64()).unwrap_or(0) * 2)
        });
        assert_eq!(model.resolve("double", Some(json!(21))).await, json!(42));
    }

    #[tokio::test]
    async fn test_resolves_async_producer() {
        let model = Model::new().with_async_producer("answer", |_| async { json!(42) });
        assert_eq!(model.resolve("answer", None).await, json!(42));
    }

    #[tokio::test]
    async fn test_missing_name_resolves_to_null_sentinel() {
        let model = Model::new();
        assert_eq!(model.resolve("nope", None).await, Value::Null);
    }

    #[tokio::test]
    async fn test_invoke_skips_literals() {
        let model = Model::new().with_value("height", json!(120));
        // No panic, no effect.
        model.invoke("height", Some(json!(1))).await;
        model.invoke("absent", None).await;
    }

    #[test]
    fn test_snapshot_excludes_producers() {
        let model = Model::new()
            .with_value("theme", json!("dark"))
            .with_producer("now", |_| json!(0));
        let snapshot = model.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["theme"], json!("dark"));
    }

    #[test]
    fn test_merge_never_overwrites_local_definitions() {
        let mut model = Model::new().with_value("theme", json!("dark"));
        let mut defaults = Map::new();
        defaults.insert("theme".to_string(), json!("light"));
        defaults.insert("lang".to_string(), json!("en"));
        model.merge_defaults(defaults);
        let snapshot = model.snapshot();
        assert_eq!(snapshot["theme"], json!("dark"));
        assert_eq!(snapshot["lang"], json!("en"));
    }
}
