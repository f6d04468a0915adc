use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

pub const PASSTHROUGH_TRANSFORM: &str = "none";

/// Per-packet rewrite applied to a relayed video track.
pub trait VideoTransform: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn apply(&self, payload: Bytes) -> Bytes;
}

/// Forwards payloads untouched.
pub struct Passthrough;

impl VideoTransform for Passthrough {
    fn name(&self) -> &str {
        PASSTHROUGH_TRANSFORM
    }

    fn apply(&self, payload: Bytes) -> Bytes {
        payload
    }
}

/// Transforms selectable by the `video_transform` field of an offer.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: Arc<DashMap<String, Arc<dyn VideoTransform>>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        let registry = Self {
            transforms: Arc::new(DashMap::new()),
        };
        registry.register(Arc::new(Passthrough));
        registry
    }

    pub fn register(&self, transform: Arc<dyn VideoTransform>) {
        self.transforms
            .insert(transform.name().to_owned(), transform);
    }

    /// Unknown names fall back to passthrough.
    pub fn resolve(&self, name: &str) -> Arc<dyn VideoTransform> {
        if let Some(transform) = self.transforms.get(name) {
            return Arc::clone(transform.value());
        }

        warn!("Unknown video transform {:?}, relaying untouched", name);
        Arc::new(Passthrough)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.transforms.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
