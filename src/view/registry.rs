use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{RefreshPolicy, View, ViewId};
use crate::error::CoordError;

struct Entry {
    view: Arc<dyn View>,
    policy: RefreshPolicy,
}

/// Maps view ids to their loader, handler hooks and refresh policy.
#[derive(Default)]
pub struct ViewRegistry {
    entries: RwLock<HashMap<ViewId, Entry>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `view` under its own id, replacing any previous entry.
    pub fn register(&self, view: Arc<dyn View>, policy: RefreshPolicy) {
        let id = view.id();
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.insert(id, Entry { view, policy });
    }

    pub fn resolve(&self, id: &ViewId) -> Result<Arc<dyn View>, CoordError> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries
            .get(id)
            .map(|e| Arc::clone(&e.view))
            .ok_or_else(|| CoordError::UnknownView(id.clone()))
    }

    pub fn policy(&self, id: &ViewId) -> Result<RefreshPolicy, CoordError> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries
            .get(id)
            .map(|e| e.policy.clone())
            .ok_or_else(|| CoordError::UnknownView(id.clone()))
    }

    pub fn contains(&self, id: &ViewId) -> bool {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<ViewId> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        let mut ids: Vec<ViewId> = entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::view::{Payload, RefreshEvent};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct Fixed {
        id: &'static str,
        value: u64,
    }

    #[async_trait]
    impl View for Fixed {
        fn id(&self) -> ViewId {
            ViewId::new(self.id)
        }

        async fn load(&self) -> Result<Payload, ClientError> {
            Ok(json!(self.value))
        }
    }

    #[test]
    fn resolve_unknown_fails() {
        let reg = ViewRegistry::new();
        let err = reg.resolve(&ViewId::new("nope")).err().unwrap();
        assert!(matches!(err, CoordError::UnknownView(id) if id.as_str() == "nope"));
    }

    #[tokio::test]
    async fn reregistering_replaces_entry() {
        let reg = ViewRegistry::new();
        reg.register(Arc::new(Fixed { id: "a", value: 1 }), RefreshPolicy::manual());
        reg.register(
            Arc::new(Fixed { id: "a", value: 2 }),
            RefreshPolicy::every(Some(Duration::from_secs(3))).on(RefreshEvent::LogIngested),
        );

        let view = reg.resolve(&ViewId::new("a")).unwrap();
        assert_eq!(view.load().await.unwrap(), json!(2));
        let policy = reg.policy(&ViewId::new("a")).unwrap();
        assert_eq!(policy.interval, Some(Duration::from_secs(3)));
        assert_eq!(reg.ids().len(), 1);
    }

    #[test]
    fn ids_are_sorted_regardless_of_registration_order() {
        let reg = ViewRegistry::new();
        reg.register(Arc::new(Fixed { id: "reports", value: 0 }), RefreshPolicy::manual());
        reg.register(Arc::new(Fixed { id: "alerts", value: 0 }), RefreshPolicy::manual());
        let ids: Vec<String> = reg.ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["alerts", "reports"]);
        assert!(reg.contains(&ViewId::new("alerts")));
    }
}
