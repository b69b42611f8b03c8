//! Live debug-node lookup table.
//!
//! Populated at flow deploy, cleared at redeploy. The control endpoint
//! resolves node ids through this handle; full node lifecycle stays with
//! the flow engine.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::node::DebugNode;

/// Registry of live debug nodes, keyed by node id.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<String, Arc<DebugNode>>>,
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, replacing any previous instance with the same id.
    pub fn register(&self, node: Arc<DebugNode>) {
        let _ = self.nodes.write().insert(node.id().to_owned(), node);
    }

    /// Remove a node by id. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<DebugNode>> {
        self.nodes.write().remove(id)
    }

    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<Arc<DebugNode>> {
        self.nodes.read().get(id).cloned()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Drop all nodes (flow redeploy).
    pub fn clear(&self) {
        self.nodes.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DebugNodeConfig;

    fn node(id: &str) -> Arc<DebugNode> {
        Arc::new(DebugNode::new(id, DebugNodeConfig::default(), 1000))
    }

    #[test]
    fn register_and_get() {
        let reg = NodeRegistry::new();
        reg.register(node("a"));
        assert!(reg.get("a").is_some());
        assert!(reg.get("b").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn register_replaces_same_id() {
        let reg = NodeRegistry::new();
        reg.register(node("a"));
        let replacement = node("a");
        replacement.set_active(false);
        reg.register(replacement);
        assert_eq!(reg.len(), 1);
        assert!(!reg.get("a").unwrap().is_active());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let reg = NodeRegistry::new();
        assert!(reg.remove("ghost").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn clear_empties() {
        let reg = NodeRegistry::new();
        reg.register(node("a"));
        reg.register(node("b"));
        reg.clear();
        assert!(reg.is_empty());
    }
}
