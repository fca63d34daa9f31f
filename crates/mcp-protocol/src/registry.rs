//! Name-keyed registries for tools, prompts, and resources.
//!
//! Each registry preserves the order items were first registered in (so
//! `tools/list` is stable across calls) while letting a later registration
//! under the same name replace the earlier entry in place, rather than
//! moving it to the end or being rejected as a duplicate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::RequestContext;

/// A per-request predicate deciding whether an item should appear in a list result.
///
/// Implementations may need to look at the caller's identity or session
/// state (e.g. a tool only visible to authenticated callers), hence the
/// async signature and the shared [`RequestContext`].
#[async_trait]
pub trait ListFilter<T>: Send + Sync {
    /// Return `true` if `item` should be included for this request.
    async fn allow(&self, item: &T, ctx: &RequestContext) -> bool;
}

/// An ordered, name-keyed collection of registered items.
pub struct Registry<T> {
    order: Vec<String>,
    items: HashMap<String, T>,
    filter: Option<Arc<dyn ListFilter<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
            filter: None,
        }
    }
}

impl<T> Registry<T> {
    /// Create an empty registry with no list filter installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an async list filter applied by [`Registry::list`].
    pub fn with_filter(mut self, filter: Arc<dyn ListFilter<T>>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Register an item under `name`.
    ///
    /// If `name` was already registered, its value is replaced but its
    /// position in iteration order is preserved; otherwise the name is
    /// appended to the end of the order.
    pub fn register(&mut self, name: impl Into<String>, item: T) {
        let name = name.into();
        if !self.items.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.items.insert(name, item);
    }

    /// Remove a registered item, returning it if present.
    pub fn unregister(&mut self, name: &str) -> Option<T> {
        let removed = self.items.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Fetch a single item by name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.get(name)
    }

    /// Whether any item is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// List every item in registration order, applying the filter (if any) per request.
    pub async fn list(&self, ctx: &RequestContext) -> Vec<(&str, &T)> {
        let mut results = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let Some(item) = self.items.get(name) else {
                continue;
            };
            let visible = match &self.filter {
                Some(filter) => filter.allow(item, ctx).await,
                None => true,
            };
            if visible {
                results.push((name.as_str(), item));
            }
        }
        results
    }

    /// List every item unconditionally, ignoring any installed filter.
    ///
    /// Used internally by `tools/call`-style dispatch, where visibility
    /// filtering applies only to enumeration, not invocation.
    pub fn iter_all(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(move |name| self.items.get(name).map(|item| (name.as_str(), item)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RequestContext;

    #[tokio::test]
    async fn preserves_insertion_order() {
        let mut registry: Registry<u32> = Registry::new();
        registry.register("b", 2);
        registry.register("a", 1);
        registry.register("c", 3);

        let ctx = RequestContext::default();
        let names: Vec<&str> = registry.list(&ctx).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn re_registration_keeps_position_but_replaces_value() {
        let mut registry: Registry<u32> = Registry::new();
        registry.register("a", 1);
        registry.register("b", 2);
        registry.register("a", 99);

        let ctx = RequestContext::default();
        let items = registry.list(&ctx).await;
        assert_eq!(items, vec![("a", &99), ("b", &2)]);
    }

    #[tokio::test]
    async fn unregister_removes_from_order() {
        let mut registry: Registry<u32> = Registry::new();
        registry.register("a", 1);
        registry.register("b", 2);
        registry.unregister("a");

        let ctx = RequestContext::default();
        let names: Vec<&str> = registry.list(&ctx).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b"]);
    }

    struct OnlyEven;

    #[async_trait]
    impl ListFilter<u32> for OnlyEven {
        async fn allow(&self, item: &u32, _ctx: &RequestContext) -> bool {
            item % 2 == 0
        }
    }

    #[tokio::test]
    async fn filter_hides_non_matching_items() {
        let mut registry: Registry<u32> = Registry::new().with_filter(Arc::new(OnlyEven));
        registry.register("a", 1);
        registry.register("b", 2);

        let ctx = RequestContext::default();
        let names: Vec<&str> = registry.list(&ctx).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b"]);
    }
}
