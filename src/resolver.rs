//! Request-time resolution.
//!
//! A [`Resolver`] answers one question: for this route, which middlewares run
//! and in what order? The answer for each route is computed once and cached.
//! The resolver is read-only apart from that cache, which sits behind a
//! read-write lock, so one `Arc<Resolver<M>>` can serve every request thread.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::assignment::Assignments;
use crate::error::Error;
use crate::provider::Instantiate;
use crate::registry::Registry;
use crate::report::Report;
use crate::route::RouteKey;

/// Frozen middleware configuration plus a per-route resolution cache.
///
/// Obtained from [`Builder::freeze`](crate::Builder::freeze).
#[derive(Debug)]
pub struct Resolver<M> {
    assignments: Assignments,
    registry: Registry<M>,
    cache: RwLock<HashMap<RouteKey, Arc<[String]>>>,
}

impl<M: 'static> Resolver<M> {
    pub(crate) fn new(assignments: Assignments, registry: Registry<M>) -> Self {
        let routes = assignments.tree().len();
        Self {
            assignments,
            registry,
            cache: RwLock::new(HashMap::with_capacity(routes)),
        }
    }

    /// The middleware names for `route`, highest priority first.
    ///
    /// Unknown routes resolve to an empty list and are not cached, so
    /// request-supplied keys cannot grow the cache.
    pub fn resolve(&self, route: &RouteKey) -> Arc<[String]> {
        if let Some(hit) = self.cache.read().get(route) {
            trace!(route = %route, "middleware cache hit");
            return Arc::clone(hit);
        }

        if !self.assignments.tree().contains(route) {
            return Arc::from([]);
        }

        let mut cache = self.cache.write();
        // Another reader may have filled the entry while we waited.
        let resolved = cache.entry(route.clone()).or_insert_with(|| {
            trace!(route = %route, "middleware cache miss");
            self.registry.sort(self.assignments.middlewares(route)).into()
        });
        Arc::clone(resolved)
    }

    /// [`resolve`](Self::resolve) for a dotted `bundle.controller.action` key.
    pub fn resolve_path(&self, route: &str) -> Result<Arc<[String]>, Error> {
        let key: RouteKey = route.parse()?;
        Ok(self.resolve(&key))
    }

    /// Instantiates the resolved middlewares through the registry's own
    /// providers, in resolved order.
    pub fn resolve_instances(&self, route: &RouteKey) -> Result<Vec<M>, Error> {
        self.resolve_instances_with(route, self.registry.container())
    }

    /// Instantiates the resolved middlewares through an external container.
    pub fn resolve_instances_with<I>(&self, route: &RouteKey, container: &I) -> Result<Vec<I::Output>, Error>
    where
        I: Instantiate + ?Sized,
    {
        self.resolve(route)
            .iter()
            .map(|name| {
                container
                    .instantiate(name)
                    .ok_or_else(|| Error::Uninstantiable(name.clone()))
            })
            .collect()
    }

    /// Every registered action with its resolved middlewares.
    pub fn report(&self) -> Report {
        Report::new(
            self.assignments
                .routes()
                .map(|route| {
                    let middlewares = self.resolve(&route);
                    (route, middlewares)
                })
                .collect(),
        )
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    pub fn registry(&self) -> &Registry<M> {
        &self.registry
    }

    /// Number of routes resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}
