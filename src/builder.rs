//! Startup-phase configuration.
//!
//! Everything that mutates the middleware map happens on a [`Builder`]. Once
//! configuration is done, [`Builder::freeze`] turns it into a [`Resolver`],
//! which can only read. A route can therefore never be resolved (and cached)
//! before its last assignment command has run.

use tracing::info;

use crate::assignment::{Assignments, Selection, Session};
use crate::error::Error;
use crate::provider::Provider;
use crate::registry::Registry;
use crate::resolver::Resolver;

/// Collects controllers, middlewares and assignment commands.
///
/// Build it once at startup, then [`freeze`](Builder::freeze) it and share the
/// resulting [`Resolver`] with the request path.
#[derive(Debug)]
pub struct Builder<M> {
    assignments: Assignments,
    registry: Registry<M>,
}

impl<M: 'static> Builder<M> {
    pub fn new() -> Self {
        Self {
            assignments: Assignments::new(),
            registry: Registry::new(),
        }
    }

    /// Registers (or replaces) the actions of `bundle.controller`.
    pub fn register_controller<I, S>(
        &mut self,
        bundle: &str,
        controller: &str,
        actions: I,
    ) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignments.register_controller(bundle, controller, actions)?;
        Ok(self)
    }

    /// Registers a middleware with the default priority of 0.
    pub fn register_middleware(
        &mut self,
        name: &str,
        provider: impl Provider<M>,
    ) -> Result<&mut Self, Error> {
        self.registry.register(name, provider)?;
        Ok(self)
    }

    /// Registers a middleware; higher `priority` runs earlier.
    pub fn register_middleware_with_priority(
        &mut self,
        name: &str,
        provider: impl Provider<M>,
        priority: i32,
    ) -> Result<&mut Self, Error> {
        self.registry.register_with_priority(name, provider, priority)?;
        Ok(self)
    }

    /// Opens a session with no scope set.
    pub fn session(&mut self) -> Session<'_> {
        self.assignments.session(&self.registry)
    }

    /// Opens a session scoped to `bundle.controller`.
    pub fn scope(&mut self, bundle: &str, controller: &str) -> Session<'_> {
        let mut session = self.session();
        session.scope(bundle, controller);
        session
    }

    /// Selects a middleware outside any scope, for bundle-level operators.
    pub fn select(&mut self, middleware: &str) -> Result<Selection<'_>, Error> {
        Selection::new(&mut self.assignments, &self.registry, middleware, None, None)
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    pub fn registry(&self) -> &Registry<M> {
        &self.registry
    }

    /// Ends configuration.
    pub fn freeze(self) -> Resolver<M> {
        info!(
            routes = self.assignments.tree().len(),
            middlewares = self.registry.len(),
            "middleware configuration frozen"
        );
        Resolver::new(self.assignments, self.registry)
    }
}

impl<M: 'static> Default for Builder<M> {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScopeLevel;

    #[test]
    fn registration_chains() {
        let mut builder: Builder<()> = Builder::new();
        builder
            .register_controller("admin", "users", ["list"])
            .unwrap()
            .register_middleware("auth", || ())
            .unwrap()
            .register_middleware_with_priority("cors", || (), 5)
            .unwrap();

        assert_eq!(builder.assignments().tree().len(), 1);
        assert_eq!(builder.registry().priority("cors"), 5);
    }

    #[test]
    fn select_checks_registry() {
        let mut builder: Builder<()> = Builder::new();
        builder.register_controller("admin", "users", ["list"]).unwrap();
        assert_eq!(
            builder.select("auth").err(),
            Some(Error::UnknownMiddleware("auth".into()))
        );

        builder.register_middleware("auth", || ()).unwrap();
        builder.select("auth").unwrap().all_bundles();
        let route = "admin.users.list".parse().unwrap();
        assert_eq!(builder.assignments().middlewares(&route).collect::<Vec<_>>(), ["auth"]);
    }

    #[test]
    fn unscoped_select_has_no_controller() {
        let mut builder: Builder<()> = Builder::new();
        builder.register_controller("admin", "users", ["list"]).unwrap();
        builder.register_middleware("auth", || ()).unwrap();
        assert_eq!(
            builder.select("auth").unwrap().all_actions().err(),
            Some(Error::MissingScope(ScopeLevel::Bundle))
        );
    }

    #[test]
    fn scope_session_reuses_scope() {
        let mut builder: Builder<()> = Builder::new();
        builder.register_controller("admin", "users", ["list", "create"]).unwrap();
        builder.register_middleware("auth", || ()).unwrap();
        builder.register_middleware("audit", || ()).unwrap();

        let mut users = builder.scope("admin", "users");
        users.select("auth").unwrap().all_actions().unwrap();
        users.select("audit").unwrap().only_actions(["create"]).unwrap();

        let create = "admin.users.create".parse().unwrap();
        assert_eq!(
            builder.assignments().middlewares(&create).collect::<Vec<_>>(),
            ["audit", "auth"]
        );
    }
}
