//! Scoped middleware assignment.
//!
//! Middlewares are attached to routes through a small set-algebra DSL: pick a
//! middleware, then say which bundles, controllers or actions it covers.
//!
//! ```rust
//! use gatekeep::Assignments;
//!
//! let mut assignments = Assignments::new();
//! assignments.register_controller("admin", "users", ["list", "create", "delete"])?;
//!
//! let known = |name: &str| name == "auth";
//! let mut session = assignments.session(&known);
//! session.scope("admin", "users");
//! session.select("auth")?.except_actions(["list"])?;
//! # Ok::<(), gatekeep::Error>(())
//! ```
//!
//! Every `only_*` operator adds the middleware to the named side and removes it
//! from the complement; every `except_*` operator does the opposite. The
//! complement is computed from the route tree at call time, so issuing the
//! same command twice leaves the assignment set unchanged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{Error, ScopeLevel};
use crate::route::{RouteKey, RouteTree};

/// Decides whether a middleware name may be selected.
///
/// [`Registry`](crate::Registry) implements this over its priority table.
/// Any `Fn(&str) -> bool` works too, which is handy in tests.
pub trait NameValidator {
    fn check(&self, middleware: &str) -> Result<(), Error>;
}

impl<F> NameValidator for F
where
    F: Fn(&str) -> bool,
{
    fn check(&self, middleware: &str) -> Result<(), Error> {
        if self(middleware) {
            Ok(())
        } else {
            Err(Error::UnknownMiddleware(middleware.to_owned()))
        }
    }
}

/// The route tree plus, for every route, the set of middlewares assigned to it.
#[derive(Clone, Debug, Default)]
pub struct Assignments {
    tree: RouteTree,
    matched: BTreeMap<RouteKey, BTreeSet<String>>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the actions of `bundle.controller`.
    ///
    /// Must happen before any scope operator refers to the controller.
    pub fn register_controller<I, S>(
        &mut self,
        bundle: &str,
        controller: &str,
        actions: I,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree.insert(bundle, controller, actions)?;
        // Actions dropped by a re-registration lose their middlewares.
        let tree = &self.tree;
        self.matched.retain(|route, _| {
            route.bundle() != bundle || route.controller() != controller || tree.contains(route)
        });
        debug!(bundle, controller, "controller registered");
        Ok(())
    }

    /// Opens an assignment session. Middleware names are checked with
    /// `validator` as they are selected.
    pub fn session<'a>(&'a mut self, validator: &'a dyn NameValidator) -> Session<'a> {
        Session {
            assignments: self,
            validator,
            bundle: None,
            controller: None,
        }
    }

    /// The middlewares assigned to `route`, in name order. Empty when the
    /// route has none or does not exist.
    pub fn middlewares(&self, route: &RouteKey) -> impl Iterator<Item = &str> {
        self.matched
            .get(route)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Every registered route, ordered by bundle, controller, action.
    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.tree.routes()
    }

    fn add(&mut self, middleware: &str, routes: &[RouteKey]) {
        for route in routes {
            self.matched
                .entry(route.clone())
                .or_default()
                .insert(middleware.to_owned());
        }
    }

    fn remove(&mut self, middleware: &str, routes: &[RouteKey]) {
        for route in routes {
            if let Some(set) = self.matched.get_mut(route) {
                set.remove(middleware);
                if set.is_empty() {
                    self.matched.remove(route);
                }
            }
        }
    }

    /// Every action of every controller of each bundle in `bundles`.
    fn bundle_routes<'n>(&self, bundles: impl IntoIterator<Item = &'n str>) -> Vec<RouteKey> {
        bundles
            .into_iter()
            .flat_map(|bundle| {
                let controllers: Vec<&str> = self.tree.controllers(bundle).collect();
                self.controller_routes(bundle, controllers)
            })
            .collect()
    }

    fn controller_routes<'n>(
        &self,
        bundle: &str,
        controllers: impl IntoIterator<Item = &'n str>,
    ) -> Vec<RouteKey> {
        controllers
            .into_iter()
            .flat_map(|controller| {
                let actions: Vec<&str> = self.tree.actions(bundle, controller).collect();
                action_routes(bundle, controller, actions)
            })
            .collect()
    }
}

fn action_routes<'n>(
    bundle: &str,
    controller: &str,
    actions: impl IntoIterator<Item = &'n str>,
) -> Vec<RouteKey> {
    actions
        .into_iter()
        .map(|action| RouteKey::unchecked(bundle.to_owned(), controller.to_owned(), action.to_owned()))
        .collect()
}

/// Splits the candidates at one scope level into the named side and the rest.
fn partition<'c>(
    candidates: impl IntoIterator<Item = &'c str>,
    named: &BTreeSet<String>,
) -> (Vec<&'c str>, Vec<&'c str>) {
    candidates.into_iter().partition(|c| named.contains(*c))
}

fn collect_names<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| n.as_ref().to_owned()).collect()
}

/// An open assignment session: the validator plus the current bundle and
/// controller scope.
///
/// The scope stays put across [`select`](Session::select) calls until it is
/// changed, so several middlewares can be configured against one controller.
pub struct Session<'a> {
    assignments: &'a mut Assignments,
    validator: &'a dyn NameValidator,
    bundle: Option<String>,
    controller: Option<String>,
}

impl<'a> Session<'a> {
    /// Sets the bundle and controller that controller- and action-level
    /// operators work on.
    pub fn scope(&mut self, bundle: &str, controller: &str) -> &mut Self {
        self.bundle = Some(bundle.to_owned());
        self.controller = Some(controller.to_owned());
        self
    }

    /// Sets a bundle-only scope; action-level operators will fail until a
    /// controller is set again.
    pub fn bundle(&mut self, bundle: &str) -> &mut Self {
        self.bundle = Some(bundle.to_owned());
        self.controller = None;
        self
    }

    /// Picks the middleware the next operator applies to.
    pub fn select(&mut self, middleware: &str) -> Result<Selection<'_>, Error> {
        Selection::new(
            self.assignments,
            self.validator,
            middleware,
            self.bundle.clone(),
            self.controller.clone(),
        )
    }
}

/// One middleware, ready to be applied to a scope.
///
/// Operators validate every name before mutating anything: on error the
/// assignment set is exactly as it was.
pub struct Selection<'a> {
    assignments: &'a mut Assignments,
    middleware: String,
    bundle: Option<String>,
    controller: Option<String>,
}

impl<'a> Selection<'a> {
    pub(crate) fn new(
        assignments: &'a mut Assignments,
        validator: &dyn NameValidator,
        middleware: &str,
        bundle: Option<String>,
        controller: Option<String>,
    ) -> Result<Self, Error> {
        validator.check(middleware)?;
        Ok(Self {
            assignments,
            middleware: middleware.to_owned(),
            bundle,
            controller,
        })
    }

    pub fn middleware(&self) -> &str {
        &self.middleware
    }

    // ── Bundle level ──────────────────────────────────────────────────────────

    /// Assigns the middleware to every registered action.
    pub fn all_bundles(self) -> Self {
        let routes: Vec<RouteKey> = self.assignments.routes().collect();
        self.apply("all_bundles", &routes, &[])
    }

    /// Assigns to every action of the named bundles, and unassigns from every
    /// other bundle.
    pub fn only_bundles<I, S>(self, bundles: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (add, remove) = self.split_bundles(bundles)?;
        Ok(self.apply("only_bundles", &add, &remove))
    }

    /// Assigns to every bundle except the named ones, which are unassigned.
    pub fn except_bundles<I, S>(self, bundles: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (remove, add) = self.split_bundles(bundles)?;
        Ok(self.apply("except_bundles", &add, &remove))
    }

    // ── Controller level ──────────────────────────────────────────────────────

    /// Assigns to every controller of the bundle in scope.
    pub fn all_controllers(self) -> Result<Self, Error> {
        let bundle = self.scoped_bundle()?;
        let tree = &self.assignments.tree;
        let routes = self.assignments.controller_routes(bundle, tree.controllers(bundle));
        Ok(self.apply("all_controllers", &routes, &[]))
    }

    /// Within the bundle in scope: assigns to the named controllers and
    /// unassigns from the others.
    pub fn only_controllers<I, S>(self, controllers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (add, remove) = self.split_controllers(controllers)?;
        Ok(self.apply("only_controllers", &add, &remove))
    }

    /// Within the bundle in scope: unassigns from the named controllers and
    /// assigns to the others.
    pub fn except_controllers<I, S>(self, controllers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (remove, add) = self.split_controllers(controllers)?;
        Ok(self.apply("except_controllers", &add, &remove))
    }

    // ── Action level ──────────────────────────────────────────────────────────

    /// Assigns to every action of the controller in scope.
    pub fn all_actions(self) -> Result<Self, Error> {
        let (bundle, controller) = self.scoped_controller()?;
        let routes = action_routes(bundle, controller, self.assignments.tree.actions(bundle, controller));
        Ok(self.apply("all_actions", &routes, &[]))
    }

    /// Within the controller in scope: assigns to the named actions and
    /// unassigns from the others.
    pub fn only_actions<I, S>(self, actions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (add, remove) = self.split_actions(actions)?;
        Ok(self.apply("only_actions", &add, &remove))
    }

    /// Within the controller in scope: unassigns from the named actions and
    /// assigns to the others.
    pub fn except_actions<I, S>(self, actions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (remove, add) = self.split_actions(actions)?;
        Ok(self.apply("except_actions", &add, &remove))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn apply(self, op: &'static str, add: &[RouteKey], remove: &[RouteKey]) -> Self {
        self.assignments.add(&self.middleware, add);
        self.assignments.remove(&self.middleware, remove);
        debug!(
            middleware = %self.middleware,
            op,
            added = add.len(),
            removed = remove.len(),
            "middleware assigned"
        );
        self
    }

    /// Returns (routes under the named bundles, routes under the rest).
    fn split_bundles<I, S>(&self, bundles: I) -> Result<(Vec<RouteKey>, Vec<RouteKey>), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let named = collect_names(bundles);
        let tree = &self.assignments.tree;
        if let Some(unknown) = named.iter().find(|b| !tree.has_bundle(b)) {
            return Err(Error::UnknownScope {
                level: ScopeLevel::Bundle,
                name: unknown.clone(),
                within: String::new(),
            });
        }

        let (named_side, rest) = partition(tree.bundles(), &named);
        Ok((
            self.assignments.bundle_routes(named_side),
            self.assignments.bundle_routes(rest),
        ))
    }

    fn split_controllers<I, S>(&self, controllers: I) -> Result<(Vec<RouteKey>, Vec<RouteKey>), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bundle = self.scoped_bundle()?;
        let named = collect_names(controllers);
        let tree = &self.assignments.tree;
        if let Some(unknown) = named.iter().find(|c| !tree.has_controller(bundle, c)) {
            return Err(Error::UnknownScope {
                level: ScopeLevel::Controller,
                name: unknown.clone(),
                within: bundle.to_owned(),
            });
        }

        let (named_side, rest) = partition(tree.controllers(bundle), &named);
        Ok((
            self.assignments.controller_routes(bundle, named_side),
            self.assignments.controller_routes(bundle, rest),
        ))
    }

    fn split_actions<I, S>(&self, actions: I) -> Result<(Vec<RouteKey>, Vec<RouteKey>), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (bundle, controller) = self.scoped_controller()?;
        let named = collect_names(actions);
        let tree = &self.assignments.tree;
        if let Some(unknown) = named.iter().find(|a| !tree.has_action(bundle, controller, a)) {
            return Err(Error::UnknownScope {
                level: ScopeLevel::Action,
                name: unknown.clone(),
                within: format!("{bundle}.{controller}"),
            });
        }

        let (named_side, rest) = partition(tree.actions(bundle, controller), &named);
        Ok((
            action_routes(bundle, controller, named_side),
            action_routes(bundle, controller, rest),
        ))
    }

    /// The bundle in scope, which must be registered.
    fn scoped_bundle(&self) -> Result<&str, Error> {
        let bundle = self
            .bundle
            .as_deref()
            .ok_or(Error::MissingScope(ScopeLevel::Bundle))?;
        if !self.assignments.tree.has_bundle(bundle) {
            return Err(Error::UnknownScope {
                level: ScopeLevel::Bundle,
                name: bundle.to_owned(),
                within: String::new(),
            });
        }
        Ok(bundle)
    }

    /// The bundle and controller in scope, both of which must be registered.
    fn scoped_controller(&self) -> Result<(&str, &str), Error> {
        let bundle = self.scoped_bundle()?;
        let controller = self
            .controller
            .as_deref()
            .ok_or(Error::MissingScope(ScopeLevel::Controller))?;
        if !self.assignments.tree.has_controller(bundle, controller) {
            return Err(Error::UnknownScope {
                level: ScopeLevel::Controller,
                name: controller.to_owned(),
                within: bundle.to_owned(),
            });
        }
        Ok((bundle, controller))
    }
}
