//! The three-level route tree and fully-qualified route keys.
//!
//! A route is addressed by `bundle.controller.action`. The tree is built from
//! ordered maps so that every listing derived from it (complements, reports,
//! iteration over all routes) comes out the same on every run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A fully-qualified route: one action of one controller of one bundle.
///
/// Displays and parses as `bundle.controller.action`. Segments never contain
/// `.`, so the dotted form identifies exactly one triple.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RouteKey {
    bundle: String,
    controller: String,
    action: String,
}

impl RouteKey {
    /// Builds a key, rejecting empty segments and segments containing `.`.
    pub fn new(
        bundle: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Result<Self, Error> {
        let key = Self::unchecked(bundle.into(), controller.into(), action.into());
        validate_name(&key.bundle)?;
        validate_name(&key.controller)?;
        validate_name(&key.action)?;
        Ok(key)
    }

    /// Segments come from the tree, which only holds validated names.
    pub(crate) fn unchecked(bundle: String, controller: String, action: String) -> Self {
        Self { bundle, controller, action }
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.bundle, self.controller, self.action)
    }
}

/// Parses `bundle.controller.action`. Exactly three non-empty segments.
impl FromStr for RouteKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidRouteKey(s.to_owned());
        let mut parts = s.split('.');
        let (Some(bundle), Some(controller), Some(action), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Self::new(bundle, controller, action).map_err(|_| invalid())
    }
}

/// Rejects names that would make the dotted route form ambiguous.
pub(crate) fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains('.') {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// bundle → controller → actions.
#[derive(Clone, Debug, Default)]
pub struct RouteTree {
    bundles: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the action set of `bundle.controller`.
    ///
    /// All names are validated before the tree is touched.
    pub fn insert<I, S>(&mut self, bundle: &str, controller: &str, actions: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_name(bundle)?;
        validate_name(controller)?;
        let actions = actions
            .into_iter()
            .map(Into::into)
            .map(|a: String| validate_name(&a).map(|()| a))
            .collect::<Result<BTreeSet<_>, _>>()?;

        self.bundles
            .entry(bundle.to_owned())
            .or_default()
            .insert(controller.to_owned(), actions);
        Ok(())
    }

    pub fn has_bundle(&self, bundle: &str) -> bool {
        self.bundles.contains_key(bundle)
    }

    pub fn has_controller(&self, bundle: &str, controller: &str) -> bool {
        self.controllers_of(bundle)
            .is_some_and(|controllers| controllers.contains_key(controller))
    }

    pub fn has_action(&self, bundle: &str, controller: &str, action: &str) -> bool {
        self.actions_of(bundle, controller)
            .is_some_and(|actions| actions.contains(action))
    }

    pub fn bundles(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn controllers(&self, bundle: &str) -> impl Iterator<Item = &str> {
        self.controllers_of(bundle)
            .into_iter()
            .flat_map(|controllers| controllers.keys().map(String::as_str))
    }

    pub fn actions(&self, bundle: &str, controller: &str) -> impl Iterator<Item = &str> {
        self.actions_of(bundle, controller)
            .into_iter()
            .flat_map(|actions| actions.iter().map(String::as_str))
    }

    /// Every registered route, ordered by bundle, controller, action.
    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.bundles.iter().flat_map(|(bundle, controllers)| {
            controllers.iter().flat_map(move |(controller, actions)| {
                actions.iter().map(move |action| {
                    RouteKey::unchecked(bundle.clone(), controller.clone(), action.clone())
                })
            })
        })
    }

    pub fn contains(&self, key: &RouteKey) -> bool {
        self.has_action(key.bundle(), key.controller(), key.action())
    }

    pub fn len(&self) -> usize {
        self.bundles
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn controllers_of(&self, bundle: &str) -> Option<&BTreeMap<String, BTreeSet<String>>> {
        self.bundles.get(bundle)
    }

    fn actions_of(&self, bundle: &str, controller: &str) -> Option<&BTreeSet<String>> {
        self.controllers_of(bundle)?.get(controller)
    }
}
