//! Middleware registration: names, priorities and providers.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use crate::assignment::NameValidator;
use crate::error::Error;
use crate::provider::{Provider, ServiceContainer};

/// Where a middleware sits in the resolved order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Rank {
    priority: i32,
    /// Registration index; breaks ties between equal priorities.
    seq: usize,
}

/// Every registered middleware with its priority and provider.
///
/// Higher priority runs earlier. Equal priorities run in registration order,
/// so the resolved order only depends on the order middlewares were added.
#[derive(Debug)]
pub struct Registry<M> {
    ranks: HashMap<String, Rank>,
    container: ServiceContainer<M>,
}

impl<M> Registry<M> {
    pub fn new() -> Self {
        Self {
            ranks: HashMap::new(),
            container: ServiceContainer::new(),
        }
    }

    /// Registers `name` with the default priority of 0.
    pub fn register(&mut self, name: &str, provider: impl Provider<M>) -> Result<(), Error> {
        self.register_with_priority(name, provider, 0)
    }

    /// Registers `name`; higher `priority` runs earlier.
    pub fn register_with_priority(
        &mut self,
        name: &str,
        provider: impl Provider<M>,
        priority: i32,
    ) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidName(name.to_owned()));
        }
        if self.ranks.contains_key(name) {
            return Err(Error::DuplicateMiddleware(name.to_owned()));
        }

        let seq = self.ranks.len();
        self.ranks.insert(name.to_owned(), Rank { priority, seq });
        self.container.add(name, provider);
        debug!(middleware = name, priority, "middleware registered");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ranks.contains_key(name)
    }

    /// The priority `name` was registered with; 0 for unknown names.
    pub fn priority(&self, name: &str) -> i32 {
        self.ranks.get(name).map_or(0, |r| r.priority)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn container(&self) -> &ServiceContainer<M> {
        &self.container
    }

    /// Orders `names` by descending priority, then registration order.
    ///
    /// Names missing from the registry count as priority 0 and sort after
    /// every registered name of that priority, alphabetically.
    pub fn sort<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<String> {
        let mut names: Vec<&str> = names.into_iter().collect();
        names.sort_by_cached_key(|name| {
            let rank = self.ranks.get(*name);
            let priority = rank.map_or(0, |r| r.priority);
            let seq = rank.map_or(usize::MAX, |r| r.seq);
            (Reverse(priority), seq, *name)
        });
        names.into_iter().map(str::to_owned).collect()
    }
}

impl<M> NameValidator for Registry<M> {
    fn check(&self, middleware: &str) -> Result<(), Error> {
        if self.contains(middleware) {
            Ok(())
        } else {
            Err(Error::UnknownMiddleware(middleware.to_owned()))
        }
    }
}

impl<M> Default for Registry<M> {
    fn default() -> Self { Self::new() }
}
