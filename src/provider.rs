//! Middleware providers and the instantiation seam.
//!
//! gatekeep only decides *which* middlewares run and in what order. Turning a
//! name into a middleware object is the job of whatever service container the
//! application already has; [`Instantiate`] is the contract it has to meet.
//! [`ServiceContainer`] is a minimal name → provider map for applications that
//! have nothing better.
//!
//! ```text
//! Registry::register("auth", provider)      ← startup
//!        ↓  stored as BoxedProvider<M>
//! Resolver::resolve_instances(route)        ← request time
//!        ↓  resolve(route) → ["auth", …]
//! container.instantiate("auth")             ← one provider call per name
//! ```

use std::collections::HashMap;
use std::fmt;

/// Produces a fresh middleware value on every call.
///
/// Implemented for every `Fn() -> M + Send + Sync + 'static`. Use [`shared`]
/// to hand out clones of a single value instead.
pub trait Provider<M>: Send + Sync + 'static {
    fn provide(&self) -> M;
}

impl<F, M> Provider<M> for F
where
    F: Fn() -> M + Send + Sync + 'static,
{
    fn provide(&self) -> M {
        self()
    }
}

/// A type-erased provider.
pub type BoxedProvider<M> = Box<dyn Provider<M>>;

/// A provider that returns a clone of `value` each time.
pub fn shared<M>(value: M) -> impl Provider<M>
where
    M: Clone + Send + Sync + 'static,
{
    move || value.clone()
}

/// The instantiation layer: materializes a middleware from its registered
/// name. Returns `None` when the name is unknown to the container.
pub trait Instantiate {
    type Output;

    fn instantiate(&self, name: &str) -> Option<Self::Output>;
}

/// A minimal name → provider container.
pub struct ServiceContainer<M> {
    providers: HashMap<String, BoxedProvider<M>>,
}

impl<M> ServiceContainer<M> {
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    /// Stores `provider` under `name`, replacing any previous one.
    pub fn add(&mut self, name: &str, provider: impl Provider<M>) {
        self.providers.insert(name.to_owned(), Box::new(provider));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<M: 'static> Instantiate for ServiceContainer<M> {
    type Output = M;

    fn instantiate(&self, name: &str) -> Option<M> {
        self.providers.get(name).map(|p| p.provide())
    }
}

impl<M> Default for ServiceContainer<M> {
    fn default() -> Self { Self::new() }
}

impl<M> fmt::Debug for ServiceContainer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ServiceContainer").field("providers", &names).finish()
    }
}
