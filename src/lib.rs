//! # gatekeep
//!
//! Route-scoped middleware assignment for applications whose routes are laid
//! out as `bundle → controller → action`.
//!
//! gatekeep does not run middleware and does not dispatch requests. It answers
//! one question at request time: for this route, which middlewares run, and in
//! what order?
//!
//! ## Lifecycle
//!
//! - **Build** — register controllers and middlewares on a [`Builder`], then
//!   attach middlewares to routes with `all_*` / `only_*` / `except_*`
//!   operators at bundle, controller or action level.
//! - **Freeze** — [`Builder::freeze`] ends configuration. The resulting
//!   [`Resolver`] is read-only and `Send + Sync`.
//! - **Resolve** — [`Resolver::resolve`] returns the middleware names for a
//!   route, highest priority first, equal priorities in registration order.
//!   Each route is resolved once and cached.
//!
//! Configuration mistakes (unknown bundle, unregistered middleware, …) come
//! back as [`Error`]s. Whether they are fatal is up to the application.
//!
//! ## Quick start
//!
//! ```rust
//! use gatekeep::Builder;
//!
//! # fn main() -> Result<(), gatekeep::Error> {
//! let mut builder: Builder<&'static str> = Builder::new();
//! builder
//!     .register_controller("admin", "users", ["list", "create", "delete"])?
//!     .register_controller("blog", "posts", ["show"])?
//!     .register_middleware_with_priority("cors", || "cors", 10)?
//!     .register_middleware("auth", || "auth")?;
//!
//! builder.select("cors")?.all_bundles();
//! builder.scope("admin", "users").select("auth")?.except_actions(["list"])?;
//!
//! let resolver = builder.freeze();
//! assert_eq!(&*resolver.resolve_path("admin.users.delete")?, ["cors", "auth"]);
//! assert_eq!(&*resolver.resolve_path("admin.users.list")?, ["cors"]);
//! # Ok(())
//! # }
//! ```

mod assignment;
mod builder;
mod error;
mod registry;
mod report;
mod resolver;
mod route;

pub mod provider;

pub use assignment::{Assignments, NameValidator, Selection, Session};
pub use builder::Builder;
pub use error::{Error, ScopeLevel};
pub use provider::{Instantiate, Provider, ServiceContainer};
pub use registry::Registry;
pub use report::Report;
pub use resolver::Resolver;
pub use route::{RouteKey, RouteTree};
