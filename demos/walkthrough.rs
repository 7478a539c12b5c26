//! Configures the admin / I18n example and prints the resolved middleware map.
//!
//! ```text
//! cargo run --example walkthrough
//! ```

use gatekeep::{Builder, Error};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut builder: Builder<&'static str> = Builder::new();
    builder
        .register_controller("admin", "adminController", ["login", "logout", "register"])?
        .register_controller("I18n", "i18nController", ["setLanguage"])?
        .register_middleware("login", || "login")?
        .register_middleware("logout", || "logout")?
        .register_middleware("register", || "register")?
        .register_middleware("I18n", || "I18n")?;

    let mut admin = builder.scope("admin", "adminController");
    admin.select("login")?.all_bundles().except_actions(["logout", "register"])?;
    admin.select("logout")?.only_actions(["logout"])?;
    admin.select("register")?.only_actions(["register"])?;

    builder
        .scope("I18n", "i18nController")
        .select("I18n")?
        .only_controllers(["i18nController"])?;

    let resolver = builder.freeze();
    print!("{}", resolver.report());
    Ok(())
}
