//! Application assembly: middleware, routes, hooks and static files.

use std::any::TypeId;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedController, Controller, ErasedController, Injectable};
use crate::logging::{RequestLogger, TracingLogger};
use crate::middleware::Registry;
use crate::router::{RouteResolver, Router};
use crate::statics::{StaticDir, StaticFiles};

/// Paths that always go to static serving, never to the router.
pub const SPECIAL_STATIC: [&str; 2] = ["/favicon.ico", "/robots.txt"];

/// Directory static files are served from unless configured otherwise.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// A fully assembled application, ready for [`Server::serve`](crate::Server::serve).
///
/// ```rust
/// use ela::{App, Config, Context, Router};
///
/// #[derive(Clone)]
/// struct Greeting(&'static str);
///
/// fn hello(ctx: Context, greeting: Greeting) {
///     ctx.text(greeting.0);
/// }
///
/// let config = Config::parse("[static]\nalias = assets\ndirectory = public");
/// let app = App::new()
///     .register(Greeting("hi"))
///     .with_config(&config)
///     .routes(Router::new().on("/", hello));
///
/// assert!(app.verify().is_ok());
/// ```
pub struct App {
    pub(crate) registry: Registry,
    pub(crate) router: Arc<dyn RouteResolver>,
    pub(crate) statics: Arc<dyn StaticFiles>,
    pub(crate) static_alias: Option<String>,
    pub(crate) special_static: Vec<String>,
    pub(crate) before: Option<BoxedController>,
    pub(crate) after: Option<BoxedController>,
    pub(crate) logger: Arc<dyn RequestLogger>,
}

impl App {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            router: Arc::new(Router::new()),
            statics: Arc::new(StaticDir::new(DEFAULT_STATIC_DIR)),
            static_alias: None,
            special_static: SPECIAL_STATIC.iter().map(|p| (*p).to_owned()).collect(),
            before: None,
            after: None,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Registers a middleware value. Later values of the same type shadow
    /// earlier ones.
    pub fn register<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.registry.register(value);
        self
    }

    /// Builds a middleware value by injecting what is registered so far into
    /// `factory`, then registers the result. On failure the error is logged
    /// and nothing is registered.
    pub fn register_factory<Args, F>(self, factory: F) -> Self
    where
        F: Injectable<Args>,
        F::Output: Send + Sync + 'static,
    {
        self.registry.register_factory(factory).ok();
        self
    }

    /// Runs before every chain whose route did not opt out of hooks.
    pub fn before<Args>(mut self, controller: impl Controller<Args>) -> Self {
        self.before = Some(controller.into_boxed_controller());
        self
    }

    /// Runs after every chain whose route did not opt out of hooks.
    pub fn after<Args>(mut self, controller: impl Controller<Args>) -> Self {
        self.after = Some(controller.into_boxed_controller());
        self
    }

    pub fn routes(mut self, resolver: impl RouteResolver) -> Self {
        self.router = Arc::new(resolver);
        self
    }

    pub fn static_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.statics = Arc::new(StaticDir::new(dir));
        self
    }

    /// Replaces the static file collaborator entirely.
    pub fn static_files(mut self, statics: impl StaticFiles) -> Self {
        self.statics = Arc::new(statics);
        self
    }

    /// URL prefix that maps onto the static directory: with alias `assets`,
    /// `/assets/app.js` serves `<static dir>/app.js`.
    pub fn static_alias(mut self, alias: impl AsRef<str>) -> Self {
        let alias = alias.as_ref().trim_matches('/');
        self.static_alias = (!alias.is_empty()).then(|| format!("/{alias}"));
        self
    }

    /// Adds a path that always bypasses the router.
    pub fn special_static(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.special_static.contains(&path) {
            self.special_static.push(path);
        }
        self
    }

    pub fn logger(mut self, logger: impl RequestLogger) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Reads `[static] directory` and `[static] alias`.
    pub fn with_config(self, config: &Config) -> Self {
        let app = self.static_dir(config.get_string_or("static", "directory", DEFAULT_STATIC_DIR));
        match config.get_string("static", "alias") {
            Ok(alias) => app.static_alias(alias),
            Err(_) => app,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Checks that every controller's parameters can be satisfied by the
    /// registry plus the request [`Context`].
    pub fn verify(&self) -> Result<(), Error> {
        let scope = self.registry.snapshot();
        let controllers = self
            .router
            .controllers()
            .into_iter()
            .chain(self.before.iter().cloned())
            .chain(self.after.iter().cloned());

        let mut checked = 0usize;
        for controller in controllers {
            for dep in controller.dependencies() {
                if dep.type_id != TypeId::of::<Context>() && !scope.provides(dep.type_id) {
                    error!(controller = controller.name(), dependency = dep.type_name, "unresolved dependency");
                    return Err(Error::UnresolvedDependency { type_name: dep.type_name });
                }
            }
            checked += 1;
        }
        info!(controllers = checked, middleware = scope.len(), "dependencies verified");
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Chain;

    #[derive(Clone)]
    struct Db;

    fn needs_db(_: Context, _: Db) {}

    #[test]
    fn alias_is_normalized() {
        assert_eq!(App::new().static_alias("/assets/").static_alias.as_deref(), Some("/assets"));
        assert_eq!(App::new().static_alias("").static_alias, None);
    }

    #[test]
    fn config_sets_alias_only_when_present() {
        let app = App::new().with_config(&Config::parse("[static]\ndirectory = public"));
        assert_eq!(app.static_alias, None);

        let app = App::new().with_config(&Config::parse("[static]\nalias = \"assets\""));
        assert_eq!(app.static_alias.as_deref(), Some("/assets"));
    }

    #[test]
    fn special_static_has_defaults_without_duplicates() {
        let app = App::new().special_static("/robots.txt").special_static("/humans.txt");
        assert_eq!(app.special_static, ["/favicon.ico", "/robots.txt", "/humans.txt"]);
    }

    #[test]
    fn verify_fails_fast_on_missing_middleware() {
        let app = App::new().routes(Router::new().on("/", needs_db));
        assert!(matches!(app.verify(), Err(Error::UnresolvedDependency { .. })));

        let app = App::new().register(Db).routes(Router::new().on("/", needs_db));
        assert!(app.verify().is_ok());
    }

    #[test]
    fn verify_covers_hooks() {
        let app = App::new()
            .routes(Router::new().chain("/", Chain::new()))
            .after(needs_db);
        assert!(app.verify().is_err());
    }

    #[test]
    fn failed_factory_leaves_registry_untouched() {
        let app = App::new().register_factory(|db: Db| db);
        assert!(app.registry().is_empty());
    }
}
