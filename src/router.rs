//! Radix-tree route table.
//!
//! Maps a path to an ordered chain of controllers. Lookup is by path only;
//! controllers inspect the method themselves when they care. O(path-length)
//! via [`matchit`].

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedController, Controller};

/// What the dispatcher gets back for a path.
pub struct Resolution {
    pub chain: Arc<[BoxedController]>,
    pub params: HashMap<String, String>,
    /// Whether the global before/after hooks apply to this route.
    pub with_hooks: bool,
}

impl Resolution {
    /// For custom [`RouteResolver`]s: a resolution running `chain` with the
    /// given path parameters.
    pub fn new(chain: Chain, params: HashMap<String, String>) -> Self {
        Self { chain: Arc::from(chain.controllers), params, with_hooks: chain.with_hooks }
    }
}

/// The seam between the dispatcher and any route table.
pub trait RouteResolver: Send + Sync + 'static {
    /// `None`, or a resolution with an empty chain, sends the dispatcher to
    /// static file serving.
    fn resolve(&self, path: &str) -> Option<Resolution>;

    /// Every controller reachable through this resolver, for startup
    /// dependency checks. Resolvers that cannot enumerate return nothing.
    fn controllers(&self) -> Vec<BoxedController> {
        Vec::new()
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of controllers bound to one route.
///
/// ```rust
/// use ela::{Chain, Context};
///
/// fn auth(ctx: Context) { ctx.set_data("user", 1u64); }
/// fn show(ctx: Context) { ctx.text("hello"); }
///
/// let chain = Chain::new().then(auth).then(show).skip_hooks();
/// assert_eq!(chain.len(), 2);
/// ```
pub struct Chain {
    controllers: Vec<BoxedController>,
    with_hooks: bool,
}

impl Chain {
    pub fn new() -> Self {
        Self { controllers: Vec::new(), with_hooks: true }
    }

    pub fn then<Args>(mut self, controller: impl Controller<Args>) -> Self {
        self.controllers.push(controller.into_boxed_controller());
        self
    }

    /// Opts this route out of the global before/after hooks.
    pub fn skip_hooks(mut self) -> Self {
        self.with_hooks = false;
        self
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self { Self::new() }
}

// ── Router ────────────────────────────────────────────────────────────────────

struct Route {
    chain: Arc<[BoxedController]>,
    with_hooks: bool,
}

/// The application route table. Build it once at startup and hand it to
/// [`App::routes`](crate::App::routes).
///
/// Path parameters use `:name` or `{name}`; a trailing `*name` or `{*name}`
/// captures the rest of the path.
pub struct Router {
    tree: MatchitRouter<Route>,
    chains: Vec<Arc<[BoxedController]>>,
}

impl Router {
    pub fn new() -> Self {
        Self { tree: MatchitRouter::new(), chains: Vec::new() }
    }

    /// Binds a single controller to `path`. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use ela::{Context, Router};
    /// # fn show_user(_: Context) {}
    /// # fn list_users(_: Context) {}
    /// Router::new()
    ///     .on("/users/:id", show_user)
    ///     .on("/users",     list_users);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or conflicts with an existing one.
    pub fn on<Args>(self, path: &str, controller: impl Controller<Args>) -> Self {
        self.chain(path, Chain::new().then(controller))
    }

    /// Binds a controller chain to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or conflicts with an existing one.
    pub fn chain(mut self, path: &str, chain: Chain) -> Self {
        let pattern = normalize_pattern(path);
        let controllers: Arc<[BoxedController]> = Arc::from(chain.controllers);
        self.tree
            .insert(pattern, Route { chain: Arc::clone(&controllers), with_hooks: chain.with_hooks })
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self.chains.push(controllers);
        self
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl RouteResolver for Router {
    fn resolve(&self, path: &str) -> Option<Resolution> {
        let matched = self.tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some(Resolution {
            chain: Arc::clone(&matched.value.chain),
            params,
            with_hooks: matched.value.with_hooks,
        })
    }

    fn controllers(&self) -> Vec<BoxedController> {
        self.chains.iter().flat_map(|chain| chain.iter().cloned()).collect()
    }
}

/// Rewrites `:name` segments to matchit's `{name}` and `*name` to `{*name}`.
fn normalize_pattern(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
