//! # ela
//!
//! A minimal HTTP runtime: routes map paths to chains of plain functions,
//! and every function parameter is filled by type from registered middleware
//! and the per-request [`Context`].
//!
//! ## The request pipeline
//!
//! 1. A fresh [`Context`] is created and put in the request's injection scope.
//! 2. `/favicon.ico` and `/robots.txt` go straight to static files.
//! 3. Paths under the static alias go to static files.
//! 4. Otherwise the [`Router`] is asked for a controller chain. No chain means
//!    static files, then 404.
//! 5. The before hook, the chain and the after hook run in order. Once a
//!    controller writes a body, the rest of the chain is skipped.
//! 6. A panic or an `Err` from any controller turns into a 500 page for that
//!    request alone.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ela::{App, Context, Router, Server};
//!
//! #[derive(Clone)]
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ela::Error> {
//!     let routes = Router::new()
//!         .on("/hello/:name", hello)
//!         .on("/users/:id", load_user);
//!
//!     let app = App::new()
//!         .register(Greeter { greeting: "Hello" })
//!         .before(stamp)
//!         .routes(routes);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! fn stamp(ctx: Context) {
//!     ctx.set_data("request_id", 7u64);
//! }
//!
//! fn hello(ctx: Context, greeter: Greeter) {
//!     let name = ctx.param("name").unwrap_or_default();
//!     ctx.text(format!("{}, {name}!", greeter.greeting));
//! }
//!
//! fn load_user(ctx: Context) -> Result<(), String> {
//!     let id: u64 = ctx.param("id").unwrap_or_default().parse().map_err(|_| "bad id".to_owned())?;
//!     ctx.json(format!(r#"{{"id":{id}}}"#));
//!     Ok(())
//! }
//! ```

mod app;
mod context;
mod dispatch;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod health;
pub mod i18n;
pub mod logging;
pub mod middleware;
pub mod statics;

pub use app::{App, DEFAULT_STATIC_DIR, SPECIAL_STATIC};
pub use config::Config;
pub use context::Context;
pub use dispatch::NOT_FOUND_BODY;
pub use error::Error;
pub use http::{Method, StatusCode};
pub use handler::{Controller, Dependency, Injectable, IntoOutcome};
pub use request::Request;
pub use response::{ContentType, Response, ResponseWriter};
pub use router::{Chain, Resolution, RouteResolver, Router};
pub use server::Server;
