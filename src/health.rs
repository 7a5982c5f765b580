//! Built-in health-check controllers.
//!
//! | Probe | Usual path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it serve traffic? |
//!
//! ```rust
//! use ela::{Chain, Router, health};
//!
//! let routes = Router::new()
//!     .chain("/healthz", Chain::new().then(health::liveness).skip_hooks())
//!     .chain("/readyz", Chain::new().then(health::readiness).skip_hooks());
//! ```
//!
//! Replace `readiness` with your own controller when readiness depends on
//! middleware, e.g. a database pool:
//!
//! ```rust
//! use ela::{Context, StatusCode};
//!
//! #[derive(Clone)]
//! struct Pool;
//! impl Pool { fn is_healthy(&self) -> bool { true } }
//!
//! fn readiness(ctx: Context, pool: Pool) {
//!     if !pool.is_healthy() {
//!         ctx.set_status(StatusCode::SERVICE_UNAVAILABLE);
//!     }
//!     ctx.text("ready");
//! }
//! ```

use crate::Context;

/// Always answers `200 ok`.
pub fn liveness(ctx: Context) {
    ctx.text("ok");
}

/// Answers `200 ready`.
pub fn readiness(ctx: Context) {
    ctx.text("ready");
}
