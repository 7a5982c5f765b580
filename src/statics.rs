//! Static file collaborator.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::response::ContentType;

/// Where the dispatcher sends paths no controller handles.
pub trait StaticFiles: Send + Sync + 'static {
    fn exists(&self, path: &str) -> bool;

    /// Writes the file at `path` into the context's response.
    fn serve(&self, path: &str, ctx: &Context) -> Result<(), Error>;
}

/// Serves files from a directory on disk.
///
/// URL paths are resolved below `root`. Paths that try to climb out with
/// `..` never exist, and neither do directories.
#[derive(Debug, Clone)]
pub struct StaticDir {
    root: PathBuf,
}

impl StaticDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut full = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => full.push(segment),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(full)
    }
}

impl StaticFiles for StaticDir {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|file| file.is_file())
    }

    fn serve(&self, path: &str, ctx: &Context) -> Result<(), Error> {
        let file = self
            .resolve(path)
            .ok_or_else(|| Error::RouteNotFound { path: path.to_owned() })?;
        let body = fs::read(&file)?;
        debug!(file = %file.display(), bytes = body.len(), "serving static file");
        ctx.bytes(ContentType::from_path(&file), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::request::Request;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
        fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
        dir
    }

    #[test]
    fn files_exist_directories_do_not() {
        let dir = fixture();
        let statics = StaticDir::new(dir.path());
        assert!(statics.exists("/css/site.css"));
        assert!(statics.exists("/robots.txt"));
        assert!(!statics.exists("/css"));
        assert!(!statics.exists("/"));
        assert!(!statics.exists("/missing.js"));
    }

    #[test]
    fn parent_components_are_rejected() {
        let dir = fixture();
        let statics = StaticDir::new(dir.path().join("css"));
        assert!(!statics.exists("/../robots.txt"));
        assert!(statics.exists("/./site.css"));
    }

    #[test]
    fn serve_writes_body_and_type() {
        let dir = fixture();
        let statics = StaticDir::new(dir.path());
        let ctx = Context::new(Request::new(Method::GET, "/css/site.css".parse().unwrap()));

        statics.serve("/css/site.css", &ctx).unwrap();

        let res = ctx.finish();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.header("content-type"), Some("text/css; charset=utf-8"));
        assert_eq!(res.text(), "body{}");
    }
}
