//! Message catalogs, one INI file per language.
//!
//! A locale directory holds one `.ini` file per language, named after it:
//!
//! ```text
//! etc/locale/
//!   en_US.ini     hello = Hello
//!   zh_CN.ini     hello = 你好
//!                 [menu]
//!                 quit = 退出
//! ```
//!
//! Catalogs are read with [`Config`], so `[sections]` group messages and keys
//! above the first section live in [`ROOT_SECTION`]. Register the catalogs
//! as middleware and inject them into controllers:
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ela::i18n::{I18n, init_i18n_module};
//! use ela::{App, Context, Router};
//!
//! fn greet(ctx: Context, mut i18n: I18n) {
//!     i18n.set_lang(ctx.param("lang").unwrap_or_default());
//!     ctx.text(i18n.tr("hello"));
//! }
//!
//! let app = App::new()
//!     .register_factory(init_i18n_module(Path::new("etc/locale")))
//!     .routes(Router::new().on("/:lang/hello", greet));
//! ```
//!
//! The injected value is a cheap clone, so `set_lang` on it only affects the
//! current request.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, ROOT_SECTION};
use crate::error::Error;

const CATALOG_EXTENSION: &str = "ini";

/// Loaded catalogs plus the language `tr` reads from.
#[derive(Debug, Clone, Default)]
pub struct I18n {
    catalogs: Arc<HashMap<String, Config>>,
    lang: String,
}

impl I18n {
    /// Loads every catalog in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let mut i18n = Self::empty();
        i18n.load(dir)?;
        Ok(i18n)
    }

    /// No catalogs and no language; every lookup returns its key.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds the catalogs found in `dir`. A language that is already loaded
    /// is replaced by the file from `dir`.
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<(), Error> {
        let dir = dir.as_ref();
        let mut catalogs = HashMap::clone(&self.catalogs);

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != CATALOG_EXTENSION) {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let catalog = Config::load(&path)?;
            for warning in catalog.warnings() {
                warn!(file = %path.display(), "{warning}");
            }
            debug!(lang, file = %path.display(), "catalog loaded");
            catalogs.insert(lang.to_owned(), catalog);
        }

        self.catalogs = Arc::new(catalogs);
        Ok(())
    }

    pub fn set_lang(&mut self, lang: impl Into<String>) {
        self.lang = lang.into();
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn has_lang(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }

    /// Loaded languages, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// `key` from the root section of the current language.
    pub fn tr(&self, key: &str) -> String {
        self.tr_in(ROOT_SECTION, key)
    }

    /// `key` from `section` of the current language, or `key` itself when
    /// there is no such message.
    pub fn tr_in(&self, section: &str, key: &str) -> String {
        self.catalogs
            .get(&self.lang)
            .and_then(|catalog| catalog.get(section, key).ok())
            .map_or_else(|| key.to_owned(), ToString::to_string)
    }
}

/// A factory for [`App::register_factory`](crate::App::register_factory)
/// that loads the catalogs in `dir` once, at registration.
///
/// An unreadable directory is logged and yields [`I18n::empty`], so
/// controllers asking for `I18n` still resolve.
pub fn init_i18n_module(dir: &Path) -> impl Fn() -> I18n + Send + Sync + use<> {
    let dir = dir.to_path_buf();
    move || {
        I18n::new(&dir).unwrap_or_else(|e| {
            warn!(dir = %dir.display(), error = %e, "locale directory could not be loaded");
            I18n::empty()
        })
    }
}
