//! Grid configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Rows per page when pagination is enabled.
    pub default_page_size: usize,

    /// Whether the pagination controller produces a range at all.
    pub pagination_enabled: bool,

    /// Page sizes offered to the user.
    pub page_size_options: Vec<usize>,

    /// When false, string predicates (`contains`, `startsWith`, `endsWith`)
    /// ignore case unless a condition says otherwise.
    pub case_sensitive_filters: bool,

    /// 1-based page shown before any navigation.
    pub initial_page: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            pagination_enabled: false,
            page_size_options: vec![10, 20, 50, 100],
            case_sensitive_filters: false,
            initial_page: 1,
        }
    }
}

impl GridConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABULA_PAGE_SIZE`: rows per page
    /// - `TABULA_PAGINATION`: `true`/`false`
    /// - `TABULA_CASE_SENSITIVE`: `true`/`false`
    /// - `TABULA_INITIAL_PAGE`: 1-based start page
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABULA_PAGE_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.default_page_size = v;
            }
        }

        if let Ok(s) = std::env::var("TABULA_PAGINATION") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.pagination_enabled = v;
            }
        }

        if let Ok(s) = std::env::var("TABULA_CASE_SENSITIVE") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.case_sensitive_filters = v;
            }
        }

        if let Ok(s) = std::env::var("TABULA_INITIAL_PAGE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.initial_page = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::Config("default_page_size must be > 0".into()));
        }
        if self.page_size_options.contains(&0) {
            return Err(Error::Config("page_size_options must not contain 0".into()));
        }
        if self.initial_page == 0 {
            return Err(Error::Config("initial_page is 1-based".into()));
        }
        Ok(())
    }
}
