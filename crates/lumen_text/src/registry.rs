//! Font registry with system-default fallback
//!
//! Uses fontdb to discover a system sans-serif face so that a failed
//! application font load can degrade to a visible default instead of blank
//! text. The fallback is resolved once and cached; if neither the requested
//! font nor the default can be loaded, text rendering is impossible and the
//! error is surfaced.

use crate::font::Font;
use crate::{Result, TextError};
use fontdb::{Database, Family, Query, Source};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Resource-loading policy applied when a font fails to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontPolicy {
    /// Propagate load errors to the caller
    #[default]
    Strict,
    /// Log a warning and substitute the system default font
    Fallback,
}

/// Discovers and caches fonts
pub struct FontRegistry {
    db: Database,
    policy: FontPolicy,
    default_font: Option<Arc<Font>>,
    /// Failed family lookups, cached so the warning fires once per family
    failed: FxHashSet<String>,
}

impl FontRegistry {
    pub fn new(policy: FontPolicy) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!("font database loaded: {} faces", db.len());
        Self {
            db,
            policy,
            default_font: None,
            failed: FxHashSet::default(),
        }
    }

    pub fn policy(&self) -> FontPolicy {
        self.policy
    }

    /// Load a font from raw bytes, applying the fallback policy on failure
    pub fn load_bytes(&mut self, data: Vec<u8>) -> Result<Arc<Font>> {
        match Font::from_bytes(data, 0) {
            Ok(font) => Ok(Arc::new(font)),
            Err(e) => self.fall_back("<bytes>", e),
        }
    }

    /// Load a font from a file path, applying the fallback policy on failure
    pub fn load_file(&mut self, path: &std::path::Path) -> Result<Arc<Font>> {
        match Font::from_file(path) {
            Ok(font) => Ok(Arc::new(font)),
            Err(e) => self.fall_back(&path.display().to_string(), e),
        }
    }

    /// Load a font by system family name, applying the fallback policy when
    /// the family is missing
    pub fn load_family(&mut self, name: &str) -> Result<Arc<Font>> {
        match self.query(&[Family::Name(name)]) {
            Ok(font) => Ok(font),
            Err(e) => {
                if self.failed.insert(name.to_string()) {
                    tracing::warn!("font family '{}' not found: {}", name, e);
                }
                self.fall_back(name, e)
            }
        }
    }

    /// The system default sans-serif font, resolved once.
    ///
    /// When even this fails the renderer cannot draw text at all, which is
    /// surfaced as an explicit error rather than blank output.
    pub fn default_font(&mut self) -> Result<Arc<Font>> {
        if let Some(font) = &self.default_font {
            return Ok(font.clone());
        }
        let font = self.query(&[Family::SansSerif, Family::Serif])?;
        self.default_font = Some(font.clone());
        Ok(font)
    }

    fn fall_back(&mut self, what: &str, err: TextError) -> Result<Arc<Font>> {
        match self.policy {
            FontPolicy::Strict => Err(err),
            FontPolicy::Fallback => {
                tracing::warn!("falling back to default font for '{}': {}", what, err);
                self.default_font().map_err(|fallback_err| {
                    TextError::FontLoadError(format!(
                        "'{}' failed ({}) and no default font is available ({})",
                        what, err, fallback_err
                    ))
                })
            }
        }
    }

    fn query(&self, families: &[Family]) -> Result<Arc<Font>> {
        let query = Query {
            families,
            ..Query::default()
        };
        let id = self
            .db
            .query(&query)
            .ok_or_else(|| TextError::FontLoadError(format!("no face matches {:?}", families)))?;

        let face = self
            .db
            .face(id)
            .ok_or_else(|| TextError::FontLoadError("face disappeared from database".into()))?;
        let index = face.index;

        let data = match &face.source {
            Source::Binary(data) => data.as_ref().as_ref().to_vec(),
            Source::File(path) => std::fs::read(path)
                .map_err(|e| TextError::FontLoadError(format!("{}: {}", path.display(), e)))?,
            Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
        };

        Font::from_bytes(data, index).map(Arc::new)
    }
}
