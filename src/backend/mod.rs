//! DOM-parsing backends and the ordered fallback chain.
//!
//! Pages are parsed by the first backend in the chain that succeeds. The
//! default chain tries html5ever and falls back to a lenient quick-xml
//! reader, which also covers builds compiled without the `html5ever`
//! feature. Both backends produce the same tree shape: a document holding
//! `html`, which holds `head` and `body`.

mod html5;
mod xml;

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::dom::ArenaDom;
use crate::error::{Error, Result};

pub use html5::Html5everBackend;
pub use xml::XmlBackend;

/// A capability that turns HTML text into an [`ArenaDom`].
pub trait ParseBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Parse a complete document.
    fn parse(&self, html: &str) -> Result<ArenaDom>;
}

/// Built-in backends, selectable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BackendKind {
    Html5ever,
    Xml,
}

impl BackendKind {
    fn instantiate(self) -> Arc<dyn ParseBackend> {
        match self {
            BackendKind::Html5ever => Arc::new(Html5everBackend),
            BackendKind::Xml => Arc::new(XmlBackend),
        }
    }
}

/// Ordered list of parsing backends. First success wins.
#[derive(Clone)]
pub struct BackendChain {
    backends: Vec<Arc<dyn ParseBackend>>,
}

impl BackendChain {
    /// An empty chain. Parsing with it always fails.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Build a chain from built-in backend kinds, in the given order.
    pub fn from_kinds(kinds: &[BackendKind]) -> Self {
        Self {
            backends: kinds.iter().map(|k| k.instantiate()).collect(),
        }
    }

    /// Append a backend to the end of the chain.
    pub fn with_backend(mut self, backend: impl ParseBackend + 'static) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Backend names in the order they are tried.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Parse with each backend in turn until one succeeds.
    pub fn parse(&self, html: &str) -> Result<ArenaDom> {
        let mut failures = Vec::new();

        for (i, backend) in self.backends.iter().enumerate() {
            match backend.parse(html) {
                Ok(dom) => return Ok(dom),
                Err(e) => {
                    let next = self.backends.get(i + 1).map(|b| b.name());
                    info!(
                        backend = backend.name(),
                        error = %e,
                        next = next.unwrap_or("none"),
                        "parsing backend failed"
                    );
                    failures.push(format!("{}: {e}", backend.name()));
                }
            }
        }

        if failures.is_empty() {
            return Err(Error::NoBackend("chain is empty".to_string()));
        }
        Err(Error::NoBackend(failures.join("; ")))
    }
}

impl Default for BackendChain {
    fn default() -> Self {
        Self::from_kinds(&[BackendKind::Html5ever, BackendKind::Xml])
    }
}

impl fmt::Debug for BackendChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
