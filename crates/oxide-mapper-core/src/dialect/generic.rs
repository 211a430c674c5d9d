//! Generic ANSI adapter.

use super::{AdapterKind, SqlAdapter};

/// An adapter using the shared ANSI composition.
///
/// It has no generated-value retrieval: generated fields keep whatever the
/// entity held and a write succeeds when it affects at least one row. Pages
/// are cut with bound `LIMIT` and `OFFSET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericAdapter;

impl GenericAdapter {
    /// Creates a new generic adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for GenericAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Generic
    }
}
