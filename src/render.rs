//! Rendering hook for entity identifiers.
//!
//! The engine stores and returns raw 64-bit identifiers. When a listing
//! of group members is formatted for display, the identifiers pass
//! through this hook so the embedding platform can substitute mentions
//! or links. The hook is never consulted for membership decisions.

use crate::types::EntityKind;

/// Maps a raw entity identifier to a display string.
///
/// Implementors backed by a platform directory should degrade to the raw
/// id for `EntityKind::Server` when the server is unknown to them.
pub trait EntityRenderer: Send + Sync {
    /// Render a single identifier.
    fn render(&self, kind: EntityKind, id: u64) -> String;

    /// Render a batch of identifiers, preserving order.
    fn render_many(&self, kind: EntityKind, ids: &[u64]) -> Vec<String> {
        ids.iter().map(|&id| self.render(kind, id)).collect()
    }
}

/// Fallback renderer: plain decimal identifiers, no platform lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRenderer;

impl EntityRenderer for RawRenderer {
    fn render(&self, _kind: EntityKind, id: u64) -> String {
        id.to_string()
    }
}
