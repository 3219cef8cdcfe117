//! Ephemeral per-query resolution state.
//!
//! Carries the contextual type stack (object and array literals, call
//! arguments, and assignment targets are typed against an expected type
//! established by their surroundings) and the provisional machinery:
//! while a speculative frame is open, diagnostics are buffered and either
//! committed when the explored path is accepted or discarded when it is
//! rejected, so trying an overload candidate never leaves errors in the
//! permanent record.

use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::symbols::SymbolId;

#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Innermost contextual type last.
    contextual_types: Vec<SymbolId>,
    /// One buffer per open provisional frame, innermost last.
    provisional: Vec<Vec<Diagnostic>>,
    /// Whether name lookup is in a type position (annotations, heritage).
    pub in_type_position: bool,
    /// Editor point-queries resolve aggressively but must not record
    /// diagnostics; symbol caching still commits (identity-stable
    /// repeated queries).
    pub quiet: bool,
}

impl ResolutionContext {
    pub fn new() -> ResolutionContext {
        ResolutionContext::default()
    }

    // -------------------------------------------------------------------------
    // Contextual types
    // -------------------------------------------------------------------------

    pub fn push_contextual_type(&mut self, ty: SymbolId) {
        self.contextual_types.push(ty);
    }

    pub fn pop_contextual_type(&mut self) -> Option<SymbolId> {
        self.contextual_types.pop()
    }

    /// The innermost contextual type, if any.
    pub fn contextual_type(&self) -> Option<SymbolId> {
        self.contextual_types.last().copied()
    }

    // -------------------------------------------------------------------------
    // Provisional frames
    // -------------------------------------------------------------------------

    pub fn is_provisional(&self) -> bool {
        !self.provisional.is_empty()
    }

    /// Open a speculative frame; diagnostics buffer until it closes.
    pub fn start_provisional(&mut self) {
        self.provisional.push(Vec::new());
    }

    /// Close the innermost frame, discarding everything it buffered.
    pub fn rollback_provisional(&mut self) {
        let discarded = self.provisional.pop();
        debug_assert!(discarded.is_some(), "rollback without open frame");
    }

    /// Close the innermost frame, keeping its diagnostics: they move to
    /// the enclosing frame, or into `sink` when this was the outermost.
    pub fn commit_provisional(&mut self, sink: &mut DiagnosticBag) {
        let committed = self.provisional.pop().unwrap_or_default();
        match self.provisional.last_mut() {
            Some(outer) => outer.extend(committed),
            None => sink.extend(committed),
        }
    }

    /// Report a diagnostic: dropped when quiet, buffered while
    /// provisional, straight into `sink` otherwise.
    pub fn report(&mut self, diagnostic: Diagnostic, sink: &mut DiagnosticBag) {
        if self.quiet {
            return;
        }
        match self.provisional.last_mut() {
            Some(buffer) => buffer.push(diagnostic),
            None => sink.add(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn diag(code: u32) -> Diagnostic {
        Diagnostic::error("u.ts", Span::new(0, 1), "x", code)
    }

    #[test]
    fn test_contextual_stack_order() {
        let mut ctx = ResolutionContext::new();
        ctx.push_contextual_type(SymbolId(1));
        ctx.push_contextual_type(SymbolId(2));
        assert_eq!(ctx.contextual_type(), Some(SymbolId(2)));
        ctx.pop_contextual_type();
        assert_eq!(ctx.contextual_type(), Some(SymbolId(1)));
    }

    #[test]
    fn test_rollback_discards_buffered() {
        let mut ctx = ResolutionContext::new();
        let mut sink = DiagnosticBag::new();
        ctx.start_provisional();
        ctx.report(diag(2304), &mut sink);
        ctx.rollback_provisional();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_commit_flushes_to_sink() {
        let mut ctx = ResolutionContext::new();
        let mut sink = DiagnosticBag::new();
        ctx.start_provisional();
        ctx.report(diag(2304), &mut sink);
        ctx.commit_provisional(&mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_nested_commit_into_outer_frame() {
        let mut ctx = ResolutionContext::new();
        let mut sink = DiagnosticBag::new();
        ctx.start_provisional();
        ctx.start_provisional();
        ctx.report(diag(2345), &mut sink);
        ctx.commit_provisional(&mut sink);
        // Still buffered in the outer frame.
        assert!(sink.is_empty());
        ctx.rollback_provisional();
        assert!(sink.is_empty());
    }
}
