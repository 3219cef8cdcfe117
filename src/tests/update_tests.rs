//! Incremental update tests: rebinding, diff application, invalidation
//! propagation.

use crate::compiler::Compiler;
use crate::fixtures::test_compiler;
use crate::symbols::{LinkKind, ResolutionState, SymbolId};
use crate::syntax::{Node, NodeIndex};

fn global_value(compiler: &Compiler, name: &str) -> Option<SymbolId> {
    let atom = compiler.chain.interner.get(name)?;
    compiler.chain.global_value(atom)
}

fn symbol_state(compiler: &Compiler, symbol: SymbolId) -> ResolutionState {
    compiler
        .chain
        .symbols
        .get(symbol)
        .map(|s| s.state)
        .expect("symbol alive")
}

/// The call expression node of the unit's first expression statement.
fn first_call_node(compiler: &Compiler, path: &str) -> NodeIndex {
    let record = compiler.chain.get_unit(path).expect("record");
    let root = match record.syntax.arena.get(record.syntax.root) {
        Some(Node::SourceUnit(unit)) => unit.statements.clone(),
        _ => panic!("no source unit"),
    };
    for statement in root {
        if let Some(Node::ExpressionStatement(stmt)) = record.syntax.arena.get(statement) {
            return stmt.expression;
        }
    }
    panic!("no expression statement in {}", path);
}

fn two_unit_setup() -> Compiler {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u1.ts",
        "function f(x: number): number { return x; } function g(): void {}".to_string(),
        1,
        true,
        Vec::new(),
    );
    compiler.add_source_unit("u2.ts", "f(1);".to_string(), 1, true, Vec::new());
    compiler.pull_type_check();
    compiler
}

#[test]
fn test_pull_type_check_clean_program() {
    let mut compiler = two_unit_setup();
    assert!(compiler.get_semantic_diagnostics("u1.ts").is_empty());
    assert!(compiler.get_semantic_diagnostics("u2.ts").is_empty());
}

#[test]
fn test_noop_edit_preserves_symbol_identity() {
    let mut compiler = two_unit_setup();
    let f_before = global_value(&compiler, "f").expect("f");
    let g_before = global_value(&compiler, "g").expect("g");
    assert_eq!(symbol_state(&compiler, f_before), ResolutionState::Resolved);

    // Re-submit u1 with text whose declarations are shape-identical.
    compiler.update_source_unit(
        "u1.ts",
        "function f(x: number): number { return x; }  function g(): void {}".to_string(),
        2,
        true,
        None,
    );

    assert_eq!(global_value(&compiler, "f"), Some(f_before));
    assert_eq!(global_value(&compiler, "g"), Some(g_before));
    // No declaration changed shape, so nothing was invalidated.
    assert_eq!(symbol_state(&compiler, f_before), ResolutionState::Resolved);
    assert_eq!(symbol_state(&compiler, g_before), ResolutionState::Resolved);
}

#[test]
fn test_parameter_type_edit_invalidates_dependents() {
    let mut compiler = two_unit_setup();
    let f = global_value(&compiler, "f").expect("f");
    let g = global_value(&compiler, "g").expect("g");
    let f_sig = compiler
        .chain
        .symbols
        .first_out(f, LinkKind::CallSignature)
        .expect("signature");
    let call_node = first_call_node(&compiler, "u2.ts");
    let call_site = compiler
        .chain
        .get_unit("u2.ts")
        .and_then(|r| r.get_symbol_for_ast(call_node))
        .expect("call site resolved during type check");

    assert_eq!(symbol_state(&compiler, g), ResolutionState::Resolved);

    compiler.update_source_unit(
        "u1.ts",
        "function f(x: string): number { return 0; } function g(): void {}".to_string(),
        2,
        true,
        None,
    );

    // Identity survives the edit; resolution state does not.
    assert_eq!(global_value(&compiler, "f"), Some(f));
    assert_eq!(symbol_state(&compiler, f), ResolutionState::Unresolved);
    assert_eq!(symbol_state(&compiler, f_sig), ResolutionState::Unresolved);
    assert_eq!(symbol_state(&compiler, call_site), ResolutionState::Unresolved);
    // The unrelated function was not touched.
    assert_eq!(symbol_state(&compiler, g), ResolutionState::Resolved);

    // The stale call now mismatches.
    let diagnostics = compiler.get_semantic_diagnostics("u2.ts");
    assert_eq!(
        diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![2345],
        "got {:?}",
        diagnostics
    );
}

#[test]
fn test_removing_declaration_deletes_symbol() {
    let mut compiler = two_unit_setup();
    let f = global_value(&compiler, "f").expect("f");
    let f_sig = compiler
        .chain
        .symbols
        .first_out(f, LinkKind::CallSignature)
        .expect("signature");

    compiler.update_source_unit(
        "u1.ts",
        "function g(): void {}".to_string(),
        2,
        true,
        None,
    );

    assert!(compiler.chain.symbols.get(f).is_none(), "f must be deleted");
    assert!(compiler.chain.symbols.get(f_sig).is_none());
    assert_eq!(global_value(&compiler, "f"), None);

    // The stale reference surfaces as a diagnostic, not silent any.
    let diagnostics = compiler.get_semantic_diagnostics("u2.ts");
    assert_eq!(
        diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![2304],
        "got {:?}",
        diagnostics
    );
}

#[test]
fn test_unrelated_unit_not_rechecked_state() {
    use crate::semantic::UnitState;
    let mut compiler = test_compiler();
    compiler.add_source_unit("a.ts", "var a = 1;".to_string(), 1, true, Vec::new());
    compiler.add_source_unit("b.ts", "var b = 2;".to_string(), 1, true, Vec::new());
    compiler.pull_type_check();

    compiler.update_source_unit("a.ts", "var a = 'one';".to_string(), 2, true, None);

    // a regressed to Bound; b kept its checked state.
    assert_eq!(
        compiler.chain.get_unit("a.ts").map(|r| r.state),
        Some(UnitState::Bound)
    );
    assert_eq!(
        compiler.chain.get_unit("b.ts").map(|r| r.state),
        Some(UnitState::TypeChecked)
    );
}

#[test]
fn test_invalidation_handles_heritage_cycles() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "interface A extends B { a: number; } interface B extends A { b: number; }".to_string(),
        1,
        true,
        Vec::new(),
    );
    compiler.pull_type_check();
    let a = compiler
        .chain
        .interner
        .get("A")
        .and_then(|atom| compiler.chain.global_type(atom))
        .expect("A");
    let b = compiler
        .chain
        .interner
        .get("B")
        .and_then(|atom| compiler.chain.global_type(atom))
        .expect("B");

    // Edit A's member; the mutually-extending pair must both invalidate,
    // each exactly once, without looping.
    compiler.update_source_unit(
        "u.ts",
        "interface A extends B { a: string; } interface B extends A { b: number; }".to_string(),
        2,
        true,
        None,
    );
    assert_eq!(symbol_state(&compiler, a), ResolutionState::Unresolved);
    assert_eq!(symbol_state(&compiler, b), ResolutionState::Unresolved);
}

#[test]
fn test_added_overload_invalidates_merged_symbol() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "function f(x: number): void {}".to_string(),
        1,
        true,
        Vec::new(),
    );
    compiler.pull_type_check();
    let f = global_value(&compiler, "f").expect("f");
    assert_eq!(symbol_state(&compiler, f), ResolutionState::Resolved);

    compiler.update_source_unit(
        "u.ts",
        "function f(x: number): void; function f(x: string): void {}".to_string(),
        2,
        true,
        None,
    );

    assert_eq!(global_value(&compiler, "f"), Some(f));
    assert_eq!(symbol_state(&compiler, f), ResolutionState::Unresolved);
    assert_eq!(
        compiler.chain.symbols.outs(f, LinkKind::CallSignature).len(),
        2
    );
}

#[test]
fn test_invalidate_unit_drops_cached_resolution() {
    use crate::semantic::UnitState;
    let mut compiler = test_compiler();
    compiler.add_source_unit("u.ts", "var a = 1;".to_string(), 1, true, Vec::new());
    compiler.pull_type_check();
    assert_eq!(
        compiler.chain.get_unit("u.ts").map(|r| r.state),
        Some(UnitState::TypeChecked)
    );

    compiler.chain.invalidate_unit("u.ts");
    assert_eq!(
        compiler.chain.get_unit("u.ts").map(|r| r.state),
        Some(UnitState::Bound)
    );
    // The next diagnostics query re-checks cleanly.
    assert!(compiler.get_semantic_diagnostics("u.ts").is_empty());
}

#[test]
fn test_update_unknown_unit_is_config_diagnostic() {
    let mut compiler = test_compiler();
    let result = compiler.update_source_unit("missing.ts", String::new(), 1, true, None);
    assert!(result.is_none());
    let config = compiler.get_configuration_diagnostics();
    assert_eq!(config.len(), 1);
    assert_eq!(config[0].code, 6053);
    assert_eq!(config[0].span.len(), 0);
}
