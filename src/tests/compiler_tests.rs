//! Facade-level tests: multi-unit programs, diagnostics surfaces,
//! document lifecycle.

use crate::fixtures::test_compiler;
use crate::span::{Span, TextChangeRange};

#[test]
fn test_cross_unit_call_clean() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u1.ts",
        "function f(x: number): number { return x; }".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.add_source_unit(
        "u2.ts",
        "f(1);".to_string(),
        1,
        false,
        vec!["u1.ts".to_string()],
    );
    compiler.pull_type_check();
    assert!(compiler.get_semantic_diagnostics("u1.ts").is_empty());
    assert!(compiler.get_semantic_diagnostics("u2.ts").is_empty());
}

#[test]
fn test_semantic_diagnostics_deterministic() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "var x: Missing = unknown(1);".to_string(),
        1,
        false,
        Vec::new(),
    );
    let first = compiler.get_semantic_diagnostics("u.ts");
    let second = compiler.get_semantic_diagnostics("u.ts");
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_syntactic_diagnostics_pass_through() {
    let mut compiler = test_compiler();
    compiler.add_source_unit("u.ts", "function (".to_string(), 1, false, Vec::new());
    assert!(!compiler.get_syntactic_diagnostics("u.ts").is_empty());
    assert!(compiler.get_syntactic_diagnostics("other.ts").is_empty());
}

#[test]
fn test_argument_mismatch_reports_2345() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "function f(x: number): void {} f('one');".to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert_eq!(
        diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![2345],
        "got {:?}",
        diagnostics
    );
}

#[test]
fn test_overload_selection_no_false_positive() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "function f(x: number): void; function f(x: string): void; function f(x: any): void {} \
         f('one');"
            .to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert!(diagnostics.is_empty(), "got {:?}", diagnostics);
}

#[test]
fn test_structural_assignment_against_interface() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u1.ts",
        "interface Point { x: number; y: number; }".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.add_source_unit(
        "u2.ts",
        "var p: Point = { x: 1, y: 2 };".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.pull_type_check();
    assert!(compiler.get_semantic_diagnostics("u2.ts").is_empty());
}

#[test]
fn test_structural_mismatch_reports_2322() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "interface Point { x: number; } var p: Point = { x: 'one' };".to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert_eq!(
        diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![2322],
        "got {:?}",
        diagnostics
    );
}

#[test]
fn test_heritage_across_units_in_any_order() {
    // u1 extends a type declared in a unit submitted later; the pull
    // model must not care about declaration order.
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u1.ts",
        "interface Derived extends Base { d: number; }".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.add_source_unit(
        "u2.ts",
        "interface Base { b: number; } var v: Derived = { b: 1, d: 2 };".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.pull_type_check();
    assert!(compiler.get_semantic_diagnostics("u1.ts").is_empty());
    assert!(compiler.get_semantic_diagnostics("u2.ts").is_empty());
}

#[test]
fn test_property_access_on_class_instance() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "class C { p: number; constructor(x: number) {} } \
         var c = new C(1); \
         var n: number = c.p; \
         var bad = c.q;"
            .to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert_eq!(
        diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![2339],
        "got {:?}",
        diagnostics
    );
}

#[test]
fn test_module_qualified_type_annotation() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "module M { export class C { p: number; } } var c: M.C = new M.C();".to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert!(diagnostics.is_empty(), "got {:?}", diagnostics);
}

#[test]
fn test_document_versioning_and_tree_retention() {
    let mut compiler = test_compiler();
    compiler.add_source_unit("open.ts", "var a = 1;".to_string(), 1, true, Vec::new());
    compiler.add_source_unit("closed.ts", "var b = 2;".to_string(), 1, false, Vec::new());

    // Open units retain their tree for incremental re-parse; closed
    // units keep only cached parse diagnostics.
    assert!(compiler.document("open.ts").unwrap().syntax().is_some());
    assert!(compiler.document("closed.ts").unwrap().syntax().is_none());

    let change = TextChangeRange::new(Span::new(8, 9), 1);
    compiler.update_source_unit("open.ts", "var a = 2;".to_string(), 2, true, Some(change));
    let document = compiler.document("open.ts").unwrap();
    assert_eq!(document.version, 2);
    assert_eq!(document.text, "var a = 2;");
}

#[test]
fn test_top_level_declarations() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "var a = 1; function f(): void {} class C {}".to_string(),
        1,
        false,
        Vec::new(),
    );
    let decls = compiler.get_top_level_declarations("u.ts");
    let names: Vec<&str> = decls
        .iter()
        .map(|d| compiler.chain.interner.resolve(d.name))
        .collect();
    assert_eq!(names, vec!["a", "f", "C"]);
    assert!(compiler.get_top_level_declarations("missing.ts").is_empty());
}

#[test]
fn test_failed_unit_does_not_corrupt_siblings() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "broken.ts",
        "var x: Missing = nope(; function f( {".to_string(),
        1,
        false,
        Vec::new(),
    );
    compiler.add_source_unit("ok.ts", "var fine: number = 1;".to_string(), 1, false, Vec::new());
    compiler.pull_type_check();
    assert!(compiler.get_semantic_diagnostics("ok.ts").is_empty());
    assert!(!compiler.get_semantic_diagnostics("broken.ts").is_empty());
}

#[test]
fn test_variable_holding_function_is_callable() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "function f(x: number): number { return x; } var g = f; g(1);".to_string(),
        1,
        false,
        Vec::new(),
    );
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert!(diagnostics.is_empty(), "got {:?}", diagnostics);
}

#[test]
fn test_cycle_guard_returns_placeholder() {
    // Mutually-referencing initializers must short-circuit, not recurse.
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u.ts",
        "var a = b; var b = a;".to_string(),
        1,
        false,
        Vec::new(),
    );
    // No stack overflow and no panic is the property under test.
    compiler.pull_type_check();
    let _ = compiler.get_semantic_diagnostics("u.ts");
}
