//! Tests for the structural decl differ.

use crate::decl::{DeclKind, DeclTree, DeclTreeBuilder, DiffKind, diff_decls};
use crate::fixtures::parse_fixture;
use crate::interner::Interner;
use crate::syntax::SyntaxTree;

fn build(interner: &mut Interner, text: &str) -> (SyntaxTree, DeclTree) {
    let tree = parse_fixture("u.ts", text);
    let unit = interner.intern("u.ts");
    let decls = DeclTreeBuilder::build(&tree.arena, tree.root, unit, interner);
    (tree, decls)
}

fn diff(old_text: &str, new_text: &str) -> Vec<(DiffKind, Option<String>)> {
    let mut interner = Interner::new();
    let (old_ast, old_decls) = build(&mut interner, old_text);
    let (new_ast, new_decls) = build(&mut interner, new_text);
    diff_decls(&old_decls, &old_ast.arena, &new_decls, &new_ast.arena)
        .into_iter()
        .map(|d| {
            let name = if d.new.is_some() {
                new_decls.arena.get(d.new).map(|decl| decl.name)
            } else {
                old_decls.arena.get(d.old).map(|decl| decl.name)
            };
            (d.kind, name.map(|n| interner.resolve(n).to_string()))
        })
        .collect()
}

#[test]
fn test_self_diff_is_empty() {
    let text = "module M { function f(x: number): number { return x; } var v = 1; }";
    assert!(diff(text, text).is_empty());
}

#[test]
fn test_cosmetic_edit_yields_no_diff() {
    // Literal value and whitespace changes are immaterial to typing.
    let diffs = diff("var x = 1;", "var   x = 2;");
    assert!(diffs.is_empty(), "got {:?}", diffs);
}

#[test]
fn test_parameter_type_change_is_one_entry() {
    let diffs = diff(
        "function f(x: number): number { return x; } function g(): void {}",
        "function f(x: string): number { return x; } function g(): void {}",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Changed);
    assert_eq!(diffs[0].1.as_deref(), Some("x"));
}

#[test]
fn test_return_type_change_marks_function() {
    let diffs = diff(
        "function f(x: number): number { return x; }",
        "function f(x: number): string { return x; }",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Changed);
    assert_eq!(diffs[0].1.as_deref(), Some("f"));
}

#[test]
fn test_removed_function_is_single_entry() {
    // The removed subtree reports once; its parameters do not.
    let diffs = diff(
        "function f(x: number): number { return x; } function g(): void {}",
        "function g(): void {}",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Removed);
    assert_eq!(diffs[0].1.as_deref(), Some("f"));
}

#[test]
fn test_added_member() {
    let diffs = diff(
        "interface I { a: number; }",
        "interface I { a: number; b: string; }",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Added);
    assert_eq!(diffs[0].1.as_deref(), Some("b"));
}

#[test]
fn test_flag_change_is_changed() {
    let diffs = diff("function f(): void {}", "export function f(): void {}");
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Changed);
    assert_eq!(diffs[0].1.as_deref(), Some("f"));
}

#[test]
fn test_heritage_change_is_changed() {
    let diffs = diff(
        "interface A {} interface B {} interface C extends A {}",
        "interface A {} interface B {} interface C extends B {}",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Changed);
    assert_eq!(diffs[0].1.as_deref(), Some("C"));
}

#[test]
fn test_overload_reorder_matches_by_signature() {
    // Same-name same-kind siblings tie-break on signature hash, so a
    // reordering edit produces no spurious Changed entries.
    let diffs = diff(
        "function f(x: number): void; function f(x: string): void; function f(x: any): void {}",
        "function f(x: string): void; function f(x: number): void; function f(x: any): void {}",
    );
    assert!(diffs.is_empty(), "got {:?}", diffs);
}

#[test]
fn test_initializer_shape_change_detected() {
    // Unannotated variables are typed by their initializer, so changing
    // its structure is observable.
    let diffs = diff("var x = 1;", "var x = 'one';");
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].0, DiffKind::Changed);
}

#[test]
fn test_annotated_initializer_change_is_cosmetic() {
    // With an annotation the declared type wins; initializer structure
    // is not externally observable.
    let diffs = diff("var x: number = 1;", "var x: number = 2;");
    assert!(diffs.is_empty(), "got {:?}", diffs);
}

#[test]
fn test_kind_change_is_remove_and_add() {
    let diffs = diff("function v(): void {}", "var v: number;");
    let kinds: Vec<DiffKind> = diffs.iter().map(|d| d.0).collect();
    assert!(kinds.contains(&DiffKind::Added));
    assert!(kinds.contains(&DiffKind::Removed));
}

#[test]
fn test_nested_change_does_not_mark_ancestors() {
    let diffs = diff(
        "module M { class C { m(x: number): void {} } }",
        "module M { class C { m(x: string): void {} } }",
    );
    assert_eq!(diffs.len(), 1, "got {:?}", diffs);
    assert_eq!(diffs[0].1.as_deref(), Some("x"));
}

#[test]
fn test_diff_kinds_exposed() {
    // DeclDiff carries both sides; Added has no old, Removed no new.
    let mut interner = Interner::new();
    let (old_ast, old_decls) = build(&mut interner, "var a = 1;");
    let (new_ast, new_decls) = build(&mut interner, "var a = 1; var b = 2;");
    let diffs = diff_decls(&old_decls, &old_ast.arena, &new_decls, &new_ast.arena);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].kind, DiffKind::Added);
    assert!(diffs[0].old.is_none());
    assert!(diffs[0].new.is_some());
    assert_eq!(
        new_decls.arena.get(diffs[0].new).map(|d| d.kind),
        Some(DeclKind::Variable)
    );
}
