//! Tests for the declaration tree builder.

use crate::decl::{DeclKind, DeclTree, DeclTreeBuilder, decl_flags};
use crate::fixtures::parse_fixture;
use crate::interner::Interner;

fn build(text: &str) -> (DeclTree, Interner) {
    let tree = parse_fixture("u.ts", text);
    let mut interner = Interner::new();
    let unit = interner.intern("u.ts");
    let decls = DeclTreeBuilder::build(&tree.arena, tree.root, unit, &mut interner);
    (decls, interner)
}

/// Pre-order (name, kind) shape of a decl tree.
fn shape(tree: &DeclTree, interner: &Interner) -> Vec<(String, DeclKind)> {
    tree.arena
        .walk_preorder(tree.root)
        .into_iter()
        .filter_map(|id| tree.arena.get(id))
        .map(|d| (interner.resolve(d.name).to_string(), d.kind))
        .collect()
}

#[test]
fn test_function_with_parameters() {
    let (tree, interner) = build("function f(x: number, y: string): number { return x; }");
    let shape = shape(&tree, &interner);
    assert_eq!(
        shape,
        vec![
            ("".to_string(), DeclKind::Script),
            ("f".to_string(), DeclKind::Function),
            ("x".to_string(), DeclKind::Parameter),
            ("y".to_string(), DeclKind::Parameter),
        ]
    );
}

#[test]
fn test_exactly_one_top_level_decl() {
    let (tree, _) = build("var a = 1; var b = 2; function f() {}");
    let root = tree.arena.get(tree.root).expect("root decl");
    assert_eq!(root.kind, DeclKind::Script);
    assert!(root.parent.is_none());
    assert_eq!(root.children.len(), 3);
}

#[test]
fn test_module_nesting() {
    let (tree, interner) = build("module M { module N { var x = 1; } }");
    assert_eq!(
        shape(&tree, &interner),
        vec![
            ("".to_string(), DeclKind::Script),
            ("M".to_string(), DeclKind::Module),
            ("N".to_string(), DeclKind::Module),
            ("x".to_string(), DeclKind::Variable),
        ]
    );
}

#[test]
fn test_class_members() {
    let (tree, interner) = build(
        "class C { p: number; m(a: number): number { return a; } constructor(q: string) {} }",
    );
    let shape = shape(&tree, &interner);
    assert_eq!(
        shape,
        vec![
            ("".to_string(), DeclKind::Script),
            ("C".to_string(), DeclKind::Class),
            ("p".to_string(), DeclKind::Property),
            ("m".to_string(), DeclKind::Method),
            ("a".to_string(), DeclKind::Parameter),
            ("".to_string(), DeclKind::Constructor),
            ("q".to_string(), DeclKind::Parameter),
        ]
    );
}

#[test]
fn test_interface_signatures() {
    let (tree, interner) = build("interface I { p?: number; (x: number): number; new (): I; }");
    let kinds: Vec<DeclKind> = shape(&tree, &interner).into_iter().map(|(_, k)| k).collect();
    assert_eq!(
        kinds,
        vec![
            DeclKind::Script,
            DeclKind::Interface,
            DeclKind::Property,
            DeclKind::CallSignature,
            DeclKind::Parameter,
            DeclKind::ConstructSignature,
        ]
    );
}

#[test]
fn test_optional_flag_copied() {
    let (tree, interner) = build("interface I { p?: number; }");
    let prop = tree
        .arena
        .iter()
        .find(|d| interner.resolve(d.name) == "p")
        .expect("property decl");
    assert!(prop.has_flag(decl_flags::OPTIONAL));
}

#[test]
fn test_exported_flag_copied() {
    let (tree, interner) = build("export function f() {}");
    let func = tree
        .arena
        .iter()
        .find(|d| interner.resolve(d.name) == "f")
        .expect("function decl");
    assert!(func.has_flag(decl_flags::EXPORTED));
}

#[test]
fn test_catch_block_scope() {
    let (tree, interner) = build("function f() { try {} catch (e) {} }");
    let shape = shape(&tree, &interner);
    assert_eq!(
        shape,
        vec![
            ("".to_string(), DeclKind::Script),
            ("f".to_string(), DeclKind::Function),
            ("".to_string(), DeclKind::CatchBlock),
            ("e".to_string(), DeclKind::Variable),
        ]
    );
}

#[test]
fn test_with_block_scope() {
    let (tree, _) = build("function f(o: any) { with (o) {} }");
    let kinds: Vec<DeclKind> = tree
        .arena
        .iter()
        .map(|d| d.kind)
        .collect();
    assert!(kinds.contains(&DeclKind::WithBlock));
}

#[test]
fn test_arrow_creates_anonymous_function_decl() {
    let (tree, interner) = build("var f = (x: number) => x;");
    let shape = shape(&tree, &interner);
    assert_eq!(
        shape,
        vec![
            ("".to_string(), DeclKind::Script),
            ("f".to_string(), DeclKind::Variable),
            ("".to_string(), DeclKind::Function),
            ("x".to_string(), DeclKind::Parameter),
        ]
    );
}

#[test]
fn test_ast_index_populated() {
    let (tree, _) = build("function f() {}");
    for id in tree.arena.walk_preorder(tree.root) {
        let decl = tree.arena.get(id).expect("decl");
        assert_eq!(tree.ast_to_decl.get(&decl.ast.0), Some(&id));
    }
}

#[test]
fn test_deterministic_shape() {
    let text = "module M { class C { m(): number { return 1; } } } var v: M.C;";
    let (first, first_interner) = build(text);
    let (second, second_interner) = build(text);
    assert_eq!(shape(&first, &first_interner), shape(&second, &second_interner));
}
