//! Tests for the symbol binder.

use crate::bind::bind_unit;
use crate::compiler::Compiler;
use crate::fixtures::test_compiler;
use crate::symbols::{LinkKind, ResolutionState, SymbolId, SymbolKind};

fn bound(text: &str) -> Compiler {
    let mut compiler = test_compiler();
    compiler.add_source_unit("u.ts", text.to_string(), 1, false, Vec::new());
    bind_unit(&mut compiler.chain, "u.ts", None);
    compiler
}

fn global_value(compiler: &Compiler, name: &str) -> Option<SymbolId> {
    let atom = compiler.chain.interner.get(name)?;
    compiler.chain.global_value(atom)
}

fn global_type(compiler: &Compiler, name: &str) -> Option<SymbolId> {
    let atom = compiler.chain.interner.get(name)?;
    compiler.chain.global_type(atom)
}

#[test]
fn test_bind_creates_global_symbols() {
    let compiler = bound("var x = 1; function f(): void {} class C {} interface I {}");
    for name in ["x", "f", "C", "I"] {
        let found =
            global_value(&compiler, name).or_else(|| global_type(&compiler, name));
        assert!(found.is_some(), "missing global '{}'", name);
    }
}

#[test]
fn test_binding_never_resolves_types() {
    // Pull model: the bind pass shapes the graph but computes no types.
    let compiler = bound("var x: number = 1; function f(a: string): number { return 0; }");
    let x = global_value(&compiler, "x").expect("x bound");
    let symbol = compiler.chain.symbols.get(x).expect("symbol");
    assert_eq!(symbol.state, ResolutionState::Unresolved);
    assert!(symbol.symbol_type.is_none());
}

#[test]
fn test_scope_spaces() {
    // An interface and a variable may share a name: different spaces.
    let compiler = bound("interface T { p: number; } var T = 1;");
    let value = global_value(&compiler, "T").expect("value side");
    let ty = global_type(&compiler, "T").expect("type side");
    assert_ne!(value, ty);
    let record = compiler.chain.get_unit("u.ts").expect("record");
    assert!(record.bind_diagnostics.is_empty());
}

#[test]
fn test_interface_merging() {
    let compiler = bound("interface I { a: number; } interface I { b: string; }");
    let i = global_type(&compiler, "I").expect("interface");
    let symbol = compiler.chain.symbols.get(i).expect("symbol");
    assert_eq!(symbol.kind, SymbolKind::Interface);
    assert_eq!(symbol.decls.len(), 2);
    // Members of both declarations accumulate on the merged symbol.
    assert_eq!(compiler.chain.symbols.outs(i, LinkKind::Member).len(), 2);
    let record = compiler.chain.get_unit("u.ts").expect("record");
    assert!(record.bind_diagnostics.is_empty());
}

#[test]
fn test_function_overloads_share_symbol() {
    let compiler =
        bound("function f(x: number): void; function f(x: string): void; function f(x: any): void {}");
    let f = global_value(&compiler, "f").expect("f");
    let symbol = compiler.chain.symbols.get(f).expect("symbol");
    assert_eq!(symbol.decls.len(), 3);
    assert_eq!(
        compiler.chain.symbols.outs(f, LinkKind::CallSignature).len(),
        3
    );
}

#[test]
fn test_duplicate_class_reports_2300() {
    let compiler = bound("class C {} class C {}");
    let record = compiler.chain.get_unit("u.ts").expect("record");
    assert_eq!(record.bind_diagnostics.error_codes(), vec![2300]);
}

#[test]
fn test_member_links() {
    let compiler = bound("class C { p: number; m(): void {} }");
    let c = global_value(&compiler, "C").expect("class");
    let members = compiler.chain.symbols.outs(c, LinkKind::Member);
    assert_eq!(members.len(), 2);
    let kinds: Vec<SymbolKind> = members
        .iter()
        .filter_map(|&m| compiler.chain.symbols.get(m))
        .map(|s| s.kind)
        .collect();
    assert!(kinds.contains(&SymbolKind::Property));
    assert!(kinds.contains(&SymbolKind::Method));
}

#[test]
fn test_parameter_links_in_order() {
    let compiler = bound("function f(a: number, b: string, c: boolean): void {}");
    let f = global_value(&compiler, "f").expect("f");
    let sig = compiler
        .chain
        .symbols
        .first_out(f, LinkKind::CallSignature)
        .expect("signature");
    let params = compiler.chain.symbols.outs(sig, LinkKind::Parameter);
    let names: Vec<&str> = params
        .iter()
        .filter_map(|&p| compiler.chain.symbols.get(p))
        .map(|s| compiler.chain.interner.resolve(s.name))
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_accessor_pairing() {
    let compiler = bound("class C { get p(): number { return 1; } set p(v: number) {} }");
    let c = global_value(&compiler, "C").expect("class");
    let accessor = compiler
        .chain
        .symbols
        .find_member(c, compiler.chain.interner.get("p").expect("p interned"))
        .expect("accessor member");
    let symbol = compiler.chain.symbols.get(accessor).expect("symbol");
    assert_eq!(symbol.kind, SymbolKind::Accessor);
    assert_eq!(symbol.decls.len(), 2);
    let sigs = compiler.chain.symbols.outs(accessor, LinkKind::CallSignature);
    assert_eq!(sigs.len(), 2);
    // The get and set signatures are paired.
    assert_eq!(
        compiler.chain.symbols.first_out(sigs[0], LinkKind::GetterSetter),
        Some(sigs[1])
    );
}

#[test]
fn test_module_members_for_qualified_lookup() {
    let compiler = bound("module M { export class C {} export var v = 1; }");
    let m = global_value(&compiler, "M").expect("module");
    assert_eq!(compiler.chain.symbols.outs(m, LinkKind::Member).len(), 2);
}

#[test]
fn test_same_unit_heritage_wired_at_bind() {
    let compiler = bound("interface A {} interface B extends A {}");
    let b = global_type(&compiler, "B").expect("B");
    let a = global_type(&compiler, "A").expect("A");
    assert_eq!(compiler.chain.symbols.outs(b, LinkKind::Extends), vec![a]);
}

#[test]
fn test_primitive_singleton_across_units() {
    let mut compiler = test_compiler();
    for i in 0..3 {
        let path = format!("u{}.ts", i);
        compiler.add_source_unit(&path, "var x: number = 1;".to_string(), 1, false, Vec::new());
        bind_unit(&mut compiler.chain, &path, None);
    }
    let primitive_count = compiler
        .chain
        .symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Primitive)
        .count();
    // any, number, string, boolean, void, null, undefined: created once
    // with the chain, never per unit.
    assert_eq!(primitive_count, 7);
}

#[test]
fn test_cross_unit_path_lookup() {
    let mut compiler = test_compiler();
    compiler.add_source_unit(
        "u1.ts",
        "module M { export class C {} }".to_string(),
        1,
        false,
        Vec::new(),
    );
    bind_unit(&mut compiler.chain, "u1.ts", None);
    let m = compiler.chain.interner.get("M").expect("M interned");
    let c = compiler.chain.interner.get("C").expect("C interned");
    let hits = compiler.chain.find_decls(&[m, c], Some(crate::decl::DeclKind::Class));
    assert_eq!(hits.len(), 1);
    assert!(hits[0].symbol.is_some());
}
