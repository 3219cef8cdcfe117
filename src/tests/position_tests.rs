//! Tests for path/position-based contextual resolution.

use crate::compiler::Compiler;
use crate::fixtures::test_compiler;
use crate::symbols::{SymbolId, SymbolKind};
use crate::syntax::NodeIndex;

fn single_unit(text: &str) -> Compiler {
    let mut compiler = test_compiler();
    compiler.add_source_unit("u.ts", text.to_string(), 1, true, Vec::new());
    compiler
}

fn offset_of(text: &str, needle: &str) -> u32 {
    // Aim at the middle of the needle to dodge span boundaries.
    (text.find(needle).expect("needle present") + needle.len() / 2) as u32
}

fn offset_at(text: &str, needle: &str) -> u32 {
    // The needle's first character.
    text.find(needle).expect("needle present") as u32
}

fn ast_path(compiler: &Compiler, path: &str, offset: u32) -> Vec<NodeIndex> {
    let record = compiler.chain.get_unit(path).expect("record");
    record.syntax.arena.path_at(record.syntax.root, offset)
}

fn symbol_kind(compiler: &Compiler, symbol: SymbolId) -> SymbolKind {
    compiler.chain.symbols.get(symbol).expect("symbol").kind
}

#[test]
fn test_offset_outside_any_node_is_empty() {
    let text = "var x = 1;";
    let mut compiler = single_unit(text);
    let info = compiler.resolve_position("u.ts", 10_000);
    assert!(info.is_empty());
    assert!(info.ast.is_none());
}

#[test]
fn test_position_on_declaration_name_is_the_declaration() {
    let text = "function fn(x: number): number { return x; } fn(2);";
    let mut compiler = single_unit(text);
    let offset = offset_at(text, "fn(x");
    let info = compiler.resolve_position("u.ts", offset);
    let symbol = info.symbol.expect("function symbol");
    assert_eq!(symbol_kind(&compiler, symbol), SymbolKind::Function);
    // The declaration's own signatures ride along.
    assert_eq!(info.all_signatures.len(), 1);
}

#[test]
fn test_identifier_use_resolves_to_declaration_symbol() {
    let text = "var value = 1; function f(): void { value; }";
    let mut compiler = single_unit(text);
    let use_offset = offset_of(text, "value; }");
    let info = compiler.resolve_position("u.ts", use_offset);
    let symbol = info.symbol.expect("variable symbol");
    assert_eq!(symbol_kind(&compiler, symbol), SymbolKind::Variable);

    let atom = compiler.chain.interner.get("value").expect("interned");
    assert_eq!(compiler.chain.global_value(atom), Some(symbol));
}

#[test]
fn test_repeated_queries_return_identical_symbol() {
    let text = "var value = 1; function f(): void { value; }";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "value; }");
    let first = compiler.resolve_position("u.ts", offset).symbol;
    let second = compiler.resolve_position("u.ts", offset).symbol;
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_callee_position_resolves_call() {
    let text = "function f(x: number): number { return x; } f(2);";
    let mut compiler = single_unit(text);
    let offset = offset_at(text, "f(2)");
    let info = compiler.resolve_position("u.ts", offset);
    let symbol = info.symbol.expect("callee symbol");
    assert_eq!(symbol_kind(&compiler, symbol), SymbolKind::Function);
    assert!(!info.is_constructor_call);
    assert_eq!(info.all_signatures.len(), 1);
    assert_eq!(info.candidate_signature, info.all_signatures.first().copied());
}

#[test]
fn test_constructor_call_position() {
    let text = "class C { constructor(x: number) {} } var c = new C(1);";
    let mut compiler = single_unit(text);
    let offset = offset_at(text, "C(1)");
    let info = compiler.resolve_position("u.ts", offset);
    let symbol = info.symbol.expect("class symbol");
    assert_eq!(symbol_kind(&compiler, symbol), SymbolKind::Class);
    assert!(info.is_constructor_call);
    assert!(info.candidate_signature.is_some());
}

#[test]
fn test_enclosing_scope_symbol() {
    let text = "function outer(): void { var inner = 1; }";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "inner");
    let info = compiler.resolve_position("u.ts", offset);
    let scope = info.enclosing_scope_symbol.expect("enclosing function");
    assert_eq!(symbol_kind(&compiler, scope), SymbolKind::Function);
}

#[test]
fn test_contextual_object_literal_property() {
    // The property inside the literal argument takes its type from the
    // parameter's declared interface, not an any fallback.
    let text = "interface Opts { width: number; } \
                function setup(o: Opts): void {} \
                setup({ width: 10 });";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "width: 10");
    let info = compiler.resolve_position("u.ts", offset);
    let symbol = info.symbol.expect("property symbol");
    assert_eq!(symbol_kind(&compiler, symbol), SymbolKind::Property);
    let number = compiler.chain.primitives.number;
    assert_eq!(
        compiler.chain.symbols.get(symbol).and_then(|s| s.symbol_type),
        Some(number)
    );
}

#[test]
fn test_call_information_from_argument_path() {
    let text = "function f(x: number): number { return x; } f(2);";
    let mut compiler = single_unit(text);
    let offset = offset_at(text, "2);");
    let nodes = ast_path(&compiler, "u.ts", offset);
    let info = compiler
        .pull_get_call_information_from_path("u.ts", &nodes)
        .expect("call info");
    assert!(!info.is_constructor);
    assert!(info.best.is_some());
    assert_eq!(info.signatures.len(), 1);
}

#[test]
fn test_visible_symbols_include_scope_chain() {
    let text = "var top = 1; function f(a: number): void { var local = 2; local; }";
    let mut compiler = single_unit(text);
    compiler.pull_type_check();
    let offset = offset_of(text, "local; }");
    let nodes = ast_path(&compiler, "u.ts", offset);
    let visible = compiler.pull_get_visible_symbols_from_path("u.ts", &nodes);

    let names: Vec<String> = visible
        .iter()
        .filter_map(|&s| compiler.chain.symbols.get(s))
        .map(|s| compiler.chain.interner.resolve(s.name).to_string())
        .collect();
    for expected in ["local", "a", "top", "f"] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
}

#[test]
fn test_contextual_members_inside_literal_argument() {
    let text = "interface Opts { width: number; height: number; } \
                function setup(o: Opts): void {} \
                setup({ width: 10 });";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "width: 10");
    let nodes = ast_path(&compiler, "u.ts", offset);
    let members = compiler.pull_get_contextual_members_from_path("u.ts", &nodes);
    let names: Vec<String> = members
        .iter()
        .filter_map(|&s| compiler.chain.symbols.get(s))
        .map(|s| compiler.chain.interner.resolve(s.name).to_string())
        .collect();
    assert!(names.contains(&"width".to_string()), "got {:?}", names);
    assert!(names.contains(&"height".to_string()), "got {:?}", names);
}

#[test]
fn test_contextual_array_element() {
    let text = "var xs: number[] = [1]; function f(): void { xs; }";
    let mut compiler = single_unit(text);
    // No diagnostics: the literal's element checked against number.
    assert!(compiler.get_semantic_diagnostics("u.ts").is_empty());
}

#[test]
fn test_symbol_information_from_explicit_path() {
    let text = "var value = 1; value;";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "value;");
    let nodes = ast_path(&compiler, "u.ts", offset);
    let info = compiler.pull_get_symbol_information_from_path("u.ts", &nodes);
    assert!(info.symbol.is_some());
    assert_eq!(info.ast, *nodes.last().expect("leaf"));
}

#[test]
fn test_queries_do_not_record_diagnostics() {
    // Resolving a broken expression via a point query must not pollute
    // the unit's semantic diagnostics.
    let text = "missing;";
    let mut compiler = single_unit(text);
    let offset = offset_of(text, "missing");
    let info = compiler.resolve_position("u.ts", offset);
    assert!(info.symbol.is_none());
    let record = compiler.chain.get_unit("u.ts").expect("record");
    assert!(record.check_diagnostics.is_empty());
    // The check pass still reports it.
    let diagnostics = compiler.get_semantic_diagnostics("u.ts");
    assert_eq!(diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(), vec![2304]);
}
