use serde_json::Value;

use chainql_core::build::*;

use super::{Analyzer, NodeKind, OpArgs, OpId, OperationDef, Registry, build_value};
use crate::pattern::Outcome;
use crate::scope::RootIndex;
use crate::trace::{NoopTracer, PrintTracer, Verbosity};
use crate::{Config, Error, Result};

fn config() -> Config {
    Config::new().root("db").database("app")
}

fn analyze(registry: &Registry, node: &Value, whitelist: &[OpId]) -> Result<Outcome<String>> {
    let config = config();
    let roots = RootIndex::new(&config);
    let mut tracer = NoopTracer;
    let mut analyzer = Analyzer::new(registry, &roots, &config, &mut tracer);
    Ok(analyzer
        .analyze(node, whitelist)?
        .map(|resolved| resolved.command.dump()))
}

fn todos() -> Value {
    path("db.todos")
}

fn by_title() -> Value {
    arrow(&["a", "b"], binary(">", path("a.title"), path("b.title")))
}

fn done() -> Value {
    arrow(&["t"], path("t.done"))
}

const CALLS: &[OpId] = &[OpId::Filter, OpId::Map, OpId::Slice, OpId::Sort];

#[test]
fn filter_map_slice_chains() {
    let node = method(
        method(
            method(todos(), "filter", vec![done()]),
            "map",
            vec![arrow(&["t"], paren(object(vec![prop("title", path("t.title"))])))],
        ),
        "slice",
        vec![num(0.0), num(10.0)],
    );
    let dump = analyze(Registry::builtin(), &node, CALLS).unwrap().ok().unwrap();
    insta::assert_snapshot!(dump, @r"
    Query slice 0..10
      Query map title=title
        Query filter <MemberExpression>
          CollectionRef app.todos
    ");
}

#[test]
fn slice_then_filter_is_rejected() {
    let node = method(
        method(todos(), "slice", vec![num(0.0), num(5.0)]),
        "filter",
        vec![done()],
    );
    let outcome = analyze(Registry::builtin(), &node, CALLS).unwrap();
    assert_eq!(
        outcome.skip_reason(),
        Some("no operation matched (filter: `filter` cannot follow `slice`)")
    );
}

#[test]
fn follows_table_is_configurable() {
    let node = method(
        method(todos(), "sort", vec![by_title()]),
        "slice",
        vec![num(0.0), num(5.0)],
    );
    let standard = analyze(Registry::builtin(), &node, CALLS).unwrap();
    assert!(standard.is_match());

    let strict = Registry::standard().with_follows(OpId::Slice, [OpId::Root, OpId::Filter]);
    let outcome = analyze(&strict, &node, CALLS).unwrap();
    assert!(outcome.is_skip());
    assert!(!strict.can_follow(OpId::Slice, OpId::Sort));
}

#[test]
fn terminal_value_accepts_no_successor() {
    let node = member(member(todos(), "length"), "length");
    let outcome = analyze(Registry::builtin(), &node, &[OpId::Root, OpId::Length]).unwrap();
    assert!(outcome.is_skip());
}

#[test]
fn whitelist_restricts_outermost_operation_only() {
    let node = method(todos(), "filter", vec![done()]);
    let outcome = analyze(Registry::builtin(), &node, &[OpId::Map]).unwrap();
    assert!(outcome.is_skip());

    let node = member(node, "length");
    let dump = analyze(Registry::builtin(), &node, &[OpId::Length]).unwrap().ok().unwrap();
    insta::assert_snapshot!(dump, @r"
    Value length
      Query filter <MemberExpression>
        CollectionRef app.todos
    ");
}

#[test]
fn unknown_root_is_skipped_before_arguments_are_checked() {
    // The map body is not a projection, but `items` is not a root either.
    let node = method(path("items"), "map", vec![arrow(&["x"], path("x.a"))]);
    let outcome = analyze(Registry::builtin(), &node, CALLS).unwrap();
    assert!(outcome.is_skip());
}

#[test]
fn committed_operation_with_bad_arguments_is_fatal() {
    let node = method(todos(), "map", vec![arrow(&["x"], path("x.a"))]);
    let err = analyze(Registry::builtin(), &node, CALLS).unwrap_err();
    let Error::InvalidOperation { op, reason, .. } = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(op, OpId::Map);
    assert!(reason.starts_with("expected a one-parameter function returning an object literal"));
}

#[test]
fn fatal_error_carries_span() {
    let mut node = method(todos(), "slice", vec![string("a")]);
    node["start"] = 10.into();
    node["end"] = 30.into();
    let err = analyze(Registry::builtin(), &node, CALLS).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { span: Some((10, 30)), .. }));
}

#[test]
fn recursion_limit_is_enforced() {
    let node = method(method(todos(), "filter", vec![done()]), "filter", vec![done()]);
    let config = config().recursion_limit(2);
    let roots = RootIndex::new(&config);
    let mut tracer = NoopTracer;
    let mut analyzer = Analyzer::new(Registry::builtin(), &roots, &config, &mut tracer);
    assert_eq!(
        analyzer.analyze(&node, CALLS).unwrap_err(),
        Error::RecursionLimitExceeded(2)
    );
}

fn count_args(_: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    Outcome::Match(OpArgs::Value {
        property: "count".to_owned(),
    })
}

#[test]
fn custom_operation_is_a_table_row() {
    let registry = Registry::standard().register(OperationDef {
        id: OpId::Custom("count"),
        kind: NodeKind::Call,
        name: Some("count"),
        shape: None,
        follows: vec![OpId::Root, OpId::Filter],
        extract: count_args,
        build: build_value,
    });
    let node = method(method(todos(), "filter", vec![done()]), "count", vec![]);
    let dump = analyze(&registry, &node, &[OpId::Custom("count")])
        .unwrap()
        .ok()
        .unwrap();
    insta::assert_snapshot!(dump, @r"
    Value count
      Query filter <MemberExpression>
        CollectionRef app.todos
    ");
}

#[test]
fn removed_operation_is_not_recognized() {
    let registry = Registry::standard().without(OpId::Sort);
    let node = method(todos(), "sort", vec![by_title()]);
    assert!(analyze(&registry, &node, CALLS).unwrap().is_skip());
    assert_eq!(registry.get(OpId::Sort).count(), 0);
}

#[test]
fn rejection_is_traced() {
    let node = method(
        method(todos(), "slice", vec![num(0.0), num(5.0)]),
        "sort",
        vec![by_title()],
    );
    let config = config();
    let roots = RootIndex::new(&config);
    let mut tracer = PrintTracer::new(Verbosity::Default);
    let mut analyzer = Analyzer::new(Registry::builtin(), &roots, &config, &mut tracer);
    assert!(analyzer.analyze(&node, CALLS).unwrap().is_skip());
    insta::assert_snapshot!(tracer.into_output(), @r"
    built CollectionRef app.todos
    built Query slice 0..5
    reject sort: cannot follow slice
    ");
}

#[test]
fn parenthesized_chain_is_transparent() {
    let node = method(paren(todos()), "filter", vec![done()]);
    assert!(analyze(Registry::builtin(), &node, CALLS).unwrap().is_match());
}

#[test]
fn op_id_display() {
    assert_eq!(OpId::Filter.to_string(), "filter");
    assert_eq!(OpId::Custom("count").to_string(), "count");
}
