use serde_json::{Value, json};

use chainql_core::build::*;

use super::{analyze_assignment, analyze_call_expression, analyze_member_expression};
use crate::chain::OpId;
use crate::ir::{Command, ModOp, QueryOp};
use crate::pattern::Outcome;
use crate::scope::{RootBinding, RootIndex};
use crate::trace::{PrintTracer, Verbosity};
use crate::{Config, Error, Result};

type Recognizer = fn(&Value, &RootIndex, &Config) -> Result<Outcome<Command>>;

fn config() -> Config {
    Config::new().root("db").database("app")
}

fn run(recognizer: Recognizer, node: &Value) -> Result<Outcome<Command>> {
    let config = config();
    recognizer(node, &RootIndex::new(&config), &config)
}

fn command(recognizer: Recognizer, node: &Value) -> Command {
    match run(recognizer, node) {
        Ok(Outcome::Match(command)) => command,
        Ok(Outcome::Skip(skip)) => panic!("not recognized: {skip}"),
        Err(err) => panic!("fatal: {err}"),
    }
}

fn todos() -> Value {
    path("db.todos")
}

fn sort_by(comparator: Value) -> Value {
    method(todos(), "sort", vec![comparator])
}

fn sort_fields(command: &Command) -> Vec<(String, bool)> {
    let Command::Query(query) = command else {
        panic!("not a query: {command:?}");
    };
    let QueryOp::Sort { fields } = &query.op else {
        panic!("not a sort: {:?}", query.op);
    };
    fields.iter().map(|d| (d.field.clone(), d.ascending)).collect()
}

/// `db.todos = db.todos.map(t => <body>)`
fn mapped_back(body: Value) -> Value {
    assign(todos(), method(todos(), "map", vec![arrow(&["t"], body)]))
}

fn activated() -> Value {
    object(vec![spread(ident("t")), prop("active", boolean(true))])
}

fn id_is_ten() -> Value {
    binary("===", path("t.id"), num(10.0))
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn length_of_collection() {
    let node = member(todos(), "length");
    let command = command(analyze_member_expression, &node);
    insta::assert_snapshot!(command.dump(), @r"
    Value length
      CollectionRef app.todos
    ");
}

#[test]
fn bare_collection_reference() {
    let command = command(analyze_member_expression, &index(ident("db"), string("todos")));
    assert_eq!(command, crate::ir::collection("app", "todos"));
}

#[test]
fn filter_passes_predicate_through() {
    let test = binary("===", path("t.assignee"), ident("who"));
    let node = method(todos(), "filter", vec![arrow(&["t"], test.clone())]);
    let command = command(analyze_call_expression, &node);
    assert_eq!(
        serde_json::to_value(&command).unwrap(),
        json!({
            "type": "Query",
            "method": "filter",
            "predicate": test,
            "source": {"type": "CollectionRef", "db": "app", "collection": "todos"},
        })
    );
}

#[test]
fn filter_accepts_block_body() {
    let node = method(todos(), "filter", vec![arrow_block(&["t"], path("t.done"))]);
    let command = command(analyze_call_expression, &node);
    let Command::Query(query) = &command else {
        panic!("not a query");
    };
    assert_eq!(query.op, QueryOp::Filter { predicate: path("t.done") });
}

#[test]
fn sort_relational_comparator() {
    let comparator = arrow(&["x", "y"], binary(">", path("x.assignee"), path("y.assignee")));
    let command = command(analyze_call_expression, &sort_by(comparator));
    assert_eq!(sort_fields(&command), [("assignee".to_owned(), true)]);
}

#[test]
fn sort_subtraction_comparator() {
    let difference = binary("-", path("x.a"), path("y.a"));
    let ascending = command(analyze_call_expression, &sort_by(arrow(&["x", "y"], difference.clone())));
    assert_eq!(sort_fields(&ascending), [("a".to_owned(), true)]);

    let negated = arrow(&["x", "y"], unary("-", paren(difference)));
    let descending = command(analyze_call_expression, &sort_by(negated));
    assert_eq!(sort_fields(&descending), [("a".to_owned(), false)]);
}

#[test]
fn sort_with_unrecognized_comparator_is_fatal() {
    let comparator = arrow(
        &["a", "b"],
        call(path("a.title.localeCompare"), vec![path("b.title")]),
    );
    let err = run(analyze_call_expression, &sort_by(comparator)).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { op: OpId::Sort, .. }));
}

#[test]
fn map_projection() {
    let projection = object(vec![prop("name", path("u.title")), prop("done", path("u.done"))]);
    let node = method(todos(), "map", vec![arrow(&["u"], projection)]);
    let command = command(analyze_call_expression, &node);
    insta::assert_snapshot!(command.dump(), @r"
    Query map name=title, done=done
      CollectionRef app.todos
    ");
}

#[test]
fn map_reading_another_identifier_is_fatal() {
    let projection = object(vec![prop("name", path("other.title"))]);
    let node = method(todos(), "map", vec![arrow(&["u"], projection)]);
    let err = run(analyze_call_expression, &node).unwrap_err();
    assert_eq!(err.to_string(), "invalid `map` operation: `name` must read from `u`");
}

#[test]
fn slice_with_open_end() {
    let node = method(todos(), "slice", vec![num(3.0)]);
    let command = command(analyze_call_expression, &node);
    insta::assert_snapshot!(command.dump(), @r"
    Query slice 3..
      CollectionRef app.todos
    ");
}

#[test]
fn slice_with_fractional_bound_is_fatal() {
    let node = method(todos(), "slice", vec![num(0.0), num(2.5)]);
    let err = run(analyze_call_expression, &node).unwrap_err();
    assert_eq!(err.to_string(), "invalid `slice` operation: `2.5` is not an integer");
}

#[test]
fn length_after_query() {
    let node = member(
        method(todos(), "filter", vec![arrow(&["t"], path("t.done"))]),
        "length",
    );
    let command = command(analyze_member_expression, &node);
    assert_eq!(command.root().collection, "todos");
    insta::assert_snapshot!(command.dump(), @r"
    Value length
      Query filter <MemberExpression>
        CollectionRef app.todos
    ");
}

#[test]
fn unrelated_calls_are_skipped() {
    let node = method(path("list.items"), "filter", vec![arrow(&["t"], path("t.done"))]);
    assert!(run(analyze_call_expression, &node).unwrap().is_skip());
    let node = method(todos(), "forEach", vec![arrow(&["t"], path("t.done"))]);
    assert!(run(analyze_call_expression, &node).unwrap().is_skip());
}

#[test]
fn collection_bound_identifier_is_a_root() {
    let config = Config::new().connector("connect");
    let mut roots = RootIndex::new(&config);
    roots.declare(
        "todos",
        RootBinding {
            db: "app".into(),
            collection: Some("todos".into()),
        },
    );
    let node = member(ident("todos"), "length");
    let outcome = analyze_member_expression(&node, &roots, &config).unwrap();
    insta::assert_snapshot!(outcome.ok().unwrap().dump(), @r"
    Value length
      CollectionRef app.todos
    ");
}

#[test]
fn database_name_defaults_to_root_name() {
    let config = Config::new().root("store");
    let roots = RootIndex::new(&config);
    let node = member(path("store.todos"), "length");
    let command = analyze_member_expression(&node, &roots, &config).unwrap().ok().unwrap();
    assert_eq!(command.root().db, "store");
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn conditional_update() {
    let node = mapped_back(conditional(id_is_ten(), activated(), ident("t")));
    let command = command(analyze_assignment, &node);
    assert_eq!(
        serde_json::to_value(&command).unwrap(),
        json!({
            "type": "Modification",
            "method": "update",
            "update": [["active", boolean(true)]],
            "predicate": id_is_ten(),
            "source": {"type": "CollectionRef", "db": "app", "collection": "todos"},
        })
    );
}

#[test]
fn inverse_update_negates_predicate() {
    let node = mapped_back(conditional(id_is_ten(), ident("t"), activated()));
    let Command::Modification(modification) = command(analyze_assignment, &node) else {
        panic!("not a modification");
    };
    let ModOp::Update { predicate, .. } = modification.op else {
        panic!("not an update");
    };
    assert_eq!(predicate, Some(unary("!", id_is_ten())));
}

#[test]
fn unconditional_update() {
    let node = mapped_back(paren(activated()));
    let command = command(analyze_assignment, &node);
    insta::assert_snapshot!(command.dump(), @r"
    Modification update active=<Literal>
      CollectionRef app.todos
    ");
}

#[test]
fn update_of_different_collection_is_skipped() {
    let right = method(
        path("db.users"),
        "map",
        vec![arrow(&["t"], conditional(id_is_ten(), activated(), ident("t")))],
    );
    let node = assign(todos(), right);
    let outcome = run(analyze_assignment, &node).unwrap();
    assert!(outcome.is_skip());
}

#[test]
fn update_spreading_another_object_is_fatal() {
    let other = object(vec![spread(ident("u")), prop("active", boolean(true))]);
    let node = mapped_back(conditional(id_is_ten(), other, ident("t")));
    let err = run(analyze_assignment, &node).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { op: OpId::Update, .. }));
}

#[test]
fn remove_negates_kept_predicate() {
    let keep = path("t.active");
    let node = assign(todos(), method(todos(), "filter", vec![arrow(&["t"], keep.clone())]));
    let command = command(analyze_assignment, &node);
    let Command::Modification(modification) = &command else {
        panic!("not a modification");
    };
    assert_eq!(modification.op, ModOp::Remove { predicate: unary("!", keep) });
}

#[test]
fn remove_unwraps_negated_predicate() {
    let keep = unary("!", path("t.done"));
    let node = assign(todos(), method(todos(), "filter", vec![arrow(&["t"], keep)]));
    let command = command(analyze_assignment, &node);
    insta::assert_snapshot!(command.dump(), @r"
    Modification remove where <MemberExpression>
      CollectionRef app.todos
    ");
}

#[test]
fn insert_appended_values() {
    let item = object(vec![prop("title", string("write docs"))]);
    let node = assign(todos(), array(vec![spread(todos()), item.clone()]));
    let command = command(analyze_assignment, &node);
    let Command::Modification(modification) = &command else {
        panic!("not a modification");
    };
    assert_eq!(modification.op, ModOp::Insert { values: vec![item] });
}

#[test]
fn assignment_of_unrelated_value_is_skipped() {
    let node = assign(todos(), array(vec![]));
    assert!(run(analyze_assignment, &node).unwrap().is_skip());
    let node = assign(path("state.todos"), method(path("state.todos"), "map", vec![]));
    assert!(run(analyze_assignment, &node).unwrap().is_skip());
}

#[test]
fn verbose_tracer_reports_skips() {
    let config = config();
    let roots = RootIndex::new(&config);
    let mut tracer = PrintTracer::new(Verbosity::Verbose);
    let node = method(path("list.items"), "sort", vec![]);
    let outcome =
        super::analyze_call_expression_with(&node, &roots, &config, &mut tracer).unwrap();
    assert!(outcome.is_skip());
    assert!(
        tracer.lines().iter().any(|line| line.starts_with("skip sort: source: ")),
        "{:?}",
        tracer.lines()
    );
}
