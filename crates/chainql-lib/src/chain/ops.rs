//! Built-in operations.

use std::sync::LazyLock;

use serde_json::Value;

use chainql_core::{
    ARRAY_EXPRESSION, ASSIGNMENT_EXPRESSION, CALL_EXPRESSION, CONDITIONAL_EXPRESSION, IDENTIFIER,
    NodeExt, OBJECT_EXPRESSION, PROPERTY, SPREAD_ELEMENT, UNARY_EXPRESSION, build, same_node,
};

use super::{
    NodeKind, OpArgs, OpId, OperationDef, build_collection, build_modification, build_query,
    build_value,
};
use crate::ir::{ModOp, Projection, QueryOp};
use crate::matched;
use crate::pattern::pat::*;
use crate::pattern::{Matched, Outcome, Pattern, Rule, first_of};
use crate::scope::RootIndex;
use crate::shapes::{field_of, function, one_param};
use crate::sort::normalize_comparator;

pub(super) fn standard() -> Vec<OperationDef> {
    use OpId::*;
    vec![
        OperationDef {
            id: Root,
            kind: NodeKind::Member,
            name: None,
            shape: Some(database_member),
            follows: vec![],
            extract: database_member_args,
            build: build_collection,
        },
        OperationDef {
            id: Root,
            kind: NodeKind::Identifier,
            name: None,
            shape: Some(collection_identifier),
            follows: vec![],
            extract: collection_identifier_args,
            build: build_collection,
        },
        OperationDef {
            id: Filter,
            kind: NodeKind::Call,
            name: Some("filter"),
            shape: None,
            follows: vec![Root, Filter, Sort],
            extract: filter_args,
            build: build_query,
        },
        OperationDef {
            id: Sort,
            kind: NodeKind::Call,
            name: Some("sort"),
            shape: None,
            follows: vec![Root, Filter],
            extract: sort_args,
            build: build_query,
        },
        OperationDef {
            id: Slice,
            kind: NodeKind::Call,
            name: Some("slice"),
            shape: None,
            follows: vec![Root, Filter, Sort, Map],
            extract: slice_args,
            build: build_query,
        },
        OperationDef {
            id: Map,
            kind: NodeKind::Call,
            name: Some("map"),
            shape: None,
            follows: vec![Root, Filter, Sort, Slice],
            extract: map_args,
            build: build_query,
        },
        OperationDef {
            id: Length,
            kind: NodeKind::Member,
            name: Some("length"),
            shape: None,
            follows: vec![Root, Filter, Map, Slice, Sort],
            extract: length_args,
            build: build_value,
        },
        OperationDef {
            id: Insert,
            kind: NodeKind::Assignment,
            name: None,
            shape: Some(appended_to_itself),
            follows: vec![Root],
            extract: insert_args,
            build: build_modification,
        },
        OperationDef {
            id: Update,
            kind: NodeKind::Assignment,
            name: None,
            shape: Some(mapped_onto_itself),
            follows: vec![Root],
            extract: update_args,
            build: build_modification,
        },
        OperationDef {
            id: Remove,
            kind: NodeKind::Assignment,
            name: None,
            shape: Some(filtered_onto_itself),
            follows: vec![Root],
            extract: remove_args,
            build: build_modification,
        },
    ]
}

// ============================================================================
// Roots
// ============================================================================

/// `db.todos` or `db["todos"]` where `db` is bound to a whole database.
fn database_member(node: &Value, roots: &RootIndex) -> Outcome<()> {
    let Some(object) = node.field("object").and_then(NodeExt::ident_name) else {
        return Outcome::skip("object is not an identifier");
    };
    match roots.get(object) {
        Some(binding) if binding.collection.is_none() => {}
        Some(_) => return Outcome::skip(format!("`{object}` is bound to a collection")),
        None => return Outcome::skip(format!("`{object}` is not a root")),
    }
    if node.static_property().is_none() {
        return Outcome::skip("collection name is not static");
    }
    Outcome::Match(())
}

fn database_member_args(node: &Value, roots: &RootIndex) -> Outcome<OpArgs> {
    let binding = node
        .field("object")
        .and_then(NodeExt::ident_name)
        .and_then(|name| roots.get(name));
    match (binding, node.static_property()) {
        (Some(binding), Some(collection)) => Outcome::Match(OpArgs::Collection {
            db: binding.db.clone(),
            collection: collection.to_owned(),
        }),
        _ => Outcome::skip("expected `<root>.<collection>`"),
    }
}

/// Bare identifier bound to one collection.
fn collection_identifier(node: &Value, roots: &RootIndex) -> Outcome<()> {
    let Some(name) = node.ident_name() else {
        return Outcome::skip("expected an identifier");
    };
    match roots.get(name) {
        Some(binding) if binding.collection.is_some() => Outcome::Match(()),
        Some(_) => Outcome::skip(format!("`{name}` is bound to a database")),
        None => Outcome::skip(format!("`{name}` is not a root")),
    }
}

fn collection_identifier_args(node: &Value, roots: &RootIndex) -> Outcome<OpArgs> {
    let binding = node.ident_name().and_then(|name| roots.get(name));
    match binding {
        Some(binding) => match &binding.collection {
            Some(collection) => Outcome::Match(OpArgs::Collection {
                db: binding.db.clone(),
                collection: collection.clone(),
            }),
            None => Outcome::skip("identifier is bound to a database"),
        },
        None => Outcome::skip("identifier is not a root"),
    }
}

// ============================================================================
// Reads
// ============================================================================

fn arguments(slots: impl IntoIterator<Item = crate::pattern::Slot>) -> Pattern {
    node(CALL_EXPRESSION, [("arguments", seq(slots))])
}

/// One-parameter function as the only argument. Binds `param` and `body`.
fn callback(body: Pattern) -> Pattern {
    arguments([one(function(one_param("param"), body))])
}

/// Any one-parameter callback; binds `param` and `body`.
static CALLBACK: LazyLock<Pattern> = LazyLock::new(|| callback(capture("body")));

fn filter_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let m = matched!(expect(&CALLBACK, node, "expected a one-parameter predicate function"));
    let Some(predicate) = m.get("body") else {
        return Outcome::skip("predicate body missing");
    };
    Outcome::Match(OpArgs::Query(QueryOp::Filter {
        predicate: predicate.clone(),
    }))
}

static MAP: LazyLock<Pattern> = LazyLock::new(|| {
    callback(node(
        OBJECT_EXPRESSION,
        [("properties", seq([rest_as("properties", any())]))],
    ))
});

/// `name: param.field`
static PROJECTION: LazyLock<Pattern> = LazyLock::new(|| {
    node(PROPERTY, [("value", field_of("object", "field"))])
});

fn map_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let m = matched!(expect(
        &MAP,
        node,
        "expected a one-parameter function returning an object literal"
    ));
    let param = m.str("param").unwrap_or_default();
    let properties = m.get("properties").and_then(Value::as_array);
    let mut fields = Vec::new();
    for property in properties.into_iter().flatten() {
        let Some(name) = property.static_property() else {
            return Outcome::skip("projected property names must be static");
        };
        let Outcome::Match(p) = PROJECTION.matches(property) else {
            return Outcome::skip(format!(
                "`{name}` must be a property of `{param}`, like `{name}: {param}.{name}`"
            ));
        };
        if p.str("object") != Some(param) {
            return Outcome::skip(format!("`{name}` must read from `{param}`"));
        }
        fields.push(Projection {
            name: name.to_owned(),
            field: p.str("field").unwrap_or_default().to_owned(),
        });
    }
    if fields.is_empty() {
        return Outcome::skip("projection selects no fields");
    }
    Outcome::Match(OpArgs::Query(QueryOp::Map { fields }))
}

static SLICE: LazyLock<Pattern> =
    LazyLock::new(|| arguments([one(number_as("from")), opt(number_as("to"))]));

fn slice_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let m = matched!(expect(&SLICE, node, "expected numeric literal bounds"));
    let from = matched!(integer(&m, "from"));
    let to = match m.get("to") {
        Some(_) => Some(matched!(integer(&m, "to"))),
        None => None,
    };
    Outcome::Match(OpArgs::Query(QueryOp::Slice { from, to }))
}

fn integer(m: &Matched, name: &str) -> Outcome<i64> {
    match m.f64(name) {
        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Outcome::Match(n as i64),
        Some(n) => Outcome::skip(format!("`{n}` is not an integer")),
        None => Outcome::skip(format!("missing `{name}`")),
    }
}

static SORT: LazyLock<Pattern> = LazyLock::new(|| arguments([one(capture("comparator"))]));

fn sort_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let m = matched!(expect(&SORT, node, "expected a comparator function"));
    let Some(comparator) = m.get("comparator") else {
        return Outcome::skip("comparator missing");
    };
    normalize_comparator(comparator).map(|descriptor| {
        OpArgs::Query(QueryOp::Sort {
            fields: vec![descriptor],
        })
    })
}

fn length_args(_: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    Outcome::Match(OpArgs::Value {
        property: "length".to_owned(),
    })
}

fn expect(pattern: &Pattern, node: &Value, reason: &str) -> Outcome<Matched> {
    match pattern.matches(node) {
        Outcome::Match(m) => Outcome::Match(m),
        Outcome::Skip(skip) => Outcome::skip(format!("{reason} ({skip})")),
    }
}

// ============================================================================
// Writes
// ============================================================================

/// `<target> = <target>.<method>(...)`; the two targets must be the same
/// expression.
fn reassigned_via(method: &'static str) -> Pattern {
    node(
        ASSIGNMENT_EXPRESSION,
        [
            ("operator", lit("=")),
            ("left", capture("target")),
            (
                "right",
                node(CALL_EXPRESSION, [("callee", member_named(capture("target"), method))]),
            ),
        ],
    )
}

static MAPPED: LazyLock<Pattern> = LazyLock::new(|| reassigned_via("map"));
static FILTERED: LazyLock<Pattern> = LazyLock::new(|| reassigned_via("filter"));

/// `<target> = [...<target>, items]`
static APPENDED: LazyLock<Pattern> = LazyLock::new(|| {
    node(
        ASSIGNMENT_EXPRESSION,
        [
            ("operator", lit("=")),
            ("left", capture("target")),
            (
                "right",
                node(
                    ARRAY_EXPRESSION,
                    [(
                        "elements",
                        seq([
                            one(node(SPREAD_ELEMENT, [("argument", capture("target"))])),
                            rest_as("values", any()),
                        ]),
                    )],
                ),
            ),
        ],
    )
});

/// `<collection> = <source>.map(...)` or `<source>.filter(...)` shaped like
/// an update or remove, where `<source>` is not the assigned collection.
///
/// Not a write, and the right-hand side is not a read either: its callback
/// is a write body, not a projection or predicate over a query.
pub(crate) fn is_misdirected_write(node: &Value, roots: &RootIndex) -> bool {
    let Outcome::Match(m) = REASSIGNED_FROM.matches(node) else {
        return false;
    };
    let (Some(target), Some(source), Some(right)) =
        (m.get("target"), m.get("source"), node.field("right"))
    else {
        return false;
    };
    if same_node(target, source) || !is_collection(target.unparen(), roots) {
        return false;
    }
    let Outcome::Match(callback) = CALLBACK.matches(right) else {
        return false;
    };
    match m.str("method") {
        Some("filter") => true,
        Some("map") => callback.get("body").is_some_and(|body| {
            UPDATE_FORMS
                .iter()
                .any(|form| form.pattern().matches(body).is_match())
        }),
        _ => false,
    }
}

/// `<target> = <source>.<method>(...)`
static REASSIGNED_FROM: LazyLock<Pattern> = LazyLock::new(|| {
    node(
        ASSIGNMENT_EXPRESSION,
        [
            ("operator", lit("=")),
            ("left", capture("target")),
            (
                "right",
                node(
                    CALL_EXPRESSION,
                    [("callee", member_as(capture("source"), "method"))],
                ),
            ),
        ],
    )
});

fn is_collection(node: &Value, roots: &RootIndex) -> bool {
    let shape = if node.is_kind(IDENTIFIER) {
        collection_identifier
    } else {
        database_member
    };
    shape(node, roots).is_match()
}

fn mapped_onto_itself(node: &Value, _: &RootIndex) -> Outcome<()> {
    MAPPED.matches(node).map(drop)
}

fn filtered_onto_itself(node: &Value, _: &RootIndex) -> Outcome<()> {
    FILTERED.matches(node).map(drop)
}

fn appended_to_itself(node: &Value, _: &RootIndex) -> Outcome<()> {
    APPENDED.matches(node).map(drop)
}

fn insert_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let m = matched!(APPENDED.matches(node));
    let values = m
        .get("values")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if values.is_empty() {
        return Outcome::skip("nothing to insert");
    }
    if values.iter().any(|v| v.is_null() || v.is_kind(SPREAD_ELEMENT)) {
        return Outcome::skip("inserted values must be plain expressions");
    }
    Outcome::Match(OpArgs::Modification(ModOp::Insert { values }))
}

fn remove_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let Some(call) = node.field("right") else {
        return Outcome::skip("assignment has no value");
    };
    let m = matched!(expect(&CALLBACK, call, "expected a one-parameter predicate function"));
    let Some(keep) = m.get("body") else {
        return Outcome::skip("predicate body missing");
    };
    Outcome::Match(OpArgs::Modification(ModOp::Remove {
        predicate: negate(keep),
    }))
}

fn update_args(node: &Value, _: &RootIndex) -> Outcome<OpArgs> {
    let Some(call) = node.field("right") else {
        return Outcome::skip("assignment has no value");
    };
    let m = matched!(expect(&CALLBACK, call, "expected a one-parameter function"));
    let Some(body) = m.get("body") else {
        return Outcome::skip("update body missing");
    };
    let param = m.str("param").unwrap_or_default().to_owned();
    first_of(&UPDATE_FORMS, &param, body).map(OpArgs::Modification)
}

/// `{...param, overrides}`; binds `overrides`.
fn updated(param: &str) -> Pattern {
    node(
        OBJECT_EXPRESSION,
        [(
            "properties",
            seq([
                one(node(SPREAD_ELEMENT, [("argument", ident_as(param))])),
                rest_as("overrides", any()),
            ]),
        )],
    )
}

static UPDATE_FORMS: LazyLock<Vec<Rule<String, ModOp>>> = LazyLock::new(|| {
    let standard = node(
        CONDITIONAL_EXPRESSION,
        [
            ("test", capture("test")),
            ("consequent", updated("object")),
            ("alternate", ident_as("object")),
        ],
    );
    let inverse = node(
        CONDITIONAL_EXPRESSION,
        [
            ("test", capture("test")),
            ("consequent", ident_as("object")),
            ("alternate", updated("object")),
        ],
    );
    vec![
        Rule::new("conditional", standard, |param: &String, m: Matched| {
            let predicate = m.get("test").cloned();
            update(param, &m, predicate)
        }),
        Rule::new("inverse conditional", inverse, |param: &String, m: Matched| {
            let predicate = m.get("test").map(negate);
            update(param, &m, predicate)
        }),
        Rule::new("unconditional", updated("object"), |param: &String, m: Matched| {
            update(param, &m, None)
        }),
    ]
});

fn update(param: &str, m: &Matched, predicate: Option<Value>) -> Outcome<ModOp> {
    if m.str("object") != Some(param) {
        return Outcome::skip(format!("updated object must be `{param}`"));
    }
    let overrides = m.get("overrides").and_then(Value::as_array);
    let mut update = Vec::new();
    for property in overrides.into_iter().flatten() {
        let name = match property.static_property() {
            Some(name) if property.is_kind(PROPERTY) => name,
            _ => return Outcome::skip("overridden fields must be `name: value` pairs"),
        };
        let Some(value) = property.field("value") else {
            return Outcome::skip(format!("`{name}` has no value"));
        };
        update.push((name.to_owned(), value.clone()));
    }
    if update.is_empty() {
        return Outcome::skip("update sets no fields");
    }
    Outcome::Match(ModOp::Update { update, predicate })
}

/// `!test`, unwrapping a test that is already negated.
fn negate(test: &Value) -> Value {
    let test = test.unparen();
    if test.is_kind(UNARY_EXPRESSION)
        && test.get("operator").and_then(Value::as_str) == Some("!")
        && let Some(inner) = test.field("argument")
    {
        return inner.clone();
    }
    build::unary("!", test.clone())
}
