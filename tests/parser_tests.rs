// tests/parser_tests.rs

use hyperlambda::parser::COMMENT_NODE;
use hyperlambda::{HyperlambdaError, Lambda, NodeId, Parser, TypeRegistry, Value};
use rust_decimal::Decimal;

fn parse(source: &str) -> Lambda {
    let registry = TypeRegistry::new();
    Parser::new(&registry).parse(source).unwrap()
}

fn top(lambda: &Lambda) -> Vec<NodeId> {
    lambda.children(lambda.root()).to_vec()
}

fn names(lambda: &Lambda, nodes: &[NodeId]) -> Vec<String> {
    nodes.iter().map(|&n| lambda.name(n).to_string()).collect()
}

fn assert_syntax_error(source: &str) {
    let registry = TypeRegistry::new();
    match Parser::new(&registry).parse(source) {
        Err(HyperlambdaError::Syntax { .. }) => {}
        other => panic!("expected syntax error for {source:?}, got {other:?}"),
    }
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_parse_empty() {
    let lambda = parse("");
    assert!(lambda.is_empty());
}

#[test]
fn test_parse_siblings() {
    let lambda = parse("foo\nbar\nhowdy");
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "bar", "howdy"]);
}

#[test]
fn test_parse_nested() {
    let lambda = parse("foo\n   bar\n      baz\n   qux\nhowdy");
    let roots = top(&lambda);
    assert_eq!(names(&lambda, &roots), vec!["foo", "howdy"]);

    let foo_children = lambda.children(roots[0]).to_vec();
    assert_eq!(names(&lambda, &foo_children), vec!["bar", "qux"]);
    assert_eq!(names(&lambda, lambda.children(foo_children[0])), vec!["baz"]);
    assert!(lambda.children(foo_children[1]).is_empty());
}

#[test]
fn test_parse_dedent_several_levels() {
    let lambda = parse("a\n   b\n      c\n         d\ne");
    assert_eq!(names(&lambda, &top(&lambda)), vec!["a", "e"]);
}

#[test]
fn test_parent_links() {
    let lambda = parse("foo\n   bar");
    let foo = top(&lambda)[0];
    let bar = lambda.children(foo)[0];
    assert_eq!(lambda.parent(bar), Some(foo));
    assert_eq!(lambda.parent(foo), Some(lambda.root()));
}

#[test]
fn test_indentation_jump() {
    assert_syntax_error("foo\n      bar");
}

#[test]
fn test_first_line_indented() {
    assert_syntax_error("   foo");
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_name_without_value() {
    let lambda = parse("foo");
    assert_eq!(lambda.value(top(&lambda)[0]), None);
}

#[test]
fn test_separator_without_value_is_empty_string() {
    let lambda = parse("foo:");
    assert_eq!(lambda.value(top(&lambda)[0]), Some(&Value::from("")));
}

#[test]
fn test_string_value() {
    let lambda = parse("foo:bar");
    assert_eq!(lambda.value(top(&lambda)[0]), Some(&Value::from("bar")));
}

#[test]
fn test_empty_type_means_string() {
    let lambda = parse("foo::bar");
    assert_eq!(lambda.value(top(&lambda)[0]), Some(&Value::from("bar")));
}

#[test]
fn test_typed_values() {
    let lambda = parse(
        "a:int:5\n\
         b:bool:true\n\
         c:decimal:7.5\n\
         d:long:-3\n\
         e:date:\"2020-12-23T23:59:11.000Z\"\n\
         f:guid:00000000-0000-0000-0000-000000000000\n\
         g:x:../*/foo",
    );
    let nodes = top(&lambda);
    assert_eq!(lambda.value(nodes[0]), Some(&Value::Int(5)));
    assert_eq!(lambda.value(nodes[1]), Some(&Value::Bool(true)));
    assert_eq!(lambda.value(nodes[2]), Some(&Value::Decimal(Decimal::new(75, 1))));
    assert_eq!(lambda.value(nodes[3]), Some(&Value::Long(-3)));
    assert!(matches!(lambda.value(nodes[4]), Some(Value::Date(_))));
    assert_eq!(lambda.value(nodes[5]), Some(&Value::Guid(uuid::Uuid::nil())));
    assert_eq!(
        lambda.value(nodes[6]).and_then(Value::as_expression).map(|e| e.to_string()),
        Some("../*/foo".to_string())
    );
}

#[test]
fn test_unknown_type() {
    let registry = TypeRegistry::new();
    let result = Parser::new(&registry).parse("foo:bar:baz");
    assert_eq!(result.unwrap_err(), HyperlambdaError::UnknownType("bar".to_string()));
}

#[test]
fn test_invalid_value() {
    let registry = TypeRegistry::new();
    match Parser::new(&registry).parse("foo:int:abc") {
        Err(HyperlambdaError::InvalidValue { tag, value, .. }) => {
            assert_eq!(tag, "int");
            assert_eq!(value, "abc");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn test_node_literal_becomes_detached_tree() {
    let lambda = parse("foo:node:\"bar:int:5\"");
    let foo = top(&lambda)[0];
    let Some(Value::Node(container)) = lambda.value(foo) else {
        panic!("expected a node value");
    };
    let container = *container;
    assert_eq!(lambda.parent(container), None);
    let bar = lambda.children(container)[0];
    assert_eq!(lambda.name(bar), "bar");
    assert_eq!(lambda.value(bar), Some(&Value::Int(5)));
    // The nested nodes are not part of the document itself
    assert_eq!(lambda.children(foo).len(), 0);
}

#[test]
fn test_node_literal_multiline() {
    let lambda = parse("foo:node:@\"bar\n   baz:int:1\"");
    let foo = top(&lambda)[0];
    let container = lambda.get::<NodeId>(foo).unwrap();
    let bar = lambda.children(container)[0];
    assert_eq!(lambda.children(bar).len(), 1);
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comments_dropped_by_default() {
    let lambda = parse("// hello\nfoo\n/* block */\nbar");
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "bar"]);
}

#[test]
fn test_comments_kept_as_nodes() {
    let lambda = hyperlambda::parse_with_comments("// hello\nfoo\n/*\n * a\n * b\n */\nbar").unwrap();
    let nodes = top(&lambda);
    assert_eq!(names(&lambda, &nodes), vec![COMMENT_NODE, "foo", COMMENT_NODE, "bar"]);
    assert_eq!(lambda.value(nodes[0]), Some(&Value::from("hello")));
    assert_eq!(lambda.value(nodes[2]), Some(&Value::from("a\r\nb")));
}

#[test]
fn test_indented_comment_belongs_to_parent() {
    let lambda = hyperlambda::parse_with_comments("foo\n   // about bar\n   bar").unwrap();
    let foo = top(&lambda)[0];
    assert_eq!(names(&lambda, lambda.children(foo)), vec![COMMENT_NODE, "bar"]);
}

#[test]
fn test_empty_line_comment_does_not_change_scope() {
    let lambda = parse("foo\n   bar\n   //\nbaz");
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "baz"]);
    assert_eq!(names(&lambda, lambda.children(top(&lambda)[0])), vec!["bar"]);
}

#[test]
fn test_empty_block_comment_does_not_change_scope() {
    let lambda = parse("foo\n   bar\n   /**/\nbaz");
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "baz"]);

    let lambda = hyperlambda::parse_with_comments("foo\n   bar\n   /**/\n   qux\nbaz").unwrap();
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "baz"]);
    assert_eq!(names(&lambda, lambda.children(top(&lambda)[0])), vec!["bar", "qux"]);
}

#[test]
fn test_comment_cannot_have_children() {
    let registry = TypeRegistry::new();
    let result = Parser::new(&registry).with_comments().parse("// c\n   foo");
    assert!(matches!(result, Err(HyperlambdaError::Syntax { .. })));
}

// ============================================================================
// Bytes and free functions
// ============================================================================

#[test]
fn test_parse_bytes() {
    let lambda = hyperlambda::parse_bytes("foo:int:5\r\nbar".as_bytes()).unwrap();
    assert_eq!(names(&lambda, &top(&lambda)), vec!["foo", "bar"]);
}

#[test]
fn test_parse_bytes_invalid_utf8() {
    match hyperlambda::parse_bytes(b"foo\nba\xff") {
        Err(HyperlambdaError::Syntax { position, context, .. }) => {
            assert_eq!(position.line, 2);
            assert_eq!(position.column, 3);
            assert!(context.ends_with("ba"));
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_parse_into_existing_node() {
    let registry = TypeRegistry::new();
    let mut lambda = Lambda::new();
    let target = lambda.create("target", None);
    lambda.add(lambda.root(), target);
    Parser::new(&registry).parse_into("a\nb", &mut lambda, target).unwrap();
    assert_eq!(names(&lambda, lambda.children(target)), vec!["a", "b"]);
}

#[test]
fn test_global_parse_matches_local_registry() {
    let global = hyperlambda::parse("foo:int:5\n   bar").unwrap();
    let local = parse("foo:int:5\n   bar");
    assert!(global.structurally_equal(global.root(), &local, local.root()));
}
