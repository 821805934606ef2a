// tests/output_tests.rs

use std::fmt;

use hyperlambda::output::{to_hyperlambda, to_hyperlambda_with_comments};
use hyperlambda::{HyperlambdaPrinter, Lambda, Parser, TypeRegistry, Value};
use pretty_assertions::assert_eq;

fn generate(lambda: &Lambda) -> String {
    HyperlambdaPrinter::new(lambda, &TypeRegistry::new()).print()
}

fn single(name: &str, value: Option<Value>) -> Lambda {
    let mut lambda = Lambda::new();
    let node = lambda.create(name, value);
    lambda.add(lambda.root(), node);
    lambda
}

fn assert_reads_back(lambda: &Lambda) {
    let text = generate(lambda);
    let parsed = Parser::new(&TypeRegistry::new()).parse(&text).unwrap();
    assert!(
        lambda.structurally_equal(lambda.root(), &parsed, parsed.root()),
        "{text:?} did not read back"
    );
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_generate_empty() {
    assert_eq!(generate(&Lambda::new()), "");
}

#[test]
fn test_generate_nested() {
    let lambda = hyperlambda::parse("foo:int:5\n   bar:howdy\n      baz\nqux").unwrap();
    assert_eq!(
        generate(&lambda),
        "foo:int:5\r\n   bar:howdy\r\n      baz\r\nqux\r\n"
    );
}

#[test]
fn test_generate_subset() {
    let registry = TypeRegistry::new();
    let lambda = hyperlambda::parse("a\n   b\nc\nd:1").unwrap();
    let nodes = lambda.children(lambda.root());
    let printer = HyperlambdaPrinter::new(&lambda, &registry);
    assert_eq!(printer.print_nodes(&[nodes[2], nodes[0]]), "d:1\r\na\r\n   b\r\n");
}

#[test]
fn test_global_registry_output() {
    let lambda = hyperlambda::parse("foo:bool:true").unwrap();
    assert_eq!(to_hyperlambda(&lambda), "foo:bool:true\r\n");
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_plain_names_are_bare() {
    assert_eq!(generate(&single("foo", None)), "foo\r\n");
    assert_eq!(generate(&single("it's", None)), "it's\r\n");
    assert_eq!(generate(&single("a/b*", None)), "a/b*\r\n");
}

#[test]
fn test_names_needing_quotes() {
    assert_eq!(generate(&single("a:b", None)), "\"a:b\"\r\n");
    assert_eq!(generate(&single(" lead", None)), "\" lead\"\r\n");
    assert_eq!(generate(&single("trail ", None)), "\"trail \"\r\n");
    assert_eq!(generate(&single("'q", None)), "\"'q\"\r\n");
    assert_eq!(generate(&single("//x", None)), "\"//x\"\r\n");
    assert_eq!(generate(&single("/*x", None)), "\"/*x\"\r\n");
    assert_eq!(generate(&single("@\"x", None)), "\"@\\\"x\"\r\n");
}

#[test]
fn test_empty_name() {
    assert_eq!(generate(&single("", None)), "\"\"\r\n");
    assert_eq!(generate(&single("", Some(Value::from("x")))), ":x\r\n");
    assert_reads_back(&single("", None));
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_string_values() {
    assert_eq!(generate(&single("foo", Some(Value::from("bar")))), "foo:bar\r\n");
    assert_eq!(generate(&single("foo", Some(Value::from("")))), "foo:\r\n");
    assert_eq!(generate(&single("foo", Some(Value::from("it's")))), "foo:\"it's\"\r\n");
    assert_eq!(generate(&single("foo", Some(Value::from("a\"b")))), "foo:\"a\\\"b\"\r\n");
    assert_eq!(generate(&single("foo", Some(Value::from("c:\\temp")))), "foo:\"c:\\\\temp\"\r\n");
}

#[test]
fn test_multiline_values() {
    assert_eq!(
        generate(&single("foo", Some(Value::from("line1\r\nline2")))),
        "foo:@\"line1\r\nline2\"\r\n"
    );
    assert_eq!(
        generate(&single("foo", Some(Value::from("say \"hi\"\r\nbye")))),
        "foo:@\"say \"\"hi\"\"\r\nbye\"\r\n"
    );
}

#[test]
fn test_bare_line_feed_and_carriage_return_are_escaped() {
    assert_eq!(generate(&single("foo", Some(Value::from("a\nb")))), "foo:\"a\\nb\"\r\n");
    assert_eq!(generate(&single("foo", Some(Value::from("a\rb")))), "foo:\"a\\x000Db\"\r\n");
    assert_reads_back(&single("foo", Some(Value::from("a\nb\r\nc\rd"))));
}

#[test]
fn test_typed_values() {
    assert_eq!(generate(&single("foo", Some(Value::Int(5)))), "foo:int:5\r\n");
    assert_eq!(generate(&single("foo", Some(Value::Char(':')))), "foo:char:\":\"\r\n");
    assert_eq!(generate(&single("foo", Some(Value::Bytes(Vec::new())))), "foo:bytes:\"\"\r\n");
    assert_reads_back(&single("foo", Some(Value::Char(' '))));
    assert_reads_back(&single("foo", Some(Value::Bytes(Vec::new()))));
}

#[test]
fn test_date_value_is_quoted() {
    let lambda = hyperlambda::parse("foo:date:\"2020-12-23T23:59:11.000Z\"").unwrap();
    assert_eq!(generate(&lambda), "foo:date:\"2020-12-23T23:59:11.000Z\"\r\n");
}

#[test]
fn test_empty_node_value() {
    let mut lambda = Lambda::new();
    let container = lambda.create("", None);
    let foo = lambda.create("foo", Some(Value::Node(container)));
    lambda.add(lambda.root(), foo);
    assert_eq!(generate(&lambda), "foo:node:\"\"\r\n");
    assert_reads_back(&lambda);
}

#[test]
fn test_node_value_is_embedded_as_hyperlambda() {
    let mut lambda = Lambda::new();
    let howdy = lambda.create("howdy1", Some(Value::Int(5)));
    let inner = lambda.create_with_children("foo", None, [howdy]);
    let container = lambda.create_with_children("", None, [inner]);
    let foo = lambda.create("foo", Some(Value::Node(container)));
    lambda.add(lambda.root(), foo);

    assert_eq!(
        generate(&lambda),
        "foo:node:@\"foo\r\n   howdy1:int:5\r\n\"\r\n"
    );
    assert_reads_back(&lambda);
}

#[derive(Debug)]
struct Opaque;

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "opaque")
    }
}

#[test]
fn test_unregistered_value_never_fails() {
    let lambda = single("foo", Some(Value::custom(Opaque)));
    let output = HyperlambdaPrinter::new(&lambda, &TypeRegistry::strict()).print();
    assert!(output.starts_with("foo:[") || output.starts_with("foo:\"["), "{output}");
    assert!(output.ends_with("opaque\r\n"), "{output}");
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comments_written_back() {
    let lambda = hyperlambda::parse_with_comments("// hello\nfoo\n/*\n * a\n * b\n */\nbar").unwrap();
    assert_eq!(
        to_hyperlambda_with_comments(&lambda),
        "\r\n// hello\r\nfoo\r\n\r\n/*\r\n * a\r\n * b\r\n */\r\nbar\r\n"
    );
}

#[test]
fn test_indented_comment() {
    let lambda = hyperlambda::parse_with_comments("foo\n   // child\n   bar").unwrap();
    let text = to_hyperlambda_with_comments(&lambda);
    assert_eq!(text, "foo\r\n\r\n   // child\r\n   bar\r\n");

    let again = hyperlambda::parse_with_comments(&text).unwrap();
    assert!(lambda.structurally_equal(lambda.root(), &again, again.root()));
}

#[test]
fn test_comment_nodes_without_comment_mode() {
    let lambda = hyperlambda::parse_with_comments("// hello\nfoo").unwrap();
    assert_eq!(to_hyperlambda(&lambda), "..:hello\r\nfoo\r\n");
}
