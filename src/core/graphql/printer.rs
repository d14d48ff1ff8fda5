//! Canonical text form of IR definitions.

use std::fmt::Write as _;

use async_graphql_value::Value;

use super::ir::{
    Argument, CompilerContext, Directive, Field, Fragment, InlineFragment, Node, Root, Selection,
    VariableDefinition,
};

const INDENT: &str = "  ";

/// Print a GraphQL literal value.
pub fn print_value(value: &Value) -> String {
    match value {
        Value::Variable(name) => format!("${name}"),
        Value::Null => "null".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote(text),
        Value::Boolean(flag) => flag.to_string(),
        Value::Binary(bytes) => quote(&String::from_utf8_lossy(bytes)),
        Value::Enum(name) => name.to_string(),
        Value::List(items) => {
            let items: Vec<_> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<_> = fields
                .iter()
                .map(|(name, value)| format!("{name}: {}", print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn quote(text: &str) -> String {
    // JSON string escaping is a subset of GraphQL string escaping.
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

/// Print one definition, terminated by a newline.
pub fn print_node(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Root(root) => print_root(&mut out, root),
        Node::Fragment(fragment) => print_fragment(&mut out, fragment),
    }
    out
}

/// The root named `name` plus every fragment it reaches, each printed and
/// joined with a newline. `None` when no such root exists.
pub fn print_root_with_fragments(context: &CompilerContext, name: &str) -> Option<String> {
    let nodes = filter_context_for_root(context, name)?;
    Some(nodes.iter().map(|node| print_node(node)).collect::<Vec<_>>().join("\n"))
}

/// Restrict `context` to the root named `name` and the fragments reachable from it.
pub fn filter_context_for_root<'a>(context: &'a CompilerContext, name: &str) -> Option<Vec<&'a Node>> {
    context.filter_for_root(name)
}

fn print_root(out: &mut String, root: &Root) {
    out.push_str(root.operation.keyword());
    out.push(' ');
    out.push_str(&root.name);
    print_variables(out, &root.variables);
    print_directives(out, &root.directives);
    print_selections(out, &root.selections, 0);
    out.push('\n');
}

fn print_fragment(out: &mut String, fragment: &Fragment) {
    let _ = write!(out, "fragment {} on {}", fragment.name, fragment.type_condition);
    print_directives(out, &fragment.directives);
    print_selections(out, &fragment.selections, 0);
    out.push('\n');
}

fn print_variables(out: &mut String, variables: &[VariableDefinition]) {
    if variables.is_empty() {
        return;
    }
    let printed: Vec<_> = variables
        .iter()
        .map(|variable| {
            let mut text = format!("${}: {}", variable.name, variable.ty);
            if let Some(default) = &variable.default_value {
                let _ = write!(text, " = {}", print_value(default));
            }
            print_directives(&mut text, &variable.directives);
            text
        })
        .collect();
    let _ = write!(out, "({})", printed.join(", "));
}

fn print_arguments(out: &mut String, arguments: &[Argument]) {
    if arguments.is_empty() {
        return;
    }
    let printed: Vec<_> = arguments
        .iter()
        .map(|argument| format!("{}: {}", argument.name, print_value(&argument.value)))
        .collect();
    let _ = write!(out, "({})", printed.join(", "));
}

fn print_directives(out: &mut String, directives: &[Directive]) {
    for directive in directives {
        let _ = write!(out, " @{}", directive.name);
        print_arguments(out, &directive.arguments);
    }
}

/// Prints ` {` + indented selections + `}`, or nothing for an empty set.
fn print_selections(out: &mut String, selections: &[Selection], depth: usize) {
    if selections.is_empty() {
        return;
    }
    out.push_str(" {\n");
    for selection in selections {
        out.push_str(&INDENT.repeat(depth + 1));
        match selection {
            Selection::Field(field) => print_field(out, field, depth + 1),
            Selection::FragmentSpread(spread) => {
                let _ = write!(out, "...{}", spread.name);
                print_directives(out, &spread.directives);
            }
            Selection::InlineFragment(inline) => print_inline(out, inline, depth + 1),
        }
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

fn print_field(out: &mut String, field: &Field, depth: usize) {
    if let Some(alias) = &field.alias {
        let _ = write!(out, "{alias}: ");
    }
    out.push_str(&field.name);
    print_arguments(out, &field.arguments);
    print_directives(out, &field.directives);
    print_selections(out, &field.selections, depth);
}

fn print_inline(out: &mut String, inline: &InlineFragment, depth: usize) {
    out.push_str("...");
    if let Some(condition) = &inline.type_condition {
        let _ = write!(out, " on {condition}");
    }
    print_directives(out, &inline.directives);
    print_selections(out, &inline.selections, depth);
}
