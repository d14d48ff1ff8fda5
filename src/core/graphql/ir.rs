//! Typed intermediate representation of validated query documents.
//!
//! Conversion resolves every field against the schema, so each field knows
//! the named type of its value. Definitions are collected into a
//! [`CompilerContext`], which keeps them in insertion order and enforces
//! project-wide name uniqueness.

use std::collections::HashMap;

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        Directive as AstDirective, Field as AstField, OperationType, Selection as AstSelection,
        SelectionSet,
    },
};
use async_graphql_value::{Name, Value};

use super::{
    document::{Document, ExecutableDefinition},
    schema::{Schema, TypeRef},
    validate::Violation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    /// Named type of the field's value.
    pub type_name: String,
    pub selections: Vec<Selection>,
}

impl Field {
    /// The key under which the field appears in a response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub name: String,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

/// A named root operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub name: String,
    pub operation: OperationKind,
    pub type_name: String,
    pub variables: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<Directive>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Root(Root),
    Fragment(Fragment),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Root(root) => &root.name,
            Node::Fragment(fragment) => &fragment.name,
        }
    }

    /// Type the node's top-level selections apply to.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Root(root) => &root.type_name,
            Node::Fragment(fragment) => &fragment.type_condition,
        }
    }

    pub fn selections(&self) -> &[Selection] {
        match self {
            Node::Root(root) => &root.selections,
            Node::Fragment(fragment) => &fragment.selections,
        }
    }

    /// Same node with its selections replaced.
    pub fn with_selections(&self, selections: Vec<Selection>) -> Node {
        match self {
            Node::Root(root) => Node::Root(Root {
                selections,
                ..root.clone()
            }),
            Node::Fragment(fragment) => Node::Fragment(Fragment {
                selections,
                ..fragment.clone()
            }),
        }
    }
}

/// Names of the fragments spread anywhere inside `selections`, in order.
pub fn fragment_spreads(selections: &[Selection]) -> Vec<&str> {
    let mut names = Vec::new();
    collect_spreads(selections, &mut names);
    names
}

fn collect_spreads<'a>(selections: &'a [Selection], names: &mut Vec<&'a str>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => collect_spreads(&field.selections, names),
            Selection::InlineFragment(inline) => collect_spreads(&inline.selections, names),
            Selection::FragmentSpread(spread) => {
                if !names.contains(&spread.name.as_str()) {
                    names.push(&spread.name);
                }
            }
        }
    }
}

/// Definitions keyed by unique name, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CompilerContext {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; a second definition with the same name is rejected.
    pub fn add(&mut self, node: Node) -> Result<(), Violation> {
        if self.index.contains_key(node.name()) {
            return Err(Violation::new(
                "UniqueDefinitionNames",
                format!(
                    "Duplicate definition named \"{}\"; operation and fragment names must be unique across the project.",
                    node.name()
                ),
                None,
            ));
        }
        self.index.insert(node.name().to_string(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn documents(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn get_fragment(&self, name: &str) -> Option<&Fragment> {
        match self.get(name)? {
            Node::Fragment(fragment) => Some(fragment),
            Node::Root(_) => None,
        }
    }

    /// A new context with `transform` applied to every node.
    pub fn map_nodes(&self, mut transform: impl FnMut(&Node) -> Node) -> CompilerContext {
        Self {
            nodes: self.nodes.iter().map(&mut transform).collect(),
            index: self.index.clone(),
        }
    }

    /// Spreads of fragments that are not defined anywhere, with the name of
    /// the definition containing each spread.
    pub fn check_fragment_references(&self) -> Vec<(&str, Violation)> {
        let mut violations = Vec::new();
        for node in &self.nodes {
            for name in fragment_spreads(node.selections()) {
                if self.get_fragment(name).is_none() {
                    violations.push((
                        node.name(),
                        Violation::new(
                            "KnownFragmentNames",
                            format!("Unknown fragment \"{name}\" used in \"{}\".", node.name()),
                            None,
                        ),
                    ));
                }
            }
        }
        violations
    }

    /// The root plus every fragment reachable from it, root first.
    pub fn filter_for_root(&self, name: &str) -> Option<Vec<&Node>> {
        let root = self.get(name).filter(|node| matches!(node, Node::Root(_)))?;
        let mut reachable = vec![root];
        let mut cursor = 0;
        while cursor < reachable.len() {
            for spread in fragment_spreads(reachable[cursor].selections()) {
                if let Some(node) = self.get(spread)
                    && !reachable.iter().any(|seen| seen.name() == spread)
                {
                    reachable.push(node);
                }
            }
            cursor += 1;
        }
        Some(reachable)
    }
}

/// Convert a validated document into IR nodes.
///
/// Fields and arguments are resolved against the schema here; anything the
/// schema does not define is reported as a violation.
pub fn convert_document(schema: &Schema, document: &Document) -> Result<Vec<Node>, Vec<Violation>> {
    let mut converter = Converter {
        schema,
        violations: Vec::new(),
    };
    let mut nodes = Vec::new();

    for definition in &document.definitions {
        match definition {
            ExecutableDefinition::Operation { name, definition } => {
                let Some(name) = name else {
                    converter.report(
                        "NamedOperations",
                        definition.pos,
                        "Operations must be named so their compiled text can be stored.".to_string(),
                    );
                    continue;
                };
                let operation = &definition.node;
                let Some(root_type) = schema.root_type(operation.ty) else {
                    converter.report(
                        "KnownOperationTypes",
                        definition.pos,
                        format!(
                            "Schema does not define a {} root type.",
                            OperationKind::from(operation.ty).keyword()
                        ),
                    );
                    continue;
                };
                let variables = operation
                    .variable_definitions
                    .iter()
                    .map(|var| VariableDefinition {
                        name: var.node.name.node.to_string(),
                        ty: TypeRef::from_ast(&var.node.var_type.node),
                        default_value: var
                            .node
                            .default_value
                            .as_ref()
                            .map(|value| value.node.clone().into_value()),
                        directives: convert_directives(&var.node.directives),
                    })
                    .collect();
                let selections = converter.selection_set(&root_type.name, &operation.selection_set);
                nodes.push(Node::Root(Root {
                    name: name.clone(),
                    operation: operation.ty.into(),
                    type_name: root_type.name.clone(),
                    variables,
                    directives: convert_directives(&operation.directives),
                    selections,
                }));
            }
            ExecutableDefinition::Fragment { name, definition } => {
                let fragment = &definition.node;
                let type_condition = fragment.type_condition.node.on.node.to_string();
                let selections = converter.selection_set(&type_condition, &fragment.selection_set);
                nodes.push(Node::Fragment(Fragment {
                    name: name.clone(),
                    type_condition,
                    directives: convert_directives(&fragment.directives),
                    selections,
                }));
            }
        }
    }

    if converter.violations.is_empty() {
        Ok(nodes)
    } else {
        Err(converter.violations)
    }
}

struct Converter<'a> {
    schema: &'a Schema,
    violations: Vec<Violation>,
}

impl Converter<'_> {
    fn report(&mut self, rule: &'static str, pos: Pos, message: String) {
        self.violations
            .push(Violation::new(rule, message, Some((pos.line, pos.column))));
    }

    fn selection_set(&mut self, parent: &str, set: &Positioned<SelectionSet>) -> Vec<Selection> {
        let mut selections = Vec::new();
        for item in &set.node.items {
            match &item.node {
                AstSelection::Field(field) => {
                    if let Some(field) = self.field(parent, field) {
                        selections.push(Selection::Field(field));
                    }
                }
                AstSelection::FragmentSpread(spread) => {
                    selections.push(Selection::FragmentSpread(FragmentSpread {
                        name: spread.node.fragment_name.node.to_string(),
                        directives: convert_directives(&spread.node.directives),
                    }));
                }
                AstSelection::InlineFragment(inline) => {
                    let type_condition = inline
                        .node
                        .type_condition
                        .as_ref()
                        .map(|condition| condition.node.on.node.to_string());
                    let target = type_condition.clone().unwrap_or_else(|| parent.to_string());
                    selections.push(Selection::InlineFragment(InlineFragment {
                        type_condition,
                        directives: convert_directives(&inline.node.directives),
                        selections: self.selection_set(&target, &inline.node.selection_set),
                    }));
                }
            }
        }
        selections
    }

    fn field(&mut self, parent: &str, field: &Positioned<AstField>) -> Option<Field> {
        let ast = &field.node;
        let name = ast.name.node.as_str();
        let Some(definition) = self.schema.field(parent, name) else {
            self.report(
                "FieldsOnCorrectType",
                field.pos,
                format!("Cannot query field \"{name}\" on type \"{parent}\"."),
            );
            return None;
        };

        for (arg_name, _) in &ast.arguments {
            if definition.arg(arg_name.node.as_str()).is_none() {
                self.report(
                    "KnownArgumentNames",
                    arg_name.pos,
                    format!(
                        "Unknown argument \"{}\" on field \"{parent}.{name}\".",
                        arg_name.node
                    ),
                );
            }
        }

        let type_name = definition.ty.named().to_string();
        let selections = self.selection_set(&type_name, &ast.selection_set);
        Some(Field {
            alias: ast.alias.as_ref().map(|alias| alias.node.to_string()),
            name: name.to_string(),
            arguments: convert_arguments(&ast.arguments),
            directives: convert_directives(&ast.directives),
            type_name,
            selections,
        })
    }
}

fn convert_arguments(arguments: &[(Positioned<Name>, Positioned<Value>)]) -> Vec<Argument> {
    arguments
        .iter()
        .map(|(name, value)| Argument {
            name: name.node.to_string(),
            value: value.node.clone(),
        })
        .collect()
}

fn convert_directives(directives: &[Positioned<AstDirective>]) -> Vec<Directive> {
    directives
        .iter()
        .map(|directive| Directive {
            name: directive.node.name.node.to_string(),
            arguments: convert_arguments(&directive.node.arguments),
        })
        .collect()
}
