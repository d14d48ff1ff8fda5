//! Schema-aware validation of query documents.
//!
//! The rule set covers what a page query needs to be well typed. Rules that
//! span documents, such as unique names and known fragments, are checked by
//! the compiler once every file has been read.

use std::{collections::HashMap, fmt};

use async_graphql_parser::{
    Pos, Positioned,
    types::{Directive, Field, Selection, SelectionSet, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name, Value};

use super::{
    document::{Document, ExecutableDefinition},
    printer::print_value,
    schema::{InputValueDef, Schema, TypeDefKind, TypeRef},
};

/// A validation rule applied to every extracted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    ArgumentsOfCorrectType,
    DefaultValuesOfCorrectType,
    FragmentsOnCompositeTypes,
    KnownTypeNames,
    LoneAnonymousOperation,
    PossibleFragmentSpreads,
    ScalarLeafs,
    VariablesAreInputTypes,
    VariablesInAllowedPosition,
}

impl ValidationRule {
    pub fn name(self) -> &'static str {
        match self {
            ValidationRule::ArgumentsOfCorrectType => "ArgumentsOfCorrectType",
            ValidationRule::DefaultValuesOfCorrectType => "DefaultValuesOfCorrectType",
            ValidationRule::FragmentsOnCompositeTypes => "FragmentsOnCompositeTypes",
            ValidationRule::KnownTypeNames => "KnownTypeNames",
            ValidationRule::LoneAnonymousOperation => "LoneAnonymousOperation",
            ValidationRule::PossibleFragmentSpreads => "PossibleFragmentSpreads",
            ValidationRule::ScalarLeafs => "ScalarLeafs",
            ValidationRule::VariablesAreInputTypes => "VariablesAreInputTypes",
            ValidationRule::VariablesInAllowedPosition => "VariablesInAllowedPosition",
        }
    }
}

/// Rules every document is validated with.
pub const STANDARD_RULES: &[ValidationRule] = &[
    ValidationRule::ArgumentsOfCorrectType,
    ValidationRule::DefaultValuesOfCorrectType,
    ValidationRule::FragmentsOnCompositeTypes,
    ValidationRule::KnownTypeNames,
    ValidationRule::LoneAnonymousOperation,
    ValidationRule::PossibleFragmentSpreads,
    ValidationRule::ScalarLeafs,
    ValidationRule::VariablesAreInputTypes,
    ValidationRule::VariablesInAllowedPosition,
];

/// One rule violation, located within the tagged template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: &'static str,
    pub message: String,
    /// 1-based line and column inside the document text.
    pub location: Option<(usize, usize)>,
}

impl Violation {
    pub fn new(
        rule: &'static str,
        message: impl Into<String>,
        location: Option<(usize, usize)>,
    ) -> Self {
        Self {
            rule,
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)?;
        if let Some((line, column)) = self.location {
            write!(f, " ({line}:{column})")?;
        }
        Ok(())
    }
}

/// Validate `document` against `schema` with the given rules.
///
/// `fragment_types` maps fragment names defined anywhere in the project to
/// their type conditions, so spreads of fragments from other files can be
/// checked too.
pub fn validate(
    schema: &Schema,
    document: &Document,
    fragment_types: &HashMap<String, String>,
    rules: &[ValidationRule],
) -> Vec<Violation> {
    let mut known_fragments = fragment_types.clone();
    for definition in &document.definitions {
        if let ExecutableDefinition::Fragment { name, definition } = definition {
            known_fragments.insert(
                name.clone(),
                definition.node.type_condition.node.on.node.to_string(),
            );
        }
    }

    let mut validator = Validator {
        schema,
        fragment_types: &known_fragments,
        rules,
        violations: Vec::new(),
        usages: Vec::new(),
        spreads: Vec::new(),
    };

    if document.operation_count() > 1 {
        for definition in &document.definitions {
            if let ExecutableDefinition::Operation { name: None, definition } = definition {
                validator.report(
                    ValidationRule::LoneAnonymousOperation,
                    definition.pos,
                    "This anonymous operation must be the only defined operation.".to_string(),
                );
            }
        }
    }

    let mut walked_fragments: HashMap<&str, Walked> = HashMap::new();
    let mut walked_operations = Vec::new();

    for definition in &document.definitions {
        match definition {
            ExecutableDefinition::Operation { definition, .. } => {
                let operation = &definition.node;
                for variable in &operation.variable_definitions {
                    validator.variable_definition(variable);
                }
                if let Some(root) = schema.root_type(operation.ty) {
                    validator.selection_set(&root.name, &operation.selection_set);
                }
                for directive in &operation.directives {
                    validator.directive(directive);
                }
                walked_operations.push((&operation.variable_definitions, validator.take_walk()));
            }
            ExecutableDefinition::Fragment { name, definition } => {
                let fragment = &definition.node;
                let condition = &fragment.type_condition.node.on;
                if validator.check_type_condition(Some(name), condition) {
                    validator.selection_set(condition.node.as_str(), &fragment.selection_set);
                }
                for directive in &fragment.directives {
                    validator.directive(directive);
                }
                walked_fragments.insert(name.as_str(), validator.take_walk());
            }
        }
    }

    for (variables, walked) in &walked_operations {
        let mut usages: Vec<&VariableUsage> = walked.usages.iter().collect();
        let mut queue: Vec<&str> = walked.spreads.iter().map(String::as_str).collect();
        let mut seen: Vec<&str> = Vec::new();
        while let Some(spread) = queue.pop() {
            if seen.contains(&spread) {
                continue;
            }
            seen.push(spread);
            if let Some(fragment) = walked_fragments.get(spread) {
                usages.extend(fragment.usages.iter());
                queue.extend(fragment.spreads.iter().map(String::as_str));
            }
        }
        validator.check_variable_usages(variables, &usages);
    }

    validator.violations
}

#[derive(Debug, Default)]
struct Walked {
    usages: Vec<VariableUsage>,
    spreads: Vec<String>,
}

#[derive(Debug)]
struct VariableUsage {
    name: String,
    expected: TypeRef,
    has_location_default: bool,
    pos: Pos,
}

struct Validator<'a> {
    schema: &'a Schema,
    fragment_types: &'a HashMap<String, String>,
    rules: &'a [ValidationRule],
    violations: Vec<Violation>,
    usages: Vec<VariableUsage>,
    spreads: Vec<String>,
}

impl Validator<'_> {
    fn report(&mut self, rule: ValidationRule, pos: Pos, message: String) {
        if self.rules.contains(&rule) {
            self.violations.push(Violation::new(
                rule.name(),
                message,
                Some((pos.line, pos.column)),
            ));
        }
    }

    fn take_walk(&mut self) -> Walked {
        Walked {
            usages: std::mem::take(&mut self.usages),
            spreads: std::mem::take(&mut self.spreads),
        }
    }

    fn variable_definition(&mut self, variable: &Positioned<VariableDefinition>) {
        let definition = &variable.node;
        let name = &definition.name.node;
        let ty = TypeRef::from_ast(&definition.var_type.node);

        match self.schema.get_type(ty.named()) {
            None => {
                self.report(
                    ValidationRule::KnownTypeNames,
                    definition.var_type.pos,
                    format!("Unknown type \"{}\".", ty.named()),
                );
                return;
            }
            Some(type_def) if !type_def.kind.is_input() => {
                self.report(
                    ValidationRule::VariablesAreInputTypes,
                    definition.var_type.pos,
                    format!("Variable \"${name}\" cannot be non-input type \"{ty}\"."),
                );
                return;
            }
            Some(_) => {}
        }

        if let Some(default) = &definition.default_value {
            let value = default.node.clone().into_value();
            if let Err(detail) = self.check_literal(&value, &ty) {
                self.report(
                    ValidationRule::DefaultValuesOfCorrectType,
                    default.pos,
                    format!(
                        "Variable \"${name}\" of type \"{ty}\" has invalid default value {}. {detail}",
                        print_value(&value)
                    ),
                );
            }
        }
    }

    /// Reports problems with a type condition; true when the body can be walked.
    fn check_type_condition(&mut self, fragment: Option<&str>, condition: &Positioned<Name>) -> bool {
        let type_name = condition.node.as_str();
        match self.schema.get_type(type_name) {
            None => {
                self.report(
                    ValidationRule::KnownTypeNames,
                    condition.pos,
                    format!("Unknown type \"{type_name}\"."),
                );
                false
            }
            Some(type_def) if !type_def.kind.is_composite() => {
                let message = match fragment {
                    Some(name) => format!(
                        "Fragment \"{name}\" cannot condition on non composite type \"{type_name}\"."
                    ),
                    None => format!(
                        "Fragment cannot condition on non composite type \"{type_name}\"."
                    ),
                };
                self.report(ValidationRule::FragmentsOnCompositeTypes, condition.pos, message);
                false
            }
            Some(_) => true,
        }
    }

    fn selection_set(&mut self, parent: &str, set: &Positioned<SelectionSet>) {
        for item in &set.node.items {
            match &item.node {
                Selection::Field(field) => self.field(parent, field),
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if let Some(fragment_type) = self.fragment_types.get(name)
                        && self.schema.is_composite(fragment_type)
                        && !self.schema.types_overlap(parent, fragment_type)
                    {
                        self.report(
                            ValidationRule::PossibleFragmentSpreads,
                            spread.pos,
                            format!(
                                "Fragment \"{name}\" cannot be spread here as objects of type \"{parent}\" can never be of type \"{fragment_type}\"."
                            ),
                        );
                    }
                    if !self.spreads.iter().any(|seen| seen == name) {
                        self.spreads.push(name.to_string());
                    }
                    for directive in &spread.node.directives {
                        self.directive(directive);
                    }
                }
                Selection::InlineFragment(inline) => {
                    for directive in &inline.node.directives {
                        self.directive(directive);
                    }
                    let Some(condition) = &inline.node.type_condition else {
                        self.selection_set(parent, &inline.node.selection_set);
                        continue;
                    };
                    let condition = &condition.node.on;
                    if !self.check_type_condition(None, condition) {
                        continue;
                    }
                    let type_name = condition.node.as_str();
                    if !self.schema.types_overlap(parent, type_name) {
                        self.report(
                            ValidationRule::PossibleFragmentSpreads,
                            inline.pos,
                            format!(
                                "Fragment cannot be spread here as objects of type \"{parent}\" can never be of type \"{type_name}\"."
                            ),
                        );
                    }
                    self.selection_set(type_name, &inline.node.selection_set);
                }
            }
        }
    }

    fn field(&mut self, parent: &str, field: &Positioned<Field>) {
        let ast = &field.node;
        let name = ast.name.node.as_str();
        // Unknown fields are reported when converting to IR.
        let Some(definition) = self.schema.field(parent, name) else {
            return;
        };
        let definition = definition.clone();

        self.arguments(&ast.arguments, &definition.args);
        for directive in &ast.directives {
            self.directive(directive);
        }

        let type_name = definition.ty.named();
        let Some(kind) = self.schema.get_type(type_name).map(|def| def.kind) else {
            return;
        };
        let has_selection = !ast.selection_set.node.items.is_empty();
        if kind.is_leaf() && has_selection {
            self.report(
                ValidationRule::ScalarLeafs,
                ast.selection_set.pos,
                format!(
                    "Field \"{name}\" must not have a selection since type \"{}\" has no subfields.",
                    definition.ty
                ),
            );
        } else if kind.is_composite() && !has_selection {
            self.report(
                ValidationRule::ScalarLeafs,
                field.pos,
                format!(
                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                    definition.ty
                ),
            );
        } else if kind.is_composite() {
            self.selection_set(type_name, &ast.selection_set);
        }
    }

    fn directive(&mut self, directive: &Positioned<Directive>) {
        let Some(definition) = self.schema.directive(directive.node.name.node.as_str()) else {
            return;
        };
        let args = definition.args.clone();
        self.arguments(&directive.node.arguments, &args);
    }

    fn arguments(
        &mut self,
        arguments: &[(Positioned<Name>, Positioned<Value>)],
        definitions: &[InputValueDef],
    ) {
        for (name, value) in arguments {
            let Some(definition) = definitions.iter().find(|def| def.name == name.node.as_str())
            else {
                continue;
            };
            if let Err(detail) = self.check_literal(&value.node, &definition.ty) {
                self.report(
                    ValidationRule::ArgumentsOfCorrectType,
                    value.pos,
                    format!(
                        "Argument \"{}\" has invalid value {}. {detail}",
                        name.node,
                        print_value(&value.node)
                    ),
                );
            }
            self.collect_usages(
                &value.node,
                &definition.ty,
                definition.default_value.is_some(),
                value.pos,
            );
        }
    }

    fn collect_usages(&mut self, value: &Value, expected: &TypeRef, has_default: bool, pos: Pos) {
        match value {
            Value::Variable(name) => self.usages.push(VariableUsage {
                name: name.to_string(),
                expected: expected.clone(),
                has_location_default: has_default,
                pos,
            }),
            Value::List(items) => {
                let item_type = match expected.nullable() {
                    TypeRef::List(inner) => inner.as_ref().clone(),
                    other => other.clone(),
                };
                for item in items {
                    self.collect_usages(item, &item_type, false, pos);
                }
            }
            Value::Object(fields) => {
                let Some(type_def) = self.schema.get_type(expected.named()) else {
                    return;
                };
                let input_fields = type_def.input_fields.clone();
                for (key, field_value) in fields {
                    if let Some(field) = input_fields.iter().find(|f| f.name == key.as_str()) {
                        self.collect_usages(
                            field_value,
                            &field.ty,
                            field.default_value.is_some(),
                            pos,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn check_variable_usages(
        &mut self,
        variables: &[Positioned<VariableDefinition>],
        usages: &[&VariableUsage],
    ) {
        for usage in usages {
            let Some(variable) = variables
                .iter()
                .find(|var| var.node.name.node.as_str() == usage.name)
            else {
                continue;
            };
            let var_type = TypeRef::from_ast(&variable.node.var_type.node);
            if !allowed_variable_usage(
                &var_type,
                variable
                    .node
                    .default_value
                    .as_ref()
                    .is_some_and(|value| value.node != ConstValue::Null),
                &usage.expected,
                usage.has_location_default,
            ) {
                self.report(
                    ValidationRule::VariablesInAllowedPosition,
                    usage.pos,
                    format!(
                        "Variable \"${}\" of type \"{var_type}\" used in position expecting type \"{}\".",
                        usage.name, usage.expected
                    ),
                );
            }
        }
    }

    /// Checks a literal against an input type; variables are always accepted here.
    fn check_literal(&self, value: &Value, ty: &TypeRef) -> Result<(), String> {
        let mismatch = || {
            Err(format!(
                "Expected type \"{ty}\", found {}.",
                print_value(value)
            ))
        };
        match (value, ty) {
            (Value::Variable(_), _) => Ok(()),
            (Value::Null, TypeRef::NonNull(_)) => mismatch(),
            (_, TypeRef::NonNull(inner)) => self.check_literal(value, inner),
            (Value::Null, _) => Ok(()),
            (Value::List(items), TypeRef::List(inner)) => items
                .iter()
                .try_for_each(|item| self.check_literal(item, inner)),
            (_, TypeRef::List(inner)) => self.check_literal(value, inner),
            (_, TypeRef::Named(name)) => {
                let Some(type_def) = self.schema.get_type(name) else {
                    return Ok(());
                };
                match type_def.kind {
                    TypeDefKind::Scalar => {
                        if scalar_accepts(name, value) {
                            Ok(())
                        } else {
                            mismatch()
                        }
                    }
                    TypeDefKind::Enum => match value {
                        Value::Enum(variant)
                            if type_def.enum_values.iter().any(|v| v == variant.as_str()) =>
                        {
                            Ok(())
                        }
                        _ => mismatch(),
                    },
                    TypeDefKind::InputObject => {
                        let Value::Object(fields) = value else {
                            return mismatch();
                        };
                        for (key, field_value) in fields {
                            let Some(field) = type_def.input_field(key.as_str()) else {
                                return Err(format!(
                                    "Field \"{key}\" is not defined by type \"{name}\"."
                                ));
                            };
                            self.check_literal(field_value, &field.ty)?;
                        }
                        for field in &type_def.input_fields {
                            let provided = fields.keys().any(|key| key.as_str() == field.name);
                            if !provided && field.ty.is_non_null() && field.default_value.is_none() {
                                return Err(format!(
                                    "Field \"{name}.{}\" of required type \"{}\" was not provided.",
                                    field.name, field.ty
                                ));
                            }
                        }
                        Ok(())
                    }
                    _ => mismatch(),
                }
            }
        }
    }
}

fn scalar_accepts(name: &str, value: &Value) -> bool {
    match name {
        "Int" => matches!(value, Value::Number(n)
            if n.as_i64().is_some_and(|i| i32::try_from(i).is_ok())),
        "Float" => matches!(value, Value::Number(_)),
        "String" => matches!(value, Value::String(_)),
        "Boolean" => matches!(value, Value::Boolean(_)),
        "ID" => matches!(value, Value::String(_))
            || matches!(value, Value::Number(n) if n.is_i64() || n.is_u64()),
        // Custom scalars accept any literal.
        _ => true,
    }
}

fn allowed_variable_usage(
    var_type: &TypeRef,
    has_non_null_default: bool,
    location_type: &TypeRef,
    has_location_default: bool,
) -> bool {
    if let TypeRef::NonNull(inner) = location_type
        && !var_type.is_non_null()
    {
        if !has_non_null_default && !has_location_default {
            return false;
        }
        return is_subtype(var_type, inner);
    }
    is_subtype(var_type, location_type)
}

fn is_subtype(sub: &TypeRef, sup: &TypeRef) -> bool {
    match (sub, sup) {
        (TypeRef::NonNull(sub), TypeRef::NonNull(sup)) => is_subtype(sub, sup),
        (_, TypeRef::NonNull(_)) => false,
        (TypeRef::NonNull(sub), sup) => is_subtype(sub, sup),
        (TypeRef::List(sub), TypeRef::List(sup)) => is_subtype(sub, sup),
        (TypeRef::List(_), _) | (_, TypeRef::List(_)) => false,
        (TypeRef::Named(sub), TypeRef::Named(sup)) => sub == sup,
    }
}
