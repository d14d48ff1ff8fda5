//! Immutable schema model built from GraphQL schema definition language.
//!
//! Only what the validator and the IR conversion need is kept: type kinds,
//! fields with their argument definitions, input fields, enum values,
//! union members and interface implementations, and directive arguments.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use async_graphql_parser::{
    parse_schema,
    types::{
        BaseType, FieldDefinition, InputValueDefinition, OperationType, ServiceDocument, Type,
        TypeKind, TypeSystemDefinition,
    },
};
use async_graphql_value::ConstValue;

use crate::core::error::SchemaError;

/// Directive declarations the schema file is assumed not to define.
pub const BUILTIN_DIRECTIVES: &str = "\
directive @include(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT
directive @skip(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT
";

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// A reference to a type, with list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn from_ast(ty: &Type) -> Self {
        let inner = match &ty.base {
            BaseType::Named(name) => TypeRef::Named(name.to_string()),
            BaseType::List(item) => TypeRef::List(Box::new(TypeRef::from_ast(item))),
        };
        if ty.nullable {
            inner
        } else {
            TypeRef::NonNull(Box::new(inner))
        }
    }

    /// The innermost named type.
    pub fn named(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Strips one non-null wrapper, if present.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeDefKind {
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TypeDefKind::Object | TypeDefKind::Interface | TypeDefKind::Union
        )
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, TypeDefKind::Scalar | TypeDefKind::Enum)
    }

    pub fn is_input(self) -> bool {
        matches!(
            self,
            TypeDefKind::Scalar | TypeDefKind::Enum | TypeDefKind::InputObject
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDef {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

impl InputValueDef {
    fn from_ast(def: &InputValueDefinition) -> Self {
        Self {
            name: def.name.node.to_string(),
            ty: TypeRef::from_ast(&def.ty.node),
            default_value: def.default_value.as_ref().map(|value| value.node.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub args: Vec<InputValueDef>,
    pub ty: TypeRef,
}

impl FieldDef {
    fn from_ast(def: &FieldDefinition) -> Self {
        Self {
            name: def.name.node.to_string(),
            args: def
                .arguments
                .iter()
                .map(|arg| InputValueDef::from_ast(&arg.node))
                .collect(),
            ty: TypeRef::from_ast(&def.ty.node),
        }
    }

    pub fn arg(&self, name: &str) -> Option<&InputValueDef> {
        self.args.iter().find(|arg| arg.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeDefKind,
    /// Output fields of object and interface types.
    pub fields: Vec<FieldDef>,
    /// Fields of input object types.
    pub input_fields: Vec<InputValueDef>,
    pub enum_values: Vec<String>,
    /// Members of a union type.
    pub members: Vec<String>,
    /// Interfaces implemented by an object or interface type.
    pub interfaces: Vec<String>,
}

impl TypeDef {
    fn new(name: impl Into<String>, kind: TypeDefKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            input_fields: Vec::new(),
            enum_values: Vec::new(),
            members: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    fn merge_kind(&mut self, kind: &TypeKind) {
        match kind {
            TypeKind::Scalar => {}
            TypeKind::Object(object) => {
                self.interfaces
                    .extend(object.implements.iter().map(|name| name.node.to_string()));
                self.fields
                    .extend(object.fields.iter().map(|field| FieldDef::from_ast(&field.node)));
            }
            TypeKind::Interface(interface) => {
                self.interfaces
                    .extend(interface.implements.iter().map(|name| name.node.to_string()));
                self.fields
                    .extend(interface.fields.iter().map(|field| FieldDef::from_ast(&field.node)));
            }
            TypeKind::Union(union) => {
                self.members
                    .extend(union.members.iter().map(|name| name.node.to_string()));
            }
            TypeKind::Enum(enum_type) => {
                self.enum_values
                    .extend(enum_type.values.iter().map(|value| value.node.value.node.to_string()));
            }
            TypeKind::InputObject(input) => {
                self.input_fields
                    .extend(input.fields.iter().map(|field| InputValueDef::from_ast(&field.node)));
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn input_field(&self, name: &str) -> Option<&InputValueDef> {
        self.input_fields.iter().find(|field| field.name == name)
    }
}

fn kind_of(kind: &TypeKind) -> TypeDefKind {
    match kind {
        TypeKind::Scalar => TypeDefKind::Scalar,
        TypeKind::Object(_) => TypeDefKind::Object,
        TypeKind::Interface(_) => TypeDefKind::Interface,
        TypeKind::Union(_) => TypeDefKind::Union,
        TypeKind::Enum(_) => TypeDefKind::Enum,
        TypeKind::InputObject(_) => TypeDefKind::InputObject,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDef {
    pub name: String,
    pub args: Vec<InputValueDef>,
}

impl DirectiveDef {
    pub fn arg(&self, name: &str) -> Option<&InputValueDef> {
        self.args.iter().find(|arg| arg.name == name)
    }
}

/// A parsed, read-only GraphQL schema.
#[derive(Debug, Clone)]
pub struct Schema {
    types: HashMap<String, TypeDef>,
    directives: HashMap<String, DirectiveDef>,
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    typename_field: FieldDef,
}

impl Schema {
    /// Build a schema from SDL text, adding the built-in directives first.
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        // Parsed separately so parser positions refer to the user's file.
        let builtins = parse_schema(BUILTIN_DIRECTIVES)?;
        let document = parse_schema(sdl)?;
        Self::build(&[builtins, document])
    }

    fn build(documents: &[ServiceDocument]) -> Result<Self, SchemaError> {
        let mut types: HashMap<String, TypeDef> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), TypeDef::new(*name, TypeDefKind::Scalar)))
            .collect();
        let mut directives = HashMap::new();
        let mut roots: [Option<String>; 3] = [None, None, None];

        let definitions = documents.iter().flat_map(|doc| doc.definitions.iter());

        // Base definitions first so `extend type` can appear anywhere.
        let mut extensions = Vec::new();
        for definition in definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = &schema.node;
                    for (slot, name) in roots
                        .iter_mut()
                        .zip([&schema.query, &schema.mutation, &schema.subscription])
                    {
                        if let Some(name) = name {
                            *slot = Some(name.node.to_string());
                        }
                    }
                }
                TypeSystemDefinition::Type(def) if def.node.extend => extensions.push(&def.node),
                TypeSystemDefinition::Type(def) => {
                    let def = &def.node;
                    let name = def.name.node.to_string();
                    let mut type_def = TypeDef::new(name.clone(), kind_of(&def.kind));
                    type_def.merge_kind(&def.kind);
                    types.insert(name, type_def);
                }
                TypeSystemDefinition::Directive(def) => {
                    let def = &def.node;
                    let name = def.name.node.to_string();
                    directives.insert(
                        name.clone(),
                        DirectiveDef {
                            name,
                            args: def
                                .arguments
                                .iter()
                                .map(|arg| InputValueDef::from_ast(&arg.node))
                                .collect(),
                        },
                    );
                }
            }
        }

        for extension in extensions {
            let name = extension.name.node.as_str();
            let type_def = types.get_mut(name).ok_or_else(|| {
                SchemaError::Invalid(format!("Cannot extend type \"{name}\" because it is not defined."))
            })?;
            type_def.merge_kind(&extension.kind);
        }

        let [query, mutation, subscription] = roots;
        let root = |declared: Option<String>, default: &str| -> Option<String> {
            declared.or_else(|| types.contains_key(default).then(|| default.to_string()))
        };
        let query_type = root(query, "Query").ok_or_else(|| {
            SchemaError::Invalid("Schema does not define a query root type.".to_string())
        })?;
        let mutation_type = root(mutation, "Mutation");
        let subscription_type = root(subscription, "Subscription");

        let schema = Self {
            types,
            directives,
            query_type,
            mutation_type,
            subscription_type,
            typename_field: FieldDef {
                name: "__typename".to_string(),
                args: Vec::new(),
                ty: TypeRef::NonNull(Box::new(TypeRef::Named("String".to_string()))),
            },
        };
        schema.check_references()?;
        Ok(schema)
    }

    fn check_references(&self) -> Result<(), SchemaError> {
        let unknown = |name: &str, owner: String| {
            SchemaError::Invalid(format!("Unknown type \"{name}\" referenced by {owner}."))
        };
        for root in [
            Some(&self.query_type),
            self.mutation_type.as_ref(),
            self.subscription_type.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            if !self.types.contains_key(root) {
                return Err(unknown(root, "the schema definition".to_string()));
            }
        }

        for type_def in self.types.values() {
            for field in &type_def.fields {
                if !self.types.contains_key(field.ty.named()) {
                    return Err(unknown(
                        field.ty.named(),
                        format!("{}.{}", type_def.name, field.name),
                    ));
                }
                for arg in &field.args {
                    if !self.types.contains_key(arg.ty.named()) {
                        return Err(unknown(
                            arg.ty.named(),
                            format!("{}.{}({}:)", type_def.name, field.name, arg.name),
                        ));
                    }
                }
            }
            for field in &type_def.input_fields {
                if !self.types.contains_key(field.ty.named()) {
                    return Err(unknown(
                        field.ty.named(),
                        format!("{}.{}", type_def.name, field.name),
                    ));
                }
            }
            for member in type_def.members.iter().chain(&type_def.interfaces) {
                if !self.types.contains_key(member) {
                    return Err(unknown(member, type_def.name.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Looks up a field on a composite type, including `__typename`.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        let type_def = self.types.get(type_name)?;
        if field_name == "__typename" && type_def.kind.is_composite() {
            return Some(&self.typename_field);
        }
        type_def.field(field_name)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDef> {
        self.directives.get(name)
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&TypeDef> {
        let name = match operation {
            OperationType::Query => Some(&self.query_type),
            OperationType::Mutation => self.mutation_type.as_ref(),
            OperationType::Subscription => self.subscription_type.as_ref(),
        }?;
        self.types.get(name)
    }

    pub fn is_composite(&self, name: &str) -> bool {
        self.types
            .get(name)
            .is_some_and(|type_def| type_def.kind.is_composite())
    }

    /// Object types a value of `name` may have at runtime.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        let Some(type_def) = self.types.get(name) else {
            return Vec::new();
        };
        match type_def.kind {
            TypeDefKind::Object => vec![type_def.name.as_str()],
            TypeDefKind::Union => type_def.members.iter().map(String::as_str).collect(),
            TypeDefKind::Interface => {
                let mut possible: Vec<&str> = self
                    .types
                    .values()
                    .filter(|candidate| {
                        candidate.kind == TypeDefKind::Object
                            && candidate.interfaces.iter().any(|i| i == name)
                    })
                    .map(|candidate| candidate.name.as_str())
                    .collect();
                possible.sort_unstable();
                possible
            }
            _ => Vec::new(),
        }
    }

    /// Whether two composite types share at least one possible object type.
    pub fn types_overlap(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let possible_b = self.possible_types(b);
        self.possible_types(a)
            .iter()
            .any(|candidate| possible_b.contains(candidate))
    }
}

/// Read and build the schema at `path`.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    let sdl = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Schema::parse(&sdl)
}

/// Reuses the built schema while the file's modification time is unchanged.
///
/// Failures are never cached: a malformed file reports its error on every load.
#[derive(Debug)]
pub struct SchemaCache {
    path: PathBuf,
    cached: Mutex<Option<(SystemTime, Arc<Schema>)>>,
}

impl SchemaCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Arc<Schema>, SchemaError> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|source| SchemaError::Read {
                path: self.path.clone(),
                source,
            })?;

        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((at, schema)) = cached.as_ref()
            && *at == modified
        {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(load_schema(&self.path)?);
        *cached = Some((modified, Arc::clone(&schema)));
        Ok(schema)
    }
}
