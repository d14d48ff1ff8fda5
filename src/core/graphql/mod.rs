//! GraphQL toolkit: schema model, documents, validation, IR, transforms and printing.

pub mod document;
pub mod ir;
pub mod printer;
pub mod schema;
pub mod transforms;
pub mod validate;

pub use document::{Document, ExecutableDefinition, parse_document};
pub use ir::{CompilerContext, Node, convert_document};
pub use printer::{print_node, print_root_with_fragments};
pub use schema::{Schema, SchemaCache, load_schema};
pub use transforms::{PRINT_TRANSFORMS, apply_print_transforms};
pub use validate::{STANDARD_RULES, ValidationRule, Violation, validate};
