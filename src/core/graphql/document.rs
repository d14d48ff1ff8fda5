//! Executable documents parsed from tagged template text.

use async_graphql_parser::{
    Error as ParserError, Pos, Positioned, parse_query,
    types::{DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition},
};

/// Operation appended to fragment-only documents so the parser accepts them.
const FRAGMENT_HOST: &str = "__FragmentHost";

/// One definition of an executable document.
#[derive(Debug, Clone)]
pub enum ExecutableDefinition {
    Operation {
        name: Option<String>,
        definition: Positioned<OperationDefinition>,
    },
    Fragment {
        name: String,
        definition: Positioned<FragmentDefinition>,
    },
}

impl ExecutableDefinition {
    pub fn name(&self) -> Option<&str> {
        match self {
            ExecutableDefinition::Operation { name, .. } => name.as_deref(),
            ExecutableDefinition::Fragment { name, .. } => Some(name),
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            ExecutableDefinition::Operation { definition, .. } => definition.pos,
            ExecutableDefinition::Fragment { definition, .. } => definition.pos,
        }
    }
}

/// A query document: operations and fragments in source order.
#[derive(Debug, Clone)]
pub struct Document {
    pub definitions: Vec<ExecutableDefinition>,
}

impl Document {
    /// The primary definition, the first one in the source text.
    pub fn first(&self) -> Option<&ExecutableDefinition> {
        self.definitions.first()
    }

    pub fn operation_count(&self) -> usize {
        self.definitions
            .iter()
            .filter(|def| matches!(def, ExecutableDefinition::Operation { .. }))
            .count()
    }

    fn from_parsed(parsed: ExecutableDocument, skip_host: bool) -> Self {
        let mut definitions = Vec::new();
        match parsed.operations {
            DocumentOperations::Single(definition) => {
                definitions.push(ExecutableDefinition::Operation {
                    name: None,
                    definition,
                });
            }
            DocumentOperations::Multiple(operations) => {
                for (name, definition) in operations {
                    if skip_host && name.as_str() == FRAGMENT_HOST {
                        continue;
                    }
                    definitions.push(ExecutableDefinition::Operation {
                        name: Some(name.to_string()),
                        definition,
                    });
                }
            }
        }
        for (name, definition) in parsed.fragments {
            definitions.push(ExecutableDefinition::Fragment {
                name: name.to_string(),
                definition,
            });
        }

        // The parser keys definitions by name in hash maps.
        definitions.sort_by_key(|def| {
            let pos = def.pos();
            (pos.line, pos.column)
        });
        Self { definitions }
    }
}

/// Parse query-language text into a [`Document`].
///
/// Documents containing only fragments are accepted.
pub fn parse_document(text: &str) -> Result<Document, ParserError> {
    match parse_query(text) {
        Ok(parsed) => Ok(Document::from_parsed(parsed, false)),
        Err(ParserError::MissingOperation) => {
            let hosted = format!("{text}\nquery {FRAGMENT_HOST} {{ __typename }}\n");
            let parsed = parse_query(hosted)?;
            Ok(Document::from_parsed(parsed, true))
        }
        Err(err) => Err(err),
    }
}
