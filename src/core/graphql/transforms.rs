//! Print-preparation transforms.
//!
//! Each transform maps a context to a new one; the input is never modified,
//! so the validated context stays available next to the print context.

use super::{
    ir::{CompilerContext, Field, InlineFragment, Node, Selection},
    schema::Schema,
};

pub type Transform = fn(&CompilerContext, &Schema) -> CompilerContext;

/// Applied in order before printing.
pub const PRINT_TRANSFORMS: &[Transform] = &[flatten_inline_fragments, skip_redundant_nodes];

pub fn apply_print_transforms(context: &CompilerContext, schema: &Schema) -> CompilerContext {
    PRINT_TRANSFORMS
        .iter()
        .fold(context.clone(), |context, transform| transform(&context, schema))
}

/// Merge inline fragments that do not narrow the parent type into the parent.
///
/// Only fragments without directives are merged, since a directive applies to
/// the fragment as a whole.
pub fn flatten_inline_fragments(context: &CompilerContext, _schema: &Schema) -> CompilerContext {
    context.map_nodes(|node: &Node| {
        node.with_selections(flatten_selections(node.selections(), node.type_name()))
    })
}

fn flatten_selections(selections: &[Selection], parent: &str) -> Vec<Selection> {
    let mut flattened = Vec::with_capacity(selections.len());
    for selection in selections {
        match selection {
            Selection::InlineFragment(inline)
                if inline.directives.is_empty()
                    && inline.type_condition.as_deref().is_none_or(|ty| ty == parent) =>
            {
                flattened.extend(flatten_selections(&inline.selections, parent));
            }
            Selection::InlineFragment(inline) => {
                let target = inline.type_condition.as_deref().unwrap_or(parent);
                flattened.push(Selection::InlineFragment(InlineFragment {
                    selections: flatten_selections(&inline.selections, target),
                    ..inline.clone()
                }));
            }
            Selection::Field(field) => flattened.push(Selection::Field(Field {
                selections: flatten_selections(&field.selections, &field.type_name),
                ..field.clone()
            })),
            Selection::FragmentSpread(_) => flattened.push(selection.clone()),
        }
    }
    flattened
}

/// Drop selections that repeat an earlier one at the same level.
///
/// Fields with the same response key, arguments and directives are merged
/// into the first occurrence; repeated spreads and equivalent inline fragments
/// are merged the same way.
pub fn skip_redundant_nodes(context: &CompilerContext, _schema: &Schema) -> CompilerContext {
    context.map_nodes(|node: &Node| node.with_selections(dedupe_selections(node.selections())))
}

fn dedupe_selections(selections: &[Selection]) -> Vec<Selection> {
    let mut kept: Vec<Selection> = Vec::with_capacity(selections.len());
    for selection in selections {
        let Some(index) = kept
            .iter()
            .position(|candidate| same_position(candidate, selection))
        else {
            kept.push(selection.clone());
            continue;
        };
        match (&mut kept[index], selection) {
            (Selection::Field(first), Selection::Field(repeat)) => {
                first.selections.extend(repeat.selections.iter().cloned());
            }
            (Selection::InlineFragment(first), Selection::InlineFragment(repeat)) => {
                first.selections.extend(repeat.selections.iter().cloned());
            }
            _ => {}
        }
    }

    for selection in &mut kept {
        match selection {
            Selection::Field(field) => field.selections = dedupe_selections(&field.selections),
            Selection::InlineFragment(inline) => {
                inline.selections = dedupe_selections(&inline.selections)
            }
            Selection::FragmentSpread(_) => {}
        }
    }
    kept
}

fn same_position(a: &Selection, b: &Selection) -> bool {
    match (a, b) {
        (Selection::Field(a), Selection::Field(b)) => {
            a.response_key() == b.response_key()
                && a.name == b.name
                && a.arguments == b.arguments
                && a.directives == b.directives
        }
        (Selection::FragmentSpread(a), Selection::FragmentSpread(b)) => a == b,
        (Selection::InlineFragment(a), Selection::InlineFragment(b)) => {
            a.type_condition == b.type_condition && a.directives == b.directives
        }
        _ => false,
    }
}
