//! Source file parsers.
//!
//! - `jsx`: JS/JSX/TS/TSX module parser (uses swc for AST generation)

pub mod jsx;
