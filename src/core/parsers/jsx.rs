use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use swc_common::{
    FileName, GLOBALS, Globals, SourceMap, Spanned, comments::SingleThreadedComments,
};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

pub struct ParsedJSX {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
}

/// Pick the parser syntax from the file extension.
///
/// `.js` files get JSX enabled, since page components are commonly written
/// as JSX in plain `.js` files.
pub fn syntax_for(file_path: &Path) -> Syntax {
    match file_path.extension().and_then(|ext| ext.to_str()) {
        Some("ts") => Syntax::Typescript(TsSyntax {
            tsx: false,
            ..Default::default()
        }),
        Some("tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
    }
}

/// Parse a JS/TS module into an AST.
///
/// Accepts a shared SourceMap for thread-safe parallel parsing.
pub fn parse_jsx_source(
    code: String,
    file_path: &Path,
    source_map: Arc<SourceMap>,
) -> Result<ParsedJSX> {
    // Wrap in GLOBALS.set() for thread safety
    GLOBALS.set(&Globals::new(), || {
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.to_path_buf()).into(), code);

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(
            syntax_for(file_path),
            StringInput::from(&*source_file),
            Some(&comments),
        );

        let module = parser.parse_module().map_err(|e| {
            let loc = source_map.lookup_char_pos(e.span().lo);
            anyhow!(
                "{} ({}:{})",
                e.kind().msg(),
                loc.line,
                loc.col_display + 1
            )
        })?;

        Ok(ParsedJSX { module, source_map })
    })
}

/// Parse a module with its own SourceMap.
pub fn parse_module_source(code: String, file_path: &Path) -> Result<Module> {
    parse_jsx_source(code, file_path, Arc::default()).map(|parsed| parsed.module)
}
