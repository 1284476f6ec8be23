//! Tree-abstraction collaborator.
//!
//! Turns the condition subtree of a control-flow statement into a canonical
//! string at a chosen [`TreeLevel`]. Identifiers and literals never survive
//! abstraction; only node types and (at level ONE) operators do, so
//! predicates with different variable names collapse onto the same pattern.
//!
//! Parsing is delegated to tree-sitter grammars. The rest of the crate only
//! consumes [`SourceTree::predicates`] and [`node_to_string`]; everything
//! else here is private plumbing.

use std::fs;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Error, Result};
use crate::training::TreeLevel;

/// Source languages predicates can be harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// C (`if` statement conditions).
    C,
    /// Verilog (`always` blocks). Requires the `verilog` cargo feature.
    Verilog,
    /// PHP (`if` statement conditions).
    Php,
    /// C++ (`if` statement conditions).
    Cpp,
}

impl Language {
    /// Resolve the numeric CLI selector (1=C, 2=Verilog, 3=PHP, 4=C++).
    pub fn from_cli(number: i32) -> Result<Self> {
        match number {
            1 => Ok(Language::C),
            2 => Ok(Language::Verilog),
            3 => Ok(Language::Php),
            4 => Ok(Language::Cpp),
            other => Err(Error::UnsupportedLanguage(other)),
        }
    }

    /// Language name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Verilog => "verilog",
            Language::Php => "php",
            Language::Cpp => "cpp",
        }
    }

    fn grammar(self) -> Result<tree_sitter::Language> {
        match self {
            Language::C => Ok(tree_sitter_c::LANGUAGE.into()),
            #[cfg(feature = "verilog")]
            Language::Verilog => Ok(tree_sitter_verilog::LANGUAGE.into()),
            #[cfg(not(feature = "verilog"))]
            Language::Verilog => Err(Error::UnsupportedLanguage(2)),
            Language::Php => Ok(tree_sitter_php::LANGUAGE_PHP.into()),
            Language::Cpp => Ok(tree_sitter_cpp::LANGUAGE.into()),
        }
    }
}

/// A parsed source file or expression together with its text.
pub struct SourceTree {
    tree: Tree,
    source: String,
    language: Language,
}

impl SourceTree {
    /// Parse `path` in `language`.
    ///
    /// Parse errors inside the file are tolerated; only the predicates that
    /// parsed cleanly are scanned.
    pub fn parse_file(path: &Path, language: Language) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_source(source, language, false)
    }

    /// Parse a source string. With `report_parse_errors`, any syntax error
    /// in the input is a [`Error::ParseFailure`]; otherwise errors are
    /// tolerated file-wide and filtered per predicate.
    pub fn parse_source(
        source: impl Into<String>,
        language: Language,
        report_parse_errors: bool,
    ) -> Result<Self> {
        let source = source.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar()?)
            .map_err(|e| Error::ParseFailure(format!("{} grammar: {e}", language.as_str())))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::ParseFailure(snippet(&source)))?;
        if report_parse_errors && tree.root_node().has_error() {
            return Err(Error::ParseFailure(snippet(&source)));
        }
        Ok(SourceTree {
            tree,
            source,
            language,
        })
    }

    /// The parsed source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Collect the predicate nodes of interest: `if` conditions for the
    /// C-family languages and PHP, whole `always` blocks for Verilog.
    /// Conditions containing parse errors are dropped.
    pub fn predicates(&self) -> Vec<Node<'_>> {
        let mut predicates = Vec::new();
        collect_predicates(self.tree.root_node(), self.language, &mut predicates);
        predicates
    }

    /// The source text covered by `node`.
    pub fn slice(&self, node: Node<'_>) -> &str {
        &self.source[node.start_byte()..node.end_byte()]
    }
}

fn snippet(source: &str) -> String {
    const MAX: usize = 120;
    match source.char_indices().nth(MAX) {
        Some((byte, _)) => format!("{}...", &source[..byte]),
        None => source.to_string(),
    }
}

fn collect_predicates<'t>(node: Node<'t>, language: Language, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match language {
            Language::Verilog => {
                if child.kind() == "always_construct" {
                    out.push(child);
                }
            }
            _ => {
                if child.kind() == "if_statement" {
                    if let Some(condition) = child.child_by_field_name("condition") {
                        if !condition.has_error() {
                            out.push(condition);
                        }
                    }
                }
            }
        }
        collect_predicates(child, language, out);
    }
}

/// Render `node` as the canonical string for `level`.
///
/// Verilog has no specialized level-TWO rules and falls back to the raw
/// tree print.
///
/// # Errors
///
/// [`Error::UnexpectedTree`] when the subtree does not have the shape the
/// level's rules require (for example a binary expression missing an
/// operand). Callers skip the predicate in that case.
pub fn node_to_string(node: Node<'_>, level: TreeLevel, language: Language) -> Result<String> {
    match (level, language) {
        (TreeLevel::Min, _) => Ok(node.to_sexp()),
        (TreeLevel::One, _) => level_one(node),
        (TreeLevel::Two | TreeLevel::Max, Language::Verilog) => Ok(node.to_sexp()),
        (TreeLevel::Two | TreeLevel::Max, _) => level_two(node),
    }
}

/// Level ONE: full tree shape over named children, with operators spelled
/// out for binary and unary expressions. Assignment inside a condition is
/// canonicalized to a `binary_expression ("=")` so that `if (x = y)` and
/// `if (x == y)` become single-edit neighbors.
fn level_one(node: Node<'_>) -> Result<String> {
    let mut ret = String::from("(");
    match node.kind() {
        "binary_expression" | "unary_expression" => {
            ret.push_str(node.kind());
            ret.push(' ');
            ret.push_str(&operator_string(node)?);
        }
        "assignment_expression" => {
            ret.push_str("binary_expression (\"=\") ");
        }
        kind => {
            ret.push_str(kind);
            if node.named_child_count() > 0 {
                ret.push(' ');
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        ret.push_str(&level_one(child)?);
    }
    ret.push(')');
    Ok(ret)
}

/// Level TWO: expression skeleton. The condition must be a parenthesized
/// expression; its content is reduced to one of a fixed set of expression
/// forms with terminals redacted to type-only markers.
fn level_two(node: Node<'_>) -> Result<String> {
    if node.kind() != "parenthesized_expression" {
        return Err(Error::UnexpectedTree(format!(
            "expecting parenthesized_expression at top level, found: {}",
            node.to_sexp()
        )));
    }
    Ok(format!(
        "(parenthesized_expression {})",
        abstract_parenthesized(node)?
    ))
}

fn abstract_parenthesized(node: Node<'_>) -> Result<String> {
    if node.named_child_count() != 1 {
        return Ok(String::new());
    }
    let inner = match node.named_child(0) {
        Some(inner) => inner,
        None => return Ok(String::new()),
    };
    match inner.kind() {
        "parenthesized_expression" => Ok(format!(
            "(parenthesized_expression {})",
            abstract_parenthesized(inner)?
        )),
        "binary_expression" => Ok(format!(
            "(binary_expression {}{})",
            operator_string(inner)?,
            binary_operands(inner)?
        )),
        "assignment_expression" => {
            Ok(format!("(binary_expression (\"=\") {})", binary_operands(inner)?))
        }
        "unary_expression" => Ok(format!(
            "(unary_expression {}{})",
            operator_string(inner)?,
            unary_operand(inner)?
        )),
        "pointer_expression" => Ok(format!("(pointer_expression {})", unary_operand(inner)?)),
        "call_expression" => Ok("(call_expression)".to_string()),
        "field_expression" => {
            Ok("(field_expression argument: (identifier) field: (field_identifier))".to_string())
        }
        "subscript_expression" => Ok(format!(
            "(subscript_expression {})",
            binary_operands(inner)?
        )),
        _ => Ok(format!("({})", terminal_marker(inner))),
    }
}

/// A terminal prints as its node type; anything with structure underneath
/// is flattened to a generic marker.
fn terminal_marker(node: Node<'_>) -> &'static str {
    if node.named_child_count() == 0 {
        node.kind()
    } else {
        "non_terminal_expression"
    }
}

fn operator_string(node: Node<'_>) -> Result<String> {
    let operator = node.child_by_field_name("operator").ok_or_else(|| {
        Error::UnexpectedTree(format!("expression without operator: {}", node.to_sexp()))
    })?;
    Ok(format!("{} ", operator.to_sexp()))
}

fn named_non_comment_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// `(lhs) (rhs)` over the two non-comment operands. Comment nodes may be
/// interleaved with the operands in the grammar, so they are filtered
/// before counting.
fn binary_operands(node: Node<'_>) -> Result<String> {
    match named_non_comment_children(node)[..] {
        [lhs, rhs] => Ok(format!(
            "({}) ({})",
            terminal_marker(lhs),
            terminal_marker(rhs)
        )),
        _ => Err(Error::UnexpectedTree(format!(
            "expression without two operands: {}",
            node.to_sexp()
        ))),
    }
}

fn unary_operand(node: Node<'_>) -> Result<String> {
    match named_non_comment_children(node)[..] {
        [argument] => Ok(format!("({})", terminal_marker(argument))),
        _ => Err(Error::UnexpectedTree(format!(
            "expression without single operand: {}",
            node.to_sexp()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_c(source: &str) -> SourceTree {
        SourceTree::parse_source(source, Language::C, false).unwrap()
    }

    fn balanced(s: &str) -> bool {
        let mut depth = 0i32;
        for c in s.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    #[test]
    fn finds_if_conditions_in_c() {
        let tree = parse_c("int main() { if (x == y) { return 1; } return 0; }");
        let predicates = tree.predicates();
        assert_eq!(predicates.len(), 1);
        assert_eq!(tree.slice(predicates[0]), "(x == y)");
    }

    #[test]
    fn nested_ifs_are_all_collected() {
        let tree = parse_c("int main() { if (a) { if (b || c) { return 1; } } }");
        assert_eq!(tree.predicates().len(), 2);
    }

    #[test]
    fn level_one_keeps_the_operator_and_redacts_names() {
        let tree = parse_c("int main() { if (x == y) { return 1; } }");
        let predicates = tree.predicates();
        let s = node_to_string(predicates[0], TreeLevel::One, Language::C).unwrap();
        assert!(balanced(&s), "unbalanced: {s}");
        assert!(s.contains("\"==\""), "operator missing: {s}");
        assert!(!s.contains('x') && !s.contains('y'), "identifier leaked: {s}");
    }

    #[test]
    fn level_one_canonicalizes_assignment_to_binary() {
        let tree = parse_c("int main() { if (x = y) { return 1; } }");
        let assign = node_to_string(tree.predicates()[0], TreeLevel::One, Language::C).unwrap();
        let tree = parse_c("int main() { if (x == y) { return 1; } }");
        let equals = node_to_string(tree.predicates()[0], TreeLevel::One, Language::C).unwrap();
        assert!(assign.contains("binary_expression"), "{assign}");
        assert!(assign.contains("\"=\""), "{assign}");
        // The two shapes differ only in the operator spelling.
        assert_ne!(assign, equals);
        assert_eq!(
            crate::distance::edit_distance(&assign, &equals),
            1,
            "{assign} vs {equals}"
        );
    }

    #[test]
    fn level_two_redacts_terminals_to_markers() {
        let tree = parse_c("int main() { if (count == 42) { return 1; } }");
        let s = node_to_string(tree.predicates()[0], TreeLevel::Two, Language::C).unwrap();
        assert!(s.starts_with("(parenthesized_expression "), "{s}");
        assert!(balanced(&s), "unbalanced: {s}");
        assert!(!s.contains("count") && !s.contains("42"), "literal leaked: {s}");
    }

    #[test]
    fn level_two_identical_for_different_identifiers() {
        let a = parse_c("int main() { if (foo < bar) { return 1; } }");
        let b = parse_c("int main() { if (alpha < omega) { return 1; } }");
        let sa = node_to_string(a.predicates()[0], TreeLevel::Two, Language::C).unwrap();
        let sb = node_to_string(b.predicates()[0], TreeLevel::Two, Language::C).unwrap();
        assert_eq!(sa, sb);
    }

    #[test]
    fn level_two_rejects_non_parenthesized_root() {
        let tree = parse_c("int main() { if (x) { return 1; } }");
        let predicate = tree.predicates()[0];
        // The condition itself is parenthesized; its inner identifier is not
        // a valid level-TWO root.
        let inner = predicate.named_child(0).unwrap();
        assert!(matches!(
            node_to_string(inner, TreeLevel::Two, Language::C),
            Err(Error::UnexpectedTree(_))
        ));
    }

    #[test]
    fn min_level_is_the_raw_tree_print() {
        let tree = parse_c("int main() { if (x) { return 1; } }");
        let s = node_to_string(tree.predicates()[0], TreeLevel::Min, Language::C).unwrap();
        assert!(s.contains("parenthesized_expression"));
    }

    #[test]
    fn parse_error_reporting_is_opt_in() {
        let broken = "int main() { if (x ==";
        assert!(SourceTree::parse_source(broken, Language::C, false).is_ok());
        assert!(matches!(
            SourceTree::parse_source(broken, Language::C, true),
            Err(Error::ParseFailure(_))
        ));
    }

    #[test]
    fn unknown_language_number_is_rejected() {
        assert!(Language::from_cli(1).is_ok());
        assert!(Language::from_cli(4).is_ok());
        assert!(matches!(
            Language::from_cli(9),
            Err(Error::UnsupportedLanguage(9))
        ));
    }
}
