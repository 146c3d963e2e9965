//! Go source trees with a pending-edit overlay.
//!
//! A [`SourceTree`] is parsed once with tree-sitter and never re-parsed while
//! it is being rewritten. Edits are recorded against byte ranges of the
//! original text; [`SourceTree::text`] reads through the overlay so later
//! rewrites in the same file observe earlier ones.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use crate::error::{TypegenError, TypegenResult};

/// Create a parser for Go.
pub fn go_parser() -> TypegenResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| TypegenError::Config(format!("loading Go grammar: {}", e)))?;
    Ok(parser)
}

/// Parse Go source, failing on any syntax error.
pub fn parse_go(path: &Path, source: &str) -> TypegenResult<Tree> {
    let mut parser = go_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| TypegenError::parse(path, "parser returned no tree"))?;

    if let Some(node) = first_error(tree.root_node()) {
        let pos = node.start_position();
        let what = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_string()
        };
        return Err(TypegenError::parse(
            path,
            format!("{} at {}:{}", what, pos.row + 1, pos.column + 1),
        ));
    }

    Ok(tree)
}

/// Check that rendered output still parses.
pub fn validate(path: &Path, source: &str) -> TypegenResult<()> {
    parse_go(path, source)
        .map(|_| ())
        .map_err(|e| TypegenError::Render(e.to_string()))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find_map(|child| first_error(child));
    found.or(Some(node))
}

#[derive(Debug, Clone)]
struct Edit {
    end: usize,
    text: String,
}

/// One Go file, exclusively owned by the worker rewriting it.
#[derive(Debug)]
pub struct SourceTree {
    path: PathBuf,
    source: String,
    tree: Tree,
    edits: BTreeMap<usize, Edit>,
}

impl SourceTree {
    pub fn parse(path: impl Into<PathBuf>, source: String) -> TypegenResult<Self> {
        let path = path.into();
        let tree = parse_go(&path, &source)?;
        Ok(Self {
            path,
            source,
            tree,
            edits: BTreeMap::new(),
        })
    }

    pub fn read(path: &Path) -> TypegenResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(path, source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The original text, without pending edits.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Name from the `package` clause.
    pub fn package_name(&self) -> Option<String> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;
        let mut cursor = clause.walk();
        let ident = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier")?;
        Some(self.source[ident.byte_range()].to_string())
    }

    /// Current text of a range: its pending replacement if one was recorded
    /// for exactly this range, the original text otherwise.
    pub fn text(&self, range: &Range<usize>) -> &str {
        match self.edits.get(&range.start) {
            Some(edit) if edit.end == range.end => &edit.text,
            _ => &self.source[range.clone()],
        }
    }

    /// One line of the original text (1-indexed).
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|idx| self.source.lines().nth(idx))
    }

    /// Record a replacement. A later replacement of the same range wins.
    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.insert(
            range.start,
            Edit {
                end: range.end,
                text: text.into(),
            },
        );
    }

    /// Whether any pending edit changes the text.
    pub fn is_dirty(&self) -> bool {
        self.edits
            .iter()
            .any(|(start, edit)| self.source[*start..edit.end] != edit.text)
    }

    /// Apply every pending edit to a copy of the source.
    pub fn render(&self) -> TypegenResult<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (start, edit) in &self.edits {
            if *start < cursor {
                return Err(TypegenError::Render(format!(
                    "overlapping edits at byte {} in {}",
                    start,
                    self.path.display()
                )));
            }
            out.push_str(&self.source[cursor..*start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SRC: &str = "package store\n\nfunc f() (User, error) {\n\tvar u User\n\treturn u, nil\n}\n";

    #[test]
    fn test_package_name() {
        let tree = SourceTree::parse("store.go", SRC.to_string()).unwrap();
        assert_eq!(tree.package_name().as_deref(), Some("store"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = SourceTree::parse("bad.go", "package x\nfunc (\n".to_string())
            .err()
            .unwrap();
        assert!(matches!(err, TypegenError::Parse { .. }));
    }

    #[test]
    fn test_overlay_and_render() {
        let mut tree = SourceTree::parse("store.go", SRC.to_string()).unwrap();
        let first = SRC.find("User").unwrap();
        let range = first..first + 4;
        assert!(!tree.is_dirty());

        tree.replace(range.clone(), "User");
        assert!(!tree.is_dirty());

        tree.replace(range.clone(), "quietFox");
        assert_eq!(tree.text(&range), "quietFox");
        assert!(tree.is_dirty());

        let second = SRC.rfind("User").unwrap();
        tree.replace(second..second + 4, "quietFox");
        assert_eq!(
            tree.render().unwrap(),
            "package store\n\nfunc f() (quietFox, error) {\n\tvar u quietFox\n\treturn u, nil\n}\n"
        );
    }

    #[test]
    fn test_line_lookup() {
        let tree = SourceTree::parse("store.go", SRC.to_string()).unwrap();
        assert_eq!(tree.line(4), Some("\tvar u User"));
        assert_eq!(tree.line(0), None);
        assert_eq!(tree.line(99), None);
    }
}
