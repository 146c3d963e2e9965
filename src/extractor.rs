//! Query call-site discovery.
//!
//! Walks a Go tree and collects every raw string literal passed to a
//! recognized data-access method, along with the signature facts of its
//! enclosing function that the rename planner needs. The result owns all of
//! its data, so it can be carried across await points.

use std::ops::Range;

use tree_sitter::Node;

use crate::methods::{Capabilities, Capability, QueryMethod};
use crate::source::SourceTree;

/// A matched query literal.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub method: QueryMethod,
    pub capability: Capability,
    /// Index into [`Extraction::functions`].
    pub function: Option<usize>,
    /// Byte range of the whole literal, delimiters included.
    pub literal: Range<usize>,
    /// Literal text without delimiters.
    pub raw: String,
    /// Start of the called member expression (1-indexed)
    pub line: usize,
    pub column: usize,
}

/// How a type identifier is used in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// `T`
    Plain,
    /// `[]T`
    Slice,
}

/// A type identifier occurrence that can be renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Byte range of the identifier itself.
    pub range: Range<usize>,
    pub name: String,
    pub shape: TypeShape,
}

/// What the first declared result of a function looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSlot {
    Type(TypeRef),
    /// Node kind of a result type the planner cannot rename.
    Unsupported(String),
    /// No results declared.
    Empty,
}

/// Facts about one function or method declaration.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub name: String,
    pub result_count: usize,
    pub record: RecordSlot,
    /// Types of the body's `var` declarations, closures excluded.
    pub locals: Vec<TypeRef>,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub calls: Vec<CallSite>,
    pub functions: Vec<FunctionSig>,
}

impl Extraction {
    pub fn function(&self, call: &CallSite) -> Option<&FunctionSig> {
        call.function.and_then(|idx| self.functions.get(idx))
    }
}

/// Find every query literal in a file.
pub fn extract(tree: &SourceTree, caps: &Capabilities) -> Extraction {
    let mut out = Extraction::default();
    let mut visitor = Visitor {
        source: tree.source(),
        caps,
        out: &mut out,
    };
    visitor.visit(tree.root(), None);
    out
}

struct Visitor<'a> {
    source: &'a str,
    caps: &'a Capabilities,
    out: &'a mut Extraction,
}

impl<'a> Visitor<'a> {
    fn visit(&mut self, node: Node<'_>, current: Option<usize>) {
        let mut current = current;

        match node.kind() {
            "function_declaration" | "method_declaration" => {
                let sig = self.signature(node);
                self.out.functions.push(sig);
                current = Some(self.out.functions.len() - 1);
            }
            "call_expression" => self.check_call(node, current),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, current);
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn check_call(&mut self, call: Node<'_>, function: Option<usize>) {
        let Some(callee) = call.child_by_field_name("function") else {
            return;
        };
        if callee.kind() != "selector_expression" {
            return;
        }
        let Some(member) = callee.child_by_field_name("field") else {
            return;
        };
        let Some((method, capability)) = self.caps.resolve(self.text(member)) else {
            return;
        };
        let Some(args) = call.child_by_field_name("arguments") else {
            return;
        };

        let pos = callee.start_position();
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            // Only raw literals are rewritten.
            if arg.kind() != "raw_string_literal" {
                continue;
            }
            let text = self.text(arg);
            let raw = text
                .strip_prefix('`')
                .and_then(|t| t.strip_suffix('`'))
                .unwrap_or(text);

            self.out.calls.push(CallSite {
                method,
                capability,
                function,
                literal: arg.byte_range(),
                raw: raw.to_string(),
                line: pos.row + 1,
                column: pos.column + 1,
            });
        }
    }

    fn signature(&self, func: Node<'_>) -> FunctionSig {
        let name = func
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let (result_count, record) = match func.child_by_field_name("result") {
            None => (0, RecordSlot::Empty),
            Some(result) if result.kind() == "parameter_list" => self.result_list(result),
            Some(result) => (1, self.type_ref(result)),
        };

        let mut locals = Vec::new();
        if let Some(body) = func.child_by_field_name("body") {
            self.collect_locals(body, &mut locals);
        }

        FunctionSig {
            name,
            result_count,
            record,
            locals,
        }
    }

    fn result_list(&self, list: Node<'_>) -> (usize, RecordSlot) {
        let mut count = 0;
        let mut record = RecordSlot::Empty;

        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            if decl.kind() != "parameter_declaration" {
                continue;
            }
            let mut names = decl.walk();
            // `(a, b T)` declares two results
            count += decl.children_by_field_name("name", &mut names).count().max(1);

            if record == RecordSlot::Empty {
                record = match decl.child_by_field_name("type") {
                    Some(ty) => self.type_ref(ty),
                    None => RecordSlot::Unsupported(decl.kind().to_string()),
                };
            }
        }

        (count, record)
    }

    fn type_ref(&self, ty: Node<'_>) -> RecordSlot {
        match ty.kind() {
            "type_identifier" => RecordSlot::Type(TypeRef {
                range: ty.byte_range(),
                name: self.text(ty).to_string(),
                shape: TypeShape::Plain,
            }),
            "slice_type" => match ty.child_by_field_name("element") {
                Some(elem) if elem.kind() == "type_identifier" => RecordSlot::Type(TypeRef {
                    range: elem.byte_range(),
                    name: self.text(elem).to_string(),
                    shape: TypeShape::Slice,
                }),
                Some(elem) => RecordSlot::Unsupported(format!("slice of {}", elem.kind())),
                None => RecordSlot::Unsupported(ty.kind().to_string()),
            },
            other => RecordSlot::Unsupported(other.to_string()),
        }
    }

    fn collect_locals(&self, node: Node<'_>, out: &mut Vec<TypeRef>) {
        if node.kind() == "var_spec"
            && let Some(ty) = node.child_by_field_name("type")
            && let RecordSlot::Type(type_ref) = self.type_ref(ty)
        {
            out.push(type_ref);
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            // A closure is its own function.
            if child.kind() != "func_literal" {
                self.collect_locals(child, out);
            }
        }
    }
}
