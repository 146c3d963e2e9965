//! Result type renames scoped to one function.
//!
//! When a query gets a synthesized type, the enclosing function's first
//! declared result (`T` or `[]T`) is renamed to it, and so is every `var`
//! declaration of the old type inside that same function. Nothing outside
//! the function is touched, even if it names the same type.

use crate::error::{TypegenError, TypegenResult};
use crate::extractor::{FunctionSig, RecordSlot};
use crate::source::SourceTree;

/// A rename that was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub function: String,
    pub old: String,
    pub new: String,
    /// Local declarations renamed along with the result.
    pub locals: usize,
}

/// Rename the record result of `sig` and its matching locals to `new_name`.
///
/// The result declaration is renamed first; locals are compared against the
/// result's text as it stood before this call, read through the overlay so
/// earlier renames in the same function are taken into account.
pub fn apply_rename(
    tree: &mut SourceTree,
    sig: Option<&FunctionSig>,
    new_name: &str,
) -> TypegenResult<RenamePlan> {
    let sig = sig.ok_or_else(|| {
        TypegenError::Signature("query call is not inside a function declaration".to_string())
    })?;

    if sig.result_count < 2 {
        return Err(TypegenError::Signature(format!(
            "{} declares {} result(s), expected a record and an error",
            sig.name, sig.result_count
        )));
    }

    let record = match &sig.record {
        RecordSlot::Type(t) => t,
        RecordSlot::Unsupported(kind) => {
            return Err(TypegenError::Signature(format!(
                "first result of {} is a {}, expected T or []T",
                sig.name, kind
            )));
        }
        RecordSlot::Empty => {
            return Err(TypegenError::Signature(format!(
                "{} has no record result",
                sig.name
            )));
        }
    };

    let old = tree.text(&record.range).to_string();
    tree.replace(record.range.clone(), new_name);

    let mut locals = 0;
    for local in &sig.locals {
        if tree.text(&local.range) == old {
            tree.replace(local.range.clone(), new_name);
            locals += 1;
        }
    }

    tracing::debug!(function = %sig.name, %old, new = %new_name, locals, "renamed result type");

    Ok(RenamePlan {
        function: sig.name.clone(),
        old,
        new: new_name.to_string(),
        locals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::methods::Capabilities;
    use pretty_assertions::assert_eq;

    const SRC: &str = r#"package store

func (s *Store) List(org string) ([]OldType, error) {
	var rows []OldType
	var one OldType
	var other Unrelated
	err := s.db.Select(&rows, `select id, name from users where org_id = $1`, org)
	return rows, err
}

func (s *Store) Keep() (OldType, error) {
	var keep OldType
	return keep, nil
}
"#;

    #[test]
    fn test_rename_is_function_local() {
        let mut tree = SourceTree::parse("store.go", SRC.to_string()).unwrap();
        let ex = extract(&tree, &Capabilities::default());
        let sig = ex.function(&ex.calls[0]);

        let plan = apply_rename(&mut tree, sig, "braveOtter").unwrap();
        assert_eq!(
            plan,
            RenamePlan {
                function: "List".into(),
                old: "OldType".into(),
                new: "braveOtter".into(),
                locals: 2,
            }
        );

        let out = tree.render().unwrap();
        assert!(out.contains("([]braveOtter, error)"));
        assert!(out.contains("var rows []braveOtter"));
        assert!(out.contains("var one braveOtter"));
        assert!(out.contains("var other Unrelated"));
        assert!(out.contains("func (s *Store) Keep() (OldType, error)"));
        assert!(out.contains("var keep OldType"));
    }

    #[test]
    fn test_second_rename_follows_first() {
        let mut tree = SourceTree::parse("store.go", SRC.to_string()).unwrap();
        let ex = extract(&tree, &Capabilities::default());
        let sig = ex.function(&ex.calls[0]);

        apply_rename(&mut tree, sig, "braveOtter").unwrap();
        let plan = apply_rename(&mut tree, sig, "quietFox").unwrap();
        assert_eq!(plan.old, "braveOtter");
        assert_eq!(plan.locals, 2);

        let out = tree.render().unwrap();
        assert!(!out.contains("braveOtter"));
        assert!(out.contains("var one quietFox"));
    }

    #[test]
    fn test_single_result_is_rejected() {
        let src = "package p\n\nfunc f() error {\n\treturn db.Get(&x, `select 1`)\n}\n";
        let mut tree = SourceTree::parse("p.go", src.to_string()).unwrap();
        let ex = extract(&tree, &Capabilities::default());
        let err = apply_rename(&mut tree, ex.function(&ex.calls[0]), "braveOtter").unwrap_err();
        assert!(matches!(err, TypegenError::Signature(_)));
        assert!(!tree.is_dirty());
    }

    #[test]
    fn test_qualified_result_is_rejected() {
        let src = "package p\n\nfunc f() (*models.User, error) {\n\treturn nil, db.Get(&x, `select 1`)\n}\n";
        let mut tree = SourceTree::parse("p.go", src.to_string()).unwrap();
        let ex = extract(&tree, &Capabilities::default());
        let err = apply_rename(&mut tree, ex.function(&ex.calls[0]), "braveOtter").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Signature error: first result of f is a pointer_type, expected T or []T"
        );
    }

    #[test]
    fn test_closure_locals_are_not_renamed() {
        let src = r#"package store

func (s *Store) List() ([]OldType, error) {
	var rows []OldType
	helper := func() (OldType, error) {
		var inner OldType
		return inner, nil
	}
	_, _ = helper()
	err := s.db.Select(&rows, `select 1`)
	return rows, err
}
"#;
        let mut tree = SourceTree::parse("store.go", src.to_string()).unwrap();
        let ex = extract(&tree, &Capabilities::default());
        let plan = apply_rename(&mut tree, ex.function(&ex.calls[0]), "braveOtter").unwrap();
        assert_eq!(plan.locals, 1);

        let out = tree.render().unwrap();
        assert!(out.contains("func (s *Store) List() ([]braveOtter, error) {"));
        assert!(out.contains("\tvar rows []braveOtter\n"));
        assert!(out.contains("helper := func() (OldType, error) {"));
        assert!(out.contains("\t\tvar inner OldType\n"));
    }

    #[test]
    fn test_no_enclosing_function() {
        let src = "package p\n\nvar stmt, _ = db.Prepare(`select 1`)\n";
        let mut tree = SourceTree::parse("p.go", src.to_string()).unwrap();
        assert!(apply_rename(&mut tree, None, "braveOtter").is_err());
    }
}
