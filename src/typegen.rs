//! Result type synthesis.
//!
//! Maps introspected columns onto Go struct fields and renders the struct
//! declaration that goes into the package's generated file.

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::error::TypegenResult;
use crate::introspect::{Column, SchemaIntrospector};
use crate::naming::name_query;
use crate::normalize::normalize;

/// One struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub go_type: String,
    /// Raw column name.
    pub tag: String,
}

/// A synthesized result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl GeneratedType {
    pub fn from_columns(name: &str, columns: &[Column]) -> Self {
        Self {
            name: name.to_string(),
            fields: columns
                .iter()
                .map(|c| Field {
                    name: field_name(&c.name),
                    go_type: go_type(&c.udt_name),
                    tag: c.name.clone(),
                })
                .collect(),
        }
    }

    /// Render as a Go struct declaration with `<tag_key>:"column"` tags.
    pub fn render(&self, tag_key: &str) -> String {
        let mut out = format!("type {} struct {{\n", self.name);
        for f in &self.fields {
            out.push_str(&format!(
                "\t{} {} `{}:\"{}\"`\n",
                f.name, f.go_type, tag_key, f.tag
            ));
        }
        out.push_str("}\n");
        out
    }
}

/// Exported Go field name for a column: `org_id` → `OrgID`.
pub fn field_name(column: &str) -> String {
    let name: String = column
        .to_snake_case()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| match w {
            "id" => "ID".to_string(),
            "ids" => "IDs".to_string(),
            other => other.to_upper_camel_case(),
        })
        .collect();

    match name.chars().next() {
        None => "Field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("Field{}", name),
        Some(_) => name,
    }
}

/// Go type for a Postgres `udt_name`.
pub fn go_type(udt_name: &str) -> String {
    match udt_name {
        "uuid" => "uuid.UUID",
        "text" => "string",
        "timestamptz" => "time.Time",
        "int4" => "int",
        "json" | "jsonb" => "[]byte",
        "numeric" => "float64",
        // Enums and anything else map to the schema tool's type names.
        other => return other.to_upper_camel_case(),
    }
    .to_string()
}

/// Name, introspect and build the type for one formatted query.
pub async fn synthesize(
    formatted: &str,
    introspector: &dyn SchemaIntrospector,
) -> TypegenResult<GeneratedType> {
    let name = name_query(formatted);
    let query = normalize(formatted)?;
    let columns = introspector.describe(&name, &query).await?;
    Ok(GeneratedType::from_columns(&name, &columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypegenError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_field_names() {
        assert_eq!(field_name("id"), "ID");
        assert_eq!(field_name("org_id"), "OrgID");
        assert_eq!(field_name("member_ids"), "MemberIDs");
        assert_eq!(field_name("identity"), "Identity");
        assert_eq!(field_name("createdAt"), "CreatedAt");
        assert_eq!(field_name(""), "Field");
    }

    #[test]
    fn test_type_table() {
        assert_eq!(go_type("uuid"), "uuid.UUID");
        assert_eq!(go_type("text"), "string");
        assert_eq!(go_type("timestamptz"), "time.Time");
        assert_eq!(go_type("int4"), "int");
        assert_eq!(go_type("jsonb"), "[]byte");
        assert_eq!(go_type("numeric"), "float64");
        assert_eq!(go_type("order_status"), "OrderStatus");
    }

    #[test]
    fn test_render() {
        let ty = GeneratedType::from_columns(
            "braveOtter",
            &[Column::new("id", "uuid"), Column::new("name", "text")],
        );
        assert_eq!(
            ty.render("db"),
            "type braveOtter struct {\n\tID uuid.UUID `db:\"id\"`\n\tName string `db:\"name\"`\n}\n"
        );
    }

    struct Recording {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SchemaIntrospector for Recording {
        async fn describe(&self, name: &str, query: &str) -> TypegenResult<Vec<Column>> {
            self.seen
                .lock()
                .unwrap()
                .push((name.to_string(), query.to_string()));
            if query.contains("broken") {
                return Err(TypegenError::Introspection("relation does not exist".into()));
            }
            Ok(vec![Column::new("id", "uuid")])
        }
    }

    #[tokio::test]
    async fn test_synthesize_normalizes_and_names() {
        let rec = Recording {
            seen: Mutex::new(Vec::new()),
        };
        let formatted = "SELECT\n\tid\nFROM\n\tusers\nWHERE\n\torg_id = $1;\n";
        let ty = synthesize(formatted, &rec).await.unwrap();

        assert_eq!(ty.name, name_query(formatted));
        let seen = rec.seen.lock().unwrap();
        assert_eq!(seen[0].0, ty.name);
        assert_eq!(seen[0].1, "SELECT id FROM users WHERE org_id = null");
    }

    #[tokio::test]
    async fn test_synthesize_propagates_failure() {
        let rec = Recording {
            seen: Mutex::new(Vec::new()),
        };
        assert!(synthesize("select * from broken", &rec).await.is_err());
    }
}
