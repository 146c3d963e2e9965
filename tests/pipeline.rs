//! End-to-end runs over a temporary Go module with fake collaborators, so
//! no formatter binary, Go toolchain or database is needed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use typegen::naming::name_query;
use typegen::prelude::*;

/// Puts each clause on its own line and uppercases the keywords.
struct ClauseFormatter;

#[async_trait]
impl QueryFormatter for ClauseFormatter {
    async fn format(&self, query: &str) -> TypegenResult<String> {
        let query = query.trim().trim_end_matches(';');
        if query.contains("syntax error") {
            return Err(TypegenError::tool("pg_format", "exit status: 1"));
        }
        let mut out = String::new();
        for tok in query.split_whitespace() {
            let upper = tok.to_uppercase();
            if ["SELECT", "FROM", "WHERE", "UPDATE", "SET"].contains(&upper.as_str()) {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&upper);
            } else {
                out.push(' ');
                out.push_str(tok);
            }
        }
        out.push_str(";\n");
        Ok(out)
    }
}

/// Describes anything that reads `users` as `(id uuid, name text)`.
#[derive(Default)]
struct FakeSchema {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SchemaIntrospector for FakeSchema {
    async fn describe(&self, _name: &str, query: &str) -> TypegenResult<Vec<Column>> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.contains("users") {
            Ok(vec![Column::new("id", "uuid"), Column::new("name", "text")])
        } else {
            Err(TypegenError::Introspection(
                "relation \"missing\" does not exist".into(),
            ))
        }
    }
}

struct PassthroughGo;

#[async_trait]
impl GoTools for PassthroughGo {
    async fn gofmt(&self, source: &str) -> TypegenResult<String> {
        Ok(source.to_string())
    }

    async fn goimports(&self, _path: &Path, source: &str) -> TypegenResult<String> {
        Ok(source.to_string())
    }
}

/// Like [`PassthroughGo`], but import resolution fails in any `bad/` directory.
struct BrokenImportsIn(&'static str);

#[async_trait]
impl GoTools for BrokenImportsIn {
    async fn gofmt(&self, source: &str) -> TypegenResult<String> {
        Ok(source.to_string())
    }

    async fn goimports(&self, path: &Path, source: &str) -> TypegenResult<String> {
        let dir = path.parent().and_then(|p| p.file_name());
        if dir.is_some_and(|d| d == self.0) {
            return Err(TypegenError::tool("goimports", "could not import example.com/missing"));
        }
        Ok(source.to_string())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    schema: Arc<FakeSchema>,
    tools: Arc<dyn GoTools>,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        for (name, contents) in files {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        Self {
            _dir: dir,
            root,
            schema: Arc::new(FakeSchema::default()),
            tools: Arc::new(PassthroughGo),
        }
    }

    fn with_tools(mut self, tools: impl GoTools + 'static) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    fn engine(&self, dry_run: bool) -> Engine {
        let config = Config {
            root: self.root.clone(),
            dry_run,
            enums: EnumConfig {
                source: EnumSource::None,
                ..Default::default()
            },
            ..Default::default()
        };
        Engine::with_collaborators(
            config,
            Collaborators {
                formatter: Arc::new(ClauseFormatter),
                introspector: Some(self.schema.clone() as Arc<dyn SchemaIntrospector>),
                tools: self.tools.clone(),
            },
        )
    }

    async fn run(&self) -> Report {
        self.engine(false).run().await.unwrap()
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.root.join(name)).unwrap()
    }

    fn exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }

    fn introspected(&self) -> usize {
        self.schema.queries.lock().unwrap().len()
    }
}

const STORE: &str = r#"package store

import "context"

func (s *Store) ListUsers(ctx context.Context, org string) ([]OldType, error) {
	var x OldType
	var rows []OldType
	err := s.db.SelectContext(ctx, &rows, `select id, name from users where org_id = $1`, org)
	_ = x
	return rows, err
}

func (s *Store) Other() (OldType, error) {
	var y OldType
	return y, nil
}
"#;

const FORMATTED: &str = "SELECT id, name\nFROM users\nWHERE org_id = $1;\n";

#[tokio::test]
async fn test_formats_generates_and_renames() {
    let fx = Fixture::new(&[("store.go", STORE)]);
    let report = fx.run().await;
    assert!(report.is_clean(), "{}", report.diagnostics);

    let name = name_query(FORMATTED);
    let store = fx.read("store.go");

    assert!(store.contains(
        "\terr := s.db.SelectContext(ctx, &rows, `\n\t\tSELECT id, name\n\t\tFROM users\n\t\tWHERE org_id = $1;\n\t`, org)\n"
    ));
    assert!(store.contains(&format!("org string) ([]{}, error) {{", name)));
    assert!(store.contains(&format!("\tvar x {}\n", name)));
    assert!(store.contains(&format!("\tvar rows []{}\n", name)));

    // Other functions keep their types.
    assert!(store.contains("func (s *Store) Other() (OldType, error) {"));
    assert!(store.contains("\tvar y OldType\n"));

    let generated = fx.read("typegen_store.go");
    assert_eq!(
        generated,
        format!(
            "// Code generated by typegen; DO NOT EDIT.\n\npackage store\n\nimport \"github.com/google/uuid\"\n\ntype {} struct {{\n\tID uuid.UUID `db:\"id\"`\n\tName string `db:\"name\"`\n}}\n",
            name
        )
    );

    assert_eq!(report.files_rewritten, vec![fx.root.join("store.go")]);
    assert_eq!(report.generated, vec![fx.root.join("typegen_store.go")]);
    assert_eq!(report.call_sites, 1);
    assert_eq!(report.renames, 1);
    assert_eq!(
        fx.schema.queries.lock().unwrap().as_slice(),
        ["SELECT id, name FROM users WHERE org_id = null"]
    );
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let fx = Fixture::new(&[("store.go", STORE)]);
    fx.run().await;
    let store = fx.read("store.go");
    let generated = fx.read("typegen_store.go");

    let report = fx.run().await;
    assert!(report.is_clean(), "{}", report.diagnostics);
    assert!(report.files_rewritten.is_empty());
    assert!(report.generated.is_empty());
    assert_eq!(fx.read("store.go"), store);
    assert_eq!(fx.read("typegen_store.go"), generated);
    assert_eq!(report.types, 1);
}

#[tokio::test]
async fn test_ignore_marker_skips_typegen() {
    let src = "package store\n\nfunc (s *Store) Count() (OldType, error) {\n\tvar n OldType\n\terr := s.db.Get(&n, `select count(*) from users -- typegen-ignore`)\n\treturn n, err\n}\n";
    let fx = Fixture::new(&[("store.go", src)]);
    let report = fx.run().await;

    assert!(report.is_clean(), "{}", report.diagnostics);
    assert_eq!(fx.introspected(), 0);
    assert!(!fx.exists("typegen_store.go"));

    let store = fx.read("store.go");
    assert!(store.contains("\t\tSELECT count(*)\n\t\tFROM users -- typegen-ignore;\n"));
    assert!(store.contains("func (s *Store) Count() (OldType, error) {"));
}

#[tokio::test]
async fn test_only_recognized_calls_are_touched() {
    let src = r#"package store

func (s *Store) Touch() error {
	_, err := s.db.Exec(`update users set name = 'x'`)
	s.db.MustExec(`update users set name = 'y'`)
	var z OldType
	_ = s.db.Get(&z, "select id from users")
	return err
}
"#;
    let fx = Fixture::new(&[("store.go", src)]);
    let report = fx.run().await;

    assert!(report.is_clean(), "{}", report.diagnostics);
    assert_eq!(report.call_sites, 1);
    assert_eq!(fx.introspected(), 0);

    let store = fx.read("store.go");
    assert!(store.contains("s.db.Exec(`\n\t\tUPDATE users\n\t\tSET name = 'x';\n\t`)"));
    assert!(store.contains("s.db.MustExec(`update users set name = 'y'`)"));
    assert!(store.contains("s.db.Get(&z, \"select id from users\")"));
}

#[tokio::test]
async fn test_signature_mismatch_is_soft() {
    let src = "package store\n\nfunc (s *Store) Load(u *OldType) error {\n\treturn s.db.Get(u, `select id, name from users limit 1`)\n}\n";
    let fx = Fixture::new(&[("store.go", src)]);
    let report = fx.run().await;

    let renames: Vec<_> = report.diagnostics.in_stage(Stage::Rename).collect();
    assert_eq!(renames.len(), 1);
    assert_eq!(renames[0].location.line, 4);
    assert_eq!(report.diagnostics.len(), 1);

    // The literal and the generated type still land.
    let store = fx.read("store.go");
    assert!(store.contains("\t\tSELECT id, name\n\t\tFROM users limit 1;\n"));
    assert!(store.contains("func (s *Store) Load(u *OldType) error {"));
    assert!(fx.read("typegen_store.go").contains("Name string `db:\"name\"`"));
}

#[tokio::test]
async fn test_failures_are_per_call_site() {
    let src = r#"package store

func (s *Store) Broken() ([]OldType, error) {
	var rows []OldType
	err := s.db.Select(&rows, `select syntax error`)
	return rows, err
}

func (s *Store) Missing() ([]OldType, error) {
	var rows []OldType
	err := s.db.Select(&rows, `select id from missing`)
	return rows, err
}

func (s *Store) Fine() ([]OldType, error) {
	var rows []OldType
	err := s.db.Select(&rows, `select id, name from users`)
	return rows, err
}
"#;
    let fx = Fixture::new(&[("store.go", src)]);
    let report = fx.run().await;

    assert_eq!(report.diagnostics.in_stage(Stage::Format).count(), 1);
    assert_eq!(report.diagnostics.in_stage(Stage::Introspect).count(), 1);
    assert_eq!(report.diagnostics.len(), 2);

    let store = fx.read("store.go");
    // Unformattable literal left alone, the others rewritten.
    assert!(store.contains("`select syntax error`"));
    assert!(store.contains("\t\tSELECT id\n\t\tFROM missing;\n"));
    assert!(store.contains("func (s *Store) Missing() ([]OldType, error) {"));

    let name = name_query("SELECT id, name\nFROM users;\n");
    assert!(store.contains(&format!("func (s *Store) Fine() ([]{}, error) {{", name)));
    assert!(fx.read("typegen_store.go").contains(&format!("type {} struct", name)));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let fx = Fixture::new(&[("store.go", STORE)]);
    let report = fx.engine(true).run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.files_rewritten, vec![fx.root.join("store.go")]);
    assert_eq!(report.generated, vec![fx.root.join("typegen_store.go")]);
    assert_eq!(fx.read("store.go"), STORE);
    assert!(!fx.exists("typegen_store.go"));
}

#[tokio::test]
async fn test_parse_failure_aborts_run() {
    let fx = Fixture::new(&[("store.go", STORE), ("broken.go", "package store\n\nfunc {\n")]);
    assert!(matches!(
        fx.engine(false).run().await,
        Err(TypegenError::Parse { .. })
    ));
    assert_eq!(fx.read("store.go"), STORE);
}

fn lister(package: &str, func: &str) -> String {
    format!(
        "package {package}\n\nfunc (s *Store) {func}() ([]OldType, error) {{\n\tvar rows []OldType\n\terr := s.db.Select(&rows, `select id, name from users`)\n\treturn rows, err\n}}\n"
    )
}

#[tokio::test]
async fn test_packages_fail_independently() {
    let (a, b, c) = (lister("good", "ListA"), lister("good", "ListB"), lister("bad", "ListC"));
    let fx = Fixture::new(&[("good/a.go", a.as_str()), ("good/b.go", b.as_str()), ("bad/c.go", c.as_str())])
    .with_tools(BrokenImportsIn("bad"));
    let report = fx.run().await;

    let imports: Vec<_> = report.diagnostics.in_stage(Stage::Imports).collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].location.path, fx.root.join("bad/typegen_bad.go"));
    assert_eq!(report.diagnostics.len(), 1);

    // Both files of one package share a single type.
    let name = name_query("SELECT id, name\nFROM users;\n");
    let generated = fx.read("good/typegen_good.go");
    assert_eq!(generated.matches(&format!("type {} struct", name)).count(), 1);
    for (file, func) in [("good/a.go", "ListA"), ("good/b.go", "ListB"), ("bad/c.go", "ListC")] {
        let src = fx.read(file);
        assert!(src.contains(&format!("func (s *Store) {}() ([]{}, error) {{", func, name)), "{file}");
    }

    assert!(!fx.exists("bad/typegen_bad.go"));
    assert_eq!(report.generated, vec![fx.root.join("good/typegen_good.go")]);
    assert_eq!(report.files_rewritten.len(), 3);
    assert_eq!(report.call_sites, 3);
    assert_eq!(report.types, 2);
}
