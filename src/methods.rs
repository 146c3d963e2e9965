//! Data-access method names that carry SQL literals.
//!
//! Call targets are matched by value against an explicit enumeration,
//! resolved once from configuration.

use std::collections::HashSet;
use std::fmt;

/// A recognized data-access method (sqlx / database/sql style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMethod {
    Get,
    Select,
    Exec,
    NamedExec,
    NamedQuery,
    Query,
    Prepare,
    GetContext,
    SelectContext,
    ExecContext,
    NamedExecContext,
    QueryContext,
    PrepareContext,
    PrepareNamedContext,
}

impl QueryMethod {
    pub const ALL: [QueryMethod; 14] = [
        QueryMethod::Get,
        QueryMethod::Select,
        QueryMethod::Exec,
        QueryMethod::NamedExec,
        QueryMethod::NamedQuery,
        QueryMethod::Query,
        QueryMethod::Prepare,
        QueryMethod::GetContext,
        QueryMethod::SelectContext,
        QueryMethod::ExecContext,
        QueryMethod::NamedExecContext,
        QueryMethod::QueryContext,
        QueryMethod::PrepareContext,
        QueryMethod::PrepareNamedContext,
    ];

    /// Fetch-one / fetch-many methods whose results get a synthesized type.
    pub const TYPEGEN: [QueryMethod; 4] = [
        QueryMethod::Get,
        QueryMethod::Select,
        QueryMethod::GetContext,
        QueryMethod::SelectContext,
    ];

    /// Resolve a Go member name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Get" => QueryMethod::Get,
            "Select" => QueryMethod::Select,
            "Exec" => QueryMethod::Exec,
            "NamedExec" => QueryMethod::NamedExec,
            "NamedQuery" => QueryMethod::NamedQuery,
            "Query" => QueryMethod::Query,
            "Prepare" => QueryMethod::Prepare,
            "GetContext" => QueryMethod::GetContext,
            "SelectContext" => QueryMethod::SelectContext,
            "ExecContext" => QueryMethod::ExecContext,
            "NamedExecContext" => QueryMethod::NamedExecContext,
            "QueryContext" => QueryMethod::QueryContext,
            "PrepareContext" => QueryMethod::PrepareContext,
            "PrepareNamedContext" => QueryMethod::PrepareNamedContext,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryMethod::Get => "Get",
            QueryMethod::Select => "Select",
            QueryMethod::Exec => "Exec",
            QueryMethod::NamedExec => "NamedExec",
            QueryMethod::NamedQuery => "NamedQuery",
            QueryMethod::Query => "Query",
            QueryMethod::Prepare => "Prepare",
            QueryMethod::GetContext => "GetContext",
            QueryMethod::SelectContext => "SelectContext",
            QueryMethod::ExecContext => "ExecContext",
            QueryMethod::NamedExecContext => "NamedExecContext",
            QueryMethod::QueryContext => "QueryContext",
            QueryMethod::PrepareContext => "PrepareContext",
            QueryMethod::PrepareNamedContext => "PrepareNamedContext",
        }
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a matched call is allowed to trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Reformat the literal only.
    Format,
    /// Reformat the literal and synthesize a result type.
    Typegen,
}

/// The resolved capability set for a run.
#[derive(Debug, Clone)]
pub struct Capabilities {
    query: HashSet<QueryMethod>,
    typegen: HashSet<QueryMethod>,
}

impl Capabilities {
    /// Typegen methods are always a subset of the query-bearing ones.
    pub fn new(
        query: impl IntoIterator<Item = QueryMethod>,
        typegen: impl IntoIterator<Item = QueryMethod>,
    ) -> Self {
        let query: HashSet<_> = query.into_iter().collect();
        let typegen = typegen.into_iter().filter(|m| query.contains(m)).collect();
        Self { query, typegen }
    }

    /// Resolve a member name to a method and what it triggers.
    pub fn resolve(&self, name: &str) -> Option<(QueryMethod, Capability)> {
        let method = QueryMethod::from_name(name)?;
        if !self.query.contains(&method) {
            return None;
        }
        let capability = if self.typegen.contains(&method) {
            Capability::Typegen
        } else {
            Capability::Format
        };
        Some((method, capability))
    }

    /// Drop type synthesis entirely (formatting only).
    pub fn without_typegen(mut self) -> Self {
        self.typegen.clear();
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new(QueryMethod::ALL, QueryMethod::TYPEGEN)
    }
}
