//! Textual front-end: lowers one statement into a [`Request`].
//!
//! `INSERT INTO <collection> <json-object>` is split by hand because the
//! payload is JSON. Every other statement goes through `sqlparser` and only
//! the equality-conjunction subset of SQL is accepted.

use common::Document;
use serde_json::Value;
use sqlparser::ast::{
    AssignmentTarget, BinaryOperator, Delete, Expr as SqlExpr, FromTable, Ident, ObjectName,
    Query, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, UnaryOperator,
    Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::{QueryResult, malformed};
use crate::request::{Clause, Predicate, Projection, Request};

pub struct QueryParser {
    dialect: GenericDialect,
}

impl QueryParser {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    pub fn parse(&self, text: &str) -> QueryResult<Request> {
        let text = text.trim();
        let text = text.strip_suffix(';').unwrap_or(text).trim_end();
        if text.is_empty() {
            return malformed("empty statement");
        }
        if let Some(rest) = strip_keyword(text, "INSERT") {
            return parse_insert(rest);
        }
        let statement = self.parse_one(text)?;
        lower_statement(statement)
    }

    fn parse_one(&self, sql: &str) -> QueryResult<Statement> {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(err) => return malformed(err.to_string()),
        };
        let mut statements = statements.into_iter();
        match (statements.next(), statements.next()) {
            (Some(statement), None) => Ok(statement),
            (None, _) => malformed("no statement found"),
            (Some(_), Some(_)) => malformed("expected a single statement, found several"),
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Strips a leading case-insensitive keyword followed by whitespace or the end.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    let rest = &text[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn parse_insert(rest: &str) -> QueryResult<Request> {
    let Some(rest) = strip_keyword(rest, "INTO") else {
        return malformed("expected INSERT INTO <collection> <json-object>");
    };
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return malformed("INSERT is missing a collection name");
    }
    let (collection, payload) = rest.split_at(name_len);
    let payload = payload.trim();
    if payload.is_empty() {
        return malformed(format!("INSERT INTO {} is missing a document", collection));
    }
    let document = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(document)) => document,
        Ok(other) => {
            return malformed(format!("document must be a JSON object, got {}", other));
        }
        Err(err) => return malformed(format!("invalid JSON document: {}", err)),
    };
    Ok(Request::Insert {
        collection: collection.to_string(),
        document,
    })
}

fn lower_statement(statement: Statement) -> QueryResult<Request> {
    match statement {
        Statement::Query(query) => lower_select(*query),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => {
            let collection = table_name(&table)?;
            let mut sets = Document::new();
            for assignment in assignments {
                let field = match &assignment.target {
                    AssignmentTarget::ColumnName(name) => single_name(name)?,
                    _ => return malformed("only plain fields can be assigned"),
                };
                sets.insert(field, literal(assignment.value)?);
            }
            Ok(Request::Update {
                collection,
                sets,
                predicate: lower_selection(selection)?,
            })
        }
        Statement::Delete(delete) => lower_delete(delete),
        Statement::CreateIndex(create_index) => {
            if create_index.unique {
                return malformed("unique indexes are not supported");
            }
            let collection = single_name(&create_index.table_name)?;
            let fields = create_index
                .columns
                .into_iter()
                .map(|column| field_name(column.expr))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(Request::CreateIndex { collection, fields })
        }
        other => malformed(format!("unsupported statement: {}", other)),
    }
}

fn lower_select(query: Query) -> QueryResult<Request> {
    if query.with.is_some()
        || query.order_by.is_some()
        || query.limit.is_some()
        || query.offset.is_some()
    {
        return malformed("SELECT supports only a field list, FROM and WHERE");
    }
    let select = match *query.body {
        SetExpr::Select(select) => select,
        _ => return malformed("set operations are not supported"),
    };
    if select.distinct.is_some() || select.having.is_some() {
        return malformed("SELECT supports only a field list, FROM and WHERE");
    }
    if select.from.len() != 1 {
        return malformed("SELECT needs exactly one collection");
    }
    let collection = table_name(&select.from[0])?;

    let fields = match select.projection.as_slice() {
        [SelectItem::Wildcard(_)] => Projection::All,
        items => {
            let mut fields = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    SelectItem::UnnamedExpr(expr) => fields.push(field_name(expr.clone())?),
                    _ => return malformed(format!("unsupported select item: {}", item)),
                }
            }
            Projection::Fields(fields)
        }
    };
    Ok(Request::Select {
        collection,
        fields,
        predicate: lower_selection(select.selection)?,
    })
}

fn lower_delete(delete: Delete) -> QueryResult<Request> {
    let tables = match &delete.from {
        FromTable::WithFromKeyword(tables) => tables,
        FromTable::WithoutKeyword(tables) => tables,
    };
    if tables.len() != 1 {
        return malformed("DELETE needs exactly one collection");
    }
    Ok(Request::Delete {
        collection: table_name(&tables[0])?,
        predicate: lower_selection(delete.selection)?,
    })
}

fn table_name(table: &TableWithJoins) -> QueryResult<String> {
    match table {
        TableWithJoins {
            relation: TableFactor::Table { name, .. },
            joins,
        } if joins.is_empty() => single_name(name),
        _ => malformed("only a single collection name is supported"),
    }
}

fn single_name(name: &ObjectName) -> QueryResult<String> {
    match name.0.as_slice() {
        [ident] => Ok(ident.value.clone()),
        _ => malformed(format!("qualified names are not supported: {}", name)),
    }
}

fn field_name(expr: SqlExpr) -> QueryResult<String> {
    match expr {
        SqlExpr::Identifier(Ident { value, .. }) => Ok(value),
        other => malformed(format!("expected a field name, got {}", other)),
    }
}

fn lower_selection(selection: Option<SqlExpr>) -> QueryResult<Option<Predicate>> {
    let Some(expr) = selection else {
        return Ok(None);
    };
    let mut clauses = Vec::new();
    collect_clauses(expr, &mut clauses)?;
    Ok(Some(Predicate::new(clauses)))
}

fn collect_clauses(expr: SqlExpr, clauses: &mut Vec<Clause>) -> QueryResult<()> {
    match expr {
        SqlExpr::Nested(inner) => collect_clauses(*inner, clauses),
        SqlExpr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_clauses(*left, clauses)?;
            collect_clauses(*right, clauses)
        }
        SqlExpr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            let field = field_name(*left)?;
            clauses.push(Clause::new(field, literal(*right)?));
            Ok(())
        }
        other => malformed(format!(
            "only field = literal joined by AND is supported, got {}",
            other
        )),
    }
}

fn literal(expr: SqlExpr) -> QueryResult<Value> {
    match expr {
        SqlExpr::Value(value) => sql_value(value),
        SqlExpr::Nested(inner) => literal(*inner),
        SqlExpr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match *expr {
            SqlExpr::Value(SqlValue::Number(number, _)) => number_literal(&format!("-{}", number)),
            other => malformed(format!("cannot negate {}", other)),
        },
        // GenericDialect reads "text" as a quoted identifier; a bare word
        // such as `alice` is taken as a string as well.
        SqlExpr::Identifier(ident) => Ok(Value::String(ident.value)),
        other => malformed(format!("expected a literal, got {}", other)),
    }
}

fn sql_value(value: SqlValue) -> QueryResult<Value> {
    match value {
        SqlValue::Number(number, _) => number_literal(&number),
        SqlValue::SingleQuotedString(text) | SqlValue::DoubleQuotedString(text) => {
            Ok(Value::String(text))
        }
        SqlValue::Boolean(flag) => Ok(Value::Bool(flag)),
        SqlValue::Null => Ok(Value::Null),
        other => malformed(format!("unsupported literal {}", other)),
    }
}

fn number_literal(text: &str) -> QueryResult<Value> {
    if let Ok(number @ Value::Number(_)) = serde_json::from_str::<Value>(text) {
        return Ok(number);
    }
    match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(number) => Ok(Value::Number(number)),
        None => malformed(format!("invalid number {}", text)),
    }
}
