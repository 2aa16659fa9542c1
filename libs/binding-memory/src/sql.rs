//! The handful of statement shapes the pipeline issues, nothing more.

/// Column declaration from `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Serial,
    Int,
    Timestamp,
    Text,
}

/// Value expression in `VALUES (...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `$n`, 1-based.
    Param(usize),
    Literal(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Create {
        table: String,
        if_not_exists: bool,
        columns: Vec<Column>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Expr>,
    },
    Select {
        table: String,
        order_by: Option<(String, bool)>,
        limit: Option<usize>,
    },
}

pub fn parse(sql: &str) -> Result<Statement, String> {
    let sql = sql.trim().trim_end_matches(';').trim();
    let words: Vec<&str> = sql.split_whitespace().collect();
    let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
    match upper.first().map(String::as_str) {
        Some("CREATE") => parse_create(sql, &upper),
        Some("INSERT") => parse_insert(sql, &upper),
        Some("SELECT") => parse_select(&words, &upper),
        _ => Err(format!("unsupported statement: {sql}")),
    }
}

fn parse_create(sql: &str, upper: &[String]) -> Result<Statement, String> {
    if upper.get(1).map(String::as_str) != Some("TABLE") {
        return Err(format!("unsupported statement: {sql}"));
    }
    let if_not_exists = upper.len() > 4 && upper[2] == "IF" && upper[3] == "NOT" && upper[4] == "EXISTS";
    let (head, body) = split_parens(sql)?;
    let table = head
        .split_whitespace()
        .last()
        .filter(|_| head.split_whitespace().count() >= if if_not_exists { 6 } else { 3 })
        .ok_or("missing table name")?
        .to_ascii_lowercase();
    let columns = body
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(parse_column)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Statement::Create {
        table,
        if_not_exists,
        columns,
    })
}

fn parse_column(decl: &str) -> Result<Column, String> {
    let mut parts = decl.split_whitespace();
    let name = parts.next().ok_or("empty column")?.to_ascii_lowercase();
    let ty = match parts.next().map(str::to_ascii_uppercase).as_deref() {
        Some("SERIAL") => ColumnType::Serial,
        Some("INT" | "INTEGER" | "BIGINT") => ColumnType::Int,
        Some("TIMESTAMP") => ColumnType::Timestamp,
        Some("TEXT" | "VARCHAR") => ColumnType::Text,
        other => return Err(format!("column {name}: unsupported type {other:?}")),
    };
    Ok(Column { name, ty })
}

fn parse_insert(sql: &str, upper: &[String]) -> Result<Statement, String> {
    if upper.get(1).map(String::as_str) != Some("INTO") {
        return Err(format!("unsupported statement: {sql}"));
    }
    let values_at = sql
        .to_ascii_uppercase()
        .find("VALUES")
        .ok_or("INSERT without VALUES")?;
    let (head, cols) = split_parens(&sql[..values_at])?;
    let (_, vals) = split_parens(&sql[values_at..])?;
    let table = head.split_whitespace().nth(2).ok_or("missing table name")?.to_ascii_lowercase();
    let columns = cols.split(',').map(|c| c.trim().to_ascii_lowercase()).collect();
    let values = vals.split(',').map(|v| parse_expr(v.trim())).collect::<Result<_, _>>()?;
    Ok(Statement::Insert { table, columns, values })
}

fn parse_expr(v: &str) -> Result<Expr, String> {
    if let Some(n) = v.strip_prefix('$') {
        let n: usize = n.parse().map_err(|_| format!("bad parameter {v}"))?;
        if n == 0 {
            return Err("parameters are 1-based".into());
        }
        return Ok(Expr::Param(n));
    }
    if let Some(s) = v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Ok(Expr::Literal(serde_json::Value::String(s.to_string())));
    }
    v.parse::<f64>()
        .map(|n| Expr::Literal(serde_json::json!(n)))
        .map_err(|_| format!("unsupported value expression {v}"))
}

fn parse_select(words: &[&str], upper: &[String]) -> Result<Statement, String> {
    if upper.get(1).map(String::as_str) != Some("*") || upper.get(2).map(String::as_str) != Some("FROM") {
        return Err("only SELECT * FROM <table> is supported".into());
    }
    let table = words.get(3).ok_or("missing table name")?.to_ascii_lowercase();
    let mut order_by = None;
    let mut limit = None;
    let mut i = 4;
    while i < upper.len() {
        match upper[i].as_str() {
            "ORDER" if upper.get(i + 1).map(String::as_str) == Some("BY") => {
                let col = words.get(i + 2).ok_or("ORDER BY without column")?.to_ascii_lowercase();
                let desc = match upper.get(i + 3).map(String::as_str) {
                    Some("DESC") => {
                        i += 1;
                        true
                    }
                    Some("ASC") => {
                        i += 1;
                        false
                    }
                    _ => false,
                };
                order_by = Some((col, desc));
                i += 3;
            }
            "LIMIT" => {
                let n = words.get(i + 1).ok_or("LIMIT without count")?;
                limit = Some(n.parse().map_err(|_| format!("bad LIMIT {n}"))?);
                i += 2;
            }
            other => return Err(format!("unexpected token {other}")),
        }
    }
    Ok(Statement::Select { table, order_by, limit })
}

/// Split `head (body)` at the first '(' and the last ')'.
fn split_parens(s: &str) -> Result<(&str, &str), String> {
    let open = s.find('(').ok_or("expected '('")?;
    let close = s.rfind(')').filter(|&c| c > open).ok_or("expected ')'")?;
    Ok((&s[..open], &s[open + 1..close]))
}
