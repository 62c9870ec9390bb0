//! Query verification helpers
//!
//! Assertions run statements through a `QuerySession` and compare the rows
//! returned against expectations. Failures are `HarnessError::Assertion`
//! carrying the query and what was actually returned.

use crate::errors::{HarnessError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Row = Vec<Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    #[default]
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

/// Query text plus the consistency level it runs at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub query: String,
    pub consistency: ConsistencyLevel,
}

impl Statement {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            consistency: ConsistencyLevel::One,
        }
    }

    pub fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = consistency;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    Invalid,
    Unauthorized,
    Unavailable,
    ReadTimeout,
    WriteTimeout,
    ReadFailure,
    WriteFailure,
    Other,
}

impl QueryErrorKind {
    /// Errors a coordinator raises when too few replicas respond
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            QueryErrorKind::Unavailable
                | QueryErrorKind::ReadTimeout
                | QueryErrorKind::WriteTimeout
                | QueryErrorKind::ReadFailure
                | QueryErrorKind::WriteFailure
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// Connection to a node able to run CQL statements
pub trait QuerySession {
    fn execute(&self, statement: &Statement) -> std::result::Result<Vec<Row>, QueryError>;
}

fn run<S: QuerySession + ?Sized>(session: &S, statement: &Statement) -> Result<Vec<Row>> {
    session.execute(statement).map_err(|e| {
        HarnessError::Assertion(format!("query '{}' failed: {}", statement.query, e))
    })
}

fn fmt_rows(rows: &[Row]) -> String {
    serde_json::to_string(rows).unwrap_or_else(|_| format!("{:?}", rows))
}

/// Exactly one row equal to `expected`
pub fn assert_one<S: QuerySession + ?Sized>(session: &S, statement: &Statement, expected: Row) -> Result<()> {
    let rows = run(session, statement)?;
    let expected = vec![expected];
    if rows != expected {
        return Err(HarnessError::Assertion(format!(
            "Expected {} from {}, but got {}",
            fmt_rows(&expected),
            statement.query,
            fmt_rows(&rows)
        )));
    }
    Ok(())
}

pub fn assert_none<S: QuerySession + ?Sized>(session: &S, statement: &Statement) -> Result<()> {
    let rows = run(session, statement)?;
    if !rows.is_empty() {
        return Err(HarnessError::Assertion(format!(
            "Expected nothing from {}, but got {}",
            statement.query,
            fmt_rows(&rows)
        )));
    }
    Ok(())
}

/// All rows equal `expected`, optionally regardless of order
pub fn assert_all<S: QuerySession + ?Sized>(
    session: &S,
    statement: &Statement,
    expected: Vec<Row>,
    ignore_order: bool,
) -> Result<()> {
    let mut rows = run(session, statement)?;
    let mut expected = expected;
    if ignore_order {
        // serde_json::Value has no Ord; compare by canonical JSON text
        rows.sort_by_key(|row| serde_json::to_string(row).unwrap_or_default());
        expected.sort_by_key(|row| serde_json::to_string(row).unwrap_or_default());
    }
    if rows != expected {
        return Err(HarnessError::Assertion(format!(
            "Expected {} from {}, but got {}",
            fmt_rows(&expected),
            statement.query,
            fmt_rows(&rows)
        )));
    }
    Ok(())
}

pub fn assert_row_count<S: QuerySession + ?Sized>(session: &S, table: &str, expected: u64) -> Result<()> {
    let statement = Statement::new(&format!("SELECT count(*) FROM {};", table));
    let rows = run(session, &statement)?;
    let count = rows
        .first()
        .and_then(|row| row.first())
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            HarnessError::Assertion(format!("count(*) on '{}' returned {}", table, fmt_rows(&rows)))
        })?;

    if count != expected {
        return Err(HarnessError::Assertion(format!(
            "Expected a row count of {} in table '{}', but got {}",
            expected, table, count
        )));
    }
    Ok(())
}

/// The statement must fail with `expected`, its message matching `matching` if given
pub fn assert_invalid<S: QuerySession + ?Sized>(
    session: &S,
    statement: &Statement,
    matching: Option<&str>,
    expected: QueryErrorKind,
) -> Result<()> {
    match session.execute(statement) {
        Ok(rows) => Err(HarnessError::Assertion(format!(
            "Expecting query to be invalid: got {}",
            fmt_rows(&rows)
        ))),
        Err(e) if e.kind == expected => {
            if let Some(pattern) = matching {
                let re = Regex::new(pattern)?;
                if !re.is_match(&e.message) {
                    return Err(HarnessError::Assertion(format!(
                        "Error message does not contain {} (error = {})",
                        pattern, e.message
                    )));
                }
            }
            Ok(())
        }
        Err(e) => Err(HarnessError::Assertion(format!(
            "Expecting {:?} error from {}, got: {}",
            expected, statement.query, e
        ))),
    }
}

pub fn assert_unauthorized<S: QuerySession + ?Sized>(session: &S, statement: &Statement, message: &str) -> Result<()> {
    assert_invalid(session, statement, Some(message), QueryErrorKind::Unauthorized)
}

/// The operation must fail because too few replicas are available
pub fn assert_unavailable<T, F>(operation: F) -> Result<()>
where
    F: FnOnce() -> std::result::Result<T, QueryError>,
{
    match operation() {
        Err(e) if e.kind.is_unavailable() => Ok(()),
        Err(e) => Err(HarnessError::Assertion(format!(
            "Expecting unavailable exception, got: {}",
            e
        ))),
        Ok(_) => Err(HarnessError::Assertion(
            "Expecting unavailable exception but no exception was raised".to_string(),
        )),
    }
}

/// All values lie within `error` (fraction of the max) of each other
pub fn assert_almost_equal(values: &[f64], error: f64, error_message: &str) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }

    let vmax = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let vmin = values.iter().copied().fold(f64::INFINITY, f64::min);

    if vmin > vmax * (1.0 - error) || vmin == vmax {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!(
            "values not within {:.2}% of the max: {:?} ({})",
            error * 100.0,
            values,
            error_message
        )))
    }
}

pub const DEFAULT_ALMOST_EQUAL_ERROR: f64 = 0.16;
