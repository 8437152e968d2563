use std::fmt;

/// A write hit a UNIQUE constraint. Carried inside `anyhow::Error` so
/// callers can `downcast_ref` and map it to a domain error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueViolation {
    pub table: String,
    pub column: String,
}

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unique constraint failed on {}.{}", self.table, self.column)
    }
}

impl std::error::Error for UniqueViolation {}

/// Convert a rusqlite error, pulling out UNIQUE failures.
pub(crate) fn classify(err: rusqlite::Error) -> anyhow::Error {
    if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
        if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            if let Some(violation) = parse_unique_message(msg) {
                return violation.into();
            }
        }
    }
    err.into()
}

/// SQLite reports `UNIQUE constraint failed: members.email`.
fn parse_unique_message(msg: &str) -> Option<UniqueViolation> {
    let target = msg.strip_prefix("UNIQUE constraint failed: ")?;
    let first = target.split(", ").next()?;
    let (table, column) = first.split_once('.')?;
    Some(UniqueViolation {
        table: table.to_string(),
        column: column.to_string(),
    })
}
