use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Column '{column}' references a row that does not exist")]
    ForeignKey { column: String },

    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn foreign_key(column: impl Into<String>) -> Self {
        Self::ForeignKey {
            column: column.into(),
        }
    }

    /// Classifies PostgreSQL constraint violations; anything else stays a
    /// plain database error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23503") => {
                    let column = db_err
                        .constraint()
                        .and_then(column_from_constraint)
                        .unwrap_or("unknown")
                        .to_string();
                    return Self::ForeignKey { column };
                }
                Some("23505") => return Self::Duplicate(db_err.message().to_string()),
                _ => {}
            }
        }
        Self::Database(err)
    }
}

// PostgreSQL names foreign keys `<table>_<column>_fkey` by default.
fn column_from_constraint(constraint: &str) -> Option<&str> {
    constraint
        .strip_prefix("cars_")
        .and_then(|rest| rest.strip_suffix("_fkey"))
}
