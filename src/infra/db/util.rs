use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db) if db.is_check_violation() => RepoError::Integrity {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}

/// Convert a `COUNT(*)` result into the unsigned form repositories return.
pub fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}

/// Convert a non-negative `BIGINT` column into `u64`.
pub fn non_negative(value: i64, column: &'static str) -> Result<u64, RepoError> {
    u64::try_from(value).map_err(|_| RepoError::Integrity {
        message: format!("{column} must not be negative, found {value}"),
    })
}

pub fn page_bounds(offset: u64, limit: u32) -> Result<(i64, i64), RepoError> {
    let offset = i64::try_from(offset).map_err(|_| RepoError::InvalidInput {
        message: "offset exceeds supported range".to_string(),
    })?;
    Ok((offset, i64::from(limit)))
}
