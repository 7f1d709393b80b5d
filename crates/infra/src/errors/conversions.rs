//! Conversions from external infrastructure errors into domain errors.

use carelog_domain::CarelogError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CarelogError);

impl From<InfraError> for CarelogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CarelogError> for InfraError {
    fn from(value: CarelogError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCarelogError {
    fn into_carelog(self) -> CarelogError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CarelogError */
/* -------------------------------------------------------------------------- */

impl IntoCarelogError for SqlError {
    fn into_carelog(self) -> CarelogError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CarelogError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CarelogError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CarelogError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        CarelogError::Database("foreign key constraint violation".into())
                    }
                    _ => CarelogError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CarelogError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CarelogError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CarelogError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => CarelogError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                CarelogError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                CarelogError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => CarelogError::Database("invalid SQL query".into()),
            other => CarelogError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_carelog())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CarelogError */
/* -------------------------------------------------------------------------- */

impl IntoCarelogError for HttpError {
    fn into_carelog(self) -> CarelogError {
        if self.is_timeout() {
            return CarelogError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CarelogError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => CarelogError::NotFound(message),
                _ => CarelogError::Network(message),
            };
        }

        CarelogError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_carelog())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
