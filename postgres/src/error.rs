use pharmacy_core::PharmacyError;

/// Map a driver error to `Internal`, tagged with what was being attempted.
///
/// The message is for logs; the HTTP layer never returns it.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> PharmacyError {
    move |e| PharmacyError::Internal(format!("Failed to {context}: {e}"))
}

/// Like [`db_error`], but unique-key violations become `Conflict`.
pub(crate) fn db_error_or_conflict(
    context: &'static str,
    conflict: &'static str,
) -> impl Fn(sqlx::Error) -> PharmacyError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return PharmacyError::Conflict(conflict.to_string());
            }
        }
        PharmacyError::Internal(format!("Failed to {context}: {e}"))
    }
}
