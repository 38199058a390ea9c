//! Classification of PostgreSQL errors.

/// Name of the partial unique index on live shortcodes.
pub const SHORTCODE_LIVE_INDEX: &str = "links_shortcode_live_key";

/// Returns true when `e` is a unique violation raised by the live-shortcode index.
pub fn is_unique_violation_on_shortcode(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(SHORTCODE_LIVE_INDEX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_not_violation() {
        assert!(!is_unique_violation_on_shortcode(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation_on_shortcode(&sqlx::Error::PoolTimedOut));
    }
}
