//! Error handling, definitions, and utilities for the oxbow query optimizer.
//!
//! All fallible optimizer entry points return [`OxbowResult`]. Errors are
//! fatal to the statement being processed; nothing is recovered locally.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// General error type used across the oxbow codebase.
///
/// Message text follows PostgreSQL where an analogous message exists (e.g.
/// NOT NULL violations), so errors can be surfaced to SQL clients verbatim.
#[derive(Clone, Serialize, Deserialize, Error, Debug, PartialEq, Eq)]
pub enum OxbowError {
    /// A join operator the logical planner cannot lower.
    #[error("Join type invalid")]
    InvalidJoinType,

    /// A select list mixes aggregate and non-aggregate items without a
    /// GROUP BY clause.
    #[error(
        "Non aggregation expression must appear in the GROUP BY clause or be used in an \
         aggregate function"
    )]
    AggregationMix,

    /// A conjunctive predicate whose shape the planner does not handle, e.g.
    /// a subquery under a disjunction.
    #[error("Predicate type not supported yet")]
    UnsupportedPredicate,

    /// A comparison with sub-selects on both sides.
    #[error("Do not support comparison between sub-select")]
    ScalarSubqueryComparison,

    /// A correlated sub-select outside the admissible shape.
    #[error("Sub-select not supported")]
    UnsupportedSubSelect,

    /// A sub-select in a predicate context that projects more than one
    /// column.
    #[error("Array in predicates not supported")]
    SubSelectArity,

    /// An `INSERT` row wider than the target column list.
    #[error("INSERT has more expressions than target columns")]
    InsertTooManyExpressions,

    /// An `INSERT` row narrower than the explicit target column list.
    #[error("INSERT has more target columns than expressions")]
    InsertTooFewExpressions,

    /// A column name that does not resolve in the target table's schema.
    #[error("column \"{column}\" of relation \"{table}\" does not exist")]
    NoSuchColumn {
        /// The unresolved column name.
        column: String,
        /// The table the lookup ran against.
        table: String,
    },

    /// A non-nullable, defaultless column was left without a value.
    #[error("null value in column \"{column}\" violates not-null constraint")]
    NotNullViolation {
        /// The violated column.
        column: String,
    },

    /// Two select-list items of a derived table map to the same column name.
    #[error("column \"{column}\" specified more than once")]
    DuplicateDerivedColumn {
        /// The colliding (lowercased) column name.
        column: String,
    },

    /// A table couldn't be found in the catalog.
    #[error("Could not find table '{0}'")]
    TableNotFound(String),

    /// A database couldn't be found in the catalog.
    #[error("Could not find database '{0}'")]
    DatabaseNotFound(String),

    /// An internal invariant has been violated.
    ///
    /// Produced by [`internal!`] and [`invariant!`]; signals a bug in the
    /// planner itself, not a problem with the statement being planned.
    #[error("internal error: {0}")]
    Internal(String),

    /// An operation oxbow recognizes but does not handle yet.
    ///
    /// Produced by [`unsupported!`].
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl OxbowError {
    /// Returns `true` if the error is [`Unsupported`][OxbowError::Unsupported]
    /// or one of the specific not-implemented-yet kinds.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::Unsupported(..)
                | Self::UnsupportedPredicate
                | Self::ScalarSubqueryComparison
                | Self::UnsupportedSubSelect
                | Self::SubSelectArity
        )
    }

    /// Returns `true` if the error is [`Internal`][OxbowError::Internal].
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(..))
    }
}

/// Make a new [`OxbowError::Internal`] with the provided string-able
/// argument. Debug builds tag the message with the caller's source location.
#[track_caller]
pub fn internal_err<T: Into<String>>(message: T) -> OxbowError {
    OxbowError::Internal(with_location(message.into()))
}

/// Make a new [`OxbowError::Unsupported`] with the provided string-able
/// argument. Debug builds tag the message with the caller's source location.
#[track_caller]
pub fn unsupported_err<T: Into<String>>(message: T) -> OxbowError {
    OxbowError::Unsupported(with_location(message.into()))
}

/// Appends the caller's source location to `message` in debug builds.
/// Release builds leave the message untouched.
#[track_caller]
fn with_location(message: String) -> String {
    if cfg!(debug_assertions) {
        let caller = std::panic::Location::caller();
        format!("{} [{}:{}]", message, caller.file(), caller.line())
    } else {
        message
    }
}

/// Return early with an [`OxbowError::Internal`].
///
/// Accepts [`format!`]-style arguments; with none, reports unreachable
/// code. Use for broken planner invariants, not for errors callers are
/// expected to handle.
#[macro_export]
macro_rules! internal {
    () => {
        $crate::internal!("entered unreachable code")
    };
    ($($args:tt)+) => {
        return Err($crate::internal_err(format!($($args)+)))
    };
}

/// Return early with an [`OxbowError::Unsupported`]: the operation is
/// recognized but not implemented yet.
///
/// Accepts [`format!`]-style arguments.
#[macro_export]
macro_rules! unsupported {
    () => {
        $crate::unsupported!("not implemented yet")
    };
    ($($args:tt)+) => {
        return Err($crate::unsupported_err(format!($($args)+)))
    };
}

/// Return early with an [`OxbowError::Internal`] when a condition does not
/// hold; the fallible counterpart of [`assert!`].
#[macro_export]
macro_rules! invariant {
    ($cond:expr) => {
        $crate::invariant!($cond, "invariant violated: {}", ::std::stringify!($cond))
    };
    ($cond:expr, $($args:tt)+) => {
        if !$cond {
            return Err($crate::internal_err(format!($($args)+)));
        }
    };
}

/// Standard issue [`Result`] alias.
pub type OxbowResult<T> = ::std::result::Result<T, OxbowError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_invariant() -> OxbowResult<u32> {
        invariant!(1 > 2, "arithmetic is broken");
        Ok(0)
    }

    #[test]
    fn postgres_compatible_messages() {
        assert_eq!(
            OxbowError::NotNullViolation {
                column: "h_data".into()
            }
            .to_string(),
            "null value in column \"h_data\" violates not-null constraint"
        );
        assert_eq!(
            OxbowError::NoSuchColumn {
                column: "h_nope".into(),
                table: "history".into()
            }
            .to_string(),
            "column \"h_nope\" of relation \"history\" does not exist"
        );
    }

    #[test]
    fn invariant_returns_internal() {
        let err = fails_invariant().unwrap_err();
        assert!(err.is_internal());
        assert!(err.to_string().contains("arithmetic is broken"));
    }

    #[test]
    fn helpers_tag_caller_location_in_debug() {
        let err = internal_err("boom");
        assert!(err.to_string().contains("boom"));
        if cfg!(debug_assertions) {
            assert!(err.to_string().contains(file!()));
        }
    }
}
