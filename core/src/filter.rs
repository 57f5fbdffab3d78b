//! Record predicates.
//!
//! A [`FilterConfig`] is an explicit, tagged description of the predicate
//! chain applied by the filter stage. The two query endpoints treat a missing
//! name filter differently, so each gets its own named constructor:
//!
//! | Endpoint | Name filter absent |
//! |---|---|
//! | paginated | every active record matches |
//! | fan-out | nothing matches |
//!
//! An empty name filter is present, not absent: every name contains it.

use crate::record::Record;

/// What to do when no name filter was supplied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AbsentNamePolicy {
    /// An absent filter accepts every name.
    MatchAll,
    /// An absent filter rejects every name.
    MatchNone,
}

/// Predicate chain: active-flag check, then optional substring match.
///
/// # Examples
///
/// ```
/// use record_stream_core::filter::FilterConfig;
/// use record_stream_core::record::Record;
///
/// let record = Record::new(12, "article12", true);
///
/// assert!(FilterConfig::paginated(None).matches(&record));
/// assert!(!FilterConfig::fan_out(None).matches(&record));
/// assert!(FilterConfig::fan_out(Some("2".into())).matches(&record));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    /// Drop records whose active flag is false.
    pub active_only: bool,
    /// Substring the name must contain.
    pub name_substring: Option<String>,
    /// Outcome of the name predicate when `name_substring` is `None`.
    pub when_absent: AbsentNamePolicy,
}

impl FilterConfig {
    /// Filter used by the paginated endpoint: absent name matches everything.
    #[must_use]
    pub const fn paginated(name_substring: Option<String>) -> Self {
        Self {
            active_only: true,
            name_substring,
            when_absent: AbsentNamePolicy::MatchAll,
        }
    }

    /// Filter used by the fan-out endpoint: absent name matches nothing.
    #[must_use]
    pub const fn fan_out(name_substring: Option<String>) -> Self {
        Self {
            active_only: true,
            name_substring,
            when_absent: AbsentNamePolicy::MatchNone,
        }
    }

    /// Evaluate the chain, short-circuiting on the first failing predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if self.active_only && !record.is_active() {
            return false;
        }
        match &self.name_substring {
            Some(needle) => record.name().contains(needle.as_str()),
            None => self.when_absent == AbsentNamePolicy::MatchAll,
        }
    }

    /// True when no record can ever pass this filter.
    #[must_use]
    pub const fn rejects_everything(&self) -> bool {
        self.name_substring.is_none() && matches!(self.when_absent, AbsentNamePolicy::MatchNone)
    }
}
