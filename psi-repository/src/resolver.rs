//! Collision resolution between entries sharing one identifier.
//!
//! Candidates are narrowed in a fixed order:
//!
//! 1. no candidate: not found; one candidate: found, whatever the context;
//! 2. explicit standards filter: keep candidates defined by one of them,
//!    none left is "not found";
//! 3. PID hint: standards associated with the carrying PID, applied only
//!    while more than one candidate is left, and ignored if it would leave
//!    none;
//! 4. still more than one: ambiguous, unless the caller opted into
//!    [`ResolvePolicy::FirstMatch`].
//!
//! An explicit standards filter therefore always wins over a conflicting
//! PID hint.

use log::trace;
use serde::Deserialize;

use crate::entry::Candidate;
use crate::standards::Standards;

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Exactly one entry matched.
    Found(T),
    /// No entry is registered for the identifier in this context.
    NotFound,
    /// Several entries match and the context cannot tell them apart.
    Ambiguous,
}

impl<T> Resolution<T> {
    /// The found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(value),
            _ => None,
        }
    }

    /// True for [`Resolution::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// True for [`Resolution::Ambiguous`].
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous)
    }

    /// Map the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Found(value) => Resolution::Found(f(value)),
            Resolution::NotFound => Resolution::NotFound,
            Resolution::Ambiguous => Resolution::Ambiguous,
        }
    }
}

/// What to do when context cannot narrow candidates down to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Report [`Resolution::Ambiguous`].
    #[default]
    Strict,
    /// Pick the earliest registered candidate. Standards queries then report
    /// the mask of that candidate instead of NONE.
    FirstMatch,
}

/// Inputs of one resolution, already reduced to masks.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Filter {
    /// Explicit standards filter, NONE when unknown.
    pub standards: Standards,
    /// Standards derived from the carrying PID, NONE when unknown.
    pub pid_standards: Standards,
    pub policy: ResolvePolicy,
}

/// Narrow `candidates` (in registration order) as far as `filter` allows.
///
/// Empty result: not found. One element: found. More: ambiguous.
pub(crate) fn narrow<'a, C: Candidate>(
    candidates: impl IntoIterator<Item = &'a C>,
    filter: &Filter,
) -> Vec<&'a C>
where
    C: 'a,
{
    // The same registration loaded twice is one candidate.
    let mut set: Vec<&C> = Vec::new();
    for c in candidates {
        if !set
            .iter()
            .any(|s| s.name() == c.name() && s.standards() == c.standards())
        {
            set.push(c);
        }
    }

    if set.len() <= 1 {
        return set;
    }

    if !filter.standards.is_none() {
        set.retain(|c| c.standards().has_any_of(filter.standards));
        trace!(
            "standards filter {} leaves {} candidate(s)",
            filter.standards,
            set.len()
        );
        if set.len() <= 1 {
            return set;
        }
    }

    if !filter.pid_standards.is_none() {
        let by_pid: Vec<&C> = set
            .iter()
            .copied()
            .filter(|c| c.standards().has_any_of(filter.pid_standards))
            .collect();
        trace!(
            "PID filter {} leaves {} candidate(s)",
            filter.pid_standards,
            by_pid.len()
        );
        if !by_pid.is_empty() {
            set = by_pid;
        }
    }

    set
}

/// Resolve `candidates` to at most one entry.
pub(crate) fn resolve<'a, C: Candidate>(
    candidates: impl IntoIterator<Item = &'a C>,
    filter: &Filter,
) -> Resolution<&'a C>
where
    C: 'a,
{
    let set = narrow(candidates, filter);
    match set.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(set[0]),
        _ if filter.policy == ResolvePolicy::FirstMatch => Resolution::Found(set[0]),
        _ => Resolution::Ambiguous,
    }
}

/// Standards that can be inferred from the identifier and context.
///
/// One candidate left: its standards. Several: the standards they all have
/// in common, NONE when they come from different standards.
pub(crate) fn standards_of<'a, C: Candidate>(
    candidates: impl IntoIterator<Item = &'a C>,
    filter: &Filter,
) -> Standards
where
    C: 'a,
{
    narrowed_standards(&narrow(candidates, filter), filter)
}

/// [`standards_of`] for a set already returned by [`narrow`].
///
/// Under [`ResolvePolicy::FirstMatch`] this is the mask of the entry that
/// [`resolve`] picks.
pub(crate) fn narrowed_standards<C: Candidate>(set: &[&C], filter: &Filter) -> Standards {
    let mut iter = set.iter();
    match iter.next() {
        None => Standards::NONE,
        Some(first) if filter.policy == ResolvePolicy::FirstMatch => first.standards(),
        Some(first) => iter.fold(first.standards(), |acc, c| acc & c.standards()),
    }
}
