//! Ordered "first success wins" fallback.

/// Per-candidate results in attempt order. Candidates after the first success
/// are never attempted and do not appear.
#[derive(Debug)]
pub struct CascadeReport<E> {
    pub results: Vec<Result<(), E>>,
}

impl<E> CascadeReport<E> {
    /// Index of the candidate that succeeded, if any.
    pub fn winner(&self) -> Option<usize> {
        self.results.iter().position(Result::is_ok)
    }

    pub fn succeeded(&self) -> bool {
        self.winner().is_some()
    }
}

/// Tries `candidates` in order until `attempt` returns `Ok`.
pub fn first_success<C, E, F>(candidates: &[C], mut attempt: F) -> CascadeReport<E>
where
    F: FnMut(&C) -> Result<(), E>,
{
    let mut results = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let result = attempt(candidate);
        let done = result.is_ok();
        results.push(result);
        if done {
            break;
        }
    }
    CascadeReport { results }
}
