//! Count reconciler: makes a batch exactly `requested` long.
//!
//! States: `Initial → Retried(n) → Reconciled`. Each retry is one extra model
//! call with the corrective prompt, at most `retry_limit` of them. After that
//! the batch is padded (cyclic duplication) or trimmed (keep the head), and
//! ids are reassigned `1..=requested`.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::api_types::{GeneratedQuestion, RepairSummary};
use crate::error::{CompletionError, FailureCause, ParseError};

/// Why a retry attempt produced nothing usable. Never escalated.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RetryError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Retried(u32),
    Reconciled,
}

/// Reconcile `initial` to exactly `requested` questions.
///
/// `retry(actual)` performs one corrective attempt given the size of the
/// current batch. A non-empty retry result replaces the current batch; a
/// failed or empty retry keeps it.
///
/// # Errors
/// [`FailureCause::EmptyBatch`] when no attempt yielded a single question.
pub(crate) async fn reconcile<F, Fut>(
    initial: Vec<GeneratedQuestion>,
    requested: usize,
    retry_limit: u32,
    mut retry: F,
) -> Result<(Vec<GeneratedQuestion>, RepairSummary), FailureCause>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<GeneratedQuestion>, RetryError>>,
{
    let mut current = initial;
    let mut summary = RepairSummary {
        attempts: 1,
        ..RepairSummary::default()
    };
    let mut state = State::Initial;

    while state != State::Reconciled {
        let done = match state {
            State::Initial => 0,
            State::Retried(n) => n,
            State::Reconciled => break,
        };
        if current.len() == requested || done >= retry_limit {
            state = State::Reconciled;
            continue;
        }

        let actual = current.len();
        info!(actual, requested, attempt = done + 1, "count mismatch; retrying with corrective prompt");
        summary.attempts += 1;
        summary.retried = true;

        match retry(actual).await {
            Ok(qs) if !qs.is_empty() => {
                debug!(got = qs.len(), "retry batch accepted");
                current = qs;
            }
            Ok(_) => warn!(kept = actual, "retry returned no questions; keeping previous batch"),
            Err(e) => warn!(kept = actual, error = %e, "retry failed; keeping previous batch"),
        }
        state = State::Retried(done + 1);
    }

    if current.is_empty() {
        return Err(FailureCause::EmptyBatch {
            attempts: summary.attempts,
        });
    }

    let (questions, padded, trimmed) = fit_to_count(current, requested);
    summary.padded = padded;
    summary.trimmed = trimmed;
    if padded > 0 || trimmed > 0 {
        info!(requested, padded, trimmed, "batch size repaired");
    }
    Ok((questions, summary))
}

/// Pads cyclically or truncates, then assigns ids `"1"..="requested"`.
///
/// Returns `(questions, padded, trimmed)`. `qs` must be non-empty when
/// padding is needed.
pub(crate) fn fit_to_count(
    mut qs: Vec<GeneratedQuestion>,
    requested: usize,
) -> (Vec<GeneratedQuestion>, usize, usize) {
    let base = qs.len();
    let mut padded = 0;
    let mut trimmed = 0;

    if base > requested {
        trimmed = base - requested;
        qs.truncate(requested);
    } else if base < requested && base > 0 {
        padded = requested - base;
        for i in base..requested {
            let dup = qs[i % base].clone();
            qs.push(dup);
        }
    }

    for (i, q) in qs.iter_mut().enumerate() {
        q.id = (i + 1).to_string();
    }
    (qs, padded, trimmed)
}
