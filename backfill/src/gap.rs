use crate::{error::BackfillError, store::TrxIdStore};
use clap::Parser;
use log::info;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Parser)]
pub struct GapScanArgs {
    /// Width of the block number window checked by one storage lookup.
    #[arg(long, env = "SEARCH_STEP", default_value = "1000", value_parser = clap::value_parser!(i64).range(1..))]
    pub search_step: i64,
}

/// Inclusive windows covering `[1, latest)`.
///
/// A window starting at `lo` ends at `lo + step`, or at `latest - 1` once that
/// would overshoot `latest`. Iteration stops as soon as the upper bound would
/// repeat, so the short tail window is produced exactly once.
#[derive(Debug, Clone)]
pub struct SearchWindows {
    next: i64,
    latest: i64,
    step: i64,
    upper: Option<i64>,
}

impl SearchWindows {
    pub const fn new(latest: i64, step: i64) -> Self {
        Self {
            next: 1,
            latest,
            step,
            upper: None,
        }
    }
}

impl Iterator for SearchWindows {
    type Item = RangeInclusive<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.latest {
            return None;
        }

        let upper = if self.next.saturating_add(self.step) > self.latest {
            let last = self.latest - 1;

            if self.upper == Some(last) {
                return None;
            }

            last
        } else {
            self.next + self.step
        };

        let window = self.next..=upper;

        self.upper = Some(upper);
        self.next = upper.saturating_add(1);

        Some(window)
    }
}

/// Block numbers in `[1, latest)` without any stored row, ascending.
///
/// The store is read one window at a time so no single lookup spans the whole
/// range. The result is a snapshot: rows written by others after their window
/// was scanned are not noticed.
pub async fn find_missing<S: TrxIdStore + ?Sized>(
    store: &S,
    latest: i64,
    search_step: i64,
) -> Result<Vec<i64>, BackfillError> {
    if search_step < 1 {
        return Err(BackfillError::InvalidSearchStep(search_step));
    }

    let mut missing = Vec::new();

    for window in SearchWindows::new(latest, search_step) {
        info!("Range From {} to {}", window.start(), window.end());

        let found = store.find_in_window(*window.start(), *window.end()).await?;

        missing.extend(window.filter(|block_num| !found.contains(block_num)));
    }

    Ok(missing)
}
