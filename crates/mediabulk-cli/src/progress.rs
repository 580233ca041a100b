//! Terminal progress rendering, fed by runner stats snapshots.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mediabulk_core::StatsSnapshot;

/// Two stacked bars: transfer progress with ETA, and an attempted/ok/failed
/// status line. Per-item errors never show up here; they live in the audit
/// log only.
#[derive(Clone)]
pub struct ProgressBars {
    _multi: MultiProgress,
    transfer: ProgressBar,
    status: ProgressBar,
}

impl ProgressBars {
    pub fn new(total: u64) -> Self {
        let multi = MultiProgress::new();

        let transfer = multi.add(ProgressBar::new(total));
        transfer.set_style(
            ProgressStyle::with_template("({msg} in flight) [{bar:40.cyan/blue}] ETA {eta}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        transfer.set_message("0");

        let status = multi.add(ProgressBar::new(total));
        status.set_style(
            ProgressStyle::with_template("Attempted: {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        Self {
            _multi: multi,
            transfer,
            status,
        }
    }

    pub fn update(&self, snap: StatsSnapshot) {
        self.transfer.set_position(snap.attempted);
        self.transfer.set_message(snap.concurrent.to_string());
        self.status.set_position(snap.attempted);
        self.status
            .set_message(format!("(ok: {}, failed: {})", snap.succeeded, snap.failed));
    }

    pub fn finish(&self) {
        self.transfer.finish();
        self.status.finish();
    }
}
