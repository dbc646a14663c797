//! Logging setup and terminal progress reporting

use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber for a CLI run. `RUST_LOG` wins when
/// set; otherwise `--verbose` switches the default directive to debug.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callsweep=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callsweep=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// A single-line terminal progress bar, redrawn in place on stderr.
///
/// Call [`Progress::update`] as work advances and [`Progress::done`] before
/// emitting any further log lines, so the bar line is terminated.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    total: usize,
}

const BAR_WIDTH: usize = 80;

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total: total.max(1),
        }
    }

    /// Redraw the bar at `current` of the total, with a trailing label.
    pub fn update(&self, current: usize, suffix: &str) {
        let percent = 100.0 * (current.min(self.total) as f64 / self.total as f64);
        let filled = (BAR_WIDTH as f64 * percent / 100.0) as usize;
        let bar: String = "*".repeat(filled) + &"-".repeat(BAR_WIDTH - filled);
        eprint!("\r  Progress : |{bar}| {percent:.1}% - {suffix}");
        let _ = std::io::stderr().flush();
    }

    /// Push the bar to 100% and terminate its line.
    pub fn done(&self) {
        self.update(self.total, "Finished");
        eprintln!();
    }
}
