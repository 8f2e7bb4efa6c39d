use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(100);
const TIP: &str = "press Ctrl-C to stop";

/// The spinner currently on screen, if any. Log lines are routed above it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active() -> MutexGuard<'static, Option<ProgressBar>> {
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spinner shown while a discovery session runs. Cleared on drop.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: &str, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };

        let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[
                "▁▁▁▁▁",
                "▁▂▂▂▁",
                "▁▄▂▄▁",
                "▂▄▆▄▂",
                "▄▆█▆▄",
                "▂▄▆▄▂",
                "▁▄▂▄▁",
                "▁▂▂▂▁",
            ]);
        bar.set_style(style);
        bar.set_message(format!("{message} {}", TIP.italic().dimmed()));
        bar.enable_steady_tick(TICK_INTERVAL);

        // A hidden bar swallows println, so it must not capture log output.
        if !bar.is_hidden() {
            *active() = Some(bar.clone());
        }
        Self { bar }
    }

    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        active().take();
        self.bar.finish_and_clear();
    }
}

pub fn report_progress(bar: &ProgressBar, percent: u8) {
    bar.set_message(format!(
        "Scanning the local network {} {}",
        format!("{percent:>3}%").green().bold(),
        TIP.italic().dimmed()
    ));
}

/// Writes above the active spinner, or straight to stdout when there is none.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(bar) = active().as_ref() {
            let msg = String::from_utf8_lossy(buf);
            bar.println(msg.trim_end());
            return Ok(buf.len());
        }
        std::io::stdout().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}
