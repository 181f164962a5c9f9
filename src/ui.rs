use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UiMode {
    #[default]
    Auto,
    Plain,
    Pretty,
}

/// Stage progress on stderr: a spinner on a TTY, `==> stage` lines otherwise.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    /// Detect the terminal and honour `NO_COLOR` for the auto mode.
    pub fn from_env(mode: UiMode) -> Self {
        let is_tty = std::io::stderr().is_terminal();
        let disable_pretty = std::env::var_os("NO_COLOR").is_some();
        Self::new(mode, is_tty, disable_pretty)
    }

    pub fn is_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.is_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }
}

/// Running stage. Call `finish` on success; dropping an unfinished guard
/// (early `?` return) reports the stage as failed.
pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    detail: Option<String>,
    finished: bool,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
            detail: None,
            finished: false,
        }
    }

    pub fn finish(mut self) {
        self.finished = true;
    }

    /// Finish with a short result shown next to the stage name.
    pub fn finish_with(mut self, detail: impl Into<String>) {
        self.detail = Some(detail.into());
        self.finished = true;
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = format_duration(self.start.elapsed());
        let message = match (self.finished, &self.detail) {
            (true, Some(detail)) => format!("✔ {}: {} ({})", self.name, detail, elapsed),
            (true, None) => format!("✔ {} ({})", self.name, elapsed),
            (false, _) => format!("✘ {} ({})", self.name, elapsed),
        };
        match &self.spinner {
            Some(spinner) if self.finished => spinner.finish_with_message(message),
            Some(spinner) => spinner.abandon_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
