use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bars for a per-symbol loop: total symbols visited, successes, and failures.
///
/// With `tui` off every bar is hidden, so the loops can tick them unconditionally.
#[derive(Debug)]
pub struct Progress {
    _multi: Option<MultiProgress>,
    pub total: ProgressBar,
    pub success: ProgressBar,
    pub fails: ProgressBar,
}

impl Progress {
    pub fn new(len: usize, label: &str, tui: bool) -> crate::Result<Self> {
        if !tui {
            return Ok(Self::hidden());
        }

        // overall multi progress bar
        let multi = MultiProgress::new();

        // total number of symbols to visit
        let total = multi.add(
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.magenta} {prefix}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, ETA: {eta}]",
                    )?
                    .progress_chars("## "),
            ),
        );
        total.set_prefix(label.to_string());
        total.set_message("total");
        total.enable_steady_tick(Duration::from_millis(100));

        // successful symbols
        let success = multi.insert_after(
            &total,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.green} |{bar:57.green}| {pos:<2.green}")?
                    .progress_chars("## "),
            ),
        );
        success.set_message("successes");

        // failed symbols
        let fails = multi.insert_after(
            &success,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.red} |{bar:57.red}| {pos:<2.red}")?
                    .progress_chars("## "),
            ),
        );
        fails.set_message("failures");

        Ok(Self {
            _multi: Some(multi),
            total,
            success,
            fails,
        })
    }

    pub fn hidden() -> Self {
        Self {
            _multi: None,
            total: ProgressBar::hidden(),
            success: ProgressBar::hidden(),
            fails: ProgressBar::hidden(),
        }
    }

    /// Tick one symbol off, as a success or a failure.
    pub fn record(&self, ok: bool) {
        self.total.inc(1);
        if ok {
            self.success.inc(1);
        } else {
            self.fails.inc(1);
        }
    }

    pub fn finish(&self) {
        self.total.finish_and_clear();
        self.success.finish_and_clear();
        self.fails.finish_and_clear();
    }
}
