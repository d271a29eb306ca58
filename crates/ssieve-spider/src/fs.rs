use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

/// Reads a text file (GeoJSON, CSV) from `path`.
pub async fn read_text(path: impl AsRef<Path>) -> crate::Result<String> {
    let path = path.as_ref();
    trace!("reading file path: {}", path.display());
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text)
}

/// Which driver produced a results log; decides the sub-directory and file prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Initialize,
    Daily,
}

/// Path of the results log for a run on `day`:
/// `<directory>/output/initialize/init_results_October_19_2026.txt`, or
/// `<directory>/output/daily/daily_results_October_19_2026.txt`.
pub fn results_path(directory: impl AsRef<Path>, kind: RunKind, day: NaiveDate) -> PathBuf {
    let (folder, prefix) = match kind {
        RunKind::Initialize => ("initialize", "init"),
        RunKind::Daily => ("daily", "daily"),
    };
    directory
        .as_ref()
        .join("output")
        .join(folder)
        .join(format!("{prefix}_results_{}.txt", day.format("%B_%d_%Y")))
}

/// Plain-text results of one driver run: sections of messages, one message per line, a blank
/// line after each section.
#[derive(Debug, Default)]
pub struct ResultsLog {
    sections: Vec<Vec<String>>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single-line section.
    pub fn line(&mut self, msg: impl Into<String>) {
        self.sections.push(vec![msg.into()]);
    }

    /// Record a multi-line section.
    pub fn section<I, S>(&mut self, msgs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections.push(msgs.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the log as written to disk.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            for msg in section {
                out.push_str(msg);
                out.push('\n');
            }
            if section.len() > 1 {
                out.push('\n');
            }
        }
        out
    }

    /// Write the log to `path`, creating its parent directories as necessary.
    pub async fn write(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(self.render().as_bytes()).await?;
        file.flush().await?;
        debug!("results log written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_path_is_dated() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let path = results_path("/tmp/ssieve", RunKind::Daily, day);
        assert_eq!(
            path,
            PathBuf::from("/tmp/ssieve/output/daily/daily_results_October_19_2026.txt")
        );

        let path = results_path("/tmp/ssieve", RunKind::Initialize, day);
        assert!(path.ends_with("output/initialize/init_results_October_19_2026.txt"));
    }

    #[test]
    fn sections_are_separated() {
        let mut log = ResultsLog::new();
        log.line("Start time: 10:00:00");
        log.section(["AAPL: 3 rows", "MSFT: up to date"]);
        log.line("End time: 10:05:00");
        assert_eq!(
            log.render(),
            "Start time: 10:00:00\nAAPL: 3 rows\nMSFT: up to date\n\nEnd time: 10:05:00\n"
        );
    }

    #[tokio::test]
    async fn write_creates_directories() {
        let dir = std::env::temp_dir().join(format!("ssieve-log-{}", std::process::id()));
        let path = results_path(&dir, RunKind::Initialize, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());

        let mut log = ResultsLog::new();
        log.line("new db started");
        log.write(&path).await.unwrap();

        assert_eq!(read_text(&path).await.unwrap(), "new db started\n");
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
