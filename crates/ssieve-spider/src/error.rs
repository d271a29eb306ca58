use thiserror::Error;

/// Every failure a spider routine can hand back to its caller.
///
/// A record that is simply absent is never an error: the existence predicates return
/// `Ok(false)`, and the per-symbol routines report absences through their own outcome enums.
#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("geojson error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("progress bar template error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),

    /// The payload came back, but not in the shape expected.
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    /// An insertion was refused because a matching record is already stored.
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A table the routine depends on has not been created yet.
    #[error("table {0} does not exist; initialise the database first")]
    MissingTable(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

impl Error {
    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
