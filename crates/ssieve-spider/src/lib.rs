pub mod api;
pub mod econ;
pub mod fs;
pub mod gis;
pub mod sources;
pub mod stock;
pub mod tui;

mod error;
pub use error::{Error, Result};

/// Shortcut for required API elements.
pub mod http {
    pub use dotenv::var;
    pub use reqwest::Client as HttpClient;
    pub use tokio_postgres::Client as PgClient;
}

/// Default user agent, when `USER_AGENT` is not set in the environment.
const DEFAULT_USER_AGENT: &str = "ssieve/0.1 (+https://github.com/ssieve)";

/// Build the HTTP client shared by every spider; the user agent is read from `USER_AGENT`.
pub fn std_client_build() -> Result<http::HttpClient> {
    let user_agent = http::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    let client = reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(std::time::Duration::from_secs(60))
        .build()?;
    Ok(client)
}

/// Format the time elapsed since `time`, for the `debug!` timings.
pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:.3}s", time.elapsed().as_secs_f64())
}
