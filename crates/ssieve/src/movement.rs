use crate::cli::IndicatorSource;
use colored::Colorize;
use ssieve_spider::econ::{movement, ApiKeys, Source};
use ssieve_spider::sources::Sources;
use tracing::error;

/// Print the latest yearly movement of `product`.
pub(crate) async fn run(product: &str, source: IndicatorSource) -> anyhow::Result<()> {
    let source = match source {
        IndicatorSource::Fred => Source::Fred,
        IndicatorSource::Quandl => Source::Quandl,
    };
    let http_client = ssieve_spider::std_client_build()?;
    let today = chrono::Local::now().date_naive();

    let latest = movement::recent_movement(
        &http_client,
        &Sources::default(),
        &ApiKeys::from_env(),
        product,
        source,
        today,
    )
    .await
    .map_err(|err| {
        error!("failed to compute the movement of {product}, error({err})");
        err
    })?;

    println!("{} {latest}", format!("{product}:").bold());
    Ok(())
}
