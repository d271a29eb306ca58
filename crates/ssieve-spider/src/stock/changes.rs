use super::{html, sql, StockDb};
use crate::http::*;
use crate::sources::Sources;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, error, info, trace, warn};

/// A ticker symbol replaced by another, effective from `dated`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolChange {
    pub old: String,
    pub new: String,
    pub dated: NaiveDate,
}

/// Parse NASDAQ.com's symbol change history: a table of old symbol, new symbol, and the date
/// the change took effect.
pub fn parse_symbol_changes(html: &str) -> crate::Result<Vec<SymbolChange>> {
    let table = html::tables(html)
        .into_iter()
        .find(|table| table.column("Old Symbol").is_some())
        .ok_or_else(|| crate::Error::malformed("symbol change history", "no symbol change table"))?;
    let column = |name: &str| {
        table.column(name).ok_or_else(|| {
            crate::Error::malformed("symbol change history", format!("no {name:?} column"))
        })
    };
    let (old_col, new_col, date_col) = (column("Old Symbol")?, column("New Symbol")?, column("Date")?);

    let mut changes = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let (Some(old), Some(new), Some(dated)) = (row.get(old_col), row.get(new_col), row.get(date_col)) else {
            trace!("skipping short symbol change row {row:?}");
            continue;
        };
        changes.push(SymbolChange {
            old: old.clone(),
            new: new.clone(),
            dated: NaiveDate::parse_from_str(dated, "%m/%d/%Y")?,
        });
    }
    Ok(changes)
}

/// Fetch the recent ticker symbol changes.
pub async fn fetch_symbol_changes(
    http_client: &HttpClient,
    sources: &Sources,
) -> crate::Result<Vec<SymbolChange>> {
    let time = std::time::Instant::now();
    let text = super::get_text(http_client, &sources.symbol_changes_url())
        .await
        .map_err(|err| {
            error!("failed to fetch symbol changes, error({err})");
            err
        })?;
    let changes = parse_symbol_changes(&text)?;
    debug!(
        "{} symbol changes fetched. {}",
        changes.len(),
        crate::time_elapsed(time)
    );
    Ok(changes)
}

/// What a rename pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    /// One message per (change, table) updated, and one per change skipped.
    Renamed(Vec<String>),
    /// None of the changes concern a stored symbol.
    NothingToUpdate,
}

impl RenameOutcome {
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Renamed(msgs) => msgs.clone(),
            Self::NothingToUpdate => vec!["Nothing to update".to_string()],
        }
    }
}

/// Split the changes into those to apply and those that would collide, in order.
///
/// A change applies when its old symbol is stored and its new symbol is not; applied changes
/// update the stored set, so a chain `A -> B -> C` applies fully while two changes onto the
/// same new symbol apply only the first.
pub fn plan_renames<'a>(
    stored: &HashSet<String>,
    changes: &'a [SymbolChange],
) -> (Vec<&'a SymbolChange>, Vec<&'a SymbolChange>) {
    let mut stored = stored.clone();
    let (mut apply, mut collide) = (Vec::new(), Vec::new());
    for change in changes {
        if !stored.contains(&change.old) {
            continue;
        }
        if stored.contains(&change.new) {
            collide.push(change);
            continue;
        }
        stored.remove(&change.old);
        stored.insert(change.new.clone());
        apply.push(change);
    }
    (apply, collide)
}

/// Replace the old symbol with the new in every stock table, for the changes whose old symbol
/// is in the stored ticker universe. Company names are left as they are.
///
/// A change whose new symbol is already stored is skipped and reported, leaving both symbols
/// as they are. All updates run in one transaction.
pub async fn rename_symbols(db: &mut StockDb, changes: &[SymbolChange]) -> crate::Result<RenameOutcome> {
    let stored: HashSet<String> = db.tickers().await?.into_iter().map(|t| t.symbol).collect();
    let (relevant, collide) = plan_renames(&stored, changes);
    if relevant.is_empty() && collide.is_empty() {
        info!("no symbol changes to apply");
        return Ok(RenameOutcome::NothingToUpdate);
    }

    let mut msgs: Vec<String> = collide
        .iter()
        .map(|change| {
            warn!("{} not renamed, {} is already stored", change.old, change.new);
            format!(
                "Skipped {} to {}: {} is already stored",
                change.old, change.new, change.new
            )
        })
        .collect();
    if relevant.is_empty() {
        return Ok(RenameOutcome::Renamed(msgs));
    }

    let mut tables = Vec::with_capacity(sql::TABLES.len());
    for table in sql::TABLES {
        if db.table_exists(table).await? {
            tables.push(table);
        }
    }

    let time = std::time::Instant::now();
    let transaction = db.client_mut().transaction().await?;
    for table in &tables {
        let statement = transaction.prepare(&sql::rename_symbol(table)).await?;
        for change in &relevant {
            let updated = transaction
                .execute(&statement, &[&change.new, &change.old])
                .await
                .map_err(|err| {
                    error!("failed to rename {} to {} in {table}, error({err})", change.old, change.new);
                    err
                })?;
            trace!("{table}: {updated} rows of {} renamed", change.old);
            msgs.push(format!(
                "Updated {} with {} in {table} table",
                change.old, change.new
            ));
        }
    }
    transaction.commit().await?;

    info!("{} symbols renamed", relevant.len());
    debug!("symbols renamed. {}", crate::time_elapsed(time));
    Ok(RenameOutcome::Renamed(msgs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"
        <html><body>
        <table id="SymbolChangeList_table">
          <tr><th>Old Symbol</th><th>New Symbol</th><th>Date Effective</th></tr>
          <tr><td>FB</td><td>META</td><td>06/09/2022</td></tr>
          <tr><td>
                TWTR</td><td>X </td><td>10/28/2022</td></tr>
          <tr><td colspan="3">Showing 2 changes</td></tr>
        </table>
        </body></html>"#;

    #[test]
    fn parses_change_table() {
        let changes = parse_symbol_changes(HISTORY).unwrap();
        assert_eq!(
            changes,
            vec![
                SymbolChange {
                    old: "FB".to_string(),
                    new: "META".to_string(),
                    dated: NaiveDate::from_ymd_opt(2022, 6, 9).unwrap(),
                },
                SymbolChange {
                    old: "TWTR".to_string(),
                    new: "X".to_string(),
                    dated: NaiveDate::from_ymd_opt(2022, 10, 28).unwrap(),
                },
            ]
        );
    }

    #[test]
    fn missing_table_is_an_error() {
        assert!(parse_symbol_changes("<p>maintenance</p>").is_err());
    }

    fn change(old: &str, new: &str) -> SymbolChange {
        SymbolChange {
            old: old.to_string(),
            new: new.to_string(),
            dated: NaiveDate::from_ymd_opt(2022, 6, 9).unwrap(),
        }
    }

    fn symbols(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renames_onto_stored_symbols_collide() {
        let changes = [change("FB", "META"), change("TWTR", "X"), change("ZZZ", "YYY")];
        let (apply, collide) = plan_renames(&symbols(&["FB", "META", "TWTR"]), &changes);
        assert_eq!(apply, [&changes[1]]);
        assert_eq!(collide, [&changes[0]]);
    }

    #[test]
    fn chained_renames_apply_in_order() {
        let changes = [change("A", "B"), change("B", "C"), change("D", "C")];
        let (apply, collide) = plan_renames(&symbols(&["A", "D"]), &changes);
        assert_eq!(apply, [&changes[0], &changes[1]]);
        assert_eq!(collide, [&changes[2]]);
    }

    #[test]
    fn nothing_to_update_message() {
        assert_eq!(RenameOutcome::NothingToUpdate.messages(), ["Nothing to update"]);
    }
}
