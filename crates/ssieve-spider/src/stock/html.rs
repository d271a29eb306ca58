use scraper::{ElementRef, Html, Selector};

lazy_static::lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("valid selector");
    static ref TR: Selector = Selector::parse("tr").expect("valid selector");
    static ref TH: Selector = Selector::parse("th").expect("valid selector");
    static ref TD: Selector = Selector::parse("td").expect("valid selector");
}

/// The text of an HTML table: its header cells, and the data cells of every row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the first header cell containing `name`, ignoring case.
    pub(crate) fn column(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.header
            .iter()
            .position(|cell| cell.to_lowercase().contains(&name))
    }
}

/// Every `<table>` of `html`, in document order.
pub(crate) fn tables(html: &str) -> Vec<Table> {
    let document = Html::parse_document(html);
    document.select(&TABLE).map(read_table).collect()
}

fn read_table(table: ElementRef) -> Table {
    let mut out = Table::default();
    for row in table.select(&TR) {
        let headers: Vec<String> = row.select(&TH).map(cell_text).collect();
        let cells: Vec<String> = row.select(&TD).map(cell_text).collect();

        if out.header.is_empty() && !headers.is_empty() {
            out.header = headers;
        } else if !cells.is_empty() {
            out.rows.push(cells);
        }
    }
    out
}

// whitespace runs, including &nbsp;, collapse to one space
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_rows() {
        let html = r#"
            <html><body>
            <table>
              <thead><tr><th>Old Symbol</th><th>New&nbsp;Symbol</th></tr></thead>
              <tbody>
                <tr><td> ABC </td><td>
                    ABCD</td></tr>
                <tr></tr>
                <tr><td>XY</td><td>XYZ</td></tr>
              </tbody>
            </table>
            </body></html>"#;
        let tables = tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].header, ["Old Symbol", "New Symbol"]);
        assert_eq!(tables[0].rows, [["ABC", "ABCD"], ["XY", "XYZ"]]);
        assert_eq!(tables[0].column("new symbol"), Some(1));
        assert_eq!(tables[0].column("date"), None);
    }

    #[test]
    fn no_tables() {
        assert!(tables("<p>Nothing here</p>").is_empty());
    }
}
