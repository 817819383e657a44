use super::ui;
use comfy_table::{Cell, Table};
use std::collections::BTreeMap;

/// One row per ticker, most recent close first.
pub fn prices_table(prices: &BTreeMap<String, Vec<f64>>) -> Table {
    let columns = prices.values().map(Vec::len).max().unwrap_or(0);

    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Symbol")];
    header.extend((1..=columns).map(|i| ui::header_cell(&format!("T-{}", i - 1))));
    table.set_header(header);

    for (symbol, closes) in prices {
        let mut row = vec![Cell::new(symbol)];
        row.extend(closes.iter().map(|c| ui::number_cell(*c, 2)));
        table.add_row(row);
    }
    table
}

pub fn display(prices: &BTreeMap<String, Vec<f64>>) {
    println!("{}", ui::style_text("Recent Closes", ui::StyleType::Title));
    println!("{}", prices_table(prices));
    println!(
        "{}",
        ui::style_text("T-0 is the latest session", ui::StyleType::Subtle)
    );
}
