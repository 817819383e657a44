use super::ui;
use crate::core::country::CountryStatistic;
use comfy_table::{Cell, CellAlignment, Table};
use std::collections::BTreeMap;

pub fn countries_table(statistics: &BTreeMap<String, CountryStatistic>) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Country"),
        ui::header_cell("Symbols"),
        ui::header_cell("Weighted Average Price"),
    ]);
    for (country, stat) in statistics {
        table.add_row(vec![
            Cell::new(country),
            Cell::new(stat.symbols).set_alignment(CellAlignment::Right),
            ui::number_cell(stat.weighted_average_price, 2),
        ]);
    }
    table
}

pub fn display(statistics: &BTreeMap<String, CountryStatistic>) {
    println!(
        "{}",
        ui::style_text("Market Cap by Country", ui::StyleType::Title)
    );
    println!("{}", countries_table(statistics));
}
