use super::ui;
use crate::core::table::{CompanyTable, HEADERS};
use anyhow::Result;
use comfy_table::{Cell, Table};

/// Builds the companies table in symbol order.
pub fn companies_table(companies: &CompanyTable) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(HEADERS.iter().map(|h| ui::header_cell(h)).collect::<Vec<_>>());

    for record in companies.rows() {
        let change_1d = record.return_1d.parse::<f64>().unwrap_or(0.0);
        table.add_row(vec![
            Cell::new(&record.symbol),
            Cell::new(&record.name),
            Cell::new(&record.last_date),
            ui::number_cell(record.last_close, 2),
            ui::return_cell(record.return_1d.clone(), change_1d),
            ui::return_cell(format!("{:.4}", record.return_1w), record.return_1w),
            ui::return_cell(format!("{:.4}", record.return_1m), record.return_1m),
            ui::number_cell(record.average_1m, 2),
        ]);
    }
    table
}

pub fn display(companies: &CompanyTable, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(companies)?);
        return Ok(());
    }

    println!("{}", ui::style_text("Market Dashboard", ui::StyleType::Title));
    println!("\n{}", ui::style_text("Companies", ui::StyleType::Subtitle));
    println!("{}", companies_table(companies));
    Ok(())
}
