use super::ui;
use crate::core::chart::{ChartSelection, select_chart};
use chrono::NaiveDate;
use comfy_table::Cell;
use std::collections::BTreeMap;

const BAR_WIDTH: usize = 40;

/// Renders the chart, warning or error for the requested ticker.
pub fn render(input: &str, series: &BTreeMap<String, Vec<(NaiveDate, f64)>>) -> String {
    match select_chart(input, series) {
        ChartSelection::MissingTicker => {
            ui::style_text("Please insert a ticker", ui::StyleType::Warning)
        }
        ChartSelection::InvalidTicker(ticker) => ui::style_text(
            &format!("Invalid ticker name: {ticker}"),
            ui::StyleType::Error,
        ),
        ChartSelection::Chart { symbol, points } => render_points(symbol, points),
    }
}

fn render_points(symbol: &str, points: &[(NaiveDate, f64)]) -> String {
    let min = points.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|(_, c)| *c).fold(f64::NEG_INFINITY, f64::max);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Close"),
        ui::header_cell(""),
    ]);
    for (date, close) in points {
        table.add_row(vec![
            Cell::new(date.format("%Y-%m-%d")),
            ui::number_cell(*close, 2),
            Cell::new(ui::bar(*close, min, max, BAR_WIDTH)),
        ]);
    }

    format!(
        "{}\n{table}",
        ui::style_text(&format!("{symbol} close"), ui::StyleType::Title)
    )
}

pub fn display(input: &str, series: &BTreeMap<String, Vec<(NaiveDate, f64)>>) {
    println!("{}", render(input, series));
}
