pub mod chart;
pub mod companies;
pub mod countries;
pub mod prices;
pub mod setup;
pub mod ui;
