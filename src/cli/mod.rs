pub mod batch;
pub mod list;
pub mod setup;
pub mod stock;
pub mod ui;
