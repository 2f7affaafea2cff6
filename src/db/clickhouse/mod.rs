pub mod client;

pub use client::ClickhouseWarehouse;
