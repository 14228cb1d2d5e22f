//! Price source implementations that can sit behind a `TransparentCache`

pub mod catalog;
pub mod simulated;

pub use catalog::{CatalogEntry, CatalogPriceService};
pub use simulated::SimulatedPriceService;
