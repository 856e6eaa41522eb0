//! Domain types for twscope

pub mod bar;
pub mod fundamentals;
pub mod series;

pub use bar::Bar;
pub use fundamentals::Fundamentals;
pub use series::{change_pct, Period, PriceSeries, SeriesError};
