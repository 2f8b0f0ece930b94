// Dashboard calculations over the wide price history.
// Pure functions; loading and HTTP live in services and routes.

pub mod series;
pub mod summary;

pub use series::{default_selection, item_options, render_filterable_chart, ChartView};
pub use summary::{summarize, summary_table, MarketSummary, PriceRow};
