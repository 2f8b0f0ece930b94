use crate::models::HourLabel;
use crate::storage::TimeSeriesTable;
use serde::Serialize;

/// Headline numbers shown above the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub latest_column: HourLabel,
    pub previous_column: HourLabel,
    pub token_price: Option<f64>,
    pub token_delta: Option<f64>,
    /// Gold obtained per 1,000 currency units spent on tokens
    pub gold_per_1000_spent: Option<f64>,
    pub tracked_items: usize,
    pub top_riser: Option<TopRiser>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRiser {
    pub item: String,
    pub change_pct: f64,
}

/// One line of the current-price table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub item: String,
    pub price: Option<f64>,
}

/// Percent change from `previous` to `latest`. Missing values and a zero
/// previous price count as no change.
pub fn percentage_change(previous: Option<f64>, latest: Option<f64>) -> f64 {
    match (previous, latest) {
        (Some(prev), Some(latest)) if prev != 0.0 => {
            let change = (latest - prev) / prev * 100.0;
            if change.is_finite() {
                change
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// `None` when the table has no columns yet.
pub fn summarize(
    table: &TimeSeriesTable,
    token_name: &str,
    token_retail_price: f64,
) -> Option<MarketSummary> {
    let latest = table.latest_column()?;
    let previous = table.previous_column()?;

    let token_price = table.get(token_name, &latest);
    let token_delta = token_price
        .zip(table.get(token_name, &previous))
        .map(|(now, before)| now - before);
    let gold_per_1000_spent = token_price
        .filter(|p| *p > 0.0 && token_retail_price > 0.0)
        .map(|p| p / token_retail_price * 1000.0);

    Some(MarketSummary {
        latest_column: latest,
        previous_column: previous,
        token_price,
        token_delta,
        gold_per_1000_spent,
        tracked_items: table.row_count(),
        top_riser: top_riser(table, previous, latest),
    })
}

/// Largest percent increase between two columns. Needs two distinct columns.
/// On equal changes the earlier row wins.
pub fn top_riser(table: &TimeSeriesTable, previous: HourLabel, latest: HourLabel) -> Option<TopRiser> {
    if previous == latest {
        return None;
    }

    let mut best: Option<TopRiser> = None;
    for item in table.item_names() {
        let change = percentage_change(table.get(item, &previous), table.get(item, &latest));
        if best.as_ref().map_or(true, |b| change > b.change_pct) {
            best = Some(TopRiser {
                item: item.clone(),
                change_pct: change,
            });
        }
    }
    best
}

/// Every row with its latest price, most expensive first. Rows without a
/// latest price go last, in table order.
pub fn summary_table(table: &TimeSeriesTable) -> Vec<PriceRow> {
    let latest = table.latest_column();
    let mut rows: Vec<PriceRow> = table
        .item_names()
        .iter()
        .map(|item| PriceRow {
            item: item.clone(),
            price: latest.and_then(|hour| table.get(item, &hour)),
        })
        .collect();

    rows.sort_by(|a, b| match (a.price, b.price) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows
}
