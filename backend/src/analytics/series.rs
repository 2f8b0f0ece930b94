use crate::models::{HourLabel, STABLE_TARGETS};
use crate::storage::TimeSeriesTable;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

pub const EMPTY_SELECTION_PROMPT: &str = "Select at least one item in the filter to draw the chart.";

/// Long-format row used for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub item: String,
    pub hour: HourLabel,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub hour: HourLabel,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub item: String,
    pub points: Vec<ChartPoint>,
}

/// Multi-series line chart over a shared, sorted hour axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub hours: Vec<HourLabel>,
    pub series: Vec<ChartSeries>,
}

/// What the chart panel should show. A chart always has at least one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartView {
    Prompt { message: String },
    Chart(LineChart),
}

/// Items offered by the filter, alphabetically.
pub fn item_options(table: &TimeSeriesTable) -> Vec<String> {
    let mut items = table.item_names().to_vec();
    items.sort();
    items
}

/// The stable items that exist in the table, in allowlist order.
pub fn default_selection(table: &TimeSeriesTable) -> Vec<String> {
    STABLE_TARGETS
        .iter()
        .map(|(_, name)| *name)
        .filter(|name| table.contains_row(name))
        .map(str::to_string)
        .collect()
}

/// Wide → long, keeping only selected items and present cells. Points come
/// out grouped by item in selection order, each group in time order.
pub fn to_long(table: &TimeSeriesTable, selected: &[String]) -> Vec<SeriesPoint> {
    let mut seen = HashSet::new();
    selected
        .iter()
        .filter(|item| seen.insert(item.to_string()))
        .flat_map(|item| {
            table.row(item).map(move |(hour, price)| SeriesPoint {
                item: item.clone(),
                hour,
                price,
            })
        })
        .collect()
}

pub fn render_filterable_chart(table: &TimeSeriesTable, selected: &[String]) -> ChartView {
    let points = to_long(table, selected);
    if points.is_empty() {
        return ChartView::Prompt {
            message: EMPTY_SELECTION_PROMPT.to_string(),
        };
    }

    let hours: BTreeSet<HourLabel> = points.iter().map(|p| p.hour).collect();

    let mut series: Vec<ChartSeries> = Vec::new();
    for point in points {
        let chart_point = ChartPoint {
            hour: point.hour,
            price: point.price,
        };
        match series.last_mut() {
            Some(current) if current.item == point.item => current.points.push(chart_point),
            _ => series.push(ChartSeries {
                item: point.item,
                points: vec![chart_point],
            }),
        }
    }

    ChartView::Chart(LineChart {
        hours: hours.into_iter().collect(),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TimeSeriesTable {
        TimeSeriesTable::parse(
            "item_name,2025-01-01 10:00,2025-01-01 11:00,2025-01-01 12:00\n\
             WoW 토큰,150000,151000,\n\
             창연,3,,3.5\n\
             Ore,1,2,3\n",
        )
        .unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_renders_prompt() {
        let view = render_filterable_chart(&table(), &[]);
        assert_eq!(
            view,
            ChartView::Prompt {
                message: EMPTY_SELECTION_PROMPT.to_string()
            }
        );
    }

    #[test]
    fn test_selection_of_unknown_items_renders_prompt() {
        let view = render_filterable_chart(&table(), &names(&["Nothing"]));
        assert!(matches!(view, ChartView::Prompt { .. }));
    }

    #[test]
    fn test_long_format_drops_absent_cells() {
        let long = to_long(&table(), &names(&["창연", "창연"]));
        let hours: Vec<String> = long.iter().map(|p| p.hour.to_string()).collect();
        assert_eq!(hours, vec!["2025-01-01 10:00", "2025-01-01 12:00"]);
    }

    #[test]
    fn test_chart_has_one_series_per_selected_item() {
        let view = render_filterable_chart(&table(), &names(&["Ore", "WoW 토큰"]));
        let ChartView::Chart(chart) = view else {
            panic!("expected a chart");
        };

        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].item, "Ore");
        assert_eq!(chart.series[0].points.len(), 3);
        assert_eq!(chart.series[1].points.len(), 2);
        assert_eq!(chart.hours.len(), 3);
        assert!(chart.hours.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_default_selection_is_stable_items_present() {
        assert_eq!(default_selection(&table()), names(&["WoW 토큰", "창연"]));
    }

    #[test]
    fn test_item_options_sorted() {
        let options = item_options(&table());
        let mut sorted = options.clone();
        sorted.sort();
        assert_eq!(options, sorted);
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_chart_json_shape() {
        let prompt = serde_json::to_value(render_filterable_chart(&table(), &[])).unwrap();
        assert_eq!(prompt["kind"], "prompt");

        let chart = serde_json::to_value(render_filterable_chart(&table(), &names(&["Ore"]))).unwrap();
        assert_eq!(chart["kind"], "chart");
        assert_eq!(chart["hours"][0], "2025-01-01 10:00");
        assert_eq!(chart["series"][0]["points"][2]["price"], 3.0);
    }
}
