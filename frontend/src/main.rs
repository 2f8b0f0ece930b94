use dioxus::prelude::*;
use serde::Deserialize;

const API_BASE: &str = "http://localhost:3000/api";

const SERIES_COLORS: [&str; 8] = [
    "#ffcc00", "#4fc3f7", "#ef5350", "#66bb6a", "#ab47bc", "#ff7043", "#26a69a", "#bdbdbd",
];

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Countdown {
    label: String,
    release_date: chrono::NaiveDate,
    days_left: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Sidebar {
    countdown: Countdown,
    note: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct TopRiser {
    item: String,
    change_pct: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct MarketSummary {
    latest_column: String,
    previous_column: String,
    token_price: Option<f64>,
    token_delta: Option<f64>,
    gold_per_1000_spent: Option<f64>,
    tracked_items: usize,
    top_riser: Option<TopRiser>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct PriceRow {
    item: String,
    price: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct DashboardSnapshot {
    summary: Option<MarketSummary>,
    items: Vec<String>,
    default_selection: Vec<String>,
    price_table: Vec<PriceRow>,
    sidebar: Sidebar,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DashboardView {
    NoData { message: String, sidebar: Sidebar },
    Ready(DashboardSnapshot),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct ChartPoint {
    hour: String,
    price: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct ChartSeries {
    item: String,
    points: Vec<ChartPoint>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ChartView {
    Prompt { message: String },
    Chart { hours: Vec<String>, series: Vec<ChartSeries> },
}

/// 1234567.8 -> "1,234,568"
fn format_gold(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

fn format_delta(value: f64) -> String {
    if value >= 0.0 {
        format!("+{} G", format_gold(value))
    } else {
        format!("{} G", format_gold(value))
    }
}

/// "2025-01-01 10:00" -> "01-01 10:00"
fn short_hour(hour: &str) -> String {
    match hour.split_once('-') {
        Some((_, rest)) => rest.to_string(),
        None => hour.to_string(),
    }
}

#[component]
fn SidebarPanel(sidebar: Sidebar) -> Element {
    let days = sidebar.countdown.days_left;
    let release = sidebar.countdown.release_date.format("%Y.%m.%d").to_string();
    let badge = if days >= 0 {
        format!("D-{}", days)
    } else {
        format!("D+{}", -days)
    };

    rsx! {
        aside { style: "width: 240px; padding: 20px; background: #161b22; color: #e6edf3; border-right: 1px solid #30363d;",
            h3 { "⚔️ Expansion countdown" }
            p { style: "color: #8b949e; margin: 0;", "{sidebar.countdown.label} ({release})" }
            p { style: "font-size: 32px; font-weight: bold; color: #ffcc00; margin: 8px 0 20px 0;", "{badge}" }
            hr { style: "border-color: #30363d;" }
            p { style: "font-weight: bold;", "💡 About the data" }
            p { style: "color: #8b949e; font-size: 13px;", "{sidebar.note}" }
        }
    }
}

#[component]
fn MetricCard(
    #[props(into)] label: String,
    #[props(into)] value: String,
    #[props(!optional)] delta: Option<String>,
) -> Element {
    let delta_style = match &delta {
        Some(d) if d.starts_with('-') => "margin: 4px 0 0 0; color: #ef5350;",
        _ => "margin: 4px 0 0 0; color: #66bb6a;",
    };

    rsx! {
        div { style: "flex: 1; background: #161b22; padding: 15px; border-radius: 10px; border: 1px solid #30363d;",
            p { style: "margin: 0; color: #8b949e; font-size: 14px;", "{label}" }
            p { style: "margin: 6px 0 0 0; color: #ffcc00; font-size: 26px; font-weight: bold;", "{value}" }
            if let Some(delta) = delta {
                p { style: "{delta_style}", "{delta}" }
            }
        }
    }
}

#[component]
fn Metrics(#[props(!optional)] summary: Option<MarketSummary>, tracked: usize) -> Element {
    let Some(summary) = summary else {
        return rsx! {
            div { style: "display: flex; gap: 16px;",
                MetricCard { label: "📦 Tracked items", value: format!("{}", tracked), delta: None }
            }
        };
    };

    let token_value = summary
        .token_price
        .map(|p| format!("{} G", format_gold(p)))
        .unwrap_or_else(|| "-".to_string());
    let token_delta = summary.token_delta.map(format_delta);
    let per_1000 = summary
        .gold_per_1000_spent
        .map(|g| format!("{} G", format_gold(g)))
        .unwrap_or_else(|| "-".to_string());
    let (riser_name, riser_change) = match &summary.top_riser {
        Some(riser) => (riser.item.clone(), Some(format!("{:+.1}%", riser.change_pct))),
        None => ("-".to_string(), None),
    };

    rsx! {
        div { style: "display: flex; gap: 16px;",
            MetricCard { label: "🪙 Token price", value: token_value, delta: token_delta }
            MetricCard { label: "💸 Gold per 1,000 spent", value: per_1000, delta: None }
            MetricCard { label: "📦 Tracked items", value: format!("{}", summary.tracked_items), delta: None }
            MetricCard { label: "🔥 Top riser", value: riser_name, delta: riser_change }
        }
    }
}

#[component]
fn PriceTable(rows: Vec<PriceRow>) -> Element {
    rsx! {
        table { style: "width: 100%; border-collapse: collapse; color: #e6edf3;",
            thead {
                tr { style: "border-bottom: 2px solid #30363d;",
                    th { style: "padding: 8px; text-align: left;", "Item" }
                    th { style: "padding: 8px; text-align: right;", "Current price" }
                }
            }
            tbody {
                for row in rows.iter() {
                    tr { style: "border-bottom: 1px solid #21262d;",
                        td { style: "padding: 8px;", "{row.item}" }
                        td { style: "padding: 8px; text-align: right;",
                            {row.price.map(format_gold).unwrap_or_else(|| "-".to_string())}
                        }
                    }
                }
            }
        }
    }
}

struct DrawnSeries {
    item: String,
    color: &'static str,
    path: String,
    markers: Vec<(f64, f64)>,
}

#[component]
fn MultiSeriesChart(hours: Vec<String>, series: Vec<ChartSeries>) -> Element {
    let mut hovered = use_signal(|| None::<usize>);

    let width = 900.0;
    let height = 380.0;
    let padding_left = 90.0;
    let padding_right = 30.0;
    let padding_top = 30.0;
    let padding_bottom = 60.0;

    let chart_left = padding_left;
    let chart_right = width - padding_right;
    let chart_top = padding_top;
    let chart_bottom = height - padding_bottom;

    let all_prices = series.iter().flat_map(|s| s.points.iter().map(|p| p.price));
    let min_price = all_prices.clone().fold(f64::INFINITY, f64::min);
    let max_price = all_prices.fold(f64::NEG_INFINITY, f64::max);
    let price_range = if (max_price - min_price).abs() < 1e-9 { 1.0 } else { max_price - min_price };

    let slots = hours.len().max(2) - 1;
    let x_at = |index: usize| chart_left + (index as f64 / slots as f64) * (chart_right - chart_left);
    let y_at = |price: f64| chart_bottom - ((price - min_price) / price_range) * (chart_bottom - chart_top);

    let drawn: Vec<DrawnSeries> = series
        .iter()
        .enumerate()
        .map(|(n, s)| {
            let mut path = String::new();
            let mut markers = Vec::new();
            for point in &s.points {
                let Some(index) = hours.iter().position(|h| *h == point.hour) else {
                    continue;
                };
                let (x, y) = (x_at(index), y_at(point.price));
                path.push_str(&format!("{} {} {} ", if markers.is_empty() { "M" } else { "L" }, x, y));
                markers.push((x, y));
            }
            DrawnSeries {
                item: s.item.clone(),
                color: SERIES_COLORS[n % SERIES_COLORS.len()],
                path,
                markers,
            }
        })
        .collect();

    let mut h_grid_lines = Vec::new();
    for i in 0..5 {
        let y = chart_top + (i as f64 / 4.0) * (chart_bottom - chart_top);
        let price = max_price - (i as f64 / 4.0) * price_range;
        h_grid_lines.push((y, format_gold(price)));
    }

    // At most ~8 time labels so they do not overlap.
    let label_step = (hours.len() / 8).max(1);
    let time_labels: Vec<(f64, String)> = hours
        .iter()
        .enumerate()
        .filter(|(i, _)| i % label_step == 0)
        .map(|(i, h)| (x_at(i), short_hour(h)))
        .collect();

    let band_width = (chart_right - chart_left) / hours.len().max(1) as f64;
    let bands: Vec<(usize, f64)> = (0..hours.len())
        .map(|i| (i, (x_at(i) - band_width / 2.0).max(chart_left)))
        .collect();

    // Unified hover: every series' value at the hovered hour.
    let tooltip = hovered().and_then(|index| {
        let hour = hours.get(index)?.clone();
        let lines: Vec<(String, &'static str, String)> = series
            .iter()
            .zip(drawn.iter())
            .filter_map(|(s, d)| {
                s.points
                    .iter()
                    .find(|p| p.hour == hour)
                    .map(|p| (s.item.clone(), d.color, format!("{} G", format_gold(p.price))))
            })
            .collect();
        let x = x_at(index);
        let box_x = if x + 230.0 > chart_right { x - 240.0 } else { x + 10.0 };
        Some((x, box_x, hour, lines))
    });

    rsx! {
        svg {
            width: "100%",
            view_box: "0 0 {width} {height}",
            style: "display: block; background: transparent;",
            onmouseleave: move |_| hovered.set(None),

            for (y, price) in h_grid_lines.iter() {
                line { x1: "{chart_left}", y1: "{y}", x2: "{chart_right}", y2: "{y}", stroke: "#30363d", stroke_width: "1" }
                text { x: "{chart_left - 10.0}", y: "{y + 4.0}", font_size: "12", fill: "#8b949e", text_anchor: "end", "{price}" }
            }

            for (x, label) in time_labels.iter() {
                text { x: "{x}", y: "{chart_bottom + 20.0}", font_size: "11", fill: "#8b949e", text_anchor: "middle", "{label}" }
            }

            for s in drawn.iter() {
                path { d: "{s.path}", fill: "none", stroke: "{s.color}", stroke_width: "2", stroke_linejoin: "round" }
                for (x, y) in s.markers.iter() {
                    circle { cx: "{x}", cy: "{y}", r: "3", fill: "{s.color}" }
                }
            }

            for (index, left) in bands.iter().copied() {
                rect {
                    x: "{left}",
                    y: "{chart_top}",
                    width: "{band_width}",
                    height: "{chart_bottom - chart_top}",
                    fill: "transparent",
                    onmouseenter: move |_| hovered.set(Some(index)),
                }
            }

            if let Some((x, box_x, hour, lines)) = tooltip {
                line { x1: "{x}", y1: "{chart_top}", x2: "{x}", y2: "{chart_bottom}", stroke: "#8b949e", stroke_dasharray: "4 4" }
                rect {
                    x: "{box_x}",
                    y: "{chart_top}",
                    width: "230",
                    height: "{28.0 + lines.len() as f64 * 18.0}",
                    fill: "#0d1117",
                    stroke: "#30363d",
                    rx: "6",
                }
                text { x: "{box_x + 10.0}", y: "{chart_top + 18.0}", font_size: "12", fill: "#e6edf3", font_weight: "bold", "{hour}" }
                for (i, (item, color, value)) in lines.iter().enumerate() {
                    text {
                        x: "{box_x + 10.0}",
                        y: "{chart_top + 38.0 + i as f64 * 18.0}",
                        font_size: "12",
                        fill: "{color}",
                        "{item}: {value}"
                    }
                }
            }

            text {
                x: "{chart_left - 70.0}",
                y: "{(chart_top + chart_bottom) / 2.0}",
                font_size: "13",
                fill: "#e6edf3",
                text_anchor: "middle",
                transform: "rotate(-90 {chart_left - 70.0} {(chart_top + chart_bottom) / 2.0})",
                "Price (gold)"
            }
        }

        div { style: "display: flex; flex-wrap: wrap; gap: 14px; margin-top: 8px;",
            for s in drawn.iter() {
                span { style: "color: {s.color}; font-size: 13px;", "● {s.item}" }
            }
        }
    }
}

fn chart_query(selected: &[String]) -> String {
    selected.join(",")
}

fn App() -> Element {
    let mut dashboard = use_signal(|| None::<DashboardView>);
    let mut load_error = use_signal(String::new);
    let mut selected = use_signal(|| None::<Vec<String>>);
    let mut chart = use_signal(|| None::<ChartView>);

    // Re-read the dashboard on mount and every minute; the backend reads the
    // history file on each request.
    use_effect(move || {
        spawn(async move {
            loop {
                match reqwest::get(format!("{}/dashboard", API_BASE)).await {
                    Ok(resp) => match resp.json::<DashboardView>().await {
                        Ok(view) => {
                            if let DashboardView::Ready(snapshot) = &view {
                                if selected.peek().is_none() {
                                    selected.set(Some(snapshot.default_selection.clone()));
                                }
                            }
                            dashboard.set(Some(view));
                            load_error.set(String::new());
                        }
                        Err(e) => load_error.set(format!("Unexpected response: {}", e)),
                    },
                    Err(e) => load_error.set(format!("Error: {}", e)),
                }
                gloo_timers::future::TimeoutFuture::new(60_000).await;
            }
        });
    });

    // Redraw the chart whenever the selection changes.
    use_effect(move || {
        let Some(items) = selected() else {
            return;
        };
        spawn(async move {
            let client = reqwest::Client::new();
            let result = client
                .get(format!("{}/chart", API_BASE))
                .query(&[("items", chart_query(&items))])
                .send()
                .await;
            match result {
                Ok(resp) => match resp.json::<ChartView>().await {
                    Ok(view) => chart.set(Some(view)),
                    Err(e) => web_sys::console::error_1(&format!("Bad chart response: {}", e).into()),
                },
                Err(e) => web_sys::console::error_1(&format!("Chart request failed: {}", e).into()),
            }
        });
    });

    rsx! {
        div { style: "display: flex; min-height: 100vh; background: #0d1117; font-family: sans-serif;",
            match dashboard() {
                None => rsx! {
                    div { style: "padding: 40px; color: #8b949e;",
                        if load_error().is_empty() {
                            "Loading market data..."
                        } else {
                            "{load_error}"
                        }
                    }
                },
                Some(DashboardView::NoData { message, sidebar }) => rsx! {
                    SidebarPanel { sidebar: sidebar }
                    main { style: "flex: 1; padding: 30px; color: #e6edf3;",
                        h1 { "🏹 World of Warcraft: Midnight live auction house" }
                        div { style: "background: #3d1d1d; border: 1px solid #ef5350; color: #ffb4ab; padding: 16px; border-radius: 8px;",
                            "{message}"
                        }
                    }
                },
                Some(DashboardView::Ready(snapshot)) => rsx! {
                    SidebarPanel { sidebar: snapshot.sidebar.clone() }
                    main { style: "flex: 1; padding: 30px; color: #e6edf3;",
                        h1 { "🏹 World of Warcraft: Midnight live auction house" }
                        Metrics { summary: snapshot.summary.clone(), tracked: snapshot.items.len() }
                        hr { style: "border-color: #30363d; margin: 24px 0;" }

                        div { style: "display: flex; gap: 24px;",
                            div { style: "flex: 1; min-width: 260px;",
                                h3 { "🛠️ Filter" }
                                p { style: "color: #8b949e; font-size: 13px;", "Choose the items to plot" }
                                div { style: "max-height: 240px; overflow-y: auto; border: 1px solid #30363d; border-radius: 6px; padding: 8px;",
                                    for item in snapshot.items.iter().cloned() {
                                        label { style: "display: block; padding: 3px 0;",
                                            input {
                                                r#type: "checkbox",
                                                checked: selected().map(|s| s.contains(&item)).unwrap_or(false),
                                                onchange: {
                                                    let item = item.clone();
                                                    move |_| {
                                                        let mut current = selected.peek().clone().unwrap_or_default();
                                                        if let Some(pos) = current.iter().position(|i| *i == item) {
                                                            current.remove(pos);
                                                        } else {
                                                            current.push(item.clone());
                                                        }
                                                        selected.set(Some(current));
                                                    }
                                                },
                                            }
                                            " {item}"
                                        }
                                    }
                                }
                                h3 { style: "margin-top: 24px;", "📊 Current price by item (gold)" }
                                PriceTable { rows: snapshot.price_table.clone() }
                            }
                            div { style: "flex: 3;",
                                match chart() {
                                    Some(ChartView::Chart { hours, series }) => rsx! {
                                        MultiSeriesChart { hours: hours, series: series }
                                    },
                                    Some(ChartView::Prompt { message }) => rsx! {
                                        div { style: "background: #3d3418; border: 1px solid #ffcc00; color: #ffe082; padding: 16px; border-radius: 8px;",
                                            "{message}"
                                        }
                                    },
                                    None => rsx! {
                                        p { style: "color: #8b949e;", "Loading chart..." }
                                    },
                                }
                            }
                        }
                    }
                },
            }
        }
    }
}

fn main() {
    launch(App);
}
