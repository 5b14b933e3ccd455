//! Client-only views computed from fetched data.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Brand, Category, Order, OrderStatus, Product, RevenuePoint};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    #[serde(flatten)]
    pub product: Product,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
}

/// Resolves brand and category names by scanning the lookups for every
/// product; no index is kept between renders.
pub fn join_products(products: &[Product], brands: &[Brand], categories: &[Category]) -> Vec<ProductRow> {
    products
        .iter()
        .map(|product| ProductRow {
            brand_name: product
                .brand_id
                .as_deref()
                .and_then(|id| brands.iter().find(|b| b.id == id))
                .map(|b| b.name.clone()),
            category_name: product
                .category_id
                .as_deref()
                .and_then(|id| categories.iter().find(|c| c.id == id))
                .map(|c| c.name.clone()),
            product: product.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
    Year,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        })
    }
}

/// Years on each side of the selected one in the yearly chart.
const YEAR_SPAN: i32 = 5;

/// Years a chart window may be centred on; labels stay four digits wide.
pub const CHART_YEARS: RangeInclusive<i32> = 1..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    pub granularity: Granularity,
    pub year: i32,
    /// 1-based; only used for daily charts.
    pub month: u32,
}

impl ChartWindow {
    /// Every label the chart axis must show, in order.
    pub fn labels(&self) -> Vec<String> {
        match self.granularity {
            Granularity::Day => {
                let Some(first) = NaiveDate::from_ymd_opt(self.year, self.month, 1) else {
                    return Vec::new();
                };
                first
                    .iter_days()
                    .take_while(|day| day.month() == first.month())
                    .map(|day| day.format("%Y-%m-%d").to_string())
                    .collect()
            }
            Granularity::Month => (1..=12)
                .map(|month| format!("{:04}-{:02}", self.year, month))
                .collect(),
            Granularity::Year => {
                (self.year.saturating_sub(YEAR_SPAN)..=self.year.saturating_add(YEAR_SPAN))
                    .map(|year| format!("{year:04}"))
                    .collect()
            }
        }
    }
}

/// Maps a sparse server series onto the window's labels. Missing buckets are
/// zero, repeated labels are summed and labels outside the window dropped.
pub fn densify(window: &ChartWindow, series: &[RevenuePoint]) -> Vec<RevenuePoint> {
    let mut by_label: HashMap<&str, f64> = HashMap::new();
    for point in series {
        *by_label.entry(point.label.as_str()).or_default() += point.revenue;
    }

    window
        .labels()
        .into_iter()
        .map(|label| RevenuePoint {
            revenue: by_label.get(label.as_str()).copied().unwrap_or(0.0),
            label,
        })
        .collect()
}

/// Date/status filter of the order table. Applies to the fetched page only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub date: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        let date_match = match self.date.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(date) => order.date.as_deref().is_some_and(|d| d.contains(date)),
        };
        let status_match = self.status.is_none_or(|status| order.status == status);
        date_match && status_match
    }

    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|order| self.matches(order)).collect()
    }
}
