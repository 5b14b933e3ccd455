use actix_web::{HttpResponse, web};
use chrono::{Datelike, Local};
use serde::Deserialize;
use tera::{Context, Tera};

use crate::AppState;
use crate::derived::{CHART_YEARS, ChartWindow, Granularity, densify};
use crate::handlers::dashboard::fetch_dashboard;
use crate::session::RequestContext;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub filter_type: Option<Granularity>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl DashboardQuery {
    /// Missing inputs fall back to the current month; years are clamped to
    /// [`CHART_YEARS`].
    pub fn window(&self) -> ChartWindow {
        let today = Local::now().date_naive();
        ChartWindow {
            granularity: self.filter_type.unwrap_or_default(),
            year: self
                .year
                .unwrap_or(today.year())
                .clamp(*CHART_YEARS.start(), *CHART_YEARS.end()),
            month: self
                .month
                .filter(|m| (1..=12).contains(m))
                .unwrap_or(today.month()),
        }
    }
}

pub async fn show_dashboard(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    query: web::Query<DashboardQuery>,
) -> HttpResponse {
    let window = query.window();
    let mut context = Context::new();
    context.insert("granularities", &["day", "month", "year"]);
    context.insert("granularity", &window.granularity.to_string());
    context.insert("year", &window.year);
    context.insert("month", &window.month);

    match fetch_dashboard(&state.api, &ctx, &window).await {
        Ok(stats) => {
            let series = densify(&window, &stats.revenue_by_time);
            let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
            let values: Vec<f64> = series.iter().map(|p| p.revenue).collect();
            context.insert("stats", &stats);
            context.insert("series", &series);
            context.insert(
                "chart_labels",
                &serde_json::to_string(&labels).unwrap_or_default(),
            );
            context.insert(
                "chart_values",
                &serde_json::to_string(&values).unwrap_or_default(),
            );
        }
        Err(error) => {
            log::warn!("Dashboard unavailable: {}", error);
            context.insert("error", &error.user_message());
        }
    }

    crate::routes::render(&tmpl, "dashboard.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_month_falls_back_to_today() {
        let query = DashboardQuery {
            filter_type: Some(Granularity::Month),
            year: Some(2023),
            month: Some(13),
        };
        let window = query.window();
        assert_eq!(window.granularity, Granularity::Month);
        assert_eq!(window.year, 2023);
        assert!((1..=12).contains(&window.month));
    }

    #[test]
    fn out_of_range_year_is_clamped() {
        let query = DashboardQuery {
            filter_type: Some(Granularity::Year),
            year: Some(i32::MAX),
            month: None,
        };
        let window = query.window();
        assert_eq!(window.year, 9999);
        assert_eq!(window.labels().first().map(String::as_str), Some("9994"));

        let query = DashboardQuery {
            year: Some(-40),
            ..query
        };
        assert_eq!(query.window().year, 1);
    }
}
