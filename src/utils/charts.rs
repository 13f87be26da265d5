// src/utils/charts.rs

use std::ops::Range;

use chrono::{Duration, NaiveDate};
use plotters::prelude::{
    ChartBuilder, Color, IntoDrawingArea, LineSeries, PathElement, Polygon, SVGBackend, BLACK,
    BLUE, GREEN, RED, WHITE,
};

use crate::config::ModelConfig;
use crate::error::{DashboardError, Result};
use crate::models::{ForecastRow, ForecastTable, PriceSeries};

const CHART_SIZE: (u32, u32) = (900, 450);
const PANEL_HEIGHT: u32 = 260;

fn chart_err<E: std::fmt::Display>(err: E) -> DashboardError {
    DashboardError::Chart(err.to_string())
}

/// Padded min..max of the finite values
fn value_range<I: IntoIterator<Item = f64>>(values: I) -> Option<Range<f64>> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return None;
    }
    if (max - min).abs() < f64::EPSILON {
        return Some((min - 1.0)..(max + 1.0));
    }
    let pad = (max - min) * 0.05;
    Some((min - pad)..(max + pad))
}

fn day_offset(start: NaiveDate, date: NaiveDate) -> i64 {
    (date - start).num_days()
}

fn x_range(start: NaiveDate, end: NaiveDate) -> Range<i64> {
    0..day_offset(start, end).max(1)
}

/// Line chart of the closing price over time.
pub fn render_history(name: &str, series: &PriceSeries) -> Result<String> {
    let (start, end) = match (series.first_date(), series.last_date()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(DashboardError::Chart("no price data to plot".to_string())),
    };
    let y_range = value_range(series.points.iter().map(|p| p.price))
        .ok_or_else(|| DashboardError::Chart("no finite prices to plot".to_string()))?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} price history", name), ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range(start, end), y_range)
            .map_err(chart_err)?;
        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| (start + Duration::days(*x)).format("%Y-%m-%d").to_string())
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(
                series.points.iter().map(|p| (day_offset(start, p.date), p.price)),
                &GREEN,
            ))
            .map_err(chart_err)?
            .label(name)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

/// Actual prices, predicted line and the shaded uncertainty band.
pub fn render_forecast(name: &str, series: &PriceSeries, forecast: &ForecastTable) -> Result<String> {
    let (start, end) = match (forecast.first_date(), forecast.last_date()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(DashboardError::Chart("empty forecast".to_string())),
    };
    let start = series.first_date().map_or(start, |d| d.min(start));
    let y_range = value_range(
        forecast
            .rows
            .iter()
            .flat_map(|r| [r.yhat_lower, r.yhat_upper])
            .chain(series.points.iter().map(|p| p.price)),
    )
    .ok_or_else(|| DashboardError::Chart("no finite values to plot".to_string()))?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{} forecast", name), ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range(start, end), y_range)
            .map_err(chart_err)?;
        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| (start + Duration::days(*x)).format("%Y-%m-%d").to_string())
            .draw()
            .map_err(chart_err)?;

        let band: Vec<(i64, f64)> = forecast
            .rows
            .iter()
            .map(|r| (day_offset(start, r.date), r.yhat_upper))
            .chain(
                forecast
                    .rows
                    .iter()
                    .rev()
                    .map(|r| (day_offset(start, r.date), r.yhat_lower)),
            )
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.2).filled())))
            .map_err(chart_err)?
            .label("uncertainty")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.mix(0.2).filled()));

        chart
            .draw_series(LineSeries::new(
                series.points.iter().map(|p| (day_offset(start, p.date), p.price)),
                &BLACK,
            ))
            .map_err(chart_err)?
            .label("actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

        chart
            .draw_series(LineSeries::new(
                forecast.rows.iter().map(|r| (day_offset(start, r.date), r.yhat)),
                &BLUE,
            ))
            .map_err(chart_err)?
            .label("predicted")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;
        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

#[derive(Debug, Clone, Copy)]
enum Component {
    Trend,
    Yearly,
    Weekly,
    Holidays,
}

impl Component {
    fn label(&self) -> &'static str {
        match self {
            Component::Trend => "trend",
            Component::Yearly => "yearly",
            Component::Weekly => "weekly",
            Component::Holidays => "holidays",
        }
    }

    fn value(&self, row: &ForecastRow) -> f64 {
        match self {
            Component::Trend => row.trend,
            Component::Yearly => row.yearly,
            Component::Weekly => row.weekly,
            Component::Holidays => row.holidays,
        }
    }
}

/// One panel per enabled model component (trend, yearly, weekly, holidays).
pub fn render_components(forecast: &ForecastTable, config: &ModelConfig) -> Result<String> {
    let (start, end) = match (forecast.first_date(), forecast.last_date()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(DashboardError::Chart("empty forecast".to_string())),
    };

    let mut panels = vec![Component::Trend];
    if config.yearly_seasonality {
        panels.push(Component::Yearly);
    }
    if config.weekly_seasonality {
        panels.push(Component::Weekly);
    }
    if config.holidays {
        panels.push(Component::Holidays);
    }

    let mut svg = String::new();
    {
        let size = (CHART_SIZE.0, PANEL_HEIGHT * panels.len() as u32);
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        let areas = root.split_evenly((panels.len(), 1));

        for (component, area) in panels.iter().zip(areas.iter()) {
            let y_range =
                value_range(forecast.rows.iter().map(|r| component.value(r))).unwrap_or(-1.0..1.0);
            let mut chart = ChartBuilder::on(area)
                .caption(component.label(), ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(70)
                .build_cartesian_2d(x_range(start, end), y_range)
                .map_err(chart_err)?;
            chart
                .configure_mesh()
                .x_labels(6)
                .x_label_formatter(&|x| (start + Duration::days(*x)).format("%Y-%m").to_string())
                .draw()
                .map_err(chart_err)?;
            chart
                .draw_series(LineSeries::new(
                    forecast.rows.iter().map(|r| (day_offset(start, r.date), component.value(r))),
                    &RED,
                ))
                .map_err(chart_err)?;
        }
        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_pads_and_skips_nan() {
        let range = value_range([1.0, f64::NAN, 3.0]).unwrap();
        assert!(range.start < 1.0 && range.end > 3.0);
        assert_eq!(value_range([5.0]).unwrap(), 4.0..6.0);
        assert!(value_range([f64::NAN]).is_none());
    }

    #[test]
    fn empty_inputs_are_chart_errors() {
        let err = render_history("BTC", &PriceSeries::default()).unwrap_err();
        assert!(matches!(err, DashboardError::Chart(_)));
        let err = render_components(&ForecastTable::default(), &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::Chart(_)));
    }
}
