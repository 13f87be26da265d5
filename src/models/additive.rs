// src/models/additive.rs

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;
use std::ops::Range;

use chrono::{Duration, NaiveDate};
use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};

use crate::config::ModelConfig;
use crate::error::{DashboardError, Result};
use crate::models::holidays::us_holidays_between;
use crate::models::{ForecastRow, ForecastTable, PriceSeries};

const MAX_CHANGEPOINTS: usize = 25;
const CHANGEPOINT_RANGE: f64 = 0.8;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
/// Histories sampled this sparsely cannot identify a weekly cycle
const MIN_WEEKLY_SPACING_DAYS: i64 = 7;

/// Prior scales, in units of the max-scaled price.
const NOISE_SCALE: f64 = 0.05;
const TREND_PRIOR_SCALE: f64 = 5.0;
const CHANGEPOINT_PRIOR_SCALE: f64 = 0.05;
const SEASONALITY_PRIOR_SCALE: f64 = 10.0;
const HOLIDAYS_PRIOR_SCALE: f64 = 10.0;

/// Column ranges of each additive component in the design matrix
#[derive(Debug, Clone)]
struct Layout {
    trend: Range<usize>,
    yearly: Range<usize>,
    weekly: Range<usize>,
    holidays: Range<usize>,
}

impl Layout {
    fn width(&self) -> usize {
        self.holidays.end
    }
}

/// Additive time-series model:
/// `y(t) = trend(t) + yearly(t) + weekly(t) + holidays(t) + noise`.
///
/// The trend is piecewise linear with changepoints spread over the first 80%
/// of the history; seasonalities are Fourier series; each US holiday gets its
/// own additive effect. Coefficients are fitted by ridge-regularised least
/// squares on max-scaled prices.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    config: ModelConfig,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    holiday_names: Vec<&'static str>,
    layout: Layout,
    beta: DVector<f64>,
    /// Residual standard deviation, in scaled units
    sigma: f64,
    history_dates: Vec<NaiveDate>,
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as f64
}

fn fourier_terms(date: NaiveDate, period: f64, order: usize, out: &mut Vec<f64>) {
    let d = days_since_epoch(date);
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * d / period;
        out.push(x.sin());
        out.push(x.cos());
    }
}

/// Changepoint locations on the scaled time axis, evenly spaced over the
/// first `CHANGEPOINT_RANGE` of the history and excluding the first point.
fn changepoint_locations(t: &[f64]) -> Vec<f64> {
    let hist_size = (t.len() as f64 * CHANGEPOINT_RANGE).floor() as usize;
    let n_changepoints = MAX_CHANGEPOINTS.min(hist_size.saturating_sub(1));
    if n_changepoints == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n_changepoints)
        .map(|i| {
            let idx = (last * i as f64 / n_changepoints as f64).round() as usize;
            t[idx]
        })
        .collect()
}

/// Linear-interpolated quantile of an ascending slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Laplace(0, scale) draw by inverse CDF
fn sample_laplace<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

impl AdditiveModel {
    /// Fits the model on the price series.
    pub fn fit(series: &PriceSeries, config: &ModelConfig) -> Result<Self> {
        if series.len() < 2 {
            return Err(DashboardError::Model(format!(
                "at least 2 data points are needed to fit a model, got {}",
                series.len()
            )));
        }

        let dates = series.dates();
        let prices = series.prices();
        let start = dates[0];
        let span_days = (dates[dates.len() - 1] - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(DashboardError::Model(
                "price series must cover more than one date".to_string(),
            ));
        }

        let min_spacing = dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .min()
            .unwrap_or(0);
        let mut config = config.clone();
        if config.weekly_seasonality && min_spacing >= MIN_WEEKLY_SPACING_DAYS {
            debug!(
                "Disabling weekly seasonality: history dates are at least {} days apart",
                min_spacing
            );
            config.weekly_seasonality = false;
        }

        let y_scale = prices.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();
        let changepoints = changepoint_locations(&t);

        let holiday_names: Vec<&'static str> = if config.holidays {
            us_holidays_between(start, dates[dates.len() - 1])
                .into_iter()
                .map(|h| h.name)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };

        let trend_end = 2 + changepoints.len();
        let yearly_end = trend_end + if config.yearly_seasonality { 2 * YEARLY_ORDER } else { 0 };
        let weekly_end = yearly_end + if config.weekly_seasonality { 2 * WEEKLY_ORDER } else { 0 };
        let layout = Layout {
            trend: 0..trend_end,
            yearly: trend_end..yearly_end,
            weekly: yearly_end..weekly_end,
            holidays: weekly_end..weekly_end + holiday_names.len(),
        };

        let mut model = AdditiveModel {
            config,
            start,
            span_days,
            y_scale,
            changepoints,
            holiday_names,
            layout,
            beta: DVector::zeros(0),
            sigma: 0.0,
            history_dates: dates.clone(),
        };

        let x = model.design_matrix(&dates);
        let y = DVector::from_iterator(prices.len(), prices.iter().map(|p| p / y_scale));

        let precision = model.prior_precision();
        let xtx = x.transpose() * &x + DMatrix::from_diagonal(&precision);
        let xty = x.transpose() * &y;

        let beta = match xtx.clone().cholesky() {
            Some(chol) => chol.solve(&xty),
            None => xtx.lu().solve(&xty).ok_or_else(|| {
                DashboardError::Model("normal equations are singular".to_string())
            })?,
        };

        let residuals = &y - &x * &beta;
        let sigma = (residuals.dot(&residuals) / y.len() as f64).sqrt();

        debug!(
            "Fitted additive model: {} rows, {} changepoints, {} holidays, sigma {:.6}",
            y.len(),
            model.changepoint_count(),
            model.holiday_names.len(),
            sigma
        );

        model.beta = beta;
        model.sigma = sigma;
        Ok(model)
    }

    fn prior_precision(&self) -> DVector<f64> {
        let mut precision = DVector::zeros(self.layout.width());
        let ridge = |scale: f64| (NOISE_SCALE / scale).powi(2);
        for i in 0..2 {
            precision[i] = ridge(TREND_PRIOR_SCALE);
        }
        for i in 2..self.layout.trend.end {
            precision[i] = ridge(CHANGEPOINT_PRIOR_SCALE);
        }
        for i in self.layout.yearly.start..self.layout.weekly.end {
            precision[i] = ridge(SEASONALITY_PRIOR_SCALE);
        }
        for i in self.layout.holidays.clone() {
            precision[i] = ridge(HOLIDAYS_PRIOR_SCALE);
        }
        precision
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    fn design_matrix(&self, dates: &[NaiveDate]) -> DMatrix<f64> {
        let holiday_lookup: HashMap<NaiveDate, Vec<&'static str>> = match (dates.iter().min(), dates.iter().max()) {
            (Some(first), Some(last)) if !self.holiday_names.is_empty() => {
                let mut lookup: HashMap<NaiveDate, Vec<&'static str>> = HashMap::new();
                for holiday in us_holidays_between(*first, *last) {
                    lookup.entry(holiday.date).or_default().push(holiday.name);
                }
                lookup
            }
            _ => HashMap::new(),
        };

        let width = self.layout.width();
        let mut values = Vec::with_capacity(dates.len() * width);
        for date in dates {
            let t = self.scaled_time(*date);
            let mut row = Vec::with_capacity(width);
            row.push(1.0);
            row.push(t);
            for s in &self.changepoints {
                row.push((t - s).max(0.0));
            }
            if self.config.yearly_seasonality {
                fourier_terms(*date, YEARLY_PERIOD, YEARLY_ORDER, &mut row);
            }
            if self.config.weekly_seasonality {
                fourier_terms(*date, WEEKLY_PERIOD, WEEKLY_ORDER, &mut row);
            }
            let on_date = holiday_lookup.get(date);
            for name in &self.holiday_names {
                let hit = on_date.map_or(false, |names| names.contains(name));
                row.push(if hit { 1.0 } else { 0.0 });
            }
            values.extend(row);
        }
        DMatrix::from_row_slice(dates.len(), width, &values)
    }

    fn component(&self, x: &DMatrix<f64>, row: usize, cols: &Range<usize>) -> f64 {
        cols.clone().map(|c| x[(row, c)] * self.beta[c]).sum::<f64>() * self.y_scale
    }

    /// History dates followed by `horizon` consecutive days after the last one.
    pub fn make_future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let mut dates = self.history_dates.clone();
        if let Some(last) = self.history_dates.last().copied() {
            dates.extend((1..=horizon as i64).map(|i| last + Duration::days(i)));
        }
        dates
    }

    /// Predicts every date, with uncertainty bounds from simulated trajectories.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastTable> {
        let x = self.design_matrix(dates);
        let fitted = &x * &self.beta;

        let mut rows: Vec<ForecastRow> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let yhat = fitted[i] * self.y_scale;
                ForecastRow {
                    date: *date,
                    yhat,
                    yhat_lower: yhat,
                    yhat_upper: yhat,
                    trend: self.component(&x, i, &self.layout.trend),
                    yearly: self.component(&x, i, &self.layout.yearly),
                    weekly: self.component(&x, i, &self.layout.weekly),
                    holidays: self.component(&x, i, &self.layout.holidays),
                }
            })
            .collect();

        self.apply_uncertainty(&mut rows)?;
        Ok(ForecastTable { rows })
    }

    /// Fits-and-extends convenience: predicts history plus `horizon` days.
    pub fn forecast(&self, horizon: usize) -> Result<ForecastTable> {
        self.predict(&self.make_future_dates(horizon))
    }

    fn apply_uncertainty(&self, rows: &mut [ForecastRow]) -> Result<()> {
        let n_samples = self.config.uncertainty_samples;
        if n_samples == 0 || rows.is_empty() {
            return Ok(());
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let noise = Normal::new(0.0, self.sigma)
            .map_err(|e| DashboardError::Model(format!("invalid noise scale: {}", e)))?;

        let t: Vec<f64> = rows.iter().map(|r| self.scaled_time(r.date)).collect();
        let t_max = t.iter().cloned().fold(f64::MIN, f64::max);

        let deltas = &self.beta.as_slice()[2..self.layout.trend.end];
        let laplace_scale = deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len().max(1) as f64 + 1e-8;
        let change_rate = self.changepoints.len() as f64 * (t_max - 1.0);
        let poisson = if change_rate > 0.0 {
            Some(Poisson::new(change_rate).map_err(|e| {
                DashboardError::Model(format!("invalid changepoint rate: {}", e))
            })?)
        } else {
            None
        };

        let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(n_samples); rows.len()];
        for _ in 0..n_samples {
            let n_changes = poisson.as_ref().map_or(0, |p| p.sample(&mut rng) as usize);
            let new_changes: Vec<(f64, f64)> = (0..n_changes)
                .map(|_| {
                    let location = rng.gen_range(1.0..t_max);
                    (location, sample_laplace(&mut rng, laplace_scale))
                })
                .collect();

            for (i, row) in rows.iter().enumerate() {
                let extra_trend: f64 = new_changes
                    .iter()
                    .map(|(loc, delta)| delta * (t[i] - loc).max(0.0))
                    .sum();
                let draw = row.yhat + (extra_trend + noise.sample(&mut rng)) * self.y_scale;
                samples[i].push(draw);
            }
        }

        let lower_q = (1.0 - self.config.interval_width) / 2.0;
        let upper_q = (1.0 + self.config.interval_width) / 2.0;
        for (row, draws) in rows.iter_mut().zip(samples.iter_mut()) {
            draws.sort_by(|a, b| a.total_cmp(b));
            row.yhat_lower = quantile(draws, lower_q);
            row.yhat_upper = quantile(draws, upper_q);
        }
        Ok(())
    }

    /// Settings the model was fitted with, after adjusting to the data
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn history_dates(&self) -> &[NaiveDate] {
        &self.history_dates
    }

    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }

    pub fn holiday_names(&self) -> &[&'static str] {
        &self.holiday_names
    }
}
