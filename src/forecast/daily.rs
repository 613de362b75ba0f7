use super::conditions::{format_forecast_date, round_half_up, AirQuality, WeatherCondition};
use super::types::{ForecastDay, ForecastSample};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashSet;
use std::slice;

pub const MAX_FORECAST_DAYS: usize = 5;
const MIDDAY_HOUR: i32 = 12;

/// Collapse 3-hour samples into at most five per-day summaries in the
/// location's local time.
pub fn summarize_forecast(samples: &[ForecastSample], utc_offset_secs: i32) -> Vec<ForecastDay> {
    daily_forecasts(samples, utc_offset_secs)
        .take(MAX_FORECAST_DAYS)
        .collect()
}

/// Lazily yields one `ForecastDay` per local calendar day, in the order each
/// day first appears in `samples`.
pub fn daily_forecasts(samples: &[ForecastSample], utc_offset_secs: i32) -> DailyForecasts<'_> {
    DailyForecasts {
        samples,
        cursor: samples.iter(),
        offset: i64::from(utc_offset_secs),
        emitted: HashSet::new(),
    }
}

pub struct DailyForecasts<'a> {
    samples: &'a [ForecastSample],
    cursor: slice::Iter<'a, ForecastSample>,
    offset: i64,
    emitted: HashSet<NaiveDate>,
}

impl Iterator for DailyForecasts<'_> {
    type Item = ForecastDay;

    fn next(&mut self) -> Option<ForecastDay> {
        let offset = self.offset;
        let emitted = &self.emitted;
        let key = self
            .cursor
            .by_ref()
            .map(|sample| day_key(sample, offset))
            .find(|key| !emitted.contains(key))?;

        // The whole input is scanned again, not just what is left after the cursor.
        let day_samples: Vec<&ForecastSample> = self
            .samples
            .iter()
            .filter(|sample| day_key(sample, offset) == key)
            .collect();

        self.emitted.insert(key);
        summarize_day(&day_samples, offset)
    }
}

fn summarize_day(day_samples: &[&ForecastSample], offset: i64) -> Option<ForecastDay> {
    let representative = representative_sample(day_samples, offset)?;
    let local = local_datetime(representative.dt, offset);

    let temps = day_samples.iter().map(|sample| sample.main.temp);
    let high_temp = round_half_up(nan_aware_max(temps.clone()));
    let low_temp = round_half_up(nan_aware_min(temps));

    let entry = representative.condition().cloned().unwrap_or_default();
    let condition = WeatherCondition::classify(&entry.main);
    let (day, date) = format_forecast_date(&local);

    tracing::trace!(
        "Forecast day {} built from {} samples, representative at {}",
        date,
        day_samples.len(),
        local
    );

    Some(ForecastDay {
        day,
        date,
        condition,
        temp: format!("{}~{}°", low_temp, high_temp),
        label: condition.label(),
        wind: format!("<{}km/h", round_half_up(representative.wind.speed * 3.6)),
        quality: AirQuality::estimate(representative.visibility, representative.main.humidity),
        high_temp,
        low_temp,
        icon: entry.icon,
    })
}

/// The sample whose local hour is closest to midday. An exact tie keeps the
/// earlier sample.
fn representative_sample<'a>(
    day_samples: &[&'a ForecastSample],
    offset: i64,
) -> Option<&'a ForecastSample> {
    day_samples.iter().copied().reduce(|closest, current| {
        if midday_distance(current, offset) < midday_distance(closest, offset) {
            current
        } else {
            closest
        }
    })
}

fn midday_distance(sample: &ForecastSample, offset: i64) -> i32 {
    let hour = local_datetime(sample.dt, offset).hour() as i32;
    (hour - MIDDAY_HOUR).abs()
}

fn day_key(sample: &ForecastSample, offset: i64) -> NaiveDate {
    local_datetime(sample.dt, offset).date()
}

/// Wall-clock time at the location: the UTC timestamp shifted by the offset
/// and read back as if it were UTC.
fn local_datetime(dt: i64, offset: i64) -> NaiveDateTime {
    DateTime::from_timestamp(dt.saturating_add(offset), 0)
        .unwrap_or_default()
        .naive_utc()
}

// f64::max/min skip NaN; a missing temperature has to show up in the result.
fn nan_aware_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f64::NAN
        } else {
            acc.max(value)
        }
    })
}

fn nan_aware_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f64::NAN
        } else {
            acc.min(value)
        }
    })
}
