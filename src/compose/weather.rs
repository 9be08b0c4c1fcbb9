use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::compose::canvas::{Canvas, WHITE};
use crate::compose::icons::{self, IconSet};
use crate::overlay::{CurrentConditions, ForecastDay, Loadshedding, Moon, WeatherOverlay};
use crate::processing::rotate::rotate_clockwise;

const FORECAST_DAYS: usize = 4;
const LOADSHED_SLOTS: usize = 2;

/// Quarter-screen block grid the overlay layouts are placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub block_w: i32,
    pub block_h: i32,
}

impl Grid {
    pub fn for_canvas(canvas: &Canvas<'_>) -> Self {
        Self {
            block_w: (canvas.width() / 4) as i32,
            block_h: (canvas.height() / 4) as i32,
        }
    }
}

/// Draw the weather overlay: current conditions on the left, moon and wind in the middle,
/// the coming days down the right-hand column.
pub fn draw(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    overlay: &WeatherOverlay,
    today: NaiveDate,
    now: DateTime<FixedOffset>,
) {
    let grid = Grid::for_canvas(canvas);
    let current = &overlay.weather.current;

    draw_current_temp(canvas, icons, grid, current, 0, 0);
    draw_humidity_pressure(canvas, icons, grid, current, 0, 1);
    draw_sunrise_sunset(canvas, icons, grid, current, 1, 1);
    draw_wind(canvas, icons, grid, current, 2, 1);
    draw_moon(canvas, icons, grid, &overlay.moon, 2, 0);

    for (row, day) in upcoming_days(&overlay.weather.forecast, today).enumerate() {
        draw_forecast(canvas, icons, grid, day, 3, row as i32);
    }

    if let Some(schedule) = &overlay.loadshed {
        draw_loadshed(canvas, grid, schedule, now, 0, 3);
    }
}

/// Forecast days after `today`, at most four.
pub fn upcoming_days(forecast: &[ForecastDay], today: NaiveDate) -> impl Iterator<Item = &ForecastDay> {
    forecast
        .iter()
        .filter(move |day| day.day.is_none_or(|d| d.date_naive() != today))
        .take(FORECAST_DAYS)
}

fn draw_icon(canvas: &mut Canvas<'_>, icons: &IconSet, name: &str, x: i32, y: i32) {
    if let Some(icon) = icons.get(name) {
        canvas.draw_icon(&icon, x as i64, y as i64);
    }
}

fn draw_current_temp(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    grid: Grid,
    current: &CurrentConditions,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w + 15;
    let yb = yq * grid.block_h + 10;
    draw_icon(canvas, icons, icons::weather_icon(current.weather_icon), xb, yb);
    if !current.weather_desc.is_empty() {
        canvas.draw_text(&current.weather_desc, 24.0, WHITE, xb + 10, yb + 70);
    }
    canvas.draw_text(&format!("{:.1}", current.temp), 50.0, WHITE, xb + 100, yb + 10);
}

fn draw_humidity_pressure(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    grid: Grid,
    current: &CurrentConditions,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w + 15;
    let mut yb = yq * grid.block_h;
    draw_icon(canvas, icons, icons::HUMIDITY, xb, yb);
    canvas.draw_text(&format!("{:.1}", current.humidity), 20.0, WHITE, xb + 60, yb + 12);

    yb += 55;
    draw_icon(canvas, icons, icons::PRESSURE, xb + 4, yb);
    canvas.draw_text(&format!("{:.1}", current.pressure), 20.0, WHITE, xb + 60, yb + 12);
}

fn draw_sunrise_sunset(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    grid: Grid,
    current: &CurrentConditions,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w;
    let mut yb = yq * grid.block_h;
    draw_icon(canvas, icons, icons::SUNRISE, xb, yb);
    if let Some(sunrise) = current.sunrise {
        canvas.draw_text(&clock_time(sunrise), 20.0, WHITE, xb + 60, yb + 12);
    }

    yb += 55;
    draw_icon(canvas, icons, icons::SUNSET, xb, yb);
    if let Some(sunset) = current.sunset {
        canvas.draw_text(&clock_time(sunset), 20.0, WHITE, xb + 60, yb + 12);
    }
}

/// `6:05PM` style, in the timestamp's own offset.
pub fn clock_time(t: DateTime<FixedOffset>) -> String {
    t.format("%-I:%M%p").to_string()
}

fn draw_wind(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    grid: Grid,
    current: &CurrentConditions,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w;
    let yb = yq * grid.block_h;
    if let Some(arrow) = icons.get(icons::WIND_ARROW) {
        let rotated = rotate_clockwise(&arrow, current.wind_direction as f32);
        canvas.draw_icon(&rotated, xb as i64, yb as i64);
    }
    canvas.draw_text(&format!("{:.1}", current.wind_speed), 20.0, WHITE, xb + 60, yb + 12);
}

fn draw_moon(canvas: &mut Canvas<'_>, icons: &IconSet, grid: Grid, moon: &Moon, xq: i32, yq: i32) {
    let xb = xq * grid.block_w;
    let yb = yq * grid.block_h;
    draw_icon(canvas, icons, &icons::moon_icon(moon.bucket()), xb, yb + 10);
    if !moon.phase_name.is_empty() {
        canvas.draw_text(&moon.phase_name, 15.0, WHITE, xb + 10, yb + 70);
    }
}

fn draw_forecast(
    canvas: &mut Canvas<'_>,
    icons: &IconSet,
    grid: Grid,
    day: &ForecastDay,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w - 15;
    let yb = yq * grid.block_h;
    draw_icon(canvas, icons, icons::weather_icon(day.weather_icon), xb - 10, yb);
    if !day.weather_desc.is_empty() {
        canvas.draw_text(&day.weather_desc, 15.0, WHITE, xb + 10, yb + 70);
    }
    if !day.name.is_empty() {
        canvas.draw_text(&day.name, 18.0, WHITE, xb + 100, yb + 10);
    }
    let temps = format!("{:.0} / {:.0}", day.temp_max, day.temp_min);
    canvas.draw_text(&temps, 18.0, WHITE, xb + 100, yb + 40);
}

fn draw_loadshed(
    canvas: &mut Canvas<'_>,
    grid: Grid,
    schedule: &Loadshedding,
    now: DateTime<FixedOffset>,
    xq: i32,
    yq: i32,
) {
    let xb = xq * grid.block_w + 15;
    let mut yb = yq * grid.block_h + 10;
    // Keep clear of the forecast column.
    let max_width = (3 * grid.block_w - 30) as f32;

    let title = if schedule.stage > 0 {
        format!("{}: Stage {}", schedule.name, schedule.stage)
    } else {
        format!("{}: No load shedding", schedule.name)
    };
    let title = canvas.truncate_to_width(&title, 18.0, max_width);
    let height = canvas.measure(&title, 18.0).height;
    canvas.draw_text(&title, 18.0, WHITE, xb, yb);
    yb += height as i32 + 5;

    for slot in schedule.upcoming(now).take(LOADSHED_SLOTS) {
        let line = canvas.truncate_to_width(&format!("{} {}", slot.day, slot.note), 15.0, max_width);
        let height = canvas.measure(&line, 15.0).height;
        canvas.draw_text(&line, 15.0, WHITE, xb, yb);
        yb += height as i32 + 5;
    }
}
