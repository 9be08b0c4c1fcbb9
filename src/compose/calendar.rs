use chrono::{Days, NaiveDate};

use crate::compose::canvas::{Canvas, WHITE, colour_named};
use crate::compose::weather::Grid;
use crate::overlay::{CalendarEvent, CalendarName, CalendarOverlay};

const HEADER_SIZE: f32 = 20.0;
const EVENT_SIZE: f32 = 20.0;
const LEGEND_SIZE: f32 = 20.0;
const DAYS_SHOWN: u64 = 4;

/// Draw a four-day agenda: weekday header, one column of events per day, legend bottom-right.
pub fn draw(canvas: &mut Canvas<'_>, overlay: &CalendarOverlay, today: NaiveDate) {
    let grid = Grid::for_canvas(canvas);

    for i in 0..DAYS_SHOWN {
        let Some(day) = today.checked_add_days(Days::new(i)) else {
            break;
        };
        let name = day.format("%A").to_string();
        canvas.draw_text(&name, HEADER_SIZE, WHITE, i as i32 * grid.block_w + 10, 10);
    }
    let header_height = canvas
        .measure(&today.format("%A").to_string(), HEADER_SIZE)
        .height as i32
        + 30;

    let mut events: Vec<&CalendarEvent> = overlay.events.iter().collect();
    // Stable, so same-start entries keep the service's order; undated events go last.
    events.sort_by_key(|event| (event.start.is_none(), event.start));

    let mut group: Option<&str> = None;
    let mut column = 0;
    let mut y = header_height;
    for event in events {
        if group != Some(event.day_name.as_str()) {
            group = Some(event.day_name.as_str());
            column = column_for(event, today);
            y = header_height;
        }
        y = draw_event(canvas, grid, event, column, y);
    }

    draw_legend(canvas, grid, &overlay.legend, 3, 3);
}

/// Whole days between `today` and the event's start date, clamped to the visible columns.
pub fn column_for(event: &CalendarEvent, today: NaiveDate) -> i32 {
    let offset = event
        .start
        .map(|start| (start.date_naive() - today).num_days())
        .unwrap_or(0);
    offset.clamp(0, DAYS_SHOWN as i64 - 1) as i32
}

/// Returns the y coordinate for the next event in the same column.
fn draw_event(canvas: &mut Canvas<'_>, grid: Grid, event: &CalendarEvent, column: i32, y: i32) -> i32 {
    let x = column * grid.block_w + 15;
    let max_width = (grid.block_w - 10) as f32;
    let colour = colour_named(&event.colour);

    let line = canvas.truncate_to_width(
        &format!("{} ({})", event.time, event.duration),
        EVENT_SIZE,
        max_width,
    );
    let height = canvas.measure(&line, EVENT_SIZE).height as i32;
    canvas.draw_text(&line, EVENT_SIZE, colour, x, y);
    let y = y + height + 5;

    let line = canvas.truncate_to_width(&format!(" {}", event.summary), EVENT_SIZE, max_width);
    let height = canvas.measure(&line, EVENT_SIZE).height as i32;
    canvas.draw_text(&line, EVENT_SIZE, colour, x, y);
    y + height + 12
}

fn draw_legend(canvas: &mut Canvas<'_>, grid: Grid, legend: &[CalendarName], xq: i32, yq: i32) {
    let x = xq * grid.block_w;
    let mut y = yq * grid.block_h;
    for entry in legend {
        let height = canvas.measure(&entry.name, LEGEND_SIZE).height as i32;
        canvas.draw_text(&entry.name, LEGEND_SIZE, colour_named(&entry.colour), x, y);
        y += height + 15;
    }
}
