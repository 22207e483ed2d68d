//! Human-friendly terminal output.

use chrono::{DateTime, Local};
use forecast_core::{AppNotification, NotificationKind, Page, SavedForecast};

pub fn print_notifications(notes: &[AppNotification]) {
    for note in notes {
        let tag = match note.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Info => "info",
            NotificationKind::Danger => "error",
        };
        if note.kind == NotificationKind::Danger {
            eprintln!("[{tag}] {}", note.text);
        } else {
            println!("[{tag}] {}", note.text);
        }
    }
}

pub fn print_entries(items: &[SavedForecast]) {
    if items.is_empty() {
        println!("No saved locations. Add one with `forecast add --city <name>`.");
        return;
    }

    println!(
        "{:<24} {:<20} {:>6} {:<22} {:>5} {:>7} {:>9}  {}",
        "KEY", "NAME", "TEMP", "CONDITIONS", "HUM", "WIND", "PRESSURE", "UPDATED"
    );
    for item in items {
        println!("{}", entry_line(item));
    }
}

pub fn print_page(page: &Page<'_>) {
    let items: Vec<SavedForecast> = page.items.iter().map(|&i| i.clone()).collect();
    print_entries(&items);
    if page.total_items > 0 {
        println!(
            "Page {}/{} ({} location(s))",
            page.page, page.total_pages, page.total_items
        );
    }
}

fn entry_line(item: &SavedForecast) -> String {
    let w = &item.weather;
    let name = if w.country.is_empty() {
        w.name.clone()
    } else {
        format!("{}, {}", w.name, w.country)
    };

    format!(
        "{:<24} {:<20} {:>4}°C {:<22} {:>4}% {:>3.1}m/s {:>6}hPa  {} (sun {}-{})",
        truncate(&item.key, 24),
        truncate(&name, 20),
        w.rounded_temp(),
        truncate(&w.description, 22),
        w.humidity.round() as i64,
        w.wind_speed,
        w.pressure.round() as i64,
        format_millis(w.updated_at),
        format_clock(w.sunrise),
        format_clock(w.sunset),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_clock(secs: i64) -> String {
    if secs == 0 {
        return "--:--".to_string();
    }
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("Llanfairpwllgwyngyll", 10), "Llanfairp…");
        assert_eq!(truncate("Oslo", 10), "Oslo");
    }

    #[test]
    fn missing_sun_times_render_placeholder() {
        assert_eq!(format_clock(0), "--:--");
    }
}
