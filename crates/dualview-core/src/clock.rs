//! Wall-clock overlay text

use chrono::{Local, Timelike};

/// `h:mm AM/PM`, 12-hour with midnight and noon shown as 12
pub fn format_clock<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if is_pm { "PM" } else { "AM" })
}

/// Current local time for the overlay
pub fn now() -> String {
    format_clock(&Local::now())
}
