use time::{OffsetDateTime, UtcOffset, macros::format_description};

/// Render a UTC timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn display_timestamp(time: OffsetDateTime) -> String {
    time.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| time.unix_timestamp().to_string())
}
