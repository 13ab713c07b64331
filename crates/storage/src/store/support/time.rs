#![forbid(unsafe_code)]

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Formats node timestamps in one fixed offset, whatever the host timezone is.
#[derive(Clone, Copy, Debug)]
pub(in crate::store) struct Clock {
    offset: UtcOffset,
}

impl Clock {
    pub(in crate::store) fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub(in crate::store) fn now_display(&self) -> String {
        format_display(OffsetDateTime::now_utc().to_offset(self.offset))
    }
}

/// `Sun Oct 18 2026 20:41:00 GMT+0800`
fn format_display(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[weekday repr:short] [month repr:short] [day] [year] [hour]:[minute]:[second] GMT[offset_hour sign:mandatory][offset_minute]"
    ))
    .unwrap_or_else(|_| "Thu Jan 01 1970 00:00:00 GMT+0000".to_string())
}

pub(in crate::store) fn now_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn display_format_matches_stored_records() {
        let at = datetime!(2026-10-18 12:41:05 UTC).to_offset(offset!(+8));
        assert_eq!(format_display(at), "Sun Oct 18 2026 20:41:05 GMT+0800");
    }

    #[test]
    fn clock_uses_configured_offset() {
        let stamp = Clock::new(offset!(-5)).now_display();
        assert!(stamp.ends_with("GMT-0500"), "{stamp}");
    }
}
