use chrono::{NaiveDateTime, TimeZone, Utc};
use std::fmt::{self, Display};

pub type DateTime = chrono::DateTime<Utc>;

/// Format accepted from and produced for `datetime-local` form inputs.
const FORM_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A timestamp as it is shown to readers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct When(pub DateTime);

impl When {
    /// The value for a `datetime-local` input field.
    pub fn form_value(&self) -> String {
        self.0.format(FORM_FORMAT).to_string()
    }
}

impl Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.format("%Y-%m-%d %H:%M").fmt(f)
    }
}

/// Parse the value of a `datetime-local` form field.
///
/// Browsers send these without any zone, they are taken as UTC.
/// Seconds are accepted but not required.
pub fn parse_form_date(value: &str) -> Option<DateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, FORM_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
