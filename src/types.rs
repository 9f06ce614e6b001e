use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp format used by the tracker endpoint, no timezone attached.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One point-in-time view of an order, produced by a single fetch.
///
/// Never mutated after construction; a later fetch supersedes it with a new
/// value. String fields keep the endpoint's empty-string semantics (absence
/// is an empty string, not an Option); only timestamps get an explicit
/// "absent" state.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSnapshot {
    pub store_id: String,
    pub order_key: String,
    pub version: String,
    pub order_id: String,

    pub phone: String,
    pub service_method: String,
    pub driver_name: String,
    pub manager_name: String,
    pub driver_id: String,

    /// Non-empty line items, split from the raw description block, order kept.
    pub order_description: Vec<String>,
    /// Second `orderstatus` occurrence in the document. The endpoint repeats
    /// the tag and the first occurrence is a different, unused field.
    pub status: String,

    pub as_of: Option<NaiveDateTime>,
    pub start_time: Option<NaiveDateTime>,
    pub oven_time: Option<NaiveDateTime>,
    pub rack_time: Option<NaiveDateTime>,
    pub route_time: Option<NaiveDateTime>,
    pub delivery_time: Option<NaiveDateTime>,

    /// Local wall clock at the moment the response was received.
    pub fetched_at: NaiveDateTime,
}

impl std::fmt::Display for OrderSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn opt(t: &Option<NaiveDateTime>) -> String {
            t.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        }

        writeln!(
            f,
            "Phone #: {}, Order ID: {}, Store ID: {}, Order Key: {}",
            self.phone, self.order_id, self.store_id, self.order_key
        )?;
        writeln!(
            f,
            "Driver Name: {}, Manager Name: {}",
            self.driver_name, self.manager_name
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Started {} | Put in oven at {} | Rack: {} | Delivery started at {} | Delivered {}",
            opt(&self.start_time),
            opt(&self.oven_time),
            opt(&self.rack_time),
            opt(&self.route_time),
            opt(&self.delivery_time)
        )?;
        write!(f, "Update Time: {}", opt(&self.as_of))
    }
}

/// Parse a tracker timestamp. Empty text means "no value yet" and is not an
/// error; anything non-empty must match [`TIME_FORMAT`] exactly.
pub fn parse_timestamp(text: &str) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(text, TIME_FORMAT).map(Some)
}

/// Split a multi-line description block into trimmed, non-empty lines.
pub(crate) fn split_order_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
