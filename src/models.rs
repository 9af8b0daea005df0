use serde::Serialize;

/// Lifecycle status stamped on every row of a (re)uploaded route.
pub const STATUS_ACTIVE: &str = "ACTIVE";

/// One station-stop record belonging to a train's itinerary.
///
/// `train_name`, `station_from`, `station_to` and `running_days` are
/// denormalized: every row of the same train carries identical values
/// after a reconciliation pass.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RouteRow {
    /// Internal surrogate identifier, stable across re-uploads.
    pub train_id: i64,
    /// External identifier supplied by uploaders; the natural key for
    /// matching across uploads.
    pub train_number: String,
    pub train_name: Option<String>,
    pub station_from: Option<String>,
    pub station_to: Option<String>,
    pub running_days: Option<String>,
    /// Position of this stop within the route, used for display ordering.
    pub station_sequence: Option<i64>,
    pub station_code: Option<String>,
    pub station_name: Option<String>,
    pub arrives: Option<String>,
    pub departs: Option<String>,
    pub stop_duration: Option<String>,
    pub distance: Option<String>,
    pub platform: Option<String>,
    pub route_flag: Option<i64>,
    pub day: Option<i64>,
    pub status: String,
    pub uploaded_at: String,
}
