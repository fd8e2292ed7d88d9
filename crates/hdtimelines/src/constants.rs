/// Lane spacing, per year of initially visible range
pub const DAYS_PER_LABEL_CHAR_PER_YEAR: f64 = 2.75;
pub const MIN_SPACING_DAYS_PER_YEAR: f64 = 0.5;

/// Default visible range: from 200 years before to 10 years after today
pub const DEFAULT_YEARS_AHEAD: f64 = 10.0;
pub const DEFAULT_YEARS_SPAN: f64 = 200.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Extra rows added below each topic band
pub const TOPIC_MARGIN_ROWS: usize = 2;
pub const DEFAULT_ROW_SPACING: f64 = 0.3;
/// Minimum visible y extent (in y units)
pub const MIN_Y_RANGE: f64 = 6.0;
pub const Y_PADDING: f64 = 0.25;

/// `c. 1028` widens the resolved span by this many years each side
pub const CIRCA_YEARS: i32 = 5;

/// Expected headers in event CSV files
pub const LABEL_HEADER: &str = "label";
pub const DATE_HEADER: &str = "hdate";
pub const BIRTH_HEADER: &str = "hdate_birth";
