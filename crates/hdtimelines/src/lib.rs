pub mod chart;
pub mod colors;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod events;
pub mod lanes;
pub mod render;
pub mod timeline;

pub use chart::{Chart, PlacedEvent, TopicBand};
pub use config::{ChartConfig, RenderConfig, TopicOptions, XMode};
pub use dates::{DateOrder, DateResolver, DateSpan};
pub use error::{Result, TimelineError};
pub use events::{EventRecord, check_events, read_events_csv};
pub use lanes::{LaneOrganizer, LaneSpacing};
pub use render::{render_svg, save_svg};
pub use timeline::{Timeline, Topic};
