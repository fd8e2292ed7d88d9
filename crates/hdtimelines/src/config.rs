use crate::{
    constants::DEFAULT_ROW_SPACING,
    dates::{DateOrder, HoverPrecision},
    error::{Result, TimelineError},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chart settings file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub chart: ChartSection,
    pub topics: TopicOptions,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartSection {
    pub title: String,
    /// Initial visible range; date text such as "1800-01-01" or "1870"
    pub mindate: Option<String>,
    pub maxdate: Option<String>,
    pub xmode: XMode,
    pub date_order: DateOrder,
    pub hover_precision: HoverPrecision,
}

/// How the x axis is labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XMode {
    /// Calendar dates (AD only)
    #[default]
    Date,
    /// Numeric years, negative before 1 CE
    Years,
}

/// Options applied to each topic added to a chart
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicOptions {
    pub show_birth_and_death: bool,
    pub show_label: bool,
    /// Place events with a birth date first, then restart lanes for the rest
    pub lives_first: bool,
    pub row_spacing: f64,
    /// Events ranked above this are left out
    pub max_rank: u32,
    pub study_range_start: Option<String>,
    pub study_range_end: Option<String>,
}

impl Default for TopicOptions {
    fn default() -> Self {
        Self {
            show_birth_and_death: true,
            show_label: true,
            lives_first: true,
            row_spacing: DEFAULT_ROW_SPACING,
            max_rank: 1,
            study_range_start: None,
            study_range_end: None,
        }
    }
}

/// SVG geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width_px: f64,
    /// Pixels per y unit; rows are `row_spacing` units apart
    pub y_unit_px: f64,
    pub margin_px: f64,
    pub axis_height_px: f64,
    pub font_size_px: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width_px: 1200.0,
            y_unit_px: 60.0,
            margin_px: 16.0,
            axis_height_px: 28.0,
            font_size_px: 11.0,
        }
    }
}

impl ChartConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TimelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: ChartConfig = toml::from_str(&content).map_err(|e| {
            TimelineError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let topics = &self.topics;
        if !(topics.row_spacing.is_finite() && topics.row_spacing > 0.0) {
            return Err(TimelineError::Config(format!(
                "row_spacing must be positive, got {}",
                topics.row_spacing
            )));
        }
        if topics.study_range_start.is_some() != topics.study_range_end.is_some() {
            return Err(TimelineError::Config(
                "study_range_start and study_range_end must be given together".to_string(),
            ));
        }

        let render = &self.render;
        for (name, value) in [
            ("width_px", render.width_px),
            ("y_unit_px", render.y_unit_px),
            ("font_size_px", render.font_size_px),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TimelineError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if render.margin_px < 0.0 || render.axis_height_px < 0.0 {
            return Err(TimelineError::Config(
                "margins must not be negative".to_string(),
            ));
        }
        if render.width_px <= 2.0 * render.margin_px {
            return Err(TimelineError::Config(format!(
                "width_px {} leaves no room inside margins of {}",
                render.width_px, render.margin_px
            )));
        }
        Ok(())
    }
}
