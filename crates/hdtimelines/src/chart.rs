//! Chart model: topics packed into lanes, ready for rendering.

use crate::colors::ColorGen;
use crate::config::{ChartSection, TopicOptions, XMode};
use crate::constants::{
    DAYS_PER_YEAR, DEFAULT_YEARS_AHEAD, DEFAULT_YEARS_SPAN, MIN_Y_RANGE, TOPIC_MARGIN_ROWS,
    Y_PADDING,
};
use crate::dates::{DateResolver, DateSpan, HoverPrecision, age_years, format_ordinal, format_span};
use crate::error::{Result, TimelineError};
use crate::events::EventRecord;
use crate::lanes::{LaneOrganizer, LaneSpacing};
use crate::timeline::Topic;

use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStyle {
    /// Known duration of the event
    Solid,
    /// Uncertainty around a start or end date
    Thin,
    /// Lifespan outside the event
    Dotted,
    /// Uncertainty around a birth or death date
    DottedThin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: i64,
    pub end: i64,
    pub style: SegmentStyle,
    pub hover: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Dot,
    /// Still ongoing at the right end
    Arrow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: i64,
    pub kind: MarkerKind,
    pub hover: String,
}

/// An event after lane assignment
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEvent {
    pub label: String,
    pub show_label: bool,
    pub lane: usize,
    pub y: f64,
    pub earliest: i64,
    pub latest: i64,
    pub label_date: i64,
    pub color: String,
    pub url: Option<String>,
    pub segments: Vec<Segment>,
    pub markers: Vec<Marker>,
}

/// Vertical band used by one topic
#[derive(Debug, Clone, PartialEq)]
pub struct TopicBand {
    pub title: String,
    pub min_y: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone)]
pub struct Chart {
    title: String,
    xmode: XMode,
    hover_precision: HoverPrecision,
    resolver: DateResolver,
    mindate: i64,
    maxdate: i64,
    /// Range at construction; fixes the lane spacing scale
    initial_range_days: i64,
    max_y_used: f64,
    extent: Option<(i64, i64)>,
    bands: Vec<TopicBand>,
    events: Vec<PlacedEvent>,
}

/// Resolved date fields of one event
struct EventDates {
    start: Option<DateSpan>,
    end: Option<DateSpan>,
    birth: Option<DateSpan>,
    death: Option<DateSpan>,
}

impl Chart {
    pub fn new(section: &ChartSection) -> Result<Self> {
        Self::with_resolver(section, DateResolver::new(section.date_order))
    }

    pub fn with_resolver(section: &ChartSection, resolver: DateResolver) -> Result<Self> {
        let maxdate = match resolve_setting(&resolver, "maxdate", section.maxdate.as_deref())? {
            Some(ord) => ord,
            None => resolver.today + (DEFAULT_YEARS_AHEAD * DAYS_PER_YEAR) as i64,
        };
        let mindate = match resolve_setting(&resolver, "mindate", section.mindate.as_deref())? {
            Some(ord) => ord,
            None => maxdate - (DEFAULT_YEARS_SPAN * DAYS_PER_YEAR) as i64,
        };
        if maxdate <= mindate {
            return Err(TimelineError::Config(format!(
                "maxdate ({}) must be after mindate ({})",
                maxdate, mindate
            )));
        }

        Ok(Self {
            title: section.title.clone(),
            xmode: section.xmode,
            hover_precision: section.hover_precision,
            resolver,
            mindate,
            maxdate,
            initial_range_days: maxdate - mindate,
            max_y_used: 0.0,
            extent: None,
            bands: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn xmode(&self) -> XMode {
        self.xmode
    }

    /// Visible x range as ordinals
    pub fn x_range(&self) -> (i64, i64) {
        (self.mindate, self.maxdate)
    }

    pub fn initial_range_years(&self) -> f64 {
        self.initial_range_days as f64 / 365.0
    }

    pub fn max_y_used(&self) -> f64 {
        self.max_y_used
    }

    /// Visible y range, top to bottom in y units: `(bottom, top)`
    pub fn y_range(&self) -> (f64, f64) {
        ((self.max_y_used + Y_PADDING).max(MIN_Y_RANGE), -Y_PADDING)
    }

    /// Earliest and latest ordinal of every event placed so far
    pub fn extent(&self) -> Option<(i64, i64)> {
        self.extent
    }

    pub fn bands(&self) -> &[TopicBand] {
        &self.bands
    }

    pub fn events(&self) -> &[PlacedEvent] {
        &self.events
    }

    /// Sets the visible x range; either bound defaults to the current one.
    ///
    /// Returns false, leaving the range unchanged, unless max is after min.
    pub fn fit_xaxis(&mut self, min: Option<i64>, max: Option<i64>) -> bool {
        let earliest = min.unwrap_or(self.mindate);
        let latest = max.unwrap_or(self.maxdate);
        let fitted = latest > earliest;
        if fitted {
            self.mindate = earliest;
            self.maxdate = latest;
        }
        fitted
    }

    pub fn fit_to_data(&mut self) -> bool {
        match self.extent {
            Some((earliest, latest)) => self.fit_xaxis(Some(earliest), Some(latest)),
            None => false,
        }
    }

    /// Adds a topic below those already on the chart.
    ///
    /// Returns true if any of its events were drawn.
    pub fn add_topic(&mut self, topic: &Topic, opts: &TopicOptions) -> Result<bool> {
        let study = match (&opts.study_range_start, &opts.study_range_end) {
            (Some(start), Some(end)) => {
                let resolver = &self.resolver;
                let start = resolve_setting(resolver, "study_range_start", Some(start.as_str()))?;
                let end = resolve_setting(resolver, "study_range_end", Some(end.as_str()))?;
                start.zip(end)
            }
            _ => None,
        };

        let shown: Vec<_> = topic
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| !event.rank.is_some_and(|rank| rank > opts.max_rank))
            .map(|(i, event)| (i + 2, event))
            .collect();

        // one key column for the whole topic: hdate if any event has it
        let by_start = shown.iter().any(|(_, e)| e.hdate.is_some());
        let key_column = if by_start { "hdate" } else { "hdate_birth" };
        let mut rows = Vec::with_capacity(shown.len());
        for (row, event) in shown {
            let text = if by_start {
                event.hdate.as_deref()
            } else {
                event.hdate_birth.as_deref()
            };
            let key = match text {
                Some(text) => self.mid_of(text, row, key_column)?,
                None => None,
            };
            rows.push((key, row, event));
        }
        // no key last, otherwise ascending; stable
        rows.sort_by_key(|&(key, _, _)| (key.is_none(), key));

        let mut lo = LaneOrganizer::with_spacing(LaneSpacing::for_range_days(
            self.initial_range_days,
        ))?;
        debug!(
            "'{}': sorted by {}, {:.1} days per label char",
            topic.title,
            key_column,
            lo.spacing().days_per_label_char
        );
        let mut colors = ColorGen::new();
        let ystart = self.max_y_used;
        let mut added = 0;

        let split_lives = opts.lives_first && rows.iter().any(|(_, _, e)| e.hdate_birth.is_some());
        if split_lives {
            let mut lives = Vec::new();
            let mut rest = Vec::new();
            for (_, row, event) in rows {
                match event.hdate_birth.as_deref() {
                    Some(text) => match self.mid_of(text, row, "hdate_birth")? {
                        Some(birth) => lives.push((birth, row, event)),
                        None => rest.push((row, event)),
                    },
                    None => rest.push((row, event)),
                }
            }
            lives.sort_by_key(|&(birth, _, _)| birth);
            debug!(
                "'{}': {} lives placed before {} other events",
                topic.title,
                lives.len(),
                rest.len()
            );

            for (_, row, event) in lives {
                added += self.place_event(event, row, opts, study, ystart, &mut lo, &mut colors)? as usize;
            }
            lo.restart();
            for (row, event) in rest {
                added += self.place_event(event, row, opts, study, ystart, &mut lo, &mut colors)? as usize;
            }
        } else {
            for (_, row, event) in rows {
                added += self.place_event(event, row, opts, study, ystart, &mut lo, &mut colors)? as usize;
            }
        }

        if added > 0 {
            self.max_y_used += (lo.lane_count() + TOPIC_MARGIN_ROWS) as f64 * opts.row_spacing;
            self.bands.push(TopicBand {
                title: topic.title.clone(),
                min_y: ystart,
                max_y: self.max_y_used,
            });
            info!(
                "Topic '{}': {} events on {} lanes",
                topic.title,
                added,
                lo.lane_count()
            );
        } else {
            warn!("Topic '{}': no events to show", topic.title);
        }

        if let Ok((earliest, latest)) = lo.extent() {
            self.extent = Some(match self.extent {
                Some((lo_ord, hi_ord)) => (lo_ord.min(earliest), hi_ord.max(latest)),
                None => (earliest, latest),
            });
        }

        Ok(added > 0)
    }

    fn mid_of(&self, text: &str, row: usize, column: &str) -> Result<Option<i64>> {
        self.resolver
            .to_ordinal(text)
            .map_err(|e| e.at(row, column))
    }

    fn resolve_dates(&self, event: &EventRecord, row: usize, opts: &TopicOptions) -> Result<EventDates> {
        let get = |text: Option<&str>, column: &str, missing_as_ongoing: bool| match text {
            Some(text) => self
                .resolver
                .resolve(text, missing_as_ongoing)
                .map_err(|e| e.at(row, column)),
            None if missing_as_ongoing => self.resolver.resolve("", true),
            None => Ok(None),
        };

        let start = get(event.hdate.as_deref(), "hdate", false)?;
        let end = get(event.hdate_end.as_deref(), "hdate_end", false)?;
        let (birth, death) = if opts.show_birth_and_death {
            let birth = get(event.hdate_birth.as_deref(), "hdate_birth", false)?;
            let death = get(event.hdate_death.as_deref(), "hdate_death", birth.is_some())?;
            (birth, death)
        } else {
            (None, None)
        };
        Ok(EventDates {
            start,
            end,
            birth,
            death,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn place_event(
        &mut self,
        event: &EventRecord,
        row: usize,
        opts: &TopicOptions,
        study: Option<(i64, i64)>,
        ystart: f64,
        lo: &mut LaneOrganizer,
        colors: &mut ColorGen,
    ) -> Result<bool> {
        let color = match event.color.as_deref() {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => colors.next().unwrap_or("#000000").to_string(),
        };

        let dates = self.resolve_dates(event, row, opts)?;
        let spans = [dates.start, dates.end, dates.birth, dates.death];
        let Some((earliest, latest)) = spans
            .iter()
            .flatten()
            .fold(None, |acc: Option<(i64, i64)>, span| {
                Some(match acc {
                    Some((first, last)) => (first.min(span.earliest), last.max(span.latest)),
                    None => (span.earliest, span.latest),
                })
            })
        else {
            debug!("row {}: '{}' has no dates, skipped", row, event.label);
            return Ok(false);
        };

        if let Some((study_start, study_end)) = study
            && (latest < study_start || earliest > study_end)
        {
            return Ok(false);
        }

        let label_date = match (dates.start, dates.end, dates.birth, dates.death) {
            (Some(start), Some(end), _, _) => start.mid + (end.mid - start.mid) / 2,
            (Some(start), None, _, _) => start.mid,
            (None, _, Some(birth), Some(death)) => birth.mid + (death.mid - birth.mid) / 2,
            (None, _, Some(birth), None) => birth.mid,
            _ => return Ok(false),
        };

        let label_text = if opts.show_label { event.label.as_str() } else { "" };
        let lane = lo.place(earliest, latest, label_date, label_text)?;
        let y = ystart + (lane + 1) as f64 * opts.row_spacing;

        let mut placed = PlacedEvent {
            label: event.label.clone(),
            show_label: opts.show_label,
            lane,
            y,
            earliest,
            latest,
            label_date,
            color,
            url: event.url.clone().filter(|u| !u.is_empty()),
            segments: Vec::new(),
            markers: Vec::new(),
        };
        self.add_main_parts(&mut placed, event, &dates);
        if opts.show_birth_and_death {
            self.add_life_parts(&mut placed, event, &dates, label_date);
        }
        self.events.push(placed);
        Ok(true)
    }

    fn add_main_parts(&self, placed: &mut PlacedEvent, event: &EventRecord, dates: &EventDates) {
        let Some(start) = dates.start else {
            return;
        };
        let precision = self.hover_precision;
        let text = non_empty(event.description.as_deref()).unwrap_or(event.label.as_str());
        let text_end = non_empty(event.htext_end.as_deref()).unwrap_or(text);

        let start_text = format_span(&start, precision);
        let (hover, hover_end) = match dates.end {
            Some(end) if end.ongoing => (format!("{} ({}...)", text, start_text), None),
            Some(end) => {
                let hover = format!("{} ({}-{})", text, start_text, format_span(&end, precision));
                let hover_end = (text_end != text).then(|| {
                    format!("{} ({})", text_end, format_span(&end, HoverPrecision::Day))
                });
                (hover, hover_end)
            }
            None => (format!("{} ({})", text, start_text), None),
        };

        placed.segments.push(Segment {
            start: start.earliest,
            end: start.latest,
            style: SegmentStyle::Thin,
            hover: hover.clone(),
        });
        placed.markers.push(Marker {
            at: start.mid,
            kind: MarkerKind::Dot,
            hover: hover.clone(),
        });

        if let Some(end) = dates.end {
            let end_hover = hover_end.unwrap_or_else(|| hover.clone());
            placed.segments.push(Segment {
                start: start.latest,
                end: end.earliest,
                style: SegmentStyle::Solid,
                hover: hover.clone(),
            });
            placed.segments.push(Segment {
                start: end.earliest,
                end: end.latest,
                style: SegmentStyle::Thin,
                hover: end_hover.clone(),
            });
            placed.markers.push(if end.ongoing {
                Marker {
                    at: end.latest,
                    kind: MarkerKind::Arrow,
                    hover,
                }
            } else {
                Marker {
                    at: end.mid,
                    kind: MarkerKind::Dot,
                    hover: end_hover,
                }
            });
        }
    }

    fn add_life_parts(
        &self,
        placed: &mut PlacedEvent,
        event: &EventRecord,
        dates: &EventDates,
        label_date: i64,
    ) {
        let precision = self.hover_precision;
        let text = non_empty(event.description.as_deref()).unwrap_or(event.label.as_str());

        if let Some(birth) = dates.birth {
            let hover = format!("{} (b. {})", text, format_span(&birth, precision));
            let endpoint = dates.start.map_or(label_date, |start| start.earliest);
            placed.segments.push(Segment {
                start: birth.latest,
                end: endpoint,
                style: SegmentStyle::Dotted,
                hover: hover.clone(),
            });
            if birth.earliest < birth.latest {
                placed.segments.push(Segment {
                    start: birth.earliest,
                    end: birth.latest,
                    style: SegmentStyle::DottedThin,
                    hover,
                });
            }
        }

        if let Some(death) = dates.death {
            let alive = death.ongoing;
            let hover = match dates.birth {
                Some(birth) if alive => format!("{} (b. {})", text, format_span(&birth, precision)),
                Some(birth) => match age_years(birth.mid, death.mid) {
                    Some(age) => format!(
                        "{} (d. {} aged {})",
                        text,
                        format_span(&death, precision),
                        age
                    ),
                    None => format!("{} (d. {})", text, format_span(&death, precision)),
                },
                None => format!("{} (d. {})", text, format_span(&death, precision)),
            };
            let startpoint = dates
                .end
                .or(dates.start)
                .map_or(label_date, |span| span.latest);

            placed.segments.push(Segment {
                start: startpoint,
                end: death.earliest,
                style: SegmentStyle::Dotted,
                hover: hover.clone(),
            });
            if death.earliest < death.latest {
                placed.segments.push(Segment {
                    start: startpoint.max(death.earliest),
                    end: death.latest,
                    style: SegmentStyle::DottedThin,
                    hover: hover.clone(),
                });
            }
            if alive && death.latest > startpoint {
                placed.markers.push(Marker {
                    at: death.latest,
                    kind: MarkerKind::Arrow,
                    hover,
                });
            }
        }
    }

    /// Axis text for an ordinal in the chart's x mode
    pub fn axis_label(&self, ordinal: i64) -> String {
        match self.xmode {
            XMode::Date => format_ordinal(ordinal, HoverPrecision::Year),
            XMode::Years => format!("{:.0}", crate::dates::to_years(ordinal).floor()),
        }
    }
}

/// Resolves a date given as a chart setting; parse failures name the setting.
fn resolve_setting(resolver: &DateResolver, name: &str, text: Option<&str>) -> Result<Option<i64>> {
    match text {
        Some(text) => resolver.to_ordinal(text).map_err(|e| match e {
            TimelineError::DateParse { value, .. } => {
                TimelineError::Config(format!("{} is not a date: '{}'", name, value))
            }
            other => other,
        }),
        None => Ok(None),
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}
