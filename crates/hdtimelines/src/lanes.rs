//! Lane assignment for timeline events.
//!
//! Events arrive one at a time in the caller's temporal order and are
//! packed first-fit onto horizontal lanes. A lane is busy up to the
//! rightmost day its content reaches, where a label counts as a fixed
//! number of days per character to the right of its anchor.

use crate::constants::{DAYS_PER_LABEL_CHAR_PER_YEAR, MIN_SPACING_DAYS_PER_YEAR};
use crate::error::{Result, TimelineError};
use log::{debug, trace};

/// Spacing scale for a [`LaneOrganizer`], in ordinal days
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSpacing {
    pub days_per_label_char: f64,
    pub min_spacing_days: f64,
}

impl LaneSpacing {
    /// Spacing for a chart whose initial view spans `range_days`.
    ///
    /// Scaling by the visible range keeps a label of a given length at a
    /// constant fraction of the initial view, whatever the absolute span.
    pub fn for_range_days(range_days: i64) -> Self {
        let range_years = range_days as f64 / 365.0;
        Self {
            days_per_label_char: DAYS_PER_LABEL_CHAR_PER_YEAR * range_years,
            min_spacing_days: MIN_SPACING_DAYS_PER_YEAR * range_years,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Lane {
    /// Max reach of anything ever placed here; never decreases
    reach: f64,
    /// Availability bound for the current sub-group; `None` once restarted
    busy_until: Option<f64>,
}

/// Online first-fit lane packer
#[derive(Debug, Clone)]
pub struct LaneOrganizer {
    spacing: LaneSpacing,
    lanes: Vec<Lane>,
    extent: Option<(i64, i64)>,
}

impl LaneOrganizer {
    pub fn new(days_per_label_char: f64, min_spacing_days: f64) -> Result<Self> {
        if !days_per_label_char.is_finite() || days_per_label_char <= 0.0 {
            return Err(TimelineError::Config(format!(
                "days_per_label_char must be positive, got {}",
                days_per_label_char
            )));
        }
        if !min_spacing_days.is_finite() || min_spacing_days < 0.0 {
            return Err(TimelineError::Config(format!(
                "min_spacing_days must not be negative, got {}",
                min_spacing_days
            )));
        }

        Ok(Self {
            spacing: LaneSpacing {
                days_per_label_char,
                min_spacing_days,
            },
            lanes: Vec::new(),
            extent: None,
        })
    }

    pub fn with_spacing(spacing: LaneSpacing) -> Result<Self> {
        Self::new(spacing.days_per_label_char, spacing.min_spacing_days)
    }

    pub fn spacing(&self) -> LaneSpacing {
        self.spacing
    }

    /// Places one event and returns its lane index.
    ///
    /// The event goes on the lowest lane whose current occupancy ends at
    /// least `min_spacing_days` before `earliest`; a new lane is opened when
    /// none qualifies.
    ///
    /// # Errors
    /// `InvalidRange` if `earliest > latest`.
    pub fn place(
        &mut self,
        earliest: i64,
        latest: i64,
        label_date: i64,
        label_text: &str,
    ) -> Result<usize> {
        if earliest > latest {
            return Err(TimelineError::InvalidRange { earliest, latest });
        }

        let label_days = label_text.chars().count() as f64 * self.spacing.days_per_label_char;
        let reach = (latest as f64).max(label_date as f64 + label_days);
        let left = earliest as f64;

        let free = self.lanes.iter().position(|lane| match lane.busy_until {
            Some(until) => until + self.spacing.min_spacing_days <= left,
            None => true,
        });

        let index = match free {
            Some(i) => i,
            None => {
                self.lanes.push(Lane {
                    reach: f64::NEG_INFINITY,
                    busy_until: None,
                });
                debug!(
                    "opened lane {} for span {}..{}",
                    self.lanes.len() - 1,
                    earliest,
                    latest
                );
                self.lanes.len() - 1
            }
        };

        let lane = &mut self.lanes[index];
        lane.reach = lane.reach.max(reach);
        lane.busy_until = Some(lane.busy_until.map_or(reach, |until| until.max(reach)));
        trace!("lane {} busy until {}", index, reach);

        self.extent = Some(match self.extent {
            Some((lo, hi)) => (lo.min(earliest), hi.max(latest)),
            None => (earliest, latest),
        });

        Ok(index)
    }

    /// Makes every existing lane available again for the next sub-group.
    ///
    /// Lane count, recorded reach and extent are kept.
    pub fn restart(&mut self) {
        for lane in &mut self.lanes {
            lane.busy_until = None;
        }
        debug!("restarted lane scan over {} lanes", self.lanes.len());
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// `(earliest, latest)` over every event ever placed
    pub fn extent(&self) -> Result<(i64, i64)> {
        self.extent.ok_or(TimelineError::EmptyExtent)
    }

    /// Rightmost day reached by anything placed on lane `index`, across restarts
    pub fn lane_reach(&self, index: usize) -> Option<f64> {
        self.lanes.get(index).map(|lane| lane.reach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer(per_char: f64, spacing: f64) -> LaneOrganizer {
        LaneOrganizer::new(per_char, spacing).unwrap()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            LaneOrganizer::new(-1.0, 0.0),
            Err(TimelineError::Config(_))
        ));
        assert!(matches!(
            LaneOrganizer::new(0.0, 0.0),
            Err(TimelineError::Config(_))
        ));
        assert!(matches!(
            LaneOrganizer::new(1.0, -0.5),
            Err(TimelineError::Config(_))
        ));
        assert!(matches!(
            LaneOrganizer::new(f64::NAN, 0.0),
            Err(TimelineError::Config(_))
        ));
        assert!(LaneOrganizer::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut lo = organizer(1.0, 0.0);
        let err = lo.place(10, 5, 7, "x").unwrap_err();
        assert!(matches!(
            err,
            TimelineError::InvalidRange {
                earliest: 10,
                latest: 5
            }
        ));
        assert_eq!(lo.lane_count(), 0);
        assert!(lo.extent().is_err());
    }

    #[test]
    fn test_extent_before_any_placement() {
        let lo = organizer(1.0, 0.0);
        assert!(matches!(lo.extent(), Err(TimelineError::EmptyExtent)));
    }

    #[test]
    fn test_label_beyond_span_sets_reach() {
        let mut lo = organizer(2.0, 1.0);

        assert_eq!(lo.place(0, 10, 8, "AB").unwrap(), 0);
        assert_eq!(lo.lane_reach(0), Some(12.0));

        // 11 < 12 + 1
        assert_eq!(lo.place(11, 20, 15, "").unwrap(), 1);
        assert_eq!(lo.lane_reach(0), Some(12.0));
        assert_eq!(lo.lane_reach(1), Some(20.0));

        // 13 >= 12 + 1
        assert_eq!(lo.place(13, 14, 13, "").unwrap(), 0);
        assert_eq!(lo.lane_reach(0), Some(14.0));
        assert_eq!(lo.lane_reach(1), Some(20.0));
        assert_eq!(lo.lane_count(), 2);
    }

    #[test]
    fn test_span_end_dominates_short_label() {
        let mut lo = organizer(2.0, 1.0);
        lo.place(0, 10, 5, "AB").unwrap();
        assert_eq!(lo.lane_reach(0), Some(10.0));

        // exactly min_spacing after the span end
        assert_eq!(lo.place(11, 20, 15, "").unwrap(), 0);
    }

    #[test]
    fn test_disjoint_events_share_lane_zero() {
        let mut lo = organizer(1.0, 2.0);
        for i in 0..20 {
            let start = i * 100;
            assert_eq!(lo.place(start, start + 50, start + 10, "label").unwrap(), 0);
        }
        assert_eq!(lo.lane_count(), 1);
    }

    #[test]
    fn test_first_fit_prefers_lowest_lane() {
        let mut lo = organizer(1.0, 0.0);
        assert_eq!(lo.place(0, 100, 0, "").unwrap(), 0);
        assert_eq!(lo.place(10, 20, 10, "").unwrap(), 1);
        assert_eq!(lo.place(15, 30, 15, "").unwrap(), 2);
        // lanes 1 and 2 are both free; lowest wins
        assert_eq!(lo.place(40, 50, 40, "").unwrap(), 1);
        assert_eq!(lo.place(45, 50, 45, "").unwrap(), 2);
        assert_eq!(lo.lane_count(), 3);
    }

    #[test]
    fn test_placements_never_collide() {
        let mut lo = organizer(3.0, 5.0);
        let events: Vec<(i64, i64, i64, &str)> = vec![
            (0, 40, 20, "Alpha"),
            (10, 15, 12, ""),
            (30, 90, 60, "Beta"),
            (41, 60, 50, "Gamma"),
            (70, 71, 70, "Delta epsilon"),
            (95, 120, 100, ""),
            (100, 101, 100, "Z"),
            (130, 200, 150, "Long label text"),
        ];

        let mut placed: Vec<(usize, f64, f64)> = Vec::new();
        for &(earliest, latest, label_date, text) in &events {
            let lane = lo.place(earliest, latest, label_date, text).unwrap();
            let reach = (latest as f64).max(label_date as f64 + text.chars().count() as f64 * 3.0);
            for &(other_lane, _, other_reach) in &placed {
                if other_lane == lane {
                    assert!(earliest as f64 >= other_reach + 5.0);
                }
            }
            placed.push((lane, earliest as f64, reach));
        }
    }

    #[test]
    fn test_lane_count_is_monotonic() {
        let mut lo = organizer(1.0, 1.0);
        let mut last = 0;
        for (i, &(e, l)) in [(0, 10), (5, 8), (6, 30), (40, 41), (2, 3)].iter().enumerate() {
            lo.place(e, l, e, "").unwrap();
            assert!(lo.lane_count() >= last);
            last = lo.lane_count();
            if i == 2 {
                lo.restart();
                assert_eq!(lo.lane_count(), last);
            }
        }
    }

    #[test]
    fn test_extent_tracks_all_placements() {
        let mut lo = organizer(1.0, 0.0);
        lo.place(50, 60, 55, "").unwrap();
        lo.place(-20, 10, 0, "").unwrap();
        lo.restart();
        lo.place(70, 300, 100, "label").unwrap();
        assert_eq!(lo.extent().unwrap(), (-20, 300));
    }

    #[test]
    fn test_restart_reuses_lane_zero() {
        let mut lo = organizer(1.0, 1.0);
        assert_eq!(lo.place(0, 100, 50, "first").unwrap(), 0);
        lo.restart();
        assert_eq!(lo.place(10, 20, 15, "").unwrap(), 0);
        assert_eq!(lo.lane_count(), 1);
    }

    #[test]
    fn test_restart_keeps_max_reach() {
        let mut lo = organizer(1.0, 0.0);
        lo.place(0, 100, 0, "").unwrap();
        lo.restart();
        lo.place(10, 20, 10, "").unwrap();
        // the shorter second-group event does not lower the recorded reach
        assert_eq!(lo.lane_reach(0), Some(100.0));

        // but availability is judged on the second group only
        assert_eq!(lo.place(21, 30, 21, "").unwrap(), 0);
        assert_eq!(lo.lane_reach(0), Some(100.0));
    }

    #[test]
    fn test_restart_then_overflow_creates_lane() {
        let mut lo = organizer(1.0, 0.0);
        lo.place(0, 100, 0, "").unwrap();
        lo.place(10, 100, 10, "").unwrap();
        lo.restart();
        assert_eq!(lo.place(0, 50, 0, "").unwrap(), 0);
        assert_eq!(lo.place(0, 50, 0, "").unwrap(), 1);
        assert_eq!(lo.place(0, 50, 0, "").unwrap(), 2);
        assert_eq!(lo.lane_count(), 3);
    }

    #[test]
    fn test_label_width_counts_chars() {
        let mut lo = organizer(10.0, 0.0);
        lo.place(0, 0, 0, "Brontë").unwrap();
        assert_eq!(lo.lane_reach(0), Some(60.0));
    }

    #[test]
    fn test_spacing_for_range() {
        let spacing = LaneSpacing::for_range_days(3650);
        assert!((spacing.days_per_label_char - 27.5).abs() < 1e-9);
        assert!((spacing.min_spacing_days - 5.0).abs() < 1e-9);

        let lo = LaneOrganizer::with_spacing(spacing).unwrap();
        assert_eq!(lo.spacing(), spacing);
        assert!(LaneOrganizer::with_spacing(LaneSpacing::for_range_days(0)).is_err());
    }
}
