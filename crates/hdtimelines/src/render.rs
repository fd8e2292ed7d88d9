//! SVG output for a [`Chart`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::chart::{Chart, MarkerKind, PlacedEvent, SegmentStyle};
use crate::config::RenderConfig;
use crate::dates::{date_to_ordinal, ordinal_to_date};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use log::debug;

/// Year steps tried for axis ticks, smallest first
const TICK_STEPS: [i32; 14] = [1, 2, 5, 10, 20, 25, 50, 100, 200, 250, 500, 1000, 2000, 5000];
const TARGET_TICKS: i64 = 10;

/// XML escape for SVG text and attributes
pub fn html_encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Ordinal/y-unit to pixel mapping
struct Frame {
    min_ord: f64,
    px_per_day: f64,
    left: f64,
    top: f64,
    y_top: f64,
    y_unit_px: f64,
}

impl Frame {
    fn x(&self, ordinal: i64) -> f64 {
        self.left + (ordinal as f64 - self.min_ord) * self.px_per_day
    }

    fn y(&self, y: f64) -> f64 {
        self.top + (y - self.y_top) * self.y_unit_px
    }
}

pub fn save_svg<P: AsRef<Path>>(chart: &Chart, opt: &RenderConfig, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut f = BufWriter::new(file);
    render_svg(chart, opt, &mut f)?;
    f.flush()?;
    Ok(())
}

pub fn render_svg<W: Write>(chart: &Chart, opt: &RenderConfig, w: &mut W) -> Result<()> {
    let (min_ord, max_ord) = chart.x_range();
    let (y_bottom, y_top) = chart.y_range();
    let m = opt.margin_px;
    let plot_w = opt.width_px - 2.0 * m;
    let plot_h = (y_bottom - y_top) * opt.y_unit_px;
    let width = opt.width_px;
    let height = plot_h + opt.axis_height_px + 2.0 * m;

    let frame = Frame {
        min_ord: min_ord as f64,
        px_per_day: plot_w / (max_ord - min_ord) as f64,
        left: m,
        top: m + opt.axis_height_px,
        y_top,
        y_unit_px: opt.y_unit_px,
    };

    writeln!(
        w,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" font-family="Arial, sans-serif">"##,
        width, height, width, height
    )?;
    writeln!(w, r##"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="white"/>"##, width, height)?;
    if !chart.title().is_empty() {
        writeln!(w, "<title>{}</title>", html_encode(chart.title()))?;
    }
    writeln!(
        w,
        r##"<defs><clipPath id="plot"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"##,
        frame.left, frame.top, plot_w, plot_h
    )?;

    render_axis(w, chart, opt, &frame, plot_w, plot_h)?;

    writeln!(w, r##"<g clip-path="url(#plot)">"##)?;
    for event in chart.events() {
        render_event(w, event, opt, &frame)?;
    }
    writeln!(w, "</g>")?;

    for band in chart.bands() {
        if band.title.is_empty() {
            continue;
        }
        writeln!(
            w,
            r##"<text x="{:.2}" y="{:.2}" font-size="14px" font-weight="bold" dominant-baseline="middle" fill="#222">{}</text>"##,
            frame.left + 0.02 * plot_w,
            frame.y(band.min_y),
            html_encode(&band.title)
        )?;
    }

    writeln!(w, "</svg>")?;
    debug!(
        "rendered {} events in {} bands, {:.0}x{:.0}px",
        chart.events().len(),
        chart.bands().len(),
        width,
        height
    );
    Ok(())
}

fn render_axis<W: Write>(
    w: &mut W,
    chart: &Chart,
    opt: &RenderConfig,
    frame: &Frame,
    plot_w: f64,
    plot_h: f64,
) -> Result<()> {
    let (min_ord, max_ord) = chart.x_range();
    let axis_y = frame.top;

    writeln!(
        w,
        r##"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="#444" stroke-width="1"/>"##,
        frame.left,
        axis_y,
        frame.left + plot_w,
        axis_y
    )?;

    for tick in axis_ticks(min_ord, max_ord) {
        let x = frame.x(tick);
        writeln!(
            w,
            r##"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="#e5e5e5" stroke-width="1"/>"##,
            x,
            axis_y,
            x,
            axis_y + plot_h
        )?;
        writeln!(
            w,
            r##"<text x="{:.2}" y="{:.2}" font-size="{:.1}px" text-anchor="middle" fill="#444">{}</text>"##,
            x,
            axis_y - 6.0,
            opt.font_size_px,
            html_encode(&chart.axis_label(tick))
        )?;
    }
    Ok(())
}

fn render_event<W: Write>(w: &mut W, event: &PlacedEvent, opt: &RenderConfig, frame: &Frame) -> Result<()> {
    let y = frame.y(event.y);

    for seg in &event.segments {
        if seg.end < seg.start {
            continue;
        }
        let (width, dash) = match seg.style {
            SegmentStyle::Solid => (3.0, ""),
            SegmentStyle::Thin => (1.0, ""),
            SegmentStyle::Dotted => (2.0, r##" stroke-dasharray="2,3""##),
            SegmentStyle::DottedThin => (1.0, r##" stroke-dasharray="2,3""##),
        };
        writeln!(
            w,
            r##"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.1}"{}><title>{}</title></line>"##,
            frame.x(seg.start),
            y,
            frame.x(seg.end),
            y,
            html_encode(&event.color),
            width,
            dash,
            html_encode(&seg.hover)
        )?;
    }

    for marker in &event.markers {
        let x = frame.x(marker.at);
        match marker.kind {
            MarkerKind::Dot => writeln!(
                w,
                r##"<circle cx="{:.2}" cy="{:.2}" r="4.0" fill="{}"><title>{}</title></circle>"##,
                x,
                y,
                html_encode(&event.color),
                html_encode(&marker.hover)
            )?,
            MarkerKind::Arrow => writeln!(
                w,
                r##"<path d="M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} Z" fill="{}"><title>{}</title></path>"##,
                x - 4.0,
                y - 5.0,
                x + 5.0,
                y,
                x - 4.0,
                y + 5.0,
                html_encode(&event.color),
                html_encode(&marker.hover)
            )?,
        }
    }

    if event.show_label {
        let text = format!(
            r##"<text x="{:.2}" y="{:.2}" font-size="{:.1}px" fill="#222">{}</text>"##,
            frame.x(event.label_date),
            y - 6.0,
            opt.font_size_px,
            html_encode(&event.label)
        );
        match &event.url {
            Some(url) => writeln!(w, r##"<a href="{}">{}</a>"##, html_encode(url), text)?,
            None => writeln!(w, "{}", text)?,
        }
    }
    Ok(())
}

/// Jan 1 ordinals at a round year step covering `[min, max]`
pub fn axis_ticks(min: i64, max: i64) -> Vec<i64> {
    let (Some(first), Some(last)) = (ordinal_to_date(min), ordinal_to_date(max)) else {
        return Vec::new();
    };
    let span_years = i64::from(last.year() - first.year()).max(1);
    let step = TICK_STEPS
        .iter()
        .copied()
        .find(|&s| span_years / i64::from(s) <= TARGET_TICKS)
        .unwrap_or(TICK_STEPS[TICK_STEPS.len() - 1]);

    let mut year = first.year().div_euclid(step) * step;
    let mut ticks = Vec::new();
    while year <= last.year() {
        if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
            let ordinal = date_to_ordinal(date);
            if ordinal >= min && ordinal <= max {
                ticks.push(ordinal);
            }
        }
        year += step;
    }
    ticks
}
