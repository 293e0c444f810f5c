//! motion3.json curve segments.
//!
//! A curve's `Segments` array is a flat list: the first point `(t, v)`,
//! followed by any number of `type, ...points` groups where each group ends
//! at a new point that becomes the start of the next one.

use crate::errors::{Result, WidgetError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Linear,
    Bezier,
    Stepped,
    InverseStepped,
}

impl SegmentKind {
    fn from_code(code: f32) -> Option<Self> {
        match code as i32 {
            0 => Some(SegmentKind::Linear),
            1 => Some(SegmentKind::Bezier),
            2 => Some(SegmentKind::Stepped),
            3 => Some(SegmentKind::InverseStepped),
            _ => None,
        }
    }

    /// Points stored after the segment's start point.
    fn point_count(self) -> usize {
        match self {
            SegmentKind::Bezier => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Index of the segment's start point in the curve's point list.
    pub base_point: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentCurve {
    points: Vec<CurvePoint>,
    segments: Vec<Segment>,
    /// End time of each segment, for binary search.
    end_times: Vec<f32>,
}

impl SegmentCurve {
    /// Decodes the flat `Segments` array of a motion3.json curve.
    pub fn parse(raw: &[f32]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(invalid("curve has no start point"));
        }

        let mut points = vec![CurvePoint {
            time: raw[0],
            value: raw[1],
        }];
        let mut segments = Vec::new();
        let mut end_times = Vec::new();

        let mut i = 2;
        while i < raw.len() {
            let kind = SegmentKind::from_code(raw[i])
                .ok_or_else(|| invalid(&format!("unknown segment type {}", raw[i])))?;
            let count = kind.point_count();
            let end = i + 1 + count * 2;
            if end > raw.len() {
                return Err(invalid("segment data truncated"));
            }

            segments.push(Segment {
                kind,
                base_point: points.len() - 1,
            });
            for pair in raw[i + 1..end].chunks_exact(2) {
                points.push(CurvePoint {
                    time: pair[0],
                    value: pair[1],
                });
            }
            end_times.push(points[points.len() - 1].time);
            i = end;
        }

        Ok(Self {
            points,
            segments,
            end_times,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Samples the curve at `time`, holding the end values outside its range.
    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        let first = self.points[0];
        if self.segments.is_empty() || time <= first.time {
            return first.value;
        }

        // First segment whose end lies beyond `time`.
        let index = self.end_times.partition_point(|&end| end <= time);
        let Some(segment) = self.segments.get(index) else {
            return self.points[self.points.len() - 1].value;
        };

        let p = &self.points[segment.base_point..];
        match segment.kind {
            SegmentKind::Linear => {
                let t = fraction(p[0].time, p[1].time, time);
                p[0].value + (p[1].value - p[0].value) * t
            }
            SegmentKind::Bezier => {
                let t = fraction(p[0].time, p[3].time, time);
                bezier(p[0].value, p[1].value, p[2].value, p[3].value, t)
            }
            SegmentKind::Stepped => p[0].value,
            SegmentKind::InverseStepped => p[1].value,
        }
    }
}

fn fraction(t0: f32, t1: f32, time: f32) -> f32 {
    let dt = t1 - t0;
    if dt > 1e-6 {
        ((time - t0) / dt).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let lerp = |a: f32, b: f32| a + (b - a) * t;
    let p01 = lerp(p0, p1);
    let p12 = lerp(p1, p2);
    let p23 = lerp(p2, p3);
    let p012 = lerp(p01, p12);
    let p123 = lerp(p12, p23);
    lerp(p012, p123)
}

fn invalid(reason: &str) -> WidgetError {
    WidgetError::InvalidAsset {
        path: "motion3.json".into(),
        reason: reason.into(),
    }
}
