//! Run time estimation.
//!
//! Cut moves are timed at the layer feed rate, rapid moves at the profile
//! slew speed. Arcs count their true length. Speeds are mm/s and times are
//! seconds. The result is advisory.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use lasercam_core::{LayerRole, MaterialProfile, Point};
use serde::Serialize;

use crate::segment::Segment;
use crate::toolpath::{Instruction, MotionProgram, ToolpathEntry};

/// Distances and times for part of a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeEstimate {
    /// mm travelled with the laser on
    pub cut_length: f64,
    /// mm travelled by rapid moves
    pub slew_length: f64,
    /// seconds
    pub cut_time: f64,
    /// seconds
    pub slew_time: f64,
}

impl TimeEstimate {
    pub fn total_seconds(&self) -> f64 {
        self.cut_time + self.slew_time
    }
}

impl Add for TimeEstimate {
    type Output = TimeEstimate;

    fn add(self, rhs: TimeEstimate) -> TimeEstimate {
        TimeEstimate {
            cut_length: self.cut_length + rhs.cut_length,
            slew_length: self.slew_length + rhs.slew_length,
            cut_time: self.cut_time + rhs.cut_time,
            slew_time: self.slew_time + rhs.slew_time,
        }
    }
}

impl AddAssign for TimeEstimate {
    fn add_assign(&mut self, rhs: TimeEstimate) {
        *self = *self + rhs;
    }
}

impl Sum for TimeEstimate {
    fn sum<I: Iterator<Item = TimeEstimate>>(iter: I) -> TimeEstimate {
        iter.fold(TimeEstimate::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeEstimator {
    slew_speed: f64,
    engrave_feed: f64,
    cut_feed: f64,
    /// Multiplied into every time to compensate for acceleration
    factor: f64,
}

impl TimeEstimator {
    pub fn new(slew_speed: f64, engrave_feed: f64, cut_feed: f64, factor: f64) -> Self {
        Self {
            slew_speed,
            engrave_feed,
            cut_feed,
            factor,
        }
    }

    pub fn from_profile(profile: &MaterialProfile, factor: f64) -> Self {
        Self::new(
            profile.slew_speed,
            profile.engrave.feed_rate,
            profile.cut.feed_rate,
            factor,
        )
    }

    pub fn feed_rate(&self, layer: LayerRole) -> f64 {
        match layer {
            LayerRole::Engrave => self.engrave_feed,
            LayerRole::Cut => self.cut_feed,
        }
    }

    fn slew(&self, length: f64) -> TimeEstimate {
        TimeEstimate {
            slew_length: length,
            slew_time: length / self.slew_speed * self.factor,
            ..Default::default()
        }
    }

    fn cut(&self, length: f64, layer: LayerRole) -> TimeEstimate {
        TimeEstimate {
            cut_length: length,
            cut_time: length / self.feed_rate(layer) * self.factor,
            ..Default::default()
        }
    }

    /// Time for one entry entered from `from`: the bridging slew plus its cut.
    pub fn estimate_entry(&self, entry: &ToolpathEntry, from: Point) -> TimeEstimate {
        self.slew(from.distance_to(&entry.start)) + self.cut(entry.cut_length(), entry.layer)
    }

    /// Entries in order, starting from `origin`.
    pub fn estimate_entries(&self, entries: &[ToolpathEntry], origin: Point) -> TimeEstimate {
        let mut pos = origin;
        let mut total = TimeEstimate::default();
        for entry in entries {
            total += self.estimate_entry(entry, pos);
            pos = entry.end();
        }
        total
    }

    /// Walk a finished program, starting from `origin`.
    pub fn estimate_program(&self, program: &MotionProgram, origin: Point) -> TimeEstimate {
        let mut pos = origin;
        let mut total = TimeEstimate::default();
        for section in &program.sections {
            for instruction in &section.instructions {
                let Instruction::Move(segment) = instruction else {
                    continue;
                };
                let length = segment.length_from(&pos);
                total += match segment {
                    Segment::Rapid { .. } => self.slew(length),
                    _ => self.cut(length, section.layer),
                };
                pos = segment.end();
            }
        }
        total
    }
}

/// Format seconds as `h:mm:ss`, dropping fractions.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
