//! Toolpath assembly.
//!
//! Merges tessellated curves, in cut order, into a motion program with one
//! section per non-empty layer role. Each entry is entered with a rapid move
//! to its start point and wrapped in laser on/off markers.

use lasercam_core::{CurveKind, CurveObject, GeometryError, LayerRole, ObjectId, Point};
use tracing::warn;

use crate::segment::Segment;
use crate::tessellate::Tessellation;

/// One curve's motion, tagged with its layer and position in the cut order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolpathEntry {
    pub object: ObjectId,
    /// Arena index of the curve
    pub index: usize,
    pub layer: LayerRole,
    pub kind: CurveKind,
    pub closed: bool,
    /// Position in the cut order across both layers
    pub sequence: usize,
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl ToolpathEntry {
    pub fn end(&self) -> Point {
        self.segments.last().map(|s| s.end()).unwrap_or(self.start)
    }

    /// Cut length, arcs measured along the curve.
    pub fn cut_length(&self) -> f64 {
        let mut pos = self.start;
        let mut total = 0.0;
        for segment in &self.segments {
            total += segment.length_from(&pos);
            pos = segment.end();
        }
        total
    }
}

/// A program step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Move(Segment),
    LaserOn,
    LaserOff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSection {
    pub layer: LayerRole,
    pub instructions: Vec<Instruction>,
}

/// Complete motion program, engrave section first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionProgram {
    pub sections: Vec<ProgramSection>,
}

impl MotionProgram {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, layer: LayerRole) -> Option<&ProgramSection> {
        self.sections.iter().find(|s| s.layer == layer)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.sections.iter().flat_map(|s| s.instructions.iter())
    }
}

/// A curve left out of the program
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub object: ObjectId,
    pub index: usize,
    pub layer: LayerRole,
    pub error: GeometryError,
}

/// Result of [`ToolpathBuilder::build`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolpath {
    /// Entries in emission order
    pub entries: Vec<ToolpathEntry>,
    pub program: MotionProgram,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone)]
pub struct ToolpathBuilder {
    tolerance: f64,
    entries: Vec<ToolpathEntry>,
    skipped: Vec<SkippedEntry>,
}

impl ToolpathBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Append the next curve in cut order.
    ///
    /// A curve marked closed whose path does not return to its start is
    /// excluded and recorded as skipped.
    pub fn push(
        &mut self,
        index: usize,
        object: &CurveObject,
        tessellation: Tessellation,
    ) -> Result<(), GeometryError> {
        if object.closed && !tessellation.is_closed(self.tolerance) {
            let error = GeometryError::ClosureMismatch {
                object: object.id.to_string(),
                gap: tessellation.closure_gap(),
            };
            warn!("Skipping curve {}: {}", object.id, error);
            self.skip(index, object, error.clone());
            return Err(error);
        }

        self.entries.push(ToolpathEntry {
            object: object.id,
            index,
            layer: object.layer,
            kind: object.kind(),
            closed: object.closed,
            sequence: 0,
            start: tessellation.start,
            segments: tessellation.segments,
        });
        Ok(())
    }

    /// Record a curve that never produced a tessellation.
    pub fn skip(&mut self, index: usize, object: &CurveObject, error: GeometryError) {
        self.skipped.push(SkippedEntry {
            object: object.id,
            index,
            layer: object.layer,
            error,
        });
    }

    pub fn entries(&self) -> &[ToolpathEntry] {
        &self.entries
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Group entries by layer role and emit the program.
    pub fn build(self) -> Toolpath {
        let mut ordered = Vec::with_capacity(self.entries.len());
        let mut sections = Vec::new();

        for role in LayerRole::ALL {
            let mut instructions = Vec::new();
            for entry in self.entries.iter().filter(|e| e.layer == role) {
                instructions.push(Instruction::Move(Segment::Rapid { to: entry.start }));
                instructions.push(Instruction::LaserOn);
                instructions.extend(entry.segments.iter().copied().map(Instruction::Move));
                instructions.push(Instruction::LaserOff);

                let mut entry = entry.clone();
                entry.sequence = ordered.len();
                ordered.push(entry);
            }
            if !instructions.is_empty() {
                sections.push(ProgramSection {
                    layer: role,
                    instructions,
                });
            }
        }

        Toolpath {
            entries: ordered,
            program: MotionProgram { sections },
            skipped: self.skipped,
        }
    }
}
