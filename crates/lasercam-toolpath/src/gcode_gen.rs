//! G-code generation from motion programs.
//!
//! Output layout:
//!
//! ```text
//! (                       summary comment block, optional
//! ...
//! )
//! (Startup commands)
//! <profile header>
//! G00 COriginalFilename-<document>
//! G00 CLaserProfile-<material>
//! G00 CTimeEstimate-<h:mm:ss>
//! (Engraving commands)    one block per non-empty layer
//! G97 S<power>
//! G98 P265 E<pulse>
//! G01 F<feed>
//! G00 X.. Y..
//! M12
//! G01 / G02 / G03 ...
//! M22
//! (Shutdown commands)
//! <profile footer>
//! ```

use lasercam_core::{format_fixed, MaterialProfile, Point};

use crate::estimate::format_duration;
use crate::segment::Segment;
use crate::summary::JobSummary;
use crate::toolpath::{Instruction, MotionProgram};

const LASER_ON: &str = "M12";
const LASER_OFF: &str = "M22";

/// Renders a motion program as laser G-code
#[derive(Debug, Clone)]
pub struct GCodeEmitter {
    precision: usize,
    include_summary: bool,
}

impl GCodeEmitter {
    pub fn new(precision: usize) -> Self {
        Self {
            precision,
            include_summary: true,
        }
    }

    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }

    /// Generates the complete file.
    pub fn emit(
        &self,
        program: &MotionProgram,
        profile: &MaterialProfile,
        summary: &JobSummary,
    ) -> String {
        let mut gcode = String::new();

        if self.include_summary {
            gcode.push_str("(\n");
            for line in summary.lines() {
                gcode.push_str(&comment_text(&line));
                gcode.push('\n');
            }
            gcode.push_str(")\n\n");
        }

        gcode.push_str("(Startup commands)\n");
        push_block(&mut gcode, &profile.header);
        gcode.push_str(&format!(
            "G00 COriginalFilename-{}\n",
            comment_text(&summary.document_name)
        ));
        gcode.push_str(&format!(
            "G00 CLaserProfile-{}\n",
            comment_text(&profile.name)
        ));
        gcode.push_str(&format!(
            "G00 CTimeEstimate-{}\n",
            format_duration(summary.estimate.total_seconds())
        ));

        gcode.push_str(&self.generate_body(program, profile));

        gcode.push_str("(Shutdown commands)\n");
        push_block(&mut gcode, &profile.footer);
        gcode
    }

    /// Generates the layer sections, starting from the machine origin.
    pub fn generate_body(&self, program: &MotionProgram, profile: &MaterialProfile) -> String {
        let mut gcode = String::new();
        let mut pos = Point::origin();

        for section in &program.sections {
            let settings = profile.layer(section.layer);
            gcode.push('\n');
            gcode.push_str(section.layer.section_comment());
            gcode.push('\n');
            gcode.push_str(&format!("G97 S{}\n", settings.power));
            gcode.push_str(&format!("G98 P265 E{}\n", settings.pulse));
            gcode.push_str(&format!("G01 F{}\n", settings.feed_rate));

            for instruction in &section.instructions {
                match instruction {
                    Instruction::LaserOn => gcode.push_str(LASER_ON),
                    Instruction::LaserOff => gcode.push_str(LASER_OFF),
                    Instruction::Move(segment) => {
                        gcode.push_str(&self.format_segment(segment, &pos));
                        pos = segment.end();
                    }
                }
                gcode.push('\n');
            }
        }
        gcode.push('\n');
        gcode
    }

    /// One move; arc centres are given as offsets from `from`.
    pub fn format_segment(&self, segment: &Segment, from: &Point) -> String {
        match segment {
            Segment::Rapid { to } => format!("G00 {}", self.xy(to)),
            Segment::Linear { to } => format!("G01 {}", self.xy(to)),
            Segment::Arc {
                direction,
                center,
                to,
                ..
            } => format!(
                "{} {} I{} J{}",
                direction.gcode(),
                self.xy(to),
                self.coord(center.x - from.x),
                self.coord(center.y - from.y)
            ),
        }
    }

    fn xy(&self, p: &Point) -> String {
        format!("X{} Y{}", self.coord(p.x), self.coord(p.y))
    }

    fn coord(&self, value: f64) -> String {
        format_fixed(value, self.precision)
    }
}

/// Append template text, ending in a newline.
fn push_block(gcode: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    gcode.push_str(text);
    if !text.ends_with('\n') {
        gcode.push('\n');
    }
}

/// Make free text safe inside a G-code comment: ASCII only, no parentheses.
fn comment_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '(' => '[',
            ')' => ']',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}
