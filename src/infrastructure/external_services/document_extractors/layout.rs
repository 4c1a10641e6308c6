//! Positioned text runs from PDF content streams, grouped into lines, cells
//! and table grids.

use lopdf::Object;
use lopdf::content::Operation;

use crate::application::ports::document_extractor::TableGrid;

/// Runs whose baselines differ by less than this belong to the same line.
const LINE_TOLERANCE: f32 = 2.0;
/// A horizontal gap wider than this many ems starts a new cell.
const CELL_GAP_EM: f32 = 1.5;
/// Approximate advance of one glyph, in ems.
const GLYPH_WIDTH_EM: f32 = 0.5;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub text: String,
}

impl TextRun {
    fn end(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug)]
struct TextState {
    tm: [f32; 6],
    tlm: [f32; 6],
    leading: f32,
    font_size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
            font_size: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        let m = self.tlm;
        self.tlm = [
            m[0],
            m[1],
            m[2],
            m[3],
            tx * m[0] + ty * m[2] + m[4],
            tx * m[1] + ty * m[3] + m[5],
        ];
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }

    fn scale(&self) -> f32 {
        let s = self.tm[0].abs();
        if s > 0.0 { s } else { 1.0 }
    }

    fn effective_size(&self) -> f32 {
        (self.font_size * self.scale()).abs().max(1.0)
    }

    fn show(&mut self, text: String, adjustment: f32, runs: &mut Vec<TextRun>) {
        let glyphs = text.chars().count() as f32;
        let advance = (glyphs * GLYPH_WIDTH_EM * self.font_size - adjustment / 1000.0 * self.font_size)
            * self.scale();

        if !text.trim().is_empty() {
            runs.push(TextRun {
                x: self.tm[4],
                y: self.tm[5],
                width: advance.max(0.0),
                font_size: self.effective_size(),
                text,
            });
        }
        self.tm[4] += advance;
    }
}

fn number(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|o| o.as_float().ok()).map(|v| v as f32)
}

/// Decodes a PDF string operand: UTF-16BE with a byte-order mark, otherwise Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn string_operand(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Interprets the text operators of a content stream.
pub fn text_runs(operations: &[Operation]) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = number(operands, 1) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = number(operands, 0) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                let values: Vec<f32> = (0..6).filter_map(|i| number(operands, i)).collect();
                if let Ok(matrix) = <[f32; 6]>::try_from(values) {
                    state.tm = matrix;
                    state.tlm = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, 0.0, &mut runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, 0.0, &mut runs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(string_operand) {
                    state.show(text, 0.0, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    let mut adjustment = 0.0;
                    for item in items {
                        match string_operand(item) {
                            Some(s) => text.push_str(&s),
                            None => adjustment += item.as_float().map(|v| v as f32).unwrap_or(0.0),
                        }
                    }
                    state.show(text, adjustment, &mut runs);
                }
            }
            _ => {}
        }
    }

    runs
}

/// Groups runs into lines (top to bottom), each a list of cell strings (left to right).
pub fn lines(runs: &[TextRun]) -> Vec<Vec<String>> {
    let mut sorted: Vec<&TextRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut grouped: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match grouped.last_mut() {
            Some(line) if (line[0].y - run.y).abs() < LINE_TOLERANCE => line.push(run),
            _ => grouped.push(vec![run]),
        }
    }

    grouped
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            cells(&line)
        })
        .collect()
}

fn cells(line: &[&TextRun]) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut previous: Option<&TextRun> = None;

    for run in line {
        let text = run.text.trim();
        match previous {
            Some(prev) if run.x - prev.end() <= CELL_GAP_EM * prev.font_size => {
                if let Some(cell) = cells.last_mut() {
                    if run.x - prev.end() > 0.2 * prev.font_size {
                        cell.push(' ');
                    }
                    cell.push_str(text);
                }
            }
            _ => cells.push(text.to_string()),
        }
        previous = Some(run);
    }

    cells
}

/// Consecutive lines sharing a cell count of at least two form a grid.
pub fn detect_tables(lines: &[Vec<String>]) -> Vec<TableGrid> {
    let mut tables = Vec::new();
    let mut current: TableGrid = Vec::new();

    for line in lines {
        let continues = current
            .first()
            .is_some_and(|first| first.len() == line.len());

        if line.len() >= 2 && (current.is_empty() || continues) {
            current.push(line.clone());
            continue;
        }

        if current.len() >= 2 {
            tables.push(std::mem::take(&mut current));
        }
        current.clear();
        if line.len() >= 2 {
            current.push(line.clone());
        }
    }

    if current.len() >= 2 {
        tables.push(current);
    }

    tables
}

/// Plain text of the page, one line per baseline with cells tab-separated.
pub fn plain_text(lines: &[Vec<String>]) -> String {
    lines
        .iter()
        .map(|cells| cells.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}
