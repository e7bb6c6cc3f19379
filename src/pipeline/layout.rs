//! Layout analysis for pages with native text.
//!
//! Works purely on glyph primitives so it can be exercised without pdfium:
//!
//! ```text
//! glyphs ──▶ words ──▶ lines ──▶ blocks ──▶ reading order
//!   (nearest neighbour) (baseline) (spacing)   (column-aware)
//! ```
//!
//! Coordinates are PDF user space: points, origin bottom-left, y grows
//! upwards. "Above" therefore means a larger `top`.

use serde::Serialize;
use tracing::debug;

/// Mean font size assumed for a page that yields no glyphs.
pub const FALLBACK_FONT_SIZE: f32 = 12.0;

/// Horizontal gap, in ems, above which two adjacent glyphs start a new word.
const WORD_GAP_EMS: f32 = 0.2;

/// Horizontal gap, in ems, that splits one baseline row into separate lines
/// (typically two columns sharing a baseline). The gap must also be at least
/// [`MIN_GUTTER_WIDTH`].
const LINE_SPLIT_GAP_EMS: f32 = 1.0;

/// Maximum vertical gap between two lines of the same block, as a multiple
/// of the taller line's height.
const BLOCK_GAP_RATIO: f32 = 1.0;

/// Maximum font-size difference (points) between lines of the same block.
const BLOCK_FONT_TOLERANCE: f32 = 1.0;

/// Pages narrower than this (points of text extent) are never split into columns.
const MIN_COLUMN_PAGE_WIDTH: f32 = 250.0;

/// Minimum empty horizontal band (points) that counts as a column gutter.
const MIN_GUTTER_WIDTH: f32 = 12.0;

/// Blocks wider than this share of the text extent are treated as spanning
/// and ignored when looking for gutters.
const SPANNING_WIDTH_SHARE: f32 = 0.6;

/// Axis-aligned rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl BoundingBox {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Length of the shared x-range (0 when disjoint).
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f32 {
        (self.right.min(other.right) - self.left.max(other.left)).max(0.0)
    }
}

/// One character primitive as reported by the PDF backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BoundingBox,
    /// Effective (scaled) font size in points.
    pub font_size: f32,
}

impl Glyph {
    pub fn new(ch: char, bbox: BoundingBox, font_size: f32) -> Self {
        Self { ch, bbox, font_size }
    }

    /// Lay out `text` as one run of fixed-advance glyphs starting at
    /// (`left`, `baseline`). Each glyph is `0.5 × font_size` wide and
    /// `font_size` tall; spaces are emitted as whitespace glyphs the way
    /// pdfium reports generated spaces.
    ///
    /// Useful for building synthetic pages.
    pub fn layout_run(text: &str, left: f32, baseline: f32, font_size: f32) -> Vec<Glyph> {
        let advance = font_size * 0.5;
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x = left + i as f32 * advance;
                Glyph::new(
                    ch,
                    BoundingBox::new(x, baseline, x + advance, baseline + font_size),
                    font_size,
                )
            })
            .collect()
    }

    fn is_blank(&self) -> bool {
        self.ch.is_whitespace() || self.ch.is_control()
    }
}

/// A run of adjacent glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
    font_size_sum: f32,
    glyph_count: usize,
}

impl Word {
    fn start(glyph: &Glyph) -> Self {
        Self {
            text: glyph.ch.to_string(),
            bbox: glyph.bbox,
            font_size_sum: glyph.font_size,
            glyph_count: 1,
        }
    }

    fn push(&mut self, glyph: &Glyph) {
        self.text.push(glyph.ch);
        self.bbox = self.bbox.union(&glyph.bbox);
        self.font_size_sum += glyph.font_size;
        self.glyph_count += 1;
    }

    /// Average font size of the word's glyphs.
    pub fn font_size(&self) -> f32 {
        self.font_size_sum / self.glyph_count.max(1) as f32
    }

    fn accepts(&self, last: &Glyph, next: &Glyph) -> bool {
        let em = last.font_size.max(next.font_size).max(1.0);
        let row_height = last.bbox.height().max(next.bbox.height()).max(em * 0.5);
        let same_row = (next.bbox.center_y() - last.bbox.center_y()).abs() <= row_height * 0.5;
        let gap = next.bbox.left - last.bbox.right;
        same_row && gap <= em * WORD_GAP_EMS && gap >= -em * 0.5
    }
}

/// A horizontal run of words sharing a baseline.
#[derive(Debug, Clone)]
struct Line {
    words: Vec<Word>,
    bbox: BoundingBox,
}

impl Line {
    fn new(words: Vec<Word>) -> Self {
        let bbox = words
            .iter()
            .skip(1)
            .fold(words[0].bbox, |acc, w| acc.union(&w.bbox));
        Self { words, bbox }
    }

    fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn font_size(&self) -> f32 {
        let (sum, count) = font_totals(self.words.iter());
        sum / count.max(1) as f32
    }
}

/// A maximal group of spatially contiguous lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub average_font_size: f32,
    /// Diagnostics only; reading order has already been applied.
    pub bbox: BoundingBox,
}

/// Blocks of one page in reading order, plus the page's font baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub blocks: Vec<TextBlock>,
    /// Mean font size over every visible glyph on the page.
    pub mean_font_size: f32,
}

impl PageLayout {
    /// Minimum average font size for a block to be eligible as a heading.
    pub fn heading_threshold(&self, ratio: f32) -> f32 {
        self.mean_font_size * ratio
    }
}

/// Run the full native-page analysis.
pub fn analyze_page(glyphs: &[Glyph]) -> PageLayout {
    let mean_font_size = mean_font_size(glyphs);
    let words = extract_words(glyphs);
    let blocks = order_blocks(group_blocks(words));
    debug!(
        "Layout: {} glyphs → {} blocks, mean font {:.1}pt",
        glyphs.len(),
        blocks.len(),
        mean_font_size
    );
    PageLayout {
        blocks,
        mean_font_size,
    }
}

/// Mean font size over visible glyphs; [`FALLBACK_FONT_SIZE`] if there are none.
pub fn mean_font_size(glyphs: &[Glyph]) -> f32 {
    let sizes: Vec<f32> = glyphs
        .iter()
        .filter(|g| !g.is_blank())
        .map(|g| g.font_size)
        .collect();
    if sizes.is_empty() {
        FALLBACK_FONT_SIZE
    } else {
        sizes.iter().sum::<f32>() / sizes.len() as f32
    }
}

/// Group glyphs into words by nearest-neighbour adjacency in content order.
///
/// Whitespace glyphs always end the current word.
pub fn extract_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    let mut last: Option<&Glyph> = None;

    for glyph in glyphs {
        if glyph.is_blank() {
            words.extend(current.take());
            last = None;
            continue;
        }
        match (current.as_mut(), last) {
            (Some(word), Some(prev)) if word.accepts(prev, glyph) => word.push(glyph),
            _ => {
                words.extend(current.take());
                current = Some(Word::start(glyph));
            }
        }
        last = Some(glyph);
    }
    words.extend(current);
    words
}

/// Cluster words into lines, then lines into blocks.
///
/// Returned blocks are in no particular order; see [`order_blocks`].
pub fn group_blocks(words: Vec<Word>) -> Vec<TextBlock> {
    let lines = group_lines(words);
    let mut blocks: Vec<Vec<Line>> = Vec::new();

    for line in lines {
        let target = blocks
            .iter_mut()
            .filter_map(|block| {
                let last = block.last()?;
                let gap = last.bbox.bottom - line.bbox.top;
                continues_block(last, &line).then_some((gap, block))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, block)| block);
        match target {
            Some(block) => block.push(line),
            None => blocks.push(vec![line]),
        }
    }

    blocks.into_iter().map(build_block).collect()
}

fn group_lines(mut words: Vec<Word>) -> Vec<Line> {
    words.sort_by(|a, b| {
        b.bbox
            .center_y()
            .total_cmp(&a.bbox.center_y())
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });

    let mut rows: Vec<(BoundingBox, Vec<Word>)> = Vec::new();
    for word in words {
        match rows.last_mut() {
            Some((bbox, row)) if same_row(bbox, &word.bbox) => {
                *bbox = bbox.union(&word.bbox);
                row.push(word);
            }
            _ => rows.push((word.bbox, vec![word])),
        }
    }

    let mut lines = Vec::new();
    for (_, mut row) in rows {
        row.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
        let mut current: Vec<Word> = Vec::new();
        for word in row {
            if let Some(prev) = current.last() {
                let em = prev.font_size().max(word.font_size()).max(1.0);
                let gap = word.bbox.left - prev.bbox.right;
                if gap > em * LINE_SPLIT_GAP_EMS && gap >= MIN_GUTTER_WIDTH {
                    lines.push(Line::new(std::mem::take(&mut current)));
                }
            }
            current.push(word);
        }
        if !current.is_empty() {
            lines.push(Line::new(current));
        }
    }
    lines
}

fn same_row(row: &BoundingBox, word: &BoundingBox) -> bool {
    let tolerance = row.height().max(word.height()).max(1.0) * 0.5;
    (row.center_y() - word.center_y()).abs() <= tolerance
}

fn continues_block(last: &Line, next: &Line) -> bool {
    let height = last.bbox.height().max(next.bbox.height()).max(1.0);
    let gap = last.bbox.bottom - next.bbox.top;
    gap >= -height * 0.5
        && gap <= height * BLOCK_GAP_RATIO
        && last.bbox.horizontal_overlap(&next.bbox) > 0.0
        && (last.font_size() - next.font_size()).abs() <= BLOCK_FONT_TOLERANCE
}

fn build_block(lines: Vec<Line>) -> TextBlock {
    let bbox = lines
        .iter()
        .skip(1)
        .fold(lines[0].bbox, |acc, l| acc.union(&l.bbox));
    let (sum, count) = font_totals(lines.iter().flat_map(|l| l.words.iter()));
    TextBlock {
        text: lines.iter().map(Line::text).collect::<Vec<_>>().join(" "),
        average_font_size: sum / count.max(1) as f32,
        bbox,
    }
}

fn font_totals<'a>(words: impl Iterator<Item = &'a Word>) -> (f32, usize) {
    words.fold((0.0, 0), |(sum, count), w| {
        (sum + w.font_size_sum, count + w.glyph_count)
    })
}

// ── Reading order ────────────────────────────────────────────────────────

/// Sort blocks into reading order.
///
/// Vertical gutters found between narrow blocks define columns. Blocks that
/// fit inside one column are read column by column, top to bottom; blocks
/// crossing a gutter (titles, full-width paragraphs) split the page into
/// horizontal bands and are read between them.
pub fn order_blocks(blocks: Vec<TextBlock>) -> Vec<TextBlock> {
    let boundaries = column_boundaries(&blocks);
    if boundaries.len() > 2 {
        debug!("Reading order: {} columns", boundaries.len() - 1);
    }

    let mut spanning_tops: Vec<f32> = blocks
        .iter()
        .filter(|b| column_of(&boundaries, &b.bbox).is_none())
        .map(|b| b.bbox.center_y())
        .collect();
    spanning_tops.sort_by(|a, b| b.total_cmp(a));

    let mut keyed: Vec<((usize, usize), TextBlock)> = blocks
        .into_iter()
        .map(|block| {
            let y = block.bbox.center_y();
            let above = spanning_tops.iter().filter(|&&t| t > y).count();
            let key = match column_of(&boundaries, &block.bbox) {
                Some(column) => (above * 2, column),
                None => (above * 2 + 1, 0),
            };
            (key, block)
        })
        .collect();

    keyed.sort_by(|(ka, a), (kb, b)| {
        ka.cmp(kb)
            .then(b.bbox.top.total_cmp(&a.bbox.top))
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });
    keyed.into_iter().map(|(_, block)| block).collect()
}

/// Column edges `[left, gutter…, right]` across the text extent.
fn column_boundaries(blocks: &[TextBlock]) -> Vec<f32> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    let extent = blocks.iter().fold(first.bbox, |acc, b| acc.union(&b.bbox));
    let mut edges = vec![extent.left, extent.right];
    if extent.width() < MIN_COLUMN_PAGE_WIDTH {
        return edges;
    }

    let mut intervals: Vec<(f32, f32)> = blocks
        .iter()
        .filter(|b| b.bbox.width() < extent.width() * SPANNING_WIDTH_SHARE)
        .map(|b| (b.bbox.left, b.bbox.right))
        .collect();
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut gutters = Vec::new();
    let mut covered_to: Option<f32> = None;
    for (left, right) in intervals {
        match covered_to {
            Some(end) if left - end >= MIN_GUTTER_WIDTH => {
                gutters.push((end + left) / 2.0);
                covered_to = Some(right);
            }
            Some(end) => covered_to = Some(end.max(right)),
            None => covered_to = Some(right),
        }
    }

    edges.splice(1..1, gutters);
    edges
}

fn column_of(boundaries: &[f32], bbox: &BoundingBox) -> Option<usize> {
    const TOLERANCE: f32 = 2.0;
    if boundaries.len() <= 2 {
        return Some(0);
    }
    boundaries.windows(2).position(|edge| {
        bbox.left >= edge[0] - TOLERANCE && bbox.right <= edge[1] + TOLERANCE
    })
}
