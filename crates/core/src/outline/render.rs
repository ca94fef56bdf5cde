use crate::model::ContentRange;
use std::fmt::Write;

/// Line blocks of one file, merged on demand.
///
/// Blocks are `[start, end)` in 1-based lines; overlapping or touching
/// blocks collapse into one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSet {
    chunks: Vec<(usize, usize)>,
}

impl ChunkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, range: &ContentRange) {
        if range.end_line > range.start_line {
            self.chunks.push((range.start_line, range.end_line));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn merged(&self) -> Vec<(usize, usize)> {
        let mut sorted = self.chunks.clone();
        sorted.sort_unstable();
        let mut out: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
        for (start, end) in sorted {
            match out.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => out.push((start, end)),
            }
        }
        out
    }

    /// Writes each merged block as numbered lines, `...` between blocks.
    /// Lines past the end of `source` are ignored.
    pub fn render(&self, source: &str, out: &mut String) {
        let lines: Vec<&str> = source.lines().collect();
        let blocks = self.merged();
        for (i, (start, end)) in blocks.iter().enumerate() {
            for line_no in *start..*end {
                let Some(text) = line_no.checked_sub(1).and_then(|idx| lines.get(idx)) else {
                    break;
                };
                let _ = writeln!(out, "{:3}| {}", line_no, text);
            }
            if i + 1 != blocks.len() {
                out.push_str("...\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(start: usize, end: usize) -> ContentRange {
        ContentRange::new(start, end, 0, 0)
    }

    #[test]
    fn test_merges_overlapping_and_adjacent() {
        let mut set = ChunkSet::new();
        set.add(&lines(10, 12));
        set.add(&lines(1, 3));
        set.add(&lines(3, 5));
        set.add(&lines(2, 4));
        set.add(&lines(11, 14));
        assert_eq!(set.merged(), vec![(1, 5), (10, 14)]);
    }

    #[test]
    fn test_render_numbers_lines_and_separates_blocks() {
        let source = "package a\n\nfunc A() {\n}\n\nfunc B() {\n}\n";
        let mut set = ChunkSet::new();
        set.add(&lines(3, 4));
        set.add(&lines(6, 7));
        let mut out = String::new();
        set.render(source, &mut out);
        assert_eq!(out, "  3| func A() {\n...\n  6| func B() {\n");
    }

    #[test]
    fn test_render_clamps_to_source() {
        let mut set = ChunkSet::new();
        set.add(&lines(1, 10));
        let mut out = String::new();
        set.render("one\ntwo", &mut out);
        assert_eq!(out, "  1| one\n  2| two\n");
    }

    #[test]
    fn test_empty_ranges_are_ignored() {
        let mut set = ChunkSet::new();
        set.add(&lines(4, 4));
        assert!(set.is_empty());
    }
}
