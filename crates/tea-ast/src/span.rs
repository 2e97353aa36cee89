// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// Position of a token or node in template source.
///
/// `start` and `end` are byte offsets (end exclusive). `detail` optionally
/// points at the interesting offset inside the range, such as the bad
/// character inside a malformed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceInfo {
    pub line: u32,
    pub start: usize,
    pub end: usize,
    pub detail: Option<usize>,
}

impl SourceInfo {
    pub fn new(line: u32, start: usize, end: usize) -> Self {
        Self { line, start, end, detail: None }
    }

    pub fn with_detail(mut self, detail: usize) -> Self {
        self.detail = Some(detail);
        self
    }

    /// A new range spanning from the start of `self` to the end of `other`.
    pub fn to(&self, other: &SourceInfo) -> SourceInfo {
        SourceInfo { end: self.end.max(other.end), ..*self }
    }

    /// Offset used when reporting: the detail offset if present, else the start.
    pub fn culprit(&self) -> usize {
        self.detail.unwrap_or(self.start)
    }
}

/// Line start offsets of one template source.
#[derive(Debug, Clone)]
pub struct LineMap {
    starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let newlines = source.match_indices('\n').map(|(i, _)| i + 1);
        Self { starts: std::iter::once(0).chain(newlines).collect() }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let idx = self.starts.partition_point(|&s| s <= offset).saturating_sub(1);
        let col = offset.saturating_sub(self.starts[idx]) + 1;
        ((idx + 1) as u32, col as u32)
    }

    /// Text of a 1-based line, without its newline.
    pub fn line_text<'s>(&self, source: &'s str, line: u32) -> Option<&'s str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.starts.get(idx)?;
        let end = self.starts.get(idx + 1).map_or(source.len(), |&next| next - 1);
        source.get(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_info_spans_both_ranges() {
        let a = SourceInfo::new(1, 4, 7);
        let b = SourceInfo::new(2, 12, 20);
        let merged = a.to(&b);
        assert_eq!(merged.start, 4);
        assert_eq!(merged.end, 20);
        assert_eq!(merged.line, 1);
    }

    #[test]
    fn merging_never_shrinks() {
        let outer = SourceInfo::new(1, 0, 30);
        assert_eq!(outer.to(&SourceInfo::new(1, 2, 10)).end, 30);
    }

    #[test]
    fn culprit_prefers_detail() {
        let info = SourceInfo::new(3, 10, 16).with_detail(13);
        assert_eq!(info.culprit(), 13);
        assert_eq!(SourceInfo::new(3, 10, 16).culprit(), 10);
    }

    #[test]
    fn line_lookup_in_template_text() {
        let src = "<% template t() %>\nHello\n<% name %>";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_col(0), (1, 1));
        assert_eq!(lm.line_col(19), (2, 1));
        assert_eq!(lm.line_text(src, 2), Some("Hello"));
        assert_eq!(lm.line_text(src, 3), Some("<% name %>"));
        assert_eq!(lm.line_text(src, 4), None);
    }

    #[test]
    fn trailing_newline_yields_empty_line() {
        let src = "abc\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_col(3), (1, 4));
        assert_eq!(lm.line_text(src, 2), Some(""));
    }
}
