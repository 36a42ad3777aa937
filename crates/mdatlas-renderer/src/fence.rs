//! Line-level tracking of regions the pre-processor copies verbatim.
//!
//! Two kinds of region span several lines: fenced code blocks and display
//! math blocks opened by a `$$` line. Everything inside them, delimiters
//! included, must reach the Markdown engine untouched.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    /// Fenced code; closing fence uses `marker` at least `len` times.
    Fence { marker: char, len: usize },
    /// Display math opened by `$$` without a closing `$$` on the same line.
    DisplayMath,
}

/// Tracks verbatim regions during line-by-line processing.
#[derive(Debug, Default)]
pub(crate) struct VerbatimTracker {
    region: Option<Region>,
}

impl VerbatimTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed the next line and report whether it belongs to a verbatim region.
    ///
    /// Opening and closing delimiter lines count as part of the region.
    pub(crate) fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.region {
            Some(Region::Fence { marker, len }) => {
                if closes_fence(trimmed, marker, len) {
                    self.region = None;
                }
                true
            }
            Some(Region::DisplayMath) => {
                if trimmed.contains("$$") {
                    self.region = None;
                }
                true
            }
            None => {
                if let Some((marker, len)) = opening_fence(trimmed) {
                    self.region = Some(Region::Fence { marker, len });
                    return true;
                }
                if let Some(rest) = trimmed.strip_prefix("$$")
                    && !rest.contains("$$")
                {
                    self.region = Some(Region::DisplayMath);
                    return true;
                }
                false
            }
        }
    }
}

/// Detect an opening code fence, returning its marker and length.
fn opening_fence(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }

    let len = trimmed.chars().take_while(|&c| c == marker).count();
    // Backtick fences may not carry backticks in their info string.
    if len < 3 || (marker == '`' && trimmed[len..].contains('`')) {
        return None;
    }
    Some((marker, len))
}

fn closes_fence(trimmed: &str, marker: char, min_len: usize) -> bool {
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    len >= min_len && trimmed[len..].trim().is_empty()
}
