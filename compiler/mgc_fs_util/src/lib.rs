// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

pub type SourceName = Arc<str>;

pub type SourceContents = Arc<str>;

/// One loaded source file.
#[derive(Clone, Debug)]
pub struct Source {
    pub name: SourceName,
    pub contents: SourceContents,
}

/// Every source of a compilation, addressed through one global offset
/// space so a span can name a position in any file. Start offsets are
/// not stored per source; the map keeps a table of end offsets and
/// recovers a file's start from its predecessor's end. A file's range
/// also covers the position just past its last byte, so a span at EOF
/// still maps to the file it came from.
#[derive(Debug, Default)]
pub struct SourceMap {
    sources: Vec<Source>,
    ends: Vec<u32>,
}

impl SourceMap {
    /// Appends a source and returns the global offset of its first byte.
    pub fn push(&mut self, name: SourceName, contents: SourceContents) -> u32 {
        let start = self.ends.last().copied().unwrap_or(0);
        let len = u32::try_from(contents.len()).expect("source length should fit into u32");
        self.ends.push(start + len + 1);
        self.sources.push(Source { name, contents });
        start
    }

    /// The source whose range contains the offset, together with the
    /// global offset of its first byte.
    #[must_use]
    pub fn find_by_offset(&self, offset: u32) -> Option<(u32, &Source)> {
        let index = self.ends.partition_point(|&end| end <= offset);
        let source = self.sources.get(index)?;
        let start = if index == 0 { 0 } else { self.ends[index - 1] };
        Some((start, source))
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name.as_ref() == name)
    }
}
