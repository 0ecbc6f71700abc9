// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use mgc_fs_util::SourceMap;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// A stage error located in the file its label points into.
///
/// Every diagnostic in this compiler carries at most one labeled span, so
/// instead of answering offset lookups at render time, the label is
/// relocated to file-local coordinates once, here, and the file itself is
/// handed to the reporter as a named source. Errors without a label (or
/// whose label cannot be located) render without a snippet.
#[derive(Debug)]
pub struct WithSource<E> {
    error: E,
    source: Option<NamedSource>,
    shift: usize,
}

impl<E: Diagnostic> WithSource<E> {
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Finds the file the error's label lands in and remembers how far to
    /// shift the label down into that file's local coordinates.
    pub fn from_map(sources: &SourceMap, error: E) -> Self {
        let located = error
            .labels()
            .into_iter()
            .flatten()
            .next()
            .and_then(|label| {
                let offset = u32::try_from(label.offset()).ok()?;
                let (start, source) = sources.find_by_offset(offset)?;
                Some((
                    NamedSource::new(source.name.as_ref(), source.contents.to_string()),
                    start as usize,
                ))
            });

        match located {
            Some((source, shift)) => Self {
                error,
                source: Some(source),
                shift,
            },
            None => Self {
                error,
                source: None,
                shift: 0,
            },
        }
    }
}

impl<E: Diagnostic> Error for WithSource<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}

impl<E: Diagnostic + Display> Display for WithSource<E> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.error, f)
    }
}

impl<E: Diagnostic + Send + Sync> Diagnostic for WithSource<E> {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.code()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let shift = self.shift;
        let labels = self.error.labels()?;
        Some(Box::new(labels.map(move |label| {
            LabeledSpan::new(
                label.label().map(ToString::to_string),
                label.offset().saturating_sub(shift),
                label.len(),
            )
        })))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source.as_ref().map(|source| source as &dyn SourceCode)
    }
}
