use std::collections::VecDeque;

use async_trait::async_trait;

use crate::application::ports::{TextSplitter, TextSplitterError};
use crate::domain::{Chunk, Document};

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text on the coarsest separator present, greedily merges the pieces
/// back into chunks of at most `chunk_size` bytes, and recurses into pieces
/// that are still too large with the finer separators.
///
/// Consecutive chunks share up to `chunk_overlap` bytes of trailing pieces.
/// A chunk only exceeds `chunk_size` when a single character is wider than it.
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

/// Byte range into the text being split.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    fn split_spans(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(
            text,
            Span {
                start: 0,
                end: text.len(),
            },
            &separators,
            &mut spans,
        );

        spans
            .into_iter()
            .filter_map(|span| trim_span(text, span))
            .collect()
    }

    fn split_recursive(&self, text: &str, span: Span, separators: &[&str], out: &mut Vec<Span>) {
        let slice = &text[span.start..span.end];
        let (separator, finer) = pick_separator(slice, separators);
        let pieces = split_on(slice, span.start, separator);

        let mut fitting = Vec::new();
        for piece in pieces {
            if piece.len() <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                out.extend(self.merge(&fitting));
                fitting.clear();
            }

            if finer.is_empty() {
                out.push(piece);
            } else {
                self.split_recursive(text, piece, finer, out);
            }
        }

        if !fitting.is_empty() {
            out.extend(self.merge(&fitting));
        }
    }

    /// Pieces are contiguous slices of the same text, so a merged chunk is the
    /// range from its first piece to its last, separators included.
    fn merge(&self, pieces: &[Span]) -> Vec<Span> {
        let mut merged = Vec::new();
        let mut window: VecDeque<Span> = VecDeque::new();

        for &piece in pieces {
            if let Some(current) = window_span(&window) {
                if piece.end - current.start > self.chunk_size {
                    merged.push(current);

                    while let Some(carried) = window_span(&window) {
                        let too_long = carried.len() > self.chunk_overlap;
                        let no_room = piece.end - carried.start > self.chunk_size;
                        if !(too_long || no_room) {
                            break;
                        }
                        window.pop_front();
                    }
                }
            }
            window.push_back(piece);
        }

        if let Some(current) = window_span(&window) {
            merged.push(current);
        }

        merged
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(800, 100)
    }
}

fn window_span(window: &VecDeque<Span>) -> Option<Span> {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => Some(Span {
            start: first.start,
            end: last.end,
        }),
        _ => None,
    }
}

fn pick_separator<'a, 's>(text: &str, separators: &'a [&'s str]) -> (&'s str, &'a [&'s str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (*separator, &[]);
        }
        if text.contains(*separator) {
            return (*separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Splits `text` (starting at byte `base` of the full text) on `separator`,
/// dropping empty pieces. The empty separator yields single characters.
fn split_on(text: &str, base: usize, separator: &str) -> Vec<Span> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| Span {
                start: base + i,
                end: base + i + c.len_utf8(),
            })
            .collect();
    }

    let mut spans = Vec::new();
    let mut cursor = 0;
    for (i, _) in text.match_indices(separator) {
        if i > cursor {
            spans.push(Span {
                start: base + cursor,
                end: base + i,
            });
        }
        cursor = i + separator.len();
    }
    if cursor < text.len() {
        spans.push(Span {
            start: base + cursor,
            end: base + text.len(),
        });
    }
    spans
}

fn trim_span(text: &str, span: Span) -> Option<Span> {
    let slice = &text[span.start..span.end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return None;
    }
    Some(Span {
        start: span.start + leading,
        end: span.end - trailing,
    })
}

#[async_trait]
impl TextSplitter for RecursiveCharacterSplitter {
    async fn split(
        &self,
        text: &str,
        document: &Document,
        page: Option<u32>,
    ) -> Result<Vec<Chunk>, TextSplitterError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .split_spans(text)
            .into_iter()
            .map(|span| {
                Chunk::new(
                    text[span.start..span.end].to_string(),
                    document.id,
                    document.filename.clone(),
                    page,
                    span.start,
                )
            })
            .collect())
    }
}
