//! Provide the property path tokenizer.
//!
//! A path is split into [`Segment`]s on `.` outside of brackets, parentheses
//! and quotes. `name(..)` is a method call and `[..]` an index; both capture
//! their raw text with a balanced scan that understands nested delimiters,
//! string and char literals, and `//` and `/* */` comments.
//!
//! A path may start with `new <class>(..)`, and a segment written after
//! `.?` is null-safe.

use std::fmt;

use crate::error::CompileError;

// -----------------------------------------------------------------------------
// Segment

/// One unit of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// `name`
    Property(Box<str>),
    /// `name(args)`, with the raw argument text.
    Method {
        name: Box<str>,
        args: Box<str>,
        args_offset: usize,
    },
    /// `[text]`, with the raw index text.
    Index { text: Box<str>, text_offset: usize },
    /// `new class(args)`, only as the first segment.
    Construct {
        class: Box<str>,
        args: Box<str>,
        args_offset: usize,
    },
}

/// A tokenized segment and its position in the path.
///
/// # Examples
///
/// ```
/// use vp_access::segment::{SegmentKind, tokenize};
///
/// let segments = tokenize("a.b(c[d.e()],f)").unwrap();
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].kind(), &SegmentKind::Property("a".into()));
/// assert!(matches!(
///     segments[1].kind(),
///     SegmentKind::Method { name, args, .. } if &**name == "b" && &**args == "c[d.e()],f"
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    offset: usize,
    null_safe: bool,
}

impl Segment {
    #[inline]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Byte offset of the segment in the path.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// `true` if the segment was written after `.?`.
    #[inline]
    pub fn is_null_safe(&self) -> bool {
        self.null_safe
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.null_safe {
            f.write_str("?")?;
        }
        match &self.kind {
            SegmentKind::Property(name) => f.write_str(name),
            SegmentKind::Method { name, args, .. } => write!(f, "{name}({args})"),
            SegmentKind::Index { text, .. } => write!(f, "[{text}]"),
            SegmentKind::Construct { class, args, .. } => write!(f, "new {class}({args})"),
        }
    }
}

// -----------------------------------------------------------------------------
// Scanning

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
        }
    }

    #[inline]
    fn peek(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn char_at(&self, pos: usize) -> char {
        self.text[pos..].chars().next().unwrap_or('\0')
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&self, mut pos: usize) -> Result<usize, CompileError> {
        loop {
            match self.peek(pos) {
                Some(b) if b.is_ascii_whitespace() => pos += 1,
                Some(b'/') if matches!(self.peek(pos + 1), Some(b'/' | b'*')) => {
                    pos = self.skip_comment(pos)?;
                }
                _ => return Ok(pos),
            }
        }
    }

    // `pos` is at the leading `/` of `//` or `/*`.
    fn skip_comment(&self, pos: usize) -> Result<usize, CompileError> {
        let body = pos + 2;
        if self.peek(pos + 1) == Some(b'/') {
            return Ok(match self.text[body..].find('\n') {
                Some(end) => body + end + 1,
                None => self.bytes.len(),
            });
        }
        match self.text[body..].find("*/") {
            Some(end) => Ok(body + end + 2),
            None => Err(CompileError::UnterminatedComment { offset: pos }),
        }
    }

    // `pos` is at the opening quote. Returns the position after the closing one.
    fn skip_literal(&self, pos: usize) -> Result<usize, CompileError> {
        let quote = self.bytes[pos];
        let mut i = pos + 1;
        while let Some(b) = self.peek(i) {
            match b {
                b'\\' => i += 2,
                b if b == quote => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(CompileError::UnterminatedLiteral { offset: pos })
    }

    /// Captures the text between the delimiter at `open` and its partner.
    /// Returns the inner text and the position after the closing delimiter.
    fn capture(&self, open: usize) -> Result<(&'a str, usize), CompileError> {
        let mut stack: Vec<(u8, usize)> = vec![(self.bytes[open], open)];
        let mut i = open + 1;
        while let Some(b) = self.peek(i) {
            match b {
                b'\'' | b'"' => {
                    i = self.skip_literal(i)?;
                    continue;
                }
                b'/' if matches!(self.peek(i + 1), Some(b'/' | b'*')) => {
                    i = self.skip_comment(i)?;
                    continue;
                }
                b'(' | b'[' | b'{' => stack.push((b, i)),
                b')' | b']' | b'}' => {
                    let Some((opener, at)) = stack.pop() else {
                        return Err(unbalanced(b, i));
                    };
                    if partner(opener) != b {
                        return Err(unbalanced(opener, at));
                    }
                    if stack.is_empty() {
                        return Ok((&self.text[open + 1..i], i + 1));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        // Only reachable with an open delimiter on the stack.
        let (opener, at) = stack.pop().unwrap_or((self.bytes[open], open));
        Err(unbalanced(opener, at))
    }

    fn scan_ident(&self, mut pos: usize) -> usize {
        for c in self.text[pos..].chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                pos += c.len_utf8();
            } else {
                break;
            }
        }
        pos
    }

    /// Scans an identifier, which may not start with a digit.
    fn name(&self, pos: usize) -> Result<(&'a str, usize), CompileError> {
        let end = self.scan_ident(pos);
        if end == pos || self.bytes[pos].is_ascii_digit() {
            return Err(CompileError::InvalidName { offset: pos });
        }
        Ok((&self.text[pos..end], end))
    }
}

#[inline]
fn partner(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

#[inline]
fn unbalanced(delimiter: u8, offset: usize) -> CompileError {
    CompileError::UnbalancedDelimiter {
        delimiter: char::from(delimiter),
        offset,
    }
}

// -----------------------------------------------------------------------------
// Tokenizer

/// Splits a property path into segments.
///
/// # Errors
///
/// - [`CompileError::UnbalancedDelimiter`] for an unclosed or mismatched `(`, `[` or `{`.
/// - [`CompileError::UnterminatedLiteral`] and [`CompileError::UnterminatedComment`].
/// - [`CompileError::InvalidName`] for an empty, blank or malformed name.
/// - [`CompileError::UnexpectedCharacter`] for anything else out of place.
pub fn tokenize(path: &str) -> Result<Vec<Segment>, CompileError> {
    let scanner = Scanner::new(path);
    let mut segments = Vec::new();
    let mut pos = scanner.skip_trivia(0)?;

    if let Some(end) = keyword(path, pos, "new") {
        let start = pos;
        pos = scanner.skip_trivia(end)?;
        let class_start = pos;
        loop {
            let (_, end) = scanner.name(pos)?;
            pos = end;
            match (scanner.peek(pos), scanner.peek(pos + 1)) {
                (Some(b'.'), _) => pos += 1,
                (Some(b'['), Some(b']')) => pos += 2,
                _ => break,
            }
        }
        let class = &path[class_start..pos];
        pos = scanner.skip_trivia(pos)?;
        if scanner.peek(pos) != Some(b'(') {
            return Err(unexpected(&scanner, pos));
        }
        let (args, end) = scanner.capture(pos)?;
        segments.push(Segment {
            kind: SegmentKind::Construct {
                class: Box::from(class),
                args: Box::from(args),
                args_offset: pos + 1,
            },
            offset: start,
            null_safe: false,
        });
        pos = end;
    } else {
        pos = name_segment(&scanner, pos, false, &mut segments)?;
    }

    loop {
        pos = scanner.skip_trivia(pos)?;
        match scanner.peek(pos) {
            None => break,
            Some(b'.') => {
                pos += 1;
                let null_safe = scanner.peek(pos) == Some(b'?');
                if null_safe {
                    pos += 1;
                }
                pos = scanner.skip_trivia(pos)?;
                pos = name_segment(&scanner, pos, null_safe, &mut segments)?;
            }
            Some(b'[') => {
                let (text, end) = scanner.capture(pos)?;
                segments.push(Segment {
                    kind: SegmentKind::Index {
                        text: Box::from(text),
                        text_offset: pos + 1,
                    },
                    offset: pos,
                    null_safe: false,
                });
                pos = end;
            }
            Some(b @ (b')' | b']' | b'}')) => return Err(unbalanced(b, pos)),
            Some(_) => return Err(unexpected(&scanner, pos)),
        }
    }

    Ok(segments)
}

/// Parses `name` or `name(args)` at `pos`.
fn name_segment(
    scanner: &Scanner<'_>,
    pos: usize,
    null_safe: bool,
    segments: &mut Vec<Segment>,
) -> Result<usize, CompileError> {
    let (name, end) = scanner.name(pos)?;
    let after = scanner.skip_trivia(end)?;
    if scanner.peek(after) == Some(b'(') {
        let (args, close) = scanner.capture(after)?;
        segments.push(Segment {
            kind: SegmentKind::Method {
                name: Box::from(name),
                args: Box::from(args),
                args_offset: after + 1,
            },
            offset: pos,
            null_safe,
        });
        return Ok(close);
    }
    segments.push(Segment {
        kind: SegmentKind::Property(Box::from(name)),
        offset: pos,
        null_safe,
    });
    Ok(end)
}

fn unexpected(scanner: &Scanner<'_>, pos: usize) -> CompileError {
    match scanner.peek(pos) {
        None => CompileError::InvalidName { offset: pos },
        Some(_) => CompileError::UnexpectedCharacter {
            found: scanner.char_at(pos),
            offset: pos,
        },
    }
}

// Matches `word` followed by whitespace at `pos`.
fn keyword(path: &str, pos: usize, word: &str) -> Option<usize> {
    let rest = path.get(pos..)?.strip_prefix(word)?;
    rest.starts_with(|c: char| c.is_whitespace())
        .then_some(pos + word.len())
}

/// Splits argument text on top-level commas.
///
/// Returns each trimmed argument with its byte offset in `text`. Commas in
/// nested delimiters, literals and comments do not split. Blank text has no
/// arguments.
///
/// # Examples
///
/// ```
/// use vp_access::segment::split_arguments;
///
/// let args = split_arguments("a(b, c), 'x,y' , [1,2]").unwrap();
/// let texts: Vec<&str> = args.iter().map(|(_, text)| *text).collect();
/// assert_eq!(texts, ["a(b, c)", "'x,y'", "[1,2]"]);
/// assert_eq!(args[1].0, 9);
/// ```
pub fn split_arguments(text: &str) -> Result<Vec<(usize, &str)>, CompileError> {
    let scanner = Scanner::new(text);
    let mut args = Vec::new();
    if scanner.skip_trivia(0)? == text.len() {
        return Ok(args);
    }

    let mut start = 0;
    let mut i = 0;
    let mut push = |start: usize, end: usize| {
        let piece = &text[start..end];
        let trimmed = piece.trim_start();
        let offset = start + (piece.len() - trimmed.len());
        let trimmed = trimmed.trim_end();
        if trimmed.is_empty() {
            return Err(CompileError::InvalidName { offset });
        }
        args.push((offset, trimmed));
        Ok(())
    };

    while let Some(b) = scanner.peek(i) {
        match b {
            b'\'' | b'"' => i = scanner.skip_literal(i)?,
            b'/' if matches!(scanner.peek(i + 1), Some(b'/' | b'*')) => i = scanner.skip_comment(i)?,
            b'(' | b'[' | b'{' => i = scanner.capture(i)?.1,
            b')' | b']' | b'}' => return Err(unbalanced(b, i)),
            b',' => {
                push(start, i)?;
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    push(start, text.len())?;
    Ok(args)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{SegmentKind, split_arguments, tokenize};
    use crate::error::CompileError;

    fn kinds(path: &str) -> Vec<SegmentKind> {
        tokenize(path)
            .unwrap()
            .into_iter()
            .map(|s| s.kind().clone())
            .collect()
    }

    fn method(name: &str, args: &str, args_offset: usize) -> SegmentKind {
        SegmentKind::Method {
            name: name.into(),
            args: args.into(),
            args_offset,
        }
    }

    #[test]
    fn balanced_capture() {
        assert_eq!(
            kinds("a.b(c[d.e()],f)"),
            [SegmentKind::Property("a".into()), method("b", "c[d.e()],f", 4)],
        );
    }

    #[test]
    fn unbalanced_delimiters_fail() {
        assert_eq!(
            tokenize("a.b(c"),
            Err(CompileError::UnbalancedDelimiter { delimiter: '(', offset: 3 }),
        );
        assert_eq!(
            tokenize("a[b(c]"),
            Err(CompileError::UnbalancedDelimiter { delimiter: '(', offset: 3 }),
        );
        assert_eq!(
            tokenize("a)"),
            Err(CompileError::UnbalancedDelimiter { delimiter: ')', offset: 1 }),
        );
    }

    #[test]
    fn literals_and_comments_hide_delimiters() {
        assert_eq!(
            kinds("a.b(')', \"]\\\"\", /* ) */ x // )\n)"),
            [
                SegmentKind::Property("a".into()),
                method("b", "')', \"]\\\"\", /* ) */ x // )\n", 4),
            ],
        );
        assert_eq!(tokenize("a.b('x)"), Err(CompileError::UnterminatedLiteral { offset: 4 }));
        assert_eq!(tokenize("a.b(/* x)"), Err(CompileError::UnterminatedComment { offset: 4 }));
    }

    #[test]
    fn indexes_and_null_safe_segments() {
        let segments = tokenize("a[0]['k'].?b.c").unwrap();
        let texts: Vec<String> = segments.iter().map(ToString::to_string).collect();
        assert_eq!(texts, ["a", "[0]", "['k']", "?b", "c"]);
        assert_eq!(segments[3].offset(), 11);
        assert!(!segments[4].is_null_safe());
    }

    #[test]
    fn construction_roots() {
        assert_eq!(
            kinds("new demo.Point(1, 2).x"),
            [
                SegmentKind::Construct {
                    class: "demo.Point".into(),
                    args: "1, 2".into(),
                    args_offset: 15,
                },
                SegmentKind::Property("x".into()),
            ],
        );
        // Without whitespace `new` is an ordinary name.
        assert_eq!(kinds("newest"), [SegmentKind::Property("newest".into())]);
    }

    #[test]
    fn blank_and_malformed_names_fail() {
        assert_eq!(tokenize("   "), Err(CompileError::InvalidName { offset: 3 }));
        assert_eq!(tokenize("a. .b"), Err(CompileError::InvalidName { offset: 3 }));
        assert_eq!(tokenize("a."), Err(CompileError::InvalidName { offset: 2 }));
        assert_eq!(tokenize("1a"), Err(CompileError::InvalidName { offset: 0 }));
        assert_eq!(
            tokenize("a-b"),
            Err(CompileError::UnexpectedCharacter { found: '-', offset: 1 }),
        );
    }

    #[test]
    fn argument_splitting() {
        assert_eq!(split_arguments("  "), Ok(vec![]));
        assert_eq!(split_arguments("x"), Ok(vec![(0, "x")]));
        assert_eq!(split_arguments("{a, b}, \"c,d\""), Ok(vec![(0, "{a, b}"), (8, "\"c,d\"")]));
        assert_eq!(split_arguments("a,,b"), Err(CompileError::InvalidName { offset: 2 }));
    }
}
