//! # Parser Combinators
//!
//! Small parsers that compose into the grammar in [`parsers`](super::parsers).
//!
//! * **Basic**: [`Equal`], [`Satisfy`], [`Fail`], [`EndOfInput`]
//! * **Sequential**: [`Preceded`], [`Terminated`], [`Delimited`], `Tuple2`..`Tuple5`
//! * **Alternative**: [`Choice`], [`Optional`]
//! * **Repetition**: [`Many`], [`SeparatedList`]
//! * **Transformation**: [`Map`], [`TryMap`], [`AsUnit`], [`Located`]
//! * **Lookahead**: [`Backtrack`]
//! * **Error handling**: [`WithContext`]
//! * **Recursion**: [`Lazy`]
//!
//! ## Commitment
//!
//! Repetition and [`Optional`] stop quietly when their inner parser fails
//! without getting past the first token. If the inner parser got further
//! before failing, the error is propagated: the input was clearly meant to
//! be one more item, and reporting the failure there gives a much better
//! message than reporting whatever comes next. [`Choice`] always backtracks
//! and, when every alternative fails, reports the one that got furthest.

use super::core::{ParseError, ParseResult, Parser};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

/// How many [`Nested`] parsers may be active at once.
pub const MAX_NESTING_DEPTH: usize = 1000;

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

fn eof_error(position: usize, expected: &str) -> ParseError {
    ParseError::UnexpectedEOF {
        message: format!("expected {}", expected),
        position,
        context: None,
    }
}

/// Equal: matches one token equal to `value`.
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Display> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            Some(found) => Err(ParseError::Unexpected {
                expected: self.value.to_string(),
                parsed: found.to_string(),
                position: pos,
                context: None,
            }),
            None => Err(eof_error(pos, &self.value.to_string())),
        }
    }
}

/// Satisfy: consumes one token when `f` maps it to `Some`.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    expected: &'static str,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(expected: &'static str, f: F) -> Self {
        Self {
            f,
            expected,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    I: fmt::Display,
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        match input.get(pos) {
            Some(found) => match (self.f)(found) {
                Some(value) => Ok((pos + 1, value)),
                None => Err(ParseError::Unexpected {
                    expected: self.expected.to_string(),
                    parsed: found.to_string(),
                    position: pos,
                    context: None,
                }),
            },
            None => Err(eof_error(pos, self.expected)),
        }
    }
}

/// Fail: always fails with `message`.
#[derive(Clone)]
pub struct Fail<I, O> {
    message: String,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O> Fail<I, O> {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl<I, O> Parser<I, O> for Fail<I, O> {
    fn parse(&self, _input: &[I], pos: usize) -> ParseResult<O> {
        Err(ParseError::Failure {
            message: self.message.clone(),
            position: pos,
            context: None,
        })
    }
}

/// EndOfInput: succeeds only when every token has been consumed.
#[derive(Clone)]
pub struct EndOfInput<I> {
    _phantom: PhantomData<I>,
}

impl<I> EndOfInput<I> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<I> Default for EndOfInput<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: fmt::Display> Parser<I, ()> for EndOfInput<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        match input.get(pos) {
            None => Ok((pos, ())),
            Some(found) => Err(ParseError::Unexpected {
                expected: "end of input".to_string(),
                parsed: found.to_string(),
                position: pos,
                context: None,
            }),
        }
    }
}

/// Choice: the first alternative that succeeds.
///
/// When all of them fail, the error of the alternative that got furthest is
/// returned. If none got past `pos`, the result is `NoAlternative` (or
/// `UnexpectedEOF` at the end of input).
pub struct Choice<I, O> {
    parsers: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<Box<dyn Parser<I, O>>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let mut furthest: Option<ParseError> = None;
        for parser in &self.parsers {
            match parser.parse(input, pos) {
                Ok(result) => return Ok(result),
                Err(e @ ParseError::Fatal { .. }) => return Err(e),
                Err(e) => {
                    // On a tie an explicit failure carries the better message.
                    let further = furthest.as_ref().is_none_or(|f| {
                        e.get_position() > f.get_position()
                            || (e.get_position() == f.get_position()
                                && matches!(e, ParseError::Failure { .. })
                                && !matches!(f, ParseError::Failure { .. }))
                    });
                    if further {
                        furthest = Some(e);
                    }
                }
            }
        }
        match furthest {
            Some(e) if e.commits(pos) => Err(e),
            Some(e @ ParseError::Failure { .. }) => Err(e),
            _ if pos >= input.len() => Err(eof_error(pos, "more input")),
            _ => Err(ParseError::NoAlternative {
                position: pos,
                context: None,
            }),
        }
    }
}

#[derive(Clone)]
pub struct Preceded<P1, P2, I, O1> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1)>,
}

impl<P1, P2, I, O1> Preceded<P1, P2, I, O1> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, O2> for Preceded<P1, P2, I, O1>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O2> {
        let (pos, _) = self.parser1.parse(input, pos)?;
        self.parser2.parse(input, pos)
    }
}

#[derive(Clone)]
pub struct Terminated<P1, P2, I, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O2)>,
}

impl<P1, P2, I, O2> Terminated<P1, P2, I, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, O1> for Terminated<P1, P2, I, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O1> {
        let (pos, value) = self.parser1.parse(input, pos)?;
        let (pos, _) = self.parser2.parse(input, pos)?;
        Ok((pos, value))
    }
}

pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        let (pos, value) = self.parser.parse(input, pos)?;
        Ok((pos, (self.f)(value)))
    }
}

/// TryMap: like [`Map`], but the conversion may reject the value. A
/// rejection becomes a `Failure` at the position where the inner parser
/// started.
pub struct TryMap<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> TryMap<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for TryMap<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> Result<B, String>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        let (next, value) = self.parser.parse(input, pos)?;
        match (self.f)(value) {
            Ok(mapped) => Ok((next, mapped)),
            Err(message) => Err(ParseError::Failure {
                message,
                position: pos,
                context: None,
            }),
        }
    }
}

pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        let (pos, _) = self.parser.parse(input, pos)?;
        Ok((pos, ()))
    }
}

/// Located: pairs the output with the position where it started.
pub struct Located<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> Located<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, (usize, O)> for Located<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(usize, O)> {
        let (next, value) = self.parser.parse(input, pos)?;
        Ok((next, (pos, value)))
    }
}

/// Many: zero or more repetitions (see the module docs on commitment).
pub struct Many<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], mut pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        loop {
            match self.parser.parse(input, pos) {
                Ok((next, value)) => {
                    if next == pos {
                        break;
                    }
                    results.push(value);
                    pos = next;
                }
                Err(e) if e.commits(pos) => return Err(e),
                Err(_) => break,
            }
        }
        Ok((pos, results))
    }
}

/// SeparatedList: zero or more items separated by `separator`. A trailing
/// separator is left unconsumed for the caller to accept or reject.
pub struct SeparatedList<P, S, I, O> {
    item: P,
    separator: S,
    _phantom: PhantomData<(I, O)>,
}

impl<P, S, I, O> SeparatedList<P, S, I, O> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item,
            separator,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, I, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut pos = match self.item.parse(input, pos) {
            Ok((next, value)) => {
                results.push(value);
                next
            }
            Err(e) if e.commits(pos) => return Err(e),
            Err(_) => return Ok((pos, results)),
        };
        while let Ok((after_separator, _)) = self.separator.parse(input, pos) {
            match self.item.parse(input, after_separator) {
                Ok((next, value)) => {
                    results.push(value);
                    pos = next;
                }
                Err(e) if e.commits(after_separator) => return Err(e),
                Err(_) => break,
            }
        }
        Ok((pos, results))
    }
}

/// Optional: the inner value, or `None` if it did not match at all.
pub struct Optional<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Optional<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Option<O>> {
        match self.parser.parse(input, pos) {
            Ok((next, value)) => Ok((next, Some(value))),
            Err(e) if e.commits(pos) => Err(e),
            Err(_) => Ok((pos, None)),
        }
    }
}

pub struct Tuple2<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Tuple2<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (pos, o1) = self.parser1.parse(input, pos)?;
        let (pos, o2) = self.parser2.parse(input, pos)?;
        Ok((pos, (o1, o2)))
    }
}

pub struct Tuple3<P1, P2, P3, I, O1, O2, O3> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    _phantom: PhantomData<(I, O1, O2, O3)>,
}

impl<P1, P2, P3, I, O1, O2, O3> Tuple3<P1, P2, P3, I, O1, O2, O3> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, I, O1, O2, O3> Parser<I, (O1, O2, O3)> for Tuple3<P1, P2, P3, I, O1, O2, O3>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3)> {
        let (pos, o1) = self.parser1.parse(input, pos)?;
        let (pos, o2) = self.parser2.parse(input, pos)?;
        let (pos, o3) = self.parser3.parse(input, pos)?;
        Ok((pos, (o1, o2, o3)))
    }
}

pub struct Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    parser4: P4,
    _phantom: PhantomData<(I, O1, O2, O3, O4)>,
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3, parser4: P4) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            parser4,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Parser<I, (O1, O2, O3, O4)>
    for Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3, O4)> {
        let (pos, o1) = self.parser1.parse(input, pos)?;
        let (pos, o2) = self.parser2.parse(input, pos)?;
        let (pos, o3) = self.parser3.parse(input, pos)?;
        let (pos, o4) = self.parser4.parse(input, pos)?;
        Ok((pos, (o1, o2, o3, o4)))
    }
}

pub struct Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    parser4: P4,
    parser5: P5,
    _phantom: PhantomData<(I, O1, O2, O3, O4, O5)>,
}

impl<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3, parser4: P4, parser5: P5) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            parser4,
            parser5,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> Parser<I, (O1, O2, O3, O4, O5)>
    for Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
    P5: Parser<I, O5>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3, O4, O5)> {
        let (pos, o1) = self.parser1.parse(input, pos)?;
        let (pos, o2) = self.parser2.parse(input, pos)?;
        let (pos, o3) = self.parser3.parse(input, pos)?;
        let (pos, o4) = self.parser4.parse(input, pos)?;
        let (pos, o5) = self.parser5.parse(input, pos)?;
        Ok((pos, (o1, o2, o3, o4, o5)))
    }
}

pub struct Delimited<L, P, R, I, O> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(I, O)>,
}

impl<L, P, R, I, O> Delimited<L, P, R, I, O> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, L, P, R> Parser<I, O> for Delimited<L, P, R, I, O>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, value) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, value))
    }
}

/// Backtrack: any failure is reported at the starting position, so that
/// enclosing repetitions and choices treat it as "did not match".
pub struct Backtrack<P> {
    parser: P,
}

impl<P> Backtrack<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I, O, P> Parser<I, O> for Backtrack<P>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|_| ParseError::NoAlternative {
                position: pos,
                context: None,
            })
    }
}

#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|e| e.with_context(&self.context.to_string()))
    }
}

/// Lazy: builds the inner parser on use, which is what lets the grammar
/// refer to itself.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.f)().parse(input, pos)
    }
}

/// Nested: counts how deep the grammar has recursed through parsers like
/// this one and fails with a [`ParseError::Fatal`] past
/// [`MAX_NESTING_DEPTH`].
#[derive(Clone)]
pub struct Nested<P> {
    parser: P,
}

impl<P> Nested<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

struct NestingGuard;

impl NestingGuard {
    fn enter() -> (Self, usize) {
        let depth = NESTING.with(|nesting| {
            let depth = nesting.get() + 1;
            nesting.set(depth);
            depth
        });
        (NestingGuard, depth)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        NESTING.with(|nesting| nesting.set(nesting.get().saturating_sub(1)));
    }
}

impl<I, O, P> Parser<I, O> for Nested<P>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (_guard, depth) = NestingGuard::enter();
        if depth > MAX_NESTING_DEPTH {
            return Err(ParseError::Fatal {
                message: "code too deeply nested".to_string(),
                position: pos,
            });
        }
        self.parser.parse(input, pos)
    }
}

/// Commit: turns a [`ParseError::Failure`] of the inner parser into a
/// [`ParseError::Fatal`], for input that cannot mean anything else.
#[derive(Clone)]
pub struct Commit<P> {
    parser: P,
}

impl<P> Commit<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I, O, P> Parser<I, O> for Commit<P>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser.parse(input, pos).map_err(|e| match e {
            ParseError::Failure {
                message, position, ..
            } => ParseError::Fatal { message, position },
            other => other,
        })
    }
}
