use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    literal::{INT_LITERAL_LIMIT, LONG_LITERAL_LIMIT, Literal},
    symbol::{Delimiter, Operator},
    token::Token,
};

pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy("identifier", |token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

pub fn parse_keyword(keyword: Keyword) -> impl Parser<Token, Token> {
    equal(Token::Keyword(keyword))
}

pub fn parse_operator(operator: Operator) -> impl Parser<Token, Token> {
    equal(Token::Operator(operator))
}

pub fn parse_delimiter(delimiter: Delimiter) -> impl Parser<Token, Token> {
    equal(Token::Delimiter(delimiter))
}

pub fn parse_semicolon() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::Semicolon))
}

pub fn parse_comma() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::Comma))
}

pub fn parse_equal() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::Equal))
}

pub fn parse_open_paren() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::OpenParen))
}

pub fn parse_close_paren() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::CloseParen))
}

pub fn parse_open_bracket() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::OpenBracket))
}

pub fn parse_close_bracket() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::CloseBracket))
}

pub fn parse_open_brace() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::OpenBrace))
}

pub fn parse_close_brace() -> impl Parser<Token, ()> {
    as_unit(parse_delimiter(Delimiter::CloseBrace))
}

/// `[]` pairs, as in `int[][]`.
pub fn parse_dimensions() -> impl Parser<Token, usize> {
    map(
        many(tuple2(parse_open_bracket(), parse_close_bracket())),
        |pairs| pairs.len(),
    )
}

pub fn parse_modifiers() -> impl Parser<Token, Vec<Keyword>> {
    many(satisfy("modifier", |token: &Token| match token {
        Token::Keyword(kw) if kw.is_modifier() => Some(*kw),
        _ => None,
    }))
}

/// A literal token. Integer literals must fit their type here; negated
/// literals are handled by the unary parser, which sees the minus sign.
/// An out of range literal is an error wherever it appears.
pub fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        commit(try_map(
            satisfy("literal", |token: &Token| match token {
                Token::Literal(literal) => Some(literal.clone()),
                _ => None,
            }),
            |literal| convert_literal(literal, false),
        )),
        "literal",
    )
}

pub(crate) fn convert_literal(literal: Literal, negated: bool) -> Result<ast::Literal, String> {
    Ok(match literal {
        Literal::Integer(value) => {
            let value = if negated { -value } else { value };
            if value >= INT_LITERAL_LIMIT {
                return Err("integer number too large".to_string());
            }
            ast::Literal::Int(value as i32)
        }
        Literal::Long(value) => {
            let value = if negated { -value } else { value };
            if value >= LONG_LITERAL_LIMIT {
                return Err("long number too large".to_string());
            }
            ast::Literal::Long(value as i64)
        }
        Literal::Double(value) => ast::Literal::Double(if negated { -value } else { value }),
        Literal::Boolean(value) => ast::Literal::Boolean(value),
        Literal::Char(value) => ast::Literal::Char(value),
        Literal::String(value) => ast::Literal::String(value),
        Literal::Null => ast::Literal::Null,
    })
}
