//! Top-level units: a class, a bare list of methods, loose statements or a
//! single expression.

use super::super::{core::*, prelude::*};
use super::{common::*, expression::*, statement::*, types::*};
use crate::ast::{
    ClassDecl, CompilationUnit, FieldDecl, MethodDecl, Parameter, Statement, StatementKind,
};
use crate::tokenizer::{keyword::Keyword, symbol::Delimiter, token::Token};

/// Name of the class that wraps a bare list of methods.
pub const IMPLICIT_CLASS_NAME: &str = "Main";

#[derive(Debug, Clone, PartialEq)]
enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
}

/// `import` and `package` lines carry no meaning here and are skipped.
fn parse_imports() -> impl Parser<Token, ()> {
    as_unit(many(tuple3(
        satisfy("import", |token: &Token| match token {
            Token::Keyword(Keyword::Import | Keyword::Package) => Some(()),
            _ => None,
        }),
        many(satisfy("name", |token: &Token| match token {
            Token::Delimiter(Delimiter::Semicolon) => None,
            _ => Some(()),
        })),
        parse_semicolon(),
    )))
}

fn parse_parameter() -> impl Parser<Token, Parameter> {
    with_context(
        map(
            tuple4(
                as_unit(parse_modifiers()),
                parse_type(),
                parse_identifier(),
                parse_dimensions(),
            ),
            |(_, ty, name, dimensions)| Parameter {
                ty: ty.array_of(dimensions),
                name,
            },
        ),
        "parameter",
    )
}

fn parse_parameters() -> impl Parser<Token, Vec<Parameter>> {
    delimited(
        parse_open_paren(),
        separated_list(parse_parameter(), parse_comma()),
        parse_close_paren(),
    )
}

fn parse_throws() -> impl Parser<Token, Vec<String>> {
    preceded(
        parse_keyword(Keyword::Throws),
        separated_list(parse_identifier(), parse_comma()),
    )
}

fn parse_method() -> impl Parser<Token, MethodDecl> {
    with_context(
        map(
            located(tuple5(
                parse_type(),
                parse_identifier(),
                parse_parameters(),
                optional(parse_throws()),
                parse_block(),
            )),
            |(pos, (return_type, name, parameters, _, body))| MethodDecl {
                name,
                return_type,
                parameters,
                body,
                pos,
            },
        ),
        "method",
    )
}

fn parse_field() -> impl Parser<Token, FieldDecl> {
    map(
        located(terminated(parse_variable_declaration(), parse_semicolon())),
        |(pos, declaration)| FieldDecl { declaration, pos },
    )
}

fn parse_member() -> impl Parser<Token, Member> {
    preceded(
        as_unit(parse_modifiers()),
        choice(vec![
            Box::new(map(parse_method(), Member::Method)),
            Box::new(map(parse_field(), Member::Field)),
        ]),
    )
}

fn collect_members(name: String, implicit: bool, members: Vec<Member>, pos: usize) -> ClassDecl {
    let mut class = ClassDecl {
        name,
        implicit,
        fields: Vec::new(),
        methods: Vec::new(),
        pos,
    };
    for member in members {
        match member {
            Member::Field(field) => class.fields.push(field),
            Member::Method(method) => class.methods.push(method),
        }
    }
    class
}

pub fn parse_class_declaration() -> impl Parser<Token, ClassDecl> {
    with_context(
        map(
            located(tuple4(
                as_unit(parse_modifiers()),
                preceded(parse_keyword(Keyword::Class), parse_identifier()),
                parse_open_brace(),
                terminated(many(parse_member()), parse_close_brace()),
            )),
            |(pos, (_, name, _, members))| collect_members(name, false, members, pos),
        ),
        "class",
    )
}

/// `modifiers type name (`: the start of a method outside any class.
fn parse_method_lookahead() -> impl Parser<Token, ()> {
    as_unit(backtrack(tuple4(
        parse_modifiers(),
        parse_type(),
        parse_identifier(),
        parse_open_paren(),
    )))
}

/// The declaration keyword after any modifiers, if the unit starts with one.
fn declaration_keyword(tokens: &[Token], start: usize) -> Option<(usize, Keyword)> {
    tokens[start..]
        .iter()
        .enumerate()
        .find(|(_, token)| !matches!(token, Token::Keyword(kw) if kw.is_modifier()))
        .and_then(|(offset, token)| match token {
            Token::Keyword(kw @ (Keyword::Class | Keyword::Interface | Keyword::Enum)) => {
                Some((start + offset, *kw))
            }
            _ => None,
        })
}

/// Parses a whole token stream.
///
/// The shape is decided up front: a `class` declaration, a list of methods
/// (wrapped in an implicit [`IMPLICIT_CLASS_NAME`] class), a single
/// expression, and finally loose statements. When both of the last two
/// fail, the error that got further wins.
#[tracing::instrument(level = "debug", skip(tokens))]
pub fn parse_compilation_unit(tokens: &[Token]) -> Result<CompilationUnit, ParseError> {
    let (start, _) = parse_imports().parse(tokens, 0)?;

    match declaration_keyword(tokens, start) {
        Some((_, Keyword::Class)) => {
            let (_, class) =
                terminated(parse_class_declaration(), end_of_input()).parse(tokens, start)?;
            return Ok(CompilationUnit::Class(class));
        }
        Some((position, keyword)) => {
            return Err(ParseError::Failure {
                message: format!("'{}' declarations are not supported", keyword),
                position,
                context: None,
            });
        }
        None => {}
    }

    if parse_method_lookahead().parse(tokens, start).is_ok() {
        let (_, members) =
            terminated(many(parse_member()), end_of_input()).parse(tokens, start)?;
        return Ok(CompilationUnit::Class(collect_members(
            IMPLICIT_CLASS_NAME.to_string(),
            true,
            members,
            start,
        )));
    }

    let expression = terminated(
        tuple2(parse_expression(), optional(parse_semicolon())),
        end_of_input(),
    )
    .parse(tokens, start);
    let expression_error = match expression {
        // `run();` is a statement, `a + b;` still has a value.
        Ok((_, (expression, Some(_)))) if expression.is_statement_expression() => {
            let pos = expression.pos;
            return Ok(CompilationUnit::Block(vec![Statement::new(
                StatementKind::Expression(expression),
                pos,
            )]));
        }
        Ok((_, (expression, _))) => return Ok(CompilationUnit::Expression(expression)),
        Err(e @ ParseError::Fatal { .. }) => return Err(e),
        Err(e) => e,
    };

    match terminated(many(parse_statement()), end_of_input()).parse(tokens, start) {
        Ok((_, statements)) => Ok(CompilationUnit::Block(statements)),
        Err(block_error) => {
            tracing::debug!("not an expression: {}", expression_error);
            if expression_error.get_position() > block_error.get_position() {
                Err(expression_error)
            } else {
                Err(block_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExpressionKind, TypeName};
    use crate::tokenizer::{keyword::PrimitiveType, literal::Literal, symbol::Operator};

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    fn int(value: i64) -> Token {
        Token::Literal(Literal::Integer(value))
    }

    fn delim(delimiter: Delimiter) -> Token {
        Token::Delimiter(delimiter)
    }

    #[test]
    fn test_expression_unit() {
        let input = vec![int(1), Token::Operator(Operator::Plus), int(2)];
        let unit = parse_compilation_unit(&input).unwrap();
        assert!(matches!(
            unit,
            CompilationUnit::Expression(ref e) if matches!(e.kind, ExpressionKind::Binary { .. })
        ));

        // A trailing semicolon is still an expression.
        let input = vec![int(1), delim(Delimiter::Semicolon)];
        assert!(matches!(
            parse_compilation_unit(&input).unwrap(),
            CompilationUnit::Expression(_)
        ));

        // ...unless the expression is a statement on its own.
        let input = vec![
            ident("run"),
            delim(Delimiter::OpenParen),
            delim(Delimiter::CloseParen),
            delim(Delimiter::Semicolon),
        ];
        assert!(matches!(
            parse_compilation_unit(&input).unwrap(),
            CompilationUnit::Block(ref statements) if statements.len() == 1
        ));
    }

    #[test]
    fn test_block_unit() {
        // int x = 1; return x;
        let input = vec![
            Token::Type(PrimitiveType::Int),
            ident("x"),
            delim(Delimiter::Equal),
            int(1),
            delim(Delimiter::Semicolon),
            Token::Keyword(Keyword::Return),
            ident("x"),
            delim(Delimiter::Semicolon),
        ];
        let CompilationUnit::Block(statements) = parse_compilation_unit(&input).unwrap() else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[1].kind, StatementKind::Return(Some(_))));
    }

    #[test]
    fn test_class_unit() {
        // import java.util.*; public class Main { static int n = 1; public static void main(String[] args) { } }
        let input = vec![
            Token::Keyword(Keyword::Import),
            ident("java"),
            Token::Operator(Operator::Dot),
            ident("util"),
            Token::Operator(Operator::Dot),
            Token::Operator(Operator::Multiply),
            delim(Delimiter::Semicolon),
            Token::Keyword(Keyword::Public),
            Token::Keyword(Keyword::Class),
            ident("Main"),
            delim(Delimiter::OpenBrace),
            Token::Keyword(Keyword::Static),
            Token::Type(PrimitiveType::Int),
            ident("n"),
            delim(Delimiter::Equal),
            int(1),
            delim(Delimiter::Semicolon),
            Token::Keyword(Keyword::Public),
            Token::Keyword(Keyword::Static),
            Token::Type(PrimitiveType::Void),
            ident("main"),
            delim(Delimiter::OpenParen),
            ident("String"),
            delim(Delimiter::OpenBracket),
            delim(Delimiter::CloseBracket),
            ident("args"),
            delim(Delimiter::CloseParen),
            delim(Delimiter::OpenBrace),
            delim(Delimiter::CloseBrace),
            delim(Delimiter::CloseBrace),
        ];
        let CompilationUnit::Class(class) = parse_compilation_unit(&input).unwrap() else {
            panic!("expected class");
        };
        assert_eq!(class.name, "Main");
        assert!(!class.implicit);
        assert_eq!(class.fields.len(), 1);
        let main = class.method("main").unwrap();
        assert_eq!(
            main.parameters[0].ty,
            TypeName::Named("String".to_string()).array_of(1)
        );
    }

    #[test]
    fn test_method_list_unit() {
        // int twice(int x) { return x * 2; }
        let input = vec![
            Token::Type(PrimitiveType::Int),
            ident("twice"),
            delim(Delimiter::OpenParen),
            Token::Type(PrimitiveType::Int),
            ident("x"),
            delim(Delimiter::CloseParen),
            delim(Delimiter::OpenBrace),
            Token::Keyword(Keyword::Return),
            ident("x"),
            Token::Operator(Operator::Multiply),
            int(2),
            delim(Delimiter::Semicolon),
            delim(Delimiter::CloseBrace),
        ];
        let CompilationUnit::Class(class) = parse_compilation_unit(&input).unwrap() else {
            panic!("expected class");
        };
        assert!(class.implicit);
        assert_eq!(class.name, IMPLICIT_CLASS_NAME);
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn test_unclosed_class_reports_end_of_file() {
        let input = vec![
            Token::Keyword(Keyword::Class),
            ident("Main"),
            delim(Delimiter::OpenBrace),
        ];
        let err = parse_compilation_unit(&input).unwrap_err();
        assert_eq!(err.describe(), "reached end of file while parsing");
    }

    #[test]
    fn test_interface_is_rejected() {
        let input = vec![
            Token::Keyword(Keyword::Public),
            Token::Keyword(Keyword::Interface),
            ident("Shape"),
        ];
        let err = parse_compilation_unit(&input).unwrap_err();
        assert_eq!(err.get_position(), 1);
        assert_eq!(err.describe(), "'interface' declarations are not supported");
    }
}
