use super::super::{combinators::Choice, core::*, prelude::*};
use super::{common::*, expression::*, types::*};
use crate::ast::{
    Declarator, Expression, Statement, StatementKind, Statements, TypeName, VariableDeclaration,
};
use crate::tokenizer::{keyword::Keyword, symbol::Delimiter, token::Token};

pub fn parse_statement() -> impl Parser<Token, Statement> {
    with_context(nested(lazy(parse_statement_choice)), "statement")
}

// Kept outside `parse_statement` so its body is not in the defining scope of
// `parse_statement`'s opaque return type (works around a rustc MIR ICE).
fn parse_statement_choice() -> Choice<Token, Statement> {
    choice(vec![
        Box::new(parse_block_statement()),
        Box::new(parse_local_variable_statement()),
        Box::new(parse_if_statement()),
        Box::new(parse_while_statement()),
        Box::new(parse_do_while_statement()),
        Box::new(parse_for_statement()),
        Box::new(parse_for_each_statement()),
        Box::new(parse_jump_statement()),
        Box::new(parse_return_statement()),
        Box::new(parse_throw_statement()),
        Box::new(parse_empty_statement()),
        Box::new(parse_unsupported_statement()),
        Box::new(parse_expression_statement()),
    ])
}

pub fn parse_block() -> impl Parser<Token, Statements> {
    with_context(
        delimited(
            parse_open_brace(),
            many(lazy(parse_statement)),
            parse_close_brace(),
        ),
        "block",
    )
}

fn parse_block_statement() -> impl Parser<Token, Statement> {
    map(located(parse_block()), |(pos, statements)| {
        Statement::new(StatementKind::Block(statements), pos)
    })
}

fn parse_declarator_rest() -> impl Parser<Token, (usize, Option<Initializer>)> {
    tuple2(
        parse_dimensions(),
        optional(preceded(parse_equal(), parse_variable_initializer())),
    )
}

type DeclaratorParts = ((usize, String), (usize, Option<Initializer>));

fn build_declarator(ty: &TypeName, parts: DeclaratorParts) -> Result<Declarator, String> {
    let ((pos, name), (extra_dimensions, init)) = parts;
    let declared = ty.clone().array_of(extra_dimensions);
    let init = init
        .map(|initializer| initializer_into_expression(initializer, &declared))
        .transpose()?;
    Ok(Declarator {
        name,
        extra_dimensions,
        init,
        pos,
    })
}

/// `int a = 1, b[] = {2}` without the trailing semicolon, shared by local
/// variables, fields and `for` headers.
///
/// The `type name` prefix is parsed with [`backtrack`], so `a[i] = 1` and
/// `x = 1` fall through to expression statements.
pub fn parse_variable_declaration() -> impl Parser<Token, VariableDeclaration> {
    try_map(
        tuple3(
            backtrack(tuple2(parse_type(), located(parse_identifier()))),
            parse_declarator_rest(),
            many(preceded(
                parse_comma(),
                tuple2(located(parse_identifier()), parse_declarator_rest()),
            )),
        ),
        |((ty, first_name), first_rest, others)| {
            let mut declarators = vec![build_declarator(&ty, (first_name, first_rest))?];
            for parts in others {
                declarators.push(build_declarator(&ty, parts)?);
            }
            Ok(VariableDeclaration { ty, declarators })
        },
    )
}

fn parse_local_variable_statement() -> impl Parser<Token, Statement> {
    map(
        located(delimited(
            as_unit(parse_modifiers()),
            parse_variable_declaration(),
            parse_semicolon(),
        )),
        |(pos, declaration)| Statement::new(StatementKind::LocalVariable(declaration), pos),
    )
}

fn parse_parenthesized() -> impl Parser<Token, Expression> {
    delimited(
        parse_open_paren(),
        lazy(parse_expression),
        parse_close_paren(),
    )
}

fn parse_if_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            located(tuple4(
                parse_keyword(Keyword::If),
                parse_parenthesized(),
                lazy(parse_statement),
                optional(preceded(
                    parse_keyword(Keyword::Else),
                    lazy(parse_statement),
                )),
            )),
            |(pos, (_, condition, then_branch, else_branch))| {
                Statement::new(
                    StatementKind::If {
                        condition,
                        then_branch: Box::new(then_branch),
                        else_branch: else_branch.map(Box::new),
                    },
                    pos,
                )
            },
        ),
        "if statement",
    )
}

fn parse_while_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            located(tuple3(
                parse_keyword(Keyword::While),
                parse_parenthesized(),
                lazy(parse_statement),
            )),
            |(pos, (_, condition, body))| {
                Statement::new(
                    StatementKind::While {
                        condition,
                        body: Box::new(body),
                    },
                    pos,
                )
            },
        ),
        "while statement",
    )
}

fn parse_do_while_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            located(tuple5(
                parse_keyword(Keyword::Do),
                lazy(parse_statement),
                parse_keyword(Keyword::While),
                parse_parenthesized(),
                parse_semicolon(),
            )),
            |(pos, (_, body, _, condition, _))| {
                Statement::new(
                    StatementKind::DoWhile {
                        body: Box::new(body),
                        condition,
                    },
                    pos,
                )
            },
        ),
        "do statement",
    )
}

/// The init part of a classic `for`: a declaration or a list of
/// expression statements.
fn parse_for_init() -> impl Parser<Token, Statements> {
    choice(vec![
        Box::new(map(
            located(preceded(as_unit(parse_modifiers()), parse_variable_declaration())),
            |(pos, declaration)| {
                vec![Statement::new(StatementKind::LocalVariable(declaration), pos)]
            },
        )),
        Box::new(map(
            separated_list(lazy(parse_expression), parse_comma()),
            |expressions| {
                expressions
                    .into_iter()
                    .map(|expression| {
                        let pos = expression.pos;
                        Statement::new(StatementKind::Expression(expression), pos)
                    })
                    .collect::<Statements>()
            },
        )),
    ])
}

type ForHeader = (Statements, Option<Expression>, Vec<Expression>);

fn parse_for_header() -> impl Parser<Token, ForHeader> {
    delimited(
        parse_open_paren(),
        tuple3(
            terminated(parse_for_init(), parse_semicolon()),
            terminated(optional(lazy(parse_expression)), parse_semicolon()),
            separated_list(lazy(parse_expression), parse_comma()),
        ),
        parse_close_paren(),
    )
}

fn parse_for_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            located(tuple3(
                parse_keyword(Keyword::For),
                backtrack_unless_classic(parse_for_header()),
                lazy(parse_statement),
            )),
            |(pos, (_, (init, condition, update), body))| {
                Statement::new(
                    StatementKind::For {
                        init,
                        condition,
                        update,
                        body: Box::new(body),
                    },
                    pos,
                )
            },
        ),
        "for statement",
    )
}

/// A classic header that fails on `:` is an enhanced `for`; its error must
/// not be committed, so the enhanced form gets its turn.
fn backtrack_unless_classic<P>(header: P) -> impl Parser<Token, ForHeader>
where
    P: Parser<Token, ForHeader>,
{
    ClassicHeader { header }
}

struct ClassicHeader<P> {
    header: P,
}

impl<P> Parser<Token, ForHeader> for ClassicHeader<P>
where
    P: Parser<Token, ForHeader>,
{
    fn parse(&self, input: &[Token], pos: usize) -> ParseResult<ForHeader> {
        match self.header.parse(input, pos) {
            Err(e)
                if matches!(
                    input.get(e.get_position()),
                    Some(Token::Delimiter(Delimiter::Colon))
                ) =>
            {
                Err(ParseError::NoAlternative {
                    position: pos,
                    context: None,
                })
            }
            result => result,
        }
    }
}

fn parse_for_each_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            located(tuple3(
                parse_keyword(Keyword::For),
                delimited(
                    parse_open_paren(),
                    tuple4(
                        preceded(as_unit(parse_modifiers()), parse_type()),
                        parse_identifier(),
                        parse_delimiter(Delimiter::Colon),
                        lazy(parse_expression),
                    ),
                    parse_close_paren(),
                ),
                lazy(parse_statement),
            )),
            |(pos, (_, (ty, name, _, iterable), body))| {
                Statement::new(
                    StatementKind::ForEach {
                        ty,
                        name,
                        iterable,
                        body: Box::new(body),
                    },
                    pos,
                )
            },
        ),
        "for statement",
    )
}

fn parse_jump_statement() -> impl Parser<Token, Statement> {
    map(
        located(terminated(
            satisfy("'break' or 'continue'", |token: &Token| match token {
                Token::Keyword(Keyword::Break) => Some(StatementKind::Break),
                Token::Keyword(Keyword::Continue) => Some(StatementKind::Continue),
                _ => None,
            }),
            parse_semicolon(),
        )),
        |(pos, kind)| Statement::new(kind, pos),
    )
}

fn parse_return_statement() -> impl Parser<Token, Statement> {
    map(
        located(delimited(
            as_unit(parse_keyword(Keyword::Return)),
            optional(lazy(parse_expression)),
            parse_semicolon(),
        )),
        |(pos, value)| Statement::new(StatementKind::Return(value), pos),
    )
}

fn parse_throw_statement() -> impl Parser<Token, Statement> {
    map(
        located(delimited(
            as_unit(parse_keyword(Keyword::Throw)),
            lazy(parse_expression),
            parse_semicolon(),
        )),
        |(pos, value)| Statement::new(StatementKind::Throw(value), pos),
    )
}

fn parse_empty_statement() -> impl Parser<Token, Statement> {
    map(located(parse_semicolon()), |(pos, _)| {
        Statement::new(StatementKind::Empty, pos)
    })
}

/// Statements the interpreter has no support for get a clear message
/// instead of a generic syntax error.
fn parse_unsupported_statement() -> impl Parser<Token, Statement> {
    try_map(
        satisfy("statement", |token: &Token| match token {
            Token::Keyword(
                kw @ (Keyword::Switch
                | Keyword::Case
                | Keyword::Default
                | Keyword::Try
                | Keyword::Catch
                | Keyword::Finally
                | Keyword::Synchronized
                | Keyword::Assert
                | Keyword::Class
                | Keyword::Interface
                | Keyword::Enum
                | Keyword::Goto
                | Keyword::Const),
            ) => Some(*kw),
            _ => None,
        }),
        |keyword: Keyword| -> Result<Statement, String> {
            Err(format!("'{}' is not supported", keyword))
        },
    )
}

fn parse_expression_statement() -> impl Parser<Token, Statement> {
    try_map(
        located(terminated(lazy(parse_expression), parse_semicolon())),
        |(pos, expression): (usize, Expression)| {
            if expression.is_statement_expression() {
                Ok(Statement::new(StatementKind::Expression(expression), pos))
            } else {
                Err("not a statement".to_string())
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExpressionKind, Literal as AstLiteral};
    use crate::tokenizer::{
        keyword::PrimitiveType,
        literal::Literal,
        symbol::Operator,
    };

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
    fn test_local_variable_declaration() {
        // int a = 1, b[];
        let input = vec![
            Token::Type(PrimitiveType::Int),
            ident("a"),
            delim(Delimiter::Equal),
            int(1),
            delim(Delimiter::Comma),
            ident("b"),
            delim(Delimiter::OpenBracket),
            delim(Delimiter::CloseBracket),
            delim(Delimiter::Semicolon),
        ];
        let (pos, statement) = parse_statement().parse(&input, 0).unwrap();
        assert_eq!(pos, 9);
        assert_eq!(
            statement,
            Statement::new(
                StatementKind::LocalVariable(VariableDeclaration {
                    ty: TypeName::Primitive(PrimitiveType::Int),
                    declarators: vec![
                        Declarator {
                            name: "a".to_string(),
                            extra_dimensions: 0,
                            init: Some(Expression::new(
                                ExpressionKind::Literal(AstLiteral::Int(1)),
                                3
                            )),
                            pos: 1,
                        },
                        Declarator {
                            name: "b".to_string(),
                            extra_dimensions: 1,
                            init: None,
                            pos: 5,
                        },
                    ],
                }),
                0
            )
        );
    }

    #[test]
    fn test_array_initializer_takes_declared_type() {
        // int[] a = {1, 2};
        let input = vec![
            Token::Type(PrimitiveType::Int),
            delim(Delimiter::OpenBracket),
            delim(Delimiter::CloseBracket),
            ident("a"),
            delim(Delimiter::Equal),
            delim(Delimiter::OpenBrace),
            int(1),
            delim(Delimiter::Comma),
            int(2),
            delim(Delimiter::CloseBrace),
            delim(Delimiter::Semicolon),
        ];
        let (_, statement) = parse_statement().parse(&input, 0).unwrap();
        let StatementKind::LocalVariable(declaration) = statement.kind else {
            panic!("expected declaration");
        };
        let init = declaration.declarators[0].init.clone().unwrap();
        assert!(matches!(
            init.kind,
            ExpressionKind::ArrayInit { ref ty, ref elements }
                if *ty == TypeName::Primitive(PrimitiveType::Int).array_of(1) && elements.len() == 2
        ));
    }

    #[test]
    fn test_index_assignment_is_an_expression_statement() {
        // a[i] = 5;
        let input = vec![
            ident("a"),
            delim(Delimiter::OpenBracket),
            ident("i"),
            delim(Delimiter::CloseBracket),
            delim(Delimiter::Equal),
            int(5),
            delim(Delimiter::Semicolon),
        ];
        let (pos, statement) = parse_statement().parse(&input, 0).unwrap();
        assert_eq!(pos, 7);
        assert!(matches!(statement.kind, StatementKind::Expression(_)));
    }

    #[test]
    fn test_not_a_statement() {
        // x + 1;
        let input = vec![
            ident("x"),
            Token::Operator(Operator::Plus),
            int(1),
            delim(Delimiter::Semicolon),
        ];
        let err = parse_statement().parse(&input, 0).unwrap_err();
        assert_eq!(err.describe(), "not a statement");
    }

    #[test]
    fn test_missing_semicolon() {
        // x = 1 y = 2;
        let input = vec![
            ident("x"),
            delim(Delimiter::Equal),
            int(1),
            ident("y"),
            delim(Delimiter::Equal),
            int(2),
            delim(Delimiter::Semicolon),
        ];
        let err = parse_statement().parse(&input, 0).unwrap_err();
        assert_eq!(err.get_position(), 3);
        assert_eq!(err.describe(), "';' expected but found 'y'");
    }

    #[test]
    fn test_classic_and_enhanced_for() {
        // for (int i = 0; i < 3; i++) ;
        let input = vec![
            Token::Keyword(Keyword::For),
            delim(Delimiter::OpenParen),
            Token::Type(PrimitiveType::Int),
            ident("i"),
            delim(Delimiter::Equal),
            int(0),
            delim(Delimiter::Semicolon),
            ident("i"),
            Token::Operator(Operator::Less),
            int(3),
            delim(Delimiter::Semicolon),
            ident("i"),
            Token::Operator(Operator::Increment),
            delim(Delimiter::CloseParen),
            delim(Delimiter::Semicolon),
        ];
        let (pos, statement) = parse_statement().parse(&input, 0).unwrap();
        assert_eq!(pos, input.len());
        let StatementKind::For {
            init,
            condition,
            update,
            ..
        } = statement.kind
        else {
            panic!("expected for");
        };
        assert_eq!(init.len(), 1);
        assert!(condition.is_some());
        assert_eq!(update.len(), 1);

        // for (int x : xs) ;
        let input = vec![
            Token::Keyword(Keyword::For),
            delim(Delimiter::OpenParen),
            Token::Type(PrimitiveType::Int),
            ident("x"),
            delim(Delimiter::Colon),
            ident("xs"),
            delim(Delimiter::CloseParen),
            delim(Delimiter::Semicolon),
        ];
        let (_, statement) = parse_statement().parse(&input, 0).unwrap();
        assert!(matches!(
            statement.kind,
            StatementKind::ForEach { ref name, .. } if name == "x"
        ));
    }

    #[test]
    fn test_if_else() {
        // if (b) return 1; else return 2;
        let input = vec![
            Token::Keyword(Keyword::If),
            delim(Delimiter::OpenParen),
            ident("b"),
            delim(Delimiter::CloseParen),
            Token::Keyword(Keyword::Return),
            int(1),
            delim(Delimiter::Semicolon),
            Token::Keyword(Keyword::Else),
            Token::Keyword(Keyword::Return),
            int(2),
            delim(Delimiter::Semicolon),
        ];
        let (pos, statement) = parse_statement().parse(&input, 0).unwrap();
        assert_eq!(pos, 11);
        assert!(matches!(
            statement.kind,
            StatementKind::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_switch() {
        let input = vec![
            Token::Keyword(Keyword::Switch),
            delim(Delimiter::OpenParen),
            ident("x"),
            delim(Delimiter::CloseParen),
        ];
        let err = parse_statement().parse(&input, 0).unwrap_err();
        assert_eq!(err.describe(), "'switch' is not supported");
    }
}
