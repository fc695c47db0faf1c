//! Expression grammar.
//!
//! Precedence, lowest first:
//!
//! ```text
//! assignment      = conditional [ assign_op assignment ]
//! conditional     = logical_or [ "?" expression ":" conditional ]
//! logical_or      = logical_and { "||" logical_and }
//! logical_and     = bit_or { "&&" bit_or }
//! bit_or          = bit_xor { "|" bit_xor }
//! bit_xor         = bit_and { "^" bit_and }
//! bit_and         = equality { "&" equality }
//! equality        = relational { ("==" | "!=") relational }
//! relational      = shift { ("<" | ">" | "<=" | ">=") shift }
//! shift           = additive { ("<<" | ">>" | ">>>") additive }
//! additive        = multiplicative { ("+" | "-") multiplicative }
//! multiplicative  = unary { ("*" | "/" | "%") unary }
//! unary           = "-" number | ("++" | "--") unary | ("+" | "-" | "!" | "~") unary
//!                 | "(" primitive ")" unary | postfix
//! postfix         = primary { "." name [ arguments ] | "[" expression "]" | "++" | "--" }
//! primary         = literal | new | name [ arguments ] | "(" expression ")"
//! ```

use super::super::{core::*, prelude::*};
use super::{common::*, types::*};
use crate::ast::{
    BinaryOperator, Expression, ExpressionKind, IncDec, TypeName, UnaryOperator,
};
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

type OperatorTable = &'static [(Operator, BinaryOperator)];

const LOGICAL_OR: OperatorTable = &[(Operator::Or, BinaryOperator::Or)];
const LOGICAL_AND: OperatorTable = &[(Operator::And, BinaryOperator::And)];
const BIT_OR: OperatorTable = &[(Operator::BitOr, BinaryOperator::BitOr)];
const BIT_XOR: OperatorTable = &[(Operator::BitXor, BinaryOperator::BitXor)];
const BIT_AND: OperatorTable = &[(Operator::BitAnd, BinaryOperator::BitAnd)];
const EQUALITY: OperatorTable = &[
    (Operator::EqualEqual, BinaryOperator::Equal),
    (Operator::NotEqual, BinaryOperator::NotEqual),
];
const RELATIONAL: OperatorTable = &[
    (Operator::Less, BinaryOperator::LessThan),
    (Operator::Greater, BinaryOperator::GreaterThan),
    (Operator::LessEqual, BinaryOperator::LessThanEqual),
    (Operator::GreaterEqual, BinaryOperator::GreaterThanEqual),
];
const SHIFT: OperatorTable = &[
    (Operator::ShiftLeft, BinaryOperator::ShiftLeft),
    (Operator::ShiftRight, BinaryOperator::ShiftRight),
    (Operator::UnsignedShiftRight, BinaryOperator::UnsignedShiftRight),
];
const ADDITIVE: OperatorTable = &[
    (Operator::Plus, BinaryOperator::Add),
    (Operator::Minus, BinaryOperator::Subtract),
];
const MULTIPLICATIVE: OperatorTable = &[
    (Operator::Multiply, BinaryOperator::Multiply),
    (Operator::Divide, BinaryOperator::Divide),
    (Operator::Modulo, BinaryOperator::Remainder),
];

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(nested(lazy(parse_assignment)), "expression")
}

fn parse_assignment() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_conditional(),
            optional(tuple2(
                parse_assignment_operator(),
                nested(lazy(parse_assignment)),
            )),
        ),
        |(target, assignment)| match assignment {
            None => target,
            Some((op, value)) => {
                let pos = target.pos;
                Expression::new(
                    ExpressionKind::Assign {
                        op,
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    pos,
                )
            }
        },
    )
}

/// `=` yields `None`, compound operators the operator they apply.
fn parse_assignment_operator() -> impl Parser<Token, Option<BinaryOperator>> {
    satisfy("assignment operator", |token: &Token| match token {
        Token::Delimiter(Delimiter::Equal) => Some(None),
        Token::Operator(op) => compound_assignment(*op).map(Some),
        _ => None,
    })
}

fn compound_assignment(op: Operator) -> Option<BinaryOperator> {
    match op {
        Operator::PlusAssign => Some(BinaryOperator::Add),
        Operator::MinusAssign => Some(BinaryOperator::Subtract),
        Operator::MultiplyAssign => Some(BinaryOperator::Multiply),
        Operator::DivideAssign => Some(BinaryOperator::Divide),
        Operator::ModuloAssign => Some(BinaryOperator::Remainder),
        Operator::BitAndAssign => Some(BinaryOperator::BitAnd),
        Operator::BitOrAssign => Some(BinaryOperator::BitOr),
        Operator::BitXorAssign => Some(BinaryOperator::BitXor),
        Operator::ShiftLeftAssign => Some(BinaryOperator::ShiftLeft),
        Operator::ShiftRightAssign => Some(BinaryOperator::ShiftRight),
        Operator::UnsignedShiftRightAssign => Some(BinaryOperator::UnsignedShiftRight),
        _ => None,
    }
}

fn parse_conditional() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_logical_or(),
            optional(tuple4(
                parse_operator(Operator::Question),
                lazy(parse_expression),
                parse_delimiter(Delimiter::Colon),
                nested(lazy(parse_conditional)),
            )),
        ),
        |(condition, branches)| match branches {
            None => condition,
            Some((_, then_expr, _, else_expr)) => {
                let pos = condition.pos;
                Expression::new(
                    ExpressionKind::Conditional {
                        condition: Box::new(condition),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    },
                    pos,
                )
            }
        },
    )
}

fn parse_binary_operator(operators: OperatorTable) -> impl Parser<Token, BinaryOperator> {
    satisfy("operator", move |token: &Token| match token {
        Token::Operator(op) => operators
            .iter()
            .find(|(candidate, _)| candidate == op)
            .map(|(_, binary)| *binary),
        _ => None,
    })
}

/// One left-associative precedence level. Operands are built lazily so the
/// whole chain is not constructed again for every level.
fn left_assoc<P>(operand: fn() -> P, operators: OperatorTable) -> impl Parser<Token, Expression>
where
    P: Parser<Token, Expression>,
{
    map(
        tuple2(
            lazy(operand),
            many(tuple2(parse_binary_operator(operators), lazy(operand))),
        ),
        |(first, rest)| {
            rest.into_iter().fold(first, |left, (op, right)| {
                let pos = left.pos;
                Expression::new(
                    ExpressionKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    pos,
                )
            })
        },
    )
}

fn parse_logical_or() -> impl Parser<Token, Expression> {
    left_assoc(parse_logical_and, LOGICAL_OR)
}

fn parse_logical_and() -> impl Parser<Token, Expression> {
    left_assoc(parse_bit_or, LOGICAL_AND)
}

fn parse_bit_or() -> impl Parser<Token, Expression> {
    left_assoc(parse_bit_xor, BIT_OR)
}

fn parse_bit_xor() -> impl Parser<Token, Expression> {
    left_assoc(parse_bit_and, BIT_XOR)
}

fn parse_bit_and() -> impl Parser<Token, Expression> {
    left_assoc(parse_equality, BIT_AND)
}

fn parse_equality() -> impl Parser<Token, Expression> {
    left_assoc(parse_relational, EQUALITY)
}

fn parse_relational() -> impl Parser<Token, Expression> {
    left_assoc(parse_shift, RELATIONAL)
}

fn parse_shift() -> impl Parser<Token, Expression> {
    left_assoc(parse_additive, SHIFT)
}

fn parse_additive() -> impl Parser<Token, Expression> {
    left_assoc(parse_multiplicative, ADDITIVE)
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    left_assoc(parse_unary, MULTIPLICATIVE)
}

fn parse_unary() -> impl Parser<Token, Expression> {
    choice(vec![
        Box::new(parse_negative_literal()),
        Box::new(parse_prefix_increment()),
        Box::new(parse_unary_operation()),
        Box::new(parse_cast()),
        Box::new(parse_postfix()),
    ])
}

/// `-2147483648` only fits an int once the sign is known, so a minus
/// directly in front of a numeric literal becomes part of the literal.
fn parse_negative_literal() -> impl Parser<Token, Expression> {
    try_map(
        located(preceded(
            parse_operator(Operator::Minus),
            satisfy("number", |token: &Token| match token {
                Token::Literal(
                    literal @ (Literal::Integer(_) | Literal::Long(_) | Literal::Double(_)),
                ) => Some(literal.clone()),
                _ => None,
            }),
        )),
        |(pos, literal)| {
            convert_literal(literal, true)
                .map(|literal| Expression::new(ExpressionKind::Literal(literal), pos))
        },
    )
}

fn parse_increment_operator() -> impl Parser<Token, IncDec> {
    satisfy("'++' or '--'", |token: &Token| match token {
        Token::Operator(Operator::Increment) => Some(IncDec::Increment),
        Token::Operator(Operator::Decrement) => Some(IncDec::Decrement),
        _ => None,
    })
}

fn parse_prefix_increment() -> impl Parser<Token, Expression> {
    map(
        located(tuple2(parse_increment_operator(), nested(lazy(parse_unary)))),
        |(pos, (op, target))| {
            Expression::new(
                ExpressionKind::IncDec {
                    op,
                    prefix: true,
                    target: Box::new(target),
                },
                pos,
            )
        },
    )
}

fn parse_unary_operation() -> impl Parser<Token, Expression> {
    map(
        located(tuple2(
            satisfy("unary operator", |token: &Token| match token {
                Token::Operator(Operator::Plus) => Some(UnaryOperator::Plus),
                Token::Operator(Operator::Minus) => Some(UnaryOperator::Minus),
                Token::Operator(Operator::Not) => Some(UnaryOperator::Not),
                Token::Operator(Operator::BitNot) => Some(UnaryOperator::BitNot),
                _ => None,
            }),
            nested(lazy(parse_unary)),
        )),
        |(pos, (op, operand))| {
            Expression::new(
                ExpressionKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                pos,
            )
        },
    )
}

/// `(int) x`. Only primitive targets are supported.
fn parse_cast() -> impl Parser<Token, Expression> {
    map(
        located(tuple4(
            parse_open_paren(),
            parse_primitive_type(),
            parse_close_paren(),
            nested(lazy(parse_unary)),
        )),
        |(pos, (_, ty, _, expr))| {
            Expression::new(
                ExpressionKind::Cast {
                    target: TypeName::Primitive(ty),
                    expr: Box::new(expr),
                },
                pos,
            )
        },
    )
}

enum Suffix {
    Member {
        pos: usize,
        name: String,
        arguments: Option<Vec<Expression>>,
    },
    Index(Expression),
    IncDec(IncDec),
}

fn parse_suffix() -> impl Parser<Token, Suffix> {
    choice(vec![
        Box::new(map(
            located(preceded(
                parse_operator(Operator::Dot),
                tuple2(parse_identifier(), optional(parse_arguments())),
            )),
            |(pos, (name, arguments))| Suffix::Member {
                pos,
                name,
                arguments,
            },
        )),
        Box::new(map(
            delimited(
                parse_open_bracket(),
                lazy(parse_expression),
                parse_close_bracket(),
            ),
            Suffix::Index,
        )),
        Box::new(map(parse_increment_operator(), Suffix::IncDec)),
    ])
}

fn apply_suffix(target: Expression, suffix: Suffix) -> Expression {
    let pos = target.pos;
    match suffix {
        Suffix::Member {
            name,
            arguments: Some(arguments),
            pos,
        } => Expression::new(
            ExpressionKind::MethodCall {
                target: Some(Box::new(target)),
                name,
                arguments,
            },
            pos,
        ),
        Suffix::Member {
            name,
            arguments: None,
            ..
        } => Expression::new(
            ExpressionKind::FieldAccess {
                target: Box::new(target),
                name,
            },
            pos,
        ),
        Suffix::Index(index) => Expression::new(
            ExpressionKind::Index {
                array: Box::new(target),
                index: Box::new(index),
            },
            pos,
        ),
        Suffix::IncDec(op) => Expression::new(
            ExpressionKind::IncDec {
                op,
                prefix: false,
                target: Box::new(target),
            },
            pos,
        ),
    }
}

fn parse_postfix() -> impl Parser<Token, Expression> {
    map(
        tuple2(parse_primary(), many(parse_suffix())),
        |(primary, suffixes)| suffixes.into_iter().fold(primary, apply_suffix),
    )
}

pub fn parse_arguments() -> impl Parser<Token, Vec<Expression>> {
    with_context(
        delimited(
            parse_open_paren(),
            separated_list(lazy(parse_expression), parse_comma()),
            parse_close_paren(),
        ),
        "arguments",
    )
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(located(parse_literal()), |(pos, literal)| {
                Expression::new(ExpressionKind::Literal(literal), pos)
            })),
            Box::new(parse_new()),
            Box::new(map(
                located(tuple2(parse_identifier(), optional(parse_arguments()))),
                |(pos, (name, arguments))| {
                    let kind = match arguments {
                        Some(arguments) => ExpressionKind::MethodCall {
                            target: None,
                            name,
                            arguments,
                        },
                        None => ExpressionKind::Name(name),
                    };
                    Expression::new(kind, pos)
                },
            )),
            Box::new(delimited(
                parse_open_paren(),
                lazy(parse_expression),
                parse_close_paren(),
            )),
        ]),
        "expression",
    )
}

/// An initializer: an expression or a braced list such as `{1, 2}`.
///
/// A braced list only becomes an expression once the array type it
/// initializes is known, see [`initializer_into_expression`].
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Expression(Expression),
    List(usize, Vec<Initializer>),
}

pub fn parse_variable_initializer() -> impl Parser<Token, Initializer> {
    choice(vec![
        Box::new(map(located(parse_initializer_list()), |(pos, items)| {
            Initializer::List(pos, items)
        })),
        Box::new(map(lazy(parse_expression), Initializer::Expression)),
    ])
}

fn parse_initializer_list() -> impl Parser<Token, Vec<Initializer>> {
    with_context(
        delimited(
            parse_open_brace(),
            terminated(
                separated_list(lazy(parse_variable_initializer), parse_comma()),
                optional(parse_comma()),
            ),
            parse_close_brace(),
        ),
        "array initializer",
    )
}

pub(crate) fn initializer_into_expression(
    initializer: Initializer,
    ty: &TypeName,
) -> Result<Expression, String> {
    match initializer {
        Initializer::Expression(expression) => Ok(expression),
        Initializer::List(pos, items) => match ty {
            TypeName::Array(element) => {
                let elements = items
                    .into_iter()
                    .map(|item| initializer_into_expression(item, element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expression::new(
                    ExpressionKind::ArrayInit {
                        ty: ty.clone(),
                        elements,
                    },
                    pos,
                ))
            }
            TypeName::Var => Err(
                "cannot infer type for local variable (array initializer needs an explicit target-type)"
                    .to_string(),
            ),
            other => Err(format!("illegal initializer for {}", other)),
        },
    }
}

fn parse_new() -> impl Parser<Token, Expression> {
    with_context(
        map(
            located(preceded(
                parse_keyword(Keyword::New),
                choice(vec![
                    Box::new(parse_new_object()),
                    Box::new(parse_new_array()),
                ]),
            )),
            |(pos, kind)| Expression::new(kind, pos),
        ),
        "new expression",
    )
}

fn parse_new_object() -> impl Parser<Token, ExpressionKind> {
    map(
        tuple2(parse_identifier(), parse_arguments()),
        |(class, arguments)| ExpressionKind::NewObject { class, arguments },
    )
}

type DimensionSpec = Vec<Option<Expression>>;

fn parse_new_array() -> impl Parser<Token, ExpressionKind> {
    try_map(
        tuple3(
            parse_base_type(),
            many(delimited(
                parse_open_bracket(),
                optional(lazy(parse_expression)),
                parse_close_bracket(),
            )),
            optional(located(parse_initializer_list())),
        ),
        |(element, dimensions, initializer): (TypeName, DimensionSpec, Option<(usize, Vec<Initializer>)>)| {
            if dimensions.is_empty() {
                return Err("'[' expected".to_string());
            }
            match initializer {
                Some((pos, items)) => {
                    if dimensions.iter().any(Option::is_some) {
                        return Err(
                            "array creation with both dimension expression and initialization is illegal"
                                .to_string(),
                        );
                    }
                    let ty = element.array_of(dimensions.len());
                    match initializer_into_expression(Initializer::List(pos, items), &ty)? {
                        Expression {
                            kind: kind @ ExpressionKind::ArrayInit { .. },
                            ..
                        } => Ok(kind),
                        _ => Err("array initializer expected".to_string()),
                    }
                }
                None => {
                    let sized = dimensions.iter().take_while(|d| d.is_some()).count();
                    if sized == 0 {
                        return Err("array dimension missing".to_string());
                    }
                    if dimensions[sized..].iter().any(Option::is_some) {
                        return Err("']' expected".to_string());
                    }
                    let extra_dimensions = dimensions.len() - sized;
                    Ok(ExpressionKind::NewArray {
                        element,
                        dimensions: dimensions.into_iter().flatten().collect(),
                        extra_dimensions,
                    })
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal as AstLiteral;
    use crate::tokenizer::keyword::PrimitiveType;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    fn int(value: i64) -> Token {
        Token::Literal(Literal::Integer(value))
    }

    fn op(operator: Operator) -> Token {
        Token::Operator(operator)
    }

    fn delim(delimiter: Delimiter) -> Token {
        Token::Delimiter(delimiter)
    }

    fn lit(value: i32, pos: usize) -> Expression {
        Expression::new(ExpressionKind::Literal(AstLiteral::Int(value)), pos)
    }

    fn name(value: &str, pos: usize) -> Expression {
        Expression::new(ExpressionKind::Name(value.to_string()), pos)
    }

    fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        let pos = left.pos;
        Expression::new(
            ExpressionKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            pos,
        )
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3
        let input = vec![
            int(1),
            op(Operator::Plus),
            int(2),
            op(Operator::Multiply),
            int(3),
        ];
        let expected = binary(
            BinaryOperator::Add,
            lit(1, 0),
            binary(BinaryOperator::Multiply, lit(2, 2), lit(3, 4)),
        );
        assert_eq!(parse_expression().parse(&input, 0), Ok((5, expected)));
    }

    #[test]
    fn test_left_associativity() {
        // a - 1 - 2
        let input = vec![
            ident("a"),
            op(Operator::Minus),
            int(1),
            op(Operator::Minus),
            int(2),
        ];
        let expected = binary(
            BinaryOperator::Subtract,
            binary(BinaryOperator::Subtract, name("a", 0), lit(1, 2)),
            lit(2, 4),
        );
        assert_eq!(parse_expression().parse(&input, 0), Ok((5, expected)));
    }

    #[test]
    fn test_negative_literal_range() {
        let input = vec![op(Operator::Minus), int(2147483648)];
        assert_eq!(
            parse_expression().parse(&input, 0),
            Ok((2, lit(i32::MIN, 0)))
        );

        let input = vec![int(2147483648)];
        let err = parse_expression().parse(&input, 0).unwrap_err();
        assert_eq!(err.describe(), "integer number too large");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        // a = b += 1
        let input = vec![
            ident("a"),
            delim(Delimiter::Equal),
            ident("b"),
            op(Operator::PlusAssign),
            int(1),
        ];
        let (pos, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(pos, 5);
        let ExpressionKind::Assign { op, value, .. } = expression.kind else {
            panic!("expected assignment");
        };
        assert_eq!(op, None);
        assert!(matches!(
            value.kind,
            ExpressionKind::Assign {
                op: Some(BinaryOperator::Add),
                ..
            }
        ));
    }

    #[test]
    fn test_method_chain() {
        // System.out.println(x)
        let input = vec![
            ident("System"),
            op(Operator::Dot),
            ident("out"),
            op(Operator::Dot),
            ident("println"),
            delim(Delimiter::OpenParen),
            ident("x"),
            delim(Delimiter::CloseParen),
        ];
        let (pos, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(pos, 8);
        let ExpressionKind::MethodCall {
            target: Some(target),
            name: method,
            arguments,
        } = expression.kind
        else {
            panic!("expected method call");
        };
        assert_eq!(method, "println");
        assert_eq!(arguments, vec![name("x", 6)]);
        assert!(matches!(target.kind, ExpressionKind::FieldAccess { .. }));
    }

    #[test]
    fn test_cast_and_parenthesized() {
        // (int) x
        let input = vec![
            delim(Delimiter::OpenParen),
            Token::Type(PrimitiveType::Int),
            delim(Delimiter::CloseParen),
            ident("x"),
        ];
        let (_, expression) = parse_expression().parse(&input, 0).unwrap();
        assert!(matches!(expression.kind, ExpressionKind::Cast { .. }));

        // (x) + 1
        let input = vec![
            delim(Delimiter::OpenParen),
            ident("x"),
            delim(Delimiter::CloseParen),
            op(Operator::Plus),
            int(1),
        ];
        let (pos, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(pos, 5);
        assert_eq!(expression, binary(BinaryOperator::Add, name("x", 1), lit(1, 4)));
    }

    #[test]
    fn test_conditional_and_postfix() {
        // i++ > 0 ? a[i] : 0
        let input = vec![
            ident("i"),
            op(Operator::Increment),
            op(Operator::Greater),
            int(0),
            op(Operator::Question),
            ident("a"),
            delim(Delimiter::OpenBracket),
            ident("i"),
            delim(Delimiter::CloseBracket),
            delim(Delimiter::Colon),
            int(0),
        ];
        let (pos, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(pos, 11);
        let ExpressionKind::Conditional {
            condition,
            then_expr,
            ..
        } = expression.kind
        else {
            panic!("expected conditional");
        };
        assert!(matches!(condition.kind, ExpressionKind::Binary { .. }));
        assert!(matches!(then_expr.kind, ExpressionKind::Index { .. }));
    }

    #[test]
    fn test_new_array_forms() {
        // new int[3]
        let input = vec![
            Token::Keyword(Keyword::New),
            Token::Type(PrimitiveType::Int),
            delim(Delimiter::OpenBracket),
            int(3),
            delim(Delimiter::CloseBracket),
        ];
        let (_, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(
            expression.kind,
            ExpressionKind::NewArray {
                element: TypeName::Primitive(PrimitiveType::Int),
                dimensions: vec![lit(3, 3)],
                extra_dimensions: 0,
            }
        );

        // new int[]{1, 2,}
        let input = vec![
            Token::Keyword(Keyword::New),
            Token::Type(PrimitiveType::Int),
            delim(Delimiter::OpenBracket),
            delim(Delimiter::CloseBracket),
            delim(Delimiter::OpenBrace),
            int(1),
            delim(Delimiter::Comma),
            int(2),
            delim(Delimiter::Comma),
            delim(Delimiter::CloseBrace),
        ];
        let (pos, expression) = parse_expression().parse(&input, 0).unwrap();
        assert_eq!(pos, 10);
        assert_eq!(
            expression.kind,
            ExpressionKind::ArrayInit {
                ty: TypeName::Primitive(PrimitiveType::Int).array_of(1),
                elements: vec![lit(1, 5), lit(2, 7)],
            }
        );

        // new int[]
        let input = vec![
            Token::Keyword(Keyword::New),
            Token::Type(PrimitiveType::Int),
            delim(Delimiter::OpenBracket),
            delim(Delimiter::CloseBracket),
        ];
        let err = parse_expression().parse(&input, 0).unwrap_err();
        assert_eq!(err.describe(), "array dimension missing");
    }

    #[test]
    fn test_new_exception() {
        let input = vec![
            Token::Keyword(Keyword::New),
            ident("IllegalStateException"),
            delim(Delimiter::OpenParen),
            Token::Literal(Literal::String("bad".to_string())),
            delim(Delimiter::CloseParen),
        ];
        let (_, expression) = parse_expression().parse(&input, 0).unwrap();
        assert!(matches!(
            expression.kind,
            ExpressionKind::NewObject { ref class, .. } if class == "IllegalStateException"
        ));
    }

    #[test]
    fn test_illegal_start() {
        let input = vec![op(Operator::Multiply), int(1)];
        let err = parse_expression().parse(&input, 0).unwrap_err();
        assert_eq!(err.get_position(), 0);
        assert_eq!(err.describe(), "illegal start of expression");
    }

    #[test]
    fn test_unclosed_call_reports_furthest_position() {
        // f(1 2)
        let input = vec![
            ident("f"),
            delim(Delimiter::OpenParen),
            int(1),
            int(2),
            delim(Delimiter::CloseParen),
        ];
        let err = parse_expression().parse(&input, 0).unwrap_err();
        assert_eq!(err.get_position(), 3);
        assert_eq!(err.describe(), "')' expected but found '2'");
    }
}
