use super::super::{core::*, prelude::*};
use super::common::*;
use crate::ast::TypeName;
use crate::tokenizer::{keyword::PrimitiveType, token::Token};

/// A primitive type name. `byte`, `short` and `float` are rejected here
/// with a dedicated message.
pub fn parse_primitive_type() -> impl Parser<Token, PrimitiveType> {
    try_map(
        satisfy("type", |token: &Token| match token {
            Token::Type(ty) => Some(*ty),
            _ => None,
        }),
        |ty: PrimitiveType| {
            if ty.is_supported() {
                Ok(ty)
            } else {
                Err(format!("type '{}' is not supported", ty))
            }
        },
    )
}

/// A type without array brackets.
pub fn parse_base_type() -> impl Parser<Token, TypeName> {
    with_context(
        choice(vec![
            Box::new(map(parse_primitive_type(), TypeName::Primitive)),
            Box::new(map(parse_identifier(), |name| {
                if name == "var" {
                    TypeName::Var
                } else {
                    TypeName::Named(name)
                }
            })),
        ]),
        "type",
    )
}

/// A full type, such as `int`, `String[]` or `char[][]`.
pub fn parse_type() -> impl Parser<Token, TypeName> {
    map(
        tuple2(parse_base_type(), parse_dimensions()),
        |(base, dimensions)| base.array_of(dimensions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::symbol::Delimiter;

    #[test]
    fn test_parse_array_type() {
        let input = vec![
            Token::Identifier("String".to_string()),
            Token::Delimiter(Delimiter::OpenBracket),
            Token::Delimiter(Delimiter::CloseBracket),
            Token::Identifier("args".to_string()),
        ];
        assert_eq!(
            parse_type().parse(&input, 0),
            Ok((
                3,
                TypeName::Array(Box::new(TypeName::Named("String".to_string())))
            ))
        );
    }

    #[test]
    fn test_parse_primitive_and_var() {
        let input = vec![Token::Type(PrimitiveType::Long)];
        assert_eq!(
            parse_type().parse(&input, 0),
            Ok((1, TypeName::Primitive(PrimitiveType::Long)))
        );

        let input = vec![Token::Identifier("var".to_string())];
        assert_eq!(parse_type().parse(&input, 0), Ok((1, TypeName::Var)));
    }

    #[test]
    fn test_unsupported_primitive() {
        let input = vec![Token::Type(PrimitiveType::Float)];
        let err = parse_type().parse(&input, 0).unwrap_err();
        assert_eq!(err.describe(), "type 'float' is not supported");
    }
}
