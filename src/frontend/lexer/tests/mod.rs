//! Lexer tests

use crate::frontend::lexer::{tokenize, LexError, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[cfg(test)]
mod lexer_basic_tests {
    use super::*;

    #[test]
    fn test_val_definition() {
        assert_eq!(
            kinds("val x = 42"),
            vec![
                TokenKind::KwVal,
                TokenKind::Identifier("x".into()),
                TokenKind::Eq,
                TokenKind::IntLiteral(42),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators_are_maximal_munch() {
        assert_eq!(
            kinds("a <= b :: c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Operator("<=".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Operator("::".into()),
                TokenKind::Identifier("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_reserved_symbols() {
        assert_eq!(
            kinds("x: Int => y <- z"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Colon,
                TokenKind::Identifier("Int".into()),
                TokenKind::Arrow,
                TokenKind::Identifier("y".into()),
                TokenKind::LArrow,
                TokenKind::Identifier("z".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dollar_identifiers() {
        assert_eq!(
            kinds("$line3.res0"),
            vec![
                TokenKind::Identifier("$line3".into()),
                TokenKind::Dot,
                TokenKind::Identifier("res0".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_backquoted_identifier() {
        assert_eq!(
            kinds("`type`"),
            vec![TokenKind::Identifier("type".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1_000 0xff 2.5 1e3 7L"),
            vec![
                TokenKind::IntLiteral(1000),
                TokenKind::IntLiteral(255),
                TokenKind::FloatLiteral(2.5),
                TokenKind::FloatLiteral(1000.0),
                TokenKind::IntLiteral(7),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_on_int_is_not_float() {
        assert_eq!(
            kinds("1.toString"),
            vec![
                TokenKind::IntLiteral(1),
                TokenKind::Dot,
                TokenKind::Identifier("toString".into()),
                TokenKind::Eof,
            ]
        );
    }
}

#[cfg(test)]
mod lexer_layout_tests {
    use super::*;

    #[test]
    fn test_newlines_collapse() {
        assert_eq!(
            kinds("a\n\n\nb"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_leading_and_trailing_newlines_dropped() {
        assert_eq!(
            kinds("\n\n  a  \n\n"),
            vec![TokenKind::Identifier("a".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            kinds("a // trailing\n/* block /* nested */ */ b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("val é = 1").unwrap();
        assert_eq!(tokens[1].span.range(), 4..6);
        assert_eq!(tokens[3].span.range(), 9..10);
    }
}

#[cfg(test)]
mod lexer_literal_tests {
    use super::*;

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"b\"""#),
            vec![TokenKind::StringLiteral("a\n\"b\"".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        assert_eq!(
            kinds("\"\"\"one\ntwo\"\"\""),
            vec![TokenKind::StringLiteral("one\ntwo".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(
            kinds("'a' '\\n'"),
            vec![
                TokenKind::CharLiteral('a'),
                TokenKind::CharLiteral('\n'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_booleans_and_null() {
        assert_eq!(
            kinds("true false null"),
            vec![
                TokenKind::BoolLiteral(true),
                TokenKind::BoolLiteral(false),
                TokenKind::KwNull,
                TokenKind::Eof,
            ]
        );
    }
}

#[cfg(test)]
mod lexer_error_tests {
    use super::*;

    #[test]
    fn test_unterminated_string_at_end_reports_source_len() {
        let source = "val s = \"abc";
        let err = tokenize(source).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
        assert_eq!(err.offset(), source.len());
    }

    #[test]
    fn test_string_broken_by_line_feed_reports_line_feed() {
        let err = tokenize("\"abc\nval y = 1").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { offset: 4 });
    }

    #[test]
    fn test_unterminated_comment() {
        let source = "1 + /* still open";
        let err = tokenize(source).unwrap_err();
        assert_eq!(err, LexError::UnterminatedComment { offset: source.len() });
    }

    #[test]
    fn test_illegal_character() {
        let err = tokenize("val x = 1 ¤ 2").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '¤', offset: 10 }));
    }

    #[test]
    fn test_integer_overflow() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { offset: 0, .. }));
    }
}
