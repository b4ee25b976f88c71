//! Splitter tests

use super::*;
use crate::frontend::splitter::ParseError;

fn malformed(buffer: &str) -> ParseError {
    match split(buffer) {
        Split::Malformed(err) => err,
        other => panic!("expected malformed input for {:?}, got {:?}", buffer, other),
    }
}

#[cfg(test)]
mod boundary_tests {
    use super::*;

    #[test]
    fn test_blank_input_has_no_statements() {
        assert!(statements("").is_empty());
        assert!(statements("   \n\t\n").is_empty());
        assert!(statements(";;").is_empty());
        assert!(statements("// just a comment").is_empty());
    }

    #[test]
    fn test_single_expression() {
        let stmts = statements("1 + 1");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].index, 0);
        assert_eq!(stmts[0].source, "1 + 1");
    }

    #[test]
    fn test_semicolon_separates() {
        assert_eq!(sources("val x = 1; val y = 2"), vec!["val x = 1", "val y = 2"]);
    }

    #[test]
    fn test_newline_separates() {
        let stmts = statements("val x = 1\nval y = 2\nx + y");
        assert_eq!(stmts.len(), 3);
        assert_eq!(
            stmts.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(stmts[2].source, "x + y");
    }

    #[test]
    fn test_source_excludes_trailing_comment() {
        assert_eq!(
            sources("val a = 1 // one\nval b = 2 /* two */"),
            vec!["val a = 1", "val b = 2"]
        );
    }

    #[test]
    fn test_span_matches_source() {
        let buffer = "  val a = 1;\n\n  def f(x: Int) = x * 2  ";
        for stmt in statements(buffer) {
            assert_eq!(stmt.span.slice(buffer), stmt.source);
        }
    }

    #[test]
    fn test_braces_keep_statements_together() {
        let stmts = statements("class A {\n  val x = 1\n  def y = 2\n}\nnew A");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].source, "class A {\n  val x = 1\n  def y = 2\n}");
        assert_eq!(stmts[1].source, "new A");
    }
}

#[cfg(test)]
mod continuation_tests {
    use super::*;

    #[test]
    fn test_trailing_equals_continues() {
        assert_eq!(sources("val x =\n  1"), vec!["val x =\n  1"]);
    }

    #[test]
    fn test_trailing_operator_continues() {
        assert_eq!(sources("1 +\n2"), vec!["1 +\n2"]);
    }

    #[test]
    fn test_leading_dot_continues() {
        assert_eq!(sources("xs\n  .map(f)\n  .sum"), vec!["xs\n  .map(f)\n  .sum"]);
    }

    #[test]
    fn test_if_else_across_lines() {
        let buffer = "if (c)\n  1\nelse\n  2";
        assert_eq!(sources(buffer), vec![buffer]);
    }

    #[test]
    fn test_class_extends_on_next_line() {
        let buffer = "class A\n  extends B\n  with C";
        assert_eq!(sources(buffer), vec![buffer]);
    }

    #[test]
    fn test_do_while_is_complete() {
        assert_eq!(
            sources("do { i += 1 } while (i < 3)"),
            vec!["do { i += 1 } while (i < 3)"]
        );
    }

    #[test]
    fn test_operator_as_operand_ends_statement() {
        assert_eq!(sources("def f: Int = ???"), vec!["def f: Int = ???"]);
        assert_eq!(sources("import scala.math.*"), vec!["import scala.math.*"]);
        assert_eq!(
            sources("def g: Int = ???\nimport a.b.*\nval h = xs.+"),
            vec!["def g: Int = ???", "import a.b.*", "val h = xs.+"]
        );
        assert_eq!(sources("f(1 + ???)"), vec!["f(1 + ???)"]);
    }

    #[test]
    fn test_while_body_on_next_line() {
        let buffer = "while (i < 3)\n  i += 1";
        assert_eq!(sources(buffer), vec![buffer]);
    }
}

#[cfg(test)]
mod incomplete_tests {
    use super::*;

    #[test]
    fn test_open_brace() {
        assert_eq!(split("val x = {"), Split::Incomplete);
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(split("1 +"), Split::Incomplete);
        assert_eq!(split("def f(x: Int) ="), Split::Incomplete);
        assert_eq!(split("import foo."), Split::Incomplete);
    }

    #[test]
    fn test_operator_awaiting_operand() {
        assert_eq!(split("x ???"), Split::Incomplete);
        assert_eq!(split("val x = -"), Split::Incomplete);
        assert_eq!(split("1 + !"), Split::Incomplete);
        assert_eq!(split("a *\n"), Split::Incomplete);
    }

    #[test]
    fn test_control_header_without_body() {
        assert_eq!(split("if (x)"), Split::Incomplete);
        assert_eq!(split("for (i <- xs)\n"), Split::Incomplete);
    }

    #[test]
    fn test_unterminated_literals_at_end() {
        assert_eq!(split("\"abc"), Split::Incomplete);
        assert_eq!(split("val s = \"\"\"first line\nsecond"), Split::Incomplete);
        assert_eq!(split("/* open"), Split::Incomplete);
        assert_eq!(split("/* outer /* inner */"), Split::Incomplete);
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        assert_eq!(split("val x = {   \n  "), Split::Incomplete);
        assert_eq!(split("f(1,\n"), Split::Incomplete);
    }

    #[test]
    fn test_complete_prefix_then_incomplete() {
        assert_eq!(split("val a = 1\nval b = (2 +"), Split::Incomplete);
    }
}

#[cfg(test)]
mod malformed_tests {
    use super::*;

    #[test]
    fn test_unmatched_closer() {
        let err = malformed("1)");
        assert_eq!(err.offset, 1);
        assert!(err.message.contains("unmatched"));
    }

    #[test]
    fn test_mismatched_brackets() {
        let err = malformed("(1]");
        assert_eq!(err.offset, 2);
        assert!(err.message.contains("expected `)`"));
    }

    #[test]
    fn test_illegal_start() {
        let err = malformed("else 1");
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("illegal start"));
    }

    #[test]
    fn test_semicolon_after_operator() {
        assert_eq!(malformed("1 + ; 2").offset, 4);
    }

    #[test]
    fn test_error_before_end_is_terminal() {
        // The broken string is followed by more input, so no continuation can fix it
        let err = malformed("val s = \"abc\nval y = 1");
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn test_error_display_carries_offset() {
        let err = malformed("1)");
        assert!(err.to_string().ends_with("(at byte 1)"));
    }
}
