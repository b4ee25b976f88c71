//! Preprocessor tests

use crate::frontend::preprocess::*;
use crate::frontend::splitter::{split, Split, Statement};

fn statement(source: &str) -> Statement {
    match split(source) {
        Split::Complete(mut statements) if statements.len() == 1 => statements.remove(0),
        other => panic!("expected one statement in {:?}, got {:?}", source, other),
    }
}

fn processed(source: &str) -> Processed {
    match classify(&statement(source), "res0") {
        Classification::Output(processed) => processed,
        other => panic!("expected output for {:?}, got {:?}", source, other),
    }
}

fn names(source: &str) -> Vec<String> {
    processed(source)
        .bindings
        .into_iter()
        .map(|b| b.name)
        .collect()
}

fn defined(
    label: &str,
    name: &str,
) -> Vec<DisplayInstruction> {
    vec![DisplayInstruction::Defined {
        label: label.to_string(),
        name: name.to_string(),
    }]
}

#[cfg(test)]
mod expression_tests {
    use super::*;

    #[test]
    fn test_expression_is_rewritten() {
        let p = processed("1 + 1");
        assert_eq!(p.kind, DeclarationKind::Expression);
        assert_eq!(p.code, "val res0 = (1 + 1)");
        assert_eq!(
            p.display,
            vec![DisplayInstruction::Value {
                keyword: "val".to_string(),
                name: "res0".to_string(),
            }]
        );
        assert_eq!(
            p.bindings,
            vec![Binding {
                name: "res0".to_string(),
                lazy: false,
                synthetic: true,
            }]
        );
        assert!(p.imports.is_empty());
    }

    #[test]
    fn test_expression_uses_name_hint() {
        let stmt = statement("f(2)");
        let Classification::Output(p) = classify(&stmt, "res3_1") else {
            panic!("expected output");
        };
        assert_eq!(p.code, "val res3_1 = (f(2))");
    }

    #[test]
    fn test_multi_line_expression_keeps_text() {
        let p = processed("xs\n  .map(f)");
        assert_eq!(p.code, "val res0 = (xs\n  .map(f))");
    }

    #[test]
    fn test_if_expression_is_not_a_definition() {
        assert_eq!(processed("if (a) 1 else 2").kind, DeclarationKind::Expression);
    }
}

#[cfg(test)]
mod structural_tests {
    use super::*;

    #[test]
    fn test_plain_declarations() {
        let cases = [
            ("object O", DeclarationKind::ObjectDef, "object", "O"),
            ("class Foo(x: Int)", DeclarationKind::ClassDef, "class", "Foo"),
            ("enum Color { case Red }", DeclarationKind::ClassDef, "enum", "Color"),
            ("trait T", DeclarationKind::TraitDef, "trait", "T"),
            ("def f(x: Int) = x", DeclarationKind::FunctionDef, "function", "f"),
            ("type Id = Int", DeclarationKind::TypeDef, "type", "Id"),
        ];
        for (source, kind, label, name) in cases {
            let p = processed(source);
            assert_eq!(p.kind, kind, "{}", source);
            assert_eq!(p.code, source);
            assert_eq!(p.display, defined(label, name), "{}", source);
            assert_eq!(p.bindings.len(), 1);
            assert!(!p.bindings[0].synthetic);
        }
    }

    #[test]
    fn test_case_prefix_in_label() {
        assert_eq!(processed("case class P(x: Int)").display, defined("case class", "P"));
        assert_eq!(processed("case object Empty").display, defined("case object", "Empty"));
    }

    #[test]
    fn test_modifiers_and_annotations_are_skipped() {
        let p = processed("@deprecated(\"old\", \"1\") private[pkg] final def f(x: Int) = x");
        assert_eq!(p.kind, DeclarationKind::FunctionDef);
        assert_eq!(p.display, defined("function", "f"));

        assert_eq!(processed("sealed abstract class Shape").display, defined("class", "Shape"));
        assert_eq!(processed("implicit object Ord").kind, DeclarationKind::ObjectDef);
        assert_eq!(processed("inline def g = 1").display, defined("function", "g"));
        assert_eq!(processed("open class K").display, defined("class", "K"));
    }

    #[test]
    fn test_soft_modifier_name_is_an_expression() {
        // `open` is an ordinary identifier when no definition follows
        assert_eq!(processed("open(file)").kind, DeclarationKind::Expression);
    }

    #[test]
    fn test_symbolic_def_name() {
        assert_eq!(processed("def +++(x: Int) = x").display, defined("function", "+++"));
    }

    #[test]
    fn test_missing_name_fails() {
        match classify(&statement("class (x)"), "res0") {
            Classification::Failure(reasons) => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("expected a name after `class`"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn test_val_and_var() {
        let p = processed("val x = 2");
        assert_eq!(p.kind, DeclarationKind::ValueOrPatternDef);
        assert_eq!(p.code, "val x = 2");
        assert_eq!(
            p.display,
            vec![DisplayInstruction::Value {
                keyword: "val".to_string(),
                name: "x".to_string(),
            }]
        );

        let p = processed("var y: Int = 3");
        assert_eq!(
            p.display,
            vec![DisplayInstruction::Value {
                keyword: "var".to_string(),
                name: "y".to_string(),
            }]
        );
    }

    #[test]
    fn test_lazy_val_is_deferred() {
        let p = processed("lazy val z = expensive()");
        assert_eq!(p.display, vec![DisplayInstruction::Deferred { name: "z".to_string() }]);
        assert!(p.bindings[0].lazy);
    }

    #[test]
    fn test_upper_case_single_name_binds() {
        assert_eq!(names("val X = 1"), vec!["X"]);
        assert_eq!(names("val Max: Int = 9"), vec!["Max"]);
    }

    #[test]
    fn test_tuple_pattern() {
        let p = processed("val (a, b) = (1, 2)");
        assert_eq!(names("val (a, b) = (1, 2)"), vec!["a", "b"]);
        // Both names are displayed, the code appears once
        assert_eq!(p.display.len(), 2);
        assert_eq!(p.code, "val (a, b) = (1, 2)");
    }

    #[test]
    fn test_multiple_names() {
        assert_eq!(names("val x, y = 1"), vec!["x", "y"]);
    }

    #[test]
    fn test_binder_and_constructor_patterns() {
        assert_eq!(names("val p @ Some(q) = opt"), vec!["p", "q"]);
        assert_eq!(names("val Some(v) = opt"), vec!["v"]);
        assert_eq!(names("val Foo.Bar(x) = t"), vec!["x"]);
        assert_eq!(names("val h :: t = xs"), vec!["h", "t"]);
    }

    #[test]
    fn test_ascriptions_inside_patterns() {
        assert_eq!(names("val (a: Int, b: String) = t"), vec!["a", "b"]);
        assert_eq!(names("val (a, b): (Int, Int) = t"), vec!["a", "b"]);
    }

    #[test]
    fn test_backquoted_names() {
        // A backquoted name inside a pattern refers to an existing value
        assert_eq!(names("val (`a`, b) = t"), vec!["b"]);

        let p = processed("val `type` = 1");
        assert_eq!(names("val `type` = 1"), vec!["type"]);
        assert_eq!(p.display[0].to_code(), "$repl.value(\"val\", \"type\", `type`)");
    }

    #[test]
    fn test_synthetic_names_are_not_displayed() {
        let p = processed("val x$1 = 3");
        assert!(p.display.is_empty());
        assert_eq!(p.bindings.len(), 1);
        assert!(is_synthetic_name("x$1"));
        assert!(!is_synthetic_name("x1"));
    }
}

#[cfg(test)]
mod import_tests {
    use super::*;

    #[test]
    fn test_single_import() {
        let p = processed("import foo.bar");
        assert_eq!(p.kind, DeclarationKind::ImportDecl);
        assert_eq!(p.code, "import foo.bar");
        assert_eq!(
            p.display,
            vec![DisplayInstruction::Import {
                path: "foo.bar".to_string(),
            }]
        );
        assert_eq!(p.imports, vec!["foo.bar"]);
        assert!(p.bindings.is_empty());
    }

    #[test]
    fn test_multiple_clauses_echo_first_only() {
        let p = processed("import a.b, c.{d, e}");
        assert_eq!(p.display.len(), 1);
        assert_eq!(
            p.display[0],
            DisplayInstruction::Import {
                path: "a.b".to_string(),
            }
        );
        assert_eq!(p.imports, vec!["a.b", "c.{d, e}"]);
    }

    #[test]
    fn test_wildcard_import() {
        let p = processed("import scala.math.*");
        assert_eq!(p.code, "import scala.math.*");
        assert_eq!(p.imports, vec!["scala.math.*"]);
    }

    #[test]
    fn test_package_clause_is_skipped() {
        assert_eq!(classify(&statement("package foo"), "res0"), Classification::Skip);
    }
}

#[cfg(test)]
mod resplit_tests {
    use super::*;

    #[test]
    fn test_text_splitting_into_two_fails() {
        let mut stmt = statement("1 + 1");
        stmt.source = "1 + 1; 2".to_string();
        match classify(&stmt, "res0") {
            Classification::Failure(reasons) => {
                assert_eq!(reasons, vec!["statement 0 splits into 2 statements on its own"]);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_every_token_disagreement_is_reported() {
        let mut stmt = statement("x + 1 + y");
        stmt.source = "x - 1 - y".to_string();
        match classify(&stmt, "res0") {
            Classification::Failure(reasons) => {
                assert_eq!(reasons.len(), 2);
                assert!(reasons[0].contains("token 1"));
                assert!(reasons[1].contains("token 3"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_text_fails() {
        let mut stmt = statement("f(1)");
        stmt.source = "f(1".to_string();
        assert!(matches!(classify(&stmt, "res0"), Classification::Failure(_)));
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn test_display_code() {
        let value = DisplayInstruction::Value {
            keyword: "val".to_string(),
            name: "x".to_string(),
        };
        assert_eq!(value.to_code(), "$repl.value(\"val\", \"x\", x)");
        assert_eq!(
            defined("class", "Foo")[0].to_code(),
            "$repl.defined(\"class\", \"Foo\")"
        );
        assert_eq!(
            DisplayInstruction::Deferred { name: "z".to_string() }.to_code(),
            "$repl.deferred(\"z\")"
        );
        assert_eq!(
            DisplayInstruction::Import {
                path: "foo.bar".to_string(),
            }
            .to_string(),
            "$repl.imported(\"foo.bar\")"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }

    #[test]
    fn test_ident_code() {
        assert_eq!(ident_code("x"), "x");
        assert_eq!(ident_code("res0_1"), "res0_1");
        assert_eq!(ident_code("type"), "`type`");
        assert_eq!(ident_code("+"), "`+`");
        assert_eq!(ident_code("two words"), "`two words`");
    }

    #[test]
    fn test_rendering() {
        assert_eq!(render_defined("class", "Foo"), "defined class Foo");
        assert_eq!(render_value("val", "x", "Int", "2"), "val x: Int = 2");
        assert_eq!(render_deferred("x"), "lazy val x = <lazy>");
        assert_eq!(render_import("foo.bar"), "import foo.bar");
    }
}
