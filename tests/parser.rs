use indoc::indoc;
use pretty_assertions::assert_eq;

use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::Scanner;

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
    Parser::new(&tokens).parse()
}

fn printed(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(statements) => statements.iter().map(AstPrinter::print_stmt).collect(),
        Err(errors) => panic!(
            "unexpected parse errors: {:?}",
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
        ),
    }
}

fn errors(source: &str) -> Vec<String> {
    match parse(source) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn precedence_climbs_from_assignment_to_primary() {
    assert_eq!(
        printed("a = 1 + 2 * 3 - -4 / 5 < 6 == !true or x and y;"),
        vec![concat!(
            "(; (= a (or (== (< (- (+ 1.0 (* 2.0 3.0)) (/ (- 4.0) 5.0)) 6.0) (! true))",
            " (and x y))))"
        )]
    );
}

#[test]
fn binary_operators_associate_left() {
    assert_eq!(printed("1 - 2 - 3;"), vec!["(; (- (- 1.0 2.0) 3.0))"]);
    assert_eq!(printed("8 / 4 / 2;"), vec!["(; (/ (/ 8.0 4.0) 2.0))"]);
}

#[test]
fn assignment_associates_right() {
    assert_eq!(printed("a = b = c;"), vec!["(; (= a (= b c)))"]);
}

#[test]
fn property_assignment_becomes_set() {
    assert_eq!(
        printed("point.x = 1; a.b.c = 2;"),
        vec!["(; (.= point x 1.0))", "(; (.= (. a b) c 2.0))"]
    );
}

#[test]
fn calls_and_property_access_chain() {
    assert_eq!(
        printed("f(1)(2).g(this, \"s\");"),
        vec!["(; (call (. (call (call f 1.0) 2.0) g) this \"s\"))"]
    );
}

#[test]
fn for_loop_is_desugared_into_block_and_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
    );
}

#[test]
fn for_loop_clauses_are_optional() {
    assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
}

#[test]
fn declarations_parse_into_their_nodes() {
    let source = indoc! {r#"
        class Greeter {
          greet(name) { return "hi " + name; }
          wave() { return; }
        }
        fun add(a, b) { return a + b; }
        var unset;
        if (x) print 1; else { print 2; }
        while (false) print 3;
    "#};

    assert_eq!(
        printed(source),
        vec![
            concat!(
                "(class Greeter (method greet (name) (return (+ \"hi \" name)))",
                " (method wave () (return)))"
            ),
            "(fun add (a b) (return (+ a b)))",
            "(var unset)",
            "(if x (print 1.0) (block (print 2.0)))",
            "(while false (print 3.0))",
        ]
    );
}

#[test]
fn missing_semicolon_reports_location_at_the_next_token() {
    assert_eq!(
        errors("print 1\nprint 2;"),
        vec!["[line 2] Error at 'print': Expect ';' after value."]
    );
}

#[test]
fn error_at_end_of_input_says_at_end() {
    assert_eq!(
        errors("var a = 1"),
        vec!["[line 1] Error at end: Expect ';' after variable declaration."]
    );
}

#[test]
fn two_malformed_statements_report_two_errors() {
    let source = indoc! {"
        var ok = 1;
        var = 2;
        print ok;
        print (1 + ;
        print ok;
    "};

    assert_eq!(
        errors(source),
        vec![
            "[line 2] Error at '=': Expect variable name.",
            "[line 4] Error at ';': Expect expression.",
        ]
    );
}

#[test]
fn invalid_assignment_target_is_reported_without_cascading() {
    assert_eq!(
        errors("1 + 2 = 3; print 4;"),
        vec!["[line 1] Error at '=': Invalid assignment target."]
    );
}

#[test]
fn operator_without_left_operand_is_reported() {
    assert_eq!(
        errors("== 1;\n* 2;\n+ 3;"),
        vec![
            "[line 1] Error at '==': Expecting a left operand for '=='.",
            "[line 2] Error at '*': Expecting a left operand for '*'.",
            "[line 3] Error at '+': Expecting a left operand for '+'.",
        ]
    );
}

#[test]
fn leading_minus_is_still_negation() {
    assert_eq!(printed("-1 - 2;"), vec!["(; (- (- 1.0) 2.0))"]);
}

#[test]
fn too_many_arguments_is_reported_but_parsing_continues() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({});\nprint 1 +;", args.join(", "));

    let reported = errors(&source);

    assert_eq!(reported.len(), 2);
    assert_eq!(
        reported[0],
        "[line 1] Error at '255': Can't have more than 255 arguments."
    );
    assert!(reported[1].starts_with("[line 2]"));
}

#[test]
fn too_many_parameters_is_reported() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    assert_eq!(
        errors(&source),
        vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
    );
}

#[test]
fn unclosed_block_reports_at_end() {
    assert_eq!(
        errors("{ print 1;"),
        vec!["[line 1] Error at end: Expect '}' after block."]
    );
}

#[test]
fn empty_token_slice_is_an_empty_program() {
    let parsed = Parser::new(&[]).parse();

    assert!(matches!(parsed, Ok(ref statements) if statements.is_empty()));
}

#[test]
fn token_slice_without_eof_still_parses() {
    let (tokens, _) = Scanner::new("print 1;\nprint 2").scan_tokens();
    // Drop the trailing EOF.
    let tokens = &tokens[..tokens.len() - 1];

    let complete = Parser::new(&tokens[..3]).parse();
    assert!(matches!(complete, Ok(ref statements) if statements.len() == 1));

    let errors: Vec<String> = match Parser::new(tokens).parse() {
        Ok(_) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    assert_eq!(
        errors,
        vec!["[line 2] Error at end: Expect ';' after value."]
    );
}
