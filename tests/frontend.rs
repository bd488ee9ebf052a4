use cc0::{parse, CompileError, ExprKind, FunctionDefect, StmtKind, StmtNode, Type};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

fn block(stmt: &StmtNode) -> &[StmtNode] {
    match &stmt.kind {
        StmtKind::Block(stmts) => stmts,
        other => panic!("expected a block, got {:?}", other),
    }
}

#[test]
fn parsing_is_deterministic() {
    let src = "int f(int *p) { int i; for (i = 0; i < 3; i = i + 1) p = p + 1; return *p; }
               int main() { int a; if (a >= 1) a = f(&a); else while (a) a = a - 1; return a; }";
    let first = parse(src).unwrap();
    let second = parse(src).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn local_assign_and_return() {
    let program = parse("int main(){int a; a = 3; return a;}").unwrap();
    assert_eq!(program.functions.len(), 1);
    let main = &program.functions[0];
    assert_eq!(main.name, "main");
    assert!(main.params.is_empty());

    let stmts = block(&main.body);
    assert_eq!(stmts.len(), 3);
    let StmtKind::Return(value) = &stmts[2].kind else {
        panic!("expected a return statement");
    };
    let ExprKind::Var(var) = &value.kind else {
        panic!("expected a variable");
    };
    assert_eq!(var.offset, 8);
    assert_eq!(main.stack_size, 8);
    assert_snapshot!(main.to_string(), @"(fn main () (block (decl a int 8) (= (var a 8) 3) (return (var a 8))))");
}

#[test]
fn references_resolve_to_declaration_offsets() {
    let program = parse("int main(){int a; int b; int c; c = b + a; return c;}").unwrap();
    let main = &program.functions[0];
    assert_snapshot!(main.to_string(), @"(fn main () (block (decl a int 8) (decl b int 16) (decl c int 24) (= (var c 24) (+ (var b 16) (var a 8))) (return (var c 24))))");
    let frame = program.frame(main).unwrap();
    let offsets: Vec<_> = frame.vars().iter().map(|v| v.offset).collect();
    assert_eq!(offsets, vec![8, 16, 24]);
}

#[test]
fn pointer_declarations_and_deref() {
    let program = parse("int main(){int *p; int a; p = &a; return *p;}").unwrap();
    let main = &program.functions[0];
    let stmts = block(&main.body);

    let StmtKind::Decl(p) = &stmts[0].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(*p.r#type, Type::Ptr(Type::int()));
    let StmtKind::Decl(a) = &stmts[1].kind else {
        panic!("expected a declaration");
    };
    assert_eq!(*a.r#type, Type::Int);

    let StmtKind::Return(ret) = &stmts[3].kind else {
        panic!("expected a return statement");
    };
    let ExprKind::Deref(operand) = &ret.kind else {
        panic!("expected a dereference");
    };
    assert_eq!(operand.r#type.as_ref().unwrap().to_string(), "int*");
    assert_snapshot!(main.to_string(), @"(fn main () (block (decl p int* 8) (decl a int 16) (= (var p 8) (addr (var a 16))) (return (deref (var p 8)))))");
}

#[test]
fn parameter_without_scaling() {
    let program = parse("int f(int x){return x+1;}").unwrap();
    let f = &program.functions[0];
    assert_eq!(f.name, "f");
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.params[0].name, "x");
    assert_eq!(f.params[0].offset, 8);
    assert_snapshot!(f.to_string(), @"(fn f ((decl x int 8)) (block (return (+ (var x 8) 1))))");
}

#[test]
fn pointer_arithmetic_scales_by_pointee() {
    let program = parse(
        "int main(){int *p; int **pp; int n; p = p + n; p = p - 2; pp = pp + 1; n = n + 1; return 0;}",
    )
    .unwrap();
    assert_snapshot!(
        program.functions[0].to_string(),
        @"(fn main () (block (decl p int* 8) (decl pp int** 16) (decl n int 24) (= (var p 8) (+ (var p 8) (* (var n 24) 4))) (= (var p 8) (- (var p 8) (* 2 4))) (= (var pp 16) (+ (var pp 16) (* 1 8))) (= (var n 24) (+ (var n 24) 1)) (return 0)))"
    );
}

#[test]
fn greater_than_is_swapped_less_than() {
    let swapped = parse("int main(){int a; int b; a > b; a >= b;}").unwrap();
    let direct = parse("int main(){int a; int b; b < a; b <= a;}").unwrap();
    assert_eq!(swapped.to_string(), direct.to_string());
}

#[test]
fn redeclaration_is_rejected() {
    let err = parse("int main(){int a; int a; return 0;}").unwrap_err();
    assert!(matches!(err, CompileError::Redeclared { ref name, .. } if name == "a"));

    let err = parse("int f(int a){int a; return a;}").unwrap_err();
    assert!(matches!(err, CompileError::Redeclared { .. }));
}

#[test]
fn same_name_in_two_functions() {
    let program = parse("int f(){int a; return a;} int g(){int b; int a; return a;}").unwrap();
    let f = program.function("f").unwrap();
    let g = program.function("g").unwrap();
    assert_eq!(program.frame(f).unwrap().find("a").unwrap().offset, 8);
    assert_eq!(program.frame(g).unwrap().find("a").unwrap().offset, 16);
    assert_eq!(program.frame(g).unwrap().find("b").unwrap().offset, 8);
    assert_eq!(program.symbols.function_count(), 2);
}

#[test]
fn no_leakage_between_functions() {
    let err = parse("int f(){int a; return a;} int g(){return a;}").unwrap_err();
    assert!(matches!(err, CompileError::Undeclared { ref name, .. } if name == "a"));
}

#[test]
fn undeclared_anywhere_is_rejected() {
    for src in [
        "int main(){return x;}",
        "int main(){int a; a = x + 1; return a;}",
        "int main(){if (x) return 1; return 0;}",
        "int main(){for (;;) y; }",
        "int main(){return f(z);}",
        "int main(){return &w;}",
        "int main(){int a; return a; } int g(){ return *q; }",
    ] {
        let err = parse(src).unwrap_err();
        assert!(
            matches!(err, CompileError::Undeclared { .. }),
            "{}: {:?}",
            src,
            err
        );
    }
}

#[test]
fn use_before_declaration_is_rejected() {
    let err = parse("int main(){a = 1; int a; return a;}").unwrap_err();
    assert!(matches!(err, CompileError::Undeclared { .. }));
}

#[test]
fn return_without_operand_is_a_syntax_error() {
    let err = parse("int main(){return;}").unwrap_err();
    let CompileError::Expected { found, loc, .. } = &err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    assert_eq!(found, ";");
    assert_eq!(loc.offset, 17);
    assert_eq!(
        err.diagnostic("int main(){return;}").to_string(),
        "int main(){return;}\n                 ^ expected an expression, but got \";\""
    );
}

#[test]
fn malformed_functions() {
    assert_eq!(
        parse("x(){return 0;}").unwrap_err(),
        CompileError::MalformedFunction(FunctionDefect::MissingReturnType)
    );
    assert_eq!(
        parse("int (){return 0;}").unwrap_err(),
        CompileError::MalformedFunction(FunctionDefect::MissingName)
    );
    assert_eq!(
        parse("int f(int a, b){return 0;}").unwrap_err(),
        CompileError::MalformedFunction(FunctionDefect::MissingParamType)
    );
}

#[test]
fn lexical_errors_surface_from_parse() {
    let err = parse("int main(){\n  return 1 @ 2;\n}").unwrap_err();
    assert!(matches!(err, CompileError::UnexpectedChar { ch: '@', .. }));
    assert_eq!(
        err.diagnostic("int main(){\n  return 1 @ 2;\n}").to_string(),
        "  return 1 @ 2;\n           ^ unexpected character '@'"
    );
}

#[test]
fn many_statements_and_arguments() {
    let mut body = String::new();
    let mut args = vec![];
    for i in 0..150 {
        body.push_str(&format!("int v{}; ", i));
        args.push(format!("v{}", i));
    }
    let src = format!("int main(){{ {} return f({}); }}", body, args.join(", "));
    let program = parse(&src).unwrap();
    let main = &program.functions[0];
    assert_eq!(block(&main.body).len(), 151);
    assert_eq!(main.stack_size, 150 * 8);
    assert_eq!(program.frame(main).unwrap().aligned_stack_size(16), 1200);
}
