//! S-expression rendering of the AST.
//!
//! ```text
//! int main() { int a; a = 3; return a; }
//! (fn main () (block (decl a int 8) (= (var a 8) 3) (return (var a 8))))
//! ```

use std::fmt;

use crate::{ExprKind, ExprNode, Function, LocalVar, Program, StmtKind, StmtNode};

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, lhs, rhs) = match &self.kind {
            ExprKind::Number(val) => return write!(f, "{}", val),
            ExprKind::Var(var) => return write!(f, "(var {} {})", var.name, var.offset),
            ExprKind::Addr(operand) => return write!(f, "(addr {})", operand),
            ExprKind::Deref(operand) => return write!(f, "(deref {})", operand),
            ExprKind::Call { name, args } => {
                write!(f, "(call {}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                return write!(f, ")");
            }
            ExprKind::Add(lhs, rhs) => ("+", lhs, rhs),
            ExprKind::Sub(lhs, rhs) => ("-", lhs, rhs),
            ExprKind::Mul(lhs, rhs) => ("*", lhs, rhs),
            ExprKind::Div(lhs, rhs) => ("/", lhs, rhs),
            ExprKind::Lt(lhs, rhs) => ("<", lhs, rhs),
            ExprKind::Lte(lhs, rhs) => ("<=", lhs, rhs),
            ExprKind::Eq(lhs, rhs) => ("==", lhs, rhs),
            ExprKind::Ne(lhs, rhs) => ("!=", lhs, rhs),
            ExprKind::Assign(lhs, rhs) => ("=", lhs, rhs),
        };
        write!(f, "({} {} {})", op, lhs, rhs)
    }
}

impl fmt::Display for StmtNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Expr(node) => write!(f, "{}", node),
            StmtKind::Return(node) => write!(f, "(return {})", node),
            StmtKind::Block(stmts) => {
                write!(f, "(block")?;
                for stmt in stmts {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            StmtKind::If(cond, then, r#else) => {
                write!(f, "(if {} {}", cond, then)?;
                if let Some(r#else) = r#else {
                    write!(f, " {}", r#else)?;
                }
                write!(f, ")")
            }
            StmtKind::While(cond, body) => write!(f, "(while {} {})", cond, body),
            StmtKind::For(init, cond, inc, body) => {
                write!(f, "(for")?;
                for clause in [init, cond, inc] {
                    match clause {
                        Some(node) => write!(f, " {}", node)?,
                        None => write!(f, " _")?,
                    }
                }
                write!(f, " {})", body)
            }
            StmtKind::Decl(var) => write!(f, "{}", var),
        }
    }
}

impl fmt::Display for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(decl {} {} {})", self.name, self.r#type, self.offset)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(fn {} (", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") {})", self.body)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use insta::assert_snapshot;

    #[test]
    fn function_with_params() {
        let program = parse("int add(int a, int *b) { return a + *b; }").unwrap();
        assert_snapshot!(
            program.functions[0].to_string(),
            @"(fn add ((decl a int 8) (decl b int* 16)) (block (return (+ (var a 8) (deref (var b 16))))))"
        );
    }

    #[test]
    fn if_without_else() {
        let program = parse("int main() if (1) return 2;").unwrap();
        assert_snapshot!(program.functions[0].to_string(), @"(fn main () (if 1 (return 2)))");
    }

    #[test]
    fn program_prints_one_function_per_line() {
        let program = parse("int f() { return 1; } int g() { return f(); }").unwrap();
        assert_eq!(
            program.to_string(),
            "(fn f () (block (return 1)))\n(fn g () (block (return (call f))))\n"
        );
    }
}
