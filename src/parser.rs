use std::rc::Rc;

use tracing::{debug, instrument, trace};

use crate::{
    tokenize, CompileError, CompileResult, Frame, FunctionDefect, Keyword, LocalVar,
    SourceLocation, SymbolTable, Token, TokenKind, Type, P,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Node<Kind> {
    pub kind: Kind,
    pub loc: SourceLocation,
    pub r#type: Option<Rc<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(i64),
    Add(P<ExprNode>, P<ExprNode>),
    Sub(P<ExprNode>, P<ExprNode>),
    Mul(P<ExprNode>, P<ExprNode>),
    Div(P<ExprNode>, P<ExprNode>),

    Lt(P<ExprNode>, P<ExprNode>),
    Lte(P<ExprNode>, P<ExprNode>),
    Eq(P<ExprNode>, P<ExprNode>),
    Ne(P<ExprNode>, P<ExprNode>),

    Assign(P<ExprNode>, P<ExprNode>),
    Var(LocalVar),

    Addr(P<ExprNode>),
    Deref(P<ExprNode>),

    Call { name: String, args: Vec<ExprNode> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(ExprNode),
    Return(ExprNode),
    Block(Vec<StmtNode>),
    If(P<ExprNode>, P<StmtNode>, Option<P<StmtNode>>),
    While(P<ExprNode>, P<StmtNode>),
    For(
        Option<P<ExprNode>>,
        Option<P<ExprNode>>,
        Option<P<ExprNode>>,
        P<StmtNode>,
    ),
    Decl(LocalVar),
}

pub type ExprNode = Node<ExprKind>;

#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub kind: StmtKind,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<LocalVar>,
    pub body: StmtNode,
    /// Index of this function's frame in [`Program::symbols`].
    pub frame: usize,
    pub stack_size: usize,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
    pub symbols: SymbolTable,
}

impl Program {
    pub fn frame(&self, function: &Function) -> Option<&Frame> {
        self.symbols.frame(function.frame)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Tokenize and parse a whole program.
#[instrument(skip_all)]
pub fn parse(source: &str) -> CompileResult<Program> {
    Parser::new(source)?.parse()
}

// Deepest allowed nesting of statements and expressions.
const MAX_NESTING: usize = 128;

#[derive(Debug)]
pub struct Parser<'src> {
    pub source: &'src str,
    pub tokens: Vec<Token<'src>>,
    pub index: usize,
    pub symbols: SymbolTable,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> CompileResult<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            index: 0,
            symbols: SymbolTable::new(),
            depth: 0,
        })
    }

    pub fn parse(mut self) -> CompileResult<Program> {
        let functions = self.program()?;
        Ok(Program {
            functions,
            symbols: self.symbols,
        })
    }

    // program = function*
    pub fn program(&mut self) -> CompileResult<Vec<Function>> {
        let mut functions = vec![];
        while !self.is_done() {
            functions.push(self.function()?);
        }
        Ok(functions)
    }

    /// Opens a fresh local variable frame; later declarations land in it.
    pub fn begin_function(&mut self) -> usize {
        self.symbols.enter_function()
    }

    // function = "int" ident "(" ("int" declarator ("," "int" declarator)*)? ")" stmt
    pub fn function(&mut self) -> CompileResult<Function> {
        let frame = self.begin_function();
        let loc = self.loc();
        if !self.consume_type() {
            return Err(CompileError::MalformedFunction(
                FunctionDefect::MissingReturnType,
            ));
        }
        let name = self
            .consume_ident()
            .ok_or(CompileError::MalformedFunction(FunctionDefect::MissingName))?
            .text
            .to_string();

        self.skip("(")?;
        let mut params = vec![];
        if !self.consume(")") {
            loop {
                if !self.consume_type() {
                    return Err(CompileError::MalformedFunction(
                        FunctionDefect::MissingParamType,
                    ));
                }
                params.push(self.declarator()?);
                if self.consume(")") {
                    break;
                }
                self.skip(",")?;
            }
        }

        let body = self.stmt()?;
        let stack_size = self.frame_mut().stack_size();
        debug!(%name, params = params.len(), stack_size, "parsed function");
        Ok(Function {
            name,
            params,
            body,
            frame,
            stack_size,
            loc,
        })
    }

    // declarator = "*"* ident
    //
    // The leading "int" has already been consumed.
    fn declarator(&mut self) -> CompileResult<LocalVar> {
        let mut r#type = Type::int();
        while self.consume("*") {
            r#type = Type::pointer_to(r#type);
        }

        let tok = match self.consume_ident() {
            Some(tok) => tok,
            None => return Err(self.expected("a variable name")),
        };
        match self.frame_mut().declare(tok.text, r#type) {
            Some(var) => {
                trace!(name = %var.name, offset = var.offset, ty = %var.r#type, "declared");
                Ok(var.clone())
            }
            None => Err(CompileError::Redeclared {
                name: tok.text.to_string(),
                loc: tok.loc,
            }),
        }
    }

    // stmt = expr ";"
    //      | "{" stmt* "}"
    //      | "if" "(" expr ")" stmt ("else" stmt)?
    //      | "while" "(" expr ")" stmt
    //      | "for" "(" expr? ";" expr? ";" expr? ")" stmt
    //      | "return" expr ";"
    //      | "int" declarator ";"
    pub fn stmt(&mut self) -> CompileResult<StmtNode> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> CompileResult<StmtNode> {
        let loc = self.loc();

        if self.consume("{") {
            let mut stmts = vec![];
            while !self.consume("}") {
                stmts.push(self.stmt()?);
            }
            return Ok(StmtNode {
                kind: StmtKind::Block(stmts),
                loc,
            });
        }

        if self.consume_keyword(Keyword::For) {
            self.skip("(")?;
            let init = if self.consume(";") {
                None
            } else {
                let init = self.expr()?;
                self.skip(";")?;
                Some(P::new(init))
            };
            let cond = if self.consume(";") {
                None
            } else {
                let cond = self.expr()?;
                self.skip(";")?;
                Some(P::new(cond))
            };
            let inc = if self.consume(")") {
                None
            } else {
                let inc = self.expr()?;
                self.skip(")")?;
                Some(P::new(inc))
            };
            let body = P::new(self.stmt()?);
            return Ok(StmtNode {
                kind: StmtKind::For(init, cond, inc, body),
                loc,
            });
        }

        if self.consume_keyword(Keyword::While) {
            self.skip("(")?;
            let cond = P::new(self.expr()?);
            self.skip(")")?;
            let body = P::new(self.stmt()?);
            return Ok(StmtNode {
                kind: StmtKind::While(cond, body),
                loc,
            });
        }

        if self.consume_keyword(Keyword::If) {
            self.skip("(")?;
            let cond = P::new(self.expr()?);
            self.skip(")")?;
            let then = P::new(self.stmt()?);
            let r#else = if self.consume_keyword(Keyword::Else) {
                Some(P::new(self.stmt()?))
            } else {
                None
            };
            return Ok(StmtNode {
                kind: StmtKind::If(cond, then, r#else),
                loc,
            });
        }

        if self.consume_keyword(Keyword::Return) {
            let node = self.expr()?;
            self.skip(";")?;
            return Ok(StmtNode {
                kind: StmtKind::Return(node),
                loc,
            });
        }

        if self.consume_type() {
            let var = self.declarator()?;
            self.skip(";")?;
            return Ok(StmtNode {
                kind: StmtKind::Decl(var),
                loc,
            });
        }

        let node = self.expr()?;
        self.skip(";")?;
        Ok(StmtNode {
            kind: StmtKind::Expr(node),
            loc,
        })
    }

    // expr = assign
    pub fn expr(&mut self) -> CompileResult<ExprNode> {
        self.nested(Self::assign)
    }

    // assign = equality ("=" assign)?
    fn assign(&mut self) -> CompileResult<ExprNode> {
        let node = self.equality()?;
        let loc = self.loc();
        if self.consume("=") {
            let rhs = self.nested(Self::assign)?;
            return Ok(untyped(ExprKind::Assign(P::new(node), P::new(rhs)), loc));
        }
        Ok(node)
    }

    // equality = relational ("==" relational | "!=" relational)*
    fn equality(&mut self) -> CompileResult<ExprNode> {
        let mut node = self.relational()?;

        loop {
            let loc = self.loc();
            if self.consume("==") {
                let rhs = self.relational()?;
                node = untyped(ExprKind::Eq(P::new(node), P::new(rhs)), loc);
            } else if self.consume("!=") {
                let rhs = self.relational()?;
                node = untyped(ExprKind::Ne(P::new(node), P::new(rhs)), loc);
            } else {
                return Ok(node);
            }
        }
    }

    // relational = add ("<" add | "<=" add | ">" add | ">=" add)*
    //
    // `a > b` becomes `b < a` and `a >= b` becomes `b <= a`.
    fn relational(&mut self) -> CompileResult<ExprNode> {
        let mut node = self.add()?;

        loop {
            let loc = self.loc();
            if self.consume("<") {
                let rhs = self.add()?;
                node = untyped(ExprKind::Lt(P::new(node), P::new(rhs)), loc);
            } else if self.consume("<=") {
                let rhs = self.add()?;
                node = untyped(ExprKind::Lte(P::new(node), P::new(rhs)), loc);
            } else if self.consume(">") {
                let rhs = self.add()?;
                node = untyped(ExprKind::Lt(P::new(rhs), P::new(node)), loc);
            } else if self.consume(">=") {
                let rhs = self.add()?;
                node = untyped(ExprKind::Lte(P::new(rhs), P::new(node)), loc);
            } else {
                return Ok(node);
            }
        }
    }

    // add = mul ("+" mul | "-" mul)*
    fn add(&mut self) -> CompileResult<ExprNode> {
        let mut node = self.mul()?;

        loop {
            let loc = self.loc();
            if self.consume("+") {
                let rhs = self.mul()?;
                node = pointer_arith(ExprKind::Add, node, rhs, loc);
            } else if self.consume("-") {
                let rhs = self.mul()?;
                node = pointer_arith(ExprKind::Sub, node, rhs, loc);
            } else {
                return Ok(node);
            }
        }
    }

    // mul = unary ("*" unary | "/" unary)*
    fn mul(&mut self) -> CompileResult<ExprNode> {
        let mut node = self.unary()?;

        loop {
            let loc = self.loc();
            if self.consume("*") {
                let rhs = self.unary()?;
                node = untyped(ExprKind::Mul(P::new(node), P::new(rhs)), loc);
            } else if self.consume("/") {
                let rhs = self.unary()?;
                node = untyped(ExprKind::Div(P::new(node), P::new(rhs)), loc);
            } else {
                return Ok(node);
            }
        }
    }

    // unary = "+" primary
    //       | "-" primary
    //       | "&" unary
    //       | "*" unary
    //       | primary
    //
    // Address-of and dereference nodes are left untyped, so they never
    // trigger pointer scaling.
    fn unary(&mut self) -> CompileResult<ExprNode> {
        let loc = self.loc();

        if self.consume("+") {
            return self.primary();
        }
        if self.consume("-") {
            let operand = self.primary()?;
            return Ok(untyped(
                ExprKind::Sub(synth_num(0, loc), P::new(operand)),
                loc,
            ));
        }
        if self.consume("&") {
            let operand = self.nested(Self::unary)?;
            return Ok(untyped(ExprKind::Addr(P::new(operand)), loc));
        }
        if self.consume("*") {
            let operand = self.nested(Self::unary)?;
            return Ok(untyped(ExprKind::Deref(P::new(operand)), loc));
        }

        self.primary()
    }

    // primary = "(" expr ")"
    //         | ident ("(" (expr ("," expr)*)? ")")?
    //         | num
    fn primary(&mut self) -> CompileResult<ExprNode> {
        let loc = self.loc();

        if self.consume("(") {
            let node = self.expr()?;
            self.skip(")")?;
            return Ok(node);
        }

        if let Some(tok) = self.consume_ident() {
            if self.consume("(") {
                let mut args = vec![];
                if !self.consume(")") {
                    loop {
                        args.push(self.expr()?);
                        if self.consume(")") {
                            break;
                        }
                        self.skip(",")?;
                    }
                }
                return Ok(untyped(
                    ExprKind::Call {
                        name: tok.text.to_string(),
                        args,
                    },
                    loc,
                ));
            }
            return self.variable(tok);
        }

        if let TokenKind::Number(val) = self.peek().kind {
            self.advance();
            return Ok(untyped(ExprKind::Number(val), loc));
        }

        Err(self.expected("an expression"))
    }

    fn variable(&self, tok: Token<'src>) -> CompileResult<ExprNode> {
        let var = self
            .symbols
            .current()
            .and_then(|frame| frame.find(tok.text))
            .ok_or_else(|| CompileError::Undeclared {
                name: tok.text.to_string(),
                loc: tok.loc,
            })?;
        Ok(ExprNode {
            r#type: Some(var.r#type.clone()),
            kind: ExprKind::Var(var.clone()),
            loc: tok.loc,
        })
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.expected("less deeply nested code"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.symbols.current_or_enter()
    }

    fn peek(&self) -> &Token<'src> {
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.peek().kind != TokenKind::Eof {
            self.index += 1;
        }
    }

    fn r#match(&self, s: &str) -> bool {
        let tok = self.peek();
        matches!(tok.kind, TokenKind::Punct(_)) && tok.text == s
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.r#match(s) {
            self.advance();
            return true;
        }
        false
    }

    fn skip(&mut self, s: &str) -> CompileResult<()> {
        if !self.consume(s) {
            return Err(self.expected(format!("'{}'", s)));
        }
        Ok(())
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek().kind == TokenKind::Keyword(keyword) {
            self.advance();
            return true;
        }
        false
    }

    fn consume_type(&mut self) -> bool {
        if let TokenKind::Type(_) = self.peek().kind {
            self.advance();
            return true;
        }
        false
    }

    fn consume_ident(&mut self) -> Option<Token<'src>> {
        let tok = *self.peek();
        if tok.kind != TokenKind::Ident {
            return None;
        }
        self.advance();
        Some(tok)
    }

    fn expected(&self, what: impl Into<String>) -> CompileError {
        let tok = self.peek();
        let found = match tok.kind {
            TokenKind::Eof => "EOF",
            _ => tok.text,
        };
        CompileError::expected(what, found, tok.loc)
    }

    fn is_done(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn loc(&self) -> SourceLocation {
        self.peek().loc
    }
}

/// Builds `lhs + rhs` or `lhs - rhs`. When `lhs` is a pointer the right
/// operand is multiplied by the pointee size and the result keeps the
/// pointer type.
fn pointer_arith(
    op: fn(P<ExprNode>, P<ExprNode>) -> ExprKind,
    lhs: ExprNode,
    rhs: ExprNode,
    loc: SourceLocation,
) -> ExprNode {
    let pointee = lhs.r#type.as_ref().and_then(|ty| ty.pointee()).cloned();
    match pointee {
        Some(pointee) => {
            let scaled = untyped(
                ExprKind::Mul(P::new(rhs), synth_num(pointee.size(), loc)),
                loc,
            );
            let r#type = lhs.r#type.clone();
            ExprNode {
                kind: op(P::new(lhs), P::new(scaled)),
                loc,
                r#type,
            }
        }
        None => untyped(op(P::new(lhs), P::new(rhs)), loc),
    }
}

fn untyped(kind: ExprKind, loc: SourceLocation) -> ExprNode {
    ExprNode {
        kind,
        loc,
        r#type: None,
    }
}

fn synth_num(v: i64, loc: SourceLocation) -> P<ExprNode> {
    P::new(untyped(ExprKind::Number(v), loc))
}
