//! Front end for a small C subset: `int` and pointers, locals, functions,
//! `if`/`while`/`for`. Source text goes through [`tokenize`] and [`parse`];
//! the resulting [`Program`] carries resolved stack offsets and types for a
//! code generator to consume.

type P<T> = Box<T>;

pub mod error;
pub mod parser;
pub mod printer;
pub mod symbols;
pub mod tokenizer;
pub mod ty;

pub use error::*;
pub use parser::*;
pub use symbols::*;
pub use tokenizer::*;
pub use ty::*;
