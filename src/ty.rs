use std::fmt;
use std::rc::Rc;

/// `int` or a pointer chain ending in `int`. Pointees are shared, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Ptr(Rc<Type>),
}

impl Type {
    pub fn int() -> Rc<Type> {
        Rc::new(Type::Int)
    }

    pub fn pointer_to(base: Rc<Type>) -> Rc<Type> {
        Rc::new(Type::Ptr(base))
    }

    pub fn pointee(&self) -> Option<&Rc<Type>> {
        match self {
            Type::Ptr(base) => Some(base),
            Type::Int => None,
        }
    }

    /// Storage size in bytes, used to scale pointer arithmetic.
    pub fn size(&self) -> i64 {
        match self {
            Type::Int => 4,
            Type::Ptr(_) => 8,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Ptr(base) => write!(f, "{}*", base),
        }
    }
}
