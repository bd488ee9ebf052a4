//! Per-function local variable tables.
//!
//! Each function owns one flat [`Frame`]; there are no nested scopes. Offsets
//! grow by 8 in declaration order starting at 8, and a name may be declared
//! only once per frame.

use std::rc::Rc;

use crate::Type;

const SLOT_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVar {
    pub name: String,
    pub offset: usize,
    pub r#type: Rc<Type>,
}

/// Locals of a single function, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    vars: Vec<LocalVar>,
}

impl Frame {
    pub fn find(&self, name: &str) -> Option<&LocalVar> {
        self.vars.iter().rev().find(|var| var.name == name)
    }

    /// Appends `name` at the next free offset, or returns `None` if it is
    /// already declared in this frame.
    pub fn declare(&mut self, name: &str, r#type: Rc<Type>) -> Option<&LocalVar> {
        if self.find(name).is_some() {
            return None;
        }
        let offset = self.stack_size() + SLOT_SIZE;
        self.vars.push(LocalVar {
            name: name.to_string(),
            offset,
            r#type,
        });
        self.vars.last()
    }

    /// Bytes used by locals: the offset of the last declared variable.
    pub fn stack_size(&self) -> usize {
        self.vars.last().map_or(0, |var| var.offset)
    }

    pub fn aligned_stack_size(&self, align: usize) -> usize {
        self.stack_size().div_ceil(align) * align
    }

    pub fn vars(&self) -> &[LocalVar] {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// One [`Frame`] per function, indexed in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    frames: Vec<Frame>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh frame and returns its index.
    pub fn enter_function(&mut self) -> usize {
        self.frames.push(Frame::default());
        self.frames.len() - 1
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The current frame, opening one first if no function has started.
    pub fn current_or_enter(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.enter_function();
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn function_count(&self) -> usize {
        self.frames.len()
    }
}
