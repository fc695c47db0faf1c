use std::collections::HashMap;

use crate::ast::Type;

/// A local variable and the frame slot that holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub ty: Type,
    pub slot: usize,
}

/// Block scopes of one method body.
///
/// Slots are handed out in declaration order and released when the block
/// that declared them ends, so sibling blocks reuse them. `frame_size` is
/// the high-water mark the interpreter has to allocate.
#[derive(Debug, Clone)]
pub struct TypeScope {
    scopes: Vec<TypeScopeLayer>,
    next_slot: usize,
    frame_size: usize,
}

/// Single layer in the scope stack
#[derive(Debug, Clone, Default)]
pub struct TypeScopeLayer {
    pub variables: HashMap<String, LocalVariable>,
}

impl Default for TypeScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeScope {
    pub fn new() -> Self {
        Self {
            scopes: vec![TypeScopeLayer::default()],
            next_slot: 0,
            frame_size: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(TypeScopeLayer::default());
    }

    /// Leaves the innermost block and frees its slots.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            if let Some(layer) = self.scopes.pop() {
                self.next_slot -= layer.variables.len();
            }
        }
    }

    /// Declares a variable in the innermost block. Returns `None` when the
    /// name is already visible: locals may not shadow other locals.
    pub fn declare(&mut self, name: &str, ty: Type) -> Option<usize> {
        if self.lookup(name).is_some() {
            return None;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.frame_size = self.frame_size.max(self.next_slot);
        self.scopes
            .last_mut()?
            .variables
            .insert(name.to_string(), LocalVariable { ty, slot });
        Some(slot)
    }

    /// Searches from the innermost block outwards.
    pub fn lookup(&self, name: &str) -> Option<&LocalVariable> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
