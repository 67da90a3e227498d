use crate::code::expr::{Expr, ParamExpr, ParamRef};

/// Collects the statements of one block and hands out fresh temporaries.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    stmts: Vec<Expr>,
    counter: usize,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stmt: Expr) {
        self.stmts.push(stmt);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Binds `init` to a fresh temporary and returns a reference to it.
    /// Trivial expressions are returned as-is rather than re-bound.
    pub fn append(&mut self, hint: &str, init: Expr) -> Expr {
        match init {
            Expr::Param(_) | Expr::Const { .. } => init,
            _ => {
                let param = self.new_param(hint, init.type_of());
                self.stmts.push(Expr::declare(&param, Some(init)));
                Expr::param(&param)
            }
        }
    }

    pub fn new_param(&mut self, hint: &str, ty: crate::code::expr::Type) -> ParamRef {
        let name = format!("{}{}", hint, self.counter);
        self.counter += 1;
        ParamExpr::new(name, ty)
    }

    /// Finishes the block. A block with no statements collapses to its
    /// result expression.
    pub fn to_block(self, result: Option<Expr>) -> Expr {
        if self.stmts.is_empty() {
            if let Some(result) = result {
                return result;
            }
        }
        Expr::block(self.stmts, result)
    }
}

/// The emit-block stack a translation writes into.
#[derive(Debug)]
pub struct BlockStack {
    stack: Vec<BlockBuilder>,
}

impl Default for BlockStack {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStack {
    pub fn new() -> Self {
        Self {
            stack: vec![BlockBuilder::new()],
        }
    }

    pub fn current(&mut self) -> &mut BlockBuilder {
        self.stack.last_mut().expect("block stack is never empty")
    }

    pub fn nest(&mut self) {
        self.stack.push(BlockBuilder::new());
    }

    /// Pops the innermost block and returns it as an expression.
    pub fn exit(&mut self) -> Expr {
        debug_assert!(self.stack.len() > 1, "exit without matching nest");
        self.stack.pop().expect("block stack is never empty").to_block(None)
    }

    /// Finishes the root block around `result`.
    pub fn finish(mut self, result: Option<Expr>) -> Expr {
        let root = self.stack.remove(0);
        root.to_block(result)
    }
}
