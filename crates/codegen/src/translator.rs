use std::rc::Rc;

use skiffsql_core::Error;
use skiffsql_core::types::{SqlType, least_restrictive, nullify};
use skiffsql_ir::code::{
    BlockBuilder, BlockStack, Builtin, Class, Expr, FALSE_EXPR, NULL_EXPR, ParamExpr, ParamRef,
    TRUE_EXPR, Type, optimize2,
};
use skiffsql_ir::sql::{SqlExpr, SqlOperator, ensure_type};

use crate::null_as::NullAs;
use crate::table::ImpTable;

/// Signal that a translated sub-expression proved to be the constant null.
/// Handled locally by the CASE, STRICT and NullPolicy paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlwaysNull;

#[derive(Debug)]
pub enum LowerError {
    AlwaysNull(AlwaysNull),
    Error(Error),
}

impl From<Error> for LowerError {
    fn from(e: Error) -> Self {
        LowerError::Error(e)
    }
}

impl From<AlwaysNull> for LowerError {
    fn from(s: AlwaysNull) -> Self {
        LowerError::AlwaysNull(s)
    }
}

impl LowerError {
    /// Collapses to a plain error at boundaries where the always-null
    /// signal has no defined meaning.
    pub fn into_error(self) -> Error {
        match self {
            LowerError::Error(e) => e,
            LowerError::AlwaysNull(_) => {
                Error::internal("unexpected always-null sub-expression")
            }
        }
    }
}

pub type LowerResult<T = Expr> = std::result::Result<T, LowerError>;

/// Converts `e` to `ty` with a cast only when the types differ.
pub fn convert(e: Expr, ty: Type) -> Expr {
    if e.type_of() == ty { e } else { Expr::cast(ty, e) }
}

/// Where column references read from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// One expression per input column, typically bound parameters.
    Columns(Vec<Expr>),
    /// Columns of the partition row at `index`, for window lowering.
    Row {
        index: Box<Expr>,
        columns: Rc<Vec<(String, SqlType)>>,
    },
}

/// Lowers input scalar nodes to IET expressions, dispatching calls through
/// the implementation table. Holds the emit-block stack and the nullability
/// view used by the null-semantics engine.
pub struct Translator<'a> {
    table: &'a ImpTable,
    source: InputSource,
    root: ParamRef,
    blocks: BlockStack,
    nullable_overrides: Vec<(SqlExpr, bool)>,
}

fn root_param() -> ParamRef {
    ParamExpr::new("root", Type::Object(Class::Context))
}

impl<'a> Translator<'a> {
    /// A translator whose column references read bound parameters
    /// `c0..cN`, returned alongside the expression so callers can bind them.
    pub fn for_columns(table: &'a ImpTable, types: &[SqlType]) -> (Self, Vec<ParamRef>) {
        let params: Vec<ParamRef> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| ParamExpr::new(format!("c{}", i), Type::of(ty)))
            .collect();
        let source = InputSource::Columns(params.iter().map(Expr::param).collect());
        (Self::with_source(table, source), params)
    }

    /// A translator whose column references read the partition row at
    /// `index`.
    pub fn for_row(
        table: &'a ImpTable,
        index: Expr,
        columns: Rc<Vec<(String, SqlType)>>,
    ) -> Self {
        Self::with_source(
            table,
            InputSource::Row {
                index: Box::new(index),
                columns,
            },
        )
    }

    pub fn with_source(table: &'a ImpTable, source: InputSource) -> Self {
        Self {
            table,
            source,
            root: root_param(),
            blocks: BlockStack::new(),
            nullable_overrides: Vec::new(),
        }
    }

    /// A derived translator reading the same partition at another index.
    pub fn row_translator(&self, index: Expr) -> Result<Translator<'a>, Error> {
        match &self.source {
            InputSource::Row { columns, .. } => {
                Ok(Translator::for_row(self.table, index, Rc::clone(columns)))
            }
            InputSource::Columns(_) => Err(Error::internal(
                "row translator requested outside window lowering",
            )),
        }
    }

    pub fn table(&self) -> &'a ImpTable {
        self.table
    }

    /// The execution-root context parameter passed to system functions.
    pub fn root(&self) -> Expr {
        Expr::param(&self.root)
    }

    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.blocks.current()
    }

    pub fn nest_block(&mut self) {
        self.blocks.nest();
    }

    pub fn exit_block(&mut self) -> Expr {
        self.blocks.exit()
    }

    pub fn translate(&mut self, node: &SqlExpr, null_as: NullAs) -> LowerResult {
        match node {
            SqlExpr::Literal { value, ty } => {
                if value.is_null() {
                    return match null_as {
                        NullAs::NotPossible => Err(AlwaysNull.into()),
                        NullAs::IsNull | NullAs::True => Ok(TRUE_EXPR.clone()),
                        NullAs::IsNotNull | NullAs::False => Ok(FALSE_EXPR.clone()),
                        NullAs::Null => Ok(Expr::typed_null(Type::of(ty))),
                    };
                }
                let e = Expr::constant(value.clone(), Type::of(&ty.with_nullable(false)));
                Ok(null_as.handle(e))
            }
            SqlExpr::ColumnRef { index, .. } => {
                let mut e = self.input_expr(*index)?;
                if !self.is_nullable(node) {
                    e = e.unboxed();
                }
                Ok(null_as.handle(e))
            }
            SqlExpr::Call(call) => {
                let imp = self
                    .table
                    .get(&call.op)
                    .map_err(LowerError::from)?
                    .ok_or_else(|| {
                        LowerError::from(Error::function_not_found(call.op.name()))
                    })?;
                imp.implement(self, call, null_as)
            }
        }
    }

    pub fn translate_list(&mut self, nodes: &[SqlExpr], null_as: NullAs) -> LowerResult<Vec<Expr>> {
        nodes.iter().map(|n| self.translate(n, null_as)).collect()
    }

    /// Translates and converts the result to `ty`.
    pub fn translate_with_type(
        &mut self,
        node: &SqlExpr,
        null_as: NullAs,
        ty: Type,
    ) -> LowerResult {
        Ok(convert(self.translate(node, null_as)?, ty))
    }

    /// One-shot translation that folds this translator's emitted statements
    /// into the returned expression. Used by row translators, whose output
    /// must be self-contained.
    pub fn translate_standalone(mut self, node: &SqlExpr, null_as: NullAs, ty: Type) -> LowerResult {
        let e = self.translate_with_type(node, null_as, ty)?;
        Ok(self.blocks.finish(Some(e)))
    }

    /// Top-level entry: lowers `node` under `null_as` and closes the root
    /// block. An `AlwaysNull` escaping to this level collapses per demand.
    pub fn lower(mut self, node: &SqlExpr, null_as: NullAs) -> Result<Expr, Error> {
        match self.translate(node, null_as) {
            Ok(e) => Ok(self.blocks.finish(Some(e))),
            Err(LowerError::AlwaysNull(_)) => {
                let e = match null_as {
                    NullAs::Null => NULL_EXPR.clone(),
                    NullAs::False | NullAs::IsNotNull => FALSE_EXPR.clone(),
                    NullAs::True | NullAs::IsNull => TRUE_EXPR.clone(),
                    NullAs::NotPossible => {
                        return Err(Error::internal(
                            "operand proved always null under NOT_POSSIBLE demand",
                        ));
                    }
                };
                Ok(self.blocks.finish(Some(e)))
            }
            Err(LowerError::Error(e)) => Err(e),
        }
    }

    pub fn is_nullable(&self, node: &SqlExpr) -> bool {
        for (n, nullable) in self.nullable_overrides.iter().rev() {
            if n == node {
                return *nullable;
            }
        }
        match node {
            SqlExpr::Literal { value, .. } => value.is_null(),
            _ => node.ty().nullable,
        }
    }

    /// Marks `node` with an overriding nullability for the rest of this
    /// translation.
    pub fn set_nullable(&mut self, node: &SqlExpr, nullable: bool) {
        self.nullable_overrides.push((node.clone(), nullable));
    }

    /// Runs `f` under a derived nullability view, then restores this one.
    pub fn with_nullable<R>(
        &mut self,
        overrides: Vec<(SqlExpr, bool)>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let added = overrides.len();
        self.nullable_overrides.extend(overrides);
        let result = f(self);
        let len = self.nullable_overrides.len() - added;
        self.nullable_overrides.truncate(len);
        result
    }

    pub fn ensure_type(&self, target: &SqlType, node: SqlExpr, match_nullability: bool) -> SqlExpr {
        ensure_type(target, node, match_nullability)
    }

    pub fn least_restrictive(&self, types: &[SqlType]) -> Option<SqlType> {
        least_restrictive(types)
    }

    pub fn nullify_type(&self, ty: &SqlType, nullable: bool) -> SqlType {
        nullify(ty, nullable)
    }

    /// Emits the representation change for a SQL-level cast. The operand is
    /// already known non-null unless `target` is nullable.
    pub fn translate_cast(&mut self, source: &SqlType, target: &SqlType, e: Expr) -> Expr {
        if source.kind == target.kind {
            return if target.nullable {
                e.boxed()
            } else {
                e.unboxed()
            };
        }
        let storage = Type::of(&target.with_nullable(false));
        let inner = Expr::cast(storage, e.clone().unboxed());
        if target.nullable && !e.type_of().is_primitive() {
            optimize2(&e, inner.boxed())
        } else {
            inner
        }
    }

    /// Lowers MAP/ARRAY value constructors.
    pub fn translate_constructor(
        &mut self,
        operands: &[SqlExpr],
        op: SqlOperator,
    ) -> LowerResult {
        let args = self.translate_list(operands, NullAs::Null)?;
        match op {
            SqlOperator::ArrayValueConstructor => Ok(Expr::call(
                None,
                Builtin::ArrayValue,
                args,
                Type::Object(Class::Array),
            )),
            SqlOperator::MapValueConstructor => Ok(Expr::call(
                None,
                Builtin::MapValue,
                args,
                Type::Object(Class::Map),
            )),
            other => Err(LowerError::from(Error::internal(format!(
                "not a value constructor: {:?}",
                other
            )))),
        }
    }

    fn input_expr(&self, index: usize) -> LowerResult {
        match &self.source {
            InputSource::Columns(cols) => cols.get(index).cloned().ok_or_else(|| {
                LowerError::from(Error::invalid_query(format!(
                    "column reference {} out of range",
                    index
                )))
            }),
            InputSource::Row { index: row, columns } => {
                let (name, col_ty) = columns.get(index).ok_or_else(|| {
                    LowerError::from(Error::invalid_query(format!(
                        "column reference {} out of range",
                        index
                    )))
                })?;
                let row_val = Expr::call(
                    None,
                    Builtin::PartitionRow,
                    vec![(**row).clone()],
                    Type::Object(Class::Any),
                );
                Ok(Expr::field(Some(row_val), name.clone(), Type::of(col_ty)))
            }
        }
    }
}
