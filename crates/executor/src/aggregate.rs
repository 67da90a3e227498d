use skiffsql_codegen::{
    AggAddContext, AggContext, AggResetContext, AggResultContext, ImpTable, Translator,
};
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::{SqlType, Value};
use skiffsql_functions::EvalRoot;
use skiffsql_ir::code::{Expr, ParamExpr, ParamRef};
use skiffsql_ir::sql::{Aggregation, SqlExpr};

use crate::eval::Evaluator;

/// Drives an aggregate implementor over one group of rows: lowers the
/// reset/add/result hooks once, then evaluates them against the rows.
pub struct Aggregator<'a> {
    table: &'a ImpTable,
}

impl<'a> Aggregator<'a> {
    pub fn new(table: &'a ImpTable) -> Self {
        Self { table }
    }

    pub fn aggregate(
        &self,
        aggregation: &Aggregation,
        args: &[SqlExpr],
        input_types: &[SqlType],
        rows: &[Vec<Value>],
        return_type: SqlType,
    ) -> Result<Value> {
        let imp = self
            .table
            .get_aggregate(aggregation)?
            .ok_or_else(|| Error::function_not_found(aggregation.name()))?;
        let info = AggContext {
            aggregation: aggregation.clone(),
            return_type,
            parameter_types: args.iter().map(|a| a.ty().clone()).collect(),
        };

        let state_types = imp.state_types(&info);
        let acc_params: Vec<ParamRef> = state_types
            .iter()
            .enumerate()
            .map(|(i, ty)| ParamExpr::new(format!("acc{}", i), *ty))
            .collect();
        let accumulator: Vec<Expr> = acc_params.iter().map(Expr::param).collect();

        let mut reset_ctx = AggResetContext::new(accumulator.clone());
        imp.implement_reset(&info, &mut reset_ctx)?;
        let reset_block = reset_ctx.into_block();

        let (mut translator, col_params) = Translator::for_columns(self.table, input_types);
        let mut add_ctx = AggAddContext::new(accumulator.clone(), &mut translator, args.to_vec());
        imp.implement_add(&info, &mut add_ctx)?;
        let add_block = add_ctx.into_block();

        let mut result_ctx = AggResultContext::new(accumulator);
        let result = imp.implement_result(&info, &mut result_ctx)?;
        let result_expr = result_ctx.into_result(result);

        let mut evaluator = Evaluator::new(EvalRoot::default());
        evaluator.eval(&reset_block)?;
        for row in rows {
            for (param, value) in col_params.iter().zip(row) {
                evaluator.bind_param(param, value.clone());
            }
            evaluator.eval(&add_block)?;
        }
        evaluator.eval(&result_expr)
    }
}
