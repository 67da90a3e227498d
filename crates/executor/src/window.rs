use std::rc::Rc;

use skiffsql_codegen::{
    AggAddContext, AggContext, AggResetContext, AggResultContext, ImpTable, Translator,
    WinAggAddContext, WinAggFrame, WinAggResultContext,
};
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::{SqlType, Value};
use skiffsql_functions::EvalRoot;
use skiffsql_ir::code::{Expr, ParamExpr, ParamRef, Primitive, Type};
use skiffsql_ir::sql::{Aggregation, SqlExpr};

use crate::eval::{Evaluator, PartitionCtx};

/// Drives a window-aggregate implementor over one partition. Rows are
/// processed through a sorted index vector and results written back under
/// the original row indices; the frame grows cumulatively, which is what
/// the default RANGE UNBOUNDED PRECEDING..CURRENT ROW frame induces.
pub struct WindowExec<'a> {
    table: &'a ImpTable,
}

impl<'a> WindowExec<'a> {
    pub fn new(table: &'a ImpTable) -> Self {
        Self { table }
    }

    pub fn run(
        &self,
        aggregation: &Aggregation,
        args: &[SqlExpr],
        columns: &[(String, SqlType)],
        rows: &[Vec<Value>],
        order_by: &[usize],
        return_type: SqlType,
    ) -> Result<Vec<Value>> {
        let imp = self
            .table
            .get_window_aggregate(aggregation)?
            .ok_or_else(|| Error::function_not_found(aggregation.name()))?;
        let info = AggContext {
            aggregation: aggregation.clone(),
            return_type,
            parameter_types: args.iter().map(|a| a.ty().clone()).collect(),
        };
        let columns = Rc::new(columns.to_vec());

        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.sort_by(|&a, &b| compare_keys(rows, order_by, a, b));
        let sorted: Vec<Vec<Value>> = indices.iter().map(|&i| rows[i].clone()).collect();

        let i32_param = |name: &str| ParamExpr::new(name, Type::Primitive(Primitive::I32));
        let pos = i32_param("pos");
        let start_index = i32_param("startIndex");
        let end_index = i32_param("endIndex");
        let frame_rows = i32_param("frameRowCount");
        let partition_rows = i32_param("partitionRowCount");
        let has_rows = ParamExpr::new("hasRows", Type::Primitive(Primitive::Bool));
        let frame = WinAggFrame {
            current_position: Expr::param(&pos),
            start_index: Expr::param(&start_index),
            end_index: Expr::param(&end_index),
            frame_row_count: Expr::param(&frame_rows),
            partition_row_count: Expr::param(&partition_rows),
            has_rows: Expr::param(&has_rows),
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

        let mut add_translator =
            Translator::for_row(self.table, Expr::param(&pos), Rc::clone(&columns));
        let mut add_ctx = WinAggAddContext {
            agg: AggAddContext::new(accumulator.clone(), &mut add_translator, args.to_vec()),
            frame: &frame,
        };
        imp.implement_add(&info, &mut add_ctx)?;
        let add_block = add_ctx.agg.into_block();

        let result_translator =
            Translator::for_row(self.table, Expr::param(&pos), Rc::clone(&columns));
        let mut result_ctx = WinAggResultContext::new(
            AggResultContext::new(accumulator),
            &result_translator,
            args.to_vec(),
            &frame,
        );
        let result = imp.implement_result(&info, &mut result_ctx)?;
        let result_expr = result_ctx.into_result(result);

        let mut evaluator = Evaluator::new(EvalRoot::default());
        evaluator.set_partition(PartitionCtx {
            rows: sorted,
            columns,
            order_keys: order_by.to_vec(),
        });
        let n = rows.len();
        evaluator.bind_param(&partition_rows, Value::int64(n as i64));
        evaluator.bind_param(&has_rows, Value::bool_val(n > 0));
        evaluator.bind_param(&start_index, Value::int64(0));
        evaluator.eval(&reset_block)?;

        let mut results = vec![Value::Null; n];
        for (position, &original_idx) in indices.iter().enumerate() {
            evaluator.bind_param(&pos, Value::int64(position as i64));
            evaluator.bind_param(&end_index, Value::int64(position as i64));
            evaluator.bind_param(&frame_rows, Value::int64(position as i64 + 1));
            evaluator.eval(&add_block)?;
            results[original_idx] = evaluator.eval(&result_expr)?;
        }
        Ok(results)
    }
}

fn compare_keys(rows: &[Vec<Value>], order_by: &[usize], a: usize, b: usize) -> std::cmp::Ordering {
    for &key in order_by {
        let ord = match (&rows[a][key], &rows[b][key]) {
            (Value::Null, Value::Null) => std::cmp::Ordering::Equal,
            (Value::Null, _) => std::cmp::Ordering::Less,
            (_, Value::Null) => std::cmp::Ordering::Greater,
            (x, y) => skiffsql_functions::compare::value_cmp(x, y)
                .unwrap_or(std::cmp::Ordering::Equal),
        };
        if !ord.is_eq() {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}
