use std::collections::HashMap;
use std::rc::Rc;

use chrono::Days;
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::{SqlType, Value};
use skiffsql_functions::{EvalRoot, compare, invoke, scalar};
use skiffsql_ir::code::{BinOp, Builtin, Expr, MethodRef, ParamRef, Primitive, Type, UnaryOp};

/// The partition a window evaluation runs over: rows in frame order plus
/// the ORDER BY key columns backing the row comparator.
#[derive(Debug, Clone)]
pub struct PartitionCtx {
    pub rows: Vec<Vec<Value>>,
    pub columns: Rc<Vec<(String, SqlType)>>,
    pub order_keys: Vec<usize>,
}

impl PartitionCtx {
    fn row_value(&self, index: i64) -> Result<Value> {
        let row = self
            .rows
            .get(usize::try_from(index).map_err(|_| row_range_error(index))?)
            .ok_or_else(|| row_range_error(index))?;
        let entries = self
            .columns
            .iter()
            .zip(row)
            .map(|((name, _), v)| (Value::string(name.clone()), v.clone()))
            .collect();
        Ok(Value::Map(entries))
    }

    fn compare_rows(&self, i: i64, j: i64) -> Result<Value> {
        let a = self
            .rows
            .get(i as usize)
            .ok_or_else(|| row_range_error(i))?;
        let b = self
            .rows
            .get(j as usize)
            .ok_or_else(|| row_range_error(j))?;
        for &key in &self.order_keys {
            let ord = match (&a[key], &b[key]) {
                (Value::Null, Value::Null) => std::cmp::Ordering::Equal,
                (Value::Null, _) => std::cmp::Ordering::Less,
                (_, Value::Null) => std::cmp::Ordering::Greater,
                (x, y) => compare::value_cmp(x, y)?,
            };
            if !ord.is_eq() {
                return Ok(Value::Int64(ord as i64));
            }
        }
        Ok(Value::Int64(0))
    }
}

fn row_range_error(index: i64) -> Error {
    Error::invalid_operation(format!("partition row {} out of range", index))
}

/// Tree-walking evaluator for generated expression trees.
pub struct Evaluator {
    env: HashMap<String, Value>,
    root: EvalRoot,
    partition: Option<PartitionCtx>,
}

impl Evaluator {
    pub fn new(root: EvalRoot) -> Self {
        let mut env = HashMap::new();
        // The root context itself carries no value; context-taking builtins
        // read from the evaluator.
        env.insert("root".to_string(), Value::Null);
        Self {
            env,
            root,
            partition: None,
        }
    }

    pub fn set_partition(&mut self, partition: PartitionCtx) {
        self.partition = Some(partition);
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.env.insert(name.into(), value);
    }

    pub fn bind_param(&mut self, param: &ParamRef, value: Value) {
        self.env.insert(param.name.clone(), value);
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Const { value, .. } => Ok(value.clone()),
            Expr::Param(p) => self
                .env
                .get(&p.name)
                .cloned()
                .ok_or_else(|| Error::internal(format!("unbound parameter {}", p.name))),
            Expr::Field { target, name, .. } => {
                let target = match target {
                    Some(t) => self.eval(t)?,
                    None => {
                        return Err(Error::internal(format!(
                            "field {} has no receiver",
                            name
                        )));
                    }
                };
                match target {
                    Value::Null => Ok(Value::Null),
                    Value::Map(entries) => Ok(entries
                        .iter()
                        .find(|(k, _)| k.as_str() == Some(name.as_str()))
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Value::Null)),
                    other => Err(Error::type_mismatch_with(
                        "row value",
                        format!("{}", other.kind()),
                    )),
                }
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Unary { op, expr } => {
                let v = self.eval(expr)?;
                match op {
                    UnaryOp::Not => match v {
                        Value::Bool(b) => Ok(Value::Bool(!b)),
                        Value::Null => Ok(Value::Null),
                        other => Err(Error::type_mismatch_with(
                            "BOOLEAN",
                            format!("{}", other.kind()),
                        )),
                    },
                    UnaryOp::Negate => match v {
                        Value::Int64(i) => Ok(Value::Int64(-i)),
                        Value::Float64(f) => Ok(Value::Float64(-f)),
                        Value::Numeric(d) => Ok(Value::Numeric(-d)),
                        Value::Interval(ms) => Ok(Value::Interval(-ms)),
                        Value::Null => Ok(Value::Null),
                        other => Err(Error::type_mismatch_with(
                            "numeric",
                            format!("{}", other.kind()),
                        )),
                    },
                    UnaryOp::UnaryPlus => Ok(v),
                }
            }
            Expr::Condition {
                test,
                if_true,
                if_false,
            } => {
                if self.eval_bool(test)? {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            Expr::Call {
                target,
                method,
                args,
                ..
            } => self.eval_call(target.as_deref(), method, args),
            Expr::Cast { ty, expr } => {
                let v = self.eval(expr)?;
                convert_value(v, *ty)
            }
            Expr::Block { stmts, result } => self.eval_block(stmts, result.as_deref()),
            Expr::Declare { param, init } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::Null,
                };
                self.env.insert(param.name.clone(), value);
                Ok(Value::Null)
            }
            Expr::Assign { target, value } => {
                let v = self.eval(value)?;
                match target.as_ref() {
                    Expr::Param(p) => {
                        self.env.insert(p.name.clone(), v);
                        Ok(Value::Null)
                    }
                    other => Err(Error::internal(format!(
                        "cannot assign to {:?}",
                        other
                    ))),
                }
            }
            Expr::IfThen {
                test,
                then_block,
                else_block,
            } => {
                if self.eval_bool(test)? {
                    self.eval(then_block)?;
                } else if let Some(else_block) = else_block {
                    self.eval(else_block)?;
                }
                Ok(Value::Null)
            }
            Expr::Throw { message } => Err(Error::illegal_state(message.clone())),
        }
    }

    fn eval_bool(&mut self, expr: &Expr) -> Result<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch_with(
                "BOOLEAN",
                format!("{}", other.kind()),
            )),
        }
    }

    fn eval_block(&mut self, stmts: &[Expr], result: Option<&Expr>) -> Result<Value> {
        // Variables declared in this block shadow outer bindings and go out
        // of scope on exit; assignments to outer variables persist.
        let declared: Vec<&str> = stmts
            .iter()
            .filter_map(|s| match s {
                Expr::Declare { param, .. } => Some(param.name.as_str()),
                _ => None,
            })
            .collect();
        let saved: Vec<(String, Option<Value>)> = declared
            .iter()
            .map(|name| (name.to_string(), self.env.get(*name).cloned()))
            .collect();
        let mut run = || -> Result<Value> {
            for stmt in stmts {
                self.eval(stmt)?;
            }
            match result {
                Some(result) => self.eval(result),
                None => Ok(Value::Null),
            }
        };
        let outcome = run();
        for (name, old) in saved {
            match old {
                Some(v) => self.env.insert(name, v),
                None => self.env.remove(&name),
            };
        }
        outcome
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinOp::AndAlso => {
                if !self.eval_bool(left)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_bool(right)?))
            }
            BinOp::OrElse => {
                if self.eval_bool(left)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_bool(right)?))
            }
            BinOp::Equal | BinOp::NotEqual => {
                // Reference-style equality: generated code uses it for null
                // tests and same-kind primitives.
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                let equal = l == r;
                Ok(Value::Bool(if op == BinOp::Equal { equal } else { !equal }))
            }
            BinOp::LessThan
            | BinOp::LessThanOrEqual
            | BinOp::GreaterThan
            | BinOp::GreaterThanOrEqual => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                let ord = compare::value_cmp(&l, &r)?;
                let result = match op {
                    BinOp::LessThan => ord.is_lt(),
                    BinOp::LessThanOrEqual => ord.is_le(),
                    BinOp::GreaterThan => ord.is_gt(),
                    _ => ord.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                self.eval_arithmetic(op, l, r)
            }
        }
    }

    fn eval_arithmetic(&mut self, op: BinOp, l: Value, r: Value) -> Result<Value> {
        // Datetime storage arithmetic: dates advance by days, times and
        // timestamps by milliseconds.
        match (op, &l, &r) {
            (BinOp::Add, Value::Date(d), Value::Int64(days)) => {
                let date = if *days >= 0 {
                    d.checked_add_days(Days::new(*days as u64))
                } else {
                    d.checked_sub_days(Days::new(days.unsigned_abs()))
                };
                return date.map(Value::Date).ok_or(Error::Overflow);
            }
            (BinOp::Add, Value::Time(t), Value::Int64(ms)) => {
                return Ok(Value::Time(
                    *t + chrono::Duration::milliseconds(*ms),
                ));
            }
            (BinOp::Add, Value::Timestamp(ts), Value::Int64(ms) | Value::Interval(ms)) => {
                return Ok(Value::Timestamp(
                    *ts + chrono::Duration::milliseconds(*ms),
                ));
            }
            (BinOp::Divide, Value::Interval(ms), Value::Int64(n)) => {
                if *n == 0 {
                    return Err(Error::DivisionByZero);
                }
                return Ok(Value::Int64(ms / n));
            }
            _ => {}
        }
        match op {
            BinOp::Add => scalar::plus(&l, &r),
            BinOp::Subtract => scalar::minus(&l, &r),
            BinOp::Multiply => scalar::multiply(&l, &r),
            BinOp::Divide => scalar::divide(&l, &r),
            _ => Err(Error::internal("not an arithmetic operator")),
        }
    }

    fn eval_call(
        &mut self,
        target: Option<&Expr>,
        method: &MethodRef,
        args: &[Expr],
    ) -> Result<Value> {
        // Frame access resolves against the active partition.
        if let MethodRef::Builtin(b @ (Builtin::CompareRows | Builtin::PartitionRow)) = method {
            let values: Vec<Value> = args
                .iter()
                .map(|a| self.eval(a))
                .collect::<Result<Vec<_>>>()?;
            let partition = self
                .partition
                .as_ref()
                .ok_or_else(|| Error::internal("no partition in scope"))?;
            let index = |v: &Value| {
                v.as_i64()
                    .ok_or_else(|| Error::type_mismatch("row index must be an integer"))
            };
            return match b {
                Builtin::PartitionRow => partition.row_value(index(&values[0])?),
                _ => partition.compare_rows(index(&values[0])?, index(&values[1])?),
            };
        }
        let target = match target {
            Some(t) => Some(self.eval(t)?),
            None => None,
        };
        let values: Vec<Value> = args
            .iter()
            .map(|a| self.eval(a))
            .collect::<Result<Vec<_>>>()?;
        match method {
            MethodRef::Builtin(b) => invoke(*b, target.as_ref(), &values, &self.root),
            MethodRef::Udf(udf) => {
                let mut call_args = Vec::with_capacity(values.len() + 1);
                if let Some(t) = target {
                    call_args.push(t);
                }
                call_args.extend(values);
                (udf.func)(&call_args)
            }
        }
    }
}

/// Converts a runtime value to the storage type of a cast node.
pub fn convert_value(v: Value, ty: Type) -> Result<Value> {
    match ty {
        Type::Primitive(p) => {
            if v.is_null() {
                return Err(Error::internal("null value in primitive cast"));
            }
            convert_primitive(v, p)
        }
        Type::Boxed(p) => {
            if v.is_null() {
                return Ok(Value::Null);
            }
            convert_primitive(v, p)
        }
        Type::Object(class) => {
            use skiffsql_ir::code::Class;
            if v.is_null() {
                return Ok(Value::Null);
            }
            match class {
                Class::Decimal => v
                    .as_numeric()
                    .map(Value::Numeric)
                    .ok_or_else(|| Error::type_mismatch("cannot convert to DECIMAL")),
                Class::Str => match v {
                    Value::String(_) => Ok(v),
                    other => Ok(Value::String(other.to_string())),
                },
                _ => Ok(v),
            }
        }
        Type::Void => Ok(v),
    }
}

fn convert_primitive(v: Value, p: Primitive) -> Result<Value> {
    match p {
        Primitive::Bool => v
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| Error::type_mismatch("cannot convert to BOOLEAN")),
        Primitive::I32 | Primitive::I64 => match v {
            Value::Int64(_) | Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => Ok(v),
            Value::Interval(ms) => Ok(Value::Int64(ms)),
            Value::Float64(f) => Ok(Value::Int64(f as i64)),
            Value::Numeric(d) => {
                use rust_decimal::prelude::ToPrimitive;
                d.trunc().to_i64().map(Value::Int64).ok_or(Error::Overflow)
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|_| Error::type_mismatch("cannot convert string to integer")),
            other => Err(Error::type_mismatch_with(
                "integer",
                format!("{}", other.kind()),
            )),
        },
        Primitive::F64 => match v {
            Value::Float64(_) => Ok(v),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|_| Error::type_mismatch("cannot convert string to double")),
            other => skiffsql_functions::scalar::to_f64_lossy(&other)
                .map(Value::Float64)
                .ok_or_else(|| {
                    Error::type_mismatch_with("double", format!("{}", other.kind()))
                }),
        },
    }
}
