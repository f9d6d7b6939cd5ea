//! Builtins that work on references rather than values: they read the call
//! site from the [`FunctionContext`] and inspect argument syntax through
//! [`ArgumentHandle::reference`].

use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use super::utils::{check_arity, coerce_num, scalar_arg};
use crate::function::{FnCaps, Function};
use crate::function_registry::FunctionTable;
use crate::reference::{MAX_COL, MAX_ROW, ReferenceType};
use crate::traits::{ArgumentHandle, FunctionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// `ROW([ref])` / `COLUMN([ref])`. Without an argument they report the calling
/// cell, which is `#VALUE!` outside a cell evaluation.
#[derive(Debug)]
pub struct PositionFn {
    axis: Axis,
}

impl Function for PositionFn {
    fn name(&self) -> &str {
        match self.axis {
            Axis::Row => "ROW",
            Axis::Column => "COLUMN",
        }
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 0, Some(1))?;
        let (row, col) = match args.first() {
            Some(arg) => arg
                .reference()
                .map(ReferenceType::origin)
                .ok_or_else(|| {
                    ExcelError::new_value()
                        .with_message(format!("{} expects a reference", self.name()))
                })?,
            None => ctx
                .current_cell()
                .map(|c| (c.row, c.col))
                .ok_or_else(|| {
                    ExcelError::new_value()
                        .with_message(format!("{} needs a calling cell", self.name()))
                })?,
        };
        let n = match self.axis {
            Axis::Row => row,
            Axis::Column => col,
        };
        Ok(LiteralValue::Number(f64::from(n)))
    }
}

/* ─────────────────────────── OFFSET() ─────────────────────────── */

/// `OFFSET(ref, rows, cols, [height], [width])`: the block `rows`/`cols` away
/// from `ref`, read through the context. Height and width default to the size
/// of `ref`. Leaving the grid, in either corner, is `#REF!`.
#[derive(Debug)]
pub struct OffsetFn;

/// Whole-number argument. Anything that cannot address the grid is `#REF!`.
fn int_arg(arg: &ArgumentHandle<'_>) -> Result<i64, ExcelError> {
    let n = coerce_num(&scalar_arg(arg))?.trunc();
    if !n.is_finite() || n.abs() > f64::from(MAX_ROW) {
        return Err(ExcelError::new_ref().with_message("OFFSET argument is out of range"));
    }
    Ok(n as i64)
}

fn shifted(start: u32, delta: i64, max: u32) -> Result<u32, ExcelError> {
    i64::from(start)
        .checked_add(delta)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| (1..=max).contains(v))
        .ok_or_else(|| ExcelError::new_ref().with_message("OFFSET moved off the sheet"))
}

impl Function for OffsetFn {
    fn caps(&self) -> FnCaps {
        FnCaps::VOLATILE
    }
    fn name(&self) -> &str {
        "OFFSET"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        check_arity(self.name(), args, 3, Some(5))?;
        let base = args[0]
            .reference()
            .ok_or_else(|| ExcelError::new_value().with_message("OFFSET expects a reference"))?;
        let drow = int_arg(&args[1])?;
        let dcol = int_arg(&args[2])?;
        let (base_rows, base_cols) = base.dimensions();
        let height = match args.get(3) {
            Some(a) => int_arg(a)?,
            None => i64::from(base_rows),
        };
        let width = match args.get(4) {
            Some(a) => int_arg(a)?,
            None => i64::from(base_cols),
        };
        if height < 1 || width < 1 {
            return Err(ExcelError::new_ref().with_message("OFFSET size must be positive"));
        }

        let (row, col) = base.origin();
        let start_row = shifted(row, drow, MAX_ROW)?;
        let start_col = shifted(col, dcol, MAX_COL)?;
        let end_row = shifted(start_row, height - 1, MAX_ROW)?;
        let end_col = shifted(start_col, width - 1, MAX_COL)?;

        let target = if height == 1 && width == 1 {
            ReferenceType::cell(base.sheet(), start_row, start_col)
        } else {
            ReferenceType::range(base.sheet(), (start_row, start_col), (end_row, end_col))
        };
        Ok(ctx.resolve_reference(&target))
    }
}

pub fn register_builtins(table: &mut FunctionTable) {
    table.register_function(Arc::new(PositionFn { axis: Axis::Row }));
    table.register_function(Arc::new(PositionFn { axis: Axis::Column }));
    table.register_function(Arc::new(OffsetFn));
}

#[cfg(test)]
mod tests {
    use crate::ast::ASTNode;
    use crate::reference::{CellRef, ReferenceType};
    use crate::test_workbook::TestWorkbook;
    use cellfn_common::{ExcelErrorKind, LiteralValue};

    fn wb() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell_a1("Sheet1", "B2", LiteralValue::Number(22.0))
            .with_cell_a1("Sheet1", "C3", LiteralValue::Number(33.0))
            .with_cell_a1("Sheet1", "C4", LiteralValue::Number(34.0))
            .with_cell_a1("Other", "A1", LiteralValue::Text("other".into()))
    }

    #[test]
    fn row_and_column_report_the_calling_cell() {
        let wb = wb();
        let cell = CellRef::new("Sheet1", 7, 3);
        let interp = wb.interpreter_for(&cell);
        assert_eq!(
            interp.evaluate(&ASTNode::function("ROW", vec![])),
            LiteralValue::Number(7.0)
        );
        assert_eq!(
            interp.evaluate(&ASTNode::function("COLUMN", vec![])),
            LiteralValue::Number(3.0)
        );
    }

    #[test]
    fn row_of_a_reference_argument() {
        let wb = wb();
        let node = ASTNode::function(
            "ROW",
            vec![ASTNode::reference(ReferenceType::range(None, (4, 2), (9, 2)))],
        );
        assert_eq!(wb.interpreter().evaluate(&node), LiteralValue::Number(4.0));
        let bad = ASTNode::function("COLUMN", vec![ASTNode::number(1.0)]);
        assert_eq!(
            wb.interpreter().evaluate(&bad).as_error().unwrap().kind,
            ExcelErrorKind::Value
        );
    }

    #[test]
    fn row_without_calling_cell_is_value_error() {
        let v = wb().interpreter().evaluate(&ASTNode::function("ROW", vec![]));
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
    }

    #[test]
    fn offset_reads_shifted_cells() {
        let wb = wb();
        let one = ASTNode::function(
            "OFFSET",
            vec![ASTNode::cell(1, 1), ASTNode::number(1.0), ASTNode::number(1.0)],
        );
        assert_eq!(wb.interpreter().evaluate(&one), LiteralValue::Number(22.0));

        let block = ASTNode::function(
            "OFFSET",
            vec![
                ASTNode::cell(1, 1),
                ASTNode::number(2.0),
                ASTNode::number(2.0),
                ASTNode::number(2.0),
                ASTNode::number(1.0),
            ],
        );
        assert_eq!(
            wb.interpreter().evaluate(&block),
            LiteralValue::Array(vec![
                vec![LiteralValue::Number(33.0)],
                vec![LiteralValue::Number(34.0)],
            ])
        );
    }

    #[test]
    fn offset_keeps_the_reference_sheet() {
        let wb = wb();
        let node = ASTNode::function(
            "OFFSET",
            vec![
                ASTNode::reference(ReferenceType::cell(Some("Other"), 2, 2)),
                ASTNode::number(-1.0),
                ASTNode::number(-1.0),
            ],
        );
        assert_eq!(
            wb.interpreter().evaluate(&node),
            LiteralValue::Text("other".into())
        );
    }

    #[test]
    fn offset_off_the_grid_is_ref_error() {
        let node = ASTNode::function(
            "OFFSET",
            vec![ASTNode::cell(1, 1), ASTNode::number(-1.0), ASTNode::number(0.0)],
        );
        let v = wb().interpreter().evaluate(&node);
        assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Ref);
    }

    #[test]
    fn offset_with_huge_or_non_finite_shift_is_ref_error() {
        for delta in [1e19, -1e19, f64::INFINITY, 2e6] {
            let node = ASTNode::function(
                "OFFSET",
                vec![ASTNode::cell(1, 2), ASTNode::number(delta), ASTNode::number(0.0)],
            );
            let v = wb().interpreter().evaluate(&node);
            assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Ref, "delta {delta}");
        }
    }

    #[test]
    fn offset_past_the_last_row_or_column_is_ref_error() {
        let past_rows = ASTNode::function(
            "OFFSET",
            vec![ASTNode::cell(1, 1), ASTNode::number(1_048_576.0), ASTNode::number(0.0)],
        );
        let too_wide = ASTNode::function(
            "OFFSET",
            vec![
                ASTNode::cell(1, 1),
                ASTNode::number(0.0),
                ASTNode::number(0.0),
                ASTNode::number(1e6),
                ASTNode::number(1e6),
            ],
        );
        for node in [past_rows, too_wide] {
            let v = wb().interpreter().evaluate(&node);
            assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Ref);
        }
    }

    #[test]
    fn bad_offset_does_not_disturb_other_cells_in_a_batch() {
        use crate::evaluator::Evaluator;

        let ev = Evaluator::builder(wb()).build();
        let cells = vec![
            (
                CellRef::new("Sheet1", 1, 1),
                ASTNode::function(
                    "OFFSET",
                    vec![ASTNode::cell(1, 2), ASTNode::number(1e19), ASTNode::number(0.0)],
                ),
            ),
            (CellRef::new("Sheet1", 2, 1), ASTNode::number(1.0)),
        ];
        let out = ev.evaluate_batch(&cells);
        assert_eq!(out[0].as_error().unwrap().kind, ExcelErrorKind::Ref);
        assert_eq!(out[1], LiteralValue::Number(1.0));
    }
}
