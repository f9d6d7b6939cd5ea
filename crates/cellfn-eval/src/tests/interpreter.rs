use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cellfn_common::{ExcelError, ExcelErrorKind, LiteralValue};

use super::common::{counting, evaluator_with};
use crate::ast::ASTNode;
use crate::evaluator::{EvalConfig, Evaluator};
use crate::function::{FnCaps, Function};
use crate::provider::UdfProvider;
use crate::reference::{CellRef, ReferenceType};
use crate::test_workbook::TestWorkbook;
use crate::traits::{ArgumentHandle, FunctionContext};

fn grid() -> TestWorkbook {
    TestWorkbook::new().with_range(
        "Sheet1",
        1,
        1,
        vec![
            vec![1.0.into(), 2.0.into(), 3.0.into()],
            vec![4.0.into(), 5.0.into(), 6.0.into()],
        ],
    )
}

#[test]
fn if_leaves_the_untaken_branch_alone() {
    let counter = Arc::new(AtomicUsize::new(0));
    let p = UdfProvider::builder()
        .function("TICK", counting(counter.clone()))
        .build()
        .unwrap();
    let ev = evaluator_with(vec![p]);
    let node = ASTNode::function(
        "IF",
        vec![
            ASTNode::literal(true),
            ASTNode::text("taken"),
            ASTNode::function("TICK", vec![]),
        ],
    );
    assert_eq!(ev.evaluate_formula(&node), LiteralValue::Text("taken".into()));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn eager_handlers_see_arguments_left_to_right() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = order.clone();
    let record = move |args: &[LiteralValue], _: &dyn FunctionContext| -> Result<LiteralValue, ExcelError> {
        let mut log = log.lock().map_err(|_| ExcelError::new_value())?;
        log.push(args[0].clone());
        Ok(args[0].clone())
    };
    let p = UdfProvider::builder().function("REC", record).build().unwrap();
    let ev = evaluator_with(vec![p]);
    let node = ASTNode::function(
        "CONCAT",
        vec![
            ASTNode::function("REC", vec![ASTNode::text("a")]),
            ASTNode::function("REC", vec![ASTNode::text("b")]),
            ASTNode::function("REC", vec![ASTNode::text("c")]),
        ],
    );
    assert_eq!(ev.evaluate_formula(&node), LiteralValue::Text("abc".into()));
    let seen: Vec<LiteralValue> = order.lock().unwrap().clone();
    assert_eq!(seen, vec!["a".into(), "b".into(), "c".into()]);
}

#[test]
fn ranges_evaluate_to_arrays() {
    let wb = grid();
    let range = ASTNode::reference(ReferenceType::range(None, (1, 2), (2, 3)));
    assert_eq!(
        wb.interpreter().evaluate(&range),
        LiteralValue::Array(vec![
            vec![2.0.into(), 3.0.into()],
            vec![5.0.into(), 6.0.into()],
        ])
    );
    let single = ASTNode::reference(ReferenceType::range(None, (2, 2), (2, 2)));
    assert_eq!(wb.interpreter().evaluate(&single), LiteralValue::Number(5.0));
}

#[test]
fn operators_broadcast_over_ranges() {
    let wb = grid();
    let row = ASTNode::reference(ReferenceType::range(None, (1, 1), (1, 3)));
    let col = ASTNode::reference(ReferenceType::range(None, (1, 1), (2, 1)));
    let v = wb.interpreter().evaluate(&ASTNode::binary("*", row, col));
    assert_eq!(
        v,
        LiteralValue::Array(vec![
            vec![1.0.into(), 2.0.into(), 3.0.into()],
            vec![4.0.into(), 8.0.into(), 12.0.into()],
        ])
    );
}

#[test]
fn incompatible_shapes_are_value_errors() {
    let wb = grid();
    let a = ASTNode::reference(ReferenceType::range(None, (1, 1), (2, 3)));
    let b = ASTNode::reference(ReferenceType::range(None, (1, 1), (2, 2)));
    let v = wb.interpreter().evaluate(&ASTNode::binary("+", a, b));
    assert_eq!(v.as_error().unwrap().kind, ExcelErrorKind::Value);
}

#[test]
fn errors_flow_through_nested_calls() {
    let wb = grid();
    let node = ASTNode::binary(
        "+",
        ASTNode::number(1.0),
        ASTNode::function(
            "ABS",
            vec![ASTNode::binary("/", ASTNode::cell(1, 1), ASTNode::cell(9, 9))],
        ),
    );
    assert_eq!(
        wb.interpreter().evaluate(&node).as_error().unwrap().kind,
        ExcelErrorKind::Div
    );
}

#[test]
fn type_mismatch_does_not_spill_into_siblings() {
    let ev = Evaluator::builder(grid()).build();
    let cells = vec![
        (
            CellRef::new("Sheet1", 5, 1),
            ASTNode::function("ABS", vec![ASTNode::text("not a number")]),
        ),
        (
            CellRef::new("Sheet1", 5, 2),
            ASTNode::function("SUM", vec![ASTNode::reference(ReferenceType::range(None, (1, 1), (2, 3)))]),
        ),
        (
            CellRef::new("Sheet1", 5, 3),
            ASTNode::function("LEN", vec![ASTNode::text("four")]),
        ),
    ];
    let out = ev.evaluate_batch(&cells);
    assert_eq!(out[0].as_error().unwrap().kind, ExcelErrorKind::Value);
    assert_eq!(out[1], LiteralValue::Number(21.0));
    assert_eq!(out[2], LiteralValue::Number(4.0));
}

#[test]
fn parallel_batch_matches_sequential() {
    let cells: Vec<(CellRef, ASTNode)> = (1..=50)
        .map(|i| {
            (
                CellRef::new("Sheet1", 10 + i, 1),
                ASTNode::binary("^", ASTNode::number(f64::from(i)), ASTNode::number(2.0)),
            )
        })
        .collect();
    let seq = Evaluator::builder(grid()).build().evaluate_batch(&cells);
    let par = Evaluator::builder(grid())
        .config(EvalConfig {
            parallel: true,
            ..Default::default()
        })
        .build()
        .evaluate_batch(&cells);
    assert_eq!(seq, par);
    assert_eq!(seq[49], LiteralValue::Number(2500.0));
}

/// Lazy function that evaluates its only argument twice through the context.
struct Twice;

impl Function for Twice {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }
    fn name(&self) -> &str {
        "TWICE"
    }
    fn eval(
        &self,
        args: &[ArgumentHandle<'_>],
        ctx: &dyn FunctionContext,
    ) -> Result<LiteralValue, ExcelError> {
        let node = args.first().ok_or_else(ExcelError::new_value)?.ast();
        let a = ctx.evaluate(node);
        let b = ctx.evaluate(node);
        Ok(LiteralValue::Array(vec![vec![a, b]]))
    }
}

#[test]
fn functions_can_reenter_the_interpreter() {
    let wb = grid().with_function(Arc::new(Twice));
    let node = ASTNode::function("TWICE", vec![ASTNode::function("SUM", vec![ASTNode::cell(2, 3)])]);
    assert_eq!(
        wb.interpreter().evaluate(&node),
        LiteralValue::Array(vec![vec![6.0.into(), 6.0.into()]])
    );
}

#[test]
fn context_reads_cells_on_other_sheets() {
    let p = UdfProvider::builder()
        .function(
            "PEEK",
            |_: &[LiteralValue], ctx: &dyn FunctionContext| -> Result<LiteralValue, ExcelError> {
                Ok(ctx.cell_value(Some("Data"), 1, 1))
            },
        )
        .build()
        .unwrap();
    let wb = grid().with_cell("Data", 1, 1, LiteralValue::Text("remote".into()));
    let ev = Evaluator::builder(wb).provider(p).build();
    assert_eq!(
        ev.evaluate_formula(&ASTNode::function("PEEK", vec![])),
        LiteralValue::Text("remote".into())
    );
}

#[test]
fn unary_percent_and_negation() {
    let wb = grid();
    let node = ASTNode::unary("-", ASTNode::unary("%", ASTNode::cell(2, 3)));
    assert_eq!(wb.interpreter().evaluate(&node), LiteralValue::Number(-0.06));
}
