use proptest::prelude::*;

use cellfn_common::LiteralValue;

use super::common::{evaluator_with, provider_with};
use crate::ast::ASTNode;
use crate::reference::CellRef;

fn leaf() -> impl Strategy<Value = ASTNode> {
    prop_oneof![
        (-1.0e6..1.0e6f64).prop_map(ASTNode::number),
        "[a-z]{0,4}".prop_map(|s| ASTNode::text(&s)),
        any::<bool>().prop_map(ASTNode::literal),
        (1u32..4, 1u32..4).prop_map(|(r, c)| ASTNode::cell(r, c)),
        Just(ASTNode::function("myFunc", vec![ASTNode::text("_")])),
        Just(ASTNode::function("noSuchFunc", vec![])),
    ]
}

fn tree() -> impl Strategy<Value = ASTNode> {
    leaf().prop_recursive(4, 32, 3, |inner| {
        let ops = prop_oneof![
            Just("+"),
            Just("-"),
            Just("*"),
            Just("/"),
            Just("^"),
            Just("&"),
            Just("="),
            Just("<"),
        ];
        let fns = prop_oneof![
            Just("SUM"),
            Just("CONCAT"),
            Just("IF"),
            Just("IFERROR"),
            Just("AND"),
            Just("ISERROR"),
            Just("myFunc"),
        ];
        prop_oneof![
            (ops, inner.clone(), inner.clone()).prop_map(|(op, l, r)| ASTNode::binary(op, l, r)),
            inner.clone().prop_map(|e| ASTNode::unary("-", e)),
            (fns, prop::collection::vec(inner, 0..3))
                .prop_map(|(name, args)| ASTNode::function(name, args)),
        ]
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(node in tree(), row in 1u32..20, col in 1u32..20) {
        let ev = evaluator_with(vec![provider_with("myFunc", "abc")]);
        let cell = CellRef::new("Sheet1", row, col);
        let first = ev.evaluate_cell(&cell, &node);
        let second = ev.evaluate_cell(&cell, &node);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn provider_order_decides_collisions(
        name in "[A-Za-z][A-Za-z0-9]{0,8}",
        arg in "[a-z]{0,6}",
    ) {
        let call = ASTNode::function(&name, vec![ASTNode::text(&arg)]);

        let forward = evaluator_with(vec![provider_with(&name, "1"), provider_with(&name, "2")]);
        prop_assert_eq!(
            forward.evaluate_formula(&call),
            LiteralValue::Text(format!("{arg}1"))
        );

        let reverse = evaluator_with(vec![provider_with(&name, "2"), provider_with(&name, "1")]);
        prop_assert_eq!(
            reverse.evaluate_formula(&call),
            LiteralValue::Text(format!("{arg}2"))
        );
    }
}
