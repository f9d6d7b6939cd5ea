//! The parsed operation tree the interpreter walks.
//!
//! Parsing formula text is someone else's job; whatever parser feeds this crate
//! produces `ASTNode`s. The constructors below exist so hosts and tests can build
//! trees by hand.

use std::fmt::{self, Display};

use cellfn_common::LiteralValue;

use crate::reference::ReferenceType;

#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Literal(LiteralValue),
    Reference(ReferenceType),
    UnaryOp {
        op: String,
        expr: Box<ASTNode>,
    },
    BinaryOp {
        op: String,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    Function {
        name: String,
        args: Vec<ASTNode>, // Most functions have <= 4 args
    },
    Array(Vec<Vec<ASTNode>>),
}

impl Display for ASTNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNodeType::Literal(LiteralValue::Text(s)) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            ASTNodeType::Literal(value) => write!(f, "{value}"),
            ASTNodeType::Reference(reference) => write!(f, "{reference}"),
            ASTNodeType::UnaryOp { op, expr } if op == "%" => write!(f, "{expr}%"),
            ASTNodeType::UnaryOp { op, expr } => write!(f, "{op}{expr}"),
            ASTNodeType::BinaryOp { op, left, right } => write!(f, "({left}{op}{right})"),
            ASTNodeType::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
            ASTNodeType::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, cell) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{cell}")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

/// One node of a parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType) -> Self {
        Self { node_type }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::new(ASTNodeType::Literal(value.into()))
    }

    pub fn number(n: f64) -> Self {
        Self::literal(n)
    }

    pub fn text(s: &str) -> Self {
        Self::literal(s)
    }

    pub fn reference(reference: ReferenceType) -> Self {
        Self::new(ASTNodeType::Reference(reference))
    }

    /// Same-sheet cell reference, 1-based.
    pub fn cell(row: u32, col: u32) -> Self {
        Self::reference(ReferenceType::cell(None, row, col))
    }

    pub fn function(name: &str, args: Vec<ASTNode>) -> Self {
        Self::new(ASTNodeType::Function {
            name: name.to_string(),
            args,
        })
    }

    pub fn unary(op: &str, expr: ASTNode) -> Self {
        Self::new(ASTNodeType::UnaryOp {
            op: op.to_string(),
            expr: Box::new(expr),
        })
    }

    pub fn binary(op: &str, left: ASTNode, right: ASTNode) -> Self {
        Self::new(ASTNodeType::BinaryOp {
            op: op.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn array(rows: Vec<Vec<ASTNode>>) -> Self {
        Self::new(ASTNodeType::Array(rows))
    }

    /// Names of every function called anywhere in this tree, in pre-order.
    pub fn function_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_function_names(&mut out);
        out
    }

    fn collect_function_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.node_type {
            ASTNodeType::Literal(_) | ASTNodeType::Reference(_) => {}
            ASTNodeType::UnaryOp { expr, .. } => expr.collect_function_names(out),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.collect_function_names(out);
                right.collect_function_names(out);
            }
            ASTNodeType::Function { name, args } => {
                out.push(name);
                for a in args {
                    a.collect_function_names(out);
                }
            }
            ASTNodeType::Array(rows) => {
                for cell in rows.iter().flatten() {
                    cell.collect_function_names(out);
                }
            }
        }
    }
}

impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_type)
    }
}

impl From<LiteralValue> for ASTNode {
    fn from(value: LiteralValue) -> Self {
        ASTNode::literal(value)
    }
}
