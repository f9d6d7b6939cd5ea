//! Lightweight in-memory workbook for unit, property and integration tests.
//!
//! Resolves references against plain hash maps and serves functions registered
//! on it ahead of the builtins.
use std::collections::HashMap;
use std::sync::Arc;

use cellfn_common::{ExcelError, LiteralValue};

use crate::function::Function;
use crate::function_registry;
use crate::interpreter::Interpreter;
use crate::reference::{CellRef, letters_to_col};
use crate::traits::{FunctionProvider, ReferenceResolver};

type V = LiteralValue;
type CellKey = (u32, u32); // 1-based (row, col)

#[derive(Default, Clone)]
struct Sheet {
    cells: HashMap<CellKey, V>,
}

#[derive(Default, Clone)]
pub struct TestWorkbook {
    sheets: HashMap<String, Sheet>,
    fns: HashMap<String, Arc<dyn Function>>,
}

impl TestWorkbook {
    /// An empty workbook with a single empty `Sheet1`.
    pub fn new() -> Self {
        Self::default().with_sheet("Sheet1")
    }

    /* ─────────────── cell helpers ─────────────── */
    pub fn with_cell<S: Into<String>>(mut self, sheet: S, row: u32, col: u32, v: V) -> Self {
        let sh = self.sheets.entry(sheet.into()).or_default();
        sh.cells.insert((row, col), v);
        self
    }

    /// Panics on a malformed address; this is a fixture builder.
    pub fn with_cell_a1<S: Into<String>, A: AsRef<str>>(self, sheet: S, a1: A, v: V) -> Self {
        let (col, row) = parse_a1(a1.as_ref()).expect("bad A1 ref in with_cell_a1");
        self.with_cell(sheet, row, col, v)
    }

    /// Write a row-major block with its top-left corner at `(row, col)`.
    pub fn with_range<S: Into<String>>(
        mut self,
        sheet: S,
        row: u32,
        col: u32,
        data: Vec<Vec<V>>,
    ) -> Self {
        let sh = self.sheets.entry(sheet.into()).or_default();
        for (r_off, r) in data.into_iter().enumerate() {
            for (c_off, v) in r.into_iter().enumerate() {
                sh.cells.insert((row + r_off as u32, col + c_off as u32), v);
            }
        }
        self
    }

    /// Make sure `sheet` exists even without cells.
    pub fn with_sheet<S: Into<String>>(mut self, sheet: S) -> Self {
        self.sheets.entry(sheet.into()).or_default();
        self
    }

    /* ─────────────── functions ─────────────── */

    /// Register `f` under its own name. Shadows a builtin of the same name.
    pub fn with_function(mut self, f: Arc<dyn Function>) -> Self {
        self.fns.insert(f.name().to_ascii_uppercase(), f);
        self
    }

    /* ─────────────── interpreters ─────────────── */
    pub fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(self, "Sheet1")
    }

    pub fn interpreter_for<'a>(&'a self, cell: &'a CellRef) -> Interpreter<'a> {
        Interpreter::new_with_cell(self, cell)
    }
}

/// `"B12"` → `(col, row)`, both 1-based. `$` markers are ignored.
fn parse_a1(s: &str) -> Option<(u32, u32)> {
    let s: String = s.chars().filter(|c| *c != '$').collect();
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    let col = letters_to_col(letters)?;
    let row: u32 = digits.parse().ok()?;
    (row >= 1).then_some((col, row))
}

impl ReferenceResolver for TestWorkbook {
    fn resolve_cell_reference(
        &self,
        sheet: Option<&str>,
        row: u32,
        col: u32,
    ) -> Result<LiteralValue, ExcelError> {
        let name = sheet.unwrap_or("Sheet1");
        let sh = self.sheets.get(name).ok_or_else(|| {
            ExcelError::new_ref().with_message(format!("Sheet '{name}' not found"))
        })?;
        Ok(sh.cells.get(&(row, col)).cloned().unwrap_or(LiteralValue::Empty))
    }
}

impl FunctionProvider for TestWorkbook {
    fn get_function(&self, ns: &str, name: &str) -> Option<Arc<dyn Function>> {
        if ns.is_empty()
            && let Some(f) = self.fns.get(&name.trim().to_ascii_uppercase())
        {
            return Some(f.clone());
        }
        function_registry::get(ns, name)
    }
}
