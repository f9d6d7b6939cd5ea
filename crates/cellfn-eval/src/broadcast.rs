//! Shape rules for element-wise operations over arrays.
//!
//! Each axis must either match or be 1; a 1 stretches to the other side's length.

use cellfn_common::{ExcelError, LiteralValue};

pub type Shape2D = (usize, usize);

/// Common target shape of all inputs, or `#VALUE!` when two axes disagree.
pub fn broadcast_shape(shapes: &[Shape2D]) -> Result<Shape2D, ExcelError> {
    fn axis(a: usize, b: usize) -> Option<usize> {
        match (a, b) {
            _ if a == b => Some(a),
            (1, n) | (n, 1) => Some(n),
            _ => None,
        }
    }
    shapes.iter().try_fold((1, 1), |(r, c), &(sr, sc)| {
        match (axis(r, sr), axis(c, sc)) {
            (Some(r), Some(c)) => Ok((r, c)),
            _ => Err(ExcelError::new_value()
                .with_message(format!("Incompatible array shapes {r}x{c} and {sr}x{sc}"))),
        }
    })
}

/// Map an index in the target shape back onto a (possibly stretched) source.
#[inline]
pub fn project_index(idx: Shape2D, shape: Shape2D) -> Shape2D {
    let r = if shape.0 == 1 { 0 } else { idx.0 };
    let c = if shape.1 == 1 { 0 } else { idx.1 };
    (r, c)
}

fn shape_of(v: &LiteralValue) -> Shape2D {
    v.dimensions()
}

fn element(v: &LiteralValue, idx: Shape2D) -> LiteralValue {
    match v {
        LiteralValue::Array(rows) => {
            let (r, c) = project_index(idx, shape_of(v));
            rows.get(r)
                .and_then(|row| row.get(c))
                .cloned()
                .unwrap_or(LiteralValue::Empty)
        }
        scalar => scalar.clone(),
    }
}

/// Apply `f` element-wise to one value. Scalars map directly.
pub fn map_value<F>(value: LiteralValue, f: F) -> LiteralValue
where
    F: Fn(LiteralValue) -> Result<LiteralValue, ExcelError>,
{
    match value {
        LiteralValue::Array(rows) => LiteralValue::Array(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| f(cell).unwrap_or_else(LiteralValue::Error))
                        .collect()
                })
                .collect(),
        ),
        scalar => f(scalar).unwrap_or_else(LiteralValue::Error),
    }
}

/// Apply `f` pairwise, broadcasting scalars and single rows/columns. Two scalars
/// produce a scalar; any array operand produces an array of the target shape.
pub fn zip_values<F>(left: LiteralValue, right: LiteralValue, f: F) -> LiteralValue
where
    F: Fn(LiteralValue, LiteralValue) -> Result<LiteralValue, ExcelError>,
{
    let is_array = |v: &LiteralValue| matches!(v, LiteralValue::Array(_));
    if !is_array(&left) && !is_array(&right) {
        return f(left, right).unwrap_or_else(LiteralValue::Error);
    }
    let target = match broadcast_shape(&[shape_of(&left), shape_of(&right)]) {
        Ok(s) => s,
        Err(e) => return LiteralValue::Error(e),
    };
    let mut out = Vec::with_capacity(target.0);
    for i in 0..target.0 {
        let mut row = Vec::with_capacity(target.1);
        for j in 0..target.1 {
            let l = element(&left, (i, j));
            let r = element(&right, (i, j));
            row.push(f(l, r).unwrap_or_else(LiteralValue::Error));
        }
        out.push(row);
    }
    LiteralValue::Array(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellfn_common::ExcelErrorKind;

    #[test]
    fn shapes_stretch_along_unit_axes() {
        assert_eq!(broadcast_shape(&[(1, 3), (2, 1)]).unwrap(), (2, 3));
        assert_eq!(broadcast_shape(&[(2, 2), (1, 1)]).unwrap(), (2, 2));
        assert_eq!(broadcast_shape(&[]).unwrap(), (1, 1));
        assert_eq!(
            broadcast_shape(&[(2, 2), (3, 2)]).unwrap_err().kind,
            ExcelErrorKind::Value
        );
    }

    #[test]
    fn zip_broadcasts_a_row_over_a_column() {
        let row = LiteralValue::Array(vec![vec![1.0.into(), 2.0.into()]]);
        let col = LiteralValue::Array(vec![vec![10.0.into()], vec![20.0.into()]]);
        let out = zip_values(row, col, |a, b| {
            Ok(LiteralValue::Number(a.as_number().unwrap() + b.as_number().unwrap()))
        });
        assert_eq!(
            out,
            LiteralValue::Array(vec![
                vec![11.0.into(), 12.0.into()],
                vec![21.0.into(), 22.0.into()],
            ])
        );
    }

    #[test]
    fn per_element_errors_stay_in_place() {
        let arr = LiteralValue::Array(vec![vec![1.0.into(), 0.0.into()]]);
        let out = map_value(arr, |v| match v {
            LiteralValue::Number(n) if n == 0.0 => Err(ExcelError::new_div()),
            other => Ok(other),
        });
        let rows = out.as_array().unwrap();
        assert_eq!(rows[0][0], LiteralValue::Number(1.0));
        assert!(rows[0][1].is_error());
    }
}
