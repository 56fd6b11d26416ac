use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use std::collections::HashMap;

/// A named sheet holding its populated cells and their natural extent.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Populated cells, in insertion order
    cells: Vec<Cell>,
    /// Index mapping from (row, col) to cell vector position
    indexes: HashMap<(usize, usize), usize>,
    /// Natural extent: bounds of the populated cells
    row_lower_bound: Option<usize>,
    row_upper_bound: Option<usize>,
    col_lower_bound: Option<usize>,
    col_upper_bound: Option<usize>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Builds a sheet from a grid of values anchored at `A1`; blank values are not stored.
    pub fn from_rows<R, V>(name: &str, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut sheet = Sheet::new(name);
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                sheet.push(Cell::new(row, col, value));
            }
        }
        sheet
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell, replacing any cell already stored at the same position.
    /// Blank cells are dropped: an absent cell and a blank cell read the same.
    pub fn push(&mut self, cell: Cell) {
        if cell.value.is_blank() {
            return;
        }
        self.update_bound(cell.row, cell.col);
        match self.indexes.get(&(cell.row, cell.col)) {
            Some(index) => self.cells[*index] = cell,
            None => {
                self.indexes.insert((cell.row, cell.col), self.cells.len());
                self.cells.push(cell);
            }
        }
    }

    /// Widens the natural extent to include `(row, col)`.
    fn update_bound(&mut self, row: usize, col: usize) {
        let widen = |bound: &mut Option<usize>, value: usize, pick: fn(usize, usize) -> usize| {
            *bound = Some(bound.map_or(value, |current| pick(current, value)));
        };
        widen(&mut self.row_lower_bound, row, usize::min);
        widen(&mut self.row_upper_bound, row, usize::max);
        widen(&mut self.col_lower_bound, col, usize::min);
        widen(&mut self.col_upper_bound, col, usize::max);
    }

    /// First populated row, `None` for an empty sheet.
    pub fn first_row(&self) -> Option<usize> {
        self.row_lower_bound
    }

    /// Last populated row, `None` for an empty sheet.
    pub fn last_row(&self) -> Option<usize> {
        self.row_upper_bound
    }

    /// First populated column, `None` for an empty sheet.
    pub fn first_col(&self) -> Option<usize> {
        self.col_lower_bound
    }

    /// Last populated column, `None` for an empty sheet.
    pub fn last_col(&self) -> Option<usize> {
        self.col_upper_bound
    }

    /// Gets the cell stored at the specified position.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }

    /// Gets the cell at the specified position, materializing a blank one when absent.
    pub fn cell_or_blank(&self, row: usize, col: usize) -> Cell {
        self.get(row, col)
            .cloned()
            .unwrap_or_else(|| Cell::new(row, col, CellValue::Blank))
    }

    /// Returns true if no cell is stored in `row` between the given columns (inclusive).
    pub fn row_is_empty(&self, row: usize, col_lower: usize, col_upper: usize) -> bool {
        (col_lower..=col_upper).all(|col| self.get(row, col).is_none())
    }

    /// Iterates the populated cells in insertion order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}
