//! Table formatting utilities

use prettytable::{Cell, Row, Table};
use std::fmt::Display;

/// Create a table with bold headers and no separators between rows
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        headers
            .iter()
            .map(|h| Cell::new(h).style_spec("b"))
            .collect(),
    ));
    table
}

/// Row builder taking cells of any displayable type
#[derive(Default)]
pub struct TableRow(Vec<Cell>);

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, value: impl Display) -> Self {
        self.0.push(Cell::new(&value.to_string()));
        self
    }

    /// Right-aligned cell for counts and indices
    pub fn number(mut self, value: impl Display) -> Self {
        self.0.push(Cell::new(&value.to_string()).style_spec("r"));
        self
    }

    /// Parent index cell, `-` for the root
    pub fn parent(self, parent: i32) -> Self {
        if parent < 0 {
            self.number("-")
        } else {
            self.number(parent)
        }
    }

    pub fn add_to(self, table: &mut Table) {
        table.add_row(Row::new(self.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_cell_order() {
        let mut table = create_table(&["Index", "Name", "Parent"]);
        TableRow::new().number(0).cell("hips").parent(-1).add_to(&mut table);
        TableRow::new().number(1).cell("chest").parent(0).add_to(&mut table);

        assert_eq!(table.len(), 2);
        let cell = |row: usize, column: usize| {
            table
                .get_row(row)
                .and_then(|r| r.get_cell(column))
                .map(|c| c.get_content())
        };
        assert_eq!(cell(0, 1).as_deref(), Some("hips"));
        assert_eq!(cell(0, 2).as_deref(), Some("-"));
        assert_eq!(cell(1, 2).as_deref(), Some("0"));
    }
}
