use tabula_core::{Column, Table};

/// Write the rows of `table` at `rows` (in that order) into its presentation.
///
/// Each output row keeps the ultimate source index, so chained transforms
/// still map back to the table the chain started from.
pub(crate) fn present_rows(table: &mut Table, rows: &[usize]) {
    let columns: Vec<(String, Column)> = table
        .get_columns()
        .map(|(id, column)| (id.to_string(), column.gather(rows)))
        .collect();
    let original_row_indexes: Vec<usize> = rows
        .iter()
        .map(|&r| table.get_original_row_index(r).unwrap_or(r))
        .collect();
    table.write_presentation(columns, original_row_indexes);
}
