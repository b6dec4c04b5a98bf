//! Multi-column layout for lists of names.
//!
//! Names are laid out top to bottom, then left to right, the same way `ls` prints a directory.
//! Every column has the width of the longest name plus two spaces of padding.
use console::measure_text_width;

/// Padding between two columns.
const COLUMN_PADDING: usize = 2;

/// Format names into columns that fit in `line_width` characters.
///
/// The names are used in the order they are given, callers sort them first.
/// A name that does not fit on a line by itself is printed on its own line.
/// Every row ends with a newline, trailing spaces are removed.
pub fn list_in_columns<S: AsRef<str>>(names: &[S], line_width: usize) -> String {
    let Some(max_width) = names
        .iter()
        .map(|name| measure_text_width(name.as_ref()))
        .max()
    else {
        return String::new();
    };

    if max_width >= line_width {
        return names
            .iter()
            .map(|name| format!("{}\n", name.as_ref()))
            .collect();
    }

    // Every cell gets padded, the padding of the last cell on a line may run past the line width.
    let cell_width = max_width + COLUMN_PADDING;
    let column_count = ((line_width + COLUMN_PADDING) / cell_width).max(1);
    let row_count = names.len().div_ceil(column_count);

    let mut rows = vec![String::new(); row_count];
    for (index, name) in names.iter().enumerate() {
        let name = name.as_ref();
        let row = &mut rows[index % row_count];
        row.push_str(name);
        row.push_str(&" ".repeat(cell_width - measure_text_width(name)));
    }

    rows.iter()
        .map(|row| format!("{}\n", row.trim_end()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let names: [&str; 0] = [];
        assert_eq!(list_in_columns(&names, 80), "");
    }

    #[test]
    fn test_single_name() {
        assert_eq!(list_in_columns(&["web1"], 80), "web1\n");
    }

    #[test]
    fn test_names_fill_columns_top_to_bottom() {
        let names = ["web1", "web2", "web3", "web4", "web5"];

        // Cells are 6 wide, so 3 columns fit in 20 characters and 2 rows are needed.
        assert_eq!(list_in_columns(&names, 20), "web1  web3  web5\nweb2  web4\n");
    }

    #[test]
    fn test_all_names_on_one_line_when_wide_enough() {
        let names = ["db1", "db2", "db3"];
        assert_eq!(list_in_columns(&names, 80), "db1  db2  db3\n");
    }

    #[test]
    fn test_shorter_names_are_padded_to_the_longest() {
        let names = ["a", "validator", "b", "c"];

        // Cells are 11 wide, 2 columns fit in 24 characters.
        assert_eq!(list_in_columns(&names, 24), "a          b\nvalidator  c\n");
    }

    #[test]
    fn test_name_wider_than_the_line() {
        let names = ["short", "a-very-long-client-name"];
        assert_eq!(list_in_columns(&names, 10), "short\na-very-long-client-name\n");
    }

    #[test]
    fn test_narrow_line_uses_a_single_column() {
        let names = ["node-a", "node-b"];
        assert_eq!(list_in_columns(&names, 7), "node-a\nnode-b\n");
    }
}
