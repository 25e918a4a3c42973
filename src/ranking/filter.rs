use std::collections::BTreeMap;

use super::error::RankError;
use crate::table::{RecordTable, Value};

/// Positions of the rows that pass every active filter.
///
/// Filters are conjunctive. A filter with an empty allowed set places no
/// restriction on its column.
pub fn matching_rows(
    table: &RecordTable,
    filters: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<usize>, RankError> {
    let mut active = Vec::new();
    let mut missing = Vec::new();
    for (column, allowed) in filters {
        if allowed.is_empty() {
            continue;
        }
        match table.column_index(column) {
            Some(idx) => active.push((idx, allowed)),
            None => missing.push(column.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(RankError::MissingColumns { columns: missing });
    }

    Ok((0..table.len())
        .filter(|&row| {
            active
                .iter()
                .all(|(idx, allowed)| is_allowed(table.cell(row, *idx), allowed))
        })
        .collect())
}

/// Restrict the table to the rows passing every filter, keeping their order.
/// Signals `EmptyResult` when nothing is left.
pub fn filter_rows(
    table: &RecordTable,
    filters: &BTreeMap<String, Vec<String>>,
) -> Result<RecordTable, RankError> {
    let positions = matching_rows(table, filters)?;
    if positions.is_empty() {
        return Err(RankError::EmptyResult);
    }
    Ok(table.select_rows(&positions))
}

/// Match by the cell's text, or by value for numeric codes ("01" matches 1)
fn is_allowed(cell: &Value, allowed: &[String]) -> bool {
    let text = cell.to_string();
    allowed
        .iter()
        .any(|a| *a == text || (!cell.is_missing() && Value::parse(a) == *cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squad() -> RecordTable {
        let rows = [
            ("Saka", "FW", "Arsenal"),
            ("Rice", "MF", "Arsenal"),
            ("Haaland", "FW", "Man City"),
            ("Rodri", "MF", "Man City"),
            ("Saliba", "DF", "Arsenal"),
        ];
        RecordTable::with_rows(
            vec!["Player".to_string(), "Pos".to_string(), "Squad".to_string()],
            rows.iter()
                .map(|(p, pos, s)| vec![Value::from(*p), Value::from(*pos), Value::from(*s)])
                .collect(),
        )
    }

    fn filters(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(c, vals)| (c.to_string(), vals.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn names(table: &RecordTable) -> Vec<String> {
        (0..table.len()).map(|r| table.cell(r, 0).to_string()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let table = squad();
        let filtered = filter_rows(&table, &BTreeMap::new()).unwrap();
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_single_filter() {
        let filtered = filter_rows(&squad(), &filters(&[("Pos", &["FW"])])).unwrap();
        assert_eq!(names(&filtered), vec!["Saka", "Haaland"]);
    }

    #[test]
    fn test_multiple_values_in_one_filter() {
        let filtered = filter_rows(&squad(), &filters(&[("Pos", &["DF", "FW"])])).unwrap();
        assert_eq!(names(&filtered), vec!["Saka", "Haaland", "Saliba"]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filtered = filter_rows(
            &squad(),
            &filters(&[("Pos", &["MF"]), ("Squad", &["Man City"])]),
        )
        .unwrap();
        assert_eq!(names(&filtered), vec!["Rodri"]);
    }

    #[test]
    fn test_sequential_filtering_equals_combined() {
        let table = squad();
        let by_pos = filter_rows(&table, &filters(&[("Pos", &["FW"])])).unwrap();
        let then_squad = filter_rows(&by_pos, &filters(&[("Squad", &["Arsenal"])])).unwrap();

        let squad_first = filter_rows(&table, &filters(&[("Squad", &["Arsenal"])])).unwrap();
        let then_pos = filter_rows(&squad_first, &filters(&[("Pos", &["FW"])])).unwrap();

        let combined = filter_rows(
            &table,
            &filters(&[("Pos", &["FW"]), ("Squad", &["Arsenal"])]),
        )
        .unwrap();

        assert_eq!(then_squad, combined);
        assert_eq!(then_pos, combined);
    }

    #[test]
    fn test_empty_selection_means_no_restriction() {
        let table = squad();
        let filtered = filter_rows(&table, &filters(&[("Pos", &[])])).unwrap();
        assert_eq!(filtered.len(), table.len());
    }

    #[test]
    fn test_unknown_value_is_empty_result() {
        let err = filter_rows(&squad(), &filters(&[("Pos", &["GK"])])).unwrap_err();
        assert_eq!(err, RankError::EmptyResult);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_table_is_empty_result() {
        let table = RecordTable::new(vec!["Player".to_string()]);
        assert_eq!(
            filter_rows(&table, &BTreeMap::new()).unwrap_err(),
            RankError::EmptyResult
        );
    }

    #[test]
    fn test_filter_on_missing_column() {
        let err = filter_rows(&squad(), &filters(&[("Comp", &["EPL"])])).unwrap_err();
        assert_eq!(
            err,
            RankError::MissingColumns {
                columns: vec!["Comp".to_string()]
            }
        );
    }

    #[test]
    fn test_numeric_category_matches_by_value() {
        let table = RecordTable::with_rows(
            vec!["Player".to_string(), "Season".to_string()],
            vec![
                vec![Value::from("A"), Value::parse("2024")],
                vec![Value::from("B"), Value::parse("2025")],
            ],
        );
        let filtered = filter_rows(&table, &filters(&[("Season", &["2025.0"])])).unwrap();
        assert_eq!(names(&filtered), vec!["B"]);
    }

    #[test]
    fn test_matching_rows_returns_positions() {
        let positions = matching_rows(&squad(), &filters(&[("Squad", &["Man City"])])).unwrap();
        assert_eq!(positions, vec![2, 3]);
    }
}
