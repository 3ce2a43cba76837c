//! In-memory execution of a `GridQuerySpec`: filter, sort, then page.

use dsrows_core::schema::DataSet;
use dsrows_core::types::Row;
use dsrows_operators::sort::sort_rows;
use dsrows_operators::GridQuerySpec;

use crate::error::{Result, StoreError};
use crate::traits::RowPage;

pub fn execute<'a, I>(data_set: &DataSet, rows: I, spec: &GridQuerySpec) -> Result<RowPage>
where
    I: IntoIterator<Item = &'a Row>,
{
    let clauses = spec.filter.resolve()?;
    if let Some(unknown) = clauses
        .iter()
        .find(|c| data_set.column_by_heading(&c.heading).is_none())
    {
        return Err(StoreError::UnknownColumn(unknown.heading.clone()));
    }

    let mut matched: Vec<Row> = rows
        .into_iter()
        .filter(|row| {
            clauses
                .iter()
                .all(|c| c.matches(&row.get_or_null(&c.heading), spec.collation))
        })
        .cloned()
        .collect();

    sort_rows(&mut matched, &spec.sort);

    let total = matched.len() as u64;
    let rows = matched
        .into_iter()
        .skip(spec.offset)
        .take(spec.limit.unwrap_or(usize::MAX))
        .collect();

    tracing::trace!(data_set = %data_set.data_set_id, total, filter = %spec.filter, "grid query executed");
    Ok(RowPage { rows, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsrows_core::config::Collation;
    use dsrows_core::id::{DataSetId, RowId, UserId};
    use dsrows_core::schema::{ColumnSchema, ValueKind};
    use dsrows_core::types::FieldValue;
    use dsrows_operators::{FilterExpr, LikeClause, SortKey};

    fn data_set() -> DataSet {
        DataSet::new(DataSetId::new(1), "Cities", UserId::new(1)).with_columns(vec![
            ColumnSchema::value(1, "city", ValueKind::String),
            ColumnSchema::value(2, "pop", ValueKind::Number),
        ])
    }

    fn rows() -> Vec<Row> {
        [("Paris", 2.1), ("Lyon", 0.5), ("Parma", 0.2), ("Nice", 0.3)]
            .iter()
            .enumerate()
            .map(|(i, (city, pop))| {
                let mut r = Row::with_id(RowId::new(i as u64 + 1));
                r.set("city", FieldValue::Str(city.to_string()));
                r.set("pop", FieldValue::Number(*pop));
                r
            })
            .collect()
    }

    #[test]
    fn filters_sorts_and_pages() {
        let spec = GridQuerySpec {
            filter: FilterExpr::Clauses(vec![LikeClause::contains("city", "par")]),
            sort: vec![SortKey::asc("pop")],
            offset: 0,
            limit: Some(1),
            collation: Collation::CaseInsensitive,
        };
        let rows = rows();
        let page = execute(&data_set(), &rows, &spec).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].get("city"), Some(&FieldValue::Str("Parma".into())));
    }

    #[test]
    fn case_sensitive_collation_excludes_mismatched_case() {
        let spec = GridQuerySpec {
            filter: FilterExpr::Clauses(vec![LikeClause::contains("city", "par")]),
            collation: Collation::CaseSensitive,
            ..Default::default()
        };
        let rows = rows();
        let page = execute(&data_set(), &rows, &spec).unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn offset_past_end_is_empty_but_counts() {
        let spec = GridQuerySpec {
            offset: 10,
            ..Default::default()
        };
        let rows = rows();
        let page = execute(&data_set(), &rows, &spec).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn raw_filter_errors_surface() {
        let rows = rows();
        let bad_syntax = GridQuerySpec {
            filter: FilterExpr::Raw("city = 'Paris'".into()),
            ..Default::default()
        };
        assert!(matches!(
            execute(&data_set(), &rows, &bad_syntax),
            Err(StoreError::Filter(_))
        ));

        let bad_column = GridQuerySpec {
            filter: FilterExpr::Raw("country LIKE '%fr%'".into()),
            ..Default::default()
        };
        assert!(matches!(
            execute(&data_set(), &rows, &bad_column),
            Err(StoreError::UnknownColumn(_))
        ));
    }
}
