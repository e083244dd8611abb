#![expect(clippy::unwrap_used, clippy::indexing_slicing)]
use super::*;
use anyhow::Result;

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

#[test]
fn test_remove_duplicates_keeps_first_occurrence() -> Result<()> {
    let df = df!(
        "id" => &[1, 2, 1, 3, 2],
        "name" => &["a", "b", "a", "c", "b"]
    )?;

    let deduped = remove_duplicates(&df)?;
    assert_eq!(deduped.height(), 3);
    assert_eq!(f64_values(&deduped, "id")?, vec![Some(1.0), Some(2.0), Some(3.0)]);
    Ok(())
}

#[test]
fn test_remove_duplicates_treats_nulls_as_equal() -> Result<()> {
    let df = df!(
        "a" => &[Some(1), Some(1), Some(1)],
        "b" => &[None, None, Some(5)]
    )?;

    let deduped = remove_duplicates(&df)?;
    assert_eq!(deduped.height(), 2);
    assert_eq!(f64_values(&deduped, "b")?, vec![None, Some(5.0)]);
    Ok(())
}

#[test]
fn test_remove_duplicates_needs_every_column_equal() -> Result<()> {
    let df = df!(
        "a" => &[1, 1],
        "b" => &["x", "y"]
    )?;
    assert_eq!(remove_duplicates(&df)?.height(), 2);
    Ok(())
}

#[test]
fn test_remove_duplicates_is_idempotent() -> Result<()> {
    let df = df!(
        "a" => &[Some(1), Some(1), None, None, Some(2)],
        "b" => &["x", "x", "y", "y", "z"]
    )?;

    let once = remove_duplicates(&df)?;
    let twice = remove_duplicates(&once)?;
    assert!(once.equals_missing(&twice));
    assert_eq!(once.height(), 3);
    Ok(())
}

#[test]
fn test_remove_duplicates_leaves_input_untouched() -> Result<()> {
    let df = df!("a" => &[1, 1, 1])?;
    let deduped = remove_duplicates(&df)?;
    assert_eq!(deduped.height(), 1);
    assert_eq!(df.height(), 3);
    Ok(())
}

#[test]
fn test_impute_uses_mean_of_existing_values() -> Result<()> {
    let df = df!(
        "vals" => &[Some(10.0), Some(20.0), None, Some(30.0)]
    )?;

    let Imputation { table, report } = impute_numeric_means(&df)?;
    assert_eq!(
        f64_values(&table, "vals")?,
        vec![Some(10.0), Some(20.0), Some(20.0), Some(30.0)]
    );
    assert_eq!(report.filled.len(), 1);
    assert_eq!(report.filled[0].name, "vals");
    assert_eq!(report.filled[0].mean, 20.0);
    assert_eq!(report.filled[0].filled, 1);
    assert!(report.skipped.is_empty());
    Ok(())
}

#[test]
fn test_impute_mean_is_computed_once_per_column() -> Result<()> {
    let df = df!("n" => &[Some(1.0), None, Some(3.0), None])?;
    let imputed = impute_numeric_means(&df)?.table;
    assert_eq!(
        f64_values(&imputed, "n")?,
        vec![Some(1.0), Some(2.0), Some(3.0), Some(2.0)]
    );
    Ok(())
}

#[test]
fn test_impute_integer_column_widens_to_float() -> Result<()> {
    let df = df!("n" => &[Some(1_i64), None, Some(2)])?;
    let imputed = impute_numeric_means(&df)?.table;
    assert_eq!(imputed.column("n")?.dtype(), &DataType::Float64);
    assert_eq!(f64_values(&imputed, "n")?, vec![Some(1.0), Some(1.5), Some(2.0)]);
    Ok(())
}

#[test]
fn test_impute_skips_columns_without_values() -> Result<()> {
    let empty = Series::new("empty".into(), vec![None::<f64>, None, None]);
    let some = Series::new("some".into(), vec![Some(4.0), None, Some(8.0)]);
    let df = DataFrame::new(vec![Column::from(empty), Column::from(some)])?;

    let Imputation { table, report } = impute_numeric_means(&df)?;
    assert_eq!(report.skipped, vec!["empty".to_owned()]);
    assert_eq!(table.column("empty")?.null_count(), 3);
    assert_eq!(f64_values(&table, "some")?, vec![Some(4.0), Some(6.0), Some(8.0)]);
    Ok(())
}

#[test]
fn test_impute_leaves_non_numeric_nulls() -> Result<()> {
    let df = df!(
        "name" => &[Some("a"), None, Some("c")],
        "flag" => &[Some(true), None, Some(false)],
        "n" => &[Some(1.0), None, Some(3.0)]
    )?;

    let Imputation { table, report } = impute_numeric_means(&df)?;
    assert_eq!(table.column("name")?.null_count(), 1);
    assert_eq!(table.column("flag")?.null_count(), 1);
    assert_eq!(table.column("n")?.null_count(), 0);
    assert_eq!(report.cells_filled(), 1);
    Ok(())
}

#[test]
fn test_impute_without_numeric_columns_is_unchanged() -> Result<()> {
    let df = df!("name" => &[Some("a"), None])?;
    let Imputation { table, report } = impute_numeric_means(&df)?;
    assert!(table.equals_missing(&df));
    assert_eq!(report, ImputationReport::default());
    Ok(())
}

#[test]
fn test_impute_twice_is_a_noop() -> Result<()> {
    let df = df!(
        "a" => &[Some(1.0), None, Some(5.0)],
        "b" => &[None, Some(2_i64), Some(4)]
    )?;

    let first = impute_numeric_means(&df)?;
    let second = impute_numeric_means(&first.table)?;
    assert!(second.table.equals_missing(&first.table));
    assert!(second.report.filled.is_empty());
    Ok(())
}

#[test]
fn test_clean_dedups_before_imputing() -> Result<()> {
    // rows: (1, null), (1, null), (2, 5)
    let df = df!(
        "a" => &[1_i64, 1, 2],
        "b" => &[None, None, Some(5_i64)]
    )?;
    let request = CleaningRequest {
        remove_duplicates: true,
        impute_numeric_means: true,
    };

    let cleaned = clean(&df, &request)?;
    assert_eq!(cleaned.duplicates_removed, 1);
    assert_eq!(cleaned.table.height(), 2);
    assert_eq!(f64_values(&cleaned.table, "a")?, vec![Some(1.0), Some(2.0)]);
    assert_eq!(f64_values(&cleaned.table, "b")?, vec![Some(5.0), Some(5.0)]);
    assert_eq!(cleaned.imputation.unwrap().filled[0].mean, 5.0);
    Ok(())
}

#[test]
fn test_cleaning_order_changes_the_result() -> Result<()> {
    // (1, null) only equals (1, 5) once the null has been imputed.
    let df = df!(
        "a" => &[1_i64, 1, 2],
        "b" => &[None, Some(5_i64), Some(5)]
    )?;

    let dedup_first = clean(
        &df,
        &CleaningRequest {
            remove_duplicates: true,
            impute_numeric_means: true,
        },
    )?;
    assert_eq!(dedup_first.table.height(), 3);

    let imputed_first = impute_numeric_means(&df)?.table;
    let reversed = remove_duplicates(&imputed_first)?;
    assert_eq!(reversed.height(), 2);

    assert_ne!(dedup_first.table.height(), reversed.height());
    Ok(())
}

#[test]
fn test_clean_with_no_toggles_returns_input() -> Result<()> {
    let df = df!("a" => &[Some(1), Some(1), None])?;
    let request = CleaningRequest::default();
    assert!(request.is_noop());

    let cleaned = clean(&df, &request)?;
    assert!(cleaned.table.equals_missing(&df));
    assert_eq!(cleaned.duplicates_removed, 0);
    assert!(cleaned.imputation.is_none());
    Ok(())
}

#[test]
fn test_impute_with_pattern_like_column_names() -> Result<()> {
    let df = df!(
        "*" => &[Some(1_i64), None, Some(3)],
        "^n.*$" => &[Some(2.0), Some(4.0), None],
        "name" => &[None, Some("x"), Some("y")]
    )?;

    let Imputation { table, report } = impute_numeric_means(&df)?;
    assert_eq!(report.filled.len(), 2);
    assert_eq!(f64_values(&table, "*")?, vec![Some(1.0), Some(2.0), Some(3.0)]);
    assert_eq!(f64_values(&table, "^n.*$")?, vec![Some(2.0), Some(4.0), Some(3.0)]);

    let name = table.column("name")?.as_materialized_series();
    assert_eq!(name.dtype(), &DataType::String);
    assert_eq!(name.null_count(), 1);
    assert_eq!(name.str()?.get(0), None);
    Ok(())
}
