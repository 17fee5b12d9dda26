//! tabula CLI: load a table, apply a saved query, print one page.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tabula_core::prelude::*;
use tabula_modifiers::SortDirection;
use tabula_query::{QueryState, QueryingController};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Sort, filter, and page tabular data the way a data grid does", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a query to a data file and print the visible page
    Show {
        /// JSON array of objects, or CSV with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Query state file (YAML, or JSON when the extension is .json)
        #[arg(short, long)]
        query: Option<PathBuf>,

        /// Sort override, `column` or `column:desc`
        #[arg(long)]
        sort: Option<String>,

        /// Page to show (enables pagination)
        #[arg(long)]
        page: Option<usize>,

        /// Rows per page (enables pagination)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Check a query state file and report what loading would drop
    Validate {
        #[arg(short, long)]
        query: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            data,
            query,
            sort,
            page,
            page_size,
        } => {
            let overrides = Overrides {
                sort,
                page,
                page_size,
            };
            match show(&data, query.as_deref(), &overrides) {
                Ok(out) => print!("{}", out),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Validate { query } => match validate_query(&query) {
            Ok(report) => print!("{}", report),
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                process::exit(1);
            }
        },
    }
}

#[derive(Debug, Default)]
struct Overrides {
    sort: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

fn show(
    data: &Path,
    query: Option<&Path>,
    overrides: &Overrides,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = GridConfig::from_env();
    config.validate()?;

    let table = load_table(data)?;
    let mut controller = QueryingController::new(&config);
    if let Some(path) = query {
        let state = load_query(path)?;
        let dropped = controller.load_state(&state);
        if dropped > 0 {
            tracing::warn!(dropped, "some filters in the query were dropped");
        }
    }
    apply_overrides(&mut controller, overrides, &table)?;

    controller.proceed(&table, false)?;

    let presentation = controller
        .presentation()
        .ok_or("query produced no presentation")?;
    Ok(render(presentation, &controller))
}

fn apply_overrides(
    controller: &mut QueryingController,
    overrides: &Overrides,
    table: &Table,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(sort) = &overrides.sort {
        let (column, direction) = parse_sort(sort)?;
        if !table.has_column(column) {
            return Err(Error::UnknownColumn(column.to_string()).into());
        }
        controller.sorting_mut().set_sorting(Some(direction), column);
    }
    if overrides.page.is_some() || overrides.page_size.is_some() {
        controller.pagination_mut().set_enabled(true);
    }
    if let Some(size) = overrides.page_size {
        controller.pagination_mut().set_page_size(size);
    }
    if let Some(page) = overrides.page {
        controller.pagination_mut().set_page(page);
    }
    Ok(())
}

fn parse_sort(arg: &str) -> Result<(&str, SortDirection), Box<dyn std::error::Error>> {
    match arg.rsplit_once(':') {
        Some((column, direction)) if !column.is_empty() => Ok((column, direction.parse()?)),
        Some(_) => Err(format!("missing column in sort `{}`", arg).into()),
        None => Ok((arg, SortDirection::Asc)),
    }
}

fn load_query(path: &Path) -> Result<QueryState, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let state = if has_extension(path, "json") {
        QueryState::from_json(&text)?
    } else {
        QueryState::from_yaml(&text)?
    };
    Ok(state)
}

fn validate_query(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let state = load_query(path)?;
    let invalid = state.invalid_filters();
    let ignored = state.ignored_sortings();

    let mut report = String::new();
    for column in &ignored {
        report.push_str(&format!("  ignored sort on `{}` (only one sorted column)\n", column));
    }
    for (column, reason) in &invalid {
        report.push_str(&format!("  dropped filter on `{}`: {}\n", column, reason));
    }
    if !invalid.is_empty() {
        return Err(format!("{} invalid filter(s)\n{}", invalid.len(), report).into());
    }
    report.push_str("✓ Query is valid\n");
    Ok(report)
}

fn load_table(path: &Path) -> Result<Table, Box<dyn std::error::Error>> {
    let table = if has_extension(path, "csv") {
        table_from_csv(fs::File::open(path)?)?
    } else {
        Table::from_json_rows(&fs::read_to_string(path)?)?
    };
    tracing::debug!(
        path = %path.display(),
        rows = table.get_row_count(),
        "loaded table"
    );
    Ok(table)
}

fn table_from_csv<R: Read>(input: R) -> Result<Table, csv::Error> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut values: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns: Vec<(String, Column)> = headers
        .into_iter()
        .zip(values)
        .map(|(id, raw)| (id, csv_column(raw)))
        .collect();
    Ok(Table::new().with_columns(columns))
}

/// A CSV column becomes a number buffer when every field is a complete
/// number; otherwise fields stay text and empty fields become `Null`.
fn csv_column(raw: Vec<String>) -> Column {
    let numeric = !raw.is_empty() && raw.iter().all(|v| v.trim().parse::<f64>().is_ok());
    if numeric {
        return Column::numbers(
            raw.iter()
                .map(|v| convert_to_number_or_nan(&CellValue::from(v.trim())))
                .collect(),
        );
    }
    Column::cells(
        raw.into_iter()
            .map(|v| if v.is_empty() { CellValue::Null } else { CellValue::Str(v) })
            .collect(),
    )
}

fn render(presentation: &Table, controller: &QueryingController) -> String {
    let column_ids: Vec<&str> = presentation.get_column_ids().collect();

    let mut out = String::new();
    out.push_str("row");
    for id in &column_ids {
        out.push('\t');
        out.push_str(id);
    }
    out.push('\n');

    for row in presentation.rows() {
        let original = row.original_index().unwrap_or(row.index());
        out.push_str(&original.to_string());
        for id in &column_ids {
            out.push('\t');
            let cell = row.get(id);
            if !cell.is_missing() {
                out.push_str(&cell.to_display_string());
            }
        }
        out.push('\n');
    }

    let pagination = controller.pagination();
    if pagination.is_enabled() {
        out.push_str(&format!(
            "page {} of {} ({} rows)\n",
            pagination.current_page(),
            pagination.total_pages(),
            pagination.total_items()
        ));
    } else {
        out.push_str(&format!("{} rows\n", presentation.get_row_count()));
    }
    out
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "id,name,price\n1,apple,3.5\n2,banana,\n3,cherry,12\n";

    #[test]
    fn csv_numeric_columns_become_number_buffers() {
        let table = table_from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(table.get_row_count(), 3);
        assert!(table.get_column("id").unwrap().is_numeric_buffer());
        assert!(!table.get_column("name").unwrap().is_numeric_buffer());
        // A blank field keeps the column textual.
        assert_eq!(table.get_cell("price", 1), Some(CellValue::Null));
        assert_eq!(table.get_cell("price", 0), Some(CellValue::from("3.5")));
    }

    #[test]
    fn sort_override_must_name_a_column() {
        let table = table_from_csv(CSV.as_bytes()).unwrap();
        let overrides = Overrides {
            sort: Some("weight".into()),
            ..Overrides::default()
        };
        let err = apply_overrides(&mut QueryingController::default(), &overrides, &table)
            .unwrap_err();
        assert!(err.to_string().contains("weight"));
    }

    #[test]
    fn sort_argument_parsing() {
        assert_eq!(parse_sort("price").unwrap(), ("price", SortDirection::Asc));
        assert_eq!(parse_sort("price:DESC").unwrap(), ("price", SortDirection::Desc));
        assert!(parse_sort("price:sideways").is_err());
        assert!(parse_sort(":desc").is_err());
    }

    #[test]
    fn renders_page_with_original_indexes() {
        let table = table_from_csv(CSV.as_bytes()).unwrap();
        let mut controller = QueryingController::default();
        apply_overrides(
            &mut controller,
            &Overrides {
                sort: Some("id:desc".into()),
                page: None,
                page_size: Some(2),
            },
            &table,
        )
        .unwrap();
        controller.proceed(&table, false).unwrap();

        let out = render(controller.presentation().unwrap(), &controller);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "row\tid\tname\tprice");
        assert_eq!(lines[1], "2\t3\tcherry\t12");
        assert_eq!(lines[2], "1\t2\tbanana\t");
        assert_eq!(lines[3], "page 1 of 2 (3 rows)");
    }

    #[test]
    fn page_override_applies_in_one_pass() {
        let table = table_from_csv(CSV.as_bytes()).unwrap();
        let mut controller = QueryingController::default();
        apply_overrides(
            &mut controller,
            &Overrides {
                sort: Some("id:desc".into()),
                page: Some(2),
                page_size: Some(2),
            },
            &table,
        )
        .unwrap();
        controller.proceed(&table, false).unwrap();

        let out = render(controller.presentation().unwrap(), &controller);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "0\t1\tapple\t3.5");
        assert_eq!(lines[2], "page 2 of 2 (3 rows)");
    }
}
