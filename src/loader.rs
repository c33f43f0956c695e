use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cell::CellValue;
use crate::column::ColumnDescriptor;
use crate::domain::DTError;

/// One row of a loaded file, one entry per file column.
pub type FileRow = Vec<Option<CellValue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// A file read into memory as rows of cells.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub name: String,
    pub column_names: Vec<String>,
    pub rows: Vec<FileRow>,
}

impl LoadedTable {
    /// One sortable column per file column, keyed and titled by its name.
    pub fn column_descriptors(&self) -> Vec<ColumnDescriptor<FileRow>> {
        self.column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                ColumnDescriptor::new(name.as_str(), name.as_str(), move |row: &FileRow| {
                    row.get(idx).cloned().flatten()
                })
                .sortable(true)
            })
            .collect()
    }

    pub fn shared_rows(&self) -> Arc<Vec<FileRow>> {
        Arc::new(self.rows.clone())
    }
}

pub fn load_data_file(path: &Path) -> Result<LoadedTable, DTError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?} ({} bytes) as {:?}", file_info.path, file_info.file_size, file_info.file_type);
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };

    // Each column is converted in its own rayon task, then the columns are
    // transposed into rows.
    let start_time = Instant::now();
    let df = Arc::new(frame.collect()?);
    let column_names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    let c_: Result<Vec<Vec<Option<CellValue>>>, PolarsError> =
        column_names.par_iter().map(|name| load_column(&df, name)).collect();
    let columns = c_?;

    let rows: Vec<FileRow> = (0..df.height())
        .into_par_iter()
        .map(|ridx| columns.iter().map(|c| c[ridx].clone()).collect())
        .collect();

    let loading_duration = start_time.elapsed().as_millis();
    info!(
        "Loaded {} rows x {} columns in {loading_duration}ms",
        rows.len(),
        column_names.len()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(LoadedTable {
        name,
        column_names,
        rows,
    })
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
    )
}

// An f32 widened to f64 would print its binary expansion, so go through its
// own shortest text form instead.
fn widen_f32(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(f64::from(v))
}

// u64 values stay integers while they all fit into i64. A column holding a
// larger value is read as text so no digit is lost.
fn load_u64_column(col: &UInt64Chunked) -> Vec<Option<CellValue>> {
    let fits = col.max().is_none_or(|max| i64::try_from(max).is_ok());
    if fits {
        col.into_iter()
            .map(|v| v.and_then(|v| i64::try_from(v).ok()).map(CellValue::Int))
            .collect()
    } else {
        col.into_iter().map(|v| v.map(|v| CellValue::Text(v.to_string()))).collect()
    }
}

// Keep the native type where a cell has one so numbers sort numerically;
// everything else is read as text.
fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Option<CellValue>>, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    let values = if is_integer_type(&dtype) {
        let col = column.cast(&DataType::Int64)?;
        col.i64()?.into_iter().map(|v| v.map(CellValue::Int)).collect()
    } else if dtype == DataType::UInt64 {
        load_u64_column(column.u64()?)
    } else if dtype == DataType::Float32 {
        column.f32()?.into_iter().map(|v| v.map(|v| CellValue::Float(widen_f32(v)))).collect()
    } else if dtype == DataType::Float64 {
        column.f64()?.into_iter().map(|v| v.map(CellValue::Float)).collect()
    } else if dtype == DataType::Boolean {
        column.bool()?.into_iter().map(|v| v.map(CellValue::Bool)).collect()
    } else {
        let col = column.cast(&DataType::String)?;
        col.str()?
            .into_iter()
            .map(|v| v.map(|s| CellValue::Text(s.to_string())))
            .collect()
    };
    debug!("Column {col_name:?}: {dtype:?}");
    Ok(values)
}

fn detect_file_type(path: &Path) -> Result<FileType, DTError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(DTError::UnknownFileType),
    }
}

fn get_file_info(path: &Path) -> Result<FileInfo, DTError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DTError::FileNotFound,
        ErrorKind::PermissionDenied => DTError::PermissionDenied,
        _ => DTError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DTError::LoadingFailed("Not a file!".into()));
    }

    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
        file_type: detect_file_type(path)?,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into())).with_has_header(true).finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}
