//! ESRI ASCII grid input/output.
//!
//! The workspace's raster boundary: a cost or result grid on disk is an
//! `.asc` file — a small textual header (`ncols`, `nrows`, `xllcorner`,
//! `yllcorner`, `cellsize`, optional `nodata_value`) followed by
//! whitespace-separated cell values, top row first. Reading yields the
//! cell values together with the georeferencing transform; writing takes
//! a field plus the transform of the grid it derives from.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use corridor_core::{GridTransform, Range, ScalarField};
use log::debug;
use thiserror::Error;

/// Errors reading or writing ASCII grids.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {msg}")]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("{path}: missing required header field {field}")]
    MissingHeader { path: PathBuf, field: &'static str },
    #[error("cells are {width} x {height}; ascii grids require square cells")]
    NonSquareCells { width: f64, height: f64 },
}

/// A grid read from disk: cell values, world transform, nodata marker.
#[derive(Clone, Debug)]
pub struct AscGrid {
    pub field: ScalarField,
    pub transform: GridTransform,
    pub nodata: Option<f64>,
}

impl AscGrid {
    /// The cell values with nodata cells replaced by positive infinity,
    /// suitable for use as an accumulated-cost surface.
    pub fn field_masking_nodata(&self) -> ScalarField {
        let Some(nodata) = self.nodata else {
            return self.field.clone();
        };
        let values = self
            .field
            .values()
            .iter()
            .map(|&v| if v == nodata { f64::INFINITY } else { v })
            .collect();
        ScalarField::from_values(self.field.bounds(), values)
    }
}

struct Header {
    ncols: Option<i32>,
    nrows: Option<i32>,
    xllcorner: Option<f64>,
    yllcorner: Option<f64>,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

/// Read an ASCII grid from `path`.
pub fn read_grid(path: &Path) -> Result<AscGrid, RasterError> {
    let io_err = |source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parse_err = |line: usize, msg: String| RasterError::Parse {
        path: path.to_path_buf(),
        line,
        msg,
    };

    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);

    let mut header = Header {
        ncols: None,
        nrows: None,
        xllcorner: None,
        yllcorner: None,
        cellsize: None,
        nodata: None,
    };
    let mut values: Vec<f64> = Vec::new();
    let mut in_header = true;

    for (lineno, line) in reader.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.map_err(io_err)?;
        let mut tokens = line.split_whitespace().peekable();
        let Some(&first) = tokens.peek() else {
            continue;
        };

        if in_header && first.chars().next().is_some_and(char::is_alphabetic) {
            let key = tokens.next().map(str::to_ascii_lowercase);
            let Some(raw) = tokens.next() else {
                return Err(parse_err(lineno, format!("header field {first} has no value")));
            };
            let value: f64 = raw
                .parse()
                .map_err(|_| parse_err(lineno, format!("invalid number {raw:?}")))?;
            match key.as_deref() {
                Some("ncols") => header.ncols = Some(value as i32),
                Some("nrows") => header.nrows = Some(value as i32),
                Some("xllcorner") => header.xllcorner = Some(value),
                Some("yllcorner") => header.yllcorner = Some(value),
                Some("cellsize") => header.cellsize = Some(value),
                Some("nodata_value") => header.nodata = Some(value),
                _ => {
                    return Err(parse_err(lineno, format!("unknown header field {first:?}")));
                }
            }
            continue;
        }
        in_header = false;

        for raw in line.split_whitespace() {
            let v: f64 = raw
                .parse()
                .map_err(|_| parse_err(lineno, format!("invalid cell value {raw:?}")))?;
            values.push(v);
        }
    }

    let missing = |field| RasterError::MissingHeader {
        path: path.to_path_buf(),
        field,
    };
    let ncols = header.ncols.ok_or_else(|| missing("ncols"))?;
    let nrows = header.nrows.ok_or_else(|| missing("nrows"))?;
    let xllcorner = header.xllcorner.ok_or_else(|| missing("xllcorner"))?;
    let yllcorner = header.yllcorner.ok_or_else(|| missing("yllcorner"))?;
    let cellsize = header.cellsize.ok_or_else(|| missing("cellsize"))?;

    if ncols <= 0 || nrows <= 0 {
        return Err(parse_err(0, format!("grid dimensions {ncols}x{nrows} are not positive")));
    }
    let expected = (ncols as usize) * (nrows as usize);
    if values.len() != expected {
        return Err(parse_err(
            0,
            format!("expected {expected} cell values, found {}", values.len()),
        ));
    }

    debug!(
        "read {}x{} grid from {} (cellsize {cellsize})",
        ncols,
        nrows,
        path.display(),
    );

    // The header anchors the lower-left corner; rows are stored north to
    // south, so the transform origin is the upper-left corner.
    let transform = GridTransform {
        origin_x: xllcorner,
        origin_y: yllcorner + nrows as f64 * cellsize,
        cell_width: cellsize,
        cell_height: -cellsize,
    };

    Ok(AscGrid {
        field: ScalarField::from_values(Range::new(0, 0, ncols, nrows), values),
        transform,
        nodata: header.nodata,
    })
}

/// Write `field` to `path` as an ASCII grid with the originating grid's
/// transform. Non-finite cells are written as the `nodata` marker.
pub fn write_grid(
    path: &Path,
    field: &ScalarField,
    transform: &GridTransform,
    nodata: f64,
) -> Result<(), RasterError> {
    if transform.cell_width != -transform.cell_height {
        return Err(RasterError::NonSquareCells {
            width: transform.cell_width,
            height: transform.cell_height,
        });
    }
    let io_err = |source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    };

    let cellsize = transform.cell_width;
    let nrows = field.height();
    let yllcorner = transform.origin_y - nrows as f64 * cellsize;

    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    let mut write = |s: String| w.write_all(s.as_bytes()).map_err(io_err);

    write(format!("ncols {}\n", field.width()))?;
    write(format!("nrows {nrows}\n"))?;
    write(format!("xllcorner {}\n", transform.origin_x))?;
    write(format!("yllcorner {yllcorner}\n"))?;
    write(format!("cellsize {cellsize}\n"))?;
    write(format!("nodata_value {nodata}\n"))?;

    let width = field.width() as usize;
    for (i, &v) in field.values().iter().enumerate() {
        let v = if v.is_finite() { v } else { nodata };
        let sep = if (i + 1) % width == 0 { '\n' } else { ' ' };
        write(format!("{v}{sep}"))?;
    }
    w.flush().map_err(io_err)?;

    debug!("wrote {}x{} grid to {}", field.width(), nrows, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_core::Point;
    use std::io::Write as _;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_header_and_cells() {
        let f = write_temp(
            "ncols 3\nnrows 2\nxllcorner 100.0\nyllcorner 200.0\ncellsize 30.0\nnodata_value -9999\n\
             1 2 3\n4 5 6\n",
        );
        let grid = read_grid(f.path()).unwrap();
        assert_eq!(grid.field.width(), 3);
        assert_eq!(grid.field.height(), 2);
        assert_eq!(grid.field.value(Point::new(2, 0)), 3.0);
        assert_eq!(grid.field.value(Point::new(0, 1)), 4.0);
        assert_eq!(grid.nodata, Some(-9999.0));
        // Transform origin is the upper-left corner.
        assert_eq!(grid.transform.origin_x, 100.0);
        assert_eq!(grid.transform.origin_y, 200.0 + 2.0 * 30.0);
        assert_eq!(grid.transform.world_to_cell(115.0, 245.0), Point::new(0, 0));
        assert_eq!(grid.transform.world_to_cell(175.0, 215.0), Point::new(2, 1));
    }

    #[test]
    fn round_trip_preserves_dimensions_and_values() {
        let field = ScalarField::from_values(
            Range::new(0, 0, 4, 3),
            vec![
                0.0, 1.5, 2.25, 3.0, //
                4.0, 5.125, 6.0, 7.75, //
                8.0, 9.0, 10.5, 11.0,
            ],
        );
        let transform = GridTransform {
            origin_x: 1000.0,
            origin_y: 2000.0,
            cell_width: 30.0,
            cell_height: -30.0,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.asc");
        write_grid(&path, &field, &transform, -9999.0).unwrap();
        let back = read_grid(&path).unwrap();
        assert_eq!(back.field.bounds(), field.bounds());
        assert_eq!(back.field.values(), field.values());
        assert_eq!(back.transform, transform);
        assert_eq!(back.nodata, Some(-9999.0));
    }

    #[test]
    fn non_finite_cells_become_nodata() {
        let field = ScalarField::from_values(
            Range::new(0, 0, 2, 1),
            vec![3.0, f64::INFINITY],
        );
        let transform = GridTransform {
            origin_x: 0.0,
            origin_y: 1.0,
            cell_width: 1.0,
            cell_height: -1.0,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.asc");
        write_grid(&path, &field, &transform, -9999.0).unwrap();
        let back = read_grid(&path).unwrap();
        assert_eq!(back.field.value(Point::new(1, 0)), -9999.0);
        // Masking restores the sentinel.
        let masked = back.field_masking_nodata();
        assert_eq!(masked.value(Point::new(0, 0)), 3.0);
        assert_eq!(masked.value(Point::new(1, 0)), f64::INFINITY);
    }

    #[test]
    fn missing_header_field_is_an_error() {
        let f = write_temp("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\n1 2\n");
        match read_grid(f.path()) {
            Err(RasterError::MissingHeader { field, .. }) => assert_eq!(field, "cellsize"),
            other => panic!("expected MissingHeader, got {other:?}"),
        }
    }

    #[test]
    fn malformed_cell_reports_line_number() {
        let f = write_temp(
            "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 oops\n",
        );
        match read_grid(f.path()) {
            Err(RasterError::Parse { line, msg, .. }) => {
                assert_eq!(line, 6);
                assert!(msg.contains("oops"), "{msg}");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn cell_count_mismatch_is_an_error() {
        let f = write_temp("ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3 4\n");
        match read_grid(f.path()) {
            Err(RasterError::Parse { msg, .. }) => {
                assert!(msg.contains("expected 6"), "{msg}");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_grid(Path::new("/nonexistent/grid.asc")).unwrap_err();
        assert!(matches!(err, RasterError::Io { .. }));
    }

    #[test]
    fn rectangular_cells_refuse_to_write() {
        let field = ScalarField::new_filled(Range::new(0, 0, 2, 2), 1.0);
        let transform = GridTransform {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 30.0,
            cell_height: -10.0,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = write_grid(&dir.path().join("bad.asc"), &field, &transform, -9999.0).unwrap_err();
        assert!(matches!(err, RasterError::NonSquareCells { .. }));
    }
}
