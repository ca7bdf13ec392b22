// src/grid_io.rs
//
// Binary and text serialization of vector grids.
//
// Both formats store one 3-vector per grid point, components in x,y,z order,
// samples ordered with the z index varying fastest. The binary format is raw
// little-endian single-precision floats with no header; the text format is
// one grid point per line with whitespace-separated components, and lines
// starting with '#' are comments.
//
// The conversion factor is always explicit and applied symmetrically:
// `dump*` writes `stored * conversion`, `load*` stores `read * conversion`.
// A caller converting Tesla to Gauss on dump passes 1e4 and loads the file
// back with 1e-4.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::VectorGrid;

/// Write a grid as raw little-endian f32 triples.
///
/// Best effort: a failed write can leave a partial file behind.
pub fn dump<P: AsRef<Path>>(grid: &VectorGrid, path: P, conversion: f64) -> Result<()> {
    let path = path.as_ref();
    let wr = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut w = BufWriter::new(File::create(path).map_err(wr)?);
    for v in grid.samples() {
        for c in 0..3 {
            let x = (v[c] * conversion) as f32;
            w.write_all(&x.to_le_bytes()).map_err(wr)?;
        }
    }
    w.flush().map_err(wr)?;
    debug!(path = %path.display(), samples = grid.len(), "dumped binary grid");
    Ok(())
}

/// Read a grid from raw little-endian f32 triples, overwriting every sample.
///
/// Fails with `Truncated` if the file holds fewer than `nx*ny*nz` samples.
pub fn load<P: AsRef<Path>>(grid: &mut VectorGrid, path: P, conversion: f64) -> Result<()> {
    let path = path.as_ref();
    let rd = |source| Error::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut r = BufReader::new(File::open(path).map_err(rd)?);
    let expected = grid.len();
    let mut buf = [0u8; 12];
    for (got, sample) in grid.samples_mut().iter_mut().enumerate() {
        if let Err(e) = r.read_exact(&mut buf) {
            return Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Truncated {
                    path: path.to_path_buf(),
                    expected,
                    got,
                }
            } else {
                rd(e)
            });
        }
        for c in 0..3 {
            let raw = f32::from_le_bytes(buf[4 * c..4 * c + 4].try_into().unwrap());
            sample[c] = f64::from(raw) * conversion;
        }
    }
    debug!(path = %path.display(), samples = expected, "loaded binary grid");
    Ok(())
}

/// Write a grid as text, one grid point per line, with a short `#` header
/// describing the geometry and the applied conversion factor.
pub fn dump_txt<P: AsRef<Path>>(grid: &VectorGrid, path: P, conversion: f64) -> Result<()> {
    let path = path.as_ref();
    let wr = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut w = BufWriter::new(File::create(path).map_err(wr)?);
    let (nx, ny, nz) = grid.dims();
    let o = grid.origin();
    writeln!(w, "# nx ny nz: {nx} {ny} {nz}").map_err(wr)?;
    writeln!(w, "# spacing: {:e}", grid.spacing()).map_err(wr)?;
    writeln!(w, "# origin: {:e} {:e} {:e}", o[0], o[1], o[2]).map_err(wr)?;
    writeln!(w, "# conversion: {conversion:e}").map_err(wr)?;
    for v in grid.samples() {
        writeln!(
            w,
            "{:e} {:e} {:e}",
            v[0] * conversion,
            v[1] * conversion,
            v[2] * conversion
        )
        .map_err(wr)?;
    }
    w.flush().map_err(wr)?;
    debug!(path = %path.display(), samples = grid.len(), "dumped text grid");
    Ok(())
}

/// Read a grid from text, overwriting every sample. `#` lines and blank
/// lines are skipped; anything else must parse as three numbers.
pub fn load_txt<P: AsRef<Path>>(grid: &mut VectorGrid, path: P, conversion: f64) -> Result<()> {
    let path = path.as_ref();
    let rd = |source| Error::Read {
        path: path.to_path_buf(),
        source,
    };

    let r = BufReader::new(File::open(path).map_err(rd)?);
    let expected = grid.len();
    let mut got = 0usize;

    for (lineno, line) in r.lines().enumerate() {
        let line = line.map_err(rd)?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        if got == expected {
            break; // trailing data is ignored
        }

        let mut parts = text.split_whitespace();
        let mut sample = [0.0f64; 3];
        for c in 0..3 {
            let token = parts.next().ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                line: lineno + 1,
                text: text.to_string(),
            })?;
            sample[c] = token.parse::<f64>().map_err(|_| Error::Parse {
                path: path.to_path_buf(),
                line: lineno + 1,
                text: text.to_string(),
            })? * conversion;
        }

        grid.samples_mut()[got] = sample;
        got += 1;
    }

    if got < expected {
        return Err(Error::Truncated {
            path: path.to_path_buf(),
            expected,
            got,
        });
    }
    debug!(path = %path.display(), samples = expected, "loaded text grid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sample_grid() -> VectorGrid {
        let mut g = VectorGrid::new([0.0; 3], 1.0, 2, 2, 2).unwrap();
        for (i, v) in g.samples_mut().iter_mut().enumerate() {
            *v = [i as f64, -(i as f64), 0.5 * i as f64];
        }
        g
    }

    #[test]
    fn binary_layout_is_z_fastest_f32_le() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.raw");
        let g = sample_grid();
        dump(&g, &path, 1.0).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8 * 3 * 4);
        // Sample (0,0,1) is the second record; its x component is 1.0f32.
        let x = f32::from_le_bytes(bytes[12..16].try_into().unwrap());
        assert_eq!(x, 1.0);
    }

    #[test]
    fn truncated_binary_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.raw");
        std::fs::write(&path, [0u8; 20]).unwrap();

        let mut g = sample_grid();
        match load(&mut g, &path, 1.0) {
            Err(Error::Truncated { expected, got, .. }) => {
                assert_eq!(expected, 8);
                assert_eq!(got, 1);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn text_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "# a header").unwrap();
        writeln!(f).unwrap();
        for i in 0..8 {
            writeln!(f, "{i} 0 0").unwrap();
        }
        drop(f);

        let mut g = VectorGrid::new([0.0; 3], 1.0, 2, 2, 2).unwrap();
        load_txt(&mut g, &path, 1.0).unwrap();
        assert_eq!(g.samples()[3], [3.0, 0.0, 0.0]);
    }

    #[test]
    fn unparseable_text_line_reports_its_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "1 2 3\n4 five 6\n").unwrap();

        let mut g = VectorGrid::new([0.0; 3], 1.0, 2, 1, 1).unwrap();
        match load_txt(&mut g, &path, 1.0) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_the_path() {
        let mut g = sample_grid();
        let err = load(&mut g, "/nonexistent/grid.raw", 1.0).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/grid.raw"));
    }
}
