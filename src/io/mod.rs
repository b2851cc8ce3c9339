//! Input/output for atomic structures
//!
//! Structures are stored as JSON (`atoms` with id, atomic number and
//! position, `bonds` by atom id). Minimized geometries can also be exported
//! as XYZ for viewers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::structure::{AtomicStructure, StructureError};

/// Errors that can occur during file I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid structure: {0}")]
    InvalidStructure(#[from] StructureError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

/// Read a structure from a JSON file and check it for consistency
pub fn read_structure<P: AsRef<Path>>(path: P) -> Result<AtomicStructure, IoError> {
    let file = File::open(path.as_ref())?;
    let structure: AtomicStructure = serde_json::from_reader(BufReader::new(file))?;
    structure.validate()?;
    Ok(structure)
}

/// Write a structure as pretty-printed JSON
pub fn write_structure<P: AsRef<Path>>(
    structure: &AtomicStructure,
    path: P,
) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, structure)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a structure in XYZ format
///
/// The comment must fit on one line. Placeholder atoms are written as "X".
pub fn write_xyz<P: AsRef<Path>>(
    structure: &AtomicStructure,
    comment: &str,
    path: P,
) -> Result<(), IoError> {
    if comment.contains('\n') {
        return Err(IoError::InvalidFormat(
            "XYZ comment must be a single line".to_string(),
        ));
    }

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writeln!(writer, "{}", structure.num_atoms())?;
    writeln!(writer, "{}", comment)?;
    for atom in &structure.atoms {
        writeln!(
            writer,
            "{:<2} {:>12.6} {:>12.6} {:>12.6}",
            atom.symbol(),
            atom.position.x,
            atom.position.y,
            atom.position.z
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::BondOrder;
    use nalgebra::Vector3;
    use std::fs;
    use tempfile::tempdir;

    fn methanol() -> AtomicStructure {
        let mut s = AtomicStructure::new();
        let c = s.add_atom(6, Vector3::new(0.0, 0.0, 0.0));
        let o = s.add_atom(8, Vector3::new(1.43, 0.0, 0.0));
        let h = s.add_atom(1, Vector3::new(1.75, 0.9, 0.0));
        s.add_bond(c, o, BondOrder::Single).unwrap();
        s.add_bond(o, h, BondOrder::Single).unwrap();
        s
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("methanol.json");
        let original = methanol();
        write_structure(&original, &path).unwrap();
        assert_eq!(read_structure(&path).unwrap(), original);
    }

    #[test]
    fn test_read_rejects_dangling_bond() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"atoms":[{"id":1,"atomic_number":6,"position":[0,0,0]}],
                "bonds":[{"atom1":1,"atom2":2,"order":"double"}]}"#,
        )
        .unwrap();
        let err = read_structure(&path).unwrap_err();
        assert!(matches!(
            err,
            IoError::InvalidStructure(StructureError::UnknownAtom(2))
        ));
    }

    #[test]
    fn test_read_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"atoms\": [").unwrap();
        assert!(matches!(read_structure(&path), Err(IoError::Json(_))));
        assert!(matches!(
            read_structure(dir.path().join("missing.json")),
            Err(IoError::Io(_))
        ));
    }

    #[test]
    fn test_write_xyz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("methanol.xyz");
        write_xyz(&methanol(), "methanol", &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "methanol");
        assert!(lines[3].starts_with("O "));
        let fields: Vec<f64> = lines[3]
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(fields, vec![1.43, 0.0, 0.0]);

        assert!(matches!(
            write_xyz(&methanol(), "two\nlines", &path),
            Err(IoError::InvalidFormat(_))
        ));
    }
}
