//! Compatibility check against the companion `.chem` chemistry file.
//!
//! The grid format embeds its own copy of the nuclei; before a grid is
//! trusted, that copy is compared against the independent chemistry
//! description. Charges must match exactly, positions to within an absolute
//! `1e-4`.

use crate::files::FileKind;
use crate::parse::{ScanError, Scanner};
use crate::Error;

use std::path::Path;

/// how far apart two descriptions of the same nucleus may sit
const POSITION_TOLERANCE: f64 = 1.0e-4;

/// a nucleus of the chemical system: position and integer charge in [1, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nucleus {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub charge: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ChemError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("the reference nucleus list is empty, nothing can be checked")]
    EmptyReference,
    #[error("expecting a positive count after the `{keyword}` keyword instead of {count}")]
    BadCount { keyword: &'static str, count: i64 },
    #[error("expecting `Nuclei {expected}` instead of `Nuclei {declared}`")]
    NucleiCountMismatch { declared: i64, expected: usize },
    #[error(
        "expecting {expected} instead of {found} for the {axis} coordinate of the \
         {index}-th nucleus"
    )]
    CoordinateMismatch {
        index: usize,
        axis: &'static str,
        expected: f64,
        found: f64,
    },
    #[error(
        "the charge (={charge}) of the {index}-th nucleus must be a positive integer \
         that is not (strictly) greater than one hundred"
    )]
    ChargeOutOfRange { index: usize, charge: i64 },
    #[error("expecting {expected} instead of {found} for the charge of the {index}-th nucleus")]
    ChargeMismatch {
        index: usize,
        expected: i32,
        found: i64,
    },
}

/// open the `.chem` file at `path` and check its nuclei against `nuclei`
pub fn check_chemical_compatibility(path: &Path, nuclei: &[Nucleus]) -> Result<(), Error> {
    if nuclei.is_empty() {
        return Err(ChemError::EmptyReference.into());
    }

    FileKind::expect(path, FileKind::Chem)?;

    log::info!("opening {} to check nucleus data", path.display());
    let buffer = std::fs::read(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;

    compare_chemistry(&buffer, nuclei)?;
    Ok(())
}

/// parse the chemistry grammar and compare each nucleus record
pub(crate) fn compare_chemistry(input: &[u8], nuclei: &[Nucleus]) -> Result<(), ChemError> {
    let mut scanner = Scanner::new(input);

    scanner.seek_keyword("MolecularOrbitals")?;
    let orbitals = scanner.read_int("MolecularOrbitals")?;
    if orbitals < 1 {
        return Err(ChemError::BadCount {
            keyword: "MolecularOrbitals",
            count: orbitals,
        });
    }

    scanner.seek_keyword("Primitives")?;
    let primitives = scanner.read_int("Primitives")?;
    if primitives < 1 {
        return Err(ChemError::BadCount {
            keyword: "Primitives",
            count: primitives,
        });
    }

    scanner.seek_keyword("Nuclei")?;
    let declared = scanner.read_int("Nuclei")?;
    if declared != nuclei.len() as i64 {
        return Err(ChemError::NucleiCountMismatch {
            declared,
            expected: nuclei.len(),
        });
    }

    for (index, reference) in nuclei.iter().enumerate() {
        let position = [
            scanner.read_f64("a nucleus coordinate")?,
            scanner.read_f64("a nucleus coordinate")?,
            scanner.read_f64("a nucleus coordinate")?,
        ];
        let expected = [reference.x, reference.y, reference.z];
        for (axis, (found, expected)) in ["x", "y", "z"]
            .into_iter()
            .zip(position.into_iter().zip(expected))
        {
            if (expected - found).abs() >= POSITION_TOLERANCE {
                return Err(ChemError::CoordinateMismatch {
                    index: index + 1,
                    axis,
                    expected,
                    found,
                });
            }
        }

        let charge = scanner.read_int("a nucleus charge")?;
        if !(1..=100).contains(&charge) {
            return Err(ChemError::ChargeOutOfRange {
                index: index + 1,
                charge,
            });
        }
        if charge != reference.charge as i64 {
            return Err(ChemError::ChargeMismatch {
                index: index + 1,
                expected: reference.charge,
                found: charge,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Vec<Nucleus> {
        vec![
            Nucleus { x: 0.0, y: 0.0, z: 0.5, charge: 8 },
            Nucleus { x: 1.25, y: -0.5, z: 0.0, charge: 1 },
        ]
    }

    const CHEM_FILE: &str = "MolecularOrbitals 5\nPrimitives 21\nNuclei 2\n\
        0.0 0.0 0.5 8\n1.25 -0.5 0.0 1\n";

    #[test]
    fn matching_chemistry_passes() {
        compare_chemistry(CHEM_FILE.as_bytes(), &reference()).unwrap();
    }

    #[test]
    fn a_nearby_position_is_still_a_match() {
        let input = CHEM_FILE.replace("1.25", "1.2500000001");
        compare_chemistry(input.as_bytes(), &reference()).unwrap();
    }

    #[test]
    fn a_displaced_nucleus_names_the_axis() {
        let input = CHEM_FILE.replace("-0.5", "-0.4");
        let result = compare_chemistry(input.as_bytes(), &reference());
        assert!(matches!(
            result,
            Err(ChemError::CoordinateMismatch {
                index: 2,
                axis: "y",
                ..
            })
        ));
    }

    #[test]
    fn a_different_charge_is_fatal() {
        let input = CHEM_FILE.replace("0.5 8", "0.5 7");
        let result = compare_chemistry(input.as_bytes(), &reference());
        assert!(matches!(
            result,
            Err(ChemError::ChargeMismatch {
                index: 1,
                expected: 8,
                found: 7,
            })
        ));
    }

    #[test]
    fn a_wrong_nucleus_count_is_fatal() {
        let input = CHEM_FILE.replace("Nuclei 2", "Nuclei 3");
        let result = compare_chemistry(input.as_bytes(), &reference());
        assert!(matches!(
            result,
            Err(ChemError::NucleiCountMismatch { declared: 3, .. })
        ));
    }
}
