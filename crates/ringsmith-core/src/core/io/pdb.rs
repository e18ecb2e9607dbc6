use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::models::chain::ChainType;
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::{classify_atom_role, is_amino_acid, is_water};
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Largest serial number that fits the five-column serial field.
const MAX_SERIAL: usize = 99_999;
/// `CONECT` records list at most four bonded partners per line.
const CONECT_PARTNERS_PER_LINE: usize = 4;
const FALLBACK_CHAIN_ID: char = 'A';

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Records other than coordinates and connectivity, in file order.
    pub header_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record ({length} chars, need at least 54)")]
    LineTooShort { length: usize },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_int(line: &str, line_num: usize, start: usize, end: usize) -> Result<isize, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// Parses an optional float column, falling back to `default` when blank.
fn parse_float_or(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end)
    }
}

fn chain_type_for(residue_name: &str, is_hetero: bool) -> ChainType {
    if is_water(residue_name) {
        ChainType::Water
    } else if is_amino_acid(residue_name) {
        ChainType::Protein
    } else if is_hetero {
        ChainType::Ligand
    } else {
        ChainType::Other
    }
}

/// Fixed-column Protein Data Bank format.
///
/// Only the first model of a multi-model file is read. Alternate locations
/// other than the first (`A`) are skipped.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut system = MolecularSystem::new();
        let mut metadata = PdbMetadata::default();
        let mut serial_map: HashMap<usize, AtomId> = HashMap::new();
        let mut pending_bonds: Vec<(usize, usize)> = Vec::new();
        let mut last_serial = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort { length: line.len() },
                        });
                    }
                    if let Some(alt_loc) = column_char(&line, 16) {
                        if alt_loc != 'A' && alt_loc != '1' {
                            continue;
                        }
                    }

                    let is_hetero = record_type == "HETATM";
                    let serial_str = slice_and_trim(&line, 6, 11);
                    let serial = if serial_str.is_empty() || serial_str.starts_with('*') {
                        last_serial + 1
                    } else {
                        let parsed = parse_int(&line, line_num, 6, 11)?;
                        usize::try_from(parsed).map_err(|_| PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::InvalidInt {
                                columns: "7-11".into(),
                                value: serial_str.into(),
                            },
                        })?
                    };
                    last_serial = serial;

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let residue_name = slice_and_trim(&line, 17, 21);
                    let chain_label = column_char(&line, 21)
                        .or_else(|| slice_and_trim(&line, 72, 76).chars().next())
                        .unwrap_or(FALLBACK_CHAIN_ID);
                    let residue_number = parse_int(&line, line_num, 22, 26)?;
                    let insertion_code = column_char(&line, 26);

                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let occupancy = parse_float_or(&line, line_num, 54, 60, 1.0)?;
                    let b_factor = parse_float_or(&line, line_num, 60, 66, 0.0)?;
                    let element = slice_and_trim(&line, 76, 78);

                    let chain_id = match system.find_chain_by_id(chain_label) {
                        Some(id) => id,
                        None => system
                            .add_chain(chain_label, chain_type_for(residue_name, is_hetero)),
                    };
                    let residue_id = system
                        .add_residue(chain_id, residue_number, insertion_code, residue_name)
                        .ok_or_else(|| {
                            PdbError::MissingRecord(format!("chain '{}'", chain_label))
                        })?;

                    let mut atom = Atom::new(name, residue_id, Point3::new(x, y, z));
                    atom.serial = serial;
                    atom.element = element.to_string();
                    atom.occupancy = occupancy;
                    atom.b_factor = b_factor;
                    atom.role = classify_atom_role(residue_name, name, is_hetero);

                    let atom_id = system.add_atom_to_residue(residue_id, atom).ok_or_else(|| {
                        PdbError::MissingRecord(format!("residue {}", residue_number))
                    })?;
                    serial_map.insert(serial, atom_id);
                }
                "CONECT" => {
                    let Ok(origin) = slice_and_trim(&line, 6, 11).parse::<usize>() else {
                        continue;
                    };
                    let mut start = 11;
                    while start < line.len() {
                        if let Ok(partner) = slice_and_trim(&line, start, start + 5).parse() {
                            pending_bonds.push((origin, partner));
                        }
                        start += 5;
                    }
                }
                "TER" | "MODEL" | "MASTER" => {}
                "ENDMDL" | "END" => break,
                _ => {
                    if !line.trim().is_empty() {
                        metadata.header_lines.push(line);
                    }
                }
            }
        }

        if system.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }

        for (a1, a2) in pending_bonds {
            if let (Some(&id1), Some(&id2)) = (serial_map.get(&a1), serial_map.get(&a2)) {
                if id1 != id2 {
                    system.add_bond(id1, id2);
                }
            }
        }

        Ok((system, metadata))
    }

    fn write_to(
        system: &MolecularSystem,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        let mut serials: HashMap<AtomId, usize> = HashMap::new();
        let mut next_serial = 1usize;

        for (chain_id, chain) in system.chains_iter() {
            let mut last_residue = None;
            for (_, residue) in system.residues_of(chain_id) {
                for &atom_id in residue.atoms() {
                    let Some(atom) = system.atom(atom_id) else {
                        continue;
                    };
                    let record_type = match atom.role {
                        AtomRole::Ligand | AtomRole::Water => "HETATM",
                        _ => "ATOM",
                    };
                    writeln!(
                        writer,
                        "{:<6}{} {} {}{}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                        record_type,
                        format_serial(next_serial),
                        format_atom_name(&atom.name, &atom.element),
                        format_residue_name(&residue.name),
                        chain.id,
                        residue.residue_number,
                        residue.insertion_code.unwrap_or(' '),
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.b_factor,
                        atom.element,
                    )?;
                    serials.insert(atom_id, next_serial);
                    next_serial += 1;
                }
                last_residue = Some(residue);
            }
            if let Some(residue) = last_residue {
                writeln!(
                    writer,
                    "TER   {}      {}{}{:>4}{}",
                    format_serial(next_serial),
                    format_residue_name(&residue.name),
                    chain.id,
                    residue.residue_number,
                    residue.insertion_code.unwrap_or(' '),
                )?;
                next_serial += 1;
            }
        }

        let mut conect: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for bond in system.bonds() {
            if let (Some(&s1), Some(&s2)) = (serials.get(&bond.atom1_id), serials.get(&bond.atom2_id))
            {
                if s1 > MAX_SERIAL || s2 > MAX_SERIAL {
                    continue;
                }
                conect.entry(s1).or_default().push(s2);
                conect.entry(s2).or_default().push(s1);
            }
        }
        for (serial, partners) in &mut conect {
            partners.sort_unstable();
            for group in partners.chunks(CONECT_PARTNERS_PER_LINE) {
                write!(writer, "CONECT{:>5}", serial)?;
                for partner in group {
                    write!(writer, "{:>5}", partner)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_system_to(
        system: &MolecularSystem,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let metadata = PdbMetadata {
            header_lines: vec!["REMARK     GENERATED BY RINGSMITH".to_string()],
        };
        Self::write_to(system, &metadata, writer)
    }
}

fn format_serial(serial: usize) -> String {
    if serial > MAX_SERIAL {
        "*****".to_string()
    } else {
        format!("{:>5}", serial)
    }
}

/// Atom names shorter than four characters with a one-letter element start in
/// column 14, everything else in column 13.
fn format_atom_name(name: &str, element: &str) -> String {
    if name.len() < 4 && element.len() <= 1 {
        format!(" {:<3}", name)
    } else {
        format!("{:<4}", name)
    }
}

/// Residue names occupy columns 18-20, spilling into column 21 when four
/// characters long.
fn format_residue_name(name: &str) -> String {
    if name.len() > 3 {
        format!("{:<4.4}", name)
    } else {
        format!("{:>3} ", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        record: &str,
        serial: usize,
        name: &str,
        residue: &str,
        chain: char,
        residue_number: isize,
        position: (f64, f64, f64),
        segment: &str,
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00 20.00      {:<4}{:>2}",
            record,
            serial,
            name,
            residue,
            chain,
            residue_number,
            position.0,
            position.1,
            position.2,
            segment,
            element
        )
    }

    fn read(text: &str) -> Result<(MolecularSystem, PdbMetadata), PdbError> {
        let mut reader = text.as_bytes();
        PdbFile::read_from(&mut reader)
    }

    fn sample_pdb() -> String {
        [
            "HEADER    TEST STRUCTURE".to_string(),
            "CRYST1   50.000   50.000   50.000  90.00  90.00  90.00 P 1           1".to_string(),
            atom_line("ATOM", 1, " N", "GLY", 'A', 1, (11.104, 6.134, -6.504), "", "N"),
            atom_line("ATOM", 2, " CA", "GLY", 'A', 1, (11.639, 6.071, -5.147), "", "C"),
            atom_line("ATOM", 3, " CB", "ALA", 'A', 2, (12.0, 7.5, -4.0), "", "C"),
            "TER       4      ALA A   2".to_string(),
            atom_line("ATOM", 5, " CA", "ALA", 'B', 1, (-1.0, -2.0, -3.0), "", "C"),
            atom_line("HETATM", 6, " O", "HOH", 'W', 100, (0.5, 0.25, 0.125), "", "O"),
            "CONECT    1    2".to_string(),
            "END".to_string(),
        ]
        .join("\n")
    }

    #[test]
    fn reads_atoms_chains_and_header() {
        let (system, metadata) = read(&sample_pdb()).unwrap();

        assert_eq!(system.atom_count(), 5);
        let labels: Vec<_> = system.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(labels, vec!['A', 'B', 'W']);
        assert_eq!(metadata.header_lines.len(), 2);
        assert!(metadata.header_lines[0].starts_with("HEADER"));

        let water_chain = system.find_chain_by_id('W').unwrap();
        assert_eq!(system.chain(water_chain).unwrap().chain_type, ChainType::Water);

        let (_, first) = system.atoms_iter().next().unwrap();
        assert_eq!(first.name, "N");
        assert_eq!(first.element, "N");
        assert_eq!(first.serial, 1);
        assert_eq!(first.role, AtomRole::Backbone);
        assert_eq!(first.b_factor, 20.0);
        assert_eq!(first.position, Point3::new(11.104, 6.134, -6.504));

        let roles: Vec<_> = system.atoms_iter().map(|(_, a)| a.role).collect();
        assert_eq!(
            roles,
            vec![
                AtomRole::Backbone,
                AtomRole::Backbone,
                AtomRole::Sidechain,
                AtomRole::Backbone,
                AtomRole::Water
            ]
        );
    }

    #[test]
    fn reads_conect_bonds() {
        let (system, _) = read(&sample_pdb()).unwrap();
        assert_eq!(system.bonds().len(), 1);
        let bond = &system.bonds()[0];
        let names = [
            system.atom(bond.atom1_id).unwrap().name.as_str(),
            system.atom(bond.atom2_id).unwrap().name.as_str(),
        ];
        assert_eq!(names, ["N", "CA"]);
    }

    #[test]
    fn blank_chain_falls_back_to_segment_then_default() {
        let text = [
            atom_line("ATOM", 1, " CA", "GLY", ' ', 1, (0.0, 0.0, 0.0), "Q", "C"),
            atom_line("ATOM", 2, " CA", "GLY", ' ', 2, (1.0, 0.0, 0.0), "", "C"),
        ]
        .join("\n");
        let (system, _) = read(&text).unwrap();
        let labels: Vec<_> = system.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(labels, vec!['Q', 'A']);
    }

    #[test]
    fn stops_at_first_model_end() {
        let text = [
            "MODEL        1".to_string(),
            atom_line("ATOM", 1, " CA", "GLY", 'A', 1, (0.0, 0.0, 0.0), "", "C"),
            "ENDMDL".to_string(),
            "MODEL        2".to_string(),
            atom_line("ATOM", 1, " CA", "GLY", 'A', 1, (5.0, 5.0, 5.0), "", "C"),
            "ENDMDL".to_string(),
        ]
        .join("\n");
        let (system, _) = read(&text).unwrap();
        assert_eq!(system.atom_count(), 1);
        assert_eq!(system.positions(), vec![Point3::origin()]);
    }

    #[test]
    fn reports_line_and_columns_of_bad_coordinate() {
        let mut bad = atom_line("ATOM", 1, " CA", "GLY", 'A', 1, (0.0, 0.0, 0.0), "", "C");
        bad.replace_range(30..38, "  abc.de");
        let text = format!("REMARK first\n{}", bad);

        match read(&text) {
            Err(PdbError::Parse { line, kind }) => {
                assert_eq!(line, 2);
                assert_eq!(
                    kind,
                    PdbParseErrorKind::InvalidFloat {
                        columns: "31-38".into(),
                        value: "abc.de".into()
                    }
                );
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let result = read("ATOM      1  CA  GLY A   1       0.000");
        assert!(matches!(
            result,
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort { .. }
            })
        ));
    }

    #[test]
    fn file_without_atoms_is_missing_records() {
        assert!(matches!(
            read("HEADER    EMPTY\nEND"),
            Err(PdbError::MissingRecord(_))
        ));
    }

    #[test]
    fn skips_secondary_alternate_locations() {
        let mut alt_a = atom_line("ATOM", 1, " CA", "SER", 'A', 1, (0.0, 0.0, 0.0), "", "C");
        alt_a.replace_range(16..17, "A");
        let mut alt_b = atom_line("ATOM", 2, " CA", "SER", 'A', 1, (0.3, 0.0, 0.0), "", "C");
        alt_b.replace_range(16..17, "B");
        let (system, _) = read(&format!("{}\n{}", alt_a, alt_b)).unwrap();
        assert_eq!(system.atom_count(), 1);
    }

    #[test]
    fn written_file_reads_back_with_same_coordinates() {
        let (system, _) = read(&sample_pdb()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.pdb");

        PdbFile::write_system_to_path(&system, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let (reread, metadata) = PdbFile::read_from_path(&path).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("TER")).count(), 3);
        assert!(text.lines().last().unwrap().starts_with("END"));
        assert_eq!(text.lines().next(), Some("REMARK     GENERATED BY RINGSMITH"));
        assert_eq!(
            metadata.header_lines,
            vec!["REMARK     GENERATED BY RINGSMITH".to_string()]
        );
        assert_eq!(reread.atom_count(), system.atom_count());
        assert_eq!(reread.bonds().len(), 1);

        for (p1, p2) in system.positions().iter().zip(reread.positions().iter()) {
            assert!((p1 - p2).norm() < 1e-3);
        }
        let labels: Vec<_> = reread.chains_iter().map(|(_, c)| c.id).collect();
        assert_eq!(labels, vec!['A', 'B', 'W']);
        let roles: Vec<_> = reread.atoms_iter().map(|(_, a)| a.role).collect();
        let original_roles: Vec<_> = system.atoms_iter().map(|(_, a)| a.role).collect();
        assert_eq!(roles, original_roles);
    }

    #[test]
    fn writer_renumbers_serials_and_remaps_conect() {
        let (system, _) = read(&sample_pdb()).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&system, &PdbMetadata::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let serials: Vec<usize> = text
            .lines()
            .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM"))
            .map(|l| l[6..11].trim().parse().unwrap())
            .collect();
        assert_eq!(serials, vec![1, 2, 3, 5, 7]);

        let conect: Vec<_> = text.lines().filter(|l| l.starts_with("CONECT")).collect();
        assert_eq!(conect, vec!["CONECT    1    2", "CONECT    2    1"]);
        assert!(text.contains("HETATM    7  O   HOH W 100"));
    }

    #[test]
    fn serials_beyond_five_digits_are_masked() {
        assert_eq!(format_serial(99_999), "99999");
        assert_eq!(format_serial(100_000), "*****");
    }

    #[test]
    fn residue_names_fill_columns_18_to_21() {
        assert_eq!(format_residue_name("GLY"), "GLY ");
        assert_eq!(format_residue_name("NA"), " NA ");
        assert_eq!(format_residue_name("TIP3"), "TIP3");
    }
}
