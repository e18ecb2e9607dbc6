use super::ids::ResidueId;
use nalgebra::Point3;
use std::str::FromStr;

/// Represents the role or classification of an atom within a molecular structure.
///
/// Roles are assigned when a structure is read and drive atom selections
/// (e.g. "protein" selects backbone and sidechain atoms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Backbone atom of an amino-acid residue (e.g., N, CA, C, O).
    Backbone,
    /// Sidechain atom of an amino-acid residue.
    Sidechain,
    /// Atom of a hetero group that is neither water nor a standard residue.
    Ligand,
    /// Water molecule atom.
    Water,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

impl AtomRole {
    pub fn is_protein(self) -> bool {
        matches!(self, AtomRole::Backbone | AtomRole::Sidechain)
    }
}

/// Represents an atom in a molecular structure.
///
/// Besides the identity and coordinates, the struct keeps the per-atom
/// columns of the source file (occupancy, B-factor, element) so that
/// a transformed structure can be written back without losing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The element symbol (e.g., "C", "FE"); may be empty if unknown.
    pub element: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role or classification of the atom in the molecular structure.
    pub role: AtomRole,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
}

impl Atom {
    /// Creates a new `Atom` with default values for most fields.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            element: String::new(),
            residue_id,
            role: AtomRole::default(),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }
}

impl FromStr for AtomRole {
    type Err = ();

    /// Parses a string into an `AtomRole`.
    ///
    /// Parsing is case-insensitive and accepts "side-chain"/"side_chain"
    /// spellings for sidechain atoms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "ligand" => Ok(AtomRole::Ligand),
            "water" => Ok(AtomRole::Water),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let residue_id = ResidueId::default();
        let atom = Atom::new("CA", residue_id, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "CA");
        assert_eq!(atom.residue_id, residue_id);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.serial, 0);
        assert_eq!(atom.element, "");
        assert_eq!(atom.occupancy, 1.0);
        assert_eq!(atom.b_factor, 0.0);
        assert_eq!(atom.role, AtomRole::Other);
    }

    #[test]
    fn only_backbone_and_sidechain_roles_are_protein() {
        assert!(AtomRole::Backbone.is_protein());
        assert!(AtomRole::Sidechain.is_protein());
        assert!(!AtomRole::Ligand.is_protein());
        assert!(!AtomRole::Water.is_protein());
        assert!(!AtomRole::Other.is_protein());
    }

    #[test]
    fn from_str_parses_valid_roles_case_insensitively() {
        assert_eq!(AtomRole::from_str("backbone"), Ok(AtomRole::Backbone));
        assert_eq!(AtomRole::from_str("Side-Chain"), Ok(AtomRole::Sidechain));
        assert_eq!(AtomRole::from_str("side_chain"), Ok(AtomRole::Sidechain));
        assert_eq!(AtomRole::from_str("LIGAND"), Ok(AtomRole::Ligand));
        assert_eq!(AtomRole::from_str("wAtEr"), Ok(AtomRole::Water));
        assert_eq!(AtomRole::from_str("unknown"), Ok(AtomRole::Other));
    }

    #[test]
    fn from_str_returns_err_for_invalid_role() {
        assert_eq!(AtomRole::from_str("foo"), Err(()));
        assert_eq!(AtomRole::from_str(""), Err(()));
    }
}
