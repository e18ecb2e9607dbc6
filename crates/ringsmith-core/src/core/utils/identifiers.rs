use crate::core::models::atom::AtomRole;
use phf::{Set, phf_set};

/// Chain labels assigned to ring subunits, in index order.
pub const CHAIN_LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3", "NT",
    "HT1", "HT2", "HT3", "OT1", "OT2", "HC", "HOXT", "HA1", "HA2", "HA3", "1HA", "2HA",
};

static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "HSD", "HSE", "HSP", "HID", "HIE", "HIP", "CYX", "ASH", "GLH", "LYN", "MSE",
};

static WATER_RESIDUE_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "TIP", "TIP3", "TIP4", "SOL", "DOD",
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_amino_acid(residue_name: &str) -> bool {
    AMINO_ACID_NAMES.contains(residue_name.trim())
}

pub fn is_water(residue_name: &str) -> bool {
    WATER_RESIDUE_NAMES.contains(residue_name.trim())
}

/// Returns the chain label for the subunit at `index`, if the alphabet is large enough.
pub fn chain_label(index: usize) -> Option<char> {
    CHAIN_LABELS.chars().nth(index)
}

pub fn chain_label_capacity() -> usize {
    CHAIN_LABELS.len()
}

/// Classifies an atom from its residue name, atom name and record type.
pub fn classify_atom_role(residue_name: &str, atom_name: &str, is_hetero: bool) -> AtomRole {
    if is_water(residue_name) {
        AtomRole::Water
    } else if is_amino_acid(residue_name) {
        if is_backbone_atom(atom_name) {
            AtomRole::Backbone
        } else {
            AtomRole::Sidechain
        }
    } else if is_hetero {
        AtomRole::Ligand
    } else {
        AtomRole::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_backbone_atom_recognizes_standard_backbone_atoms() {
        assert!(is_backbone_atom("N"));
        assert!(is_backbone_atom("CA"));
        assert!(is_backbone_atom("C"));
        assert!(is_backbone_atom("O"));
        assert!(is_backbone_atom("OXT"));
    }

    #[test]
    fn is_backbone_atom_is_case_sensitive_and_trims_whitespace() {
        assert!(!is_backbone_atom("ca"));
        assert!(is_backbone_atom(" CA "));
        assert!(!is_backbone_atom("CB"));
        assert!(!is_backbone_atom(""));
    }

    #[test]
    fn chain_labels_cover_52_subunits_in_order() {
        assert_eq!(chain_label_capacity(), 52);
        assert_eq!(chain_label(0), Some('A'));
        assert_eq!(chain_label(25), Some('Z'));
        assert_eq!(chain_label(26), Some('a'));
        assert_eq!(chain_label(51), Some('z'));
        assert_eq!(chain_label(52), None);
    }

    #[test]
    fn classify_atom_role_distinguishes_residue_kinds() {
        assert_eq!(classify_atom_role("ALA", "CA", false), AtomRole::Backbone);
        assert_eq!(classify_atom_role("ALA", "CB", false), AtomRole::Sidechain);
        assert_eq!(classify_atom_role("MSE", "SE", true), AtomRole::Sidechain);
        assert_eq!(classify_atom_role("HOH", "O", true), AtomRole::Water);
        assert_eq!(classify_atom_role("HEM", "FE", true), AtomRole::Ligand);
        assert_eq!(classify_atom_role("DA", "P", false), AtomRole::Other);
    }
}
