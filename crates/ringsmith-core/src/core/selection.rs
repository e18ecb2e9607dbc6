use super::models::atom::{Atom, AtomRole};
use super::models::chain::Chain;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ALPHA_CARBON_NAME: &str = "CA";

/// Describes a subset of the atoms of a [`MolecularSystem`](super::models::system::MolecularSystem).
///
/// Selections are evaluated against the role assigned to each atom when the
/// structure was read, so `Protein` covers every atom of a standard amino-acid
/// residue and `AlphaCarbons` only the `CA` atoms among them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomSelection {
    #[default]
    All,
    Protein,
    Backbone,
    AlphaCarbons,
    Chain(char),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "Invalid atom selection '{0}'. Expected one of 'all', 'protein', 'backbone', 'ca' or 'chain <ID>'."
)]
pub struct ParseSelectionError(pub String);

impl AtomSelection {
    pub fn matches(&self, chain: &Chain, atom: &Atom) -> bool {
        match self {
            AtomSelection::All => true,
            AtomSelection::Protein => atom.role.is_protein(),
            AtomSelection::Backbone => atom.role == AtomRole::Backbone,
            AtomSelection::AlphaCarbons => {
                atom.role.is_protein() && atom.name.trim() == ALPHA_CARBON_NAME
            }
            AtomSelection::Chain(id) => chain.id == *id,
        }
    }
}

impl FromStr for AtomSelection {
    type Err = ParseSelectionError;

    /// Parses a selection keyword.
    ///
    /// Accepts `all`, `protein`, `backbone`, `ca` (also `calpha` and `name CA`)
    /// and `chain X`. Keywords are case-insensitive; the chain identifier is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut words = trimmed.split_whitespace();
        let keyword = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(ParseSelectionError(s.to_string()));
        }

        match (keyword.as_str(), argument) {
            ("all", None) => Ok(AtomSelection::All),
            ("protein", None) => Ok(AtomSelection::Protein),
            ("backbone", None) => Ok(AtomSelection::Backbone),
            ("ca" | "calpha", None) => Ok(AtomSelection::AlphaCarbons),
            ("name", Some(name)) if name.eq_ignore_ascii_case(ALPHA_CARBON_NAME) => {
                Ok(AtomSelection::AlphaCarbons)
            }
            ("chain", Some(id)) if id.chars().count() == 1 => {
                Ok(AtomSelection::Chain(id.chars().next().unwrap_or('A')))
            }
            _ => Err(ParseSelectionError(s.to_string())),
        }
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSelection::All => write!(f, "all"),
            AtomSelection::Protein => write!(f, "protein"),
            AtomSelection::Backbone => write!(f, "backbone"),
            AtomSelection::AlphaCarbons => write!(f, "ca"),
            AtomSelection::Chain(id) => write!(f, "chain {}", id),
        }
    }
}
