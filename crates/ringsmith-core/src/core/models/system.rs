use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use super::topology::Bond;
use crate::core::selection::AtomSelection;
use nalgebra::{Point3, Vector3};
use slotmap::SlotMap;
use std::collections::HashMap;

type ResidueKey = (ChainId, isize, Option<char>);

/// Represents a complete molecular system with atoms, residues, chains, and bonds.
///
/// Components live in slot maps keyed by stable IDs, while the order of chains
/// (and of residues and atoms within them) follows the order in which they were
/// added. That order is what "segment 0" refers to and is the order used when
/// the system is written out.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    /// Chains in insertion order.
    chain_order: Vec<ChainId>,
    bonds: Vec<Bond>,
    /// Lookup map for finding residues by chain, residue number and insertion code.
    residue_id_map: HashMap<ResidueKey, ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns an iterator over all chains in insertion order.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order.iter().map(move |&id| (id, &self.chains[id]))
    }

    /// Returns the first chain of the system, i.e. segment 0 of the source file.
    pub fn first_chain(&self) -> Option<ChainId> {
        self.chain_order.first().copied()
    }

    /// Returns an iterator over the residues of a chain in order.
    pub fn residues_of(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.residues.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&id| (id, &self.residues[id]))
    }

    /// Returns an iterator over all atoms in file order
    /// (chain by chain, residue by residue).
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.chain_order
            .iter()
            .flat_map(move |&chain_id| self.chains[chain_id].residues.iter())
            .flat_map(move |&residue_id| self.residues[residue_id].atoms.iter())
            .map(move |&atom_id| (atom_id, &self.atoms[atom_id]))
    }

    /// Returns the coordinates of all atoms in file order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms_iter().map(|(_, atom)| atom.position).collect()
    }

    /// Returns the coordinates of the atoms matching `selection`, in file order.
    pub fn selected_positions(&self, selection: &AtomSelection) -> Vec<Point3<f64>> {
        self.atoms_iter()
            .filter(|(_, atom)| self.matches(selection, atom))
            .map(|(_, atom)| atom.position)
            .collect()
    }

    /// Computes the center of geometry of all atoms.
    ///
    /// # Return
    ///
    /// Returns `None` if the system has no atoms.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.atoms.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.atoms.values().map(|atom| atom.position.coords).sum();
        Some(Point3::from(sum / self.atoms.len() as f64))
    }

    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    pub fn find_residue_by_id(
        &self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number, insertion_code))
            .copied()
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given identifier already
    /// exists, its ID is returned and no duplicate is created.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id, chain_type));
        self.chain_order.push(chain_id);
        self.chain_id_map.insert(id, chain_id);
        chain_id
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// Residues are keyed by residue number and insertion code within their chain.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number, insertion_code);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(residue_number, insertion_code, name, chain_id);
            let id = self.residues.insert(residue);
            chain.residues.push(id);
            id
        });

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id`.
    ///
    /// # Return
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        residue.add_atom(atom_id);
        Some(atom_id)
    }

    /// Adds a bond between two atoms. Adding an existing bond is a no-op.
    ///
    /// # Return
    ///
    /// Returns `None` if either atom does not exist.
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId) -> Option<()> {
        if !self.atoms.contains_key(atom1_id) || !self.atoms.contains_key(atom2_id) {
            return None;
        }
        let exists = self
            .bonds
            .iter()
            .any(|bond| bond.contains(atom1_id) && bond.contains(atom2_id));
        if !exists {
            self.bonds.push(Bond::new(atom1_id, atom2_id));
        }
        Some(())
    }

    /// Changes the single-character identifier of a chain.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain does not exist or if another chain already
    /// uses `new_id`.
    pub fn relabel_chain(&mut self, chain_id: ChainId, new_id: char) -> Option<()> {
        if let Some(&holder) = self.chain_id_map.get(&new_id) {
            return (holder == chain_id).then_some(());
        }
        let chain = self.chains.get_mut(chain_id)?;
        self.chain_id_map.remove(&chain.id);
        chain.id = new_id;
        self.chain_id_map.insert(new_id, chain_id);
        Some(())
    }

    /// Applies `f` to the position of every atom.
    pub fn transform_positions(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for atom in self.atoms.values_mut() {
            atom.position = f(&atom.position);
        }
    }

    /// Creates a new system holding copies of the atoms matching `selection`.
    ///
    /// Chains and residues left without atoms are dropped. Bonds are kept
    /// only when both endpoints survive.
    pub fn select(&self, selection: &AtomSelection) -> MolecularSystem {
        self.filtered(|system, atom| system.matches(selection, atom))
    }

    /// Creates a new system holding a copy of a single chain.
    pub fn extract_chain(&self, chain_id: ChainId) -> MolecularSystem {
        self.filtered(|system, atom| system.residues[atom.residue_id].chain_id == chain_id)
    }

    /// Appends copies of all chains, residues, atoms and bonds of `other`.
    ///
    /// Chains of `other` whose identifier already exists in `self` are merged
    /// into the existing chain.
    pub fn append(&mut self, other: &MolecularSystem) {
        self.copy_from(other, |_, _| true);
    }

    fn filtered(&self, keep: impl Fn(&MolecularSystem, &Atom) -> bool) -> MolecularSystem {
        let mut subset = MolecularSystem::new();
        subset.copy_from(self, keep);
        subset
    }

    fn copy_from(
        &mut self,
        source: &MolecularSystem,
        keep: impl Fn(&MolecularSystem, &Atom) -> bool,
    ) {
        let mut id_map: HashMap<AtomId, AtomId> = HashMap::new();

        for (_, chain) in source.chains_iter() {
            for &source_residue_id in &chain.residues {
                let residue = &source.residues[source_residue_id];
                let kept: Vec<_> = residue
                    .atoms
                    .iter()
                    .filter(|&&atom_id| keep(source, &source.atoms[atom_id]))
                    .copied()
                    .collect();
                if kept.is_empty() {
                    continue;
                }

                let chain_id = self.add_chain(chain.id, chain.chain_type);
                let Some(residue_id) = self.add_residue(
                    chain_id,
                    residue.residue_number,
                    residue.insertion_code,
                    &residue.name,
                ) else {
                    continue;
                };
                for source_atom_id in kept {
                    let atom = source.atoms[source_atom_id].clone();
                    if let Some(new_id) = self.add_atom_to_residue(residue_id, atom) {
                        id_map.insert(source_atom_id, new_id);
                    }
                }
            }
        }

        for bond in &source.bonds {
            if let (Some(&a1), Some(&a2)) = (id_map.get(&bond.atom1_id), id_map.get(&bond.atom2_id))
            {
                self.add_bond(a1, a2);
            }
        }
    }

    fn matches(&self, selection: &AtomSelection, atom: &Atom) -> bool {
        let chain_id = self.residues[atom.residue_id].chain_id;
        selection.matches(&self.chains[chain_id], atom)
    }
}
