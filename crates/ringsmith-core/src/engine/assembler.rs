use super::circle_fit::CircleFit;
use super::config::{ConfigError, RingSpec};
use super::error::EngineError;
use super::planner::{Placement, plan, resolve_radius};
use super::progress::{Progress, ProgressReporter};
use crate::core::models::system::MolecularSystem;
use crate::core::selection::AtomSelection;
use crate::core::utils::geometry::{
    calculate_rmsd, calculate_superposition, radial_direction, rotate_about,
    rotation_from_axis_angle, tangential_direction,
};
use nalgebra::Vector3;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("Selection '{selection}' matched no atoms in the {side} structure")]
    EmptySelection {
        selection: String,
        side: &'static str,
    },

    #[error("Selection matched {mobile} atoms in the mobile structure but {reference} in the reference")]
    AtomCountMismatch { mobile: usize, reference: usize },

    #[error("Superposition could not be computed for the selected atoms")]
    Degenerate,
}

/// Rigid-body operations the ring assembler needs from a structure library.
pub trait StructureToolkit: Sync {
    /// Superimposes `mobile` onto `reference` using the atoms matched by
    /// `selection`, paired in file order, and returns the RMSD after fitting.
    fn align(
        &self,
        mobile: &mut MolecularSystem,
        reference: &MolecularSystem,
        selection: &AtomSelection,
    ) -> Result<f64, AlignmentError>;

    /// Rotates `structure` by `angle_deg` about `axis`, where the axis passes
    /// through the structure's own centroid.
    fn rotate(&self, structure: &mut MolecularSystem, angle_deg: f64, axis: &Vector3<f64>);

    fn translate(&self, structure: &mut MolecularSystem, offset: &Vector3<f64>);

    /// Concatenates `parts` into one structure, keeping their order.
    fn merge(&self, parts: &[MolecularSystem]) -> MolecularSystem;
}

/// [`StructureToolkit`] backed by the in-memory [`MolecularSystem`] and a
/// Kabsch superposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigidBodyToolkit;

impl StructureToolkit for RigidBodyToolkit {
    fn align(
        &self,
        mobile: &mut MolecularSystem,
        reference: &MolecularSystem,
        selection: &AtomSelection,
    ) -> Result<f64, AlignmentError> {
        let mobile_points = mobile.selected_positions(selection);
        let reference_points = reference.selected_positions(selection);
        if mobile_points.is_empty() {
            return Err(AlignmentError::EmptySelection {
                selection: selection.to_string(),
                side: "mobile",
            });
        }
        if reference_points.is_empty() {
            return Err(AlignmentError::EmptySelection {
                selection: selection.to_string(),
                side: "reference",
            });
        }
        if mobile_points.len() != reference_points.len() {
            return Err(AlignmentError::AtomCountMismatch {
                mobile: mobile_points.len(),
                reference: reference_points.len(),
            });
        }

        let (rotation, translation) = calculate_superposition(&mobile_points, &reference_points)
            .ok_or(AlignmentError::Degenerate)?;
        mobile.transform_positions(|p| rotation * p + translation);

        calculate_rmsd(&mobile.selected_positions(selection), &reference_points)
            .ok_or(AlignmentError::Degenerate)
    }

    fn rotate(&self, structure: &mut MolecularSystem, angle_deg: f64, axis: &Vector3<f64>) {
        if axis.norm_squared() == 0.0 {
            return;
        }
        let Some(pivot) = structure.centroid() else {
            return;
        };
        let rotation = rotation_from_axis_angle(axis, angle_deg);
        structure.transform_positions(|p| rotate_about(p, &pivot, &rotation));
    }

    fn translate(&self, structure: &mut MolecularSystem, offset: &Vector3<f64>) {
        structure.transform_positions(|p| p + offset);
    }

    fn merge(&self, parts: &[MolecularSystem]) -> MolecularSystem {
        let mut merged = MolecularSystem::new();
        for part in parts {
            merged.append(part);
        }
        merged
    }
}

/// The merged ring together with the geometry it was built from.
#[derive(Debug, Clone)]
pub struct AssembledRing {
    pub structure: MolecularSystem,
    pub placements: Vec<Placement>,
    pub radius: f64,
}

pub struct RingAssembler<'a, T: StructureToolkit> {
    toolkit: &'a T,
    alignment_selection: AtomSelection,
}

impl<'a, T: StructureToolkit> RingAssembler<'a, T> {
    pub fn new(toolkit: &'a T, alignment_selection: AtomSelection) -> Self {
        Self {
            toolkit,
            alignment_selection,
        }
    }

    /// Places one copy of `monomer` according to `placement`.
    ///
    /// The copy is aligned onto `target`, spun by the placement's z angle,
    /// moved so its xy centroid lands on the target position, then rotated
    /// about the radial and tangential axes derived from where it actually
    /// ended up. Finally its chain is relabelled.
    pub fn place_subunit(
        &self,
        monomer: &MolecularSystem,
        target: &MolecularSystem,
        placement: &Placement,
        ring: &RingSpec,
    ) -> Result<MolecularSystem, EngineError> {
        let index = placement.index;
        let mut subunit = monomer.clone();

        let rmsd = self
            .toolkit
            .align(&mut subunit, target, &self.alignment_selection)
            .map_err(|source| alignment_error(index, source))?;

        self.toolkit
            .rotate(&mut subunit, placement.z_angle_deg, &Vector3::z());

        let centroid = subunit.centroid().ok_or(ConfigError::EmptySelection {
            selection: AtomSelection::All.to_string(),
            context: "monomer",
        })?;
        self.toolkit
            .translate(&mut subunit, &Vector3::new(-centroid.x, -centroid.y, 0.0));
        self.toolkit
            .translate(&mut subunit, &placement.target_position.coords);

        let live_centroid = subunit
            .centroid()
            .ok_or_else(|| EngineError::Internal("subunit lost its atoms".into()))?;
        let radial_axis = radial_direction(&live_centroid).ok_or(EngineError::GeometryDegeneracy {
            index,
            axis: "radial",
        })?;
        self.toolkit
            .rotate(&mut subunit, ring.xy_rotation_deg, &radial_axis);

        let tangential_axis =
            tangential_direction(&radial_axis).ok_or(EngineError::GeometryDegeneracy {
                index,
                axis: "tangential",
            })?;
        self.toolkit
            .rotate(&mut subunit, ring.tilt_deg, &tangential_axis);

        let chain = subunit
            .first_chain()
            .ok_or_else(|| EngineError::Internal("subunit has no chain".into()))?;
        subunit
            .relabel_chain(chain, placement.chain_id)
            .ok_or_else(|| {
                EngineError::Internal(format!(
                    "chain label '{}' already used within subunit {}",
                    placement.chain_id, index
                ))
            })?;

        debug!(
            index,
            chain = %placement.chain_id,
            alignment_rmsd = rmsd,
            "Subunit placed."
        );
        Ok(subunit)
    }

    /// Places every subunit, in parallel when the `parallel` feature is on.
    ///
    /// The copies are aligned onto the first chain of `reference`. Results
    /// are returned in placement order regardless of scheduling.
    pub fn place_subunits(
        &self,
        monomer: &MolecularSystem,
        reference: &MolecularSystem,
        placements: &[Placement],
        ring: &RingSpec,
        reporter: &ProgressReporter,
    ) -> Result<Vec<MolecularSystem>, EngineError> {
        let target = reference
            .first_chain()
            .map(|chain| reference.extract_chain(chain))
            .ok_or(ConfigError::EmptySelection {
                selection: AtomSelection::All.to_string(),
                context: "reference structure",
            })?;

        reporter.report(Progress::TaskStart {
            total_steps: placements.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = placements.iter();

        #[cfg(feature = "parallel")]
        let iterator = placements.par_iter();

        let results: Vec<Result<MolecularSystem, EngineError>> = iterator
            .map(|placement| {
                let result = self.place_subunit(monomer, &target, placement, ring);
                reporter.report(Progress::TaskIncrement);
                result
            })
            .collect();

        reporter.report(Progress::TaskFinish);
        results.into_iter().collect()
    }

    pub fn merge(&self, subunits: &[MolecularSystem]) -> MolecularSystem {
        self.toolkit.merge(subunits)
    }

    /// Plans, places and merges the whole ring.
    #[instrument(skip_all, name = "ring_assembly", fields(subunits = ring.subunit_count))]
    pub fn assemble(
        &self,
        monomer: &MolecularSystem,
        reference: &MolecularSystem,
        ring: &RingSpec,
        circle: &CircleFit,
        reporter: &ProgressReporter,
    ) -> Result<AssembledRing, EngineError> {
        let placements = plan(ring, circle)?;
        let radius = resolve_radius(ring, circle);
        info!(radius, "Placing {} subunits.", placements.len());

        let subunits = self.place_subunits(monomer, reference, &placements, ring, reporter)?;
        let structure = self.merge(&subunits);

        Ok(AssembledRing {
            structure,
            placements,
            radius,
        })
    }
}

fn alignment_error(index: usize, source: AlignmentError) -> EngineError {
    match source {
        AlignmentError::EmptySelection { selection, side } => {
            EngineError::Configuration(ConfigError::EmptySelection {
                selection,
                context: if side == "mobile" {
                    "monomer"
                } else {
                    "reference structure"
                },
            })
        }
        other => EngineError::Alignment {
            index,
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, AtomRole};
    use crate::core::models::chain::ChainType;
    use crate::core::utils::geometry::centroid;
    use nalgebra::Point3;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Align,
        Rotate { angle: f64, axis: Vector3<f64> },
        Translate { offset: Vector3<f64> },
        Merge { parts: usize },
    }

    #[derive(Default)]
    struct RecordingToolkit {
        inner: RigidBodyToolkit,
        ops: Mutex<Vec<Op>>,
    }

    impl RecordingToolkit {
        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }
    }

    impl StructureToolkit for RecordingToolkit {
        fn align(
            &self,
            mobile: &mut MolecularSystem,
            reference: &MolecularSystem,
            selection: &AtomSelection,
        ) -> Result<f64, AlignmentError> {
            self.ops.lock().unwrap().push(Op::Align);
            self.inner.align(mobile, reference, selection)
        }

        fn rotate(&self, structure: &mut MolecularSystem, angle_deg: f64, axis: &Vector3<f64>) {
            self.ops.lock().unwrap().push(Op::Rotate {
                angle: angle_deg,
                axis: *axis,
            });
            self.inner.rotate(structure, angle_deg, axis);
        }

        fn translate(&self, structure: &mut MolecularSystem, offset: &Vector3<f64>) {
            self.ops
                .lock()
                .unwrap()
                .push(Op::Translate { offset: *offset });
            self.inner.translate(structure, offset);
        }

        fn merge(&self, parts: &[MolecularSystem]) -> MolecularSystem {
            self.ops.lock().unwrap().push(Op::Merge { parts: parts.len() });
            self.inner.merge(parts)
        }
    }

    fn build_chain(system: &mut MolecularSystem, id: char, offset: Vector3<f64>) {
        let chain_id = system.add_chain(id, ChainType::Protein);
        let backbone = [
            [
                ("N", [0.0, 0.0, 0.0]),
                ("CA", [1.46, 0.0, 0.0]),
                ("C", [2.0, 1.4, 0.0]),
            ],
            [
                ("N", [3.3, 1.6, 0.4]),
                ("CA", [3.9, 2.9, 0.6]),
                ("C", [5.4, 2.8, 1.1]),
            ],
            [
                ("N", [6.0, 4.0, 1.3]),
                ("CA", [7.4, 4.1, 2.2]),
                ("C", [7.9, 5.6, 2.0]),
            ],
        ];
        for (number, atoms) in backbone.iter().enumerate() {
            let residue_id = system
                .add_residue(chain_id, number as isize + 1, None, "ALA")
                .unwrap();
            for (name, [x, y, z]) in atoms {
                let mut atom = Atom::new(name, residue_id, Point3::new(*x, *y, *z) + offset);
                atom.role = AtomRole::Backbone;
                system.add_atom_to_residue(residue_id, atom).unwrap();
            }
        }
    }

    fn monomer() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        build_chain(&mut system, 'A', Vector3::new(18.0, 2.0, -3.0));
        system
    }

    fn reference() -> MolecularSystem {
        let mut system = monomer();
        build_chain(&mut system, 'B', Vector3::new(-18.0, -2.0, 3.0));
        system
    }

    fn placement(index: usize, ring: &RingSpec, radius: f64) -> Placement {
        plan(ring, &CircleFit::user_supplied(radius)).unwrap()[index].clone()
    }

    fn chain_centroids(structure: &MolecularSystem) -> Vec<(char, Point3<f64>)> {
        structure
            .chains_iter()
            .map(|(chain_id, chain)| {
                let positions = structure.extract_chain(chain_id).positions();
                (chain.id, centroid(&positions).unwrap())
            })
            .collect()
    }

    #[test]
    fn operations_follow_align_rotate_translate_rotate_rotate_order() {
        let mut ring = RingSpec::new(4);
        ring.xy_rotation_deg = 20.0;
        ring.tilt_deg = 5.0;
        let toolkit = RecordingToolkit::default();
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        let target = monomer();
        let placement = placement(1, &ring, 10.0);

        assembler
            .place_subunit(&monomer(), &target, &placement, &ring)
            .unwrap();
        let ops = toolkit.ops();

        assert_eq!(ops.len(), 6);
        assert_eq!(ops[0], Op::Align);
        assert_eq!(
            ops[1],
            Op::Rotate {
                angle: 90.0,
                axis: Vector3::z()
            }
        );
        let Op::Translate { offset: to_origin } = &ops[2] else {
            panic!("expected translation to origin, got {:?}", ops[2]);
        };
        assert_eq!(to_origin.z, 0.0);
        let Op::Translate { offset: to_target } = &ops[3] else {
            panic!("expected translation to target, got {:?}", ops[3]);
        };
        assert!((to_target - Vector3::new(0.0, 10.0, 0.0)).norm() < 1e-9);
        let Op::Rotate { angle, axis } = &ops[4] else {
            panic!("expected radial rotation, got {:?}", ops[4]);
        };
        assert_eq!(*angle, 20.0);
        assert!((axis - Vector3::y()).norm() < 1e-9);
        let Op::Rotate { angle, axis } = &ops[5] else {
            panic!("expected tangential rotation, got {:?}", ops[5]);
        };
        assert_eq!(*angle, 5.0);
        assert!((axis - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn placed_subunits_sit_on_the_ring_in_chain_order() {
        let mut ring = RingSpec::new(5);
        ring.z_rotation_deg = 10.0;
        ring.xy_rotation_deg = 35.0;
        ring.tilt_deg = -12.0;
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);

        let assembled = assembler
            .assemble(
                &monomer(),
                &reference(),
                &ring,
                &CircleFit::user_supplied(15.0),
                &ProgressReporter::new(),
            )
            .unwrap();

        assert_eq!(assembled.structure.atom_count(), 5 * 9);
        assert_eq!(assembled.placements.len(), 5);
        assert_eq!(assembled.radius, 15.0);

        let centroids = chain_centroids(&assembled.structure);
        let labels: String = centroids.iter().map(|(id, _)| *id).collect();
        assert_eq!(labels, "ABCDE");
        for ((_, c), placement) in centroids.iter().zip(&assembled.placements) {
            let xy_distance = (c.x * c.x + c.y * c.y).sqrt();
            assert!((xy_distance - 15.0).abs() < 1e-9);
            assert!((c.x - placement.target_position.x).abs() < 1e-9);
            assert!((c.y - placement.target_position.y).abs() < 1e-9);
        }
    }

    #[test]
    fn subunits_are_rotated_copies_of_each_other() {
        let ring = RingSpec::new(3);
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        let placements = plan(&ring, &CircleFit::user_supplied(12.0)).unwrap();

        let subunits = assembler
            .place_subunits(
                &monomer(),
                &reference(),
                &placements,
                &ring,
                &ProgressReporter::new(),
            )
            .unwrap();

        let spin = rotation_from_axis_angle(&Vector3::z(), 120.0);
        let first = subunits[0].positions();
        let second = subunits[1].positions();
        let rotated: Vec<_> = first.iter().map(|p| spin * p).collect();
        assert!(calculate_rmsd(&rotated, &second).unwrap() < 1e-9);
    }

    #[test]
    fn parallel_and_sequential_placement_agree() {
        let mut ring = RingSpec::new(8);
        ring.xy_rotation_deg = 7.0;
        ring.tilt_deg = 3.0;
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        let placements = plan(&ring, &CircleFit::user_supplied(25.0)).unwrap();
        let reference = reference();
        let target = reference.extract_chain(reference.first_chain().unwrap());

        let batched = assembler
            .place_subunits(
                &monomer(),
                &reference,
                &placements,
                &ring,
                &ProgressReporter::new(),
            )
            .unwrap();
        let sequential: Vec<_> = placements
            .iter()
            .map(|p| assembler.place_subunit(&monomer(), &target, p, &ring).unwrap())
            .collect();

        for (a, b) in batched.iter().zip(&sequential) {
            assert_eq!(a.positions(), b.positions());
        }
    }

    #[test]
    fn merge_is_called_once_with_all_subunits() {
        let toolkit = RecordingToolkit::default();
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        assembler
            .assemble(
                &monomer(),
                &reference(),
                &RingSpec::new(3),
                &CircleFit::user_supplied(9.0),
                &ProgressReporter::new(),
            )
            .unwrap();

        let ops = toolkit.ops();
        assert_eq!(ops.last(), Some(&Op::Merge { parts: 3 }));
        assert_eq!(ops.iter().filter(|op| **op == Op::Align).count(), 3);
    }

    #[test]
    fn progress_reports_one_increment_per_subunit() {
        let increments = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement = event {
                *increments.lock().unwrap() += 1;
            }
        }));
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        assembler
            .assemble(
                &monomer(),
                &reference(),
                &RingSpec::new(6),
                &CircleFit::user_supplied(20.0),
                &reporter,
            )
            .unwrap();
        drop(reporter);
        assert_eq!(increments.into_inner().unwrap(), 6);
    }

    #[test]
    fn placement_on_ring_center_is_degenerate() {
        let ring = RingSpec::new(2);
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::AlphaCarbons);
        let mut placement = placement(1, &ring, 10.0);
        placement.target_position = Point3::origin();

        let err = assembler
            .place_subunit(&monomer(), &monomer(), &placement, &ring)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::GeometryDegeneracy {
                index: 1,
                axis: "radial"
            }
        ));
    }

    #[test]
    fn align_superimposes_moved_copy_onto_reference() {
        let reference = monomer();
        let mut mobile = monomer();
        let rotation = rotation_from_axis_angle(&Vector3::new(0.3, 1.0, -0.2), 64.0);
        mobile.transform_positions(|p| rotation * p + Vector3::new(5.0, -9.0, 2.0));

        let rmsd = RigidBodyToolkit
            .align(&mut mobile, &reference, &AtomSelection::AlphaCarbons)
            .unwrap();

        assert!(rmsd < 1e-9);
        assert!(calculate_rmsd(&mobile.positions(), &reference.positions()).unwrap() < 1e-9);
    }

    #[test]
    fn align_reports_mismatched_and_empty_selections() {
        let mut mobile = monomer();
        let reference = reference();
        assert_eq!(
            RigidBodyToolkit.align(&mut mobile, &reference, &AtomSelection::AlphaCarbons),
            Err(AlignmentError::AtomCountMismatch {
                mobile: 3,
                reference: 6
            })
        );
        assert!(matches!(
            RigidBodyToolkit.align(&mut mobile, &reference, &AtomSelection::Chain('Z')),
            Err(AlignmentError::EmptySelection { side: "mobile", .. })
        ));
    }

    #[test]
    fn empty_alignment_selection_surfaces_as_configuration_error() {
        let ring = RingSpec::new(2);
        let toolkit = RigidBodyToolkit;
        let assembler = RingAssembler::new(&toolkit, AtomSelection::Chain('Z'));
        let err = assembler
            .place_subunit(&monomer(), &monomer(), &placement(0, &ring, 10.0), &ring)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigError::EmptySelection {
                context: "monomer",
                ..
            })
        ));
    }

    #[test]
    fn rotate_spins_about_the_structure_centroid() {
        let mut structure = monomer();
        let before = structure.centroid().unwrap();
        let positions_before = structure.positions();

        RigidBodyToolkit.rotate(&mut structure, 90.0, &Vector3::x());

        let after = structure.centroid().unwrap();
        assert!((after - before).norm() < 1e-9);
        for (p_before, p_after) in positions_before.iter().zip(structure.positions()) {
            let d_before = p_before - before;
            let d_after = p_after - after;
            assert!((d_after - Vector3::new(d_before.x, -d_before.z, d_before.y)).norm() < 1e-9);
        }
    }
}
