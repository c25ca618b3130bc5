// SPDX-License-Identifier: MPL-2.0

//! A two-stage, Falcon-style rocket assembled from primitives.
//!
//! The rocket is a small hierarchy of [transform nodes](Node). Each movable part (stages, landing
//! legs, grid fins, fairing halves, payload, and solar wings) hangs off its own node so that it
//! can be posed independently. The pose setters take a normalized amount in `[0, 1]`.

use std::{f32::consts::{FRAC_PI_2, PI}, rc::Rc};

use crate::{
    linear::{Quat, Vec3},
    primitives, Material, Mesh, Node, Object,
};

const RADIUS: f32 = 0.18;
const FIRST_STAGE_HEIGHT: f32 = 4.2;
const INTERSTAGE_HEIGHT: f32 = 0.35;
const SECOND_STAGE_HEIGHT: f32 = 1.1;
const FAIRING_RADIUS: f32 = 0.26;
const FAIRING_BODY_HEIGHT: f32 = 0.9;
const FAIRING_NOSE_HEIGHT: f32 = 0.55;
const LEG_LENGTH: f32 = 1.1;
/// How far a fully deployed leg swings away from the stage.
const LEG_DEPLOYED_ANGLE: f32 = 2.4;
const SEGMENTS: u32 = 16;

const WHITE: Vec3 = Vec3::new(0.92, 0.92, 0.9);
const CHARCOAL: Vec3 = Vec3::new(0.08, 0.08, 0.09);
const STEEL: Vec3 = Vec3::new(0.55, 0.56, 0.6);
const GOLD: Vec3 = Vec3::new(0.85, 0.65, 0.2);
const CELL_BLUE: Vec3 = Vec3::new(0.1, 0.2, 0.55);

/// A built rocket: its part groups and the objects to render.
#[derive(Clone, Debug)]
pub struct Rocket {
    pub root: Rc<Node>,
    pub first_stage: Rc<Node>,
    pub second_stage: Rc<Node>,
    /// Leg hinges, placed at the base of the first stage.
    pub legs: Vec<Rc<Node>>,
    /// Fin hinges, placed at the top of the first stage.
    pub grid_fins: Vec<Rc<Node>>,
    /// The two fairing halves, +X first.
    pub fairing: [Rc<Node>; 2],
    pub satellite: Rc<Node>,
    pub solar_wings: [Rc<Node>; 2],
    objects: Vec<Object>,
}

impl Rocket {
    /// Builds a rocket standing on the origin.
    pub fn build() -> Self {
        let mut parts = Parts::default();

        let root = Node::root();
        let first_stage = Node::child_of(&root);
        let second_stage = Node::child_at(&root, Vec3::new(0., FIRST_STAGE_HEIGHT, 0.));

        parts.add(
            &Node::child_at(&first_stage, Vec3::new(0., FIRST_STAGE_HEIGHT * 0.5, 0.)),
            primitives::cylinder(RADIUS, RADIUS, FIRST_STAGE_HEIGHT, SEGMENTS),
            WHITE,
        );
        parts.add(
            &Node::child_at(&first_stage, Vec3::new(0., -0.08, 0.)),
            primitives::cylinder(RADIUS * 0.9, RADIUS * 1.05, 0.16, SEGMENTS),
            CHARCOAL,
        );

        let legs = (0..4)
            .map(|i| {
                let azimuth = FRAC_PI_2 * i as f32 + PI / 4.;
                let outward = Vec3::new(azimuth.sin(), 0., azimuth.cos());
                let hinge = Node::child_at(&first_stage, outward * RADIUS + Vec3::new(0., 0.05, 0.));
                parts.add(
                    &Node::child_at(&hinge, Vec3::new(0., LEG_LENGTH * 0.5, 0.)),
                    primitives::cuboid(Vec3::new(0.06, LEG_LENGTH, 0.06)),
                    CHARCOAL,
                );
                hinge
            })
            .collect();

        let grid_fins = (0..4)
            .map(|i| {
                let azimuth = FRAC_PI_2 * i as f32;
                let outward = Vec3::new(azimuth.sin(), 0., azimuth.cos());
                let hinge = Node::child_at(
                    &first_stage,
                    outward * RADIUS + Vec3::new(0., FIRST_STAGE_HEIGHT - 0.2, 0.),
                );
                hinge.set_rotation(Quat::from_rotation_y(azimuth));
                parts.add(
                    &Node::child_at(&hinge, Vec3::new(0., 0., 0.05)),
                    primitives::cuboid(Vec3::new(0.16, 0.14, 0.02)),
                    STEEL,
                );
                hinge
            })
            .collect();

        parts.add(
            &Node::child_at(&second_stage, Vec3::new(0., INTERSTAGE_HEIGHT * 0.5, 0.)),
            primitives::cylinder(RADIUS, RADIUS, INTERSTAGE_HEIGHT, SEGMENTS),
            CHARCOAL,
        );
        parts.add(
            &Node::child_at(
                &second_stage,
                Vec3::new(0., INTERSTAGE_HEIGHT + SECOND_STAGE_HEIGHT * 0.5, 0.),
            ),
            primitives::cylinder(RADIUS, RADIUS, SECOND_STAGE_HEIGHT, SEGMENTS),
            WHITE,
        );

        let payload_base = INTERSTAGE_HEIGHT + SECOND_STAGE_HEIGHT;
        let satellite = Node::child_at(&second_stage, Vec3::new(0., payload_base + 0.3, 0.));
        parts.add(&satellite, primitives::cuboid(Vec3::new(0.24, 0.4, 0.24)), GOLD);
        let solar_wings = [1., -1.].map(|side: f32| {
            let wing = Node::child_at(&satellite, Vec3::new(side * 0.12, 0., 0.));
            parts.add(
                &Node::child_at(&wing, Vec3::new(side * 0.3, 0., 0.)),
                primitives::cuboid(Vec3::new(0.6, 0.3, 0.01)),
                CELL_BLUE,
            );
            wing
        });

        let fairing = [0., PI].map(|start| {
            let half = Node::child_at(&second_stage, Vec3::new(0., payload_base, 0.));
            parts.add(
                &Node::child_at(&half, Vec3::new(0., FAIRING_BODY_HEIGHT * 0.5, 0.)),
                primitives::cylinder_sector(
                    FAIRING_RADIUS,
                    FAIRING_RADIUS,
                    FAIRING_BODY_HEIGHT,
                    SEGMENTS / 2,
                    start,
                    PI,
                ),
                WHITE,
            );
            parts.add(
                &Node::child_at(
                    &half,
                    Vec3::new(0., FAIRING_BODY_HEIGHT + FAIRING_NOSE_HEIGHT * 0.5, 0.),
                ),
                primitives::cylinder_sector(
                    0.,
                    FAIRING_RADIUS,
                    FAIRING_NOSE_HEIGHT,
                    SEGMENTS / 2,
                    start,
                    PI,
                ),
                WHITE,
            );
            half
        });

        let mut rocket = Self {
            root,
            first_stage,
            second_stage,
            legs,
            grid_fins,
            fairing,
            satellite,
            solar_wings,
            objects: parts.objects,
        };
        rocket.reset();
        tracing::debug!(objects = rocket.objects.len(), "built rocket");

        rocket
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Returns every part to its stowed pose.
    pub fn reset(&mut self) {
        self.root.set_position(Vec3::ZERO);
        self.root.set_rotation(Quat::IDENTITY);
        self.first_stage.set_position(Vec3::ZERO);
        self.second_stage
            .set_position(Vec3::new(0., FIRST_STAGE_HEIGHT, 0.));
        self.deploy_legs(0.);
        self.deploy_grid_fins(0.);
        self.open_fairing(0.);
        self.extend_solar_wings(0.);
    }

    /// Swings the landing legs out and down from the base of the first stage.
    pub fn deploy_legs(&self, amount: f32) {
        let angle = LEG_DEPLOYED_ANGLE * amount.clamp(0., 1.);
        for hinge in &self.legs {
            let position = hinge.position();
            let outward = Vec3::new(position.x, 0., position.z).normalize_or_zero();
            let axis = Vec3::Y.cross(outward).normalize_or_zero();
            hinge.set_rotation(Quat::from_axis_angle(axis, angle));
        }
    }

    /// Tilts the grid fins from flush against the stage to straight out.
    pub fn deploy_grid_fins(&self, amount: f32) {
        let tilt = FRAC_PI_2 * amount.clamp(0., 1.);
        for hinge in &self.grid_fins {
            let position = hinge.position();
            let azimuth = position.x.atan2(position.z);
            hinge.set_rotation(Quat::from_rotation_y(azimuth) * Quat::from_rotation_x(FRAC_PI_2 - tilt));
        }
    }

    /// Pushes the second stage `distance` units above its mounted position.
    pub fn separate_stages(&self, distance: f32) {
        self.second_stage
            .set_position(Vec3::new(0., FIRST_STAGE_HEIGHT + distance.max(0.), 0.));
    }

    /// Hinges the fairing halves away from the payload.
    pub fn open_fairing(&self, amount: f32) {
        let amount = amount.clamp(0., 1.);
        for (half, side) in self.fairing.iter().zip([1f32, -1.]) {
            half.set_rotation(Quat::from_rotation_z(-side * 0.6 * amount));
            half.set_position(Vec3::new(
                side * 0.4 * amount,
                INTERSTAGE_HEIGHT + SECOND_STAGE_HEIGHT,
                0.,
            ));
        }
    }

    /// Unfolds the solar wings from stowed slivers to full panels.
    pub fn extend_solar_wings(&self, amount: f32) {
        let scale = 0.05 + 0.95 * amount.clamp(0., 1.);
        for wing in &self.solar_wings {
            wing.set_scale(Vec3::new(scale, 1., 1.));
        }
    }
}

#[derive(Default)]
struct Parts {
    objects: Vec<Object>,
}

impl Parts {
    fn add(&mut self, node: &Rc<Node>, mesh: Mesh, color: Vec3) {
        self.objects
            .push(Object::new(node.clone(), Rc::new(mesh), Material::basic(color)));
    }
}
