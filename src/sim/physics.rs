//! Rigid-body substrate backed by rapier2d
//!
//! `PhysicsWorld` owns the rapier sets, the well walls and the mapping between
//! piece ids and rapier handles. Each step:
//!
//! 1. rapier advances the world by the fixed `PHYSICS_DT`.
//! 2. Collision-start events are collected and mapped back to piece ids.
//! 3. Pairs are sorted by (min, max) id so callers see a stable order.
//!
//! Pending and settled pieces live in disjoint collision groups: a pending piece
//! only interacts with walls, so it can never touch (or merge with) the stack.

use std::collections::HashMap;

use glam::Vec2;
use rapier2d::prelude::*;

use super::registry::PieceId;
use crate::consts::PHYSICS_DT;
use crate::tuning::{BodyMaterial, PhysicsTuning, WellTuning};

/// Collision group of the floor and side walls
pub const WALL_GROUP: Group = Group::GROUP_1;
/// Collision group of dropped and merge-created pieces
pub const SETTLED_GROUP: Group = Group::GROUP_2;
/// Collision group of the piece following the pointer
pub const PENDING_GROUP: Group = Group::GROUP_3;

/// Rounded corner radius as a fraction of piece width
const CHAMFER_RATIO: f32 = 0.25;

/// How a piece body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Kinematic, follows the pointer, collides with walls only
    Pending,
    /// Dynamic, gravity-affected, collides with walls and other settled pieces
    Settled,
}

impl BodyKind {
    fn groups(self) -> InteractionGroups {
        match self {
            BodyKind::Pending => InteractionGroups::new(PENDING_GROUP, WALL_GROUP),
            BodyKind::Settled => InteractionGroups::new(SETTLED_GROUP, WALL_GROUP | SETTLED_GROUP),
        }
    }

    /// rapier skips kinematic-vs-fixed pairs unless asked
    fn collision_types(self) -> ActiveCollisionTypes {
        match self {
            BodyKind::Pending => {
                ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_FIXED
            }
            BodyKind::Settled => ActiveCollisionTypes::default(),
        }
    }
}

/// Snapshot of a body's transform and velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    /// Radians
    pub rotation: f32,
    /// Units per second
    pub linvel: Vec2,
    /// Radians per second
    pub angvel: f32,
}

impl BodyState {
    /// Linear speed in units per physics step
    pub fn speed_per_step(&self) -> f32 {
        self.linvel.length() * PHYSICS_DT
    }

    /// Angular speed in radians per physics step
    pub fn angular_speed_per_step(&self) -> f32 {
        self.angvel.abs() * PHYSICS_DT
    }
}

/// Two pieces that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: PieceId,
    pub b: PieceId,
}

impl CollisionPair {
    pub fn new(a: PieceId, b: PieceId) -> Self {
        Self { a, b }
    }

    /// Order-independent identity of the pair
    pub fn key(&self) -> (PieceId, PieceId) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

#[derive(Debug, Clone, Copy)]
struct PieceHandles {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// rapier world plus piece bookkeeping
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pieces: HashMap<PieceId, PieceHandles>,
    collider_to_piece: HashMap<ColliderHandle, PieceId>,
}

impl PhysicsWorld {
    /// Create an empty well: floor plus two side walls
    pub fn new(well: &WellTuning, physics: &PhysicsTuning) -> Self {
        let integration_params = IntegrationParameters {
            dt: PHYSICS_DT,
            length_unit: physics.length_unit,
            ..IntegrationParameters::default()
        };

        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, physics.gravity],
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pieces: HashMap::new(),
            collider_to_piece: HashMap::new(),
        };

        let t = well.wall_thickness;
        // Floor, flush with well.height
        world.add_wall(
            Vec2::new(well.width / 2.0, well.height + t / 2.0),
            Vec2::new(well.width / 2.0, t / 2.0),
            physics.floor_friction,
            physics.floor_restitution,
        );
        // Left and right walls
        for x in [-t / 2.0, well.width + t / 2.0] {
            world.add_wall(
                Vec2::new(x, well.height / 2.0),
                Vec2::new(t / 2.0, well.height / 2.0),
                physics.wall_friction,
                physics.wall_restitution,
            );
        }

        world
    }

    fn add_wall(&mut self, center: Vec2, half_extents: Vec2, friction: f32, restitution: f32) {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center.x, center.y])
            .build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .friction(friction)
            .restitution(restitution)
            .collision_groups(InteractionGroups::new(WALL_GROUP, Group::ALL))
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
    }

    /// Create a rounded-box body for a piece. No-op if the id is already present.
    pub fn insert_piece(
        &mut self,
        id: PieceId,
        position: Vec2,
        size: Vec2,
        material: &BodyMaterial,
        kind: BodyKind,
    ) {
        if self.pieces.contains_key(&id) {
            return;
        }

        let builder = match kind {
            BodyKind::Pending => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Settled => RigidBodyBuilder::dynamic(),
        };
        let mut builder = builder
            .translation(vector![position.x, position.y])
            .linear_damping(material.linear_damping)
            .ccd_enabled(true)
            .can_sleep(false);
        if material.lock_rotations {
            builder = builder.lock_rotations();
        }
        let body = self.rigid_body_set.insert(builder.build());

        let border = size.x * CHAMFER_RATIO;
        let collider = ColliderBuilder::round_cuboid(
            (size.x / 2.0 - border).max(0.0),
            (size.y / 2.0 - border).max(0.0),
            border,
        )
        .restitution(material.restitution)
        .friction(material.friction)
        .density(material.density)
        .collision_groups(kind.groups())
        .active_collision_types(kind.collision_types())
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        self.pieces.insert(id, PieceHandles { body, collider });
        self.collider_to_piece.insert(collider, id);
    }

    /// Remove a piece body and its collider. Returns false if unknown.
    pub fn remove_piece(&mut self, id: PieceId) -> bool {
        let Some(handles) = self.pieces.remove(&id) else {
            return false;
        };
        self.collider_to_piece.remove(&handles.collider);
        self.rigid_body_set.remove(
            handles.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
        true
    }

    /// Teleport a body (used for the pointer-following piece)
    pub fn set_position(&mut self, id: PieceId, position: Vec2) {
        let Some(handles) = self.pieces.get(&id) else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(handles.body) {
            let translation = vector![position.x, position.y];
            rb.set_translation(translation, true);
            if rb.is_kinematic() {
                rb.set_next_kinematic_translation(translation);
            }
        }
    }

    /// Turn a pending body into a settled one: dynamic, settled collision group,
    /// given initial velocity and no spin.
    pub fn settle(&mut self, id: PieceId, initial_velocity: Vec2) -> bool {
        let Some(handles) = self.pieces.get(&id).copied() else {
            return false;
        };
        let Some(rb) = self.rigid_body_set.get_mut(handles.body) else {
            return false;
        };
        rb.set_body_type(RigidBodyType::Dynamic, true);
        rb.set_linvel(vector![initial_velocity.x, initial_velocity.y], true);
        rb.set_angvel(0.0, true);

        if let Some(collider) = self.collider_set.get_mut(handles.collider) {
            collider.set_collision_groups(BodyKind::Settled.groups());
        }
        true
    }

    /// Advance the world by one fixed step.
    ///
    /// Returns the piece pairs whose contact started during this step, sorted by
    /// (min, max) id. Contacts with walls are not reported.
    pub fn step(&mut self) -> Vec<CollisionPair> {
        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None, // query pipeline (unused)
            &(),  // physics hooks
            &event_handler,
        );

        let mut pairs = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_to_piece.get(&h1).copied();
                let b = self.collider_to_piece.get(&h2).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    pairs.push(CollisionPair::new(a, b));
                }
            }
        }

        // Channel delivery order is not guaranteed; keep merges reproducible
        pairs.sort_by_key(CollisionPair::key);
        pairs
    }

    /// Current transform and velocities of a piece body
    pub fn body_state(&self, id: PieceId) -> Option<BodyState> {
        let handles = self.pieces.get(&id)?;
        let rb = self.rigid_body_set.get(handles.body)?;
        let t = rb.translation();
        let v = rb.linvel();
        Some(BodyState {
            position: Vec2::new(t.x, t.y),
            rotation: rb.rotation().angle(),
            linvel: Vec2::new(v.x, v.y),
            angvel: rb.angvel(),
        })
    }

    pub fn has_piece(&self, id: PieceId) -> bool {
        self.pieces.contains_key(&id)
    }

    /// Number of piece bodies (walls excluded)
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Number of rapier bodies, walls included
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}
