//! The services a tree drives on its owner.
//!
//! Nodes never touch the world directly.  Everything they do to their owner
//! (move, swing, shoot, animate) goes through [`AgentActions`], implemented
//! by whoever hosts the agent.  Only the steering accessors and
//! [`entities`][AgentActions::entities] are required; the presentation hooks
//! default to doing nothing so a headless host can ignore them.

use hz_core::{Color, EntityId, EntityLocator, Vec3};
use hz_steering::SteeringController;

/// Value written to an animation parameter.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum AnimParam {
    Bool(bool),
    Float(f32),
    Int(i32),
    Trigger,
}

/// Arc settings for a lobbed shot.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ArcShot {
    /// Apex height above the muzzle.
    pub peak_height_offset: f32,
    /// Uniform jitter applied to the apex height per projectile.
    pub peak_random:        f32,
}

/// One `Shoot` request.
#[derive(Clone, PartialEq, Debug)]
pub struct ShotRequest {
    pub target:             Vec3,
    /// Projectile prefab name; `None` keeps whatever the shooter had.
    pub projectile:         Option<String>,
    pub num_shots:          i32,
    /// Seconds before projectiles self-destruct; negative means never.
    pub destroy_after_time: f32,
    /// Cone in degrees the shots are spread over.
    pub spread:             f32,
    pub arc:                Option<ArcShot>,
}

pub trait AgentActions {
    fn steering(&self) -> &SteeringController;

    fn steering_mut(&mut self) -> &mut SteeringController;

    /// Positions of other entities, for blackboard entity references.
    fn entities(&self) -> &dyn EntityLocator;

    /// Head offset of a sensable entity, if it has one.
    fn head_offset(&self, _entity: EntityId) -> Option<Vec3> {
        None
    }

    /// Whether a ray from `origin` along `dir` hits level geometry within
    /// `max_dist`.
    fn is_blocked(&self, _origin: Vec3, _dir: Vec3, _max_dist: f32) -> bool {
        false
    }

    /// Nearest walkable point within `max_dist` of `near`.
    fn sample_walkable(&self, _near: Vec3, _max_dist: f32) -> Option<Vec3> {
        None
    }

    fn set_anim_param(&mut self, _name: &str, _value: AnimParam) {}

    /// Length in seconds of the animation state the owner is now in.
    fn anim_state_length(&self) -> f32 {
        0.0
    }

    /// Start a melee swing.  The host answers with `Signal::MeleeFinished`
    /// once the swing recovers.
    fn melee_swing(&mut self) {}

    /// Abandon a swing in progress.
    fn melee_cancel(&mut self) {}

    fn shoot(&mut self, _shot: ShotRequest) {}

    fn play_sound(&mut self, _path: &str, _at: Vec3) {}

    /// Raise a named event on `target` (or on the owner when `None`).
    fn send_event(&mut self, _target: Option<&str>, _event: &str) {}

    fn set_color(&mut self, _color: Color) {}
}
