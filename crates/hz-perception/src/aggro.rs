//! Hostile target lock with a loss-of-sight grace timer.
//!
//! ```text
//!            enemy detected                     timer < 0
//!  Passive ──────────────────► Aggroed ─────────────────────► Passive
//!                               │  ▲
//!          target out of sight  │  │  target seen again
//!          (timer counts down)  ▼  │  (timer reset)
//! ```
//!
//! Entering aggro multiplies the owner's sight reach; leaving divides it
//! back.

use hz_core::{EntityId, Faction};
use tracing::debug;

use crate::{SensableRegistry, Sensing};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AggroConfig {
    /// Blackboard key that receives the target.
    pub bb_target_key:         String,
    /// Cone length multiplier while aggroed.  The cone angle always doubles.
    pub sense_multiplier:      f32,
    /// Seconds the target may stay out of sight before aggro lapses.
    pub aggro_time:            f32,
    pub forwards_to_teammates: bool,
    pub forwarding_range:      f32,
}

impl Default for AggroConfig {
    fn default() -> Self {
        Self {
            bb_target_key:         "Target".to_owned(),
            sense_multiplier:      2.0,
            aggro_time:            1.0,
            forwards_to_teammates: true,
            forwarding_range:      10.0,
        }
    }
}

/// Outcome of an aggro transition, for the host to act on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggroEffect {
    /// First target acquired while passive.  Always followed by `Targeted`.
    Triggered { target: EntityId },
    /// The target was set or refreshed.  The host writes it to the
    /// blackboard.
    Targeted { target: EntityId },
    /// Aggro lapsed; `target` is who it was locked on to, if anyone.
    Lost { target: Option<EntityId> },
}

#[derive(Clone, Debug)]
pub struct Aggro {
    pub config:     AggroConfig,
    target:         Option<EntityId>,
    timer:          f32,
    can_see_target: bool,
    aggroed:        bool,
    /// Whether the owner's sensing currently carries the aggro multiplier.
    boosted:        bool,
}

impl Aggro {
    pub fn new(config: AggroConfig) -> Self {
        Self {
            config,
            target:         None,
            timer:          0.0,
            can_see_target: false,
            aggroed:        false,
            boosted:        false,
        }
    }

    #[inline]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    #[inline]
    pub fn is_aggroed(&self) -> bool {
        self.aggroed
    }

    #[inline]
    pub fn can_see_target(&self) -> bool {
        self.can_see_target
    }

    /// Seconds left before aggro lapses.
    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Lock on to `target`, boosting sensing on the way in.
    pub fn set_target(&mut self, target: EntityId, sensing: &mut Sensing) -> AggroEffect {
        if !self.boosted {
            sensing.scale_reach(self.config.sense_multiplier, 2.0);
            self.boosted = true;
        }
        self.target = Some(target);
        self.timer = self.config.aggro_time;
        self.aggroed = true;
        self.can_see_target = true;
        AggroEffect::Targeted { target }
    }

    /// React to a newly detected entity.
    pub fn on_detected(
        &mut self,
        own:      Faction,
        obj:      EntityId,
        registry: &SensableRegistry,
        sensing:  &mut Sensing,
    ) -> Vec<AggroEffect> {
        let Some(sensable) = registry.get(obj) else {
            return Vec::new();
        };
        if !own.is_enemy_of(sensable.faction) {
            return Vec::new();
        }
        match self.target {
            Some(current) if current == obj => vec![self.set_target(obj, sensing)],
            None => {
                debug!(target = %obj, "aggro triggered");
                vec![AggroEffect::Triggered { target: obj }, self.set_target(obj, sensing)]
            }
            Some(current) if sensable.priority > registry.priority(current) => {
                debug!(from = %current, to = %obj, "aggro retargeted");
                vec![self.set_target(obj, sensing)]
            }
            Some(_) => Vec::new(),
        }
    }

    pub fn on_lost(&mut self, obj: EntityId) {
        if self.target == Some(obj) {
            self.can_see_target = false;
        }
    }

    /// Advance the grace timer.  While `horde_active` aggro is forced on and
    /// never lapses.
    pub fn update(&mut self, dt: f32, horde_active: bool, sensing: &mut Sensing) -> Option<AggroEffect> {
        if horde_active {
            self.aggroed = true;
            self.timer = self.config.aggro_time;
            return None;
        }
        if !self.aggroed {
            return None;
        }
        if self.can_see_target {
            self.timer = self.config.aggro_time;
        } else {
            self.timer -= dt;
        }
        (self.timer < 0.0).then(|| self.lose_aggro(sensing))
    }

    fn lose_aggro(&mut self, sensing: &mut Sensing) -> AggroEffect {
        if self.boosted {
            sensing.scale_reach(1.0 / self.config.sense_multiplier, 0.5);
            self.boosted = false;
        }
        let target = self.target.take();
        self.aggroed = false;
        self.can_see_target = false;
        debug!(target = ?target, "aggro lost");
        AggroEffect::Lost { target }
    }
}
