//! `hz-behavior`: behavior trees for horde agents.
//!
//! A tree asset is parsed once into a prototype [`BehaviorTree`]; every agent
//! runs its own [`deep_copy`](BehaviorTree::deep_copy).  Each behavior tick
//! the host builds a [`TickContext`] (blackboard, owner services, RNG) and
//! calls [`BehaviorTree::update`].
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`status`]      | `NodeStatus`                                               |
//! | [`blackboard`]  | `Blackboard`, `BbValue`                                    |
//! | [`actions`]     | `AgentActions`: what nodes may do to their owner           |
//! | [`field`]       | `FieldCodec`, `FieldSet`: node parameters as attributes    |
//! | [`kind`]        | `NodeKind`, `Category`: the node-type catalogue            |
//! | [`composite`]   | Sequencer, Selector, Parallel, PrioritySelect, RandomSelector |
//! | [`decorator`]   | Repeat family, conditionals, DistanceCheck, ImpulseReceiver |
//! | [`leaf`]        | Action leaves (movement, combat, animation, steering setup) |
//! | [`node`]        | `Node`, `NodeIdx`                                          |
//! | [`tree`]        | `BehaviorTree`: arena, tick loop, signals, impulse jumps   |
//! | [`builder`]     | `TreeBuilder`: assembly and validation                     |
//! | [`asset`]       | XML codec, `BehaviorAsset`                                 |
//! | [`error`]       | `BehaviorError`, `BehaviorResult<T>`                       |
//!
//! # Node lifecycle
//!
//! ```text
//! Entering ──enter──► Running ──update──► Success | Fail
//!                        │
//!                        └──exit──► Fail   (interrupted by a parent or a jump)
//! ```
//!
//! When the root finishes it is re-entered in the same tick.

pub mod actions;
pub mod asset;
pub mod blackboard;
pub mod builder;
pub mod composite;
pub mod context;
pub mod decorator;
pub mod error;
pub mod field;
pub mod kind;
pub mod leaf;
pub mod node;
pub mod signal;
pub mod status;
pub mod tree;

mod exec;

#[cfg(test)]
mod tests;

pub use actions::{AgentActions, AnimParam, ArcShot, ShotRequest};
pub use asset::{parse_tree, write_tree, BehaviorAsset};
pub use blackboard::{BbValue, Blackboard};
pub use builder::TreeBuilder;
pub use composite::FinishMethod;
pub use context::TickContext;
pub use decorator::{ConditionalType, DistanceCheckType};
pub use error::{BehaviorError, BehaviorResult};
pub use kind::{Category, NodeKind};
pub use leaf::{OrientType, ParamType};
pub use node::{Node, NodeIdx};
pub use signal::Signal;
pub use status::NodeStatus;
pub use tree::BehaviorTree;
