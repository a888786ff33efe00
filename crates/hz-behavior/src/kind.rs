//! The node-type catalogue.
//!
//! One `NodeKind` variant per node type, each wrapping that type's parameter
//! struct.  The type string is what the tree asset stores in `Type`.

use crate::composite::{Parallel, PrioritySelect, RandomSelector, Selector, Sequencer};
use crate::decorator::{
    AlwaysSucceed, Conditional, ConditionalConstant, DistanceCheck, ImpulseReceiver,
    InvertFinish, Repeat, RepeatForTime, RepeatForever, RepeatUntilFail,
};
use crate::field::FieldSet;
use crate::leaf::{
    Brake, ChangeColor, DebugMessage, Idle, Jump, Melee, MoveRandomly, MoveTo, MoveToNavMesh,
    PlayAnim, PlaySound, SendEvent, SetAnimParam, SetOrientTowardsParameters,
    SetSteeringParameters, Shoot, SteerTo,
};

/// Structural role of a node type.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Category {
    /// Runs one or more children under a selection policy.
    Composite,
    /// Wraps exactly one child.
    Decorator,
    /// Performs an action; no children.
    Leaf,
}

impl Category {
    /// `(min, max)` child count; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Category::Composite => (1, None),
            Category::Decorator => (1, Some(1)),
            Category::Leaf      => (0, Some(0)),
        }
    }
}

macro_rules! node_kinds {
    ( $( $variant:ident = $type_name:literal, $category:ident; )* ) => {
        /// A node type and its persistent parameters.
        #[derive(Clone, Debug, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum NodeKind {
            $( $variant($variant), )*
        }

        impl NodeKind {
            /// Every type string the asset codec accepts.
            pub const TYPE_NAMES: &'static [&'static str] = &[$($type_name),*];

            pub fn type_name(&self) -> &'static str {
                match self {
                    $( NodeKind::$variant(_) => $type_name, )*
                }
            }

            /// A node of the named type with default parameters.
            pub fn from_type_name(name: &str) -> Option<NodeKind> {
                match name {
                    $( $type_name => Some(NodeKind::$variant($variant::default())), )*
                    _ => None,
                }
            }

            pub fn category(&self) -> Category {
                match self {
                    $( NodeKind::$variant(_) => Category::$category, )*
                }
            }

            pub fn write_fields(&self, out: &mut Vec<(&'static str, String)>) {
                match self {
                    $( NodeKind::$variant(p) => p.write_fields(out), )*
                }
            }

            pub fn read_field(&mut self, attr: &str, raw: &str) -> Result<bool, String> {
                match self {
                    $( NodeKind::$variant(p) => p.read_field(attr, raw), )*
                }
            }

            pub fn field_names(&self) -> &'static [&'static str] {
                match self {
                    $( NodeKind::$variant(_) => <$variant as FieldSet>::FIELDS, )*
                }
            }
        }

        $(
            impl From<$variant> for NodeKind {
                fn from(p: $variant) -> Self {
                    NodeKind::$variant(p)
                }
            }
        )*
    };
}

node_kinds! {
    Sequencer                  = "SEL_Sequencer",                  Composite;
    Selector                   = "SEL_Selector",                   Composite;
    Parallel                   = "SEL_Parallel",                   Composite;
    PrioritySelect             = "SEL_PrioritySelect",             Composite;
    RandomSelector             = "SEL_RandomSelector",             Composite;
    AlwaysSucceed              = "DEC_AlwaysSucceed",              Decorator;
    InvertFinish               = "DEC_InvertFinish",               Decorator;
    Repeat                     = "DEC_Repeat",                     Decorator;
    RepeatForever              = "DEC_RepeatForever",              Decorator;
    RepeatUntilFail            = "DEC_RepeatUntilFail",            Decorator;
    RepeatForTime              = "DEC_RepeatForTime",              Decorator;
    Conditional                = "DEC_Conditional",                Decorator;
    ConditionalConstant        = "DEC_ConditionalConstant",        Decorator;
    DistanceCheck              = "DEC_DistanceCheck",              Decorator;
    ImpulseReceiver            = "DEC_ImpulseReceiver",            Decorator;
    Melee                      = "LEF_Melee",                      Leaf;
    Shoot                      = "LEF_Shoot",                      Leaf;
    MoveTo                     = "LEF_MoveTo",                     Leaf;
    MoveToNavMesh              = "LEF_MoveToNavMesh",              Leaf;
    SetAnimParam               = "LEF_SetAnimParam",               Leaf;
    PlayAnim                   = "LEF_PlayAnim",                   Leaf;
    Idle                       = "LEF_Idle",                       Leaf;
    MoveRandomly               = "LEF_MoveRandomly",               Leaf;
    SendEvent                  = "LEF_SendEvent",                  Leaf;
    PlaySound                  = "LEF_PlaySound",                  Leaf;
    DebugMessage               = "LEF_DebugMessage",               Leaf;
    Jump                       = "LEF_Jump",                       Leaf;
    Brake                      = "LEF_Brake",                      Leaf;
    SetSteeringParameters      = "LEF_SetSteeringParameters",      Leaf;
    SetOrientTowardsParameters = "LEF_SetOrientTowardsParameters", Leaf;
    SteerTo                    = "LEF_SteerTo",                    Leaf;
    ChangeColor                = "LEF_ChangeColor",                Leaf;
}

impl NodeKind {
    /// `(min, max)` child count for this type.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            NodeKind::RandomSelector(_) => (2, Some(2)),
            other => other.category().arity(),
        }
    }

    /// Score used by `PrioritySelect`.  Impulse receivers are only reached
    /// through their impulse, never by priority.
    pub fn utility(&self) -> f32 {
        match self {
            NodeKind::ImpulseReceiver(_) => 0.0,
            _ => 0.5,
        }
    }
}
