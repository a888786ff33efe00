use thiserror::Error;

/// Authoring defects in tree assets or blackboard setup.
///
/// None of these are recoverable at runtime: they surface out of the tick
/// loop instead of being folded into a node's `Fail`.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("blackboard key `{key}` was never declared")]
    UndeclaredKey { key: String },

    #[error("blackboard key `{key}` holds {found}, expected {expected}")]
    TypeMismatch {
        key:      String,
        expected: &'static str,
        found:    &'static str,
    },

    #[error("node `{node}` cannot compare {left} with {right}")]
    InvalidComparison {
        node:  String,
        left:  &'static str,
        right: &'static str,
    },

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("node `{node}`: attribute {attribute}=\"{value}\" is malformed: {reason}")]
    MalformedAttribute {
        node:      String,
        attribute: String,
        value:     String,
        reason:    String,
    },

    #[error("node `{node}` ({node_type}) needs {expected} children, has {got}")]
    Arity {
        node:      String,
        node_type: &'static str,
        expected:  &'static str,
        got:       usize,
    },

    #[error("node id {id} is used by both `{first}` and `{second}`")]
    DuplicateNodeId { id: i64, first: String, second: String },

    #[error("impulse receiver `{receiver}` targets node id {target}, which is not in the tree")]
    ImpulseTargetMissing { receiver: String, target: i64 },

    #[error("tree asset has no <Root> element")]
    MissingRoot,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
