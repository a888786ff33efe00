use std::fmt;

/// Lifecycle state of one node.
///
/// `Entering` is transient: assigning it runs the node's entry logic at once,
/// which leaves the node `Running` or terminal before control returns.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeStatus {
    #[default]
    Entering,
    Running,
    Success,
    Fail,
}

impl NodeStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Fail)
    }

    #[inline]
    pub fn is_running(self) -> bool {
        self == NodeStatus::Running
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Entering => "Entering",
            NodeStatus::Running  => "Running",
            NodeStatus::Success  => "Success",
            NodeStatus::Fail     => "Fail",
        };
        f.write_str(s)
    }
}
