//! Typed cluster membership view
//!
//! Per CLUSTER.md, membership is read before Quiesce and re-read after
//! Promote to confirm convergence. The view is a point-in-time snapshot of
//! the manager's listing; it is never cached across pipeline stages.

use serde::Deserialize;

use super::errors::{ClusterError, ClusterResult};

/// Role of a node as reported by the cluster manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Leader,
    Replica,
    Unknown,
}

impl NodeRole {
    fn from_listing(raw: &str) -> Self {
        match raw {
            "Leader" | "Standby Leader" => Self::Leader,
            "Replica" | "Sync Standby" => Self::Replica,
            _ => Self::Unknown,
        }
    }
}

/// One member row from the manager's listing.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: String,
    pub role: NodeRole,
    /// Manager-reported service state (e.g. "running", "stopped")
    pub state: String,
}

/// Point-in-time membership snapshot.
#[derive(Debug, Clone, Default)]
pub struct MembershipView {
    pub members: Vec<MemberInfo>,
}

/// Wire shape of one row in the manager's `list --format json` output.
#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "Member")]
    member: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "State")]
    state: String,
}

impl MembershipView {
    /// Parse the manager's JSON listing into a typed view.
    pub fn parse(raw: &str) -> ClusterResult<Self> {
        let rows: Vec<RawMember> = serde_json::from_str(raw)
            .map_err(|e| ClusterError::MalformedMembership(e.to_string()))?;

        Ok(Self {
            members: rows
                .into_iter()
                .map(|r| MemberInfo {
                    name: r.member,
                    role: NodeRole::from_listing(&r.role),
                    state: r.state,
                })
                .collect(),
        })
    }

    pub fn contains(&self, node: &str) -> bool {
        self.members.iter().any(|m| m.name == node)
    }

    pub fn leader(&self) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.role == NodeRole::Leader)
            .map(|m| m.name.as_str())
    }

    pub fn replicas(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.role == NodeRole::Replica)
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// Cluster shape derived from a membership view, captured before the first
/// node is stopped so reconciliation knows the pre-recovery siblings.
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    pub leader: Option<String>,
    pub replicas: Vec<String>,
}

impl ClusterTopology {
    pub fn from_view(view: &MembershipView) -> Self {
        Self {
            leader: view.leader().map(|s| s.to_string()),
            replicas: view.replicas().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Every known node except `node`.
    pub fn siblings_of(&self, node: &str) -> Vec<String> {
        self.leader
            .iter()
            .chain(self.replicas.iter())
            .filter(|n| n.as_str() != node)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {"Member": "node1", "Role": "Leader", "State": "running"},
        {"Member": "node2", "Role": "Replica", "State": "running"},
        {"Member": "node3", "Role": "Sync Standby", "State": "streaming"}
    ]"#;

    #[test]
    fn test_parse_listing() {
        let view = MembershipView::parse(LISTING).unwrap();
        assert_eq!(view.members.len(), 3);
        assert_eq!(view.leader(), Some("node1"));
        assert_eq!(view.replicas(), vec!["node2", "node3"]);
        assert!(view.contains("node2"));
        assert!(!view.contains("node9"));
    }

    #[test]
    fn test_parse_rejects_malformed_listing() {
        assert!(MembershipView::parse("Cluster: main (7212334)").is_err());
        assert!(MembershipView::parse(r#"[{"Member": "x"}]"#).is_err());
    }

    #[test]
    fn test_unknown_role_tolerated() {
        let view =
            MembershipView::parse(r#"[{"Member":"n1","Role":"Mystery","State":"running"}]"#)
                .unwrap();
        assert_eq!(view.members[0].role, NodeRole::Unknown);
        assert_eq!(view.leader(), None);
    }

    #[test]
    fn test_topology_siblings() {
        let view = MembershipView::parse(LISTING).unwrap();
        let topology = ClusterTopology::from_view(&view);
        assert_eq!(topology.siblings_of("node2"), vec!["node1", "node3"]);
        assert_eq!(
            topology.siblings_of("node1"),
            vec!["node2", "node3"]
        );
    }
}
