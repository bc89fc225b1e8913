//! Post-recovery membership reconciliation
//!
//! Per RECONCILE.md, this stage runs only after the monitor classified the
//! recovery boot as Completed:
//!
//! 1. Quiesce every sibling node (same bounded quiesce as the controller)
//! 2. Start the cluster manager's service on the recovered node
//! 3. Verify it becomes leader within a bounded retry window; issue an
//!    explicit promotion command if it does not converge on its own
//! 4. With the auto-complete policy set, start each sibling and issue a
//!    reseed (full resync from the new leader); otherwise stop here and
//!    report the manual next steps, leaving siblings stopped

use std::thread;
use std::time::Duration;

use crate::cluster::{ClusterManager, ClusterTopology};
use crate::node::{quiesce_node, QuiesceOutcome, QuiescePolicy};

use super::errors::{ReconcileError, ReconcileResult};

/// Bounds and policy for reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Leadership checks before giving up
    pub leader_attempts: u32,
    pub poll_delay: Duration,
    /// Quiesce bounds reused for siblings
    pub quiesce: QuiescePolicy,
    /// Start siblings and reseed them from the new leader
    pub auto_complete: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            leader_attempts: 10,
            poll_delay: Duration::from_secs(3),
            quiesce: QuiescePolicy::default(),
            auto_complete: false,
        }
    }
}

/// What reconciliation did and what remains for the operator.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub quiesced_siblings: Vec<String>,
    pub leader_confirmed: bool,
    /// True when convergence needed an explicit promotion command
    pub forced_promotion: bool,
    pub reseeded: Vec<String>,
    pub warnings: Vec<String>,
    /// Manual next steps when auto-complete is off
    pub manual_steps: Vec<String>,
}

/// Reconciles cluster membership around the recovered node.
pub struct ClusterReconciler<'a, C: ClusterManager> {
    cluster: &'a C,
    policy: ReconcilePolicy,
}

impl<'a, C: ClusterManager> ClusterReconciler<'a, C> {
    pub fn new(cluster: &'a C, policy: ReconcilePolicy) -> Self {
        Self { cluster, policy }
    }

    pub fn reconcile(
        &self,
        node: &str,
        topology: &ClusterTopology,
    ) -> ReconcileResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for sibling in topology.siblings_of(node) {
            match quiesce_node(self.cluster, &sibling, &self.policy.quiesce)
                .map_err(ReconcileError::SiblingQuiesce)?
            {
                QuiesceOutcome::Confirmed { .. } => report.quiesced_siblings.push(sibling),
                QuiesceOutcome::StillPresent { attempts } => {
                    report.warnings.push(format!(
                        "sibling {} still in membership after {} checks",
                        sibling, attempts
                    ));
                    report.quiesced_siblings.push(sibling);
                }
            }
        }

        self.cluster.start_service(node)?;
        self.verify_leadership(node, &mut report)?;

        if self.policy.auto_complete {
            for sibling in &report.quiesced_siblings {
                self.cluster.start_service(sibling)?;
                self.cluster.reinit(sibling)?;
                report.reseeded.push(sibling.clone());
            }
        } else {
            for sibling in &report.quiesced_siblings {
                report
                    .manual_steps
                    .push(format!("start {} and reseed it from {}", sibling, node));
            }
        }

        Ok(report)
    }

    /// Bounded leadership verification. The explicit promotion command is
    /// issued once, at the midpoint of the retry window, if the manager has
    /// not converged on its own by then.
    fn verify_leadership(&self, node: &str, report: &mut ReconcileReport) -> ReconcileResult<()> {
        let attempts = self.policy.leader_attempts.max(1);
        let promote_at = attempts / 2 + 1;

        for attempt in 1..=attempts {
            let view = self.cluster.membership()?;
            if view.leader() == Some(node) {
                report.leader_confirmed = true;
                return Ok(());
            }

            if attempt == promote_at && !report.forced_promotion {
                self.cluster.promote(node)?;
                report.forced_promotion = true;
            }

            if attempt < attempts {
                thread::sleep(self.policy.poll_delay);
            }
        }

        Err(ReconcileError::PromotionFailed {
            node: node.to_string(),
            attempts,
            promotion_issued: report.forced_promotion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterResult, MembershipView};
    use std::cell::RefCell;

    /// Cluster fake driven by a script of membership listings: one listing
    /// is consumed per membership() call, the last repeats.
    struct ScriptedCluster {
        listings: Vec<&'static str>,
        cursor: RefCell<usize>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedCluster {
        fn new(listings: Vec<&'static str>) -> Self {
            Self {
                listings,
                cursor: RefCell::new(0),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl ClusterManager for ScriptedCluster {
        fn membership(&self) -> ClusterResult<MembershipView> {
            let mut cursor = self.cursor.borrow_mut();
            let idx = (*cursor).min(self.listings.len() - 1);
            *cursor += 1;
            MembershipView::parse(self.listings[idx])
        }
        fn stop_service(&self, node: &str) -> ClusterResult<()> {
            self.record(format!("stop {}", node));
            Ok(())
        }
        fn start_service(&self, node: &str) -> ClusterResult<()> {
            self.record(format!("start {}", node));
            Ok(())
        }
        fn promote(&self, node: &str) -> ClusterResult<()> {
            self.record(format!("promote {}", node));
            Ok(())
        }
        fn reinit(&self, node: &str) -> ClusterResult<()> {
            self.record(format!("reinit {}", node));
            Ok(())
        }
    }

    const EMPTY: &str = "[]";
    const NODE2_LEADER: &str = r#"[{"Member":"node2","Role":"Leader","State":"running"}]"#;
    const NODE1_LEADER: &str = r#"[{"Member":"node1","Role":"Leader","State":"running"}]"#;

    fn fast_policy(auto_complete: bool) -> ReconcilePolicy {
        ReconcilePolicy {
            leader_attempts: 4,
            poll_delay: Duration::from_millis(0),
            quiesce: QuiescePolicy {
                attempts: 3,
                poll_delay: Duration::from_millis(0),
            },
            auto_complete,
        }
    }

    fn topology() -> ClusterTopology {
        ClusterTopology {
            leader: Some("node1".to_string()),
            replicas: vec!["node2".to_string(), "node3".to_string()],
        }
    }

    #[test]
    fn test_self_converging_leader_without_promotion() {
        // Sibling quiesce polls see empty membership, then node2 is leader.
        let cluster = ScriptedCluster::new(vec![EMPTY, EMPTY, NODE2_LEADER]);
        let reconciler = ClusterReconciler::new(&cluster, fast_policy(false));

        let report = reconciler.reconcile("node2", &topology()).unwrap();
        assert!(report.leader_confirmed);
        assert!(!report.forced_promotion);
        assert_eq!(report.quiesced_siblings, vec!["node1", "node3"]);
        assert_eq!(report.manual_steps.len(), 2);
        assert!(report.reseeded.is_empty());

        let calls = cluster.calls.borrow();
        assert!(calls.contains(&"stop node1".to_string()));
        assert!(calls.contains(&"stop node3".to_string()));
        assert!(calls.contains(&"start node2".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("promote")));
    }

    #[test]
    fn test_promotion_issued_when_convergence_stalls() {
        // Membership keeps showing the old leader until after the forced
        // promotion (midpoint of 4 attempts = attempt 3).
        let cluster = ScriptedCluster::new(vec![
            EMPTY,
            EMPTY, // sibling quiesce polls
            NODE1_LEADER,
            NODE1_LEADER,
            NODE1_LEADER,
            NODE2_LEADER, // after promote
        ]);
        let reconciler = ClusterReconciler::new(&cluster, fast_policy(false));

        let report = reconciler.reconcile("node2", &topology()).unwrap();
        assert!(report.leader_confirmed);
        assert!(report.forced_promotion);
        assert!(cluster
            .calls
            .borrow()
            .contains(&"promote node2".to_string()));
    }

    #[test]
    fn test_promotion_failure_when_never_leader() {
        let cluster = ScriptedCluster::new(vec![EMPTY, EMPTY, NODE1_LEADER]);
        let reconciler = ClusterReconciler::new(&cluster, fast_policy(false));

        let err = reconciler.reconcile("node2", &topology()).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::PromotionFailed {
                promotion_issued: true,
                ..
            }
        ));
    }

    #[test]
    fn test_auto_complete_reseeds_siblings() {
        let cluster = ScriptedCluster::new(vec![EMPTY, EMPTY, NODE2_LEADER]);
        let reconciler = ClusterReconciler::new(&cluster, fast_policy(true));

        let report = reconciler.reconcile("node2", &topology()).unwrap();
        assert_eq!(report.reseeded, vec!["node1", "node3"]);
        assert!(report.manual_steps.is_empty());

        let calls = cluster.calls.borrow();
        assert!(calls.contains(&"start node1".to_string()));
        assert!(calls.contains(&"reinit node1".to_string()));
        assert!(calls.contains(&"start node3".to_string()));
        assert!(calls.contains(&"reinit node3".to_string()));
    }

    #[test]
    fn test_unquiesced_sibling_surfaces_warning() {
        // node1 never leaves membership during its quiesce polls.
        let cluster = ScriptedCluster::new(vec![
            NODE1_LEADER,
            NODE1_LEADER,
            NODE1_LEADER, // node1 quiesce polls exhausted
            EMPTY,        // node3 quiesce
            NODE2_LEADER, // leadership check
        ]);
        let reconciler = ClusterReconciler::new(&cluster, fast_policy(false));

        let report = reconciler.reconcile("node2", &topology()).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("node1"));
    }
}
