// Transition table for the dispatch workflow
//
// Every action maps to exactly one rule. A rule is applied only after its
// precondition set has been checked against the asset's current status.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::assets::{Asset, AssetStatus, CUSTOMER_SITE_LOCATION, WAREHOUSE_LOCATION};
use crate::errors::{DispatchError, Result};
use crate::store::{AssetPatch, BatchUpdate};

/// Workflow actions an operator can trigger on a single asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowAction {
    Pick,
    Hold,
    Approve,
    Return,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 4] = [
        WorkflowAction::Pick,
        WorkflowAction::Hold,
        WorkflowAction::Approve,
        WorkflowAction::Return,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Pick => "pick",
            WorkflowAction::Hold => "hold",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Return => "return",
        }
    }

    pub fn rule(&self) -> &'static TransitionRule {
        match self {
            WorkflowAction::Pick => &PICK,
            WorkflowAction::Hold => &HOLD,
            WorkflowAction::Approve => &APPROVE,
            WorkflowAction::Return => &RETURN,
        }
    }

    /// Parse an action name; unknown names are an invalid transition from `from`
    pub fn parse_for(name: &str, from: AssetStatus) -> Result<Self> {
        name.parse()
            .map_err(|_| DispatchError::invalid_transition(name, from))
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown workflow action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for WorkflowAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        WorkflowAction::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationEffect {
    Keep,
    MoveTo(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEffect {
    Keep,
    Clear,
}

/// One row of the transition table
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: WorkflowAction,
    pub from: &'static [AssetStatus],
    pub to: AssetStatus,
    pub location: LocationEffect,
    pub batch: BatchEffect,
}

static PICK: TransitionRule = TransitionRule {
    action: WorkflowAction::Pick,
    from: &[AssetStatus::Allocated],
    to: AssetStatus::Picked,
    location: LocationEffect::Keep,
    batch: BatchEffect::Keep,
};

static HOLD: TransitionRule = TransitionRule {
    action: WorkflowAction::Hold,
    from: &[AssetStatus::Picked, AssetStatus::Allocated],
    to: AssetStatus::OnHold,
    location: LocationEffect::Keep,
    batch: BatchEffect::Keep,
};

static APPROVE: TransitionRule = TransitionRule {
    action: WorkflowAction::Approve,
    from: &[AssetStatus::Picked, AssetStatus::OnHold],
    to: AssetStatus::Dispatched,
    location: LocationEffect::MoveTo(CUSTOMER_SITE_LOCATION),
    batch: BatchEffect::Keep,
};

static RETURN: TransitionRule = TransitionRule {
    action: WorkflowAction::Return,
    from: &[AssetStatus::Allocated, AssetStatus::Picked, AssetStatus::OnHold],
    to: AssetStatus::Available,
    location: LocationEffect::MoveTo(WAREHOUSE_LOCATION),
    batch: BatchEffect::Clear,
};

impl TransitionRule {
    pub fn permits(&self, status: AssetStatus) -> bool {
        self.from.contains(&status)
    }

    /// Store patch that moves an asset into this rule's target state
    pub fn patch(&self) -> AssetPatch {
        let mut patch = AssetPatch::new().status(self.to);
        if let LocationEffect::MoveTo(location) = self.location {
            patch = patch.location(location);
        }
        if self.batch == BatchEffect::Clear {
            patch = patch.batch(BatchUpdate::Clear);
        }
        patch
    }
}

/// Validate `action` against the asset's current status and return the patch to apply
pub fn plan_transition(asset: &Asset, action: WorkflowAction) -> Result<AssetPatch> {
    let rule = action.rule();
    if !rule.permits(asset.status) {
        return Err(DispatchError::invalid_transition(action, asset.status));
    }
    Ok(rule.patch())
}

/// Actions that are legal from `status`, in table order
pub fn available_actions(status: AssetStatus) -> Vec<WorkflowAction> {
    WorkflowAction::ALL
        .into_iter()
        .filter(|action| action.rule().permits(status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetId, NewAssetRecord};
    use crate::errors::ErrorKind;
    use chrono::Utc;

    fn asset_in(status: AssetStatus) -> Asset {
        let mut asset = NewAssetRecord::intake("Case".into(), "C-1".into(), Utc::now())
            .into_asset(AssetId::new(), 1);
        asset.status = status;
        if status != AssetStatus::Available {
            asset.allocation_batch = Some("BATCH-T".into());
        }
        asset
    }

    #[test]
    fn test_every_rule_is_keyed_by_its_action() {
        for action in WorkflowAction::ALL {
            assert_eq!(action.rule().action, action);
        }
    }

    #[test]
    fn test_transition_table_is_exhaustive() {
        let expected: &[(WorkflowAction, AssetStatus, bool)] = &[
            (WorkflowAction::Pick, AssetStatus::Available, false),
            (WorkflowAction::Pick, AssetStatus::Allocated, true),
            (WorkflowAction::Pick, AssetStatus::Picked, false),
            (WorkflowAction::Pick, AssetStatus::OnHold, false),
            (WorkflowAction::Pick, AssetStatus::Dispatched, false),
            (WorkflowAction::Hold, AssetStatus::Available, false),
            (WorkflowAction::Hold, AssetStatus::Allocated, true),
            (WorkflowAction::Hold, AssetStatus::Picked, true),
            (WorkflowAction::Hold, AssetStatus::OnHold, false),
            (WorkflowAction::Hold, AssetStatus::Dispatched, false),
            (WorkflowAction::Approve, AssetStatus::Available, false),
            (WorkflowAction::Approve, AssetStatus::Allocated, false),
            (WorkflowAction::Approve, AssetStatus::Picked, true),
            (WorkflowAction::Approve, AssetStatus::OnHold, true),
            (WorkflowAction::Approve, AssetStatus::Dispatched, false),
            (WorkflowAction::Return, AssetStatus::Available, false),
            (WorkflowAction::Return, AssetStatus::Allocated, true),
            (WorkflowAction::Return, AssetStatus::Picked, true),
            (WorkflowAction::Return, AssetStatus::OnHold, true),
            (WorkflowAction::Return, AssetStatus::Dispatched, false),
        ];
        assert_eq!(expected.len(), WorkflowAction::ALL.len() * AssetStatus::ALL.len());
        for &(action, status, allowed) in expected {
            let result = plan_transition(&asset_in(status), action);
            assert_eq!(result.is_ok(), allowed, "{action} from {status}");
            if let Err(err) = result {
                assert_eq!(err.kind(), ErrorKind::InvalidTransition);
            }
        }
    }

    #[test]
    fn test_return_clears_batch_and_resets_location() {
        for status in [AssetStatus::Allocated, AssetStatus::Picked, AssetStatus::OnHold] {
            let mut asset = asset_in(status);
            asset.location = "Dock 7".into();
            plan_transition(&asset, WorkflowAction::Return)
                .unwrap()
                .apply(&mut asset);
            assert_eq!(asset.status, AssetStatus::Available);
            assert_eq!(asset.allocation_batch, None);
            assert_eq!(asset.location, WAREHOUSE_LOCATION);
        }
    }

    #[test]
    fn test_pick_and_hold_keep_location_and_batch() {
        let mut asset = asset_in(AssetStatus::Allocated);
        asset.location = "Staging Area".into();
        plan_transition(&asset, WorkflowAction::Pick)
            .unwrap()
            .apply(&mut asset);
        plan_transition(&asset, WorkflowAction::Hold)
            .unwrap()
            .apply(&mut asset);
        assert_eq!(asset.status, AssetStatus::OnHold);
        assert_eq!(asset.location, "Staging Area");
        assert_eq!(asset.allocation_batch.as_deref(), Some("BATCH-T"));
    }

    #[test]
    fn test_unknown_action_is_invalid_transition() {
        let err = WorkflowAction::parse_for("checkout", AssetStatus::Allocated).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(
            WorkflowAction::parse_for("APPROVE", AssetStatus::Picked).unwrap(),
            WorkflowAction::Approve
        );
    }

    #[test]
    fn test_available_actions() {
        assert!(available_actions(AssetStatus::Available).is_empty());
        assert!(available_actions(AssetStatus::Dispatched).is_empty());
        assert_eq!(
            available_actions(AssetStatus::Picked),
            vec![WorkflowAction::Hold, WorkflowAction::Approve, WorkflowAction::Return]
        );
    }
}
