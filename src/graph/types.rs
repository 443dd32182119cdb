//! Core type definitions for the living map

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    User,
    Team,
    Project,
    Goal,
    Department,
    #[serde(alias = "knowledge_asset")]
    KnowledgeAsset,
    #[serde(alias = "team_cluster")]
    TeamCluster,
}

impl NodeType {
    /// Every node type, in declaration order
    pub const ALL: [NodeType; 7] = [
        NodeType::User,
        NodeType::Team,
        NodeType::Project,
        NodeType::Goal,
        NodeType::Department,
        NodeType::KnowledgeAsset,
        NodeType::TeamCluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::User => "user",
            NodeType::Team => "team",
            NodeType::Project => "project",
            NodeType::Goal => "goal",
            NodeType::Department => "department",
            NodeType::KnowledgeAsset => "knowledge-asset",
            NodeType::TeamCluster => "team-cluster",
        }
    }

    /// Position in [`NodeType::ALL`]
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relationship type carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    #[serde(alias = "reports_to")]
    ReportsTo,
    #[serde(alias = "member_of")]
    MemberOf,
    Leads,
    Owns,
    #[serde(alias = "participates_in")]
    ParticipatesIn,
    #[serde(alias = "aligned_to")]
    AlignedTo,
    #[serde(alias = "parent_of")]
    ParentOf,
    #[serde(alias = "related_to")]
    RelatedTo,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::ReportsTo => "reports-to",
            EdgeType::MemberOf => "member-of",
            EdgeType::Leads => "leads",
            EdgeType::Owns => "owns",
            EdgeType::ParticipatesIn => "participates-in",
            EdgeType::AlignedTo => "aligned-to",
            EdgeType::ParentOf => "parent-of",
            EdgeType::RelatedTo => "related-to",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
