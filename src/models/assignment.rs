use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Network policy applied to student sessions unless the assignment
/// overrides it.
pub const DEFAULT_NETWORK_POLICY: &str = "os-student";
/// Network policy course admins always receive.
pub const ADMIN_NETWORK_POLICY: &str = "admin";

fn default_network_policy() -> String {
    DEFAULT_NETWORK_POLICY.to_string()
}

fn default_cpu_limit() -> String {
    "2".to_string()
}

fn default_mem_limit() -> String {
    "500Mi".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, schemars::JsonSchema)]
pub struct ResourceLimits {
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: String,
    #[serde(default = "default_mem_limit")]
    pub mem_limit: String,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_limit: default_cpu_limit(),
            mem_limit: default_mem_limit(),
        }
    }
}

/// Assignment-level IDE options blob. Optional keys fall back to the
/// defaults above when the stored JSON omits them. Snapshots are taken by
/// cloning, so an issued session never observes later edits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdeOptions {
    #[serde(default = "default_network_policy")]
    pub network_policy: String,
    #[serde(default)]
    pub resources: ResourceLimits,
}

impl Default for IdeOptions {
    fn default() -> Self {
        Self {
            network_policy: default_network_policy(),
            resources: ResourceLimits::default(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub ide_enabled: bool,
    pub git_repo_required: bool,
    pub release_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub image: String,
    pub ide_options: Json<IdeOptions>,
}

/// Repository bound to one (owner, assignment) pair, provisioned when the
/// student accepts the assignment on the git host.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentRepo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub assignment_id: Uuid,
    pub repo_url: String,
}
