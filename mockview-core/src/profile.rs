//! Candidate profiles and resumes
//!
//! Read-only lookups that feed question generation with candidate context.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Candidate profile captured at onboarding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub name: String,
    pub college: String,
    pub degree: String,
    pub year: String,
    pub target_role: String,
    pub experience: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeStatus {
    #[default]
    Pending,
    Confirmed,
}

/// Parsed resume content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub status: ResumeStatus,
}

impl ResumeData {
    pub fn is_confirmed(&self) -> bool {
        self.status == ResumeStatus::Confirmed
    }
}

/// Source of candidate context
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn profile(&self, user_id: &str) -> Option<CandidateProfile>;

    async fn resume(&self, user_id: &str) -> Option<ResumeData>;
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserEntry {
    #[serde(default)]
    profile: Option<CandidateProfile>,
    #[serde(default)]
    resume: Option<ResumeData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    users: HashMap<String, UserEntry>,
}

/// In-memory profile directory
#[derive(Debug, Default)]
pub struct MemoryProfileDirectory {
    users: RwLock<HashMap<String, UserEntry>>,
}

impl MemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"users": {"<id>": {"profile": {...}, "resume": {...}}}}`
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let file: DirectoryFile = serde_json::from_str(json)?;
        Ok(Self {
            users: RwLock::new(file.users),
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub async fn set_profile(&self, user_id: impl Into<String>, profile: CandidateProfile) {
        self.users
            .write()
            .await
            .entry(user_id.into())
            .or_default()
            .profile = Some(profile);
    }

    pub async fn set_resume(&self, user_id: impl Into<String>, resume: ResumeData) {
        self.users
            .write()
            .await
            .entry(user_id.into())
            .or_default()
            .resume = Some(resume);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl ProfileProvider for MemoryProfileDirectory {
    async fn profile(&self, user_id: &str) -> Option<CandidateProfile> {
        self.users
            .read()
            .await
            .get(user_id)
            .and_then(|entry| entry.profile.clone())
    }

    async fn resume(&self, user_id: &str) -> Option<ResumeData> {
        self.users
            .read()
            .await
            .get(user_id)
            .and_then(|entry| entry.resume.clone())
    }
}
