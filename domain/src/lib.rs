use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value; // Field values are stored exactly as the client sent them
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid record id '{0}': expected a whole number")]
    InvalidRecordId(String),
}

// --- Record ID ---

/// Identifier of a skill or project. Assigned from wall-clock milliseconds at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
    pub fn value(&self) -> i64 {
        self.0
    }
}
impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    /// Parses a path parameter as a number, then requires it to be whole.
    ///
    /// "1", "1.0" and "1e0" all name id 1; "1.5", "NaN" and "abc" name nothing.
    /// Surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(id) = trimmed.parse::<i64>() {
            return Ok(Self(id));
        }
        let invalid = || DomainError::InvalidRecordId(raw.to_string());
        let number = trimmed.parse::<f64>().map_err(|_| invalid())?;
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if !number.is_finite()
            || number.fract() != 0.0
            || number < i64::MIN as f64
            || number >= i64::MAX as f64
        {
            return Err(invalid());
        }
        Ok(Self(number as i64))
    }
}

// --- Record Kinds ---

/// The two collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Skill,
    Project,
}

impl RecordKind {
    /// Human-facing name used in API messages ("Skill not found").
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Skill => "Skill",
            RecordKind::Project => "Project",
        }
    }

    /// Key of the collection inside the store document.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Skill => "skills",
            RecordKind::Project => "projects",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record living in one of the store's collections.
///
/// Every record is built from a `Draft` (the request body, all fields optional)
/// plus an id chosen by the caller.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    type Draft: DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;

    const KIND: RecordKind;

    fn id(&self) -> RecordId;
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;
    fn collection(store: &StoreDocument) -> &[Self];
    fn collection_mut(store: &mut StoreDocument) -> &mut Vec<Self>;
}

// --- Skills ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// Usually free text such as "Beginner" or "Intermediate"; any JSON value is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
}

/// Body of a skill create/update request. Unknown keys (including `id`) are ignored
/// and known keys are not type-checked.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillDraft {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub level: Option<Value>,
}

impl Record for Skill {
    type Draft = SkillDraft;

    const KIND: RecordKind = RecordKind::Skill;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: SkillDraft) -> Self {
        Self {
            id,
            name: draft.name,
            level: draft.level,
        }
    }

    fn collection(store: &StoreDocument) -> &[Self] {
        &store.skills
    }

    fn collection_mut(store: &mut StoreDocument) -> &mut Vec<Self> {
        &mut store.skills
    }
}

// --- Projects ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

impl Record for Project {
    type Draft = ProjectDraft;

    const KIND: RecordKind = RecordKind::Project;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: ProjectDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
        }
    }

    fn collection(store: &StoreDocument) -> &[Self] {
        &store.projects
    }

    fn collection_mut(store: &mut StoreDocument) -> &mut Vec<Self> {
        &mut store.projects
    }
}

// --- Store Document ---

/// The whole persisted document. Both arrays keep insertion order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreDocument {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl StoreDocument {
    pub fn records<R: Record>(&self) -> &[R] {
        R::collection(self)
    }

    /// Appends a record to the end of its collection.
    pub fn append<R: Record>(&mut self, record: R) {
        R::collection_mut(self).push(record);
    }

    /// Replaces the first record whose id equals `id`.
    /// Returns the stored replacement, or `None` when no record matched (store untouched).
    pub fn replace<R: Record>(&mut self, id: RecordId, record: R) -> Option<&R> {
        let records = R::collection_mut(self);
        let index = records.iter().position(|existing| existing.id() == id)?;
        records[index] = record;
        Some(&records[index])
    }

    /// Removes every record whose id equals `id` and returns how many were dropped.
    pub fn remove_all<R: Record>(&mut self, id: RecordId) -> usize {
        let records = R::collection_mut(self);
        let before = records.len();
        records.retain(|existing| existing.id() != id);
        before - records.len()
    }
}
