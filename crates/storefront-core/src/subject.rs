use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kinds of catalog entries an actor can react to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Product,
    Brand,
}

/// Storage column holding the subject id of a reaction row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdentityColumn {
    ProductId,
    BrandId,
}

impl SubjectKind {
    pub const ALL: [SubjectKind; 2] = [SubjectKind::Product, SubjectKind::Brand];

    /// Kind to column dispatch. A new kind does not compile until it has a
    /// column here and a back-mapping in [`IdentityColumn::kind`].
    pub fn identity_column(self) -> IdentityColumn {
        match self {
            SubjectKind::Product => IdentityColumn::ProductId,
            SubjectKind::Brand => IdentityColumn::BrandId,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::Product => "product",
            SubjectKind::Brand => "brand",
        }
    }
}

impl IdentityColumn {
    pub const ALL: [IdentityColumn; 2] = [IdentityColumn::ProductId, IdentityColumn::BrandId];

    pub fn name(self) -> &'static str {
        match self {
            IdentityColumn::ProductId => "product_id",
            IdentityColumn::BrandId => "brand_id",
        }
    }

    pub fn kind(self) -> SubjectKind {
        match self {
            IdentityColumn::ProductId => SubjectKind::Product,
            IdentityColumn::BrandId => SubjectKind::Brand,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown subject kind: {0}")]
pub struct UnknownSubjectKind(pub String);

impl FromStr for SubjectKind {
    type Err = UnknownSubjectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(SubjectKind::Product),
            "brand" => Ok(SubjectKind::Brand),
            other => Err(UnknownSubjectKind(other.to_string())),
        }
    }
}

/// The product or brand a reaction targets.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReactionSubject {
    pub kind: SubjectKind,
    pub id: String,
}

impl ReactionSubject {
    pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self::new(SubjectKind::Product, id)
    }

    pub fn brand(id: impl Into<String>) -> Self {
        Self::new(SubjectKind::Brand, id)
    }

    /// A blank id counts as missing.
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn identity_column(&self) -> IdentityColumn {
        self.kind.identity_column()
    }
}

impl fmt::Display for ReactionSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
