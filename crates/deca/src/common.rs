//! Common types shared across the form pages.

use serde::{Deserialize, Serialize};

/// Which flavour of member/volunteer form is being submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormMode {
    /// Staff entering a brand new member (`/new-member`).
    Create,
    /// Staff renewing an existing member picked from the directory.
    Renew,
    /// Public join/volunteer forms, usually embedded in another site.
    SelfServe,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Renew => "renew",
            Self::SelfServe => "self-serve",
        }
    }

    /// Self-serve pages never ask for the visitor's location.
    pub fn wants_geoposition(&self) -> bool {
        !matches!(self, Self::SelfServe)
    }

    /// Only `create` turns a 409 into a "go renew instead" prompt.
    pub fn detects_conflicts(&self) -> bool {
        matches!(self, Self::Create)
    }
}

/// Submission semantics of a form: a member/volunteer form in some mode, or
/// the simpler authorized-user form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Member(FormMode),
    Authorization,
}

impl FormKind {
    pub fn mode(&self) -> Option<FormMode> {
        match self {
            Self::Member(mode) => Some(*mode),
            Self::Authorization => None,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member(_))
    }

    pub fn wants_geoposition(&self) -> bool {
        self.mode().is_some_and(|mode| mode.wants_geoposition())
    }

    pub fn detects_conflicts(&self) -> bool {
        self.mode().is_some_and(|mode| mode.detects_conflicts())
    }
}

impl Default for FormKind {
    fn default() -> Self {
        Self::Member(FormMode::Create)
    }
}
