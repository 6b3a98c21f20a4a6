use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// An opaque identifier for an individual, unique within a record set.
///
/// Identifiers are compared and ordered lexicographically. The empty string is
/// not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(NonEmptyString);

impl PersonId {
    /// Creates a new `PersonId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPersonId`] if the string is empty.
    pub fn new(s: String) -> Result<Self, InvalidPersonId> {
        NonEmptyString::new(s).map(Self).map_err(|_| InvalidPersonId)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Hash for PersonId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<String> for PersonId {
    type Error = InvalidPersonId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonId> for String {
    fn from(id: PersonId) -> Self {
        id.as_str().to_owned()
    }
}

impl FromStr for PersonId {
    type Err = InvalidPersonId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl Deref for PersonId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when an identifier is empty.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("person identifiers must be non-empty")]
pub struct InvalidPersonId;

/// A person in the record set.
///
/// Only the identifier matters to the analyses; anything else a loader
/// carries is dropped on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    /// The individual's identifier.
    pub id: PersonId,
}

impl Individual {
    /// Creates a new individual.
    #[must_use]
    pub const fn new(id: PersonId) -> Self {
        Self { id }
    }
}

/// A couple and their children.
///
/// Either parent may be unknown. Children are kept in the order given;
/// duplicates and self-references are not filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilyUnit {
    /// The family unit's identifier.
    pub id: String,

    /// The father, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father: Option<PersonId>,

    /// The mother, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother: Option<PersonId>,

    /// The children of this union.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PersonId>,
}

impl FamilyUnit {
    /// Creates an empty family unit with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the father.
    #[must_use]
    pub fn with_father(mut self, father: PersonId) -> Self {
        self.father = Some(father);
        self
    }

    /// Sets the mother.
    #[must_use]
    pub fn with_mother(mut self, mother: PersonId) -> Self {
        self.mother = Some(mother);
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: PersonId) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the recorded parents, father first.
    pub fn parents(&self) -> impl Iterator<Item = &PersonId> {
        self.father.iter().chain(self.mother.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(PersonId::new(String::new()), Err(InvalidPersonId));
        assert!("".parse::<PersonId>().is_err());
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut ids: Vec<PersonId> = ["b", "A", "a10", "a2"]
            .into_iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();

        let ids: Vec<&str> = ids.iter().map(PersonId::as_str).collect();
        assert_eq!(ids, ["A", "a10", "a2", "b"]);
    }

    #[test]
    fn family_deserializes_with_missing_fields() {
        let family: FamilyUnit = serde_json::from_str(r#"{"id": "F1", "mother": "M"}"#).unwrap();

        assert_eq!(family.id, "F1");
        assert_eq!(family.father, None);
        assert_eq!(family.mother.as_deref(), Some("M"));
        assert!(family.children.is_empty());
    }

    #[test]
    fn family_with_empty_child_id_fails_to_deserialize() {
        let result: Result<FamilyUnit, _> =
            serde_json::from_str(r#"{"id": "F1", "children": [""]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parents_lists_father_first() {
        let family = FamilyUnit::new("F1")
            .with_mother("M".parse().unwrap())
            .with_father("F".parse().unwrap());

        let parents: Vec<&str> = family.parents().map(PersonId::as_str).collect();
        assert_eq!(parents, ["F", "M"]);
    }
}
