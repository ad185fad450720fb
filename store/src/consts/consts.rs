use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// Types
pub type ErrorString = String;

/// Identity key for a person record. The remote document carries no stable
/// external id, so first + last name is the key. Two distinct people sharing
/// both names collapse into a single record.
// New Type Pattern -- https://doc.rust-lang.org/rust-by-example/generics/new_types.html
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId {
    pub first_name: String,
    pub last_name: String,
}

impl PersonId {
    pub fn new(first_name: String, last_name: String) -> Self {
        PersonId {
            first_name,
            last_name,
        }
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Position of a committed change in the change log. Sequence 0 means no
/// change has been committed yet.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct SequenceId(pub usize);

impl SequenceId {
    pub fn to_number(self) -> usize {
        self.0
    }

    pub fn increment(&self) -> SequenceId {
        SequenceId(self.0 + 1)
    }
}

impl Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
