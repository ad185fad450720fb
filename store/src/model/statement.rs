use serde::{Deserialize, Serialize};

use crate::consts::consts::PersonId;

use super::person::Person;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Statement {
    /// Insert-or-update keyed by identity, preserves the favourite flag on update
    Upsert(Person),
    /// Flips the stored favourite flag, fails when the record does not exist
    ToggleFavourite(PersonId),
    Get(PersonId),
    /// Returns a list of Person, sorted ascending by first name
    List(ListFilter),
}

impl Statement {
    pub fn is_query(&self) -> bool {
        !self.is_mutation()
    }

    pub fn is_mutation(&self) -> bool {
        match self {
            Statement::Upsert(_) | Statement::ToggleFavourite(_) => true,
            Statement::Get(_) | Statement::List(_) => false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum ListFilter {
    All,
    FavouritesOnly,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum UpsertOutcome {
    /// No record existed for the identity, a new one was inserted
    Created,
    /// An existing record was refreshed, its favourite flag left untouched
    Updated,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StatementResult {
    /// Used for store status messages
    SuccessStatus(String),
    Upserted(UpsertOutcome),
    /// The new value of the favourite flag after a toggle
    Toggled(bool),
    GetSingle(Option<Person>),
    List(Vec<Person>),
}

impl StatementResult {
    // TODO: Consider removing these methods and localizing them in the request_manager
    pub fn upserted(self) -> UpsertOutcome {
        if let StatementResult::Upserted(outcome) = self {
            outcome
        } else {
            panic!("Statement result is not of type Upserted")
        }
    }

    pub fn toggled(self) -> bool {
        if let StatementResult::Toggled(value) = self {
            value
        } else {
            panic!("Statement result is not of type Toggled")
        }
    }

    pub fn get_single(self) -> Option<Person> {
        if let StatementResult::GetSingle(p) = self {
            p
        } else {
            panic!("Statement result is not of type GetSingle")
        }
    }

    pub fn list(self) -> Vec<Person> {
        if let StatementResult::List(l) = self {
            l
        } else {
            panic!("Statement result is not of type List")
        }
    }

    #[allow(dead_code)]
    pub fn success_status(self) -> String {
        if let StatementResult::SuccessStatus(s) = self {
            s
        } else {
            panic!("Statement result is not of type SuccessStatus")
        }
    }
}
