use std::collections::HashMap;
use thiserror::Error;

use crate::{
    consts::consts::PersonId,
    model::{
        person::Person,
        statement::{ListFilter, Statement, StatementResult, UpsertOutcome},
    },
};

#[derive(Error, Debug, PartialEq)]
pub enum ApplyErrors {
    #[error("Not found, record does not exist: {0}")]
    RecordNotFound(PersonId),
}

/// In-memory record set, keyed by identity. A single map entry per identity
/// is what makes upserts idempotent and duplicate-free.
pub struct PersonTable {
    pub person_records: HashMap<PersonId, Person>,
}

impl PersonTable {
    pub fn new() -> Self {
        Self {
            person_records: HashMap::<PersonId, Person>::new(),
        }
    }

    pub fn apply(&mut self, statement: Statement) -> Result<StatementResult, ApplyErrors> {
        let statement_result = match statement {
            Statement::Upsert(person) => {
                let id = person.id();

                match self.person_records.get_mut(&id) {
                    Some(existing_record) => {
                        // The favourite flag belongs to the store, a refresh
                        // from the remote never overwrites it
                        let stored_favourite = existing_record.is_favourite;

                        *existing_record = person;
                        existing_record.is_favourite = stored_favourite;

                        StatementResult::Upserted(UpsertOutcome::Updated)
                    }
                    None => {
                        self.person_records.insert(id, person);

                        StatementResult::Upserted(UpsertOutcome::Created)
                    }
                }
            }
            Statement::ToggleFavourite(id) => {
                let record = self
                    .person_records
                    .get_mut(&id)
                    .ok_or_else(|| ApplyErrors::RecordNotFound(id.clone()))?;

                record.is_favourite = !record.is_favourite;

                StatementResult::Toggled(record.is_favourite)
            }
            Statement::Get(id) => StatementResult::GetSingle(self.person_records.get(&id).cloned()),
            Statement::List(filter) => {
                let mut records: Vec<Person> = self
                    .person_records
                    .values()
                    .filter(|record| match filter {
                        ListFilter::All => true,
                        ListFilter::FavouritesOnly => record.is_favourite,
                    })
                    .cloned()
                    .collect();

                // Case-sensitive lexicographic order on first name, last name
                // as a deterministic tiebreak
                records.sort_by(|a, b| {
                    a.first_name
                        .cmp(&b.first_name)
                        .then_with(|| a.last_name.cmp(&b.last_name))
                });

                StatementResult::List(records)
            }
        };

        Ok(statement_result)
    }

    pub fn get(&self, id: &PersonId) -> Option<&Person> {
        self.person_records.get(id)
    }

    /// Puts a record back to a previous state, used when a mutation could not
    /// be persisted and must be undone
    pub fn restore_record(&mut self, id: PersonId, previous: Option<Person>) {
        match previous {
            Some(record) => {
                self.person_records.insert(id, record);
            }
            None => {
                self.person_records.remove(&id);
            }
        }
    }

    /// Used when restoring from a snapshot
    pub fn restore_table(&mut self, records: Vec<Person>) {
        self.person_records = records
            .into_iter()
            .map(|record| (record.id(), record))
            .collect();
    }

    pub fn all_records(&self) -> Vec<Person> {
        self.person_records.values().cloned().collect()
    }

    pub fn clear(&mut self) -> usize {
        let dropped_count = self.person_records.len();

        self.person_records.clear();

        dropped_count
    }

    pub fn len(&self) -> usize {
        self.person_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.person_records.is_empty()
    }
}
