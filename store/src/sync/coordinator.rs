use std::sync::Mutex;

use crate::{
    model::{person::Person, statement::ListFilter},
    store::request_manager::{RequestManager, RequestManagerError},
};

use super::remote::RemoteSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncState {
    Idle,
    Fetching,
    Reconciling,
}

/// Outcome of a single reconciliation pass
#[derive(Debug, PartialEq)]
pub enum SyncOutcome {
    /// Remote records were merged, carries the refreshed read-side view
    Completed { refreshed: Vec<Person> },
    /// A pass was already in flight, this trigger was coalesced away
    AlreadyInFlight,
    /// Remote fetch failed, the store was left untouched
    FetchFailed(String),
}

/// Drives one reconciliation pass per trigger: fetch the remote document,
/// upsert every record in received order, then re-read the store with the
/// current favourite filter.
///
/// Only one pass runs at a time. A trigger that arrives while a pass is in
/// flight is coalesced, which prevents duplicate concurrent upserts racing on
/// the same identity.
pub struct SyncCoordinator {
    remote: Box<dyn RemoteSource + Send + Sync>,
    request_manager: RequestManager,
    state: Mutex<SyncState>,
    favourite_filter: Mutex<ListFilter>,
}

impl SyncCoordinator {
    pub fn new(
        remote: Box<dyn RemoteSource + Send + Sync>,
        request_manager: RequestManager,
    ) -> Self {
        Self {
            remote,
            request_manager,
            state: Mutex::new(SyncState::Idle),
            favourite_filter: Mutex::new(ListFilter::All),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap()
    }

    pub fn favourite_filter(&self) -> ListFilter {
        *self.favourite_filter.lock().unwrap()
    }

    /// Set when the user flips the favourites-only view, the next pass
    /// refreshes with this filter
    pub fn set_favourite_filter(&self, filter: ListFilter) {
        *self.favourite_filter.lock().unwrap() = filter;
    }

    pub fn trigger_sync(&self) -> Result<SyncOutcome, RequestManagerError> {
        // Claim the pass, a concurrent trigger sees a non-idle state and
        // backs off
        {
            let mut state = self.state.lock().unwrap();

            if *state != SyncState::Idle {
                return Ok(SyncOutcome::AlreadyInFlight);
            }

            *state = SyncState::Fetching;
        }

        let remote_records = match self.remote.fetch() {
            Ok(records) => records,
            Err(fetch_error) => {
                // Stale-but-valid data keeps serving reads, the list is never
                // blanked by a transient network failure
                self.set_state(SyncState::Idle);

                log::warn!(
                    "Remote fetch failed, keeping existing records: {}",
                    fetch_error
                );

                return Ok(SyncOutcome::FetchFailed(fetch_error.to_string()));
            }
        };

        self.set_state(SyncState::Reconciling);

        let record_count = remote_records.len();

        if let Err(store_error) = self.request_manager.send_upsert_all(remote_records) {
            self.set_state(SyncState::Idle);
            return Err(store_error);
        }

        // The store thread that applied the upserts serves this read, so the
        // refreshed view always reflects the pass that just completed
        let refreshed = match self.request_manager.send_list(self.favourite_filter()) {
            Ok(records) => records,
            Err(store_error) => {
                self.set_state(SyncState::Idle);
                return Err(store_error);
            }
        };

        log::info!("✅ Reconciled {} remote records", record_count);

        self.set_state(SyncState::Idle);

        Ok(SyncOutcome::Completed { refreshed })
    }

    fn set_state(&self, next: SyncState) {
        *self.state.lock().unwrap() = next;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::consts::consts::PersonId;
    use crate::model::person::Person;
    use crate::store::store::test_utils::{spawn_store, test_options};
    use crate::sync::remote::FetchError;

    /// Plays back one scripted result per fetch
    struct ScriptedRemote {
        passes: Mutex<VecDeque<Result<Vec<Person>, FetchError>>>,
    }

    impl ScriptedRemote {
        fn new(passes: Vec<Result<Vec<Person>, FetchError>>) -> Self {
            Self {
                passes: Mutex::new(passes.into()),
            }
        }
    }

    impl RemoteSource for ScriptedRemote {
        fn fetch(&self) -> Result<Vec<Person>, FetchError> {
            self.passes
                .lock()
                .unwrap()
                .pop_front()
                .expect("test scripted too few passes")
        }
    }

    /// Blocks inside fetch until released, used to hold a pass in flight
    struct BlockingRemote {
        release: Mutex<Receiver<()>>,
        records: Vec<Person>,
    }

    impl RemoteSource for BlockingRemote {
        fn fetch(&self) -> Result<Vec<Person>, FetchError> {
            self.release
                .lock()
                .unwrap()
                .recv()
                .expect("release sender dropped");

            Ok(self.records.clone())
        }
    }

    fn coordinator_with(
        passes: Vec<Result<Vec<Person>, FetchError>>,
        request_manager: RequestManager,
    ) -> SyncCoordinator {
        SyncCoordinator::new(Box::new(ScriptedRemote::new(passes)), request_manager)
    }

    #[test]
    fn completed_pass_merges_and_returns_the_refreshed_view() {
        let request_manager = spawn_store(test_options());

        let coordinator = coordinator_with(
            vec![Ok(vec![
                Person::new_test("Bo", "Ng"),
                Person::new_test("Ana", "Lee"),
            ])],
            request_manager,
        );

        let outcome = coordinator.trigger_sync().expect("store should respond");

        match outcome {
            SyncOutcome::Completed { refreshed } => {
                let first_names: Vec<&str> = refreshed
                    .iter()
                    .map(|person| person.first_name.as_str())
                    .collect();

                assert_eq!(first_names, vec!["Ana", "Bo"]);
            }
            other => panic!("expected a completed pass, got {:?}", other),
        }

        assert_eq!(coordinator.state(), SyncState::Idle);
    }

    #[test]
    fn fetch_failure_leaves_existing_records_untouched() {
        let request_manager = spawn_store(test_options());

        // Given a store that already holds data
        request_manager
            .send_upsert_all(vec![
                Person::new_test("Ana", "Lee"),
                Person::new_test("Bo", "Ng"),
            ])
            .expect("should not timeout");

        let before = request_manager
            .send_list(ListFilter::All)
            .expect("should not timeout");

        // When the remote fails
        let coordinator = coordinator_with(
            vec![Err(FetchError::Transport("connection refused".to_string()))],
            request_manager.clone(),
        );

        let outcome = coordinator.trigger_sync().expect("store should respond");

        // Then the failure is reported and reads are unchanged
        assert!(matches!(outcome, SyncOutcome::FetchFailed(_)));
        assert_eq!(coordinator.state(), SyncState::Idle);

        let after = request_manager
            .send_list(ListFilter::All)
            .expect("should not timeout");

        assert_eq!(before, after);
    }

    #[test]
    fn refreshed_view_respects_the_favourite_filter() {
        let request_manager = spawn_store(test_options());

        request_manager
            .send_upsert(Person::new_test("Ana", "Lee"))
            .expect("should not timeout");

        request_manager
            .send_toggle_favourite(PersonId::new("Ana".to_string(), "Lee".to_string()))
            .expect("should not timeout");

        let coordinator = coordinator_with(
            vec![Ok(vec![Person::new_test("Bo", "Ng")])],
            request_manager,
        );

        coordinator.set_favourite_filter(ListFilter::FavouritesOnly);

        let outcome = coordinator.trigger_sync().expect("store should respond");

        match outcome {
            SyncOutcome::Completed { refreshed } => {
                assert_eq!(refreshed.len(), 1);
                assert_eq!(refreshed[0].first_name, "Ana");
            }
            other => panic!("expected a completed pass, got {:?}", other),
        }
    }

    #[test]
    fn trigger_while_a_pass_is_in_flight_is_coalesced() {
        let request_manager = spawn_store(test_options());

        let (release_sender, release_receiver): (Sender<()>, Receiver<()>) = mpsc::channel();

        let coordinator = Arc::new(SyncCoordinator::new(
            Box::new(BlockingRemote {
                release: Mutex::new(release_receiver),
                records: vec![Person::new_test("Ana", "Lee")],
            }),
            request_manager,
        ));

        // Given a pass held in the fetching state
        let in_flight = {
            let coordinator = coordinator.clone();

            thread::spawn(move || coordinator.trigger_sync())
        };

        while coordinator.state() == SyncState::Idle {
            thread::sleep(Duration::from_millis(1));
        }

        // When a second trigger arrives
        let coalesced = coordinator.trigger_sync().expect("store should respond");

        // Then it backs off without touching the store
        assert_eq!(coalesced, SyncOutcome::AlreadyInFlight);

        release_sender.send(()).expect("fetch should be waiting");

        let outcome = in_flight
            .join()
            .expect("sync thread should not panic")
            .expect("store should respond");

        assert!(matches!(outcome, SyncOutcome::Completed { .. }));
        assert_eq!(coordinator.state(), SyncState::Idle);
    }

    mod end_to_end {
        use super::*;
        use crate::model::statement::UpsertOutcome;

        /// The full launch / favourite / re-launch flow: first sync creates the
        /// records, a toggle marks one favourite, the second sync refreshes
        /// fields while preserving the flag.
        #[test]
        fn re_sync_updates_fields_and_preserves_favourites() {
            let request_manager = spawn_store(test_options());

            let ana = Person::new_test("Ana", "Lee");
            let bo = Person::new_test("Bo", "Ng");

            let mut ana_moved = ana.clone();
            ana_moved.address.street_number = 7;
            ana_moved.address.street_name = "New Street".to_string();

            let mut bo_moved = bo.clone();
            bo_moved.address.street_number = 99;
            bo_moved.address.street_name = "Moved Street".to_string();

            let coordinator = coordinator_with(
                vec![
                    Ok(vec![ana.clone(), bo.clone()]),
                    Ok(vec![ana_moved.clone(), bo_moved.clone()]),
                ],
                request_manager.clone(),
            );

            // First sync
            let outcome = coordinator.trigger_sync().expect("store should respond");
            assert!(matches!(outcome, SyncOutcome::Completed { .. }));

            // User favourites Bo Ng
            let toggled = request_manager
                .send_toggle_favourite(bo.id())
                .expect("should not timeout");
            assert!(toggled);

            // Second sync carries updated addresses for both identities
            let outcome = coordinator.trigger_sync().expect("store should respond");
            assert!(matches!(outcome, SyncOutcome::Completed { .. }));

            // Favourites: exactly Bo Ng, with the new address and the flag intact
            let favourites = request_manager
                .send_list(ListFilter::FavouritesOnly)
                .expect("should not timeout");

            assert_eq!(favourites.len(), 1);
            assert_eq!(favourites[0].first_name, "Bo");
            assert_eq!(favourites[0].address.street_number, 99);
            assert_eq!(favourites[0].address.street_name, "Moved Street");
            assert!(favourites[0].is_favourite);

            // Full list: both records, sorted by first name, fields refreshed
            let all = request_manager
                .send_list(ListFilter::All)
                .expect("should not timeout");

            assert_eq!(all.len(), 2);
            assert_eq!(all[0].first_name, "Ana");
            assert_eq!(all[0].address.street_name, "New Street");
            assert!(!all[0].is_favourite);
            assert_eq!(all[1].first_name, "Bo");

            // A third upsert of the same identities would still be an update
            let outcomes = request_manager
                .send_upsert_all(vec![ana_moved, bo_moved])
                .expect("should not timeout");

            assert_eq!(
                outcomes,
                vec![UpsertOutcome::Updated, UpsertOutcome::Updated]
            );
        }
    }
}
