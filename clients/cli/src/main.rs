use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Context;
use clap::{Parser, Subcommand};

use store::consts::consts::PersonId;
use store::model::person::Person;
use store::model::statement::ListFilter;
use store::store::commands::StoreCommandRequest;
use store::store::options::StoreOptions;
use store::store::request_manager::RequestManager;
use store::store::store::PersonStore;
use store::sync::coordinator::{SyncCoordinator, SyncOutcome};
use store::sync::remote::{HttpRemoteSource, RemoteConfig, DEFAULT_ENDPOINT, DEFAULT_RESULT_COUNT};

/// 📀 Person directory CLI, syncs remote people into a durable local store
#[derive(Parser, Debug)]
struct Cli {
    /// Location of the store. Reads / writes to this directory. Note: Does not support shell paths, e.g. ~
    #[clap(short, long, default_value = "data")]
    data: std::path::PathBuf,

    /// Remote endpoint to sync from
    #[clap(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Number of people requested per sync
    #[clap(long, default_value_t = DEFAULT_RESULT_COUNT)]
    results: u16,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the remote directory and merge it into the store
    Sync {
        /// Print only favourites after the sync completes
        #[clap(long)]
        favourites: bool,
    },
    /// Print the stored directory
    List {
        /// Print only favourites
        #[clap(long)]
        favourites: bool,
    },
    /// Flip the favourite flag on a person
    Toggle { first_name: String, last_name: String },
    /// Drop every record and reset the on-disk state
    Clear,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Cli::parse();

    let store_options = StoreOptions::default().set_storage_engine(
        store::persistence::storage::StorageEngine::File(args.data.clone()),
    );

    let (command_sender, command_receiver): (
        Sender<StoreCommandRequest>,
        Receiver<StoreCommandRequest>,
    ) = mpsc::channel();

    // Setup store thread
    let store_thread = thread::spawn(move || {
        let mut person_store = PersonStore::new(command_receiver, store_options);

        person_store.run();
    });

    let request_manager = RequestManager::new(command_sender);

    match args.command {
        Command::Sync { favourites } => {
            let remote = HttpRemoteSource::start(RemoteConfig {
                endpoint: args.endpoint,
                result_count: args.results,
            });

            let coordinator = SyncCoordinator::new(Box::new(remote), request_manager.clone());

            coordinator.set_favourite_filter(filter_from(favourites));

            match coordinator.trigger_sync().context("sync pass failed")? {
                SyncOutcome::Completed { refreshed } => print_people(&refreshed),
                SyncOutcome::FetchFailed(reason) => {
                    log::warn!("Sync skipped, remote fetch failed: {}", reason);

                    // Existing records keep serving the list
                    let people = request_manager
                        .send_list(filter_from(favourites))
                        .context("list failed")?;

                    print_people(&people);
                }
                SyncOutcome::AlreadyInFlight => unreachable!("single trigger cannot coalesce"),
            }
        }
        Command::List { favourites } => {
            let people = request_manager
                .send_list(filter_from(favourites))
                .context("list failed")?;

            print_people(&people);
        }
        Command::Toggle {
            first_name,
            last_name,
        } => {
            let id = PersonId::new(first_name, last_name);

            let is_favourite = request_manager
                .send_toggle_favourite(id.clone())
                .with_context(|| format!("toggle failed for {}", id))?;

            println!(
                "{} is {} a favourite",
                id,
                if is_favourite { "now" } else { "no longer" }
            );
        }
        Command::Clear => {
            let status = request_manager.send_clear_request().context("clear failed")?;

            println!("{}", status);
        }
    }

    // Snapshot on the way out so the next run restores without a replay
    let snapshot_status = request_manager
        .send_snapshot_request()
        .context("snapshot failed")?;

    log::info!("{}", snapshot_status);

    request_manager
        .send_shutdown_request()
        .context("store did not acknowledge shutdown")?;

    store_thread
        .join()
        .map_err(|_| anyhow::anyhow!("store thread panicked"))?;

    Ok(())
}

fn filter_from(favourites: bool) -> ListFilter {
    if favourites {
        ListFilter::FavouritesOnly
    } else {
        ListFilter::All
    }
}

fn print_people(people: &[Person]) {
    if people.is_empty() {
        println!("No records");
        return;
    }

    for person in people {
        println!(
            "{}{} {} | {} {}, {}, {} | {}",
            if person.is_favourite { "★ " } else { "  " },
            person.first_name,
            person.last_name,
            person.address.street_number,
            person.address.street_name,
            person.address.city,
            person.address.country,
            person.phone,
        );
    }
}
