use std::thread;

use serde::Deserialize;
use thiserror::Error;
use tokio::{runtime::Builder, sync::mpsc};

use crate::model::person::{Address, Person, PictureUrls};

pub const DEFAULT_ENDPOINT: &str = "https://randomuser.me/api";
pub const DEFAULT_RESULT_COUNT: u16 = 20;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport failure during remote fetch: {0}")]
    Transport(String),

    #[error("Failed to decode the remote document: {0}")]
    Decode(String),

    /// The fetch was abandoned before it completed, no result was delivered
    #[error("Remote fetch was abandoned before it completed")]
    Cancelled,
}

/// Source of truth for the directory, fetched once per sync pass.
/// Implementations deliver a full result set or an error, never a partial
/// set.
pub trait RemoteSource {
    fn fetch(&self) -> Result<Vec<Person>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub result_count: u16,
}

impl RemoteConfig {
    pub fn url(&self) -> String {
        format!("{}?results={}", self.endpoint, self.result_count)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            result_count: DEFAULT_RESULT_COUNT,
        }
    }
}

// Wire layout of the remote document, see https://randomuser.me/documentation
#[derive(Deserialize, Debug)]
struct WireResponse {
    results: Vec<WirePerson>,
}

#[derive(Deserialize, Debug)]
struct WirePerson {
    gender: String,
    name: WireName,
    location: WireLocation,
    phone: String,
    picture: WirePicture,
}

#[derive(Deserialize, Debug)]
struct WireName {
    first: String,
    last: String,
}

#[derive(Deserialize, Debug)]
struct WireLocation {
    street: WireStreet,
    city: String,
    country: String,
    coordinates: WireCoordinates,
}

#[derive(Deserialize, Debug)]
struct WireStreet {
    number: i32,
    name: String,
}

#[derive(Deserialize, Debug)]
struct WireCoordinates {
    latitude: String,
    longitude: String,
}

#[derive(Deserialize, Debug)]
struct WirePicture {
    medium: String,
    large: String,
}

impl From<WirePerson> for Person {
    fn from(wire: WirePerson) -> Self {
        Person {
            first_name: wire.name.first,
            last_name: wire.name.last,
            gender: wire.gender,
            address: Address {
                street_number: wire.location.street.number,
                street_name: wire.location.street.name,
                city: wire.location.city,
                country: wire.location.country,
                latitude: wire.location.coordinates.latitude,
                longitude: wire.location.coordinates.longitude,
            },
            phone: wire.phone,
            picture: PictureUrls {
                medium: wire.picture.medium,
                large: wire.picture.large,
            },
            // Favourites are local state, the wire never carries them
            is_favourite: false,
        }
    }
}

pub fn decode_people(document: &str) -> Result<Vec<Person>, FetchError> {
    let response: WireResponse =
        serde_json::from_str(document).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(response.results.into_iter().map(Person::from).collect())
}

struct FetchRequest {
    resolver: oneshot::Sender<Result<Vec<Person>, FetchError>>,
}

/// Fetches the remote document over HTTP. The network I/O runs on a dedicated
/// tokio runtime thread, callers block on a oneshot for the decoded result.
pub struct HttpRemoteSource {
    request_sender: mpsc::Sender<FetchRequest>,
}

impl HttpRemoteSource {
    pub fn start(config: RemoteConfig) -> Self {
        let (request_sender, mut request_receiver) = mpsc::channel::<FetchRequest>(16);

        let _ = thread::Builder::new()
            .name("Remote Fetch".to_string())
            .spawn(move || {
                let rt = match Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        log::error!("Failed to start the remote fetch runtime: {}", e);
                        return;
                    }
                };

                rt.block_on(async move {
                    let client = reqwest::Client::new();
                    let url = config.url();

                    while let Some(FetchRequest { resolver }) = request_receiver.recv().await {
                        let outcome = fetch_document(&client, &url).await;

                        // The resolver is gone if the caller was torn down, in
                        // which case the result is dropped and never applied
                        let _ = resolver.send(outcome);
                    }
                });
            });

        Self { request_sender }
    }
}

async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<Person>, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    decode_people(&body)
}

impl RemoteSource for HttpRemoteSource {
    fn fetch(&self) -> Result<Vec<Person>, FetchError> {
        let (resolver, response_receiver) = oneshot::channel::<Result<Vec<Person>, FetchError>>();

        self.request_sender
            .blocking_send(FetchRequest { resolver })
            .map_err(|_| FetchError::Transport("remote fetch worker has shut down".to_string()))?;

        match response_receiver.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Cancelled),
        }
    }
}
