use super::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{spawn, JoinHandle};

/// The outcome of one search request, tagged with its generation id.
#[derive(Debug)]
pub struct SearchResponse {
    pub id: u64,
    pub term: String,
    pub result: Result<Vec<Suggestion>, SearchError>,
}

/// Issues search requests on worker threads and hands back responses on the
/// UI thread.
///
/// Every request gets a fresh generation id. Only responses carrying the id
/// of the most recent request survive [`SuggestionFetcher::poll`]; a slow
/// response to a superseded keystroke can never overwrite a newer view.
pub struct SuggestionFetcher {
    endpoint: String,
    channel: (Sender<SearchResponse>, Receiver<SearchResponse>),
    workers: Vec<(u64, JoinHandle<()>)>,
    latest: u64,
}

impl SuggestionFetcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel: unbounded(),
            workers: vec![],
            latest: 0,
        }
    }

    /// The generation id of the most recent request.
    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Issues one request for `term` on a worker thread.
    pub fn request(&mut self, term: &str) -> u64 {
        self.latest += 1;
        let id = self.latest;

        let tx = self.channel.0.clone();
        let endpoint = self.endpoint.clone();
        let term = term.to_string();

        self.workers.push((
            id,
            spawn(move || {
                let result = fetch_suggestions(&endpoint, &term);
                if tx.send(SearchResponse { id, term, result }).is_err() {
                    log::debug!("Could not send the search response. This most likely happened because the app was terminated.")
                }
            }),
        ));

        id
    }

    /// Drains all pending responses and returns the current-generation one,
    /// if it arrived. Stale responses are dropped on the floor.
    pub fn poll(&mut self) -> Option<SearchResponse> {
        let mut fresh = None;

        for response in self.channel.1.try_iter() {
            // Reap the worker that produced this response.
            if let Some(i) = self.workers.iter().position(|w| w.0 == response.id) {
                let worker = self.workers.remove(i);
                if let Err(e) = worker.1.join() {
                    log::error!(
                        "Failed to join search worker thread for request {}. Reason:\r\n{:?}",
                        worker.0,
                        e
                    );
                }
            }

            if response.id == self.latest {
                fresh = Some(response);
            } else {
                log::debug!(
                    "Discarding stale search response {} for term '{}'.",
                    response.id,
                    response.term
                );
            }
        }

        fresh
    }
}

fn fetch_suggestions(endpoint: &str, term: &str) -> Result<Vec<Suggestion>, SearchError> {
    let response = ureq::get(endpoint).query("term", term).call();

    if response.ok() {
        let body = response
            .into_string()
            .map_err(|e| SearchError::Io(e.to_string()))?;
        decode_suggestions(&body)
    } else {
        log::warn!(
            "Search request for '{}' failed. Reason:\r\n{:?}",
            term,
            response.status()
        );
        Err(SearchError::Http(response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(id: u64, term: &str, data: &str) -> SearchResponse {
        SearchResponse {
            id,
            term: term.into(),
            result: Ok(vec![Suggestion {
                label: term.into(),
                data: data.into(),
            }]),
        }
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut fetcher = SuggestionFetcher::new("http://localhost/search");
        fetcher.latest = 2;

        fetcher.channel.0.send(response(1, "ac", "stale")).unwrap();
        fetcher.channel.0.send(response(2, "acm", "fresh")).unwrap();

        let polled = fetcher.poll().unwrap();
        assert_eq!(polled.id, 2);
        assert_eq!(polled.result.unwrap()[0].data, "fresh");
    }

    #[test]
    fn only_stale_responses_yield_nothing() {
        let mut fetcher = SuggestionFetcher::new("http://localhost/search");
        fetcher.latest = 5;

        fetcher.channel.0.send(response(3, "ac", "old")).unwrap();

        assert!(fetcher.poll().is_none());
    }

    #[test]
    fn request_ids_are_monotonic() {
        let mut fetcher = SuggestionFetcher::new("http://localhost:1/nowhere");

        let first = fetcher.request("ac");
        let second = fetcher.request("acm");

        assert!(second > first);
        assert_eq!(fetcher.latest(), second);
    }
}
