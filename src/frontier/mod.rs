//! URL frontier: per-host FIFO queues behind one synchronization point
//!
//! The frontier owns crawl-order state: which URLs have been seen, which are
//! queued per host, how deep each task sits, and whether the run-wide fetch
//! budget is spent. Workers claim tasks through [`Frontier::next_task`], which
//! releases a task only when its host's politeness gates are open and a global
//! concurrency permit is available.
//!
//! Completion detection: a claimed task counts as in flight until the worker
//! calls [`Frontier::mark_completed`] *after* enqueueing any links it
//! discovered. The crawl is drained when no task is queued and none is in
//! flight.

mod host_state;

pub use host_state::HostState;

use crate::config::RateLimitConfig;
use crate::url::in_scope;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use url::Url;

/// Poll interval while waiting for in-flight fetches to surface new work
const IDLE_POLL: Duration = Duration::from_millis(25);

/// What a URL is expected to be, driving parse and link discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// An edition table of contents (`policy.html`)
    Toc,
    /// A numbered content page (`p<N>.html`)
    ContentPage,
    /// A PDF rendition
    PdfDocument,
}

/// A unit of crawl work
#[derive(Debug, Clone)]
pub struct UrlTask {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link distance from the seed that led here
    pub depth: u32,

    /// Expected page role
    pub kind: TaskKind,

    /// URL of the page this task was discovered on
    pub parent: Option<String>,
}

/// Outcome of offering a task to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Accepted and queued
    Queued,
    /// URL was already seen this run (or pre-seeded from a previous run)
    AlreadySeen,
    /// Task depth exceeds the configured depth limit
    TooDeep,
    /// Host or year falls outside the configured crawl scope
    OutOfScope,
    /// The frontier has been stopped
    Stopped,
}

/// A claimed task; holds a global concurrency permit until dropped
pub struct ClaimedTask {
    pub task: UrlTask,
    _permit: OwnedSemaphorePermit,
}

/// Point-in-time frontier counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierStats {
    /// Distinct URLs ever admitted or pre-seeded
    pub seen: usize,
    /// Tasks waiting in host queues
    pub queued: usize,
    /// Tasks claimed but not yet marked completed
    pub in_flight: usize,
    /// Tasks marked completed
    pub completed: u64,
    /// Hosts with politeness state
    pub hosts: usize,
}

struct Inner {
    queues: HashMap<String, VecDeque<UrlTask>>,
    hosts: HashMap<String, HostState>,
    visited: HashSet<String>,
    queued: usize,
    in_flight: usize,
    claimed: usize,
    completed: u64,
    stopped: bool,
}

impl Inner {
    /// Pops the front task of some host whose politeness gates are open
    fn claim_ready(&mut self, limits: &RateLimitConfig, now: Instant) -> Option<UrlTask> {
        let host = self.queues.iter().find_map(|(host, queue)| {
            if queue.is_empty() {
                return None;
            }
            let ready = self
                .hosts
                .get(host)
                .map_or(true, |state| state.can_request(limits, now));
            ready.then(|| host.clone())
        })?;

        let task = self.queues.get_mut(&host)?.pop_front()?;
        self.hosts
            .entry(host)
            .or_insert_with(HostState::new)
            .record_request(now);
        self.queued -= 1;
        self.in_flight += 1;
        self.claimed += 1;
        Some(task)
    }

    /// Shortest spacing wait among hosts that have queued work
    fn shortest_wait(&self, limits: &RateLimitConfig, now: Instant) -> Option<Duration> {
        self.queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .filter_map(|(host, _)| {
                self.hosts
                    .get(host)
                    .map(|state| state.time_until_ready(limits, now))
            })
            .min()
            .filter(|wait| !wait.is_zero())
    }
}

/// The URL frontier
pub struct Frontier {
    limits: RateLimitConfig,
    depth_limit: u32,
    max_pages: usize,
    allowed_hosts: Vec<String>,
    years: Vec<u16>,
    global: Arc<Semaphore>,
    inner: Mutex<Inner>,
}

impl Frontier {
    pub fn new(
        limits: RateLimitConfig,
        depth_limit: u32,
        max_pages: usize,
        allowed_hosts: Vec<String>,
        years: Vec<u16>,
    ) -> Self {
        let global = Arc::new(Semaphore::new(limits.global_concurrency));
        Self {
            limits,
            depth_limit,
            max_pages,
            allowed_hosts,
            years,
            global,
            inner: Mutex::new(Inner {
                queues: HashMap::new(),
                hosts: HashMap::new(),
                visited: HashSet::new(),
                queued: 0,
                in_flight: 0,
                claimed: 0,
                completed: 0,
                stopped: false,
            }),
        }
    }

    /// Offers a task to the frontier
    ///
    /// Admission checks run in order: stop flag, depth, scope, then the
    /// visited set. An admitted URL is marked seen immediately, so the same
    /// URL can never be queued twice no matter how many pages link to it.
    pub async fn enqueue(&self, task: UrlTask) -> AdmitOutcome {
        let mut inner = self.inner.lock().await;

        if inner.stopped {
            return AdmitOutcome::Stopped;
        }
        if task.depth > self.depth_limit {
            return AdmitOutcome::TooDeep;
        }
        if !in_scope(&task.url, &self.allowed_hosts, &self.years) {
            return AdmitOutcome::OutOfScope;
        }
        if !inner.visited.insert(task.url.as_str().to_string()) {
            return AdmitOutcome::AlreadySeen;
        }

        let host = task
            .url
            .host_str()
            .map(|h| h.to_lowercase())
            .unwrap_or_default();
        inner.queues.entry(host).or_default().push_back(task);
        inner.queued += 1;
        AdmitOutcome::Queued
    }

    /// Marks URLs as already seen without queueing them
    ///
    /// Used when resuming: URLs recorded in a previous run's output are
    /// pre-seeded so the crawl does not fetch them again.
    pub async fn seed_visited<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut inner = self.inner.lock().await;
        let before = inner.visited.len();
        inner.visited.extend(urls);
        inner.visited.len() - before
    }

    /// Claims the next task whose host is ready
    ///
    /// Waits for a global concurrency permit, then for some host's politeness
    /// gates to open. Returns `None` when the crawl is over for this worker:
    /// the frontier is stopped, the `max_pages` budget is spent, or no task
    /// is queued and none is in flight.
    pub async fn next_task(&self) -> Option<ClaimedTask> {
        let permit = self.global.clone().acquire_owned().await.ok()?;

        loop {
            let wait = {
                let mut inner = self.inner.lock().await;

                if inner.stopped || inner.claimed >= self.max_pages {
                    return None;
                }

                if inner.queued == 0 {
                    if inner.in_flight == 0 {
                        return None;
                    }
                    // In-flight fetches may still discover links
                    IDLE_POLL
                } else {
                    let now = Instant::now();
                    if let Some(task) = inner.claim_ready(&self.limits, now) {
                        return Some(ClaimedTask {
                            task,
                            _permit: permit,
                        });
                    }
                    inner.shortest_wait(&self.limits, now).unwrap_or(IDLE_POLL)
                }
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Marks a claimed task completed
    ///
    /// Must be called after any discovered links have been enqueued, or the
    /// drain check could see an empty frontier while links are still pending.
    pub async fn mark_completed(&self, url: &Url) {
        let mut inner = self.inner.lock().await;
        if let Some(host) = url.host_str() {
            if let Some(state) = inner.hosts.get_mut(&host.to_lowercase()) {
                state.complete_request();
            }
        }
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.completed += 1;
    }

    /// Stops the frontier; queued tasks are abandoned, in-flight tasks finish
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        inner.stopped = true;
    }

    pub async fn stats(&self) -> FrontierStats {
        let inner = self.inner.lock().await;
        FrontierStats {
            seen: inner.visited.len(),
            queued: inner.queued,
            in_flight: inner.in_flight,
            completed: inner.completed,
            hosts: inner.hosts.len(),
        }
    }
}
