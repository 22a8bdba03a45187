//! Robots.txt gate
//!
//! The crawl needs only a yes/no answer per URL before fetching. The gate is
//! a trait so tests can substitute a fixed policy; the real implementation
//! wraps the `robotstxt` matcher over robots.txt bodies fetched once per host
//! at startup. A host with no robots.txt (or an unreadable one) is treated as
//! allowing everything.

use std::collections::HashMap;
use url::Url;

/// Yes/no fetch gate consulted before any request for a URL goes out
pub trait RobotsPolicy: Send + Sync {
    fn is_allowed(&self, url: &Url) -> bool;
}

/// Policy that allows every URL (robots checking disabled)
pub struct AllowAll;

impl RobotsPolicy for AllowAll {
    fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}

/// Policy backed by per-host robots.txt bodies
pub struct RobotsTxtPolicy {
    user_agent: String,
    bodies: HashMap<String, String>,
}

impl RobotsTxtPolicy {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            bodies: HashMap::new(),
        }
    }

    /// Registers the robots.txt body for a host
    pub fn add_host(&mut self, host: &str, body: String) {
        self.bodies.insert(host.to_lowercase(), body);
    }

    /// Fetches robots.txt from each seed's origin and registers the bodies
    ///
    /// One fetch per distinct host. A missing or failing robots.txt leaves
    /// the host unrestricted.
    pub async fn load_from_seeds(&mut self, client: &reqwest::Client, seeds: &[Url]) {
        for seed in seeds {
            let Some(host) = seed.host_str().map(|h| h.to_lowercase()) else {
                continue;
            };
            if self.bodies.contains_key(&host) {
                continue;
            }
            let Ok(robots_url) = seed.join("/robots.txt") else {
                continue;
            };
            match client.get(robots_url).send().await {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(body) => {
                        tracing::debug!("Loaded robots.txt for {} ({} bytes)", host, body.len());
                        self.add_host(&host, body);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read robots.txt body for {}: {}", host, e);
                    }
                },
                Ok(response) => {
                    tracing::debug!(
                        "No robots.txt for {} (HTTP {}), allowing all",
                        host,
                        response.status()
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch robots.txt for {}: {}", host, e);
                }
            }
        }
    }
}

impl RobotsPolicy for RobotsTxtPolicy {
    fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        match self.bodies.get(&host.to_lowercase()) {
            Some(body) => robotstxt::DefaultMatcher::default().one_agent_allowed_by_robots(
                body,
                &self.user_agent,
                url.as_str(),
            ),
            None => true,
        }
    }
}
