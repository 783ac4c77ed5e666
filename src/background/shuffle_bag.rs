//! Random image selection without immediate repeats.
//!
//! Works like drawing marbles from a bag: every URL is drawn once before the
//! bag is refilled, and a draw equal to the image currently on screen is put
//! aside and replaced by another draw. The remaining bag is exposed through
//! [`ShuffleBag::pool`] so it can be persisted and restored across restarts.

use std::collections::HashMap;

use rand::{rngs::StdRng, Rng};
use url::Url;

pub struct ShuffleBag {
    urls: Vec<String>,
    pool: Vec<String>,
    rng: StdRng,
}

impl ShuffleBag {
    pub fn new(rng: StdRng) -> Self {
        Self {
            urls: Vec::new(),
            pool: Vec::new(),
            rng,
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Remaining, not yet drawn entries.
    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Replaces the candidate list and starts a fresh bag.
    pub fn set_urls(&mut self, urls: Vec<String>) {
        self.pool = urls.clone();
        self.urls = urls;
    }

    /// Replaces the candidate list but keeps the persisted bag, minus blanks
    /// and anything the list no longer contains (counting duplicates).
    pub fn restore(&mut self, urls: Vec<String>, persisted_pool: &[String]) {
        let mut available: HashMap<&str, usize> = HashMap::new();
        for url in &urls {
            *available.entry(url.as_str()).or_default() += 1;
        }

        let mut pool = Vec::with_capacity(persisted_pool.len());
        for entry in persisted_pool {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if let Some(left) = available.get_mut(entry) {
                if *left > 0 {
                    *left -= 1;
                    pool.push(entry.to_string());
                }
            }
        }

        self.pool = pool;
        self.urls = urls;
    }

    /// Draws the next URL, `None` when there are no candidates at all.
    ///
    /// A draw equal to `last_image_url` is rejected unless every candidate is
    /// that URL. When `prevent_cache` is set the result carries a random
    /// fragment; the bag itself only ever holds plain URLs.
    pub fn next(&mut self, prevent_cache: bool, last_image_url: &str) -> Option<String> {
        if self.urls.is_empty() {
            return None;
        }
        if self.pool.is_empty() {
            self.refill();
        }

        let repeat_unavoidable = self.urls.iter().all(|url| url == last_image_url);

        let picked = loop {
            let index = self.rng.gen_range(0..self.pool.len());
            let candidate = self.pool.remove(index);

            // Refill before judging so the next draw always has something.
            if self.pool.is_empty() {
                self.refill();
            }

            if self.urls.contains(&candidate)
                && (repeat_unavoidable || candidate != last_image_url)
            {
                break candidate;
            }
        };

        if prevent_cache {
            let token: u32 = self.rng.gen();
            Some(with_fragment(&picked, &token.to_string()))
        } else {
            Some(picked)
        }
    }

    fn refill(&mut self) {
        self.pool = self.urls.clone();
    }
}

/// Sets the URL fragment, replacing any existing one. Strings that do not
/// parse as absolute URLs get the fragment appended verbatim.
pub fn with_fragment(url: &str, fragment: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(Some(fragment));
            parsed.into()
        }
        Err(_) => {
            let base = url.split('#').next().unwrap_or(url);
            format!("{base}#{fragment}")
        }
    }
}
