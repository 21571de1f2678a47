use dashmap::DashMap;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Identifies a rendered region: a fragment name plus the values it varies on,
/// e.g. `("index_page", ["2"])` for the second page of the index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    name: &'static str,
    vary_on: Vec<String>,
}

impl FragmentKey {
    pub fn new<I>(name: &'static str, vary_on: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        Self {
            name,
            vary_on: vary_on.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

#[derive(Debug)]
struct Entry {
    html: String,
    expires_at: Instant,
}

impl Entry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Process-wide cache of rendered page fragments.
///
/// Entries are only ever invalidated by expiry. Writes to the store do not
/// touch the cache, so a cached fragment may be stale for up to its TTL.
#[derive(Debug, Default)]
pub struct FragmentCache {
    entries: DashMap<FragmentKey, Entry>,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fragment if it is present and has not expired.
    pub fn get(&self, key: &FragmentKey) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh() => return Some(entry.html.to_owned()),
            Some(_) => {}
            None => return None,
        }

        // The read guard must be released before removing.
        self.entries.remove_if(key, |_, entry| !entry.is_fresh());
        None
    }

    pub fn set(&self, key: FragmentKey, html: String, ttl: Duration) {
        self.entries.insert(
            key,
            Entry {
                html,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the cached fragment, or renders, stores and returns it.
    /// `render` only runs on a miss. A failed render is not cached.
    pub async fn get_or_render<F, Fut, E>(
        &self,
        key: FragmentKey,
        ttl: Duration,
        render: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(html) = self.get(&key) {
            log::debug!("fragment cache hit: {:?}", key);
            return Ok(html);
        }

        let html = render().await?;
        self.set(key, html.to_owned(), ttl);
        Ok(html)
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.get(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_vary_on_values() {
        let one = FragmentKey::new("index_page", [1]);
        let two = FragmentKey::new("index_page", [2]);
        assert_ne!(one, two);
        assert_eq!(one, FragmentKey::new("index_page", ["1"]));
        assert_eq!(one.name(), "index_page");
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = FragmentCache::new();
        let key = FragmentKey::new("index_page", [1]);
        cache.set(key.clone(), "<p>hi</p>".to_owned(), Duration::from_secs(60));

        assert_eq!(cache.get(&key).as_deref(), Some("<p>hi</p>"));
        assert!(cache.contains(&key));
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = FragmentCache::new();
        let key = FragmentKey::new("index_page", [1]);
        cache.set(key.clone(), "<p>old</p>".to_owned(), Duration::ZERO);

        assert_eq!(cache.get(&key), None);
        assert!(cache.entries.is_empty());
    }

    #[actix_rt::test]
    async fn test_get_or_render_renders_once() {
        let cache = FragmentCache::new();
        let key = FragmentKey::new("index_page", [1]);
        let ttl = Duration::from_secs(60);

        let first: Result<String, ()> = cache
            .get_or_render(key.clone(), ttl, || async { Ok("a".to_owned()) })
            .await;
        let second: Result<String, ()> = cache
            .get_or_render(key, ttl, || async { Ok("b".to_owned()) })
            .await;

        assert_eq!(first, Ok("a".to_owned()));
        assert_eq!(second, Ok("a".to_owned()));
    }

    #[actix_rt::test]
    async fn test_failed_render_is_not_cached() {
        let cache = FragmentCache::new();
        let key = FragmentKey::new("index_page", [1]);

        let res: Result<String, &str> = cache
            .get_or_render(key.clone(), Duration::from_secs(60), || async { Err("boom") })
            .await;

        assert_eq!(res, Err("boom"));
        assert!(!cache.contains(&key));
    }
}
