//! Response cache, debouncing and per-mode document trimming.
//!
//! The optimizer sits between the orchestrator and the network. It is shared
//! by every operation of one session and holds its state behind short,
//! non-async critical sections.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use scribe_core::Mode;
use scribe_logging::{scribe_debug, scribe_trace};

use crate::{AiError, OperationParams};

#[derive(Debug, Clone)]
pub struct OptimizerSettings {
    pub cache_ttl: Duration,
    pub max_cache_entries: usize,
    /// Quiet period a debounced request waits for before dispatching.
    pub debounce_delay: Duration,
    pub prompt_context_chars: usize,
    pub continue_context_chars: usize,
    pub modify_context_chars: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            max_cache_entries: 50,
            debounce_delay: Duration::from_millis(300),
            prompt_context_chars: 4000,
            continue_context_chars: 6000,
            modify_context_chars: 2000,
        }
    }
}

impl OptimizerSettings {
    pub fn context_limit(&self, mode: Mode) -> Option<usize> {
        match mode {
            Mode::Prompt => Some(self.prompt_context_chars),
            Mode::Continue => Some(self.continue_context_chars),
            Mode::Modify => Some(self.modify_context_chars),
            Mode::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub cache: bool,
    pub debounce: bool,
    pub optimize_content: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            cache: true,
            debounce: false,
            optimize_content: true,
        }
    }
}

/// Provisional result shown while the real response is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticUpdate {
    pub mode: Mode,
    pub params: OperationParams,
    pub placeholder: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizerMetrics {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub network_requests: u64,
    /// Debounced requests superseded before dispatch.
    pub coalesced_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
    pub cache_entries: usize,
}

impl OptimizerMetrics {
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.total_requests as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedResponse {
    pub content: String,
    pub cached: bool,
}

#[derive(Debug)]
struct CacheEntry {
    content: String,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct OptimizerInner {
    cache: HashMap<String, CacheEntry>,
    debounce_generation: HashMap<Mode, u64>,
    metrics: OptimizerMetrics,
    total_response_time: Duration,
    successful_requests: u64,
}

#[derive(Debug, Default)]
pub struct PerformanceOptimizer {
    settings: OptimizerSettings,
    inner: Mutex<OptimizerInner>,
}

impl PerformanceOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(OptimizerInner::default()),
        }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, OptimizerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Routes one operation through the cache and debouncer, calling
    /// `dispatch` with the optimized document content on a miss.
    pub async fn optimized_request<F, Fut>(
        &self,
        mode: Mode,
        content: &str,
        params: &OperationParams,
        options: RequestOptions,
        dispatch: F,
    ) -> Result<OptimizedResponse, AiError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String, AiError>>,
    {
        let content = if options.optimize_content {
            self.optimize_document_content(content, mode)
        } else {
            content.to_string()
        };
        let key = cache_key(mode, &content, params);
        self.lock().metrics.total_requests += 1;

        if options.cache {
            if let Some(hit) = self.cached(&key) {
                scribe_debug!("Cache hit for {} request", mode);
                return Ok(OptimizedResponse {
                    content: hit,
                    cached: true,
                });
            }
        }

        if options.debounce {
            self.debounce(mode).await?;
        }

        self.lock().metrics.network_requests += 1;
        let started = Instant::now();
        let result = dispatch(content).await;
        let elapsed = started.elapsed();

        let mut inner = self.lock();
        match result {
            Ok(response) => {
                inner.total_response_time += elapsed;
                inner.successful_requests += 1;
                inner.metrics.average_response_time =
                    average(inner.total_response_time, inner.successful_requests);
                if options.cache {
                    inner.cache.insert(
                        key,
                        CacheEntry {
                            content: response.clone(),
                            stored_at: Instant::now(),
                        },
                    );
                    evict_oldest(&mut inner.cache, self.settings.max_cache_entries);
                    inner.metrics.cache_entries = inner.cache.len();
                }
                Ok(OptimizedResponse {
                    content: response,
                    cached: false,
                })
            }
            Err(error) => {
                inner.metrics.failed_requests += 1;
                Err(error)
            }
        }
    }

    fn cached(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        let ttl = self.settings.cache_ttl;
        let fresh = inner
            .cache
            .get(key)
            .map(|entry| (entry.stored_at.elapsed() <= ttl, entry.content.clone()));
        match fresh {
            Some((true, content)) => {
                inner.metrics.cache_hits += 1;
                Some(content)
            }
            Some((false, _)) => {
                scribe_trace!("Expiring cache entry {}", key);
                inner.cache.remove(key);
                inner.metrics.cache_entries = inner.cache.len();
                None
            }
            None => None,
        }
    }

    async fn debounce(&self, mode: Mode) -> Result<(), AiError> {
        let generation = {
            let mut inner = self.lock();
            let slot = inner.debounce_generation.entry(mode).or_insert(0);
            *slot += 1;
            *slot
        };
        tokio::time::sleep(self.settings.debounce_delay).await;

        let mut inner = self.lock();
        if inner.debounce_generation.get(&mode).copied() != Some(generation) {
            inner.metrics.coalesced_requests += 1;
            scribe_debug!("Debounced {} request superseded", mode);
            return Err(AiError::cancelled("superseded by a newer request"));
        }
        Ok(())
    }

    /// Normalizes whitespace and keeps the tail of the document up to the
    /// mode's context limit.
    pub fn optimize_document_content(&self, content: &str, mode: Mode) -> String {
        let normalized = collapse_blank_lines(content.trim());
        match self.settings.context_limit(mode) {
            Some(limit) => keep_tail_chars(&normalized, limit).to_string(),
            None => normalized,
        }
    }

    pub fn create_optimistic_update(&self, mode: Mode, params: &OperationParams) -> OptimisticUpdate {
        let placeholder = match params {
            OperationParams::Prompt { prompt, .. } => {
                format!("Working on \"{}\"...", preview_of(prompt, 40))
            }
            OperationParams::Continue { .. } => "Continuing your text...".to_string(),
            OperationParams::Modify {
                modification_type, ..
            } => format!("Applying {}...", modification_type.as_str().replace('_', " ")),
        };
        OptimisticUpdate {
            mode,
            params: params.clone(),
            placeholder,
            created_at: Utc::now(),
        }
    }

    pub fn metrics(&self) -> OptimizerMetrics {
        self.lock().metrics.clone()
    }

    pub fn clear_cache(&self) {
        let mut inner = self.lock();
        inner.cache.clear();
        inner.metrics.cache_entries = 0;
    }

    /// Makes every request still waiting out its debounce resolve as cancelled.
    pub fn cancel_pending_requests(&self) {
        let mut inner = self.lock();
        for generation in inner.debounce_generation.values_mut() {
            *generation += 1;
        }
    }
}

pub fn cache_key(mode: Mode, content: &str, params: &OperationParams) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    hasher.update([0u8]);
    hasher.update(params.cache_fragment().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn average(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(count) => total / count,
        Err(_) => Duration::ZERO,
    }
}

fn evict_oldest(cache: &mut HashMap<String, CacheEntry>, max_entries: usize) {
    while cache.len() > max_entries {
        let Some(oldest) = cache
            .iter()
            .min_by_key(|(_, entry)| entry.stored_at)
            .map(|(key, _)| key.clone())
        else {
            break;
        };
        cache.remove(&oldest);
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

fn keep_tail_chars(text: &str, limit: usize) -> &str {
    let total = text.chars().count();
    if total <= limit {
        return text;
    }
    match text.char_indices().nth(total - limit) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

fn preview_of(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_trimming_respects_char_boundaries() {
        assert_eq!(keep_tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(keep_tail_chars("abc", 10), "abc");
    }

    #[test]
    fn blank_line_runs_collapse() {
        assert_eq!(collapse_blank_lines("a  \n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn cache_key_depends_on_every_component() {
        let params = OperationParams::prompt("hi", 0);
        let base = cache_key(Mode::Prompt, "doc", &params);
        assert_eq!(base, cache_key(Mode::Prompt, "doc", &params));
        assert_ne!(base, cache_key(Mode::Prompt, "doc2", &params));
        assert_ne!(base, cache_key(Mode::Prompt, "doc", &OperationParams::prompt("hi", 1)));
        assert_eq!(base.len(), 64);
    }

    #[test]
    fn optimistic_placeholder_names_the_operation() {
        let optimizer = PerformanceOptimizer::default();
        let update = optimizer.create_optimistic_update(
            Mode::Modify,
            &OperationParams::modify("abc", scribe_core::ModificationType::FixGrammar, None),
        );
        assert_eq!(update.placeholder, "Applying fix grammar...");
        assert_eq!(update.mode, Mode::Modify);
    }
}
