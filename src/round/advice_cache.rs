//! Cache and staleness policy for engine advisory recommendations.

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::api::EngineApi;
use crate::error::GameError;
use crate::models::{Advice, Trend};

/// Game context an advice was fetched under.
///
/// Cache-owned metadata: it is never written onto the advice payload, so
/// the same advice value can be shared freely without aliasing its
/// freshness bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdviceSnapshot {
    pub round_count: u32,
    pub trend: Trend,
    pub money: Decimal,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    advice: Advice,
    snapshot: AdviceSnapshot,
}

/// Holds zero-or-one advice with the context it was fetched under.
///
/// Freshness is a heuristic: the engine's advice endpoint takes no
/// parameters, so a round or trend change is treated as staleness whether
/// or not the recommendation actually varies with them.
#[derive(Debug, Default)]
pub struct AdviceCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl AdviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached advice if still fresh for the given context,
    /// otherwise fetch a replacement and cache it.
    ///
    /// The slot lock is held across the fetch: a concurrent call queues on
    /// the lock, re-checks freshness and reuses the newly stored advice, so
    /// at most one request goes out per staleness event. A failed fetch
    /// leaves the cache untouched.
    pub async fn get_or_refresh<E>(
        &self,
        engine: &E,
        round_count: u32,
        trend: Trend,
        money: Decimal,
    ) -> Result<Advice, GameError>
    where
        E: EngineApi + ?Sized,
    {
        let mut slot = self.entry.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.snapshot.round_count == round_count && entry.snapshot.trend == trend {
                return Ok(entry.advice.clone());
            }
        }

        let advice = engine.advice().await?;
        *slot = Some(CacheEntry {
            advice: advice.clone(),
            snapshot: AdviceSnapshot {
                round_count,
                trend,
                money,
            },
        });

        Ok(advice)
    }

    /// Context the current entry was fetched under, if any.
    pub async fn snapshot(&self) -> Option<AdviceSnapshot> {
        self.entry.lock().await.as_ref().map(|e| e.snapshot)
    }

    /// Drop the cached advice (new game).
    pub async fn clear(&self) {
        *self.entry.lock().await = None;
    }
}
