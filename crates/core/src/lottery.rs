//! Reward lottery over the eligible pools
//!
//! Two tiers: an afternoon draw over the afternoon-eligible pool, and a
//! night VIP draw over the union of afternoon-eligible non-winners and
//! night-eligible participants. Draws fully reset the tier's winner flags
//! first, so re-running a draw replaces the previous result instead of
//! accumulating winners.
//!
//! The random source is injected so production uses an entropy-seeded
//! generator while tests pass a seeded one for repeatable draws.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{Contest, Participant};
use crate::storage::Database;

/// Winners of one full lottery run, both tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryResults {
    pub afternoon_winners: Vec<Participant>,
    pub night_vip_winners: Vec<Participant>,
}

impl LotteryResults {
    pub fn total_winners(&self) -> usize {
        self.afternoon_winners.len() + self.night_vip_winners.len()
    }
}

/// Lottery engine over a shared database handle and an injected generator.
pub struct LotteryEngine<R: Rng + CryptoRng> {
    db: Arc<Mutex<Database>>,
    rng: R,
}

impl LotteryEngine<StdRng> {
    /// Production constructor: entropy-seeded generator.
    pub fn secure(db: Arc<Mutex<Database>>) -> Self {
        Self::with_rng(db, StdRng::from_entropy())
    }
}

impl<R: Rng + CryptoRng> LotteryEngine<R> {
    pub fn with_rng(db: Arc<Mutex<Database>>, rng: R) -> Self {
        Self { db, rng }
    }

    /// Draw the afternoon tier. Resets every previous afternoon winner,
    /// shuffles the afternoon-eligible pool, and marks the first
    /// `min(contest.afternoon_winners, pool size)` entries.
    pub fn draw_afternoon(&mut self, contest: &Contest) -> Result<Vec<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;

        let pool = db.participants().list_afternoon_eligible(contest.id)?;
        db.participants().clear_afternoon_winners(contest.id)?;

        if pool.is_empty() {
            info!(contest_id = %contest.id, "No eligible participants for the afternoon draw");
            return Ok(Vec::new());
        }

        let pool_size = pool.len();
        let winners = draw_from_pool(pool, contest.afternoon_winners as usize, &mut self.rng);
        invariants::assert_draw_invariants(&winners, pool_size, contest.afternoon_winners as usize);

        let mut marked = Vec::with_capacity(winners.len());
        for mut winner in winners {
            winner.afternoon_winner = true;
            db.participants().mark_afternoon_winner(winner.id)?;
            info!(
                participant_id = %winner.participant_id,
                afternoon_hours = winner.total_afternoon_hours,
                total_hours = winner.total_hours,
                "Afternoon winner selected"
            );
            marked.push(winner);
        }

        info!(
            contest_id = %contest.id,
            winners = marked.len(),
            pool = pool_size,
            "Afternoon draw complete"
        );
        Ok(marked)
    }

    /// Draw the night VIP tier. The pool unions afternoon-eligible
    /// participants the afternoon draw passed over with night-eligible
    /// participants, deduplicated by participant identifier, so afternoon
    /// non-winners get a second chance at the higher tier.
    pub fn draw_night_vip(&mut self, contest: &Contest) -> Result<Vec<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;

        let mut pool = db
            .participants()
            .list_afternoon_eligible_non_winners(contest.id)?;
        let night_eligible = db.participants().list_night_eligible(contest.id)?;

        let mut seen: HashSet<String> =
            pool.iter().map(|p| p.participant_id.clone()).collect();
        for participant in night_eligible {
            if seen.insert(participant.participant_id.clone()) {
                pool.push(participant);
            }
        }

        db.participants().clear_night_vip_winners(contest.id)?;

        if pool.is_empty() {
            info!(contest_id = %contest.id, "No eligible participants for the night VIP draw");
            return Ok(Vec::new());
        }

        let pool_size = pool.len();
        let winners = draw_from_pool(pool, contest.night_vip_winners as usize, &mut self.rng);
        invariants::assert_draw_invariants(&winners, pool_size, contest.night_vip_winners as usize);

        let mut marked = Vec::with_capacity(winners.len());
        for mut winner in winners {
            winner.night_vip_winner = true;
            db.participants().mark_night_vip_winner(winner.id)?;
            info!(
                participant_id = %winner.participant_id,
                night_hours = winner.total_night_hours,
                total_hours = winner.total_hours,
                "Night VIP winner selected"
            );
            marked.push(winner);
        }

        info!(
            contest_id = %contest.id,
            winners = marked.len(),
            pool = pool_size,
            "Night VIP draw complete"
        );
        Ok(marked)
    }

    /// Run both draws in order. The night pool sees the afternoon result,
    /// so afternoon non-winners carry into the VIP pool.
    pub fn draw_all(&mut self, contest: &Contest) -> Result<LotteryResults> {
        info!(contest_id = %contest.id, title = %contest.title, "Running full lottery");
        let afternoon_winners = self.draw_afternoon(contest)?;
        let night_vip_winners = self.draw_night_vip(contest)?;
        Ok(LotteryResults {
            afternoon_winners,
            night_vip_winners,
        })
    }

    /// Winners of the latest afternoon draw.
    pub fn afternoon_winners(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.participants().list_afternoon_winners(contest_id)
    }

    /// Winners of the latest night VIP draw.
    pub fn night_vip_winners(&self, contest_id: Uuid) -> Result<Vec<Participant>> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        db.participants().list_night_vip_winners(contest_id)
    }

    /// Whether either tier currently has winners on record.
    pub fn has_drawn_winners(&self, contest_id: Uuid) -> Result<bool> {
        let db = self.db.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(!db.participants().list_afternoon_winners(contest_id)?.is_empty()
            || !db.participants().list_night_vip_winners(contest_id)?.is_empty())
    }
}

/// Uniform without-replacement sample: shuffle, then take the prefix.
fn draw_from_pool<R: Rng>(
    mut pool: Vec<Participant>,
    configured: usize,
    rng: &mut R,
) -> Vec<Participant> {
    pool.shuffle(rng);
    let count = configured.min(pool.len());
    pool.truncate(count);
    pool
}
