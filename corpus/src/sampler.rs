use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use utils::{Position, Score};

use crate::record::{CorpusRecord, GameRecord, RawPosition};
use crate::seen::SeenPositions;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GamePolicy {
    /// One uniformly random position per game.
    RandomPick,
    /// Every position of the game not already seen in this run.
    Unique,
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Positions reached within the first `ply_floor` plies are skipped.
    pub ply_floor: usize,
    /// Only keep positions where the eventual winner is to move; undecided
    /// games yield nothing.
    pub winning_side_only: bool,
    /// Positions need strictly more pieces than this.
    pub material_floor: u32,
    pub policy: GamePolicy,
    /// Apply the run-scoped seen set to position records too.
    pub dedup: bool,
    /// Only sample game positions that have a move played from them.
    pub with_moves: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ply_floor: 10,
            winning_side_only: false,
            material_floor: 6,
            policy: GamePolicy::RandomPick,
            dedup: false,
            with_moves: false,
        }
    }
}

/// A validated position worth scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub position: Position,
    /// White-relative evaluation carried by the corpus.
    pub prior: Option<Score>,
    /// The move played from this position, for game records.
    pub played_move: Option<String>,
    /// Source line or game index, for diagnostics.
    pub origin: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub invalid_fen: usize,
    pub duplicates: usize,
    pub too_few_pieces: usize,
    pub undecided_games: usize,
}

pub struct Sampler {
    config: SamplerConfig,
    rng: StdRng,
    stats: SampleStats,
}

impl Sampler {
    pub fn new(config: SamplerConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rng,
            stats: SampleStats::default(),
        }
    }

    pub fn stats(&self) -> SampleStats {
        self.stats
    }

    pub fn sample(&mut self, record: CorpusRecord, seen: &mut SeenPositions) -> Vec<Candidate> {
        match record {
            CorpusRecord::Position(raw) => self.sample_position(raw, seen).into_iter().collect(),
            CorpusRecord::Game(game) => self.sample_game(game, seen),
        }
    }

    fn sample_position(&mut self, raw: RawPosition, seen: &mut SeenPositions) -> Option<Candidate> {
        let position = self.validate(&raw.fen, raw.line)?;

        if !self.has_material(&position) {
            return None;
        }

        if self.config.dedup && !seen.insert(position.fen()) {
            self.stats.duplicates += 1;
            return None;
        }

        Some(Candidate {
            position,
            prior: raw.prior,
            played_move: None,
            origin: raw.line,
        })
    }

    fn sample_game(&mut self, game: GameRecord, seen: &mut SeenPositions) -> Vec<Candidate> {
        let winner = game.result.winner();
        if self.config.winning_side_only && winner.is_none() {
            self.stats.undecided_games += 1;
            return Vec::new();
        }

        let mut pool = Vec::new();
        for ply in (self.config.ply_floor + 1)..=game.ply_count() {
            let Some((fen, played)) = game.ply(ply) else {
                break;
            };
            if self.config.with_moves && played.is_none() {
                continue;
            }

            let Some(position) = self.validate(fen, game.index) else {
                continue;
            };

            if self.config.winning_side_only && Some(position.side_to_move()) != winner {
                continue;
            }

            if !self.has_material(&position) {
                continue;
            }

            pool.push(Candidate {
                position,
                prior: None,
                played_move: played.map(str::to_string),
                origin: game.index,
            });
        }

        match self.config.policy {
            GamePolicy::Unique => pool
                .into_iter()
                .filter(|candidate| {
                    let fresh = seen.insert(candidate.position.fen());
                    if !fresh {
                        self.stats.duplicates += 1;
                    }
                    fresh
                })
                .collect(),
            GamePolicy::RandomPick => {
                if self.config.dedup {
                    let before = pool.len();
                    pool.retain(|candidate| !seen.contains(candidate.position.fen()));
                    self.stats.duplicates += before - pool.len();
                }

                let Some(pick) = pool.choose(&mut self.rng).cloned() else {
                    return Vec::new();
                };
                if self.config.dedup {
                    seen.insert(pick.position.fen());
                }
                vec![pick]
            }
        }
    }

    fn validate(&mut self, fen: &str, origin: usize) -> Option<Position> {
        match Position::from_fen(fen) {
            Ok(position) => Some(position),
            Err(e) => {
                self.stats.invalid_fen += 1;
                log::debug!("Record {}: {}", origin, e);
                None
            }
        }
    }

    fn has_material(&mut self, position: &Position) -> bool {
        let enough = position.piece_count() > self.config.material_floor;
        if !enough {
            self.stats.too_few_pieces += 1;
        }
        enough
    }
}
