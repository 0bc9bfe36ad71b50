use utils::Score;

/// Commands sent from us (the GUI side) to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciInput {
    Uci,
    IsReady,

    Position { fen: String },
    Go(GoParams),

    Stop,
    Quit,
    SetOption { name: String, value: String },
}

/// Lines the engine sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOutput {
    IdName(String),
    IdAuthor(String),
    UciOk,
    ReadyOk,
    BestMove {
        best_move: String,
        ponder: Option<String>,
    },
    Info(Info),
    Option(String),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub depth: u8,
    pub sel_depth: u8,
    /// 1-based rank of the line, 1 when the engine is not in multi-PV mode.
    pub multipv: u16,
    pub nodes: u64,
    pub time: u64,
    /// Side-to-move relative, as the engine reports it.
    pub score: Option<Score>,
    pub bound: Option<Bound>,
    pub pv: Vec<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            depth: 0,
            sel_depth: 0,
            multipv: 1,
            nodes: 0,
            time: 0,
            score: None,
            bound: None,
            pv: Vec::new(),
        }
    }
}

impl Info {
    /// An exact score for a complete line, as opposed to a fail-high/low
    /// bound or a progress line without any score.
    pub fn is_exact_line(&self) -> bool {
        self.score.is_some() && self.bound.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    // Search depth ply only.
    pub depth: Option<u8>,

    // Search exactly movetime milliseconds.
    pub move_time: Option<u64>,

    // Search exactly this many nodes.
    pub nodes: Option<u64>,
}
