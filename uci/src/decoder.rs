use utils::Score;

use super::commands::{Bound, Info, UciOutput};

pub struct Decoder;

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, output: &str) -> UciOutput {
        let output = output.trim();
        match output {
            "uciok" => UciOutput::UciOk,
            "readyok" => UciOutput::ReadyOk,

            _ if output.starts_with("id name ") => {
                UciOutput::IdName(output["id name ".len()..].trim().to_string())
            }
            _ if output.starts_with("id author ") => {
                UciOutput::IdAuthor(output["id author ".len()..].trim().to_string())
            }
            _ if output.starts_with("bestmove") => self.decode_bestmove(output),
            _ if output.starts_with("info") => UciOutput::Info(self.decode_info(output)),
            _ if output.starts_with("option") => UciOutput::Option(output.to_string()),

            _ => UciOutput::Unknown(output.to_string()),
        }
    }

    fn decode_bestmove(&self, output: &str) -> UciOutput {
        let mut tokens = output.split_whitespace().skip(1);
        let best_move = tokens.next().unwrap_or(crate::NULL_MOVE).to_string();
        let ponder = match tokens.next() {
            Some("ponder") => tokens.next().map(str::to_string),
            _ => None,
        };

        UciOutput::BestMove { best_move, ponder }
    }

    fn decode_info(&self, output: &str) -> Info {
        let mut info = Info::default();
        let mut tokens = output.split_whitespace().skip(1).peekable();

        while let Some(token) = tokens.next() {
            match token {
                "depth" => info.depth = parse_next(&mut tokens).unwrap_or(info.depth),
                "seldepth" => info.sel_depth = parse_next(&mut tokens).unwrap_or(info.sel_depth),
                "multipv" => info.multipv = parse_next(&mut tokens).unwrap_or(info.multipv),
                "nodes" => info.nodes = parse_next(&mut tokens).unwrap_or(info.nodes),
                "time" => info.time = parse_next(&mut tokens).unwrap_or(info.time),
                "score" => {
                    info.score = match tokens.next() {
                        Some("cp") => parse_next(&mut tokens).map(Score::Centipawns),
                        Some("mate") => parse_next(&mut tokens).map(Score::Mate),
                        _ => None,
                    };
                    info.bound = match tokens.peek() {
                        Some(&"lowerbound") => Some(Bound::Lower),
                        Some(&"upperbound") => Some(Bound::Upper),
                        _ => None,
                    };
                    if info.bound.is_some() {
                        tokens.next();
                    }
                }
                "pv" => {
                    info.pv = tokens.by_ref().map(str::to_string).collect();
                }
                // Free text runs to the end of the line
                "string" => break,
                // Single-value fields we do not track
                "nps" | "hashfull" | "tbhits" | "cpuload" | "currmove" | "currmovenumber"
                | "sbhits" => {
                    tokens.next();
                }
                _ => {}
            }
        }

        info
    }
}

fn parse_next<'a, T, I>(tokens: &mut I) -> Option<T>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    tokens.next().and_then(|t| t.parse().ok())
}
