use super::commands::{GoParams, UciInput};

pub struct Encoder {}

impl Encoder {
    pub fn encode(&self, command: &UciInput) -> String {
        match command {
            UciInput::Uci => "uci".to_string(),
            UciInput::IsReady => "isready".to_string(),

            UciInput::Position { fen } => format!("position fen {}", fen),
            UciInput::Go(params) => encode_go(params),

            UciInput::Stop => "stop".to_string(),
            UciInput::Quit => "quit".to_string(),
            UciInput::SetOption { name, value } if value.is_empty() => {
                format!("setoption name {}", name)
            }
            UciInput::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
        }
    }
}

fn encode_go(params: &GoParams) -> String {
    let mut line = String::from("go");
    if let Some(depth) = params.depth {
        line.push_str(&format!(" depth {}", depth));
    }
    if let Some(move_time) = params.move_time {
        line.push_str(&format!(" movetime {}", move_time));
    }
    if let Some(nodes) = params.nodes {
        line.push_str(&format!(" nodes {}", nodes));
    }
    line
}
