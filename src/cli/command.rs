//! REPL command parsing

use crate::mapping::Layer;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the current layer, or switch to the given one
    Layer(Option<Layer>),
    Next,
    Prev,
    Controls,
    Show,
    /// Missing fields are filled from the control's proposed values
    Assign {
        control: String,
        function_type: Option<String>,
        channel: Option<String>,
        number: Option<String>,
    },
    Clear(String),
    ClearLayer,
    Save(Option<String>),
    Load(Option<String>),
    Help,
    Quit,
    Empty,
}

pub const HELP: &[(&str, &str)] = &[
    ("layer [1-4]", "Show or switch the current layer"),
    ("next | prev", "Switch to the next/previous layer (wraps)"),
    ("controls", "List every control with its hardware label"),
    ("show", "Show the assignments on the current layer"),
    (
        "assign <control> [type] [channel] [number]",
        "Assign a MIDI function on the current layer",
    ),
    ("clear <control>", "Remove a control's assignment"),
    ("clear-layer", "Remove every assignment on the current layer"),
    ("save [file]", "Save all layers (to the last file if omitted)"),
    ("load [file]", "Replace all layers from a file"),
    ("help", "Show this help"),
    ("quit", "Leave the editor"),
];

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Empty);
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "layer" | "l" => {
                let layer = match args.as_slice() {
                    [] => None,
                    [n] => Some(n.parse::<Layer>().map_err(|e| e.to_string())?),
                    _ => return Err(usage("layer [1-4]")),
                };
                Command::Layer(layer)
            }
            "f1" | "f2" | "f3" | "f4" if args.is_empty() => {
                let layer = name[1..].parse::<Layer>().map_err(|e| e.to_string())?;
                Command::Layer(Some(layer))
            }
            "next" | "n" => no_args(&args, "next", Command::Next)?,
            "prev" | "p" => no_args(&args, "prev", Command::Prev)?,
            "controls" => no_args(&args, "controls", Command::Controls)?,
            "show" | "ls" => no_args(&args, "show", Command::Show)?,
            "assign" | "set" => match args.as_slice() {
                [control, rest @ ..] if rest.len() <= 3 => Command::Assign {
                    control: control.to_string(),
                    function_type: rest.first().map(|s| s.to_string()),
                    channel: rest.get(1).map(|s| s.to_string()),
                    number: rest.get(2).map(|s| s.to_string()),
                },
                _ => return Err(usage("assign <control> [type] [channel] [number]")),
            },
            "clear" | "rm" => match args.as_slice() {
                [control] => Command::Clear(control.to_string()),
                _ => return Err(usage("clear <control>")),
            },
            "clear-layer" => no_args(&args, "clear-layer", Command::ClearLayer)?,
            "save" => Command::Save(single_optional(&args, "save [file]")?),
            "load" | "open" => Command::Load(single_optional(&args, "load [file]")?),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}' (type 'help')", other)),
        };
        Ok(command)
    }
}

fn usage(text: &str) -> String {
    format!("Usage: {}", text)
}

fn no_args(args: &[&str], name: &str, command: Command) -> Result<Command, String> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(usage(name))
    }
}

fn single_optional(args: &[&str], text: &str) -> Result<Option<String>, String> {
    match args {
        [] => Ok(None),
        [value] => Ok(Some(value.to_string())),
        _ => Err(usage(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_commands() {
        assert_eq!(Command::parse("layer").unwrap(), Command::Layer(None));
        assert_eq!(
            Command::parse("layer 3").unwrap(),
            Command::Layer(Some(Layer::new(3).unwrap()))
        );
        assert_eq!(
            Command::parse("F2").unwrap(),
            Command::Layer(Some(Layer::new(2).unwrap()))
        );
        assert!(Command::parse("layer 5").unwrap_err().contains("'5'"));
        assert!(Command::parse("layer 1 2").is_err());
        assert_eq!(Command::parse("  next ").unwrap(), Command::Next);
        assert_eq!(Command::parse("PREV").unwrap(), Command::Prev);
    }

    #[test]
    fn test_parse_assign() {
        assert_eq!(
            Command::parse("assign knob_1 CC 1 64").unwrap(),
            Command::Assign {
                control: "knob_1".into(),
                function_type: Some("CC".into()),
                channel: Some("1".into()),
                number: Some("64".into()),
            }
        );
        assert_eq!(
            Command::parse("set W3").unwrap(),
            Command::Assign {
                control: "W3".into(),
                function_type: None,
                channel: None,
                number: None,
            }
        );
        assert!(Command::parse("assign").is_err());
        assert!(Command::parse("assign knob_1 CC 1 64 extra").is_err());
    }

    #[test]
    fn test_parse_files_and_misc() {
        assert_eq!(Command::parse("save").unwrap(), Command::Save(None));
        assert_eq!(
            Command::parse("load set.xml").unwrap(),
            Command::Load(Some("set.xml".into()))
        );
        assert!(Command::parse("save a b").is_err());
        assert_eq!(
            Command::parse("clear B2").unwrap(),
            Command::Clear("B2".into())
        );
        assert_eq!(Command::parse("clear-layer").unwrap(), Command::ClearLayer);
        assert_eq!(Command::parse("").unwrap(), Command::Empty);
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
        assert!(Command::parse("frobnicate")
            .unwrap_err()
            .contains("Unknown command"));
    }
}
