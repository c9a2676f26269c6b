//! Interactive command shell.
//!
//! Translates text commands into [`Designer`] calls. This is the only layer that knows
//! about user input; the designer itself never parses text.

use crate::designer::Designer;
use crate::error::{AppResult, GlassesError};
use crate::frame::FrameMatrix;
use crate::grid::Intensity;
use crate::sketch;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Help text listing every shell command.
pub const HELP: &str = "\
Commands:
  discover              scan for glasses (clears the selection)
  devices               list discovered devices
  select N              select device N for connecting
  connect               connect to the selected device
  disconnect            disconnect and rescan
  paint LEVEL           set brush: off | quarter | mid | full
  toggle ROW COL        toggle a pixel with the brush
  set ROW COL LEVEL     set a pixel directly
  clear                 turn every pixel off
  load FILE             load a sketch (.txt) or matrix (.json)
  show                  print the canvas
  push                  encode and display the canvas
  status                show connection and canvas state
  help                  show this help
  quit                  leave the shell";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Discover,
    Devices,
    Select(usize),
    Connect,
    Disconnect,
    Paint(Intensity),
    Toggle(usize, usize),
    Set(usize, usize, Intensity),
    Clear,
    Load(PathBuf),
    Show,
    Push,
    Status,
    Help,
    Quit,
}

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to print.
    Output(String),
    /// Leave the shell.
    Exit,
}

fn usage(message: impl Into<String>) -> String {
    format!("{} (type 'help' for commands)", message.into())
}

fn number(arg: Option<&str>, what: &str) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| usage(format!("missing {}", what)))?;
    arg.parse()
        .map_err(|_| usage(format!("{} must be a number, got '{}'", what, arg)))
}

fn level(arg: Option<&str>) -> Result<Intensity, String> {
    arg.ok_or_else(|| usage("missing intensity"))?.parse()
}

/// Parse one line of input. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();
    let command = match verb.as_str() {
        "discover" | "refresh" => Command::Discover,
        "devices" | "ls" => Command::Devices,
        "select" => Command::Select(number(words.next(), "device index")?),
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "paint" | "brush" => Command::Paint(level(words.next())?),
        "toggle" | "t" => {
            let row = number(words.next(), "row")?;
            let col = number(words.next(), "column")?;
            Command::Toggle(row, col)
        }
        "set" => {
            let row = number(words.next(), "row")?;
            let col = number(words.next(), "column")?;
            Command::Set(row, col, level(words.next())?)
        }
        "clear" => Command::Clear,
        "load" => {
            let path = words.next().ok_or_else(|| usage("missing file"))?;
            Command::Load(PathBuf::from(path))
        }
        "show" => Command::Show,
        "push" | "display" => Command::Push,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(usage(format!("unknown command '{}'", other))),
    };

    if let Some(extra) = words.next() {
        return Err(usage(format!("unexpected argument '{}'", extra)));
    }
    Ok(Some(command))
}

/// Load a sketch or JSON matrix file into the designer.
pub async fn load_file(designer: &Designer, path: &Path) -> AppResult<()> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        GlassesError::InvalidFrame(format!("cannot read {}: {}", path.display(), e))
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let matrix: FrameMatrix = serde_json::from_str(&text).map_err(|e| {
            GlassesError::InvalidFrame(format!("{} is not a frame matrix: {}", path.display(), e))
        })?;
        designer.load_matrix(&matrix)
    } else {
        designer.replace_grid(sketch::parse(&text)?);
        Ok(())
    }
}

fn device_list(designer: &Designer) -> String {
    let devices = designer.devices();
    if devices.is_empty() {
        return "No devices discovered".to_string();
    }
    let selected = designer.selected();
    let mut out = String::new();
    for (index, device) in devices.iter().enumerate() {
        let marker = if selected.as_ref() == Some(device) { '*' } else { ' ' };
        let _ = writeln!(out, "{} {:>2}: {}", marker, index, device);
    }
    out.trim_end().to_string()
}

/// Run one command against the designer.
pub async fn execute(designer: &Designer, command: Command) -> AppResult<Outcome> {
    let text = match command {
        Command::Discover => {
            designer.discover().await?;
            device_list(designer)
        }
        Command::Devices => device_list(designer),
        Command::Select(index) => format!("Selected {}", designer.select(index)?),
        Command::Connect => format!("Connected to {}", designer.connect().await?.name),
        Command::Disconnect => {
            designer.disconnect().await?;
            format!("Disconnected\n{}", device_list(designer))
        }
        Command::Paint(intensity) => {
            designer.set_brush(intensity);
            format!("Brush set to {}", intensity)
        }
        Command::Toggle(row, col) => {
            let now = designer.toggle(row, col)?;
            format!("({}, {}) is {}", row, col, now)
        }
        Command::Set(row, col, intensity) => {
            designer.set_intensity(row, col, intensity)?;
            format!("({}, {}) is {}", row, col, designer.grid().intensity(row, col)?)
        }
        Command::Clear => {
            designer.clear();
            "Canvas cleared".to_string()
        }
        Command::Load(path) => {
            load_file(designer, &path).await?;
            format!("Loaded {}", path.display())
        }
        Command::Show => sketch::render(&designer.grid()).trim_end().to_string(),
        Command::Push => {
            designer.push().await?;
            "Frame displayed".to_string()
        }
        Command::Status => designer.status(),
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Exit),
    };
    Ok(Outcome::Output(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Device;
    use crate::service::MockGlassesService;
    use std::sync::Arc;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("select 2"), Ok(Some(Command::Select(2))));
        assert_eq!(parse("  PAINT mid "), Ok(Some(Command::Paint(Intensity::Mid))));
        assert_eq!(parse("toggle 3 4"), Ok(Some(Command::Toggle(3, 4))));
        assert_eq!(
            parse("set 0 23 quarter"),
            Ok(Some(Command::Set(0, 23, Intensity::Quarter)))
        );
        assert_eq!(
            parse("load smile.txt"),
            Ok(Some(Command::Load(PathBuf::from("smile.txt"))))
        );
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse("# comment"), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("select").is_err());
        assert!(parse("select x").is_err());
        assert!(parse("toggle 1").is_err());
        assert!(parse("paint neon").is_err());
        assert!(parse("connect now").is_err());
        assert!(parse("dance").unwrap_err().contains("unknown command 'dance'"));
    }

    #[tokio::test]
    async fn test_execute_session() {
        let mock = Arc::new(
            MockGlassesService::new().with_devices(vec![Device::new("CHEMION", "01:02:03:04:05:06")]),
        );
        let designer = Designer::new(mock.clone());

        let run = |line: &'static str| {
            let designer = designer.clone();
            async move {
                let command = parse(line).unwrap().unwrap();
                execute(&designer, command).await
            }
        };

        assert_eq!(
            run("discover").await.unwrap(),
            Outcome::Output("   0: CHEMION (01:02:03:04:05:06)".into())
        );
        run("select 0").await.unwrap();
        assert_eq!(
            run("connect").await.unwrap(),
            Outcome::Output("Connected to CHEMION".into())
        );
        run("toggle 0 0").await.unwrap();
        assert_eq!(
            run("push").await.unwrap(),
            Outcome::Output("Frame displayed".into())
        );
        assert_eq!(mock.displayed().len(), 1);
        assert_eq!(run("quit").await.unwrap(), Outcome::Exit);
    }

    #[tokio::test]
    async fn test_execute_surfaces_errors() {
        let designer = Designer::new(Arc::new(MockGlassesService::new()));
        let err = execute(&designer, Command::Connect).await.unwrap_err();
        assert_eq!(err, GlassesError::NoSelection);
    }

    #[tokio::test]
    async fn test_load_json_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");
        let mut matrix = vec![vec![0u8; 24]; 9];
        matrix[0][5] = 3;
        std::fs::write(&path, serde_json::to_string(&matrix).unwrap()).unwrap();

        let designer = Designer::new(Arc::new(MockGlassesService::new()));
        load_file(&designer, &path).await.unwrap();
        assert_eq!(designer.matrix(), matrix);
    }
}
