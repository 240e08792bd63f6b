//! Line commands read from stdin.

use pomolog_core::Command;

pub const HELP: &str = "\
commands:
  start <task>       begin a work session
  pause | resume     freeze or continue the countdown
  note <text>        append a note to the open session
  done <text>        write the reflection and start the break
  skip               start the break without a reflection
  reset              back to idle
  status             print the current state
  config [key]       print the configuration or one key
  set <key> <value>  change a setting (empty value clears log.path)
  help | quit";

#[derive(Debug, PartialEq)]
pub enum Input {
    Timer(Command),
    Config(Option<String>),
    Set { key: String, value: String },
    Help,
    Quit,
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "start" => Input::Timer(Command::Start(required(word, rest)?)),
        "pause" => Input::Timer(Command::Pause),
        "resume" => Input::Timer(Command::Resume),
        "note" => Input::Timer(Command::Note(required(word, rest)?)),
        "done" => Input::Timer(Command::Reflect(required(word, rest)?)),
        "skip" => Input::Timer(Command::SkipReflection),
        "reset" => Input::Timer(Command::Reset),
        "status" => Input::Timer(Command::Snapshot),
        "config" => Input::Config((!rest.is_empty()).then(|| rest.to_string())),
        "set" => {
            if rest.is_empty() {
                return Err("usage: set <key> <value>".to_string());
            }
            let (key, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Input::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            }
        }
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(input))
}

fn required(word: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {word} <text>"))
    } else {
        Ok(rest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(line: &str) -> Command {
        match parse(line) {
            Ok(Some(Input::Timer(command))) => command,
            other => panic!("expected timer command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn text_commands_keep_inner_spacing() {
        assert!(matches!(timer("start  fix  the build "), Command::Start(t) if t == "fix  the build"));
        assert!(matches!(timer("note a\tb"), Command::Note(t) if t == "a\tb"));
        assert!(matches!(timer("DONE shipped it"), Command::Reflect(t) if t == "shipped it"));
    }

    #[test]
    fn bare_commands() {
        assert!(matches!(timer("pause"), Command::Pause));
        assert!(matches!(timer("resume"), Command::Resume));
        assert!(matches!(timer("skip"), Command::SkipReflection));
        assert!(matches!(timer("reset"), Command::Reset));
        assert!(matches!(timer("status"), Command::Snapshot));
        assert_eq!(parse("quit"), Ok(Some(Input::Quit)));
        assert_eq!(parse("help"), Ok(Some(Input::Help)));
    }

    #[test]
    fn missing_text_is_an_error() {
        assert_eq!(parse("start"), Err("usage: start <text>".to_string()));
        assert!(parse("note   ").is_err());
        assert!(parse("done").is_err());
    }

    #[test]
    fn config_and_set() {
        assert_eq!(parse("config"), Ok(Some(Input::Config(None))));
        assert_eq!(
            parse("config timer.work_minutes"),
            Ok(Some(Input::Config(Some("timer.work_minutes".into()))))
        );
        assert_eq!(
            parse("set log.path /tmp/my journal"),
            Ok(Some(Input::Set {
                key: "log.path".into(),
                value: "/tmp/my journal".into()
            }))
        );
        assert_eq!(
            parse("set log.path"),
            Ok(Some(Input::Set {
                key: "log.path".into(),
                value: String::new()
            }))
        );
        assert!(parse("set").is_err());
    }

    #[test]
    fn unknown_word() {
        assert!(parse("launch").unwrap_err().contains("unknown command"));
    }
}
