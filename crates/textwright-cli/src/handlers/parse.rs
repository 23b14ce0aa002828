//! Parse command handler

use crate::error::CliResult;
use crate::ParseArgs;
use textwright::Command;

/// Extract the commands of one sentence
pub fn parse_sentence(sentence: &str) -> CliResult<Vec<Command>> {
    Ok(textwright::parse(sentence)?)
}

/// Execute the parse command: commands as pretty JSON on stdout
pub fn execute_parse(args: &ParseArgs) -> CliResult<()> {
    let commands = parse_sentence(&args.sentence)?;
    println!("{}", serde_json::to_string_pretty(&commands)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use textwright::Action;

    #[test]
    fn test_parse_sentence() {
        let commands = parse_sentence("Click \"Teams\" link, then hover \"Menu\" button.").unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].action, Action::Hover);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_sentence("Click \"Submit\".").unwrap_err();
        assert!(err.to_string().contains("Click \"Submit\""));
    }
}
