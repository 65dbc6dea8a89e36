/// A chat command, parsed from mention-stripped, trimmed, lower-cased text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ShowNeighborhoods,
    /// `None` when no neighborhood follows "in".
    ShowLocations { neighborhood: Option<String> },
    /// `None` when no location follows "at".
    ShowTrucks { location: Option<String> },
    Unknown,
}

/// Parse command text. Checked in order: help, show neighborhoods, show locations,
/// show trucks, anything else.
///
/// Arguments are found by splitting on the bare substring "in" / "at" and taking the
/// piece after the first occurrence, so an argument that itself contains the
/// separator gets cut short ("show locations in mount baker" → "mount baker",
/// but "show locations in interbay" → "").
pub fn parse_command(text: &str) -> Command {
    if text == "help" {
        return Command::Help;
    }
    if text == "show neighborhoods" {
        return Command::ShowNeighborhoods;
    }
    if text.contains("show locations") {
        return Command::ShowLocations {
            neighborhood: argument_after(text, "in"),
        };
    }
    if text.contains("show trucks") {
        return Command::ShowTrucks {
            location: argument_after(text, "at"),
        };
    }
    Command::Unknown
}

fn argument_after(text: &str, separator: &str) -> Option<String> {
    let arg = text.split(separator).nth(1)?.trim();
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_is_exact_match() {
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(parse_command("help me"), Command::Unknown);
    }

    #[test]
    fn test_show_neighborhoods_is_exact_match() {
        assert_eq!(parse_command("show neighborhoods"), Command::ShowNeighborhoods);
        assert_eq!(parse_command("please show neighborhoods"), Command::Unknown);
    }

    #[test]
    fn test_show_locations() {
        assert_eq!(
            parse_command("show locations in ballard"),
            Command::ShowLocations {
                neighborhood: Some("ballard".to_string())
            }
        );
        assert_eq!(
            parse_command("show locations in queen anne"),
            Command::ShowLocations {
                neighborhood: Some("queen anne".to_string())
            }
        );
    }

    #[test]
    fn test_show_locations_missing_neighborhood() {
        for text in ["show locations in ", "show locations in", "show locations"] {
            assert_eq!(
                parse_command(text),
                Command::ShowLocations { neighborhood: None },
                "{text}"
            );
        }
    }

    #[test]
    fn test_naive_split_cuts_argument_at_separator() {
        assert_eq!(
            parse_command("show locations in interbay"),
            Command::ShowLocations { neighborhood: None }
        );
        assert_eq!(
            parse_command("show locations in south lake union"),
            Command::ShowLocations {
                neighborhood: Some("south lake u".to_string())
            }
        );
    }

    #[test]
    fn test_show_trucks() {
        assert_eq!(
            parse_command("show trucks at 44"),
            Command::ShowTrucks {
                location: Some("44".to_string())
            }
        );
        assert_eq!(
            parse_command("show trucks at"),
            Command::ShowTrucks { location: None }
        );
        assert_eq!(
            parse_command("show trucks"),
            Command::ShowTrucks { location: None }
        );
    }

    #[test]
    fn test_routing_precedence() {
        // locations is checked before trucks
        assert!(matches!(
            parse_command("show locations in ballard show trucks at 44"),
            Command::ShowLocations { .. }
        ));
        assert!(matches!(
            parse_command("show trucks at 44 show locations in ballard"),
            Command::ShowLocations { .. }
        ));
        assert_eq!(parse_command("where are the trucks"), Command::Unknown);
        assert_eq!(parse_command(""), Command::Unknown);
    }
}
