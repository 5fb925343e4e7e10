use crate::action::{Action, CategoryRef};
use crate::flows::SlotRole;
use crate::ui_state::{ScanMode, Screen};

pub struct CommandParser;

impl CommandParser {
    pub fn parse(input: &str) -> Result<Action, String> {
        let input = input.trim();
        if !input.starts_with('/') {
            return Err("Not a command".to_string());
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let args = args.trim();

        match cmd {
            "/help" => Ok(Action::Help),
            "/home" => Ok(Action::Navigate(Screen::Home)),
            "/scan" => Ok(Action::Navigate(Screen::StyleScan)),
            "/stylist" => Ok(Action::Navigate(Screen::Stylist)),
            "/tryon" => Ok(Action::Navigate(Screen::TryOn)),
            "/chat" => Ok(Action::Navigate(Screen::Chat)),
            "/weather" => Ok(Action::Navigate(Screen::Weather)),
            "/mode" => match args {
                "single" => Ok(Action::SetScanMode(ScanMode::Single)),
                "compare" => Ok(Action::SetScanMode(ScanMode::Compare)),
                _ => Err("Usage: /mode single|compare".to_string()),
            },
            "/load" => {
                let (role, path) = args.split_once(' ').unwrap_or((args, ""));
                if role.is_empty() || path.trim().is_empty() {
                    return Err(
                        "Usage: /load <slot> <path>\n  Example: /load garment-1 ./jacket.jpg".to_string()
                    );
                }
                Ok(Action::LoadImage {
                    role: role.parse()?,
                    path: path.trim().to_string(),
                })
            }
            "/drop" => {
                if args.is_empty() {
                    Err("Usage: /drop <slot>".to_string())
                } else {
                    Ok(Action::DropImage { role: args.parse()? })
                }
            }
            "/analyze" => match args {
                "" => Ok(Action::Analyze { slot: None }),
                "1" => Ok(Action::Analyze { slot: Some(SlotRole::Garment1) }),
                "2" => Ok(Action::Analyze { slot: Some(SlotRole::Garment2) }),
                _ => Err("Usage: /analyze [1|2]".to_string()),
            },
            "/ask" => {
                if args.is_empty() {
                    Err("Usage: /ask <prompt>\n  Example: /ask add bohemian vibes".to_string())
                } else {
                    Ok(Action::Ask { prompt: args.to_string() })
                }
            }
            "/retry" => Ok(Action::Retry),
            "/option" => parse_index(args, "/option <n>").map(Action::SelectOption),
            "/back" => Ok(Action::Back),
            "/viz" => {
                if args.is_empty() {
                    Err("Usage: /viz <n|name>".to_string())
                } else if args.chars().all(|c| c.is_ascii_digit()) {
                    parse_index(args, "/viz <n|name>").map(|n| Action::Visualize(CategoryRef::Index(n)))
                } else {
                    Ok(Action::Visualize(CategoryRef::Name(args.to_string())))
                }
            }
            "/idea" => parse_index(args, "/idea <n>").map(Action::UseIdea),
            "/generate" => Ok(Action::Generate {
                prompt: (!args.is_empty()).then(|| args.to_string()),
            }),
            "/newchat" => Ok(Action::NewChat),
            "/new" => Ok(Action::NewSession),
            "/copy" => Ok(Action::Copy),
            "/quit" => Ok(Action::Quit),
            _ => Err(format!("Unknown command: {}. Type /help for available commands.", cmd)),
        }
    }
}

fn parse_index(args: &str, usage: &str) -> Result<usize, String> {
    match args.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("Usage: {} (numbers start at 1)", usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_commands() {
        assert_eq!(CommandParser::parse("/stylist"), Ok(Action::Navigate(Screen::Stylist)));
        assert_eq!(CommandParser::parse("  /weather "), Ok(Action::Navigate(Screen::Weather)));
        assert_eq!(CommandParser::parse("/mode compare"), Ok(Action::SetScanMode(ScanMode::Compare)));
        assert!(CommandParser::parse("/mode both").is_err());
    }

    #[test]
    fn test_load_keeps_spaces_in_path() {
        assert_eq!(
            CommandParser::parse("/load human ./photos/my look.png"),
            Ok(Action::LoadImage {
                role: SlotRole::Human,
                path: "./photos/my look.png".to_string()
            })
        );
        assert!(CommandParser::parse("/load garment-1").is_err());
        assert!(CommandParser::parse("/load hat ./x.png").unwrap_err().contains("Unknown slot"));
    }

    #[test]
    fn test_analyze_targets() {
        assert_eq!(CommandParser::parse("/analyze"), Ok(Action::Analyze { slot: None }));
        assert_eq!(
            CommandParser::parse("/analyze 2"),
            Ok(Action::Analyze { slot: Some(SlotRole::Garment2) })
        );
        assert!(CommandParser::parse("/analyze 3").is_err());
    }

    #[test]
    fn test_indexes_are_one_based() {
        assert_eq!(CommandParser::parse("/option 1"), Ok(Action::SelectOption(1)));
        assert!(CommandParser::parse("/option 0").is_err());
        assert!(CommandParser::parse("/option x").is_err());
        assert_eq!(CommandParser::parse("/idea 2"), Ok(Action::UseIdea(2)));
    }

    #[test]
    fn test_viz_by_index_or_name() {
        assert_eq!(
            CommandParser::parse("/viz 3"),
            Ok(Action::Visualize(CategoryRef::Index(3)))
        );
        assert_eq!(
            CommandParser::parse("/viz Color Palette"),
            Ok(Action::Visualize(CategoryRef::Name("Color Palette".to_string())))
        );
        assert!(CommandParser::parse("/viz 0").is_err());
    }

    #[test]
    fn test_generate_prompt_is_optional() {
        assert_eq!(CommandParser::parse("/generate"), Ok(Action::Generate { prompt: None }));
        assert_eq!(
            CommandParser::parse("/generate tuck the shirt"),
            Ok(Action::Generate { prompt: Some("tuck the shirt".to_string()) })
        );
    }

    #[test]
    fn test_new_chat_and_new_session() {
        assert_eq!(CommandParser::parse("/newchat"), Ok(Action::NewChat));
        assert_eq!(CommandParser::parse("/new"), Ok(Action::NewSession));
        assert!(CommandParser::parse("/clear").is_err());
    }

    #[test]
    fn test_unknown_and_non_commands() {
        assert!(CommandParser::parse("/dance").unwrap_err().starts_with("Unknown command"));
        assert_eq!(CommandParser::parse("hello"), Err("Not a command".to_string()));
    }
}
