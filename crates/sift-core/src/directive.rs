//! The closed vocabulary of key-mapping directives.
//!
//! A mapping value is `family:payload`. Unrecognized families or builtin
//! names are reported as not supported, never fatal.

use thiserror::Error;

/// Built-in list operations addressable from a mapping via `do:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    SelectAll,
    Refresh,
    Exit,
    Stop,
    Cancel,
    Toggle,
    ToggleMode,
    /// Cycle the active matcher kind.
    SwitchMatcher,
    Previous,
    Next,
    DefaultAction,
}

impl BuiltinAction {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "selectall" => BuiltinAction::SelectAll,
            "refresh" => BuiltinAction::Refresh,
            "exit" => BuiltinAction::Exit,
            "stop" => BuiltinAction::Stop,
            "cancel" => BuiltinAction::Cancel,
            "toggle" => BuiltinAction::Toggle,
            "togglemode" => BuiltinAction::ToggleMode,
            "switch" => BuiltinAction::SwitchMatcher,
            "previous" => BuiltinAction::Previous,
            "next" => BuiltinAction::Next,
            "defaultaction" => BuiltinAction::DefaultAction,
            _ => return None,
        })
    }
}

/// Prompt editing operations addressable via `prompt:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Previous,
    Next,
    Start,
    End,
    Left,
    Right,
    DeleteForward,
    DeleteBackward,
    RemoveTail,
    RemoveAhead,
    RemoveWord,
}

impl PromptAction {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "previous" => PromptAction::Previous,
            "next" => PromptAction::Next,
            "start" => PromptAction::Start,
            "end" => PromptAction::End,
            "left" => PromptAction::Left,
            "right" => PromptAction::Right,
            "deleteforward" => PromptAction::DeleteForward,
            "deletebackward" => PromptAction::DeleteBackward,
            "removetail" => PromptAction::RemoveTail,
            "removeahead" => PromptAction::RemoveAhead,
            "removeword" => PromptAction::RemoveWord,
            _ => return None,
        })
    }
}

/// One parsed mapping value.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Do(BuiltinAction),
    Prompt(PromptAction),
    /// Run a named list action against the current target.
    Action(String),
    /// Invoke a host function with the current item.
    Call(String),
    /// Invoke a host function and run its returned action name.
    Expr(String),
    /// Feed raw keys back to the host.
    FeedKeys(String),
    /// Host normal-mode command; `remap` is false for `normal!:`.
    Normal { command: String, remap: bool },
    /// Host ex command.
    Command(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("mapping \"{0}\" is not supported")]
    UnknownFamily(String),
    #[error("do action \"{0}\" is not supported")]
    UnknownBuiltin(String),
    #[error("prompt action \"{0}\" is not supported")]
    UnknownPromptAction(String),
}

impl Directive {
    pub fn parse(value: &str) -> Result<Self, DirectiveError> {
        let (family, payload) = value
            .split_once(':')
            .ok_or_else(|| DirectiveError::UnknownFamily(value.to_string()))?;
        Ok(match family {
            "do" => Directive::Do(
                BuiltinAction::parse(payload)
                    .ok_or_else(|| DirectiveError::UnknownBuiltin(payload.to_string()))?,
            ),
            "prompt" => Directive::Prompt(
                PromptAction::parse(payload)
                    .ok_or_else(|| DirectiveError::UnknownPromptAction(payload.to_string()))?,
            ),
            "action" => Directive::Action(payload.to_string()),
            "call" => Directive::Call(payload.to_string()),
            "expr" => Directive::Expr(payload.to_string()),
            "feedkeys" => Directive::FeedKeys(payload.to_string()),
            "normal" => Directive::Normal {
                command: payload.to_string(),
                remap: true,
            },
            "normal!" => Directive::Normal {
                command: payload.to_string(),
                remap: false,
            },
            "command" => Directive::Command(payload.to_string()),
            _ => return Err(DirectiveError::UnknownFamily(value.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_do_and_prompt() {
        assert_eq!(
            Directive::parse("do:refresh"),
            Ok(Directive::Do(BuiltinAction::Refresh))
        );
        assert_eq!(
            Directive::parse("prompt:removetail"),
            Ok(Directive::Prompt(PromptAction::RemoveTail))
        );
    }

    #[test]
    fn normal_bang_disables_remap() {
        assert_eq!(
            Directive::parse("normal!:j"),
            Ok(Directive::Normal {
                command: "j".into(),
                remap: false
            })
        );
        assert_eq!(
            Directive::parse("normal:j"),
            Ok(Directive::Normal {
                command: "j".into(),
                remap: true
            })
        );
    }

    #[test]
    fn payload_keeps_colons() {
        assert_eq!(
            Directive::parse("command:echo a:b"),
            Ok(Directive::Command("echo a:b".into()))
        );
    }

    #[test]
    fn unknown_family_is_not_supported() {
        assert!(matches!(
            Directive::parse("zap:boom"),
            Err(DirectiveError::UnknownFamily(_))
        ));
        assert!(matches!(
            Directive::parse("no-colon"),
            Err(DirectiveError::UnknownFamily(_))
        ));
    }

    #[test]
    fn unknown_builtins_are_not_supported() {
        assert!(matches!(
            Directive::parse("do:fly"),
            Err(DirectiveError::UnknownBuiltin(_))
        ));
        assert!(matches!(
            Directive::parse("prompt:fly"),
            Err(DirectiveError::UnknownPromptAction(_))
        ));
    }
}
