//! The token parser (spec.md §4.2). A pure function over the active
//! command's declared options and behavioral flags: classifies each input
//! token into a recognized-option event, an operand, or an unknown-option
//! token. No value coercion happens here — that is the resolver's job
//! (`parser::resolver`).
//!
//! Grounded in the teacher's `InputArgsParser::prepare` state machine
//! (`option_parser::input_parser`, `ParseState` enum), generalized from
//! its fixed four `ValueTypes` variants into the five explicit
//! classification rules spec.md §4.2 numbers, and made to *not* mutate
//! option state directly (the teacher calls
//! `command.get_option_parser().update_option_value(..)` mid-parse; here
//! the tokenizer only emits events for the resolver to apply).

use std::collections::VecDeque;

use crate::command::Command;
use crate::error::{Error, Result};

/// A recognized option occurrence: which attribute, and the raw string
/// value if one was consumed (tokenizer does no coercion).
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEvent {
    pub attr: String,
    pub raw: Option<String>,
}

#[derive(Debug, Default)]
pub struct TokenizeResult {
    pub events: Vec<OptionEvent>,
    pub operands: Vec<String>,
    pub unknown: Vec<String>,
}

fn looks_like_option(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1
}

enum Dest {
    Operands,
    Unknown,
}

/// Runs the token parser over `tokens` against `active`'s declared
/// options and behavioral flags. `is_known_subcommand_token` lets the
/// dispatcher (§4.3) decide whether positional-options/pass-through mode
/// should short-circuit at the current token (spec.md §4.2 rule 4).
pub fn tokenize(
    tokens: &[String],
    active: &Command,
    is_known_subcommand_token: impl Fn(&str) -> bool,
) -> Result<TokenizeResult> {
    let mut result = TokenizeResult::default();
    let mut dest = Dest::Operands;
    let mut variadic_pending: Option<String> = None;
    let mut produced_operand_or_unknown = false;

    let mut queue: VecDeque<String> = tokens.iter().cloned().collect();

    'outer: while let Some(token) = queue.pop_front() {
        // Rule 1: literal `--`.
        if token == "--" {
            if matches!(dest, Dest::Unknown) {
                result.unknown.push(token);
            }
            result.operands.extend(queue.drain(..));
            break;
        }

        // Rule 2: variadic-pending continuation.
        if let Some(attr) = variadic_pending.clone() {
            if !looks_like_option(&token) {
                result.events.push(OptionEvent {
                    attr,
                    raw: Some(token),
                });
                continue;
            } else {
                variadic_pending = None;
            }
        }

        // Rule 3: option-shaped token.
        if looks_like_option(&token) {
            // 3a: exact match.
            if let Some(opt) = active.find_option(&token) {
                let attr = opt.attribute_name();
                if opt.slot.takes_value() {
                    if opt.slot.is_required() {
                        match queue.front() {
                            Some(v) if !looks_like_option(v) => {
                                let v = queue.pop_front().unwrap();
                                result.events.push(OptionEvent {
                                    attr: attr.clone(),
                                    raw: Some(v),
                                });
                            }
                            _ => {
                                return Err(Error::option_missing_argument(format!(
                                    "option '{token}' argument missing"
                                )));
                            }
                        }
                    } else {
                        // optional: consume next iff it doesn't look like an option.
                        match queue.front() {
                            Some(v) if !looks_like_option(v) => {
                                let v = queue.pop_front().unwrap();
                                result.events.push(OptionEvent {
                                    attr: attr.clone(),
                                    raw: Some(v),
                                });
                            }
                            _ => {
                                result.events.push(OptionEvent {
                                    attr: attr.clone(),
                                    raw: None,
                                });
                            }
                        }
                    }
                    if opt.slot.is_variadic() {
                        variadic_pending = Some(attr);
                    }
                } else {
                    result.events.push(OptionEvent { attr, raw: None });
                }
                continue;
            }

            // 3b: short cluster `-Xrest`.
            if token.len() > 2 && !token.starts_with("--") {
                let head = &token[0..2];
                let rest = &token[2..];
                if let Some(opt) = active.find_option(head) {
                    let attr = opt.attribute_name();
                    let combine = opt.slot.is_required()
                        || (opt.slot.is_optional() && active.combine_flag_and_optional_value);
                    if combine {
                        result.events.push(OptionEvent {
                            attr: attr.clone(),
                            raw: Some(rest.to_string()),
                        });
                        if opt.slot.is_variadic() {
                            variadic_pending = Some(attr);
                        }
                        continue;
                    } else {
                        result.events.push(OptionEvent { attr, raw: None });
                        queue.push_front(format!("-{rest}"));
                        continue;
                    }
                }
            }

            // 3c: `--long=value`.
            if let Some(eq_pos) = token.find('=') {
                if token.starts_with("--") && !token[2..eq_pos].contains('=') {
                    let long = &token[..eq_pos];
                    let value = &token[eq_pos + 1..];
                    if let Some(opt) = active.find_option(long) {
                        if opt.slot.takes_value() {
                            let attr = opt.attribute_name();
                            result.events.push(OptionEvent {
                                attr: attr.clone(),
                                raw: Some(value.to_string()),
                            });
                            if opt.slot.is_variadic() {
                                variadic_pending = Some(attr);
                            }
                            continue;
                        }
                    }
                }
            }

            // 3d: unrecognized option.
            result.unknown.push(token);
            dest = Dest::Unknown;
            produced_operand_or_unknown = true;
            continue;
        }

        // Rule 4: positional-options / pass-through short-circuit.
        if (active.enable_positional_options || active.pass_through_options)
            && !produced_operand_or_unknown
        {
            let is_sentinel = is_known_subcommand_token(&token)
                || matches!(&active.help_command, crate::command::HelpCommandState::Explicit(n) if n == &token)
                || active.default_command_name.as_deref() == Some(token.as_str());
            if is_sentinel {
                result.operands.push(token);
                result.operands.extend(queue.drain(..));
                break 'outer;
            }
        }

        // Rule 5: pass-through.
        if active.pass_through_options {
            match dest {
                Dest::Unknown => {
                    result.unknown.push(token);
                    result.unknown.extend(queue.drain(..));
                }
                Dest::Operands => {
                    result.operands.push(token);
                    result.operands.extend(queue.drain(..));
                }
            }
            break;
        }

        // Rule 6: default routing.
        produced_operand_or_unknown = true;
        match dest {
            Dest::Operands => result.operands.push(token),
            Dest::Unknown => result.unknown.push(token),
        }
    }

    Ok(result)
}
