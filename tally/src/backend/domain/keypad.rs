//! On-screen keypad state machine.
//!
//! The keypad is either idle or editing the count of one denomination. Key
//! presses only change the edit buffer; the stored count changes when `Enter`
//! produces a [`KeypadOutcome::Commit`], which the session hands to the note
//! store.

use std::fmt;
use std::str::FromStr;

use crate::backend::domain::expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Symbol as shown in the edit buffer
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '×',
            Operator::Divide => '÷',
        }
    }

    fn is_symbol(c: char) -> bool {
        matches!(c, '+' | '-' | '×' | '÷')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    DoubleZero,
    Decimal,
    Operator(Operator),
    AllClear,
    Backspace,
    Equals,
    Enter,
}

impl Key {
    pub fn label(self) -> String {
        match self {
            Key::Digit(d) => d.to_string(),
            Key::DoubleZero => "00".to_string(),
            Key::Decimal => ".".to_string(),
            Key::Operator(Operator::Subtract) => "−".to_string(),
            Key::Operator(op) => op.symbol().to_string(),
            Key::AllClear => "AC".to_string(),
            Key::Backspace => "⇐".to_string(),
            Key::Equals => "=".to_string(),
            Key::Enter => "Enter".to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "00" => Key::DoubleZero,
            "." => Key::Decimal,
            "+" => Key::Operator(Operator::Add),
            "-" | "−" => Key::Operator(Operator::Subtract),
            "*" | "×" => Key::Operator(Operator::Multiply),
            "/" | "÷" => Key::Operator(Operator::Divide),
            "AC" => Key::AllClear,
            "⇐" => Key::Backspace,
            "=" => Key::Equals,
            "Enter" => Key::Enter,
            digit if digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
                Key::Digit(digit.as_bytes()[0] - b'0')
            }
            other => return Err(format!("Unknown key: {}", other)),
        };
        Ok(key)
    }
}

/// Buffer being edited for one denomination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub target: String,
    pub input: String,
    /// The next digit replaces the buffer instead of appending
    pub is_first_input: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeypadState {
    #[default]
    Idle,
    Editing(EditBuffer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadOutcome {
    /// Key had no effect (keypad idle)
    Ignored,
    /// Buffer changed; nothing committed
    Updated,
    /// `Enter` evaluated the buffer; the count should be stored
    Commit { denomination_id: String, count: String },
}

#[derive(Debug, Clone, Default)]
pub struct Keypad {
    state: KeypadState,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &KeypadState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, KeypadState::Editing(_))
    }

    /// Current edit buffer, if editing
    pub fn input(&self) -> Option<&str> {
        match &self.state {
            KeypadState::Editing(buffer) => Some(&buffer.input),
            KeypadState::Idle => None,
        }
    }

    /// Denomination being edited
    pub fn target(&self) -> Option<&str> {
        match &self.state {
            KeypadState::Editing(buffer) => Some(&buffer.target),
            KeypadState::Idle => None,
        }
    }

    /// Start editing `denomination_id`, seeded with its stored count
    pub fn begin(&mut self, denomination_id: impl Into<String>, seed: &str) {
        let input = if seed.trim().is_empty() {
            expression::SENTINEL.to_string()
        } else {
            seed.to_string()
        };
        self.state = KeypadState::Editing(EditBuffer {
            target: denomination_id.into(),
            input,
            is_first_input: true,
        });
    }

    /// Leave edit mode without committing. Returns whether anything was discarded.
    pub fn dismiss(&mut self) -> bool {
        let was_editing = self.is_editing();
        self.state = KeypadState::Idle;
        was_editing
    }

    pub fn press(&mut self, key: Key) -> KeypadOutcome {
        let KeypadState::Editing(buffer) = &mut self.state else {
            return KeypadOutcome::Ignored;
        };

        match key {
            Key::Digit(_) | Key::DoubleZero => {
                let digits = match key {
                    Key::Digit(d) => char::from(b'0' + d.min(9)).to_string(),
                    _ => "00".to_string(),
                };
                let is_zero = digits.chars().all(|c| c == '0');

                if buffer.is_first_input {
                    buffer.input = if is_zero { "0".to_string() } else { digits };
                    buffer.is_first_input = false;
                } else if buffer.input == "0" {
                    if !is_zero {
                        buffer.input = digits;
                    }
                } else {
                    buffer.input.push_str(&digits);
                }
            }
            Key::Operator(op) => {
                if buffer
                    .input
                    .chars()
                    .last()
                    .map_or(false, |c| Operator::is_symbol(c) || c == '.')
                {
                    buffer.input.pop();
                }
                buffer.input.push(op.symbol());
                buffer.is_first_input = false;
            }
            Key::Decimal => {
                let last_segment = buffer
                    .input
                    .rsplit(Operator::is_symbol)
                    .next()
                    .unwrap_or_default();
                if !last_segment.contains('.') {
                    buffer.input.push('.');
                    buffer.is_first_input = false;
                }
            }
            Key::AllClear => {
                buffer.input = "0".to_string();
                buffer.is_first_input = true;
            }
            Key::Backspace => {
                buffer.input.pop();
                if buffer.input.is_empty() {
                    buffer.input = "0".to_string();
                }
                if buffer.input == "0" {
                    buffer.is_first_input = true;
                }
            }
            Key::Equals => {
                buffer.input = expression::evaluate(&buffer.input);
                buffer.is_first_input = true;
            }
            Key::Enter => {
                let count = expression::evaluate(&buffer.input);
                let denomination_id = std::mem::take(&mut buffer.target);
                self.state = KeypadState::Idle;
                return KeypadOutcome::Commit {
                    denomination_id,
                    count,
                };
            }
        }

        KeypadOutcome::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing(seed: &str) -> Keypad {
        let mut keypad = Keypad::new();
        keypad.begin("jpy-1000", seed);
        keypad
    }

    fn press_all(keypad: &mut Keypad, labels: &[&str]) {
        for label in labels {
            keypad.press(label.parse().unwrap());
        }
    }

    #[test]
    fn test_first_digit_replaces_seed() {
        let mut keypad = editing("12");
        press_all(&mut keypad, &["7"]);
        assert_eq!(keypad.input(), Some("7"));

        press_all(&mut keypad, &["5"]);
        assert_eq!(keypad.input(), Some("75"));
    }

    #[test]
    fn test_double_zero_as_first_input_is_zero() {
        let mut keypad = editing("12");
        press_all(&mut keypad, &["00"]);
        assert_eq!(keypad.input(), Some("0"));

        press_all(&mut keypad, &["0", "00"]);
        assert_eq!(keypad.input(), Some("0"));

        press_all(&mut keypad, &["3", "00"]);
        assert_eq!(keypad.input(), Some("300"));
    }

    #[test]
    fn test_operator_replaces_trailing_operator_or_point() {
        let mut keypad = editing("0");
        press_all(&mut keypad, &["5", "+", "×"]);
        assert_eq!(keypad.input(), Some("5×"));

        press_all(&mut keypad, &["2", ".", "-"]);
        assert_eq!(keypad.input(), Some("5×2-"));
    }

    #[test]
    fn test_operator_extends_seed() {
        let mut keypad = editing("3");
        press_all(&mut keypad, &["+", "2"]);
        assert_eq!(keypad.input(), Some("3+2"));
    }

    #[test]
    fn test_one_decimal_point_per_segment() {
        let mut keypad = editing("0");
        press_all(&mut keypad, &["1", ".", "5", "."]);
        assert_eq!(keypad.input(), Some("1.5"));

        press_all(&mut keypad, &["+", "2", "."]);
        assert_eq!(keypad.input(), Some("1.5+2."));
    }

    #[test]
    fn test_all_clear_and_backspace() {
        let mut keypad = editing("0");
        press_all(&mut keypad, &["4", "2", "⇐"]);
        assert_eq!(keypad.input(), Some("4"));

        press_all(&mut keypad, &["⇐"]);
        assert_eq!(keypad.input(), Some("0"));
        press_all(&mut keypad, &["9"]);
        assert_eq!(keypad.input(), Some("9"));

        press_all(&mut keypad, &["8", "AC", "6"]);
        assert_eq!(keypad.input(), Some("6"));
    }

    #[test]
    fn test_equals_evaluates_and_keeps_editing() {
        let mut keypad = editing("0");
        press_all(&mut keypad, &["2", "+", "3", "×", "4", "="]);
        assert_eq!(keypad.input(), Some("14"));
        assert!(keypad.is_editing());

        press_all(&mut keypad, &["1"]);
        assert_eq!(keypad.input(), Some("1"));
    }

    #[test]
    fn test_enter_commits_and_goes_idle() {
        let mut keypad = editing("0");
        press_all(&mut keypad, &["3", "+"]);

        let outcome = keypad.press(Key::Enter);
        assert_eq!(
            outcome,
            KeypadOutcome::Commit {
                denomination_id: "jpy-1000".to_string(),
                count: "3".to_string(),
            }
        );
        assert!(!keypad.is_editing());
        assert_eq!(keypad.press(Key::Enter), KeypadOutcome::Ignored);
    }

    #[test]
    fn test_dismiss_discards_buffer() {
        let mut keypad = editing("5");
        press_all(&mut keypad, &["9"]);
        assert!(keypad.dismiss());
        assert_eq!(keypad.input(), None);
        assert!(!keypad.dismiss());
    }

    #[test]
    fn test_keys_parse_from_labels() {
        assert_eq!("7".parse::<Key>().unwrap(), Key::Digit(7));
        assert_eq!("−".parse::<Key>().unwrap(), Key::Operator(Operator::Subtract));
        assert_eq!("*".parse::<Key>().unwrap(), Key::Operator(Operator::Multiply));
        assert_eq!("÷".parse::<Key>().unwrap(), Key::Operator(Operator::Divide));
        assert_eq!("⇐".parse::<Key>().unwrap(), Key::Backspace);
        assert!("x".parse::<Key>().is_err());
        assert!("12".parse::<Key>().is_err());
    }

    #[test]
    fn test_empty_seed_starts_at_zero() {
        let keypad = editing("");
        assert_eq!(keypad.input(), Some("0"));
    }
}
