//! Stdin line protocol.

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// `:go`
	Click,
	/// `:enter`
	Enter,
	/// `:instant on` / `:instant off`
	Instant(bool),
	/// `:quit`
	Quit,
	/// Any other line: the full query text.
	Query(String),
	/// A `:` line that is not a known command.
	Unknown(String),
}

impl Command {
	/// Parses one line. A literal leading colon can be typed as `::`.
	pub fn parse(line: &str) -> Self {
		let line = line.trim_end_matches(['\r', '\n']);
		let Some(rest) = line.strip_prefix(':') else {
			return Self::Query(line.to_string());
		};
		if let Some(text) = rest.strip_prefix(':') {
			return Self::Query(format!(":{text}"));
		}

		let mut words = rest.split_whitespace();
		match (words.next(), words.next(), words.next()) {
			(Some("go"), None, None) => Self::Click,
			(Some("enter"), None, None) => Self::Enter,
			(Some("instant"), Some("on"), None) => Self::Instant(true),
			(Some("instant"), Some("off"), None) => Self::Instant(false),
			(Some("quit" | "q"), None, None) => Self::Quit,
			_ => Self::Unknown(rest.to_string()),
		}
	}
}
