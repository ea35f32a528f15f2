//! ## iChat wire grammar
//!
//! Every datagram payload is one frame of the form `command$content`. The
//! command is a case-sensitive ASCII token, the content is free text (it may
//! contain newlines), and both are stripped of surrounding whitespace before
//! dispatch. Payloads at or above [`BUFFER_SIZE`] are rejected outright, never
//! truncated.

use std::str::Utf8Error;

use thiserror::Error;

/// Upper bound on a datagram payload, in bytes. A payload of
/// `BUFFER_SIZE - 1` bytes is the longest accepted frame.
pub const BUFFER_SIZE: usize = 1024;

/// Upper bound on a display name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("missing '$' delimiter")]
    MissingDelimiter,
    #[error("empty command")]
    EmptyCommand,
    #[error("'$' not allowed in command")]
    DelimiterInCommand,
    #[error("payload exceeds {} bytes", BUFFER_SIZE - 1)]
    Oversize,
    #[error("payload is not valid utf-8")]
    Encoding(#[from] Utf8Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name exceeds {MAX_NAME_LEN} bytes")]
    TooLong,
    #[error("name contains forbidden character {0:?}")]
    Forbidden(char),
}

/// A parsed `command$content` frame borrowing from the datagram payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub command: &'a str,
    pub content: &'a str,
}

impl<'a> Frame<'a> {
    /// Split a datagram payload into its command and content.
    ///
    /// # Test
    ///
    /// ```
    /// use ichat_codec::Frame;
    ///
    /// let frame = Frame::parse(b"say$ hello there").unwrap();
    /// assert_eq!(frame.command, "say");
    /// assert_eq!(frame.content, "hello there");
    ///
    /// assert!(Frame::parse(b"no delimiter").is_err());
    /// ```
    pub fn parse(payload: &'a [u8]) -> Result<Self, FrameError> {
        if payload.len() >= BUFFER_SIZE {
            return Err(FrameError::Oversize);
        }

        let text = std::str::from_utf8(payload)?;
        let (command, content) = text.split_once('$').ok_or(FrameError::MissingDelimiter)?;

        let command = command.trim();
        if command.is_empty() {
            return Err(FrameError::EmptyCommand);
        }

        Ok(Self {
            command,
            content: content.trim(),
        })
    }
}

/// Build an outbound `command$content` payload.
///
/// # Test
///
/// ```
/// use ichat_codec::{Frame, format_frame};
///
/// let payload = format_frame("say", "hello").unwrap();
/// let frame = Frame::parse(payload.as_bytes()).unwrap();
/// assert_eq!((frame.command, frame.content), ("say", "hello"));
/// ```
pub fn format_frame(command: &str, content: &str) -> Result<String, FrameError> {
    if command.is_empty() {
        return Err(FrameError::EmptyCommand);
    }

    if command.contains('$') {
        return Err(FrameError::DelimiterInCommand);
    }

    let payload = format!("{}${}", command, content);
    if payload.len() >= BUFFER_SIZE {
        return Err(FrameError::Oversize);
    }

    Ok(payload)
}

/// Check a display name against the grammar: names appear before the `: ` of
/// broadcast lines and inside comma lists of acknowledgements, so they must
/// not contain `$`, `,` or whitespace.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }

    for ch in name.chars() {
        if ch == '$' || ch == ',' || ch.is_whitespace() || ch.is_control() {
            return Err(NameError::Forbidden(ch));
        }
    }

    Ok(())
}

/// The client-to-server command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Conn,
    Say,
    Sayto,
    Disconn,
    Mute,
    Unmute,
    Rename,
    Kick,
    RetPing,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "conn" => Self::Conn,
            "say" => Self::Say,
            "sayto" => Self::Sayto,
            "disconn" => Self::Disconn,
            "mute" => Self::Mute,
            "unmute" => Self::Unmute,
            "rename" => Self::Rename,
            "kick" => Self::Kick,
            "ret-ping" => Self::RetPing,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Conn => "conn",
            Self::Say => "say",
            Self::Sayto => "sayto",
            Self::Disconn => "disconn",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Rename => "rename",
            Self::Kick => "kick",
            Self::RetPing => "ret-ping",
        }
    }
}

/// The server-to-client command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerCommand {
    Conn,
    Rename,
    Say,
    Sayto,
    History,
    Disconn,
    Kick,
    Ping,
    Error,
}

impl ServerCommand {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "conn" => Self::Conn,
            "rename" => Self::Rename,
            "say" => Self::Say,
            "sayto" => Self::Sayto,
            "history" => Self::History,
            "disconn" => Self::Disconn,
            "kick" => Self::Kick,
            "ping" => Self::Ping,
            "Error" => Self::Error,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    #[test]
    fn parse_splits_and_trims() -> Result<()> {
        let frame = Frame::parse(b"  conn $ Alice  ")?;
        assert_eq!(frame.command, "conn");
        assert_eq!(frame.content, "Alice");
        Ok(())
    }

    #[test]
    fn parse_allows_empty_content() -> Result<()> {
        let frame = Frame::parse(b"disconn$")?;
        assert_eq!(frame.command, "disconn");
        assert_eq!(frame.content, "");
        Ok(())
    }

    #[test]
    fn parse_keeps_interior_dollars_in_content() -> Result<()> {
        let frame = Frame::parse(b"say$price is 5$ now")?;
        assert_eq!(frame.content, "price is 5$ now");
        Ok(())
    }

    #[test]
    fn parse_rejects_missing_delimiter() {
        assert_eq!(
            Frame::parse(b"just text"),
            Err(FrameError::MissingDelimiter)
        );
    }

    #[test]
    fn parse_rejects_empty_command() {
        assert_eq!(Frame::parse(b"$hello"), Err(FrameError::EmptyCommand));
        assert_eq!(Frame::parse(b"   $hello"), Err(FrameError::EmptyCommand));
    }

    #[test]
    fn parse_size_boundary() {
        let mut payload = b"say$".to_vec();
        payload.resize(BUFFER_SIZE - 1, b'a');
        assert!(Frame::parse(&payload).is_ok());

        payload.push(b'a');
        assert_eq!(Frame::parse(&payload), Err(FrameError::Oversize));
    }

    #[test]
    fn format_then_parse_is_identity() -> Result<()> {
        for (command, content) in [
            ("say", "hello"),
            ("conn", "Alice"),
            ("disconn", ""),
            ("sayto", "Bob hi there"),
        ] {
            let payload = format_frame(command, content)?;
            let frame = Frame::parse(payload.as_bytes())?;
            assert_eq!((frame.command, frame.content), (command, content));
        }
        Ok(())
    }

    #[test]
    fn format_rejects_bad_commands() {
        assert_eq!(format_frame("", "x"), Err(FrameError::EmptyCommand));
        assert_eq!(format_frame("sa$y", "x"), Err(FrameError::DelimiterInCommand));
    }

    #[test]
    fn format_rejects_oversize() {
        let content = "a".repeat(BUFFER_SIZE);
        assert_eq!(format_frame("say", &content), Err(FrameError::Oversize));
    }

    #[test]
    fn name_grammar() {
        assert!(validate_name("Alice").is_ok());
        assert!(validate_name("user_42").is_ok());

        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("a b"), Err(NameError::Forbidden(' ')));
        assert_eq!(validate_name("a$b"), Err(NameError::Forbidden('$')));
        assert_eq!(validate_name("a,b"), Err(NameError::Forbidden(',')));
        assert_eq!(
            validate_name(&"n".repeat(MAX_NAME_LEN + 1)),
            Err(NameError::TooLong)
        );
    }

    #[test]
    fn command_vocabulary() {
        assert_eq!(Command::from_name("ret-ping"), Some(Command::RetPing));
        assert_eq!(Command::from_name("conn"), Some(Command::Conn));
        assert_eq!(Command::from_name("shout"), None);
        assert_eq!(Command::Sayto.name(), "sayto");

        assert_eq!(ServerCommand::from_name("Error"), Some(ServerCommand::Error));
        assert_eq!(ServerCommand::from_name("error"), None);
    }
}
