//! Minimal IRCv3 line parsing for the Twitch chat protocol
//!
//! Handles exactly the subset the capture pipeline consumes: message tags
//! (`@k=v;k2=v2`), the sender prefix, the command, middle parameters, and
//! the trailing parameter.

use std::collections::HashMap;

/// One parsed IRC protocol line
#[derive(Debug, Clone, PartialEq)]
pub struct IrcLine {
    /// IRCv3 message tags, values unescaped
    pub tags: HashMap<String, String>,
    /// Sender prefix without the leading `:`
    pub prefix: Option<String>,
    /// Command or numeric reply
    pub command: String,
    /// Middle parameters (e.g. the channel of a PRIVMSG)
    pub params: Vec<String>,
    /// Trailing parameter (e.g. the message body)
    pub trailing: Option<String>,
}

impl IrcLine {
    /// Tag value by key, treating an empty value as absent.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Parse one raw protocol line. Returns `None` for blank or malformed input.
pub fn parse_line(line: &str) -> Option<IrcLine> {
    let mut rest = line.trim_end_matches(['\r', '\n']);
    if rest.is_empty() {
        return None;
    }

    let mut tags = HashMap::new();
    if let Some(stripped) = rest.strip_prefix('@') {
        let (raw_tags, remainder) = stripped.split_once(' ')?;
        for pair in raw_tags.split(';') {
            match pair.split_once('=') {
                Some((k, v)) => tags.insert(k.to_string(), unescape_tag(v)),
                None => tags.insert(pair.to_string(), String::new()),
            };
        }
        rest = remainder;
    }

    let mut prefix = None;
    if let Some(stripped) = rest.strip_prefix(':') {
        let (p, remainder) = stripped.split_once(' ')?;
        prefix = Some(p.to_string());
        rest = remainder;
    }

    let (middle, trailing) = match rest.split_once(" :") {
        Some((m, t)) => (m, Some(t.to_string())),
        None => (rest, None),
    };

    let mut parts = middle.split_ascii_whitespace();
    let command = parts.next()?.to_string();
    let params: Vec<String> = parts.map(str::to_string).collect();

    Some(IrcLine {
        tags,
        prefix,
        command,
        params,
        trailing,
    })
}

/// Extract the login name from a prefix like `alice!alice@alice.tmi.twitch.tv`.
pub fn login_from_prefix(prefix: &str) -> Option<&str> {
    let login = prefix.split('!').next()?;
    if login.is_empty() { None } else { Some(login) }
}

/// Undo IRCv3 tag value escaping.
fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_tags() {
        let line = "@badge-info=;display-name=Alice;mod=0 :alice!alice@alice.tmi.twitch.tv PRIVMSG #chan :hello world";
        let parsed = parse_line(line).unwrap();

        assert_eq!(parsed.command, "PRIVMSG");
        assert_eq!(parsed.params, vec!["#chan"]);
        assert_eq!(parsed.trailing.as_deref(), Some("hello world"));
        assert_eq!(parsed.tag("display-name"), Some("Alice"));
        assert_eq!(
            parsed.prefix.as_deref(),
            Some("alice!alice@alice.tmi.twitch.tv")
        );
    }

    #[test]
    fn parses_ping() {
        let parsed = parse_line("PING :tmi.twitch.tv").unwrap();
        assert_eq!(parsed.command, "PING");
        assert_eq!(parsed.trailing.as_deref(), Some("tmi.twitch.tv"));
        assert!(parsed.prefix.is_none());
    }

    #[test]
    fn parses_numeric_welcome() {
        let parsed = parse_line(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!").unwrap();
        assert_eq!(parsed.command, "001");
        assert_eq!(parsed.params, vec!["justinfan123"]);
    }

    #[test]
    fn empty_tag_value_is_absent() {
        let line = "@display-name=;color=#FF0000 :a!a@a PRIVMSG #c :x";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.tag("display-name"), None);
        assert_eq!(parsed.tag("color"), Some("#FF0000"));
    }

    #[test]
    fn unescapes_tag_values() {
        let line = r"@system-msg=hi\sthere\:ok :a!a@a USERNOTICE #c";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.tag("system-msg"), Some("hi there;ok"));
    }

    #[test]
    fn trailing_may_contain_colons() {
        let line = ":a!a@a PRIVMSG #c :note: this has :colons:";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.trailing.as_deref(), Some("note: this has :colons:"));
    }

    #[test]
    fn message_body_is_unmodified() {
        let line = ":a!a@a PRIVMSG #c :  spaced   out  ";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.trailing.as_deref(), Some("  spaced   out  "));
    }

    #[test]
    fn blank_line_is_none() {
        assert!(parse_line("").is_none());
        assert!(parse_line("\r\n").is_none());
    }

    #[test]
    fn login_extracted_from_prefix() {
        assert_eq!(
            login_from_prefix("alice!alice@alice.tmi.twitch.tv"),
            Some("alice")
        );
        assert_eq!(login_from_prefix("tmi.twitch.tv"), Some("tmi.twitch.tv"));
        assert_eq!(login_from_prefix("!x@y"), None);
    }
}
