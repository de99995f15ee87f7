//! src/platforms/twitch_irc/client.rs

use std::collections::HashMap;
use std::io;

use tokio::io::{split, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tokio_native_tls::native_tls;
use tokio_native_tls::TlsConnector;
use tracing::{debug, error, info};

use spinbot_common::models::ChatEvent;

pub const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
pub const TWITCH_IRC_TLS_PORT: u16 = 6697;

/// One IRC line with its IRCv3 tags already split and unescaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTwitchMsg {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl ParsedTwitchMsg {
    pub fn parse_irc_line(line: &str) -> Self {
        let mut rest = line.trim();
        let mut msg = Self::default();

        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, tail) = stripped.split_once(' ').unwrap_or((stripped, ""));
            msg.tags = parse_tags(raw_tags);
            rest = tail.trim_start();
        }

        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, tail) = stripped.split_once(' ').unwrap_or((stripped, ""));
            msg.prefix = Some(prefix.to_string());
            rest = tail.trim_start();
        }

        let (command, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        msg.command = command.to_ascii_uppercase();
        rest = tail;

        let params_part = if let Some(trail) = rest.strip_prefix(':') {
            msg.trailing = Some(trail.to_string());
            ""
        } else if let Some(idx) = rest.find(" :") {
            msg.trailing = Some(rest[idx + 2..].to_string());
            &rest[..idx]
        } else {
            rest
        };
        msg.params = params_part.split_whitespace().map(str::to_string).collect();
        msg
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Login name from a `nick!user@host` prefix. Server prefixes such as
    /// `tmi.twitch.tv` carry none.
    pub fn login(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .and_then(|p| p.split_once('!'))
            .map(|(nick, _)| nick)
            .filter(|n| !n.is_empty())
    }

    /// The sender's login, which is what `!spin @name` matches against.
    /// Localized display names are only a last resort.
    pub fn username(&self) -> String {
        self.tag("login")
            .or_else(|| self.login())
            .or_else(|| self.tag("display-name"))
            .unwrap_or_default()
            .to_string()
    }

    fn is_privileged(&self) -> bool {
        let is_mod = self.tag("mod") == Some("1");
        let is_broadcaster = self
            .tag("badges")
            .is_some_and(|b| b.split(',').any(|badge| badge.starts_with("broadcaster/")));
        is_mod || is_broadcaster
    }

    /// Maps a raw line onto the events the tracker consumes. Everything else
    /// (JOIN, ROOMSTATE, plain subs, ...) is `None`.
    pub fn to_chat_event(&self) -> Option<ChatEvent> {
        match self.command.as_str() {
            "PRIVMSG" => {
                let text = self.trailing.clone().unwrap_or_default();
                let username = self.username();
                match self.tag("bits").and_then(|b| b.parse::<u64>().ok()) {
                    Some(bits) if bits > 0 => Some(ChatEvent::Cheer {
                        username,
                        bits,
                        message: text,
                    }),
                    _ => Some(ChatEvent::ChatMessage {
                        is_privileged: self.is_privileged(),
                        username,
                        text,
                    }),
                }
            }
            "USERNOTICE" => self.gift_sub_event(),
            _ => None,
        }
    }

    fn gift_sub_event(&self) -> Option<ChatEvent> {
        match self.tag("msg-id")? {
            "submysterygift" => {
                let sub_count = self
                    .tag("msg-param-mass-gift-count")
                    .and_then(|c| c.parse::<u32>().ok())
                    .filter(|c| *c > 0)?;
                Some(ChatEvent::GiftSubBundle {
                    username: self.username(),
                    sub_count,
                    recipients: Vec::new(),
                })
            }
            // Individual subgifts that belong to a mystery bundle were already
            // counted by its submysterygift notice.
            "subgift" | "anonsubgift" if self.tag("msg-param-community-gift-id").is_none() => {
                let recipient = self
                    .tag("msg-param-recipient-user-name")
                    .or_else(|| self.tag("msg-param-recipient-display-name"));
                Some(ChatEvent::GiftSubBundle {
                    username: self.username(),
                    sub_count: 1,
                    recipients: recipient.map(str::to_string).into_iter().collect(),
                })
            }
            _ => None,
        }
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|kv| !kv.is_empty())
        .map(|kv| {
            let (key, value) = kv.split_once('=').unwrap_or((kv, ""));
            (key.to_string(), unescape_tag_value(value))
        })
        .collect()
}

/// IRCv3 tag value unescaping (`\s` space, `\:` semicolon, `\\` backslash).
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some(':') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Low-level IRC client that connects to Twitch via TLS and turns the read
/// side into `ChatEvent`s. The last event of every connection is
/// `ChatEvent::Disconnected`.
pub struct TwitchIrcClient {
    raw_outgoing: mpsc::UnboundedSender<String>,

    pub incoming: Option<mpsc::UnboundedReceiver<ChatEvent>>,

    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl TwitchIrcClient {
    /// Connects to `irc.chat.twitch.tv:6697`, logs in and requests tags.
    /// An empty token logs in anonymously (read-only).
    pub async fn connect(username: &str, oauth_token: &str) -> io::Result<Self> {
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_TLS_PORT))
            .await
            .map_err(|e| io::Error::other(format!("TCP connect error: {e}")))?;

        let native_connector = native_tls::TlsConnector::new()
            .map_err(|e| io::Error::other(format!("TLSConnector::new() => {e}")))?;
        let connector = TlsConnector::from(native_connector);
        let tls_stream = connector
            .connect(TWITCH_IRC_HOST, tcp)
            .await
            .map_err(|e| io::Error::other(format!("TLS connect() => {e}")))?;

        let (read_half, write_half) = split(tls_stream);

        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<ChatEvent>();

        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        for line in login_lines(username, oauth_token) {
            tx_outgoing.send(line).ok();
        }

        let read_task = tokio::spawn(Self::reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        Ok(Self {
            raw_outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        })
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<ChatEvent>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    ) where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut line_buffer = String::new();

        let reason = loop {
            line_buffer.clear();
            match reader.read_line(&mut line_buffer).await {
                Ok(0) => break "connection closed by server".to_string(),
                Ok(_) => {
                    let line = line_buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {}", line);

                    let parsed = ParsedTwitchMsg::parse_irc_line(line);
                    match parsed.command.as_str() {
                        "PING" => {
                            let payload = parsed.trailing.as_deref().unwrap_or("tmi.twitch.tv");
                            tx_outgoing.send(format!("PONG :{}", payload)).ok();
                            continue;
                        }
                        "RECONNECT" => break "server requested reconnect".to_string(),
                        "NOTICE" if parsed.trailing.as_deref() == Some("Login authentication failed") => {
                            break "login authentication failed".to_string();
                        }
                        _ => {}
                    }

                    if let Some(event) = parsed.to_chat_event() {
                        if tx_incoming.send(event).is_err() {
                            debug!("(TwitchIrcClient) incoming receiver dropped");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("(TwitchIrcClient) read error => {:?}", e);
                    break format!("read error: {e}");
                }
            }
        };

        info!("(TwitchIrcClient) reader_loop ended: {}", reason);
        let _ = tx_incoming.send(ChatEvent::Disconnected { reason });
    }

    async fn writer_loop<W>(mut write_half: W, mut rx_outgoing: mpsc::UnboundedReceiver<String>)
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(&mut write_half);

        while let Some(line) = rx_outgoing.recv().await {
            if line.starts_with("PASS ") {
                debug!(">> PASS ****");
            } else {
                debug!(">> {}", line);
            }
            let framed = format!("{}\r\n", line);
            if let Err(e) = writer.write_all(framed.as_bytes()).await {
                error!("writer error => {:?}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("writer flush error => {:?}", e);
                break;
            }
        }

        info!("(TwitchIrcClient) writer_loop ended.");
    }

    pub fn send_raw_line(&self, line: &str) {
        let _ = self.raw_outgoing.send(line.to_string());
    }

    pub fn join_channel(&self, channel: &str) {
        self.send_raw_line(&format!("JOIN {}", irc_channel(channel)));
    }

    pub fn shutdown(self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

/// `girl_dm_` -> `#girl_dm_`. IRC channel names are lowercase.
pub fn irc_channel(channel: &str) -> String {
    format!("#{}", channel.trim_start_matches('#').to_lowercase())
}

fn login_lines(username: &str, oauth_token: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);
    let token = oauth_token.trim();
    if !token.is_empty() {
        if token.starts_with("oauth:") {
            lines.push(format!("PASS {}", token));
        } else {
            lines.push(format!("PASS oauth:{}", token));
        }
    }
    lines.push(format!("NICK {}", username.to_lowercase()));
    lines.push("CAP REQ :twitch.tv/commands twitch.tv/tags".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_prefix_and_trailing() {
        let msg = ParsedTwitchMsg::parse_irc_line(
            "@badges=moderator/1;display-name=Some\\sName;mod=1 :somename!somename@somename.tmi.twitch.tv PRIVMSG #chan :hello there: friend",
        );
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#chan"]);
        assert_eq!(msg.trailing.as_deref(), Some("hello there: friend"));
        assert_eq!(msg.tag("display-name"), Some("Some Name"));
        assert_eq!(msg.login(), Some("somename"));
    }

    #[test]
    fn ping_has_trailing_only() {
        let msg = ParsedTwitchMsg::parse_irc_line("PING :tmi.twitch.tv");
        assert_eq!(msg.command, "PING");
        assert!(msg.params.is_empty());
        assert_eq!(msg.trailing.as_deref(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn bits_privmsg_is_a_cheer() {
        let msg = ParsedTwitchMsg::parse_irc_line(
            "@bits=1500;display-name=Bob :bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :Cheer1500 spin it",
        );
        assert_eq!(
            msg.to_chat_event(),
            Some(ChatEvent::Cheer {
                username: "bob".into(),
                bits: 1500,
                message: "Cheer1500 spin it".into(),
            })
        );
    }

    #[test]
    fn localized_display_names_record_the_login() {
        let msg = ParsedTwitchMsg::parse_irc_line(
            "@bits=100;display-name=ゆき :yuki_jp!yuki_jp@yuki_jp.tmi.twitch.tv PRIVMSG #chan :Cheer100",
        );
        assert!(matches!(
            msg.to_chat_event(),
            Some(ChatEvent::Cheer { ref username, .. }) if username == "yuki_jp"
        ));

        let server = ParsedTwitchMsg::parse_irc_line(
            "@display-name=Anon;msg-id=subgift :tmi.twitch.tv USERNOTICE #chan",
        );
        assert_eq!(server.login(), None);
        assert_eq!(server.username(), "Anon");
    }

    #[test]
    fn privilege_comes_from_mod_tag_or_broadcaster_badge() {
        let as_event = |line: &str| ParsedTwitchMsg::parse_irc_line(line).to_chat_event();

        let modded = as_event("@mod=1;display-name=M :m!m@m PRIVMSG #c :!spin @x");
        assert!(matches!(modded, Some(ChatEvent::ChatMessage { is_privileged: true, .. })));

        let owner = as_event("@badges=broadcaster/1,subscriber/0;mod=0 :o!o@o PRIVMSG #c :!spin x");
        assert!(matches!(owner, Some(ChatEvent::ChatMessage { is_privileged: true, ref username, .. }) if username == "o"));

        let viewer = as_event("@badges=subscriber/12;mod=0 :v!v@v PRIVMSG #c :!spin x");
        assert!(matches!(viewer, Some(ChatEvent::ChatMessage { is_privileged: false, .. })));
    }

    #[test]
    fn mystery_gift_is_one_bundle() {
        let msg = ParsedTwitchMsg::parse_irc_line(
            "@display-name=Gifter;login=gifter;msg-id=submysterygift;msg-param-mass-gift-count=5 :tmi.twitch.tv USERNOTICE #chan",
        );
        assert_eq!(
            msg.to_chat_event(),
            Some(ChatEvent::GiftSubBundle {
                username: "gifter".into(),
                sub_count: 5,
                recipients: vec![],
            })
        );
    }

    #[test]
    fn bundled_subgifts_are_not_double_counted() {
        let bundled = ParsedTwitchMsg::parse_irc_line(
            "@display-name=Gifter;msg-id=subgift;msg-param-community-gift-id=123;msg-param-recipient-display-name=Lucky :tmi.twitch.tv USERNOTICE #chan",
        );
        assert_eq!(bundled.to_chat_event(), None);

        let single = ParsedTwitchMsg::parse_irc_line(
            "@display-name=Gifter;login=gifter;msg-id=subgift;msg-param-recipient-display-name=Lucky;msg-param-recipient-user-name=lucky :tmi.twitch.tv USERNOTICE #chan",
        );
        assert_eq!(
            single.to_chat_event(),
            Some(ChatEvent::GiftSubBundle {
                username: "gifter".into(),
                sub_count: 1,
                recipients: vec!["lucky".into()],
            })
        );
    }

    #[test]
    fn other_commands_are_ignored() {
        for line in [
            ":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!",
            ":justinfan12345!justinfan12345@justinfan12345.tmi.twitch.tv JOIN #chan",
            "@msg-id=resub;display-name=X :tmi.twitch.tv USERNOTICE #chan :still here",
        ] {
            assert_eq!(ParsedTwitchMsg::parse_irc_line(line).to_chat_event(), None, "{line}");
        }
    }

    #[test]
    fn anonymous_login_skips_pass() {
        let lines = login_lines("justinfan12345", "");
        assert_eq!(lines[0], "NICK justinfan12345");

        let lines = login_lines("Bot", "abc123");
        assert_eq!(lines[0], "PASS oauth:abc123");
        assert_eq!(lines[1], "NICK bot");
        assert_eq!(irc_channel("Girl_DM_"), "#girl_dm_");
    }

    #[tokio::test]
    async fn reader_answers_ping_and_reports_eof() {
        let input: &[u8] = b"PING :tmi.twitch.tv\r\n@bits=100 :a!a@a PRIVMSG #c :Cheer100\r\n";
        let (tx_in, mut rx_in) = mpsc::unbounded_channel();
        let (tx_out, mut rx_out) = mpsc::unbounded_channel();

        TwitchIrcClient::reader_loop(input, tx_in, tx_out).await;

        assert_eq!(rx_out.recv().await.as_deref(), Some("PONG :tmi.twitch.tv"));
        assert!(matches!(rx_in.recv().await, Some(ChatEvent::Cheer { bits: 100, .. })));
        assert!(matches!(rx_in.recv().await, Some(ChatEvent::Disconnected { .. })));
    }
}
