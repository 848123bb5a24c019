//! WA client connection: TCP establishment, handshake, steady state.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::{sink::SinkExt, stream::StreamExt, Stream};
use log::debug;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use wa_jid::CHAT_SERVER;
use wa_node::Node;
use wauth::{KeySet, Secret, SecureStream};

use crate::connect::connect_to_host;
use crate::error::{AuthError, Error};
use crate::ns;
use crate::wa_codec::{Packet, WaCodec};

/// The production chat host.
pub const CHAT_HOST: &str = "c.whatsapp.net";

/// Primary and fallback chat ports.
pub const CHAT_PORTS: [u16; 2] = [443, 5222];

/// The SASL-like mechanism selecting the RC4+HMAC framing.
const MECHANISM: &str = "WAUTH-2";

/// WA client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Phone number in decimal ASCII, without a leading `+`.
    pub number: String,
    /// The 20-byte shared secret from the registration flow.
    pub secret: Secret,
    /// Nickname announced in the initial presence.
    pub nickname: String,
    /// Device identifier contributing to the stream resource.
    pub device: String,
    /// Client version contributing to the stream resource.
    pub version: String,
    /// Host/port candidates tried in order.
    pub hosts: Vec<(String, u16)>,
    /// How many times to cycle through the candidates before giving up.
    pub attempts: usize,
}

impl Config {
    /// A configuration with the production hosts and client identity.
    pub fn new<N: Into<String>, K: Into<String>>(number: N, secret: Secret, nickname: K) -> Config {
        Config {
            number: number.into(),
            secret,
            nickname: nickname.into(),
            device: String::from("iPhone"),
            version: String::from("2.8.2"),
            hosts: CHAT_PORTS
                .iter()
                .map(|port| (String::from(CHAT_HOST), *port))
                .collect(),
            attempts: 2,
        }
    }
}

/// The read-only attribute bag delivered in the `success` stanza.
#[derive(Clone, Debug, Default)]
pub struct AccountInfo(HashMap<String, String>);

impl AccountInfo {
    fn from_stanza(node: &Node) -> AccountInfo {
        AccountInfo(
            node.attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    /// Looks up an arbitrary attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The account kind, e.g. `paid` or `free`.
    pub fn kind(&self) -> Option<&str> {
        self.get("kind")
    }

    /// The account status, e.g. `active`.
    pub fn status(&self) -> Option<&str> {
        self.get("status")
    }

    /// Unix timestamp of account creation.
    pub fn creation(&self) -> Option<&str> {
        self.get("creation")
    }

    /// Unix timestamp of account expiration.
    pub fn expiration(&self) -> Option<&str> {
        self.get("expiration")
    }
}

/// A simple WA client connection.
///
/// [`Client::new`] performs the whole handshake: stream prologue,
/// authentication against the server challenge, and the initial presence.
/// Afterwards the client implements the `futures` crate's
/// [`Stream`](#impl-Stream) trait for inbound stanzas.
pub struct Client {
    stream: Framed<TcpStream, WaCodec>,
    account_info: AccountInfo,
    msg_counter: u64,
}

impl Client {
    /// Connects, logs in and waits for a usable session.
    pub async fn new(config: Config) -> Result<Self, Error> {
        let tcp = connect_to_host(&config.hosts, config.attempts).await?;
        let mut stream = Framed::new(tcp, WaCodec::new());
        // The socket (and with it the session ciphers) is dropped on any
        // handshake error, so a failed login never leaves a half-open
        // connection behind.
        let account_info = login(&mut stream, &config).await?;
        Ok(Client {
            stream,
            account_info,
            msg_counter: 0,
        })
    }

    /// The account attributes reported by the server at login.
    pub fn account_info(&self) -> &AccountInfo {
        &self.account_info
    }

    /// Sends a stanza.
    pub async fn send_stanza(&mut self, stanza: Node) -> Result<(), Error> {
        self.stream.send(Packet::Stanza(stanza)).await
    }

    /// Generates a session-unique message id for the given caller context.
    pub fn make_id(&mut self, prefix: &str) -> String {
        self.msg_counter += 1;
        format!("{}-{}-{}", prefix, unix_time(), self.msg_counter)
    }

    /// Ends the connection by sending the stream end marker and draining
    /// whatever the server still has to say.
    pub async fn end(mut self) -> Result<(), Error> {
        self.stream.send(Packet::StreamEnd).await?;
        while let Some(Ok(_)) = self.stream.next().await {}
        Ok(())
    }
}

/// Inbound stanzas.
///
/// In an `async fn` you may want to use this with `use
/// futures::stream::StreamExt;`
impl Stream for Client {
    type Item = Result<Node, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.stream).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Ok(Packet::Stanza(stanza)))) => Poll::Ready(Some(Ok(stanza))),
            Poll::Ready(Some(Ok(Packet::StreamEnd))) => {
                Poll::Ready(Some(Err(Error::Disconnected)))
            }
            Poll::Ready(Some(Ok(Packet::StreamStart(_)))) => {
                // The server only starts a stream once, during login.
                Poll::Ready(Some(Err(Error::InvalidState)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
        }
    }
}

/// Seconds since the unix epoch.
pub fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

async fn login(
    stream: &mut Framed<TcpStream, WaCodec>,
    config: &Config,
) -> Result<AccountInfo, Error> {
    let port = stream.get_ref().peer_addr()?.port();
    let resource = format!("{}-{}-{}", config.device, config.version, port);

    let mut attrs = HashMap::new();
    attrs.insert(String::from("to"), String::from(CHAT_SERVER));
    attrs.insert(String::from("resource"), resource);
    stream.send(Packet::StreamStart(attrs)).await?;

    stream
        .send(Packet::Stanza(Node::new("stream:features")))
        .await?;

    let auth = Node::builder("auth")
        .attr("xmlns", ns::SASL)
        .attr("mechanism", MECHANISM)
        .attr("user", &config.number)
        .build();
    stream.send(Packet::Stanza(auth)).await?;

    loop {
        let packet = match stream.next().await {
            Some(packet) => packet?,
            None => return Err(Error::Disconnected),
        };
        let stanza = match packet {
            Packet::Stanza(stanza) => stanza,
            // The server acknowledges with its own stream start.
            Packet::StreamStart(_) => continue,
            Packet::StreamEnd => return Err(Error::Disconnected),
        };
        match stanza.name() {
            "stream:features" => continue,
            "challenge" => {
                let challenge = stanza.data().ok_or(AuthError::NoChallenge)?;
                let keys = KeySet::derive(config.secret.as_bytes(), challenge);
                let mut secure = SecureStream::client(&keys);
                let blob =
                    wauth::auth_response(&config.number, challenge, unix_time(), &mut secure)?;
                let response = Node::builder("response")
                    .attr("xmlns", ns::SASL)
                    .data(blob)
                    .build();
                // The response frame itself goes out in the clear; its
                // payload is already sealed. Everything after it is
                // encrypted in both directions.
                stream.send(Packet::Stanza(response)).await?;
                stream.codec_mut().secure(secure);
            }
            "success" => {
                let account_info = AccountInfo::from_stanza(&stanza);
                debug!("logged in as {}", config.number);
                let presence = Node::builder("presence")
                    .attr("name", &config.nickname)
                    .build();
                stream.send(Packet::Stanza(presence)).await?;
                return Ok(account_info);
            }
            "failure" => {
                let condition = stanza
                    .children()
                    .first()
                    .map(|child| child.name().to_string())
                    .unwrap_or_default();
                return Err(Error::Auth(AuthError::Failure(condition)));
            }
            "stream:error" => return Err(stream_error(&stanza)),
            other => debug!("ignoring {} during handshake", other),
        }
    }
}

/// Converts a `stream:error` stanza into the error carrying the name of
/// its first child element.
pub(crate) fn stream_error(stanza: &Node) -> Error {
    Error::Stream(
        stanza
            .children()
            .first()
            .map(|child| child.name().to_string())
            .unwrap_or_default(),
    )
}
