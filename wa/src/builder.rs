// Copyright (c) 2024 wa-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tokio_wa::{Client, Config, Secret};

use crate::{Agent, Error};

/// Builds a logged-in [`Agent`].
pub struct ClientBuilder<'a> {
    number: &'a str,
    secret: Secret,
    nickname: String,
    client: Option<(String, String)>,
    hosts: Option<Vec<(String, u16)>>,
    attempts: Option<usize>,
    auto_receipt: bool,
}

impl<'a> ClientBuilder<'a> {
    /// A builder for the given credentials, with the production servers
    /// and auto-receipts enabled.
    pub fn new(number: &'a str, secret: Secret) -> ClientBuilder<'a> {
        ClientBuilder {
            number,
            secret,
            nickname: String::from("wa-rs"),
            client: None,
            hosts: None,
            attempts: None,
            auto_receipt: true,
        }
    }

    /// Sets the nickname announced in presences and outgoing messages.
    pub fn set_nickname(mut self, nickname: &str) -> Self {
        self.nickname = String::from(nickname);
        self
    }

    /// Overrides the device/version pair identifying the client build.
    pub fn set_client(mut self, device: &str, version: &str) -> Self {
        self.client = Some((String::from(device), String::from(version)));
        self
    }

    /// Connects to a specific server instead of the production hosts.
    pub fn set_server(mut self, host: &str, port: u16) -> Self {
        self.hosts = Some(vec![(String::from(host), port)]);
        self
    }

    /// How many times to cycle through the host candidates.
    pub fn set_attempts(mut self, attempts: usize) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Enables or disables automatic read receipts for inbound messages.
    pub fn set_auto_receipt(mut self, enabled: bool) -> Self {
        self.auto_receipt = enabled;
        self
    }

    /// Connects and logs in.
    pub async fn build(self) -> Result<Agent, Error> {
        let mut config = Config::new(self.number, self.secret, self.nickname.clone());
        if let Some((device, version)) = self.client {
            config.device = device;
            config.version = version;
        }
        if let Some(hosts) = self.hosts {
            config.hosts = hosts;
        }
        if let Some(attempts) = self.attempts {
            config.attempts = attempts;
        }

        let client = Client::new(config).await?;
        Ok(Agent::new(
            client,
            self.nickname,
            String::from(self.number),
            self.auto_receipt,
        ))
    }
}
